//! Slash-command choice parameters.
//!
//! Discord renders these as fixed dropdowns. Each maps onto a core type so
//! the core stays free of framework derives.

use crate::core::{
    member::Gender,
    plan::PlanType,
    status::MemberStatus,
    store::{SortKey, SortOrder},
};

/// Gender dropdown
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum GenderChoice {
    /// Male
    #[name = "Male"]
    Male,
    /// Female
    #[name = "Female"]
    Female,
    /// Other
    #[name = "Other"]
    Other,
}

impl From<GenderChoice> for Gender {
    fn from(value: GenderChoice) -> Self {
        match value {
            GenderChoice::Male => Self::Male,
            GenderChoice::Female => Self::Female,
            GenderChoice::Other => Self::Other,
        }
    }
}

/// Plan type dropdown
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum PlanTypeChoice {
    /// One month
    #[name = "Monthly"]
    Monthly,
    /// Three months
    #[name = "Quarterly"]
    Quarterly,
    /// Twelve months
    #[name = "Yearly"]
    Yearly,
}

impl From<PlanTypeChoice> for PlanType {
    fn from(value: PlanTypeChoice) -> Self {
        match value {
            PlanTypeChoice::Monthly => Self::Monthly,
            PlanTypeChoice::Quarterly => Self::Quarterly,
            PlanTypeChoice::Yearly => Self::Yearly,
        }
    }
}

/// Status filter dropdown
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum StatusChoice {
    /// Active members
    #[name = "Active"]
    Active,
    /// Members expiring within two weeks
    #[name = "Expiring soon"]
    ExpiringSoon,
    /// Expired members
    #[name = "Expired"]
    Expired,
}

impl From<StatusChoice> for MemberStatus {
    fn from(value: StatusChoice) -> Self {
        match value {
            StatusChoice::Active => Self::Active,
            StatusChoice::ExpiringSoon => Self::ExpiringSoon,
            StatusChoice::Expired => Self::Expired,
        }
    }
}

/// Sort key dropdown
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum SortChoice {
    /// By name
    #[name = "Name"]
    Name,
    /// By joining date
    #[name = "Joining date"]
    JoiningDate,
    /// By plan end date
    #[name = "Expiry date"]
    ExpiryDate,
}

impl From<SortChoice> for SortKey {
    fn from(value: SortChoice) -> Self {
        match value {
            SortChoice::Name => Self::Name,
            SortChoice::JoiningDate => Self::JoiningDate,
            SortChoice::ExpiryDate => Self::ExpiryDate,
        }
    }
}

/// Sort direction dropdown
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum OrderChoice {
    /// Ascending
    #[name = "Ascending"]
    Asc,
    /// Descending
    #[name = "Descending"]
    Desc,
}

impl From<OrderChoice> for SortOrder {
    fn from(value: OrderChoice) -> Self {
        match value {
            OrderChoice::Asc => Self::Asc,
            OrderChoice::Desc => Self::Desc,
        }
    }
}
