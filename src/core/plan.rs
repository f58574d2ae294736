//! Membership plan catalog types.
//!
//! A plan's duration is implied by its type. [`PlanForm`] is the form-layer
//! entry point and always forces the duration from the type; the store
//! rejects any plan whose duration disagrees with its type.

use crate::errors::{Error, Result};
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Billing period of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    /// One month
    Monthly,
    /// Three months
    Quarterly,
    /// Twelve months
    Yearly,
}

impl PlanType {
    /// Every plan type, shortest first.
    pub const ALL: [Self; 3] = [Self::Monthly, Self::Quarterly, Self::Yearly];

    /// Duration in months implied by the type.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Yearly => 12,
        }
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Monthly equivalent of a price paid once per period of this type.
    #[must_use]
    pub fn monthly_rate(self, price: f64) -> f64 {
        price / f64::from(self.months())
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adds the duration of `plan_type` to `start`, clamping to the end of the target month.
pub fn plan_end_date(start: DateTime<Utc>, plan_type: PlanType) -> Result<DateTime<Utc>> {
    start
        .checked_add_months(Months::new(plan_type.months()))
        .ok_or_else(|| Error::validation("plan.endDate", "End date is out of range"))
}

/// A purchasable membership tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Unique identifier, immutable once created
    pub id: String,
    /// Display name (e.g. "Basic Monthly")
    pub name: String,
    /// Billing period
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    /// Duration in months, always `plan_type.months()`
    pub duration: u32,
    /// Price for the whole period
    pub price: f64,
    /// Optional marketing description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered feature list
    #[serde(default)]
    pub features: Vec<String>,
    /// Whether new members can enroll in this plan
    pub is_active: bool,
}

impl Plan {
    /// Monthly equivalent of this plan's price.
    #[must_use]
    pub fn monthly_rate(&self) -> f64 {
        self.plan_type.monthly_rate(self.price)
    }

    /// Checks the fields the store refuses to accept.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::validation("id", "Plan id cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::validation("name", "Plan name cannot be empty"));
        }
        validate_price("price", self.price)?;
        if self.duration != self.plan_type.months() {
            return Err(Error::validation(
                "duration",
                format!(
                    "A {} plan lasts {} month(s), got {}",
                    self.plan_type,
                    self.plan_type.months(),
                    self.duration
                ),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_price(field: &str, price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::validation(field, "Price must be a non-negative number"));
    }
    Ok(())
}

/// Form input for creating or editing a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanForm {
    /// Display name
    pub name: String,
    /// Selected billing period
    pub plan_type: PlanType,
    /// Requested duration; ignored in favor of the type's duration
    pub duration: Option<u32>,
    /// Price for the whole period
    pub price: f64,
    /// Optional description, blank is treated as absent
    pub description: Option<String>,
    /// Feature lines as typed, blank lines are dropped
    pub features: Vec<String>,
}

impl PlanForm {
    /// Builds an active plan with a freshly generated id.
    pub fn into_plan(self) -> Result<Plan> {
        self.into_plan_with_id(format!("plan-{}", Uuid::new_v4()))
    }

    /// Builds an active plan with the given id, for edits of an existing plan.
    pub fn into_plan_with_id(self, id: String) -> Result<Plan> {
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let features = self
            .features
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        let plan = Plan {
            id,
            name: self.name.trim().to_string(),
            plan_type: self.plan_type,
            duration: self.plan_type.months(),
            price: self.price,
            description,
            features,
            is_active: true,
        };
        plan.validate()?;
        Ok(plan)
    }
}

/// The built-in catalog used when neither a snapshot nor a configured catalog exists.
#[must_use]
pub fn default_catalog() -> Vec<Plan> {
    fn plan(
        id: &str,
        name: &str,
        plan_type: PlanType,
        price: f64,
        features: &[&str],
        description: &str,
    ) -> Plan {
        Plan {
            id: id.to_string(),
            name: name.to_string(),
            plan_type,
            duration: plan_type.months(),
            price,
            description: Some(description.to_string()),
            features: features.iter().map(|f| (*f).to_string()).collect(),
            is_active: true,
        }
    }

    vec![
        plan(
            "plan-1",
            "Basic Monthly",
            PlanType::Monthly,
            49.99,
            &["Gym Access", "Locker Usage", "Basic Equipment"],
            "Perfect for beginners starting their fitness journey",
        ),
        plan(
            "plan-2",
            "Premium Quarterly",
            PlanType::Quarterly,
            129.99,
            &[
                "Gym Access",
                "Locker Usage",
                "All Equipment",
                "Group Classes",
                "1 Personal Training Session",
            ],
            "Great value for committed fitness enthusiasts",
        ),
        plan(
            "plan-3",
            "Elite Yearly",
            PlanType::Yearly,
            399.99,
            &[
                "Gym Access",
                "Locker Usage",
                "All Equipment",
                "Unlimited Group Classes",
                "4 Personal Training Sessions",
                "Nutrition Consultation",
                "Priority Booking",
            ],
            "Ultimate package for serious athletes",
        ),
    ]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use chrono::TimeZone;

    fn form(plan_type: PlanType, duration: Option<u32>) -> PlanForm {
        PlanForm {
            name: "  Student Monthly ".to_string(),
            plan_type,
            duration,
            price: 29.0,
            description: Some("   ".to_string()),
            features: vec!["Gym Access".to_string(), "  ".to_string(), String::new()],
        }
    }

    #[test]
    fn test_form_forces_duration_from_type() {
        let plan = form(PlanType::Monthly, Some(6)).into_plan().unwrap();
        assert_eq!(plan.duration, 1);

        let plan = form(PlanType::Yearly, Some(1)).into_plan().unwrap();
        assert_eq!(plan.duration, 12);

        let plan = form(PlanType::Quarterly, None).into_plan().unwrap();
        assert_eq!(plan.duration, 3);
    }

    #[test]
    fn test_form_trims_and_drops_blank_input() {
        let plan = form(PlanType::Monthly, None).into_plan().unwrap();
        assert_eq!(plan.name, "Student Monthly");
        assert_eq!(plan.features, vec!["Gym Access".to_string()]);
        assert!(plan.description.is_none());
        assert!(plan.is_active);
        assert!(plan.id.starts_with("plan-"));
    }

    #[test]
    fn test_form_rejects_negative_price() {
        let mut f = form(PlanType::Monthly, None);
        f.price = -1.0;
        let err = f.into_plan().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "price"));
    }

    #[test]
    fn test_validate_rejects_duration_mismatch() {
        let mut plan = default_catalog().remove(0);
        plan.duration = 6;
        let err = plan.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "duration"));
    }

    #[test]
    fn test_default_catalog_is_consistent() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 3);
        for plan in &catalog {
            assert!(plan.validate().is_ok(), "{} should be valid", plan.name);
        }
        assert_eq!(catalog[2].monthly_rate(), 399.99 / 12.0);
    }

    #[test]
    fn test_plan_end_date_clamps_to_month_end() {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap();
        let end = plan_end_date(start, PlanType::Monthly).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap());

        let end = plan_end_date(start, PlanType::Yearly).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 31, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_plan_serializes_with_camel_case_field_names() {
        let plan = default_catalog().remove(1);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["type"], "quarterly");
        assert_eq!(json["duration"], 3);
        assert_eq!(json["isActive"], true);
    }
}
