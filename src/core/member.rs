//! Member records and enrollment.
//!
//! A member embeds a value snapshot of the plan they bought. Later changes to
//! the catalog never reach back into existing members.

use crate::{
    core::{
        plan::{Plan, PlanType, plan_end_date, validate_price},
        status::{MemberStatus, derive_status, derive_status_at},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::LazyLock};
use uuid::Uuid;

/// Youngest age accepted at registration
pub const MIN_AGE: u8 = 16;
/// Oldest age accepted at registration
pub const MAX_AGE: u8 = 100;

#[allow(clippy::expect_used)] // Constant pattern, checked by the tests below
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Member gender as recorded at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Other / undisclosed
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        })
    }
}

/// Who to call when something goes wrong on the gym floor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Contact name
    pub name: String,
    /// Contact phone number
    pub phone: String,
    /// Relationship to the member (e.g. "Spouse")
    pub relationship: String,
}

/// Postal address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street and number
    pub street: String,
    /// City
    pub city: String,
    /// State or region
    pub state: String,
    /// Postal code
    pub zip_code: String,
}

/// The plan a member bought, frozen at enrollment time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    /// Billing period at enrollment
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    /// First day of the membership
    pub start_date: DateTime<Utc>,
    /// Last day of the membership
    pub end_date: DateTime<Utc>,
    /// Price paid at enrollment
    pub price: f64,
}

impl PlanSnapshot {
    /// Snapshots `plan` for a membership starting at `start`.
    pub fn of(plan: &Plan, start: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            plan_type: plan.plan_type,
            start_date: start,
            end_date: plan_end_date(start, plan.plan_type)?,
            price: plan.price,
        })
    }
}

/// A gym patron
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Unique identifier, immutable once created
    pub id: String,
    /// Full name
    pub name: String,
    /// Age in years
    pub age: u8,
    /// Gender
    pub gender: Gender,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Emergency contact
    pub emergency_contact: EmergencyContact,
    /// Home address
    pub address: Address,
    /// Embedded plan snapshot
    pub plan: PlanSnapshot,
    /// When the member was registered, immutable
    pub joining_date: DateTime<Utc>,
    /// Cached lifecycle status; recomputed from `plan.end_date`, never trusted as input
    pub status: MemberStatus,
    /// Optional profile image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// Optional free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Member {
    /// Recomputes the cached status against `now`. Returns true if it changed.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        self.refresh_status_at(now, Utc.fix())
    }

    /// [`Member::refresh_status`] with calendar days taken at `offset`.
    pub fn refresh_status_at(&mut self, now: DateTime<Utc>, offset: FixedOffset) -> bool {
        let status = derive_status_at(self.plan.end_date, now, offset);
        let changed = status != self.status;
        self.status = status;
        changed
    }

    /// Replaces the plan snapshot with a fresh enrollment in `plan` starting at `now`.
    pub fn renew(&mut self, plan: &Plan, now: DateTime<Utc>) -> Result<()> {
        ensure_enrollable(plan)?;
        self.plan = PlanSnapshot::of(plan, now)?;
        self.refresh_status(now);
        Ok(())
    }

    /// Checks every field the store refuses to accept.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::validation("id", "Member id cannot be empty"));
        }
        min_chars("name", &self.name, 2)?;
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(Error::validation(
                "age",
                format!("Age must be between {MIN_AGE} and {MAX_AGE}"),
            ));
        }
        if !is_valid_email(&self.email) {
            return Err(Error::validation("email", "Invalid email address"));
        }
        min_chars("phone", &self.phone, 10)?;

        let contact = &self.emergency_contact;
        min_chars("emergencyContact.name", &contact.name, 2)?;
        min_chars("emergencyContact.phone", &contact.phone, 10)?;
        min_chars("emergencyContact.relationship", &contact.relationship, 2)?;

        let address = &self.address;
        min_chars("address.street", &address.street, 5)?;
        min_chars("address.city", &address.city, 2)?;
        min_chars("address.state", &address.state, 2)?;
        min_chars("address.zipCode", &address.zip_code, 5)?;

        if self.plan.end_date < self.plan.start_date {
            return Err(Error::validation(
                "plan.endDate",
                "End date cannot be before the start date",
            ));
        }
        validate_price("plan.price", self.plan.price)
    }
}

/// Loose structural email check: `local@domain.tld`, no whitespace.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

fn min_chars(field: &str, value: &str, min: usize) -> Result<()> {
    if value.trim().chars().count() < min {
        return Err(Error::validation(
            field,
            format!("Must be at least {min} characters"),
        ));
    }
    Ok(())
}

fn ensure_enrollable(plan: &Plan) -> Result<()> {
    if !plan.is_active {
        return Err(Error::validation(
            "plan",
            format!("Plan '{}' is not open for enrollment", plan.name),
        ));
    }
    Ok(())
}

/// Registration form input
#[derive(Debug, Clone, PartialEq)]
pub struct MemberForm {
    /// Full name
    pub name: String,
    /// Age in years
    pub age: u8,
    /// Gender
    pub gender: Gender,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Emergency contact
    pub emergency_contact: EmergencyContact,
    /// Home address
    pub address: Address,
    /// Optional notes, blank is treated as absent
    pub notes: Option<String>,
}

impl MemberForm {
    /// Enrolls the form's person in `plan` starting at `now`.
    ///
    /// Generates a new id, snapshots the plan price and dates, sets the
    /// joining date, and derives the status. The result is validated.
    pub fn enroll(self, plan: &Plan, now: DateTime<Utc>) -> Result<Member> {
        ensure_enrollable(plan)?;
        let plan_snapshot = PlanSnapshot::of(plan, now)?;
        let member = Member {
            id: format!("member-{}", Uuid::new_v4()),
            name: self.name.trim().to_string(),
            age: self.age,
            gender: self.gender,
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            emergency_contact: self.emergency_contact,
            address: self.address,
            status: derive_status(plan_snapshot.end_date, now),
            plan: plan_snapshot,
            joining_date: now,
            profile_image: None,
            notes: self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        };
        member.validate()?;
        Ok(member)
    }
}
