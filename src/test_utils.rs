//! Shared test utilities for `GymBuddy`.
//!
//! This module provides common helpers for setting up an in-memory storage
//! gateway and building members and forms with sensible defaults.

use crate::{
    app::App,
    config::{database::create_tables, gym::GymSettings},
    core::{
        member::{Address, EmergencyContact, Gender, Member, MemberForm, PlanSnapshot},
        persistence::SnapshotGateway,
        plan::{PlanType, default_catalog},
        status::derive_status,
    },
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Midnight UTC on the given day.
///
/// # Panics
/// Panics on an impossible date; tests only pass literals.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Creates a gateway over an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all persistence tests.
pub async fn setup_test_gateway() -> Result<SnapshotGateway> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(SnapshotGateway::new(db))
}

/// Starts an [`App`] over a fresh in-memory gateway with the built-in catalog.
pub async fn setup_test_app(now: DateTime<Utc>) -> Result<App> {
    let gateway = setup_test_gateway().await?;
    App::init(gateway, GymSettings::default(), default_catalog(), now).await
}

fn sample_contact() -> EmergencyContact {
    EmergencyContact {
        name: "Mary Doe".to_string(),
        phone: "555-987-6543".to_string(),
        relationship: "Sister".to_string(),
    }
}

fn sample_address() -> Address {
    Address {
        street: "42 Main Street".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip_code: "12345".to_string(),
    }
}

/// A valid registration form.
///
/// # Defaults
/// * `age`: 30
/// * `email`: `jane@example.com`
/// * `phone`: `555-123-4567`
#[must_use]
pub fn sample_form(name: &str) -> MemberForm {
    MemberForm {
        name: name.to_string(),
        age: 30,
        gender: Gender::Female,
        email: "jane@example.com".to_string(),
        phone: "555-123-4567".to_string(),
        emergency_contact: sample_contact(),
        address: sample_address(),
        notes: None,
    }
}

/// A valid member on a monthly plan (49.99) running from `start` to `end`.
///
/// The joining date is `start` and the status is derived as of `start`.
#[must_use]
pub fn sample_member(id: &str, name: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Member {
    Member {
        id: id.to_string(),
        name: name.to_string(),
        age: 30,
        gender: Gender::Female,
        email: "jane@example.com".to_string(),
        phone: "555-123-4567".to_string(),
        emergency_contact: sample_contact(),
        address: sample_address(),
        plan: PlanSnapshot {
            plan_type: PlanType::Monthly,
            start_date: start,
            end_date: end,
            price: 49.99,
        },
        joining_date: start,
        status: derive_status(end, start),
        profile_image: None,
        notes: None,
    }
}
