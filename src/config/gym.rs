//! Gym settings and plan catalog loading from config.toml
//!
//! `config.toml` is optional. It may carry a `[gym]` table with the gym's
//! contact details and notification preferences, and a `[[plans]]` list that
//! seeds the plan catalog the first time the application starts without a
//! saved snapshot.

use crate::{
    core::plan::{Plan, PlanForm, PlanType, default_catalog},
    errors::{Error, Result},
};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "GYM_CONFIG_PATH";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Gym contact details and preferences
    #[serde(default)]
    pub gym: GymSettings,
    /// Initial plan catalog; empty means the built-in catalog
    #[serde(default)]
    pub plans: Vec<PlanConfig>,
}

/// Gym contact details, included in exports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct GymSettings {
    /// Display name of the gym
    pub gym_name: String,
    /// Postal address
    pub address: String,
    /// Front desk phone
    pub phone: String,
    /// Contact email
    pub email: String,
    /// Website
    pub website: String,
    /// Short description
    pub description: String,
    /// Reminder preferences
    pub notifications: NotificationSettings,
    /// Minutes east of UTC at which the gym's calendar day starts
    #[serde(skip_serializing)]
    pub utc_offset_minutes: i32,
}

impl Default for GymSettings {
    fn default() -> Self {
        Self {
            gym_name: "FitGym Pro".to_string(),
            address: "123 Fitness Street, Workout City".to_string(),
            phone: "+1 (555) 123-4567".to_string(),
            email: "info@fitgympro.com".to_string(),
            website: "www.fitgympro.com".to_string(),
            description: "Premium fitness center dedicated to helping you achieve your health and wellness goals.".to_string(),
            notifications: NotificationSettings::default(),
            utc_offset_minutes: 0,
        }
    }
}

impl GymSettings {
    /// The offset used to count days until a plan ends.
    ///
    /// # Errors
    /// [`Error::Config`] when `utc_offset_minutes` is not within a day.
    pub fn day_offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| Error::Config {
                message: format!(
                    "utc_offset_minutes must be within a day, got {}",
                    self.utc_offset_minutes
                ),
            })
    }
}

/// Which reminders the gym sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct NotificationSettings {
    /// Email reminders
    pub email_reminders: bool,
    /// SMS reminders
    pub sms_reminders: bool,
    /// Warn members before their plan expires
    pub membership_expiry: bool,
    /// Warn members when a payment is due
    pub payment_due: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_reminders: true,
            sms_reminders: false,
            membership_expiry: true,
            payment_due: true,
        }
    }
}

/// Configuration for a single catalog plan
#[derive(Debug, Deserialize, Clone)]
pub struct PlanConfig {
    /// Stable id; generated as `plan-<n>` from the list position when absent
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Billing period; the duration follows from it
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    /// Price for the whole period
    pub price: f64,
    /// Optional description
    pub description: Option<String>,
    /// Feature list
    #[serde(default)]
    pub features: Vec<String>,
    /// Whether the plan is open for enrollment
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl AppConfig {
    /// The plan catalog to start with when there is no saved snapshot.
    pub fn catalog(&self) -> Result<Vec<Plan>> {
        if self.plans.is_empty() {
            return Ok(default_catalog());
        }

        self.plans
            .iter()
            .enumerate()
            .map(|(index, cfg)| {
                let id = cfg
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("plan-{}", index + 1));
                let mut plan = PlanForm {
                    name: cfg.name.clone(),
                    plan_type: cfg.plan_type,
                    duration: None,
                    price: cfg.price,
                    description: cfg.description.clone(),
                    features: cfg.features.clone(),
                }
                .into_plan_with_id(id)
                .map_err(|e| Error::Config {
                    message: format!("Invalid plan '{}' in config.toml: {e}", cfg.name),
                })?;
                plan.is_active = cfg.is_active;
                Ok(plan)
            })
            .collect()
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config file {path_ref:?}: {e}"),
    })
}

/// Loads configuration from `GYM_CONFIG_PATH` or `./config.toml`.
///
/// A missing file is not an error: the built-in defaults are used instead.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        info!("No configuration file at {path}, using built-in defaults");
        return Ok(AppConfig::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_day_offset_from_minutes() {
        let mut settings = GymSettings::default();
        assert_eq!(settings.day_offset().unwrap().local_minus_utc(), 0);

        settings.utc_offset_minutes = -300;
        assert_eq!(settings.day_offset().unwrap().local_minus_utc(), -5 * 3600);

        settings.utc_offset_minutes = 24 * 60;
        assert!(matches!(settings.day_offset(), Err(Error::Config { .. })));
        settings.utc_offset_minutes = i32::MAX;
        assert!(settings.day_offset().is_err());
    }

    #[test]
    fn test_offset_is_not_exported() {
        let settings = GymSettings {
            utc_offset_minutes: 120,
            ..GymSettings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("utcOffsetMinutes"));
        assert!(json.contains("gymName"));
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [gym]
            gym_name = "Iron Temple"
            phone = "+1 (555) 000-0000"

            [gym.notifications]
            sms_reminders = true

            [[plans]]
            name = "Drop-in Monthly"
            type = "monthly"
            price = 39.0
            features = ["Gym Access", ""]

            [[plans]]
            id = "plan-annual"
            name = "Annual"
            type = "yearly"
            price = 300.0
            is_active = false
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gym.gym_name, "Iron Temple");
        // Unset fields keep their defaults
        assert_eq!(config.gym.website, "www.fitgympro.com");
        assert!(config.gym.notifications.sms_reminders);
        assert!(config.gym.notifications.email_reminders);

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].id, "plan-1");
        assert_eq!(catalog[0].duration, 1);
        assert_eq!(catalog[0].features, vec!["Gym Access".to_string()]);
        assert_eq!(catalog[1].id, "plan-annual");
        assert_eq!(catalog[1].duration, 12);
        assert!(!catalog[1].is_active);
    }

    #[test]
    fn test_empty_config_uses_builtin_catalog() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.gym, GymSettings::default());
        assert_eq!(config.catalog().unwrap(), default_catalog());
    }

    #[test]
    fn test_invalid_plan_is_a_config_error() {
        let config: AppConfig = toml::from_str(
            r#"
            [[plans]]
            name = ""
            type = "quarterly"
            price = 10.0
            "#,
        )
        .unwrap();
        assert!(matches!(config.catalog(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_settings_serialize_in_camel_case() {
        let json = serde_json::to_value(GymSettings::default()).unwrap();
        assert_eq!(json["gymName"], "FitGym Pro");
        assert_eq!(json["notifications"]["membershipExpiry"], true);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
