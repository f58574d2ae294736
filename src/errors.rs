//! Unified error types and result handling for `GymBuddy`.
//!
//! Every fallible operation in the crate returns [`Result`]. Store and form
//! validation failures carry the offending field so the view layer can answer
//! inline; persistence failures wrap the underlying `SeaORM` or I/O error.

use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum Error {
    /// A record field is missing or malformed
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field (e.g. `email`, `plan.duration`)
        field: String,
        /// Human-readable reason
        message: String,
    },

    /// Update or lookup of a member id that does not exist
    #[error("Member not found: {id}")]
    MemberNotFound {
        /// The id that was looked up
        id: String,
    },

    /// Update or lookup of a plan id that does not exist
    #[error("Plan not found: {id}")]
    PlanNotFound {
        /// The id (or name) that was looked up
        id: String,
    },

    /// The persisted snapshot does not parse as `{ members, plans }`
    #[error("Stored snapshot is corrupted: {message}")]
    Corruption {
        /// Parser message describing what went wrong
        message: String,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Storage read/write failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system failure (exports, config)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Discord / serenity failure
    #[error("Discord error: {0}")]
    Discord(Box<poise::serenity_prelude::Error>),

    /// Formatting a reply failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl Error {
    /// Builds a [`Error::Validation`] for the given field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors the user can fix by re-submitting different input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::MemberNotFound { .. } | Self::PlanNotFound { .. }
        )
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Discord(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_field() {
        let err = Error::validation("age", "Age must be between 16 and 100");
        assert_eq!(
            err.to_string(),
            "Invalid age: Age must be between 16 and 100"
        );
        assert!(err.is_user_error());
    }

    #[test]
    fn test_storage_errors_are_not_user_errors() {
        let err = Error::Corruption {
            message: "expected value".to_string(),
        };
        assert!(!err.is_user_error());
        assert!(
            Error::MemberNotFound {
                id: "member-1".to_string()
            }
            .is_user_error()
        );
    }
}
