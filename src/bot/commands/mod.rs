//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Dashboard, export, import and reset commands
pub mod dashboard;

/// General utility commands
pub mod general;

/// Member commands
pub mod member;

/// Plan catalog commands
pub mod plan;

// Export commands
pub use dashboard::*;
pub use general::*;
pub use member::*;
pub use plan::*;
