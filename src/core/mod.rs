//! Core business logic - framework-agnostic member, plan, status and storage operations.

/// Member records, validation and enrollment
pub mod member;
/// Snapshot storage, export and import
pub mod persistence;
/// Plan catalog types
pub mod plan;
/// Dashboard statistics
pub mod stats;
/// Membership lifecycle status derivation
pub mod status;
/// The in-memory record store
pub mod store;
/// Background snapshot writer
pub mod writer;
