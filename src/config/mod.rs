/// Database configuration and connection management
pub mod database;

/// Gym settings and plan catalog loading from config.toml
pub mod gym;
