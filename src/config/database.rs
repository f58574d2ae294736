//! Database configuration module for `GymBuddy`.
//!
//! Local storage is a `SQLite` file accessed through `SeaORM`. The schema is a
//! single key-value table generated from the [`StorageEntry`] entity with
//! `Schema::create_table_from_entity`, so it always matches the Rust model.

use crate::entities::StorageEntry;
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::debug;

/// Default location of the local database file.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/gym_buddy.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the default path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the `SQLite` database at `database_url`.
///
/// For file-backed URLs the parent directory is created first so a fresh
/// checkout can start without manual setup.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_path(database_url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            debug!("Ensuring database directory {:?} exists", parent);
            std::fs::create_dir_all(parent)?;
        }
    }

    Database::connect(database_url).await.map_err(Into::into)
}

/// The file path inside a `sqlite://` URL, or `None` for in-memory databases.
fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(Path::new(path))
}

/// Creates the storage table if it does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut storage_table = schema.create_table_from_entity(StorageEntry);
    storage_table.if_not_exists();

    db.execute(builder.build(&storage_table)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::StorageEntryModel;
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<StorageEntryModel> = StorageEntry::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(
            sqlite_file_path(DEFAULT_DATABASE_URL),
            Some(Path::new("data/gym_buddy.sqlite"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
    }
}
