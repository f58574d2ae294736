//! Persistence gateway - saves and restores the record store snapshot.
//!
//! The snapshot `{ members, plans }` is stored as one JSON document under a
//! fixed namespace key in the local `storage_entries` table. Saves run inside
//! a database transaction, so a concurrent load sees either the previous
//! document or the new one, never a partial write.
//!
//! The gateway also builds the portable export document handed to users for
//! backups, and parses such documents back into a snapshot.

use crate::{
    config::gym::GymSettings,
    core::{member::Member, plan::Plan, store::Snapshot},
    entities::{StorageEntry, storage_entry},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Namespace key the snapshot is stored under
pub const STORAGE_KEY: &str = "gym-registration";

/// Reads and writes snapshots in local storage.
#[derive(Debug, Clone)]
pub struct SnapshotGateway {
    db: DatabaseConnection,
    key: String,
}

impl SnapshotGateway {
    /// A gateway storing under [`STORAGE_KEY`].
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_key(db, STORAGE_KEY)
    }

    /// A gateway storing under a custom key.
    #[must_use]
    pub fn with_key(db: DatabaseConnection, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
        }
    }

    /// Writes the snapshot, replacing any previous one.
    ///
    /// The document is fully serialized before the transaction starts and the
    /// upsert is committed as a unit.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let value = serde_json::to_string(snapshot)?;
        let now = Utc::now().naive_utc();

        let txn = self.db.begin().await?;

        let existing = StorageEntry::find()
            .filter(storage_entry::Column::Key.eq(self.key.as_str()))
            .one(&txn)
            .await?;

        if let Some(entry) = existing {
            let mut active_model: storage_entry::ActiveModel = entry.into();
            active_model.value = Set(value);
            active_model.updated_at = Set(now);
            active_model.update(&txn).await?;
        } else {
            let entry = storage_entry::ActiveModel {
                key: Set(self.key.clone()),
                value: Set(value),
                updated_at: Set(now),
                ..Default::default()
            };
            entry.insert(&txn).await?;
        }

        txn.commit().await?;

        debug!(
            key = %self.key,
            members = snapshot.members.len(),
            plans = snapshot.plans.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Reads the stored snapshot.
    ///
    /// # Returns
    /// * `Ok(None)` - nothing has been saved yet
    /// * `Err(Error::Corruption)` - the stored document is not a valid snapshot
    pub async fn load(&self) -> Result<Option<Snapshot>> {
        let Some(entry) = StorageEntry::find()
            .filter(storage_entry::Column::Key.eq(self.key.as_str()))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let snapshot = serde_json::from_str(&entry.value).map_err(|e| Error::Corruption {
            message: e.to_string(),
        })?;
        Ok(Some(snapshot))
    }

    /// Reads the stored snapshot, falling back to `fallback` when nothing is
    /// stored or the stored data cannot be read.
    ///
    /// Failures are logged, never returned: the application must stay usable
    /// with default state.
    pub async fn load_or_default(&self, fallback: Snapshot) -> Snapshot {
        match self.load().await {
            Ok(Some(snapshot)) => {
                info!(
                    "Restored {} members and {} plans from local storage",
                    snapshot.members.len(),
                    snapshot.plans.len()
                );
                snapshot
            }
            Ok(None) => {
                info!("No saved data found, starting with defaults");
                fallback
            }
            Err(e) => {
                warn!("Could not restore saved data, starting with defaults: {}", e);
                fallback
            }
        }
    }
}

/// Portable backup of the whole application state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// All members
    pub members: Vec<Member>,
    /// All plans
    pub plans: Vec<Plan>,
    /// Gym settings at export time
    pub settings: GymSettings,
    /// When the export was produced
    pub export_date: DateTime<Utc>,
}

impl ExportDocument {
    /// Bundles a snapshot with the settings and a timestamp. No side effects.
    #[must_use]
    pub fn new(snapshot: Snapshot, settings: GymSettings, now: DateTime<Utc>) -> Self {
        Self {
            members: snapshot.members,
            plans: snapshot.plans,
            settings,
            export_date: now,
        }
    }

    /// Pretty-printed JSON, as offered for download.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// File name for this export, e.g. `fitgym-backup-2024-05-01.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        export_file_name(self.export_date)
    }
}

/// File name for an export produced at `now`.
#[must_use]
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("fitgym-backup-{}.json", now.format("%Y-%m-%d"))
}

/// Reads the members and plans back out of an export document.
///
/// Settings and the export timestamp are ignored. Statuses in the document
/// are not trusted; they are recomputed when the snapshot enters a store.
pub fn parse_export(json: &str) -> Result<Snapshot> {
    serde_json::from_str(json).map_err(|e| Error::Corruption {
        message: e.to_string(),
    })
}
