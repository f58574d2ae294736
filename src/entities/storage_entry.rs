//! Storage entry entity - the local key-value store backing persistence.
//!
//! Each row holds one JSON document under a fixed namespace key. The record
//! store is saved as a single entry so a save replaces the whole document.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Storage entry database model - one JSON document per key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_entries")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Namespace key (e.g. `"gym-registration"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Serialized JSON document
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this entry was last written
    pub updated_at: DateTime,
}

/// `StorageEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
