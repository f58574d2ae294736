//! Entity module - SeaORM entity definitions for local storage.

pub mod storage_entry;

pub use storage_entry::{Entity as StorageEntry, Model as StorageEntryModel};
