//! Application state shared by the view layer.
//!
//! [`App`] is built once at startup with [`App::init`] and passed by reference
//! to whoever needs it. It owns the record store, the snapshot writer and the
//! gym settings. All store mutations go through [`App::dispatch`], which
//! applies one [`Intent`] under the write lock and queues a snapshot when the
//! persisted collections changed.

use crate::{
    config::gym::GymSettings,
    core::{
        member::Member,
        persistence::{ExportDocument, SnapshotGateway},
        plan::Plan,
        status::StatusFilter,
        store::{RecordStore, Snapshot, SortKey, SortOrder},
        writer::SnapshotWriter,
    },
    errors::Result,
};
use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

/// A request from the view layer
#[derive(Debug, Clone)]
pub enum Intent {
    /// Register a member
    AddMember(Member),
    /// Replace an existing member
    UpdateMember(Member),
    /// Remove a member by id
    DeleteMember(String),
    /// Change the listing search term
    SetSearchTerm(String),
    /// Change the listing status filter
    SetFilterStatus(StatusFilter),
    /// Change the listing order
    SetSorting(SortKey, SortOrder),
    /// Add a plan to the catalog
    AddPlan(Plan),
    /// Replace an existing plan
    UpdatePlan(Plan),
    /// Remove a plan by id
    DeletePlan(String),
    /// Flip a plan's active flag
    TogglePlanActive(String),
    /// Recompute every member's status
    RefreshAllStatuses,
}

/// What a dispatched intent did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The intent was applied
    Applied,
    /// A delete ran; `false` means the id was already gone
    Removed(bool),
    /// A plan was toggled to this active state
    PlanActive(bool),
    /// A status refresh changed this many members
    StatusesChanged(usize),
}

/// The running application
#[derive(Debug)]
pub struct App {
    store: RwLock<RecordStore>,
    writer: Mutex<Option<SnapshotWriter>>,
    settings: GymSettings,
    catalog: Vec<Plan>,
}

impl App {
    /// Restores the saved snapshot (or starts from `catalog` with no members),
    /// recomputes statuses against `now`, and starts the snapshot writer.
    ///
    /// # Errors
    /// [`crate::errors::Error::Config`] when the settings carry an invalid day offset.
    pub async fn init(
        gateway: SnapshotGateway,
        settings: GymSettings,
        catalog: Vec<Plan>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let day_offset = settings.day_offset()?;
        let fallback = Snapshot {
            members: Vec::new(),
            plans: catalog.clone(),
        };
        let snapshot = gateway.load_or_default(fallback).await;
        let store = RecordStore::from_snapshot(snapshot, now).with_day_offset(day_offset, now);
        info!(
            "Store ready with {} members and {} plans",
            store.members().len(),
            store.plans().len()
        );

        Ok(Self {
            store: RwLock::new(store),
            writer: Mutex::new(Some(SnapshotWriter::spawn(gateway))),
            settings,
            catalog,
        })
    }

    /// Shared read access to the store.
    pub async fn read(&self) -> RwLockReadGuard<'_, RecordStore> {
        self.store.read().await
    }

    /// Gym settings loaded at startup.
    #[must_use]
    pub const fn settings(&self) -> &GymSettings {
        &self.settings
    }

    /// The UTC offset at which the gym's calendar days start.
    pub async fn day_offset(&self) -> FixedOffset {
        self.store.read().await.day_offset()
    }

    /// Applies one intent. Member and plan changes are queued for saving.
    pub async fn dispatch(&self, intent: Intent, now: DateTime<Utc>) -> Result<Outcome> {
        let mut store = self.store.write().await;
        debug!(?intent, "Dispatching intent");

        let (outcome, persist) = match intent {
            Intent::AddMember(member) => {
                store.add_member(member, now)?;
                (Outcome::Applied, true)
            }
            Intent::UpdateMember(member) => {
                store.update_member(member, now)?;
                (Outcome::Applied, true)
            }
            Intent::DeleteMember(id) => {
                let removed = store.delete_member(&id);
                (Outcome::Removed(removed), removed)
            }
            Intent::SetSearchTerm(term) => {
                store.set_search_term(term);
                (Outcome::Applied, false)
            }
            Intent::SetFilterStatus(filter) => {
                store.set_filter_status(filter);
                (Outcome::Applied, false)
            }
            Intent::SetSorting(key, order) => {
                store.set_sorting(key, order);
                (Outcome::Applied, false)
            }
            Intent::AddPlan(plan) => {
                store.add_plan(plan)?;
                (Outcome::Applied, true)
            }
            Intent::UpdatePlan(plan) => {
                store.update_plan(plan)?;
                (Outcome::Applied, true)
            }
            Intent::DeletePlan(id) => {
                let removed = store.delete_plan(&id);
                (Outcome::Removed(removed), removed)
            }
            Intent::TogglePlanActive(id) => {
                let active = store.toggle_plan_active(&id)?;
                (Outcome::PlanActive(active), true)
            }
            Intent::RefreshAllStatuses => {
                let changed = store.refresh_all_statuses(now);
                (Outcome::StatusesChanged(changed), changed > 0)
            }
        };

        if persist {
            self.persist(store.snapshot()).await;
        }
        Ok(outcome)
    }

    /// Recomputes every member's status. Called whenever a view opens.
    pub async fn refresh_statuses(&self, now: DateTime<Utc>) -> Result<usize> {
        match self.dispatch(Intent::RefreshAllStatuses, now).await? {
            Outcome::StatusesChanged(changed) => Ok(changed),
            _ => Ok(0),
        }
    }

    /// Builds the export document for the current state.
    pub async fn export(&self, now: DateTime<Utc>) -> ExportDocument {
        let snapshot = self.store.read().await.snapshot();
        ExportDocument::new(snapshot, self.settings.clone(), now)
    }

    /// Replaces all members and plans with `snapshot`, recomputing statuses.
    ///
    /// The current state is kept when the snapshot holds an invalid record.
    ///
    /// # Errors
    /// [`crate::errors::Error::Validation`] naming the first invalid or duplicated record.
    pub async fn restore(&self, snapshot: Snapshot, now: DateTime<Utc>) -> Result<()> {
        let mut store = self.store.write().await;
        let restored =
            RecordStore::try_from_snapshot(snapshot, now)?.with_day_offset(store.day_offset(), now);
        *store = restored;
        info!(
            "Restored {} members and {} plans from import",
            store.members().len(),
            store.plans().len()
        );
        self.persist(store.snapshot()).await;
        Ok(())
    }

    /// Drops every member and restores the startup plan catalog.
    pub async fn clear_all(&self) {
        let mut store = self.store.write().await;
        store.reset(self.catalog.clone());
        info!("Cleared all members and reset the plan catalog");
        self.persist(store.snapshot()).await;
    }

    /// Flushes the last pending snapshot and stops the writer.
    ///
    /// Returns the number of saves the writer ran. Later calls return 0, and
    /// changes made after shutdown stay in memory only.
    pub async fn shutdown(&self) -> usize {
        let writer = self.writer.lock().await.take();
        match writer {
            Some(writer) => writer.shutdown().await,
            None => 0,
        }
    }

    async fn persist(&self, snapshot: Snapshot) {
        match self.writer.lock().await.as_ref() {
            Some(writer) => writer.enqueue(snapshot),
            None => warn!("Snapshot writer already stopped; change not saved"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::plan::default_catalog;
    use crate::core::status::MemberStatus;
    use crate::errors::Error;
    use crate::test_utils::{init_test_tracing, sample_member, setup_test_gateway, ts};
    use chrono::Duration;

    async fn fresh_app(now: DateTime<Utc>) -> Result<(App, SnapshotGateway)> {
        let gateway = setup_test_gateway().await?;
        let app = App::init(
            gateway.clone(),
            GymSettings::default(),
            default_catalog(),
            now,
        )
        .await?;
        Ok((app, gateway))
    }

    #[tokio::test]
    async fn test_init_without_saved_data_uses_catalog() -> Result<()> {
        let now = ts(2024, 5, 1);
        let (app, _) = fresh_app(now).await?;
        {
            let store = app.read().await;
            assert!(store.members().is_empty());
            assert_eq!(store.plans(), default_catalog().as_slice());
        }
        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_mutations_are_persisted_and_restored() -> Result<()> {
        init_test_tracing();
        let now = ts(2024, 5, 1);
        let (app, gateway) = fresh_app(now).await?;

        let member = sample_member("member-1", "Jane Doe", now, now + Duration::days(40));
        app.dispatch(Intent::AddMember(member), now).await?;
        app.dispatch(Intent::TogglePlanActive("plan-2".to_string()), now)
            .await?;
        app.dispatch(Intent::SetSearchTerm("jane".to_string()), now)
            .await?;
        app.shutdown().await;

        // A later start sees the saved data with statuses recomputed for its own "now"
        let later = now + Duration::days(30);
        let app = App::init(gateway, GymSettings::default(), default_catalog(), later).await?;
        {
            let store = app.read().await;
            assert_eq!(store.members().len(), 1);
            assert_eq!(store.members()[0].status, MemberStatus::ExpiringSoon);
            assert!(!store.plan("plan-2").unwrap().is_active);
            assert_eq!(store.view().search_term, "");
        }
        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_outcomes() -> Result<()> {
        let now = ts(2024, 5, 1);
        let (app, _) = fresh_app(now).await?;
        let member = sample_member("member-1", "Jane Doe", now, now + Duration::days(20));
        app.dispatch(Intent::AddMember(member.clone()), now).await?;

        assert_eq!(
            app.dispatch(Intent::TogglePlanActive("plan-1".to_string()), now)
                .await?,
            Outcome::PlanActive(false)
        );
        assert_eq!(app.refresh_statuses(now + Duration::days(10)).await?, 1);
        assert_eq!(
            app.dispatch(Intent::DeleteMember("member-1".to_string()), now)
                .await?,
            Outcome::Removed(true)
        );
        assert_eq!(
            app.dispatch(Intent::DeleteMember("member-1".to_string()), now)
                .await?,
            Outcome::Removed(false)
        );

        let err = app
            .dispatch(Intent::UpdateMember(member), now)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MemberNotFound { .. }));
        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_export_restore_and_clear() -> Result<()> {
        let now = ts(2024, 5, 1);
        let (app, gateway) = fresh_app(now).await?;
        let member = sample_member("member-1", "Jane Doe", now, now + Duration::days(20));
        app.dispatch(Intent::AddMember(member), now).await?;

        let doc = app.export(now).await;
        assert_eq!(doc.members.len(), 1);
        assert_eq!(doc.settings, GymSettings::default());

        app.clear_all().await;
        assert!(app.read().await.members().is_empty());

        let imported =
            crate::core::persistence::parse_export(&doc.to_json_pretty()?)?;
        app.restore(imported, now).await?;
        assert_eq!(app.read().await.members().len(), 1);

        app.clear_all().await;
        app.shutdown().await;
        let saved = gateway.load().await?.unwrap();
        assert!(saved.members.is_empty());
        assert_eq!(saved.plans, default_catalog());
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_through_shared_handle_flushes() -> Result<()> {
        let now = ts(2024, 5, 1);
        let (app, gateway) = fresh_app(now).await?;
        let app = std::sync::Arc::new(app);
        let still_running = std::sync::Arc::clone(&app);

        let member = sample_member("member-1", "Jane Doe", now, now + Duration::days(20));
        app.dispatch(Intent::AddMember(member), now).await?;
        app.shutdown().await;
        assert_eq!(still_running.shutdown().await, 0);

        let saved = gateway.load().await?.unwrap();
        assert_eq!(saved.members.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_day_offset_from_settings() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        let settings = GymSettings {
            utc_offset_minutes: -300,
            ..GymSettings::default()
        };
        // 02:00 UTC on June 16 is still June 15 five hours west
        let now = ts(2024, 6, 16) + Duration::hours(2);
        let app = App::init(gateway, settings, default_catalog(), now).await?;
        assert_eq!(app.day_offset().await.local_minus_utc(), -5 * 3600);

        let member = sample_member("member-1", "Jane Doe", ts(2024, 5, 15), ts(2024, 6, 15) + Duration::hours(12));
        app.dispatch(Intent::AddMember(member), now).await?;
        assert_eq!(
            app.read().await.member("member-1").unwrap().status,
            MemberStatus::ExpiringSoon
        );
        app.shutdown().await;

        let bad = GymSettings {
            utc_offset_minutes: 5000,
            ..GymSettings::default()
        };
        let err = App::init(setup_test_gateway().await?, bad, default_catalog(), now)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        Ok(())
    }
}
