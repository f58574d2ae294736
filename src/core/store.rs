//! The record store - authoritative in-memory collections of members and plans.
//!
//! Every mutation keeps these invariants:
//! - each member's cached status equals `derive_status_at(plan.end_date, now, offset)`
//!   for the `now` passed to the mutation and the store's day offset;
//! - ids are unique within each collection;
//! - insertion order is preserved, deletes remove without reordering.
//!
//! Listing state (search term, status filter, sort order) lives here as well but
//! is never part of a [`Snapshot`].

use crate::{
    core::{
        member::Member,
        plan::Plan,
        status::{MemberStatus, StatusFilter},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::HashSet};
use tracing::debug;

/// The persisted part of the store
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// All members in insertion order
    pub members: Vec<Member>,
    /// All plans in insertion order
    pub plans: Vec<Plan>,
}

/// Member listing sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Case-insensitive name
    #[default]
    Name,
    /// Registration timestamp
    JoiningDate,
    /// Plan end date
    ExpiryDate,
}

/// Member listing sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// A non-mutating projection over the member collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberQuery {
    /// Search term, empty matches everything
    pub search: String,
    /// Status filter
    pub status: StatusFilter,
    /// Optional ordering; `None` keeps insertion order
    pub sort: Option<(SortKey, SortOrder)>,
}

/// Transient listing state driven by the view layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Current search term
    pub search_term: String,
    /// Current status filter
    pub filter_status: StatusFilter,
    /// Current sort key
    pub sort_by: SortKey,
    /// Current sort direction
    pub sort_order: SortOrder,
}

impl ViewState {
    /// The query this view state describes.
    #[must_use]
    pub fn to_query(&self) -> MemberQuery {
        MemberQuery {
            search: self.search_term.clone(),
            status: self.filter_status,
            sort: Some((self.sort_by, self.sort_order)),
        }
    }
}

/// In-memory member and plan collections.
#[derive(Debug, Clone)]
pub struct RecordStore {
    members: Vec<Member>,
    plans: Vec<Plan>,
    view: ViewState,
    day_offset: FixedOffset,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::with_plans(Vec::new())
    }
}

impl RecordStore {
    /// A store with no members and the given plan catalog. Days are counted in UTC.
    #[must_use]
    pub fn with_plans(plans: Vec<Plan>) -> Self {
        Self {
            members: Vec::new(),
            plans,
            view: ViewState::default(),
            day_offset: Utc.fix(),
        }
    }

    /// Rebuilds a store from a snapshot, recomputing every member's status against `now`.
    ///
    /// Persisted statuses are never trusted. The records themselves are taken
    /// as they are; use [`RecordStore::try_from_snapshot`] for untrusted input.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot, now: DateTime<Utc>) -> Self {
        let mut store = Self::with_plans(snapshot.plans);
        store.members = snapshot.members;
        store.refresh_all_statuses(now);
        store
    }

    /// Like [`RecordStore::from_snapshot`], but every member and plan must pass
    /// validation and ids must be unique within each collection.
    ///
    /// # Errors
    /// The first offending record, as [`Error::Validation`] naming its position.
    pub fn try_from_snapshot(snapshot: Snapshot, now: DateTime<Utc>) -> Result<Self> {
        let mut plan_ids = HashSet::new();
        for (index, plan) in snapshot.plans.iter().enumerate() {
            plan.validate().map_err(|e| at_record("plans", index, e))?;
            if !plan_ids.insert(plan.id.as_str()) {
                return Err(Error::validation(
                    format!("plans[{index}].id"),
                    format!("Duplicate plan id '{}'", plan.id),
                ));
            }
        }

        let mut member_ids = HashSet::new();
        for (index, member) in snapshot.members.iter().enumerate() {
            member.validate().map_err(|e| at_record("members", index, e))?;
            if !member_ids.insert(member.id.as_str()) {
                return Err(Error::validation(
                    format!("members[{index}].id"),
                    format!("Duplicate member id '{}'", member.id),
                ));
            }
        }

        Ok(Self::from_snapshot(snapshot, now))
    }

    /// Counts calendar days at `offset` from now on and recomputes every status against `now`.
    #[must_use]
    pub fn with_day_offset(mut self, offset: FixedOffset, now: DateTime<Utc>) -> Self {
        self.day_offset = offset;
        self.refresh_all_statuses(now);
        self
    }

    /// The UTC offset at which calendar days start.
    #[must_use]
    pub const fn day_offset(&self) -> FixedOffset {
        self.day_offset
    }

    /// Copies out the persisted part of the store.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            members: self.members.clone(),
            plans: self.plans.clone(),
        }
    }

    /// All members in insertion order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// All plans in insertion order.
    #[must_use]
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// Looks up a member by id.
    #[must_use]
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Looks up a plan by id.
    #[must_use]
    pub fn plan(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == id)
    }

    /// Looks up a plan by name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn plan_by_name(&self, name: &str) -> Option<&Plan> {
        let wanted = name.trim().to_lowercase();
        self.plans.iter().find(|p| p.name.to_lowercase() == wanted)
    }

    // --- Members ---

    /// Appends a new member after validating it and deriving its status.
    pub fn add_member(&mut self, mut member: Member, now: DateTime<Utc>) -> Result<()> {
        member.validate()?;
        if self.member(&member.id).is_some() {
            return Err(Error::validation(
                "id",
                format!("A member with id '{}' already exists", member.id),
            ));
        }
        member.refresh_status_at(now, self.day_offset);
        debug!(id = %member.id, status = %member.status, "Adding member");
        self.members.push(member);
        Ok(())
    }

    /// Replaces an existing member in place.
    ///
    /// Fails with [`Error::MemberNotFound`] when the id is unknown. The stored
    /// joining date is kept; the status is recomputed.
    pub fn update_member(&mut self, mut member: Member, now: DateTime<Utc>) -> Result<()> {
        member.validate()?;
        let slot = self
            .members
            .iter_mut()
            .find(|m| m.id == member.id)
            .ok_or_else(|| Error::MemberNotFound {
                id: member.id.clone(),
            })?;
        member.joining_date = slot.joining_date;
        member.refresh_status_at(now, self.day_offset);
        debug!(id = %member.id, status = %member.status, "Updating member");
        *slot = member;
        Ok(())
    }

    /// Removes a member. Returns whether anything was removed; an unknown id is not an error.
    pub fn delete_member(&mut self, id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        let removed = self.members.len() != before;
        debug!(id, removed, "Deleting member");
        removed
    }

    /// Recomputes every member's status against `now`. Returns how many changed.
    pub fn refresh_all_statuses(&mut self, now: DateTime<Utc>) -> usize {
        let offset = self.day_offset;
        let changed = self
            .members
            .iter_mut()
            .map(|m| m.refresh_status_at(now, offset))
            .filter(|&changed| changed)
            .count();
        debug!(changed, total = self.members.len(), "Refreshed member statuses");
        changed
    }

    /// Drops every member and replaces the plan catalog.
    pub fn reset(&mut self, plans: Vec<Plan>) {
        self.members.clear();
        self.plans = plans;
        self.view = ViewState::default();
    }

    // --- Plans ---

    /// Appends a new plan after validating it.
    pub fn add_plan(&mut self, plan: Plan) -> Result<()> {
        plan.validate()?;
        if self.plan(&plan.id).is_some() {
            return Err(Error::validation(
                "id",
                format!("A plan with id '{}' already exists", plan.id),
            ));
        }
        debug!(id = %plan.id, name = %plan.name, "Adding plan");
        self.plans.push(plan);
        Ok(())
    }

    /// Replaces an existing plan in place. Members keep their enrollment snapshots.
    pub fn update_plan(&mut self, plan: Plan) -> Result<()> {
        plan.validate()?;
        let slot = self
            .plans
            .iter_mut()
            .find(|p| p.id == plan.id)
            .ok_or_else(|| Error::PlanNotFound {
                id: plan.id.clone(),
            })?;
        debug!(id = %plan.id, "Updating plan");
        *slot = plan;
        Ok(())
    }

    /// Removes a plan. Returns whether anything was removed. Enrolled members are untouched.
    pub fn delete_plan(&mut self, id: &str) -> bool {
        let before = self.plans.len();
        self.plans.retain(|p| p.id != id);
        let removed = self.plans.len() != before;
        debug!(id, removed, "Deleting plan");
        removed
    }

    /// Flips a plan's `is_active` flag. Returns the new value.
    pub fn toggle_plan_active(&mut self, id: &str) -> Result<bool> {
        let plan = self
            .plans
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::PlanNotFound { id: id.to_string() })?;
        plan.is_active = !plan.is_active;
        debug!(id, is_active = plan.is_active, "Toggled plan");
        Ok(plan.is_active)
    }

    // --- Projections ---

    /// Members whose name or email contains `term` (any case), or whose phone contains it.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| matches_search(m, term))
            .collect()
    }

    /// Members passing `filter`.
    #[must_use]
    pub fn filter_by_status(&self, filter: StatusFilter) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| filter.matches(m.status))
            .collect()
    }

    /// Applies filter, search and ordering in one pass.
    #[must_use]
    pub fn query(&self, query: &MemberQuery) -> Vec<&Member> {
        let mut found: Vec<&Member> = self
            .members
            .iter()
            .filter(|m| query.status.matches(m.status) && matches_search(m, &query.search))
            .collect();
        if let Some((key, order)) = query.sort {
            found.sort_by(|a, b| {
                let ordering = compare_members(a, b, key);
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }
        found
    }

    /// Number of members per status, in `[active, expiring-soon, expired]` order.
    #[must_use]
    pub fn status_counts(&self) -> [(MemberStatus, usize); 3] {
        [
            MemberStatus::Active,
            MemberStatus::ExpiringSoon,
            MemberStatus::Expired,
        ]
        .map(|s| (s, self.members.iter().filter(|m| m.status == s).count()))
    }

    // --- Listing state ---

    /// Current listing state.
    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    /// Sets the listing search term.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.view.search_term = term.into();
    }

    /// Sets the listing status filter.
    pub fn set_filter_status(&mut self, filter: StatusFilter) {
        self.view.filter_status = filter;
    }

    /// Sets the listing order.
    pub fn set_sorting(&mut self, sort_by: SortKey, sort_order: SortOrder) {
        self.view.sort_by = sort_by;
        self.view.sort_order = sort_order;
    }

    /// Members as the current listing state shows them.
    #[must_use]
    pub fn visible_members(&self) -> Vec<&Member> {
        self.query(&self.view.to_query())
    }
}

/// Prefixes a validation error with the record's position in an imported document.
fn at_record(collection: &str, index: usize, error: Error) -> Error {
    match error {
        Error::Validation { field, message } => {
            Error::validation(format!("{collection}[{index}].{field}"), message)
        }
        other => other,
    }
}

fn matches_search(member: &Member, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    member.name.to_lowercase().contains(&needle)
        || member.email.to_lowercase().contains(&needle)
        || member.phone.contains(term)
}

fn compare_members(a: &Member, b: &Member, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::JoiningDate => a.joining_date.cmp(&b.joining_date),
        SortKey::ExpiryDate => a.plan.end_date.cmp(&b.plan.end_date),
    }
}
