//! Member Discord commands - listing, details, registration, edits and removal.
//!
//! Each command is a thin wrapper: it converts its Discord parameters into
//! core types, runs one of the helpers below against the shared [`App`], and
//! hands the result to [`reply`](crate::bot::reply). The helpers return the
//! reply text so they can be exercised without a Discord connection.

use crate::{
    app::{App, Intent, Outcome},
    bot::format,
    core::{
        member::{Gender, Member, MemberForm},
        plan::Plan,
        status::{MemberStatus, StatusFilter},
        store::{MemberQuery, SortKey, SortOrder},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::MemberChanges;
    use crate::{
        bot::{
            Context,
            choices::{GenderChoice, OrderChoice, SortChoice, StatusChoice},
            handlers::autocomplete,
            reply,
        },
        core::member::{Address, EmergencyContact, MemberForm},
        errors::Result,
    };
    use chrono::Utc;

    /// Lists members, optionally searched, filtered and sorted.
    ///
    /// The search term and status filter apply to this listing only. A sort
    /// choice is remembered for later listings.
    #[poise::command(slash_command, prefix_command)]
    pub async fn members(
        ctx: Context<'_>,
        #[description = "Search by name, email or phone"] search: Option<String>,
        #[description = "Only show members with this status"] status: Option<StatusChoice>,
        #[description = "Sort by"] sort: Option<SortChoice>,
        #[description = "Sort direction"] order: Option<OrderChoice>,
    ) -> Result<()> {
        let result = super::list_members(
            &ctx.data().app,
            search,
            status.map(Into::into),
            sort.map(Into::into),
            order.map(Into::into),
            Utc::now(),
        )
        .await;
        reply(ctx, result).await
    }

    /// Shows everything stored about one member.
    #[poise::command(slash_command, prefix_command)]
    pub async fn member_info(
        ctx: Context<'_>,
        #[description = "Member id"]
        #[autocomplete = "autocomplete::autocomplete_member_id"]
        id: String,
    ) -> Result<()> {
        let result = super::member_info_text(&ctx.data().app, &id, Utc::now()).await;
        reply(ctx, result).await
    }

    /// Registers a new member on an active plan starting today.
    #[allow(clippy::too_many_arguments)] // One parameter per registration field
    #[poise::command(slash_command, prefix_command)]
    pub async fn member_add(
        ctx: Context<'_>,
        #[description = "Full name"] name: String,
        #[description = "Age (16-100)"] age: u8,
        #[description = "Gender"] gender: GenderChoice,
        #[description = "Email address"] email: String,
        #[description = "Phone number"] phone: String,
        #[description = "Membership plan"]
        #[autocomplete = "autocomplete::autocomplete_plan_name"]
        plan: String,
        #[description = "Emergency contact name"] contact_name: String,
        #[description = "Emergency contact phone"] contact_phone: String,
        #[description = "Emergency contact relationship"] contact_relationship: String,
        #[description = "Street address"] street: String,
        #[description = "City"] city: String,
        #[description = "State"] state: String,
        #[description = "ZIP code"] zip_code: String,
        #[description = "Notes (optional)"] notes: Option<String>,
    ) -> Result<()> {
        let form = MemberForm {
            name,
            age,
            gender: gender.into(),
            email,
            phone,
            emergency_contact: EmergencyContact {
                name: contact_name,
                phone: contact_phone,
                relationship: contact_relationship,
            },
            address: Address {
                street,
                city,
                state,
                zip_code,
            },
            notes,
        };
        let result = super::register_member(&ctx.data().app, form, &plan, Utc::now()).await;
        reply(ctx, result).await
    }

    /// Edits a member. Only the given fields change; giving a plan renews it from today.
    #[allow(clippy::too_many_arguments)] // One optional parameter per editable field
    #[poise::command(slash_command, prefix_command)]
    pub async fn member_update(
        ctx: Context<'_>,
        #[description = "Member id"]
        #[autocomplete = "autocomplete::autocomplete_member_id"]
        id: String,
        #[description = "New full name"] name: Option<String>,
        #[description = "New age"] age: Option<u8>,
        #[description = "New gender"] gender: Option<GenderChoice>,
        #[description = "New email"] email: Option<String>,
        #[description = "New phone"] phone: Option<String>,
        #[description = "Renew on this plan from today"]
        #[autocomplete = "autocomplete::autocomplete_plan_name"]
        plan: Option<String>,
        #[description = "New emergency contact name"] contact_name: Option<String>,
        #[description = "New emergency contact phone"] contact_phone: Option<String>,
        #[description = "New emergency contact relationship"]
        contact_relationship: Option<String>,
        #[description = "New street address"] street: Option<String>,
        #[description = "New city"] city: Option<String>,
        #[description = "New state"] state: Option<String>,
        #[description = "New ZIP code"] zip_code: Option<String>,
        #[description = "New notes (blank clears)"] notes: Option<String>,
    ) -> Result<()> {
        let changes = MemberChanges {
            name,
            age,
            gender: gender.map(Into::into),
            email,
            phone,
            contact_name,
            contact_phone,
            contact_relationship,
            street,
            city,
            state,
            zip_code,
            notes,
        };
        let result = super::edit_member(
            &ctx.data().app,
            &id,
            changes,
            plan.as_deref(),
            Utc::now(),
        )
        .await;
        reply(ctx, result).await
    }

    /// Removes a member permanently.
    #[poise::command(slash_command, prefix_command)]
    pub async fn member_delete(
        ctx: Context<'_>,
        #[description = "Member id"]
        #[autocomplete = "autocomplete::autocomplete_member_id"]
        id: String,
    ) -> Result<()> {
        let result = super::remove_member(&ctx.data().app, &id, Utc::now()).await;
        reply(ctx, result).await
    }
}

// Re-export all commands
pub use inner::*;

/// Optional edits to an existing member.
#[derive(Debug, Clone, Default)]
pub struct MemberChanges {
    /// New name
    pub name: Option<String>,
    /// New age
    pub age: Option<u8>,
    /// New gender
    pub gender: Option<Gender>,
    /// New email
    pub email: Option<String>,
    /// New phone
    pub phone: Option<String>,
    /// New emergency contact name
    pub contact_name: Option<String>,
    /// New emergency contact phone
    pub contact_phone: Option<String>,
    /// New emergency contact relationship
    pub contact_relationship: Option<String>,
    /// New street
    pub street: Option<String>,
    /// New city
    pub city: Option<String>,
    /// New state
    pub state: Option<String>,
    /// New ZIP code
    pub zip_code: Option<String>,
    /// New notes; a blank value clears them
    pub notes: Option<String>,
}

impl MemberChanges {
    /// Writes the given fields onto `member`.
    pub fn apply(self, member: &mut Member) {
        fn set(target: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *target = value.trim().to_string();
            }
        }

        set(&mut member.name, self.name);
        set(&mut member.email, self.email);
        set(&mut member.phone, self.phone);
        set(&mut member.emergency_contact.name, self.contact_name);
        set(&mut member.emergency_contact.phone, self.contact_phone);
        set(
            &mut member.emergency_contact.relationship,
            self.contact_relationship,
        );
        set(&mut member.address.street, self.street);
        set(&mut member.address.city, self.city);
        set(&mut member.address.state, self.state);
        set(&mut member.address.zip_code, self.zip_code);
        if let Some(age) = self.age {
            member.age = age;
        }
        if let Some(gender) = self.gender {
            member.gender = gender;
        }
        if let Some(notes) = self.notes {
            let notes = notes.trim();
            member.notes = (!notes.is_empty()).then(|| notes.to_string());
        }
    }

    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.contact_name.is_none()
            && self.contact_phone.is_none()
            && self.contact_relationship.is_none()
            && self.street.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip_code.is_none()
            && self.notes.is_none()
    }
}

async fn find_plan(app: &App, name: &str) -> Result<Plan> {
    app.read()
        .await
        .plan_by_name(name)
        .cloned()
        .ok_or_else(|| Error::PlanNotFound {
            id: name.to_string(),
        })
}

async fn list_members(
    app: &App,
    search: Option<String>,
    status: Option<MemberStatus>,
    sort: Option<SortKey>,
    order: Option<SortOrder>,
    now: DateTime<Utc>,
) -> Result<String> {
    app.refresh_statuses(now).await?;
    // Only the sort is remembered between listings
    if sort.is_some() || order.is_some() {
        let current = app.read().await.view().clone();
        app.dispatch(
            Intent::SetSorting(
                sort.unwrap_or(current.sort_by),
                order.unwrap_or(current.sort_order),
            ),
            now,
        )
        .await?;
    }

    let store = app.read().await;
    if store.members().is_empty() {
        return Ok("👥 No members registered yet. Add one with `/member_add`.".to_string());
    }
    let view = store.view();
    let visible = store.query(&MemberQuery {
        search: search.unwrap_or_default(),
        status: StatusFilter::from(status),
        sort: Some((view.sort_by, view.sort_order)),
    });
    if visible.is_empty() {
        return Ok("🔍 No members match this search and filter.".to_string());
    }

    let counts = store
        .status_counts()
        .iter()
        .map(|(status, n)| format!("{} {n}", format::status_badge(*status)))
        .collect::<Vec<_>>()
        .join(" ");
    let header = format!(
        "👥 **Members** ({} of {}) {counts}",
        visible.len(),
        store.members().len()
    );
    let offset = store.day_offset();
    let lines: Vec<String> = visible
        .iter()
        .map(|m| format::member_line(m, now, offset))
        .collect();
    Ok(format::bounded_listing(&header, &lines))
}

async fn member_info_text(app: &App, id: &str, now: DateTime<Utc>) -> Result<String> {
    app.refresh_statuses(now).await?;
    let store = app.read().await;
    let member = store.member(id).ok_or_else(|| Error::MemberNotFound {
        id: id.to_string(),
    })?;
    Ok(format::member_details(member, now, store.day_offset())?)
}

async fn register_member(
    app: &App,
    form: MemberForm,
    plan_name: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let plan = find_plan(app, plan_name).await?;
    let member = form.enroll(&plan, now)?;
    let reply = format!(
        "✅ Registered **{}** on {} until {} (`{}`)",
        member.name,
        plan.name,
        member.plan.end_date.format("%Y-%m-%d"),
        member.id
    );
    app.dispatch(Intent::AddMember(member), now).await?;
    Ok(reply)
}

async fn edit_member(
    app: &App,
    id: &str,
    changes: MemberChanges,
    renew_on: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String> {
    if changes.is_empty() && renew_on.is_none() {
        return Err(Error::validation("changes", "Give at least one field to change"));
    }

    let mut member = app
        .read()
        .await
        .member(id)
        .cloned()
        .ok_or_else(|| Error::MemberNotFound { id: id.to_string() })?;
    changes.apply(&mut member);
    if let Some(plan_name) = renew_on {
        let plan = find_plan(app, plan_name).await?;
        member.renew(&plan, now)?;
    }

    let reply = format!(
        "✅ Updated **{}** ({}, ends {})",
        member.name,
        member.status,
        member.plan.end_date.format("%Y-%m-%d")
    );
    app.dispatch(Intent::UpdateMember(member), now).await?;
    Ok(reply)
}

async fn remove_member(app: &App, id: &str, now: DateTime<Utc>) -> Result<String> {
    let name = app.read().await.member(id).map(|m| m.name.clone());
    match app.dispatch(Intent::DeleteMember(id.to_string()), now).await? {
        Outcome::Removed(true) => Ok(format!(
            "🗑️ Deleted member **{}**",
            name.unwrap_or_else(|| id.to_string())
        )),
        _ => Err(Error::MemberNotFound { id: id.to_string() }),
    }
}
