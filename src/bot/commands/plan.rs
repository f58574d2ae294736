//! Plan catalog Discord commands - listing, creation, edits, toggling and removal.
//!
//! Existing members keep the plan snapshot they enrolled with, so catalog
//! edits never change what a member pays.

use crate::{
    app::{App, Intent, Outcome},
    bot::format,
    core::{
        plan::{PlanForm, PlanType},
        stats::PlanCatalogSummary,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use std::fmt::Write;

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::PlanChanges;
    use crate::{
        bot::{Context, choices::PlanTypeChoice, handlers::autocomplete, reply},
        core::plan::PlanForm,
        errors::Result,
    };
    use chrono::Utc;

    /// Lists every plan in the catalog with its totals.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plans(ctx: Context<'_>) -> Result<()> {
        let result = super::catalog_text(&ctx.data().app, Utc::now()).await;
        reply(ctx, result).await
    }

    /// Adds a plan to the catalog. It is open for enrollment right away.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plan_add(
        ctx: Context<'_>,
        #[description = "Plan name"] name: String,
        #[description = "Billing period"] plan_type: PlanTypeChoice,
        #[description = "Price for the whole period"] price: f64,
        #[description = "Short description (optional)"] description: Option<String>,
        #[description = "Features, separated by commas (optional)"] features: Option<String>,
    ) -> Result<()> {
        let form = PlanForm {
            name,
            plan_type: plan_type.into(),
            duration: None,
            price,
            description,
            features: super::split_features(features.as_deref()),
        };
        let result = super::create_plan(&ctx.data().app, form, Utc::now()).await;
        reply(ctx, result).await
    }

    /// Edits a plan. Only the given fields change.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plan_update(
        ctx: Context<'_>,
        #[description = "Plan id"]
        #[autocomplete = "autocomplete::autocomplete_plan_id"]
        id: String,
        #[description = "New name"] name: Option<String>,
        #[description = "New billing period"] plan_type: Option<PlanTypeChoice>,
        #[description = "New price"] price: Option<f64>,
        #[description = "New description (blank clears)"] description: Option<String>,
        #[description = "New features, separated by commas"] features: Option<String>,
    ) -> Result<()> {
        let changes = PlanChanges {
            name,
            plan_type: plan_type.map(Into::into),
            price,
            description,
            features: features.map(|f| super::split_features(Some(&f))),
        };
        let result = super::edit_plan(&ctx.data().app, &id, changes, Utc::now()).await;
        reply(ctx, result).await
    }

    /// Opens or closes a plan for new enrollments.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plan_toggle(
        ctx: Context<'_>,
        #[description = "Plan id"]
        #[autocomplete = "autocomplete::autocomplete_plan_id"]
        id: String,
    ) -> Result<()> {
        let result = super::toggle_plan(&ctx.data().app, &id, Utc::now()).await;
        reply(ctx, result).await
    }

    /// Removes a plan from the catalog. Enrolled members are unaffected.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plan_delete(
        ctx: Context<'_>,
        #[description = "Plan id"]
        #[autocomplete = "autocomplete::autocomplete_plan_id"]
        id: String,
    ) -> Result<()> {
        let result = super::remove_plan(&ctx.data().app, &id, Utc::now()).await;
        reply(ctx, result).await
    }
}

// Re-export all commands
pub use inner::*;

/// Optional edits to an existing plan.
#[derive(Debug, Clone, Default)]
pub struct PlanChanges {
    /// New name
    pub name: Option<String>,
    /// New billing period; the duration follows it
    pub plan_type: Option<PlanType>,
    /// New price
    pub price: Option<f64>,
    /// New description; a blank value clears it
    pub description: Option<String>,
    /// Replacement feature list
    pub features: Option<Vec<String>>,
}

/// Splits a comma-separated feature list typed into a single option.
fn split_features(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| raw.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

async fn catalog_text(app: &App, now: DateTime<Utc>) -> Result<String> {
    app.refresh_statuses(now).await?;
    let store = app.read().await;
    if store.plans().is_empty() {
        return Ok("🏋️ The catalog is empty. Add a plan with `/plan_add`.".to_string());
    }

    let summary = PlanCatalogSummary::compute(store.plans());
    let mut out = String::from("🏋️ **Membership Plans**\n\n");
    for plan in store.plans() {
        writeln!(out, "{}", format::plan_line(plan))?;
        if let Some(description) = &plan.description {
            writeln!(out, "  _{description}_")?;
        }
        if !plan.features.is_empty() {
            writeln!(out, "  {}", plan.features.join(" · "))?;
        }
        writeln!(out, "  `{}`", plan.id)?;
    }
    writeln!(
        out,
        "\n📊 {} active plan(s), ${:.2} total, ${:.2}/month equivalent",
        summary.active_plans, summary.total_active_price, summary.monthly_equivalent
    )?;
    Ok(out)
}

async fn create_plan(app: &App, form: PlanForm, now: DateTime<Utc>) -> Result<String> {
    let plan = form.into_plan()?;
    if app.read().await.plan_by_name(&plan.name).is_some() {
        return Err(Error::validation(
            "name",
            format!("A plan named '{}' already exists", plan.name),
        ));
    }
    let reply = format!("✅ Added plan {}", format::plan_line(&plan));
    app.dispatch(Intent::AddPlan(plan), now).await?;
    Ok(reply)
}

async fn edit_plan(app: &App, id: &str, changes: PlanChanges, now: DateTime<Utc>) -> Result<String> {
    let existing = app
        .read()
        .await
        .plan(id)
        .cloned()
        .ok_or_else(|| Error::PlanNotFound { id: id.to_string() })?;

    let form = PlanForm {
        name: changes.name.unwrap_or(existing.name),
        plan_type: changes.plan_type.unwrap_or(existing.plan_type),
        duration: None,
        price: changes.price.unwrap_or(existing.price),
        description: changes.description.or(existing.description),
        features: changes.features.unwrap_or(existing.features),
    };
    let mut plan = form.into_plan_with_id(existing.id)?;
    plan.is_active = existing.is_active;
    let wanted = plan.name.to_lowercase();
    let taken = app
        .read()
        .await
        .plans()
        .iter()
        .any(|other| other.id != plan.id && other.name.to_lowercase() == wanted);
    if taken {
        return Err(Error::validation(
            "name",
            format!("A plan named '{}' already exists", plan.name),
        ));
    }

    let reply = format!("✅ Updated plan {}", format::plan_line(&plan));
    app.dispatch(Intent::UpdatePlan(plan), now).await?;
    Ok(reply)
}

async fn toggle_plan(app: &App, id: &str, now: DateTime<Utc>) -> Result<String> {
    match app
        .dispatch(Intent::TogglePlanActive(id.to_string()), now)
        .await?
    {
        Outcome::PlanActive(true) => Ok(format!("✅ Plan `{id}` is open for enrollment")),
        _ => Ok(format!("⏸️ Plan `{id}` is closed to new members")),
    }
}

async fn remove_plan(app: &App, id: &str, now: DateTime<Utc>) -> Result<String> {
    let name = app.read().await.plan(id).map(|p| p.name.clone());
    match app.dispatch(Intent::DeletePlan(id.to_string()), now).await? {
        Outcome::Removed(true) => Ok(format!(
            "🗑️ Deleted plan **{}**",
            name.unwrap_or_else(|| id.to_string())
        )),
        _ => Err(Error::PlanNotFound { id: id.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{sample_form, setup_test_app, ts};

    fn form(name: &str) -> PlanForm {
        PlanForm {
            name: name.to_string(),
            plan_type: PlanType::Quarterly,
            duration: Some(1),
            price: 99.0,
            description: Some("  ".to_string()),
            features: split_features(Some("Pool, Sauna, ")),
        }
    }

    #[test]
    fn test_split_features() {
        assert_eq!(split_features(None), Vec::<String>::new());
        assert_eq!(split_features(Some("Pool,Sauna")), vec!["Pool", "Sauna"]);
    }

    #[tokio::test]
    async fn test_catalog_text_lists_plans_and_totals() -> Result<()> {
        let now = ts(2024, 5, 1);
        let app = setup_test_app(now).await?;
        let text = catalog_text(&app, now).await?;

        assert!(text.contains("**Basic Monthly**"));
        assert!(text.contains("`plan-3`"));
        assert!(text.contains("3 active plan(s)"));
        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_plan_normalizes_form() -> Result<()> {
        let now = ts(2024, 5, 1);
        let app = setup_test_app(now).await?;

        create_plan(&app, form("Swim Club"), now).await?;
        {
            let store = app.read().await;
            let plan = store.plan_by_name("swim club").unwrap();
            assert!(plan.id.starts_with("plan-"));
            assert_eq!(plan.duration, 3);
            assert!(plan.description.is_none());
            assert_eq!(plan.features, vec!["Pool", "Sauna"]);
            assert!(plan.is_active);
        }

        let err = create_plan(&app, form("swim club"), now).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let mut free_money = form("Refund");
        free_money.price = -5.0;
        assert!(create_plan(&app, free_money, now).await.is_err());
        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_plan_keeps_active_flag_and_member_prices() -> Result<()> {
        let now = ts(2024, 5, 1);
        let app = setup_test_app(now).await?;
        let basic = app.read().await.plan("plan-1").cloned().unwrap();
        let member = sample_form("Jane Doe").enroll(&basic, now)?;
        app.dispatch(Intent::AddMember(member), now).await?;
        toggle_plan(&app, "plan-1", now).await?;

        let changes = PlanChanges {
            plan_type: Some(PlanType::Yearly),
            price: Some(450.0),
            ..PlanChanges::default()
        };
        edit_plan(&app, "plan-1", changes, now).await?;
        {
            let store = app.read().await;
            let plan = store.plan("plan-1").unwrap();
            assert_eq!(plan.name, "Basic Monthly");
            assert_eq!(plan.duration, 12);
            assert_eq!(plan.price, 450.0);
            assert!(!plan.is_active);
            assert_eq!(store.members()[0].plan.price, basic.price);
        }

        let err = edit_plan(&app, "plan-9", PlanChanges::default(), now)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PlanNotFound { .. }));
        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_plan_rejects_name_of_another_plan() -> Result<()> {
        let now = ts(2024, 5, 1);
        let app = setup_test_app(now).await?;

        let rename = |name: &str| PlanChanges {
            name: Some(name.to_string()),
            ..PlanChanges::default()
        };
        let err = edit_plan(&app, "plan-1", rename("premium quarterly"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "name"));
        assert_eq!(app.read().await.plan("plan-1").unwrap().name, "Basic Monthly");

        // Keeping its own name, in any case, is not a collision
        edit_plan(&app, "plan-1", rename("BASIC MONTHLY"), now).await?;
        assert_eq!(app.read().await.plan("plan-1").unwrap().name, "BASIC MONTHLY");
        app.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_and_remove_plan() -> Result<()> {
        let now = ts(2024, 5, 1);
        let app = setup_test_app(now).await?;

        assert!(toggle_plan(&app, "plan-2", now).await?.contains("closed"));
        assert!(toggle_plan(&app, "plan-2", now).await?.contains("open"));
        assert!(matches!(
            toggle_plan(&app, "plan-9", now).await,
            Err(Error::PlanNotFound { .. })
        ));

        assert_eq!(
            remove_plan(&app, "plan-2", now).await?,
            "🗑️ Deleted plan **Premium Quarterly**"
        );
        assert!(remove_plan(&app, "plan-2", now).await.is_err());
        assert_eq!(app.read().await.plans().len(), 2);
        app.shutdown().await;
        Ok(())
    }
}
