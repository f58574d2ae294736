//! Dashboard and data Discord commands - overview, export, import and reset.

use crate::{
    app::App,
    bot::format,
    core::{
        persistence::parse_export,
        stats::{DashboardStats, plan_distribution},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// How many recent registrations the dashboard shows
const RECENT_MEMBERS: usize = 5;

/// Largest backup file accepted by `/import`
const MAX_IMPORT_BYTES: u32 = 8 * 1024 * 1024;

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, reply},
        errors::{Error, Result},
    };
    use chrono::Utc;
    use poise::serenity_prelude as serenity;
    use tracing::info;

    /// Shows membership counts, estimated revenue and recent registrations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn dashboard(ctx: Context<'_>) -> Result<()> {
        let app = &ctx.data().app;
        let (description, fields) = super::dashboard_content(app, Utc::now()).await?;

        let embed = serenity::CreateEmbed::default()
            .title(format!("📊 {} Dashboard", app.settings().gym_name))
            .description(description)
            .color(0x0034_98DB)
            .fields(fields)
            .footer(serenity::CreateEmbedFooter::new(
                "Revenue counts active members at their plan's monthly rate",
            ));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Downloads every member and plan as a JSON backup.
    #[poise::command(slash_command, prefix_command)]
    pub async fn export(ctx: Context<'_>) -> Result<()> {
        let document = ctx.data().app.export(Utc::now()).await;
        let json = document.to_json_pretty()?;
        info!(
            user = %ctx.author().name,
            members = document.members.len(),
            "Exporting data"
        );

        let attachment = serenity::CreateAttachment::bytes(json.into_bytes(), document.file_name());
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "📦 Backup of {} members and {} plans",
                    document.members.len(),
                    document.plans.len()
                ))
                .attachment(attachment),
        )
        .await?;
        Ok(())
    }

    /// Replaces all members and plans with the contents of a backup file.
    #[poise::command(slash_command, prefix_command)]
    pub async fn import(
        ctx: Context<'_>,
        #[description = "A backup produced by /export"] file: serenity::Attachment,
    ) -> Result<()> {
        if file.size > super::MAX_IMPORT_BYTES {
            let err = Error::validation("file", "Backup file is too large");
            return reply(ctx, Err(err)).await;
        }
        // Downloads can be slow; keep the interaction alive
        ctx.defer().await?;
        let bytes = file.download().await?;
        info!(user = %ctx.author().name, file = %file.filename, "Importing backup");

        let result = super::import_backup(&ctx.data().app, &bytes, Utc::now()).await;
        reply(ctx, result).await
    }

    /// Deletes every member and resets the plan catalog. Requires confirmation.
    #[poise::command(slash_command, prefix_command)]
    pub async fn clear_data(
        ctx: Context<'_>,
        #[description = "Set to true to really delete everything"] confirm: bool,
    ) -> Result<()> {
        if !confirm {
            ctx.say(
                "⚠️ This deletes every member and resets the plan catalog. \
                Run `/clear_data confirm:true` to proceed.",
            )
            .await?;
            return Ok(());
        }

        info!(user = %ctx.author().name, "Clearing all data");
        ctx.data().app.clear_all().await;
        ctx.say("🧹 All members removed and the plan catalog reset.")
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

/// Embed description and fields for the dashboard.
async fn dashboard_content(
    app: &App,
    now: DateTime<Utc>,
) -> Result<(String, Vec<(String, String, bool)>)> {
    app.refresh_statuses(now).await?;
    let store = app.read().await;
    let stats = DashboardStats::compute(store.members(), store.plans());
    let description = format::dashboard_summary(&stats)?;

    let mut fields = Vec::new();

    let mut distribution = String::new();
    for (plan_type, count) in plan_distribution(store.members()) {
        writeln!(distribution, "**{plan_type}:** {count}")?;
    }
    fields.push(("Plan Distribution".to_string(), distribution, true));

    let mut by_joining: Vec<_> = store.members().iter().collect();
    by_joining.sort_by(|a, b| b.joining_date.cmp(&a.joining_date));
    let recent = if by_joining.is_empty() {
        "No members yet".to_string()
    } else {
        by_joining
            .iter()
            .take(RECENT_MEMBERS)
            .map(|m| {
                format!(
                    "{} {} ({})",
                    format::status_badge(m.status),
                    m.name,
                    m.joining_date.format("%Y-%m-%d")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    fields.push(("Recent Members".to_string(), recent, true));

    Ok((description, fields))
}

/// Parses an uploaded backup and replaces the application state with it.
///
/// Nothing changes unless every record in the backup is valid.
async fn import_backup(app: &App, bytes: &[u8], now: DateTime<Utc>) -> Result<String> {
    let json = std::str::from_utf8(bytes)
        .map_err(|_| Error::validation("file", "Backup file is not UTF-8 text"))?;
    let snapshot = parse_export(json).map_err(|e| match e {
        Error::Corruption { message } => {
            Error::validation("file", format!("Not a valid backup: {message}"))
        }
        other => other,
    })?;

    let (members, plans) = (snapshot.members.len(), snapshot.plans.len());
    app.restore(snapshot, now).await?;
    Ok(format!("📥 Imported {members} members and {plans} plans"))
}
