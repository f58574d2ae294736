//! Text formatting for bot replies.
//!
//! Pure functions over core types so replies can be tested without Discord.

use crate::core::{
    member::Member,
    plan::Plan,
    stats::DashboardStats,
    status::{MemberStatus, days_remaining_at},
};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt::Write;

/// Discord rejects messages longer than this many characters.
pub const MESSAGE_LIMIT: usize = 2000;

/// Notes longer than this are cut short on the detail card.
const NOTES_PREVIEW: usize = 500;

/// Emoji badge for a status.
#[must_use]
pub const fn status_badge(status: MemberStatus) -> &'static str {
    match status {
        MemberStatus::Active => "🟢",
        MemberStatus::ExpiringSoon => "🟡",
        MemberStatus::Expired => "🔴",
    }
}

/// Human wording for the time left on a plan, counting days at `offset`.
#[must_use]
pub fn remaining_label(member: &Member, now: DateTime<Utc>, offset: FixedOffset) -> String {
    match days_remaining_at(member.plan.end_date, now, offset) {
        days if days < 0 => format!("expired {} day(s) ago", -days),
        0 => "ends today".to_string(),
        1 => "ends tomorrow".to_string(),
        days => format!("{days} days left"),
    }
}

/// One line of a member listing.
#[must_use]
pub fn member_line(member: &Member, now: DateTime<Utc>, offset: FixedOffset) -> String {
    format!(
        "{} **{}** ({}) - {} plan, {} - `{}`",
        status_badge(member.status),
        member.name,
        member.email,
        member.plan.plan_type,
        remaining_label(member, now, offset),
        member.id
    )
}

/// One line of the plan catalog.
#[must_use]
pub fn plan_line(plan: &Plan) -> String {
    let state = if plan.is_active { "✅" } else { "⏸️" };
    format!(
        "{state} **{}** - {} ({} month{}) ${:.2}",
        plan.name,
        plan.plan_type,
        plan.duration,
        if plan.duration == 1 { "" } else { "s" },
        plan.price
    )
}

/// Full detail card for a member, with dates shown at `offset`.
///
/// Long notes are shortened and the card never exceeds [`MESSAGE_LIMIT`].
pub fn member_details(
    member: &Member,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<String, std::fmt::Error> {
    let day = |instant: DateTime<Utc>| instant.with_timezone(&offset).format("%Y-%m-%d");
    let mut out = format!("📋 **{}** `{}`\n\n", member.name, member.id);
    writeln!(
        out,
        "{} Status: {} ({})",
        status_badge(member.status),
        member.status,
        remaining_label(member, now, offset)
    )?;
    writeln!(
        out,
        "👤 {} years, {} | ✉️ {} | 📞 {}",
        member.age, member.gender, member.email, member.phone
    )?;
    writeln!(
        out,
        "🏠 {}, {}, {} {}",
        member.address.street, member.address.city, member.address.state, member.address.zip_code
    )?;
    writeln!(
        out,
        "🆘 {} ({}) {}",
        member.emergency_contact.name,
        member.emergency_contact.relationship,
        member.emergency_contact.phone
    )?;
    writeln!(
        out,
        "🏋️ {} plan ${:.2}: {} → {}",
        member.plan.plan_type,
        member.plan.price,
        day(member.plan.start_date),
        day(member.plan.end_date)
    )?;
    writeln!(out, "📅 Joined {}", day(member.joining_date))?;
    if let Some(notes) = &member.notes {
        writeln!(out, "📝 {}", truncate_chars(notes, NOTES_PREVIEW))?;
    }
    Ok(truncate_chars(&out, MESSAGE_LIMIT))
}

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Plain-text dashboard summary.
pub fn dashboard_summary(stats: &DashboardStats) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "👥 **Total Members:** {} ({} active)",
        stats.total_members, stats.active_members
    )?;
    writeln!(
        out,
        "💰 **Monthly Revenue:** ${:.2} (estimated)",
        stats.monthly_revenue
    )?;
    writeln!(
        out,
        "🏋️ **Active Plans:** {} of {}",
        stats.active_plans, stats.total_plans
    )?;
    writeln!(
        out,
        "⚠️ **Expiring Soon:** {} | ⛔ **Expired:** {}",
        stats.expiring_members, stats.expired_members
    )?;
    Ok(out)
}

/// Joins lines under `header`, stopping before the message limit and noting what was left out.
#[must_use]
pub fn bounded_listing(header: &str, lines: &[String]) -> String {
    let mut out = format!("{header}\n\n");
    for (shown, line) in lines.iter().enumerate() {
        // Leave room for the "...and N more" footer
        if out.len() + line.len() + 40 > MESSAGE_LIMIT {
            out.push_str(&format!("_...and {} more_", lines.len() - shown));
            return out;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
