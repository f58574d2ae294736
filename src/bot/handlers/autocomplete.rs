//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions are read from the in-memory store, so they reflect unsaved
//! changes as soon as a mutation is applied.

use crate::bot::Context;

/// Discord shows at most this many suggestions
const MAX_SUGGESTIONS: usize = 25;

/// Suggests names of plans open for enrollment.
///
/// # Arguments
/// * `ctx` - The poise context holding the shared app
/// * `partial` - What the user has typed so far
///
/// # Returns
/// Up to 25 matching plan names, sorted alphabetically
pub async fn autocomplete_plan_name(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let store = ctx.data().app.read().await;
    let partial_lower = partial.to_lowercase();

    let mut matching: Vec<String> = store
        .plans()
        .iter()
        .filter(|p| p.is_active && p.name.to_lowercase().contains(&partial_lower))
        .map(|p| p.name.clone())
        .take(MAX_SUGGESTIONS)
        .collect();

    matching.sort();
    matching
}

/// Suggests plan ids, including inactive plans, for catalog management.
pub async fn autocomplete_plan_id(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let store = ctx.data().app.read().await;
    let partial_lower = partial.to_lowercase();

    let mut matching: Vec<String> = store
        .plans()
        .iter()
        .filter(|p| {
            p.id.to_lowercase().contains(&partial_lower)
                || p.name.to_lowercase().contains(&partial_lower)
        })
        .map(|p| p.id.clone())
        .take(MAX_SUGGESTIONS)
        .collect();

    matching.sort();
    matching
}

/// Suggests member ids whose member matches the partial input by name, email or id.
pub async fn autocomplete_member_id(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let store = ctx.data().app.read().await;
    let partial_lower = partial.to_lowercase();

    let mut matching: Vec<(String, String)> = store
        .members()
        .iter()
        .filter(|m| m.id.to_lowercase().contains(&partial_lower))
        .chain(store.search(partial.trim()))
        .map(|m| (m.name.to_lowercase(), m.id.clone()))
        .collect();
    // Sorted by member name so ids are easier to pick
    matching.sort();
    matching.dedup();
    matching.truncate(MAX_SUGGESTIONS);
    matching.into_iter().map(|(_, id)| id).collect()
}
