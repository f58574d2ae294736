//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the `GymBuddy` application:
//! slash commands, autocomplete handlers, dropdown choices and reply
//! formatting. Commands never touch storage directly; they read the store or
//! dispatch intents through the shared [`App`].

/// Dropdown parameters mapped onto core types
pub mod choices;
/// Discord command implementations (members, plans, dashboard, general)
pub mod commands;
/// Reply formatting helpers
pub mod format;
/// Discord interaction handlers (autocomplete)
pub mod handlers;

use crate::{
    app::App,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared data available to all bot commands.
pub struct BotData {
    /// The running application
    pub app: Arc<App>,
}

impl BotData {
    /// Creates a new `BotData` around the shared application.
    #[must_use]
    pub const fn new(app: Arc<App>) -> Self {
        Self { app }
    }
}

/// Poise context used by every command
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Sends the reply for `result`.
///
/// Errors the user can fix (bad input, unknown id) are answered inline with a
/// ❌ message. Anything else is returned to the framework's error handler.
pub async fn reply(ctx: Context<'_>, result: Result<String>) -> Result<()> {
    match result {
        Ok(message) => {
            ctx.say(message).await?;
            Ok(())
        }
        Err(e) if e.is_user_error() => {
            warn!(command = %ctx.command().name, "Rejected input: {}", e);
            ctx.say(format!("❌ {e}")).await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {}", ctx.command().name, error);
            if let Err(e) = ctx
                .say("❌ Something went wrong. The error has been logged.")
                .await
            {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Every slash command the bot registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::general::ping(),
        commands::general::help(),
        commands::dashboard::dashboard(),
        commands::dashboard::export(),
        commands::dashboard::import(),
        commands::dashboard::clear_data(),
        commands::member::members(),
        commands::member::member_info(),
        commands::member::member_add(),
        commands::member::member_update(),
        commands::member::member_delete(),
        commands::plan::plans(),
        commands::plan::plan_add(),
        commands::plan::plan_update(),
        commands::plan::plan_toggle(),
        commands::plan::plan_delete(),
    ]
}

/// Connects to Discord and serves commands until the client stops.
///
/// Commands are registered in `guild_id` when given (instant updates while
/// developing), otherwise globally.
pub async fn run_bot(token: &str, app: Arc<App>, guild_id: Option<u64>) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".to_string()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                let commands = &framework.options().commands;
                if let Some(guild_id) = guild_id {
                    poise::builtins::register_in_guild(ctx, commands, serenity::GuildId::new(guild_id))
                        .await?;
                    info!("Registered {} commands in guild {}", commands.len(), guild_id);
                } else {
                    poise::builtins::register_globally(ctx, commands).await?;
                    info!("Registered {} commands globally", commands.len());
                }
                Ok(BotData::new(app))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(token, intents)
        .framework(framework)
        .await?;
    client.start().await?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;
