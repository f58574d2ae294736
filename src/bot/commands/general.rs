//! General Discord commands - ping and help.
//!
//! These commands don't touch the store.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, errors::Result};

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let gym_name = &ctx.data().app.settings().gym_name;
        let help_text = format!(
            "**{gym_name} Help**\n\
            Here is a summary of all available commands.\n\n\
            **Members**\n\
            • `/members [search] [status] [sort] [order]` - Lists members. Sorting is remembered.\n\
            • `/member_info <id>` - Shows one member in full.\n\
            • `/member_add ...` - Registers a member on an active plan.\n\
            • `/member_update <id> ...` - Edits a member. Giving a plan renews from today.\n\
            • `/member_delete <id>` - Removes a member.\n\n\
            **Plans**\n\
            • `/plans` - Lists the plan catalog.\n\
            • `/plan_add`, `/plan_update`, `/plan_toggle`, `/plan_delete` - Manage the catalog.\n\n\
            **Data**\n\
            • `/dashboard` - Membership and revenue overview.\n\
            • `/export` - Downloads a JSON backup.\n\
            • `/import <file>` - Replaces all data with a backup.\n\
            • `/clear_data confirm:true` - Deletes every member and resets the catalog.\n\n\
            **Utility**\n\
            • `/ping` - Checks if the bot is responsive.\n\
            • `/help` - Shows this help message."
        );

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
