// Custom text command management.
//
// The commands themselves fire from the message handler; these manage the
// table.

use crate::core::custom_commands::CustomCommandError;
use crate::discord::{Context, Error};

/// Create (or replace) a custom text command
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn createcmd(
    ctx: Context<'_>,
    #[description = "Command name (without the ?)"] name: String,
    #[description = "What the bot replies with"]
    #[rest]
    response: String,
) -> Result<(), Error> {
    match ctx.data().custom_commands.create(&name, response).await {
        Ok(()) => {
            let name = name.trim_start_matches('?');
            ctx.say(format!("Created `?{name}`.")).await?;
            Ok(())
        }
        Err(CustomCommandError::InvalidName(name)) => {
            ctx.say(format!("`{name}` is not a usable command name."))
                .await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete a custom text command
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn removecmd(
    ctx: Context<'_>,
    #[description = "Command name (without the ?)"] name: String,
) -> Result<(), Error> {
    match ctx.data().custom_commands.remove(&name).await {
        Ok(()) => {
            let name = name.trim_start_matches('?');
            ctx.say(format!("Removed `?{name}`.")).await?;
            Ok(())
        }
        Err(CustomCommandError::NotFound(name)) => {
            ctx.say(format!("There's no `?{name}` command.")).await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// List all custom text commands
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn listcmds(ctx: Context<'_>) -> Result<(), Error> {
    let commands = ctx.data().custom_commands.list().await?;
    if commands.is_empty() {
        ctx.say("No custom commands yet. Create one with `/createcmd`.")
            .await?;
        return Ok(());
    }

    let list = commands
        .iter()
        .map(|(name, _)| format!("`?{name}`"))
        .collect::<Vec<_>>()
        .join(", ");
    ctx.say(format!("Custom commands: {list}")).await?;
    Ok(())
}
