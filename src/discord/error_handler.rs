// The 'uh oh' module, for when everything goes wrong. (handles errors)
//
// Wired into poise's `on_error` hook. Some failures are deliberately
// silent: users poking commands they can't use don't need a reply.

use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            panic!("Failed to set up the bot: {error:?}")
        }

        poise::FrameworkError::ArgumentParse {
            error, input, ctx, ..
        } => {
            let message = match input {
                Some(input) => format!("**Invalid argument** `{input}`: {error}"),
                None => format!("**Missing required argument**: {error}"),
            };
            if let Err(err) = ctx.say(message).await {
                tracing::warn!("Failed to report argument error: {}", err);
            }
        }

        poise::FrameworkError::CooldownHit {
            remaining_cooldown,
            ctx,
            ..
        } => {
            let _ = ctx
                .say(format!(
                    "This command is on cooldown, try again in **{}s**",
                    remaining_cooldown.as_secs()
                ))
                .await;
        }

        poise::FrameworkError::MissingBotPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            let _ = ctx
                .say(format!(
                    "**Bot Missing Permissions**: I need `{missing_permissions}` to do this"
                ))
                .await;
        }

        // Silently ignored, on purpose.
        poise::FrameworkError::MissingUserPermissions { .. }
        | poise::FrameworkError::NotAnOwner { .. }
        | poise::FrameworkError::GuildOnly { .. }
        | poise::FrameworkError::CommandCheckFailed { .. }
        | poise::FrameworkError::UnknownCommand { .. } => {}

        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().name,
                user_id = ctx.author().id.get(),
                "Command failed: {}",
                error
            );
            let embed = serenity::CreateEmbed::new()
                .description(format!("Something went wrong! (`{error}`)"))
                .colour(serenity::Colour::RED);
            let _ = ctx.send(poise::CreateReply::default().embed(embed)).await;
        }

        other => {
            if let Err(err) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {}", err);
            }
        }
    }
}
