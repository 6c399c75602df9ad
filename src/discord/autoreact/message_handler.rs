// Applies autoreact rules to incoming messages.

use crate::discord::commands::autoreact::to_reaction_type;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn handle_message(
    ctx: &serenity::Context,
    data: &Data,
    msg: &serenity::Message,
) -> Result<(), Error> {
    if msg.author.bot || msg.guild_id.is_none() {
        return Ok(());
    }

    for emoji in data.autoreact.matches(&msg.content).await? {
        if let Err(err) = msg.react(&ctx.http, to_reaction_type(&emoji)).await {
            // An unusable emoji shouldn't take the whole handler down.
            tracing::warn!("Failed to autoreact with {}: {}", emoji, err);
        }
    }
    Ok(())
}
