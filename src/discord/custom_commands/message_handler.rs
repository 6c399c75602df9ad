// Fires custom text commands from incoming messages.

use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn handle_message(
    ctx: &serenity::Context,
    data: &Data,
    msg: &serenity::Message,
) -> Result<(), Error> {
    if msg.author.bot {
        return Ok(());
    }

    if let Some(response) = data.custom_commands.response_for(&msg.content).await? {
        msg.channel_id.say(&ctx.http, response).await?;
    }
    Ok(())
}
