// Verification maintenance command. The reaction flow itself lives in
// discord/verification.

use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Re-seed the ✅ on the verification message (after a reaction clear)
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn fixreaction(ctx: Context<'_>) -> Result<(), Error> {
    let Some(verify) = ctx.data().config.verification() else {
        ctx.say("Verification is not configured on this bot.").await?;
        return Ok(());
    };

    let message = ctx
        .http()
        .get_message(
            serenity::ChannelId::new(verify.channel_id),
            serenity::MessageId::new(verify.message_id),
        )
        .await?;
    message
        .react(ctx.http(), serenity::ReactionType::Unicode("✅".to_string()))
        .await?;

    ctx.send(
        poise::CreateReply::default().embed(
            serenity::CreateEmbed::new()
                .description("Reaction added!")
                .colour(serenity::Colour::from_rgb(0, 255, 0)),
        ),
    )
    .await?;
    Ok(())
}
