// Greets new members in the configured welcome channel.

use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn handle_member_join(
    ctx: &serenity::Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<(), Error> {
    let Some(channel_id) = data.config.welcome_channel_id else {
        return Ok(());
    };
    if member.user.bot {
        return Ok(());
    }

    let member_count = ctx.cache.guild(member.guild_id).map(|g| g.member_count);

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("Welcome, {}!", member.user.display_name()))
        .description(
            "We're glad you're here! Take a moment to read the rules, \
             then come say hi.",
        )
        .colour(serenity::Colour::from_rgb(84, 140, 140))
        .thumbnail(member.face());
    if let Some(count) = member_count {
        embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
            "Thanks to you, we now have {count} members!"
        )));
    }

    serenity::ChannelId::new(channel_id)
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .content(format!("<@{}>", member.user.id.get()))
                .embed(embed),
        )
        .await?;
    Ok(())
}
