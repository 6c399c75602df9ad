// Gift-code announcements.

use crate::core::codes::{parse_codes, CodesError};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Announce gift code(s) to the codes channel
///
/// Codes are separated by spaces and are automatically capitalized. Attach
/// extra info with a colon: `FOOBAR1:60x Jade` - quote the whole segment
/// if the info contains spaces.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES",
    user_cooldown = 30,
    aliases("ac", "announcecode")
)]
pub async fn announcecodes(
    ctx: Context<'_>,
    #[description = "Codes, space-separated, `CODE` or `CODE:label`"]
    #[rest]
    codes: String,
) -> Result<(), Error> {
    let Some(channel_id) = ctx.data().config.codes_channel_id else {
        ctx.say("No codes channel is configured on this bot.").await?;
        return Ok(());
    };

    let codes = match parse_codes(&codes) {
        Ok(codes) => codes,
        Err(err @ (CodesError::Empty | CodesError::TooMany(_))) => {
            ctx.say(err.to_string()).await?;
            return Ok(());
        }
        Err(CodesError::InvalidCode(code)) => {
            ctx.say(format!(
                "The code *`{code}`* doesn't look right, \
                 please double-check that your command formatting is correct!"
            ))
            .await?;
            return Ok(());
        }
    };

    let mut embed = serenity::CreateEmbed::new()
        .title(format!(
            "New Gift Code{}!",
            if codes.len() > 1 { "s" } else { "" }
        ))
        .description(
            "You can quickly redeem a code by pressing the respective button below. \
             Alternatively, you can manually redeem by copying the codes in the embed. \
             To copy a code on mobile, tap and hold the code itself.",
        )
        .colour(serenity::Colour::new(0x7a7dfd));

    let redeem_base = &ctx.data().config.codes_redeem_url;
    let mut buttons = Vec::with_capacity(codes.len());
    for code in &codes {
        embed = embed.field(&code.label, &code.code, false);
        buttons.push(
            serenity::CreateButton::new_link(code.redeem_url(redeem_base))
                .label(format!("Redeem {}", code.label)),
        );
    }
    let components: Vec<serenity::CreateActionRow> = buttons
        .chunks(5)
        .map(|chunk| serenity::CreateActionRow::Buttons(chunk.to_vec()))
        .collect();

    let reply = ctx.say("Announcing...").await?;

    let mut message = serenity::CreateMessage::new().embed(embed).components(components);
    if let Some(role_id) = ctx.data().config.codes_role_id {
        message = message.content(format!("<@&{role_id}>"));
    }
    serenity::ChannelId::new(channel_id)
        .send_message(ctx.http(), message)
        .await?;

    reply
        .edit(
            ctx,
            poise::CreateReply::default().content("Codes have been announced"),
        )
        .await?;
    Ok(())
}
