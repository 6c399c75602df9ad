// Reaction-role verification.
//
// A ✅ on the configured verification message grants the verified role
// (unless the member is muted). Reactions are cleaned off the message
// either way so it stays pristine.

use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn handle_reaction_add(
    ctx: &serenity::Context,
    data: &Data,
    reaction: &serenity::Reaction,
) -> Result<(), Error> {
    let Some(verify) = data.config.verification() else {
        return Ok(());
    };
    if reaction.channel_id.get() != verify.channel_id
        || reaction.message_id.get() != verify.message_id
    {
        return Ok(());
    }
    let (Some(user_id), Some(guild_id)) = (reaction.user_id, reaction.guild_id) else {
        return Ok(());
    };
    if user_id == ctx.cache.current_user().id {
        return Ok(());
    }

    let member = match &reaction.member {
        Some(member) => member.clone(),
        None => ctx.http.get_member(guild_id, user_id).await?,
    };
    if member.user.bot {
        return Ok(());
    }

    let is_check = matches!(&reaction.emoji, serenity::ReactionType::Unicode(s) if s == "✅");

    // Remove the reaction regardless of which emoji it was.
    if let Err(err) = reaction.delete(&ctx.http).await {
        tracing::warn!("Failed to remove verification reaction: {}", err);
    }
    if !is_check {
        return Ok(());
    }

    if let Some(muted_role) = verify.muted_role_id {
        if member.roles.contains(&serenity::RoleId::new(muted_role)) {
            return Ok(());
        }
    }

    member
        .add_role(&ctx.http, serenity::RoleId::new(verify.role_id))
        .await?;
    tracing::info!(user_id = user_id.get(), "Verified a member");
    Ok(())
}
