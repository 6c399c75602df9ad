// Karaoke queue commands.
//
// join/leave/queue are open to everyone (in the configured channel);
// everything that moves other people is staff-only.

use crate::core::karaoke::{KaraokeError, QueueSnapshot, Tier};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Karaoke queue
#[poise::command(
    slash_command,
    guild_only,
    subcommands(
        "join", "leave", "queue", "next", "evict", "bump", "pull", "jump", "ban", "unban",
        "banlist", "clear"
    )
)]
pub async fn karaoke(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

fn tier_name(tier: Tier) -> &'static str {
    match tier {
        Tier::Priority => "queue",
        Tier::Requeue => "requeue",
    }
}

fn queue_embed(snapshot: &QueueSnapshot) -> serenity::CreateEmbed {
    fn lines(ids: &[u64]) -> String {
        if ids.is_empty() {
            "*empty*".to_string()
        } else {
            ids.iter()
                .enumerate()
                .map(|(i, id)| format!("{}. <@{}>", i + 1, id))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    serenity::CreateEmbed::new()
        .title("🎤 Karaoke")
        .colour(serenity::Colour::BLUE)
        .field(
            "Up now",
            snapshot
                .current
                .map(|id| format!("<@{id}>"))
                .unwrap_or_else(|| "*nobody*".to_string()),
            false,
        )
        .field("Queue", lines(&snapshot.priority), false)
        .field("Requeue", lines(&snapshot.requeue), false)
}

async fn say_ephemeral(ctx: &Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content.into())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

async fn send_queue(ctx: &Context<'_>) -> Result<(), Error> {
    let snapshot = ctx.data().karaoke.snapshot().await;
    ctx.send(poise::CreateReply::default().embed(queue_embed(&snapshot)))
        .await?;
    Ok(())
}

/// Commands that touch the queue are restricted to the configured channel
/// so the queue stays visible in one place.
async fn in_queue_channel(ctx: &Context<'_>) -> Result<bool, Error> {
    if let Some(channel_id) = ctx.data().config.karaoke_channel_id {
        if ctx.channel_id().get() != channel_id {
            say_ephemeral(ctx, format!("Please use karaoke commands in <#{channel_id}>.")).await?;
            return Ok(false);
        }
    }
    Ok(true)
}

/// Event staff role, or administrator as a fallback so an unset role id
/// doesn't lock staff out.
async fn is_staff(ctx: &Context<'_>) -> bool {
    let Some(member) = ctx.author_member().await else {
        return false;
    };
    if let Some(role_id) = ctx.data().config.event_staff_role_id {
        if member.roles.contains(&serenity::RoleId::new(role_id)) {
            return true;
        }
    }
    member
        .permissions
        .map(|perms| perms.administrator())
        .unwrap_or(false)
}

async fn ensure_staff(ctx: &Context<'_>) -> Result<bool, Error> {
    if is_staff(ctx).await {
        Ok(true)
    } else {
        say_ephemeral(ctx, "Only event staff can do that.").await?;
        Ok(false)
    }
}

/// Join the karaoke queue
#[poise::command(slash_command, guild_only)]
pub async fn join(ctx: Context<'_>) -> Result<(), Error> {
    if !in_queue_channel(&ctx).await? {
        return Ok(());
    }

    match ctx.data().karaoke.join(ctx.author().id.get()).await {
        Ok(tier) => {
            ctx.say(format!(
                "<@{}> joined the {}!",
                ctx.author().id.get(),
                tier_name(tier)
            ))
            .await?;
            send_queue(&ctx).await
        }
        Err(KaraokeError::AlreadyQueued) => {
            say_ephemeral(&ctx, "You've already joined the queue!").await
        }
        Err(KaraokeError::Banned) => {
            say_ephemeral(&ctx, "You are banned from joining the karaoke queue.").await
        }
        Err(err) => Err(err.into()),
    }
}

/// Leave the karaoke queue
#[poise::command(slash_command, guild_only)]
pub async fn leave(ctx: Context<'_>) -> Result<(), Error> {
    if !in_queue_channel(&ctx).await? {
        return Ok(());
    }

    match ctx.data().karaoke.leave(ctx.author().id.get()).await {
        Ok(_) => {
            ctx.say(format!("<@{}> left the queue.", ctx.author().id.get()))
                .await?;
            send_queue(&ctx).await
        }
        Err(KaraokeError::NotQueued) => say_ephemeral(&ctx, "You aren't in the queue.").await,
        Err(err) => Err(err.into()),
    }
}

/// Show the karaoke queue
#[poise::command(slash_command, guild_only)]
pub async fn queue(ctx: Context<'_>) -> Result<(), Error> {
    if !in_queue_channel(&ctx).await? {
        return Ok(());
    }
    send_queue(&ctx).await
}

/// Call up the next singer (staff)
#[poise::command(slash_command, guild_only)]
pub async fn next(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_staff(&ctx).await? {
        return Ok(());
    }

    match ctx.data().karaoke.next().await {
        Ok(user_id) => {
            ctx.say(format!("<@{user_id}> is next!")).await?;
            send_queue(&ctx).await
        }
        Err(KaraokeError::QueueEmpty) => say_ephemeral(&ctx, "Nobody is next, the queue is empty.").await,
        Err(err) => Err(err.into()),
    }
}

/// Remove someone from the queue (staff)
#[poise::command(slash_command, guild_only)]
pub async fn evict(
    ctx: Context<'_>,
    #[description = "Who to remove"] user: serenity::User,
) -> Result<(), Error> {
    if !ensure_staff(&ctx).await? {
        return Ok(());
    }

    match ctx.data().karaoke.evict(user.id.get()).await {
        Ok(()) => {
            ctx.say(format!("Removed <@{}> from the queue.", user.id.get()))
                .await?;
            send_queue(&ctx).await
        }
        Err(KaraokeError::NotQueued) => say_ephemeral(&ctx, "They aren't in the queue.").await,
        Err(err) => Err(err.into()),
    }
}

/// Move someone to the front of their tier (staff)
#[poise::command(slash_command, guild_only)]
pub async fn bump(
    ctx: Context<'_>,
    #[description = "Who to move"] user: serenity::User,
) -> Result<(), Error> {
    if !ensure_staff(&ctx).await? {
        return Ok(());
    }

    match ctx.data().karaoke.bump(user.id.get()).await {
        Ok(tier) => {
            ctx.say(format!(
                "Moved <@{}> to the front of the {}.",
                user.id.get(),
                tier_name(tier)
            ))
            .await?;
            send_queue(&ctx).await
        }
        Err(KaraokeError::NotQueued) => say_ephemeral(&ctx, "They aren't in the queue.").await,
        Err(err) => Err(err.into()),
    }
}

/// Move someone to the back of their tier (staff)
#[poise::command(slash_command, guild_only)]
pub async fn pull(
    ctx: Context<'_>,
    #[description = "Who to move"] user: serenity::User,
) -> Result<(), Error> {
    if !ensure_staff(&ctx).await? {
        return Ok(());
    }

    match ctx.data().karaoke.pull(user.id.get()).await {
        Ok(tier) => {
            ctx.say(format!(
                "Moved <@{}> to the back of the {}.",
                user.id.get(),
                tier_name(tier)
            ))
            .await?;
            send_queue(&ctx).await
        }
        Err(KaraokeError::NotQueued) => say_ephemeral(&ctx, "They aren't in the queue.").await,
        Err(err) => Err(err.into()),
    }
}

/// Move someone to a specific position in their tier (staff)
#[poise::command(slash_command, guild_only)]
pub async fn jump(
    ctx: Context<'_>,
    #[description = "Who to move"] user: serenity::User,
    #[description = "Position in the queue (1 = front)"]
    #[min = 1]
    position: u32,
) -> Result<(), Error> {
    if !ensure_staff(&ctx).await? {
        return Ok(());
    }

    let index = position.saturating_sub(1) as usize;
    match ctx.data().karaoke.jump(user.id.get(), index).await {
        Ok(tier) => {
            ctx.say(format!(
                "Moved <@{}> to position {} of the {}.",
                user.id.get(),
                position,
                tier_name(tier)
            ))
            .await?;
            send_queue(&ctx).await
        }
        Err(KaraokeError::NotQueued) => say_ephemeral(&ctx, "They aren't in the queue.").await,
        Err(err) => Err(err.into()),
    }
}

/// Ban someone from karaoke (staff)
#[poise::command(slash_command, guild_only)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "Who to ban"] user: serenity::User,
) -> Result<(), Error> {
    if !ensure_staff(&ctx).await? {
        return Ok(());
    }

    match ctx.data().karaoke.ban(user.id.get()).await {
        Ok(was_active) => {
            let note = if was_active {
                " and removed them from the queue"
            } else {
                ""
            };
            ctx.say(format!("Banned <@{}> from karaoke{}.", user.id.get(), note))
                .await?;
            Ok(())
        }
        Err(KaraokeError::AlreadyBanned) => say_ephemeral(&ctx, "They're already banned.").await,
        Err(err) => Err(err.into()),
    }
}

/// Lift a karaoke ban (staff)
#[poise::command(slash_command, guild_only)]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "Who to unban"] user: serenity::User,
) -> Result<(), Error> {
    if !ensure_staff(&ctx).await? {
        return Ok(());
    }

    match ctx.data().karaoke.unban(user.id.get()).await {
        Ok(()) => {
            ctx.say(format!("Unbanned <@{}>.", user.id.get())).await?;
            Ok(())
        }
        Err(KaraokeError::NotBanned) => say_ephemeral(&ctx, "They aren't banned.").await,
        Err(err) => Err(err.into()),
    }
}

/// List karaoke bans (staff)
#[poise::command(slash_command, guild_only)]
pub async fn banlist(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_staff(&ctx).await? {
        return Ok(());
    }

    let banned = ctx.data().karaoke.banned().await?;
    if banned.is_empty() {
        say_ephemeral(&ctx, "Nobody is banned from karaoke.").await
    } else {
        let list = banned
            .iter()
            .map(|id| format!("<@{id}>"))
            .collect::<Vec<_>>()
            .join("\n");
        ctx.send(
            poise::CreateReply::default()
                .embed(
                    serenity::CreateEmbed::new()
                        .title("Karaoke bans")
                        .description(list)
                        .colour(serenity::Colour::RED),
                )
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

/// Clear the queue for a new session (staff)
#[poise::command(slash_command, guild_only)]
pub async fn clear(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_staff(&ctx).await? {
        return Ok(());
    }

    ctx.data().karaoke.clear().await;
    ctx.say("Queue cleared. Fresh session, everyone gets priority again!")
        .await?;
    Ok(())
}
