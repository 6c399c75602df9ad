// Discord-side of the counting validator - translates serenity events
// into `CountMessage`s, holds the validator's lock for the whole event,
// and renders verdicts as reactions and embeds.

use crate::core::counting::{
    expr, recover_from_history, CountMessage, Counter, CountingValidator, FailReason,
    MessageOrigin, Representation, TamperKind, TrackedMessage, Verdict, HISTORY_SCAN_LIMIT,
};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

fn check_mark() -> serenity::ReactionType {
    serenity::ReactionType::Unicode("✅".to_string())
}

fn cross_mark() -> serenity::ReactionType {
    serenity::ReactionType::Unicode("❌".to_string())
}

fn to_count_message(msg: &serenity::Message) -> CountMessage {
    CountMessage {
        id: msg.id.get(),
        author_id: msg.author.id.get(),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        timestamp: *msg.timestamp,
    }
}

/// `1234567` -> `1,234,567`, for the embeds.
fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    let lead = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && i % 3 == lead % 3 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Markdown for "the count is currently at X": the number itself, or the
/// raw expression in a code block with backticks defanged.
fn representation_markdown(counter: &Counter) -> String {
    match counter.representation() {
        Representation::Literal(n) => format!("**`{}`**", format_thousands(n)),
        Representation::Expression(raw) => {
            format!("\n```text\n{}\n```\n", raw.replace('`', "[backtick]"))
        }
    }
}

fn embed_author(user: &serenity::User) -> serenity::CreateEmbedAuthor {
    serenity::CreateEmbedAuthor::new(format!("{} ({})", user.display_name(), user.id.get()))
        .icon_url(user.face())
}

/// Handle a message in the counting channel. Takes the validator's lock
/// for the whole event, recovery included, so near-simultaneous messages
/// cannot double-process.
pub async fn handle_message(
    ctx: &serenity::Context,
    data: &Data,
    msg: &serenity::Message,
) -> Result<(), Error> {
    let Some(validator) = data.counting.as_ref() else {
        return Ok(());
    };
    if msg.author.bot || msg.guild_id.is_none() {
        return Ok(());
    }
    if msg.channel_id.get() != validator.channel_id() {
        return Ok(());
    }

    let bot_id = ctx.cache.current_user().id.get();

    let mut guard = validator.lock().await;
    ensure_state(ctx, validator, &mut guard, Some(msg), bot_id).await?;
    let Some(counter) = guard.as_mut() else {
        return Ok(());
    };

    match counter.check(&to_count_message(msg)) {
        Verdict::Accepted => {
            msg.react(&ctx.http, check_mark()).await?;
        }
        Verdict::GraceDuplicate => {
            msg.react(&ctx.http, cross_mark()).await?;
            let embed = serenity::CreateEmbed::new()
                .title("That doesn't look right, but I'll give you a chance...")
                .description(format!(
                    "<@{}> sent a duplicate number, but within the grace period. \
                     The count is still at {}.",
                    msg.author.id.get(),
                    representation_markdown(counter)
                ))
                .colour(serenity::Colour::GOLD);
            msg.channel_id
                .send_message(
                    &ctx.http,
                    serenity::CreateMessage::new()
                        .reference_message(msg)
                        .embed(embed),
                )
                .await?;
        }
        Verdict::NotANumber => {
            // Re-post the chatter as our own embed with the count
            // restated, so the current number doesn't scroll away.
            let embed = serenity::CreateEmbed::new()
                .description(msg.content.clone())
                .colour(serenity::Colour::LIGHT_GREY)
                .field(
                    "\u{200b}",
                    format!(
                        "*The count is currently at:* {} (*by <@{}>*)",
                        representation_markdown(counter),
                        counter.last_author_id()
                    ),
                    false,
                )
                .author(embed_author(&msg.author));
            msg.delete(&ctx.http).await?;
            msg.channel_id
                .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
                .await?;
        }
        Verdict::Failed { reason, ruined_at } => {
            let title = match reason {
                FailReason::WrongNumber => "That doesn't look right! Better luck next time :)",
                FailReason::DoubleCount | FailReason::TamperEvasion => {
                    "You can't count twice in a row!"
                }
            };

            if reason == FailReason::TamperEvasion {
                send_tamper_warning(ctx, msg).await;
            }

            tracing::info!(
                user_id = msg.author.id.get(),
                ruined_at,
                ?reason,
                "Count ruined"
            );
            fail(ctx, counter, msg, title, ruined_at, bot_id).await?;
        }
    }

    Ok(())
}

/// Send the count-failed notice and track our own "0" post as the new
/// count. The state is already reset; even if the send fails, the next
/// expected number is 1.
async fn fail(
    ctx: &serenity::Context,
    counter: &mut Counter,
    msg: &serenity::Message,
    title: &str,
    ruined_at: i64,
    bot_id: u64,
) -> Result<(), Error> {
    let _ = msg.react(&ctx.http, cross_mark()).await;

    let embed = serenity::CreateEmbed::new()
        .title(title)
        .description(format!(
            "<@{}> ruined the count at **{}**. Next number is **1**.\n\n\
             *If this detection appears incorrect, please report it to the bot development team.*",
            msg.author.id.get(),
            format_thousands(ruined_at)
        ))
        .colour(serenity::Colour::RED)
        .author(embed_author(&msg.author));

    // "0" content allows for count recovery.
    let sent = msg
        .channel_id
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new().content("0").embed(embed),
        )
        .await?;
    counter.record_checkpoint(0, sent.id.get(), bot_id, *sent.timestamp);
    Ok(())
}

/// The "stop editing your messages" reply, deleted after a few seconds.
async fn send_tamper_warning(ctx: &serenity::Context, msg: &serenity::Message) {
    let warning = msg
        .channel_id
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .reference_message(msg)
                .content(
                    "Don't try to edit or delete your messages to get around detections please.\n\
                     If you're seeing this by pure coincidence, don't worry about it.",
                ),
        )
        .await;

    match warning {
        Ok(warning) => {
            let http = ctx.http.clone();
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                let _ = warning.delete(&http).await;
            });
        }
        Err(err) => tracing::warn!("Failed to send tamper warning: {}", err),
    }
}

/// Ensure the counter exists. In order: recover from the last 100 channel
/// messages; failing that, trust `default` (the triggering message) and
/// back up one; failing that, reset to 0. With `default = None` (startup)
/// only the history step runs and the counter may stay unset.
async fn ensure_state(
    ctx: &serenity::Context,
    validator: &CountingValidator,
    guard: &mut Option<Counter>,
    default: Option<&serenity::Message>,
    bot_id: u64,
) -> Result<(), Error> {
    if guard.is_some() {
        return Ok(());
    }

    let channel = serenity::ChannelId::new(validator.channel_id());
    let history = channel
        .messages(
            &ctx.http,
            serenity::GetMessages::new().limit(HISTORY_SCAN_LIMIT),
        )
        .await
        .unwrap_or_default();
    let mapped: Vec<CountMessage> = history.iter().map(to_count_message).collect();

    if let Some((number, tracked)) =
        recover_from_history(&mapped, bot_id, default.map(|m| m.id.get()))
    {
        // Make sure the recovered message wears our ✅ so the channel can
        // see where the count stands.
        if let Some(original) = history.iter().find(|m| m.id.get() == tracked.id) {
            let already_marked = original
                .reactions
                .iter()
                .any(|r| r.me && r.reaction_type == check_mark());
            if !already_marked {
                let _ = original.react(&ctx.http, check_mark()).await;
            }
        }
        tracing::info!(number, "Recovered count from channel history");
        *guard = Some(Counter::new(number, tracked));
        return Ok(());
    }

    let Some(default) = default else {
        // Startup pass: nothing usable in history, leave recovery to the
        // first incoming message.
        return Ok(());
    };

    if let Some(number) = expr::parse(&default.content) {
        // Assume the incoming number is right and back up one. The marker
        // post becomes the tracked message so the double-count check can't
        // fire against something stale.
        let marker = channel
            .say(&ctx.http, "*Count Recovered - Ignore This Message*")
            .await?;
        tracing::info!(number, "Recovered count from the incoming message");
        *guard = Some(Counter::new(
            number.saturating_sub(1),
            TrackedMessage {
                id: marker.id.get(),
                author_id: bot_id,
                timestamp: *marker.timestamp,
                origin: MessageOrigin::BotRepost { notice: None },
            },
        ));
        return Ok(());
    }

    // All recovery steps failed; reset to 0.
    let embed = serenity::CreateEmbed::new()
        .title("Count Reset to 0")
        .description(
            "I was unable to find any previous counting data, through any recovery method. \
             As a result, the count has been reset to 0. This should almost never happen, \
             please contact a bot developer if you see this in normal operational \
             circumstances.\n\nNext number is **1**.",
        )
        .colour(serenity::Colour::RED);
    let sent = channel
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new().content("0").embed(embed),
        )
        .await?;
    tracing::warn!("Counting recovery failed entirely, reset to 0");
    *guard = Some(Counter::new(
        0,
        TrackedMessage {
            id: sent.id.get(),
            author_id: bot_id,
            timestamp: *sent.timestamp,
            origin: MessageOrigin::BotRepost { notice: None },
        },
    ));
    Ok(())
}

/// Startup recovery: scan history once so the first message after a
/// restart doesn't pay for the scan.
pub async fn recover_at_startup(ctx: &serenity::Context, data: &Data) -> Result<(), Error> {
    let Some(validator) = data.counting.as_ref() else {
        return Ok(());
    };
    let bot_id = ctx.cache.current_user().id.get();
    let mut guard = validator.lock().await;
    ensure_state(ctx, validator, &mut guard, None, bot_id).await
}

/// The tracked message was edited: re-post the count under our own name,
/// remember the offender, then delete the edited original.
pub async fn handle_edit(
    ctx: &serenity::Context,
    data: &Data,
    event: &serenity::MessageUpdateEvent,
) -> Result<(), Error> {
    let Some(validator) = data.counting.as_ref() else {
        return Ok(());
    };
    if event.channel_id.get() != validator.channel_id() {
        return Ok(());
    }

    let mut guard = validator.lock().await;
    let Some(counter) = guard.as_mut() else {
        return Ok(());
    };
    if !counter.is_tracking(event.id.get()) {
        return Ok(());
    }

    let offender = counter.last_author_id();
    let bot_id = ctx.cache.current_user().id.get();
    repost_after_tamper(ctx, counter, event.channel_id, TamperKind::Edited, offender, bot_id)
        .await?;

    // Delete the original only after the repost is tracked, so the
    // deletion detection doesn't fire on it.
    if let Err(err) = ctx.http.delete_message(event.channel_id, event.id, None).await {
        tracing::warn!("Failed to delete edited count message: {}", err);
    }
    Ok(())
}

/// The tracked message was deleted: re-post the count and remember the
/// offender.
pub async fn handle_delete(
    ctx: &serenity::Context,
    data: &Data,
    channel_id: serenity::ChannelId,
    deleted_message_id: serenity::MessageId,
) -> Result<(), Error> {
    let Some(validator) = data.counting.as_ref() else {
        return Ok(());
    };
    if channel_id.get() != validator.channel_id() {
        return Ok(());
    }

    let mut guard = validator.lock().await;
    let Some(counter) = guard.as_mut() else {
        return Ok(());
    };
    if !counter.is_tracking(deleted_message_id.get()) {
        return Ok(());
    }

    let offender = counter.last_author_id();
    let bot_id = ctx.cache.current_user().id.get();
    repost_after_tamper(ctx, counter, channel_id, TamperKind::Deleted, offender, bot_id).await?;
    Ok(())
}

async fn repost_after_tamper(
    ctx: &serenity::Context,
    counter: &mut Counter,
    channel: serenity::ChannelId,
    kind: TamperKind,
    offender: u64,
    bot_id: u64,
) -> Result<(), Error> {
    let (verb, colour) = match kind {
        TamperKind::Edited => ("editing", serenity::Colour::from_rgb(46, 204, 113)),
        TamperKind::Deleted => ("deleting", serenity::Colour::DARK_GREEN),
    };

    let mut embed = serenity::CreateEmbed::new()
        .description(format!(
            "<@{offender}> tried {verb} their message...\n\n\
             The count is currently at: {}",
            representation_markdown(counter)
        ))
        .colour(colour);
    if let Ok(user) = ctx.http.get_user(serenity::UserId::new(offender)).await {
        embed = embed.author(embed_author(&user));
    }

    let sent = channel
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .content(counter.last_number().to_string())
                .embed(embed),
        )
        .await?;
    counter.record_tamper_repost(kind, offender, sent.id.get(), bot_id, *sent.timestamp);

    tracing::info!(offender, ?kind, "Neutralized tampering with the tracked count");
    Ok(())
}
