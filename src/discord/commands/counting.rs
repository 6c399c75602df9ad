// Counting commands.
//
// The validator itself is event-driven (see discord/counting); the only
// command is the staff override.

use crate::core::autoreact::AutoReactService;
use crate::core::counting::{Counter, CountingValidator, MessageOrigin, TrackedMessage};
use crate::core::custom_commands::CustomCommandService;
use crate::core::karaoke::KaraokeService;
use crate::discord::bot_config::BotConfig;
use crate::infra::autoreact::JsonAutoReactStore;
use crate::infra::custom_commands::JsonCommandStore;
use crate::infra::karaoke::JsonBanStore;
use poise::serenity_prelude as serenity;

/// Override the current count
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn countingoverride(
    ctx: Context<'_>,
    #[description = "The new current count"] number: i64,
) -> Result<(), Error> {
    let Some(validator) = ctx.data().counting.as_ref() else {
        ctx.say("Counting is not configured on this bot.").await?;
        return Ok(());
    };

    let bot_id = ctx.serenity_context().cache.current_user().id.get();
    let channel = serenity::ChannelId::new(validator.channel_id());

    let mut guard = validator.lock().await;

    let embed = serenity::CreateEmbed::new()
        .title("Count Overridden!")
        .description(format!(
            "The current count has been set to: **`{}`** by <@{}>.",
            number,
            ctx.author().id.get()
        ))
        .colour(serenity::Colour::DARK_GREEN);
    let sent = channel
        .send_message(
            ctx.http(),
            serenity::CreateMessage::new()
                .content(number.to_string())
                .embed(embed),
        )
        .await?;

    match guard.as_mut() {
        Some(counter) => counter.record_checkpoint(number, sent.id.get(), bot_id, *sent.timestamp),
        None => {
            *guard = Some(Counter::new(
                number,
                TrackedMessage {
                    id: sent.id.get(),
                    author_id: bot_id,
                    timestamp: *sent.timestamp,
                    origin: MessageOrigin::BotRepost { notice: None },
                },
            ))
        }
    }
    drop(guard);

    tracing::info!(number, moderator = ctx.author().id.get(), "Count overridden");
    ctx.send(
        poise::CreateReply::default()
            .content(format!("Count set to **{number}**."))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Type alias for our bot's context.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
/// This is where we store our services and configuration.
use std::sync::Arc;

pub struct Data {
    pub config: BotConfig,
    pub counting: Option<Arc<CountingValidator>>,
    pub karaoke: Arc<KaraokeService<JsonBanStore>>,
    pub autoreact: Arc<AutoReactService<JsonAutoReactStore>>,
    pub custom_commands: Arc<CustomCommandService<JsonCommandStore>>,
}
