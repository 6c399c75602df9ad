// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON stores)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::autoreact::AutoReactService;
use crate::core::counting::CountingValidator;
use crate::core::custom_commands::CustomCommandService;
use crate::core::karaoke::KaraokeService;
use crate::discord::bot_config::BotConfig;
use crate::discord::counting as counting_events;
use crate::discord::{Data, Error};
use crate::infra::autoreact::JsonAutoReactStore;
use crate::infra::custom_commands::JsonCommandStore;
use crate::infra::karaoke::JsonBanStore;
use poise::serenity_prelude as serenity;

/// Event handler for non-command Discord events.
/// This is where the counting validator, autoreacts, custom commands,
/// welcomes, and verification are driven from.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            // Ignore bot messages (including our own)
            if new_message.author.bot {
                return Ok(());
            }

            // Each feature gets the message independently; one failing
            // shouldn't starve the others.
            if let Err(err) = counting_events::handle_message(ctx, data, new_message).await {
                tracing::error!("Counting handler failed: {}", err);
            }
            if let Err(err) = discord::autoreact::handle_message(ctx, data, new_message).await {
                tracing::warn!("Autoreact handler failed: {}", err);
            }
            if let Err(err) = discord::custom_commands::handle_message(ctx, data, new_message).await
            {
                tracing::warn!("Custom command handler failed: {}", err);
            }
        }
        serenity::FullEvent::MessageUpdate { event, .. } => {
            if let Err(err) = counting_events::handle_edit(ctx, data, event).await {
                tracing::error!("Counting edit handler failed: {}", err);
            }
        }
        serenity::FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            ..
        } => {
            if let Err(err) =
                counting_events::handle_delete(ctx, data, *channel_id, *deleted_message_id).await
            {
                tracing::error!("Counting delete handler failed: {}", err);
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(err) = discord::welcome::handle_member_join(ctx, data, new_member).await {
                tracing::warn!("Welcome handler failed: {}", err);
            }
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            if let Err(err) =
                discord::verification::handle_reaction_add(ctx, data, add_reaction).await
            {
                tracing::warn!("Verification handler failed: {}", err);
            }
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    let config = BotConfig::from_env();

    // Keep runtime state in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory for JSON state");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    use std::sync::Arc;

    let counting = config
        .counting_channel_id
        .map(|channel_id| Arc::new(CountingValidator::new(channel_id)));
    if counting.is_none() {
        tracing::info!("COUNTING_CHANNEL_ID not set, counting is disabled");
    }

    let karaoke = Arc::new(KaraokeService::new(JsonBanStore::new(format!(
        "{data_dir}/karaoke_bans.json"
    ))));

    let autoreact = Arc::new(
        AutoReactService::new(JsonAutoReactStore::new(format!("{data_dir}/autoreact.json")))
            .await
            .expect("Failed to load autoreact rules"),
    );

    let custom_commands = Arc::new(CustomCommandService::new(JsonCommandStore::new(format!(
        "{data_dir}/custom_commands.json"
    ))));

    // Create the data structure that will be shared across all commands
    let data = Data {
        config,
        counting,
        karaoke,
        autoreact,
        custom_commands,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                discord::commands::counting::countingoverride(),
                discord::commands::karaoke::karaoke(),
                discord::commands::autoreact::autoreact(),
                discord::commands::custom_commands::createcmd(),
                discord::commands::custom_commands::removecmd(),
                discord::commands::custom_commands::listcmds(),
                discord::commands::codes::announcecodes(),
                discord::commands::verification::fixreaction(),
                discord::commands::logs::getlogs(),
                discord::commands::fun::eightball(),
            ],
            // Event handler for messages and other events
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(discord::error_handler::on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("?".to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                // Register slash commands globally (can take up to an hour
                // to propagate; use register_in_guild during development)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");

                // Reconstruct the counting state from channel history so
                // the first message after a restart doesn't pay for the
                // scan.
                if let Err(err) = counting_events::recover_at_startup(ctx, &data).await {
                    tracing::warn!("Counting startup recovery failed: {}", err);
                }

                tracing::info!("Bot is ready");
                Ok(data)
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
