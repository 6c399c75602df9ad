// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "bot_config.rs"]
pub mod bot_config;

#[path = "counting/message_handler.rs"]
pub mod counting;

#[path = "autoreact/message_handler.rs"]
pub mod autoreact;

#[path = "custom_commands/message_handler.rs"]
pub mod custom_commands;

#[path = "welcome/member_join.rs"]
pub mod welcome;

#[path = "verification/reaction_handler.rs"]
pub mod verification;

#[path = "error_handler.rs"]
pub mod error_handler;

// Re-export command types for convenience
pub use commands::counting::{Context, Data, Error};
