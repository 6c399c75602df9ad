// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "karaoke/json_ban_store.rs"]
pub mod karaoke;

#[path = "autoreact/json_store.rs"]
pub mod autoreact;

#[path = "custom_commands/json_store.rs"]
pub mod custom_commands;
