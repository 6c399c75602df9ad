pub mod karaoke_models;
pub mod karaoke_service;

pub use karaoke_models::{QueueSnapshot, Tier};
pub use karaoke_service::{BanStore, BanStoreError, KaraokeError, KaraokeService};
