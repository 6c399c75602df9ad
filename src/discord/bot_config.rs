// Environment-driven configuration.
//
// Every feature reads its channel/role/message ids from the environment;
// an unset optional id disables that feature. Parsing happens once in
// main, and the result rides along in `Data`.

use std::env;

const DEFAULT_REDEEM_URL: &str = "https://hsr.hoyoverse.com/gift?code=";
const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone, Default)]
pub struct BotConfig {
    /// Channel the counting validator watches.
    pub counting_channel_id: Option<u64>,
    /// Channel karaoke queue commands are restricted to (unset = anywhere).
    pub karaoke_channel_id: Option<u64>,
    /// Role allowed to run staff karaoke operations. Admins always can.
    pub event_staff_role_id: Option<u64>,
    /// Channel gift-code announcements are posted to.
    pub codes_channel_id: Option<u64>,
    /// Role pinged by gift-code announcements.
    pub codes_role_id: Option<u64>,
    /// Base URL a code is appended to for the redeem buttons.
    pub codes_redeem_url: String,
    pub verify_channel_id: Option<u64>,
    pub verify_message_id: Option<u64>,
    pub verify_role_id: Option<u64>,
    pub verify_muted_role_id: Option<u64>,
    /// Channel for member-join greetings.
    pub welcome_channel_id: Option<u64>,
    /// Directory `getlogs` looks for `.log` files in.
    pub log_dir: String,
}

/// The verification ids that must all be present for the feature to run.
#[derive(Debug, Clone, Copy)]
pub struct VerificationIds {
    pub channel_id: u64,
    pub message_id: u64,
    pub role_id: u64,
    pub muted_role_id: Option<u64>,
}

impl BotConfig {
    pub fn from_env() -> Self {
        Self {
            counting_channel_id: env_id("COUNTING_CHANNEL_ID"),
            karaoke_channel_id: env_id("KARAOKE_CHANNEL_ID"),
            event_staff_role_id: env_id("EVENT_STAFF_ROLE_ID"),
            codes_channel_id: env_id("CODES_CHANNEL_ID"),
            codes_role_id: env_id("CODES_ROLE_ID"),
            codes_redeem_url: env::var("CODES_REDEEM_URL")
                .unwrap_or_else(|_| DEFAULT_REDEEM_URL.to_string()),
            verify_channel_id: env_id("VERIFY_CHANNEL_ID"),
            verify_message_id: env_id("VERIFY_MESSAGE_ID"),
            verify_role_id: env_id("VERIFY_ROLE_ID"),
            verify_muted_role_id: env_id("VERIFY_MUTED_ROLE_ID"),
            welcome_channel_id: env_id("WELCOME_CHANNEL_ID"),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string()),
        }
    }

    pub fn verification(&self) -> Option<VerificationIds> {
        Some(VerificationIds {
            channel_id: self.verify_channel_id?,
            message_id: self.verify_message_id?,
            role_id: self.verify_role_id?,
            muted_role_id: self.verify_muted_role_id,
        })
    }
}

fn env_id(name: &str) -> Option<u64> {
    let value = env::var(name).ok()?;
    match value.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::warn!("{} is set but is not a valid id: {:?}", name, value);
            None
        }
    }
}
