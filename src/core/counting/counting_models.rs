use chrono::{DateTime, Utc};

/// How long a duplicate of the current number from a different author is
/// tolerated without ruining the count.
pub const DUPLICATE_GRACE_MS: i64 = 750;

/// How far back recovery scans the channel after a restart.
pub const HISTORY_SCAN_LIMIT: u8 = 100;

/// Platform-agnostic view of a chat message, as much of it as the
/// validator needs to reach a verdict.
#[derive(Debug, Clone)]
pub struct CountMessage {
    pub id: u64,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TamperKind {
    Edited,
    Deleted,
}

/// Record of the bot re-posting the count after the tracked message was
/// edited or deleted. The offender is remembered so they cannot sneak in
/// the next number themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TamperNotice {
    pub kind: TamperKind,
    pub offender_id: u64,
}

/// Where the tracked message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOrigin {
    /// A user's count, content kept verbatim (it may be an expression).
    UserCount { raw: String },
    /// One of our own posts: a reset, an override, a recovery marker, or a
    /// tamper repost carrying a notice.
    BotRepost { notice: Option<TamperNotice> },
}

/// The most recently accepted (or bot-restated) count message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedMessage {
    pub id: u64,
    pub author_id: u64,
    pub timestamp: DateTime<Utc>,
    pub origin: MessageOrigin,
}

/// How to display the current count: the number itself, or the raw text
/// when the accepted message was an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    Literal(i64),
    Expression(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// Not the expected next number.
    WrongNumber,
    /// Same author counted twice in a row.
    DoubleCount,
    /// The author whose tamper notice is on record tried to count next.
    TamperEvasion,
}

/// Outcome of processing one channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Count advanced by exactly one.
    Accepted,
    /// Exact duplicate from a different author inside the grace window;
    /// state unchanged.
    GraceDuplicate,
    /// Content did not parse; state unchanged.
    NotANumber,
    /// Count ruined. `last_number` has already been reset to 0; `ruined_at`
    /// is the value the chain reached before this message.
    Failed {
        reason: FailReason,
        ruined_at: i64,
    },
}
