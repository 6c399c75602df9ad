pub mod counting_models;
pub mod counting_service;
pub mod expr;

pub use counting_models::{
    CountMessage, FailReason, MessageOrigin, Representation, TamperKind, TrackedMessage, Verdict,
    DUPLICATE_GRACE_MS, HISTORY_SCAN_LIMIT,
};
pub use counting_service::{recover_from_history, Counter, CountingValidator};
