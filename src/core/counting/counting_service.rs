// Sequential count validator - the counting channel's state machine.
//
// NO Discord dependencies here. The discord layer translates serenity
// events into `CountMessage`s, holds the validator's lock for the whole
// event, and renders verdicts as reactions and embeds.

use super::counting_models::{
    CountMessage, FailReason, MessageOrigin, Representation, TamperKind, TamperNotice,
    TrackedMessage, Verdict, DUPLICATE_GRACE_MS,
};
use super::expr;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard};

/// The `(last_number, last_message)` state machine. All transitions happen
/// through `check` and the `record_*` methods, under the validator's lock.
#[derive(Debug)]
pub struct Counter {
    last_number: i64,
    last_message: TrackedMessage,
}

impl Counter {
    pub fn new(last_number: i64, last_message: TrackedMessage) -> Self {
        Self {
            last_number,
            last_message,
        }
    }

    pub fn last_number(&self) -> i64 {
        self.last_number
    }

    pub fn last_author_id(&self) -> u64 {
        self.last_message.author_id
    }

    /// Is `message_id` the message we are currently tracking? Used by the
    /// edit/delete handlers to ignore everything else.
    pub fn is_tracking(&self, message_id: u64) -> bool {
        self.last_message.id == message_id
    }

    /// How to display the current count. Bot posts and plain numbers show
    /// as the literal; anything else was an expression and shows verbatim.
    pub fn representation(&self) -> Representation {
        match &self.last_message.origin {
            MessageOrigin::UserCount { raw } if *raw != self.last_number.to_string() => {
                Representation::Expression(raw.clone())
            }
            _ => Representation::Literal(self.last_number),
        }
    }

    /// Classify one incoming channel message and apply the transition.
    ///
    /// A `Failed` verdict resets `last_number` to 0 immediately; the caller
    /// is expected to post the failure notice and then call
    /// `record_checkpoint` so the bot's own "0" post becomes the tracked
    /// message.
    pub fn check(&mut self, msg: &CountMessage) -> Verdict {
        let value = match expr::parse(&msg.content) {
            Some(value) => value,
            None => return Verdict::NotANumber,
        };

        let expected = self.last_number.saturating_add(1);

        if value != expected {
            // Grace period for when people send the same number at the
            // same time.
            if value == self.last_number
                && msg.author_id != self.last_message.author_id
                && msg.timestamp - self.last_message.timestamp
                    <= Duration::milliseconds(DUPLICATE_GRACE_MS)
            {
                return Verdict::GraceDuplicate;
            }
            return self.fail(FailReason::WrongNumber);
        }

        if msg.author_id == self.last_message.author_id {
            return self.fail(FailReason::DoubleCount);
        }

        // The offender named in a tamper notice doesn't get to count next;
        // that would make edit-then-recount a free double turn.
        if let MessageOrigin::BotRepost {
            notice: Some(notice),
        } = &self.last_message.origin
        {
            if notice.offender_id == msg.author_id {
                return self.fail(FailReason::TamperEvasion);
            }
        }

        self.last_number = value;
        self.last_message = TrackedMessage {
            id: msg.id,
            author_id: msg.author_id,
            timestamp: msg.timestamp,
            origin: MessageOrigin::UserCount {
                raw: msg.content.clone(),
            },
        };
        Verdict::Accepted
    }

    fn fail(&mut self, reason: FailReason) -> Verdict {
        let ruined_at = self.last_number;
        self.last_number = 0;
        Verdict::Failed { reason, ruined_at }
    }

    /// Track one of our own posts (reset notice, override, recovery
    /// marker) as the current count.
    pub fn record_checkpoint(
        &mut self,
        number: i64,
        message_id: u64,
        bot_id: u64,
        timestamp: DateTime<Utc>,
    ) {
        self.last_number = number;
        self.last_message = TrackedMessage {
            id: message_id,
            author_id: bot_id,
            timestamp,
            origin: MessageOrigin::BotRepost { notice: None },
        };
    }

    /// Track our repost after the tracked message was edited or deleted.
    /// Keeps `last_number`, remembers the offender.
    pub fn record_tamper_repost(
        &mut self,
        kind: TamperKind,
        offender_id: u64,
        message_id: u64,
        bot_id: u64,
        timestamp: DateTime<Utc>,
    ) {
        self.last_message = TrackedMessage {
            id: message_id,
            author_id: bot_id,
            timestamp,
            origin: MessageOrigin::BotRepost {
                notice: Some(TamperNotice { kind, offender_id }),
            },
        };
    }
}

/// Scan recent channel history (newest first) for the last valid count.
///
/// Foreign bots are skipped (their posts are not counts), and so is
/// `skip_id` - the message that triggered recovery, which must not recover
/// itself. Returns the number and the tracked form of the message that
/// carried it.
pub fn recover_from_history(
    history: &[CountMessage],
    own_bot_id: u64,
    skip_id: Option<u64>,
) -> Option<(i64, TrackedMessage)> {
    for msg in history {
        if Some(msg.id) == skip_id {
            continue;
        }
        if msg.author_is_bot && msg.author_id != own_bot_id {
            continue;
        }
        if let Some(number) = expr::parse(&msg.content) {
            let origin = if msg.author_is_bot {
                MessageOrigin::BotRepost { notice: None }
            } else {
                MessageOrigin::UserCount {
                    raw: msg.content.clone(),
                }
            };
            let tracked = TrackedMessage {
                id: msg.id,
                author_id: msg.author_id,
                timestamp: msg.timestamp,
                origin,
            };
            return Some((number, tracked));
        }
    }
    None
}

/// One validator per counting channel. The mutex serializes the whole
/// read-modify-write for an event, including the history fetch during
/// recovery, so near-simultaneous messages cannot double-process.
pub struct CountingValidator {
    channel_id: u64,
    counter: Mutex<Option<Counter>>,
}

impl CountingValidator {
    pub fn new(channel_id: u64) -> Self {
        Self {
            channel_id,
            counter: Mutex::new(None),
        }
    }

    pub fn channel_id(&self) -> u64 {
        self.channel_id
    }

    /// Take the validator's lock. `None` inside means state has not been
    /// recovered yet; the discord layer fills it in while still holding
    /// the guard.
    pub async fn lock(&self) -> MutexGuard<'_, Option<Counter>> {
        self.counter.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: u64 = 1;
    const ALICE: u64 = 11;
    const BOB: u64 = 12;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn msg(id: u64, author_id: u64, content: &str, ms: i64) -> CountMessage {
        CountMessage {
            id,
            author_id,
            author_is_bot: false,
            content: content.to_string(),
            timestamp: at(ms),
        }
    }

    fn bot_msg(id: u64, content: &str, ms: i64) -> CountMessage {
        CountMessage {
            author_is_bot: true,
            ..msg(id, BOT, content, ms)
        }
    }

    fn counter_at(n: i64, author_id: u64, ms: i64) -> Counter {
        Counter::new(
            n,
            TrackedMessage {
                id: 100,
                author_id,
                timestamp: at(ms),
                origin: MessageOrigin::UserCount { raw: n.to_string() },
            },
        )
    }

    #[test]
    fn next_number_from_new_author_advances_by_one() {
        let mut counter = counter_at(41, ALICE, 0);
        let verdict = counter.check(&msg(101, BOB, "42", 5_000));
        assert_eq!(verdict, Verdict::Accepted);
        assert_eq!(counter.last_number(), 42);
        assert_eq!(counter.last_author_id(), BOB);
        assert!(counter.is_tracking(101));
    }

    #[test]
    fn expressions_count_too() {
        let mut counter = counter_at(41, ALICE, 0);
        assert_eq!(counter.check(&msg(101, BOB, "40+2", 1_000)), Verdict::Accepted);
        assert_eq!(counter.last_number(), 42);
        assert_eq!(
            counter.representation(),
            Representation::Expression("40+2".to_string())
        );
    }

    #[test]
    fn duplicate_within_grace_does_not_reset() {
        let mut counter = counter_at(42, ALICE, 1_000);
        let verdict = counter.check(&msg(101, BOB, "42", 1_500));
        assert_eq!(verdict, Verdict::GraceDuplicate);
        assert_eq!(counter.last_number(), 42);
        assert_eq!(counter.last_author_id(), ALICE); // state untouched
    }

    #[test]
    fn duplicate_after_grace_resets() {
        let mut counter = counter_at(42, ALICE, 1_000);
        let verdict = counter.check(&msg(101, BOB, "42", 2_000));
        assert_eq!(
            verdict,
            Verdict::Failed {
                reason: FailReason::WrongNumber,
                ruined_at: 42
            }
        );
        assert_eq!(counter.last_number(), 0);
    }

    #[test]
    fn duplicate_by_same_author_gets_no_grace() {
        let mut counter = counter_at(42, ALICE, 1_000);
        let verdict = counter.check(&msg(101, ALICE, "42", 1_100));
        assert_eq!(
            verdict,
            Verdict::Failed {
                reason: FailReason::WrongNumber,
                ruined_at: 42
            }
        );
    }

    #[test]
    fn any_other_value_resets_to_zero() {
        for wrong in ["44", "7", "-1", "0"] {
            let mut counter = counter_at(42, ALICE, 0);
            let verdict = counter.check(&msg(101, BOB, wrong, 10_000));
            assert!(
                matches!(verdict, Verdict::Failed { ruined_at: 42, .. }),
                "{wrong} should ruin the count"
            );
            assert_eq!(counter.last_number(), 0);
        }
    }

    #[test]
    fn counting_twice_in_a_row_fails() {
        let mut counter = counter_at(42, ALICE, 0);
        let verdict = counter.check(&msg(101, ALICE, "43", 10_000));
        assert_eq!(
            verdict,
            Verdict::Failed {
                reason: FailReason::DoubleCount,
                ruined_at: 42
            }
        );
        assert_eq!(counter.last_number(), 0);
    }

    #[test]
    fn tamper_offender_cannot_count_next() {
        let mut counter = counter_at(42, ALICE, 0);
        counter.record_tamper_repost(TamperKind::Edited, ALICE, 200, BOT, at(1_000));

        let verdict = counter.check(&msg(201, ALICE, "43", 2_000));
        assert_eq!(
            verdict,
            Verdict::Failed {
                reason: FailReason::TamperEvasion,
                ruined_at: 42
            }
        );
    }

    #[test]
    fn someone_else_may_count_after_tamper_repost() {
        let mut counter = counter_at(42, ALICE, 0);
        counter.record_tamper_repost(TamperKind::Deleted, ALICE, 200, BOT, at(1_000));

        assert_eq!(counter.check(&msg(201, BOB, "43", 2_000)), Verdict::Accepted);
        assert_eq!(counter.last_number(), 43);
    }

    #[test]
    fn non_number_leaves_state_alone() {
        let mut counter = counter_at(42, ALICE, 0);
        let verdict = counter.check(&msg(101, BOB, "nice count everyone", 1_000));
        assert_eq!(verdict, Verdict::NotANumber);
        assert_eq!(counter.last_number(), 42);
        assert!(counter.is_tracking(100));
    }

    #[test]
    fn checkpoint_after_fail_tracks_bot_post() {
        let mut counter = counter_at(42, ALICE, 0);
        counter.check(&msg(101, BOB, "99", 1_000));
        counter.record_checkpoint(0, 300, BOT, at(1_500));

        assert_eq!(counter.last_number(), 0);
        assert!(counter.is_tracking(300));
        assert_eq!(counter.representation(), Representation::Literal(0));
        // Anyone may start over, including the author who just failed.
        assert_eq!(counter.check(&msg(301, BOB, "1", 2_000)), Verdict::Accepted);
    }

    #[test]
    fn override_checkpoint_sets_arbitrary_count() {
        let mut counter = counter_at(3, ALICE, 0);
        counter.record_checkpoint(500, 400, BOT, at(1_000));
        assert_eq!(counter.last_number(), 500);
        assert_eq!(counter.check(&msg(401, BOB, "501", 2_000)), Verdict::Accepted);
    }

    #[test]
    fn recovery_picks_most_recent_valid_count() {
        let history = vec![
            msg(5, BOB, "not a number", 5_000),
            msg(4, ALICE, "17", 4_000),
            msg(3, BOB, "16", 3_000),
        ];
        let (number, tracked) = recover_from_history(&history, BOT, None).unwrap();
        assert_eq!(number, 17);
        assert_eq!(tracked.id, 4);
        assert_eq!(tracked.author_id, ALICE);
    }

    #[test]
    fn recovery_skips_foreign_bots_but_not_us() {
        let foreign_bot = CountMessage {
            author_is_bot: true,
            ..msg(6, 999, "1234", 6_000)
        };
        let history = vec![foreign_bot, bot_msg(5, "0", 5_000), msg(4, ALICE, "17", 4_000)];
        let (number, tracked) = recover_from_history(&history, BOT, None).unwrap();
        assert_eq!(number, 0); // our own reset post wins
        assert_eq!(tracked.id, 5);
        assert!(matches!(
            tracked.origin,
            MessageOrigin::BotRepost { notice: None }
        ));
    }

    #[test]
    fn recovery_skips_the_triggering_message() {
        let history = vec![msg(9, BOB, "21", 9_000), msg(8, ALICE, "20", 8_000)];
        let (number, tracked) = recover_from_history(&history, BOT, Some(9)).unwrap();
        assert_eq!(number, 20);
        assert_eq!(tracked.id, 8);
    }

    #[test]
    fn recovery_gives_up_on_empty_or_numberless_history() {
        assert!(recover_from_history(&[], BOT, None).is_none());
        let history = vec![msg(2, ALICE, "hello", 2_000), msg(1, BOB, "world", 1_000)];
        assert!(recover_from_history(&history, BOT, None).is_none());
    }

    #[tokio::test]
    async fn validator_serializes_access() {
        let validator = CountingValidator::new(777);
        assert_eq!(validator.channel_id(), 777);

        let mut guard = validator.lock().await;
        assert!(guard.is_none());
        *guard = Some(counter_at(10, ALICE, 0));
        drop(guard);

        let guard = validator.lock().await;
        assert_eq!(guard.as_ref().map(Counter::last_number), Some(10));
    }
}
