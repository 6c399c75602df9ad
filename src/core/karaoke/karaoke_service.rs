// Karaoke queue manager - a two-tier FIFO with staff scheduling controls.
//
// Queue state lives in memory for the session; only the ban list is
// persisted, through the `BanStore` trait.

use super::karaoke_models::{QueueSnapshot, Tier};
use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum BanStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted set of banned user ids.
#[async_trait]
pub trait BanStore: Send + Sync {
    async fn is_banned(&self, user_id: u64) -> Result<bool, BanStoreError>;
    /// Returns false if the user was already banned.
    async fn ban(&self, user_id: u64) -> Result<bool, BanStoreError>;
    /// Returns false if the user was not banned.
    async fn unban(&self, user_id: u64) -> Result<bool, BanStoreError>;
    async fn all(&self) -> Result<Vec<u64>, BanStoreError>;
}

#[derive(Debug, Error)]
pub enum KaraokeError {
    #[error("Store error: {0}")]
    Store(#[from] BanStoreError),
    #[error("Already in the queue")]
    AlreadyQueued,
    #[error("Not in the queue")]
    NotQueued,
    #[error("The queue is empty")]
    QueueEmpty,
    #[error("Banned from karaoke")]
    Banned,
    #[error("Already banned")]
    AlreadyBanned,
    #[error("Not banned")]
    NotBanned,
}

#[derive(Default)]
struct QueueState {
    priority: Vec<u64>,
    requeue: Vec<u64>,
    current: Option<u64>,
    sung: HashSet<u64>,
}

impl QueueState {
    // Invariant: a user id appears in at most one of priority, requeue,
    // current. `holds` and the removal helpers keep it that way.
    fn holds(&self, user_id: u64) -> bool {
        self.current == Some(user_id)
            || self.priority.contains(&user_id)
            || self.requeue.contains(&user_id)
    }

    fn tier_of(&self, user_id: u64) -> Option<Tier> {
        if self.priority.contains(&user_id) {
            Some(Tier::Priority)
        } else if self.requeue.contains(&user_id) {
            Some(Tier::Requeue)
        } else {
            None
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut Vec<u64> {
        match tier {
            Tier::Priority => &mut self.priority,
            Tier::Requeue => &mut self.requeue,
        }
    }

    fn remove_from_tiers(&mut self, user_id: u64) -> Option<Tier> {
        if let Some(pos) = self.priority.iter().position(|&id| id == user_id) {
            self.priority.remove(pos);
            return Some(Tier::Priority);
        }
        if let Some(pos) = self.requeue.iter().position(|&id| id == user_id) {
            self.requeue.remove(pos);
            return Some(Tier::Requeue);
        }
        None
    }
}

pub struct KaraokeService<S: BanStore> {
    store: S,
    queue: Mutex<QueueState>,
}

impl<S: BanStore> KaraokeService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            queue: Mutex::new(QueueState::default()),
        }
    }

    /// Join the queue. First-timers enter the priority tier; anyone who
    /// already sang this session enters the requeue tier.
    pub async fn join(&self, user_id: u64) -> Result<Tier, KaraokeError> {
        if self.store.is_banned(user_id).await? {
            return Err(KaraokeError::Banned);
        }

        let mut queue = self.queue.lock().await;
        if queue.holds(user_id) {
            return Err(KaraokeError::AlreadyQueued);
        }

        let tier = if queue.sung.contains(&user_id) {
            Tier::Requeue
        } else {
            Tier::Priority
        };
        queue.tier_mut(tier).push(user_id);
        Ok(tier)
    }

    pub async fn leave(&self, user_id: u64) -> Result<Tier, KaraokeError> {
        let mut queue = self.queue.lock().await;
        queue.remove_from_tiers(user_id).ok_or(KaraokeError::NotQueued)
    }

    /// Pop the next singer. Priority always drains before requeue.
    pub async fn next(&self) -> Result<u64, KaraokeError> {
        let mut queue = self.queue.lock().await;
        let user_id = if !queue.priority.is_empty() {
            queue.priority.remove(0)
        } else if !queue.requeue.is_empty() {
            queue.requeue.remove(0)
        } else {
            return Err(KaraokeError::QueueEmpty);
        };

        queue.current = Some(user_id);
        queue.sung.insert(user_id);
        Ok(user_id)
    }

    /// Force-remove a user from either tier or the current slot.
    pub async fn evict(&self, user_id: u64) -> Result<(), KaraokeError> {
        let mut queue = self.queue.lock().await;
        if queue.current == Some(user_id) {
            queue.current = None;
            return Ok(());
        }
        queue
            .remove_from_tiers(user_id)
            .map(|_| ())
            .ok_or(KaraokeError::NotQueued)
    }

    /// Move a queued user to the front of their tier.
    pub async fn bump(&self, user_id: u64) -> Result<Tier, KaraokeError> {
        self.reposition(user_id, 0).await
    }

    /// Move a queued user to the back of their tier.
    pub async fn pull(&self, user_id: u64) -> Result<Tier, KaraokeError> {
        self.reposition(user_id, usize::MAX).await
    }

    /// Move a queued user to `position` (0-based, clamped) in their tier.
    pub async fn jump(&self, user_id: u64, position: usize) -> Result<Tier, KaraokeError> {
        self.reposition(user_id, position).await
    }

    async fn reposition(&self, user_id: u64, position: usize) -> Result<Tier, KaraokeError> {
        let mut queue = self.queue.lock().await;
        let tier = queue.tier_of(user_id).ok_or(KaraokeError::NotQueued)?;
        let list = queue.tier_mut(tier);
        let pos = list
            .iter()
            .position(|&id| id == user_id)
            .ok_or(KaraokeError::NotQueued)?;
        list.remove(pos);
        let target = position.min(list.len());
        list.insert(target, user_id);
        Ok(tier)
    }

    /// Ban a user and retroactively remove them from any active position.
    /// Returns true if they were queued or up when banned.
    pub async fn ban(&self, user_id: u64) -> Result<bool, KaraokeError> {
        if !self.store.ban(user_id).await? {
            return Err(KaraokeError::AlreadyBanned);
        }

        let mut queue = self.queue.lock().await;
        let mut was_active = queue.remove_from_tiers(user_id).is_some();
        if queue.current == Some(user_id) {
            queue.current = None;
            was_active = true;
        }
        Ok(was_active)
    }

    pub async fn unban(&self, user_id: u64) -> Result<(), KaraokeError> {
        if !self.store.unban(user_id).await? {
            return Err(KaraokeError::NotBanned);
        }
        Ok(())
    }

    pub async fn banned(&self) -> Result<Vec<u64>, KaraokeError> {
        Ok(self.store.all().await?)
    }

    /// Start a fresh session: both tiers, the current slot, and the sung
    /// history are emptied. Bans stay.
    pub async fn clear(&self) {
        let mut queue = self.queue.lock().await;
        *queue = QueueState::default();
    }

    pub async fn snapshot(&self) -> QueueSnapshot {
        let queue = self.queue.lock().await;
        QueueSnapshot {
            current: queue.current,
            priority: queue.priority.clone(),
            requeue: queue.requeue.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashSet;

    struct MockBanStore {
        banned: DashSet<u64>,
    }

    impl MockBanStore {
        fn new() -> Self {
            Self {
                banned: DashSet::new(),
            }
        }
    }

    #[async_trait]
    impl BanStore for MockBanStore {
        async fn is_banned(&self, user_id: u64) -> Result<bool, BanStoreError> {
            Ok(self.banned.contains(&user_id))
        }

        async fn ban(&self, user_id: u64) -> Result<bool, BanStoreError> {
            Ok(self.banned.insert(user_id))
        }

        async fn unban(&self, user_id: u64) -> Result<bool, BanStoreError> {
            Ok(self.banned.remove(&user_id).is_some())
        }

        async fn all(&self) -> Result<Vec<u64>, BanStoreError> {
            Ok(self.banned.iter().map(|id| *id).collect())
        }
    }

    fn service() -> KaraokeService<MockBanStore> {
        KaraokeService::new(MockBanStore::new())
    }

    #[tokio::test]
    async fn first_timers_join_priority() {
        let karaoke = service();
        assert!(matches!(karaoke.join(1).await, Ok(Tier::Priority)));
        assert!(matches!(karaoke.join(2).await, Ok(Tier::Priority)));

        let snapshot = karaoke.snapshot().await;
        assert_eq!(snapshot.priority, vec![1, 2]);
        assert!(snapshot.requeue.is_empty());
    }

    #[tokio::test]
    async fn joining_twice_is_rejected() {
        let karaoke = service();
        karaoke.join(1).await.unwrap();
        assert!(matches!(
            karaoke.join(1).await,
            Err(KaraokeError::AlreadyQueued)
        ));
    }

    #[tokio::test]
    async fn next_prefers_priority_over_requeue() {
        let karaoke = service();
        karaoke.join(1).await.unwrap();
        karaoke.join(2).await.unwrap();

        assert_eq!(karaoke.next().await.unwrap(), 1);
        // 1 has sung; rejoining lands in requeue.
        assert!(matches!(karaoke.join(1).await, Ok(Tier::Requeue)));

        // 2 is still in priority and goes before 1's requeue entry.
        assert_eq!(karaoke.next().await.unwrap(), 2);
        assert_eq!(karaoke.next().await.unwrap(), 1);
        assert!(matches!(karaoke.next().await, Err(KaraokeError::QueueEmpty)));
    }

    #[tokio::test]
    async fn user_appears_in_at_most_one_place() {
        let karaoke = service();
        karaoke.join(1).await.unwrap();
        assert_eq!(karaoke.next().await.unwrap(), 1);

        // 1 is current; they cannot also queue... until they do, which
        // puts them in requeue and only there.
        assert!(matches!(
            karaoke.join(1).await,
            Err(KaraokeError::AlreadyQueued)
        ));

        karaoke.evict(1).await.unwrap();
        karaoke.join(1).await.unwrap();
        let snapshot = karaoke.snapshot().await;
        assert_eq!(snapshot.requeue, vec![1]);
        assert!(snapshot.priority.is_empty());
        assert_eq!(snapshot.current, None);
    }

    #[tokio::test]
    async fn banned_user_cannot_join() {
        let karaoke = service();
        karaoke.ban(1).await.unwrap();
        assert!(matches!(karaoke.join(1).await, Err(KaraokeError::Banned)));
    }

    #[tokio::test]
    async fn ban_removes_from_active_queue() {
        let karaoke = service();
        karaoke.join(1).await.unwrap();
        karaoke.join(2).await.unwrap();

        let was_active = karaoke.ban(1).await.unwrap();
        assert!(was_active);
        assert_eq!(karaoke.snapshot().await.priority, vec![2]);

        assert!(matches!(
            karaoke.ban(1).await,
            Err(KaraokeError::AlreadyBanned)
        ));
    }

    #[tokio::test]
    async fn ban_clears_the_current_singer() {
        let karaoke = service();
        karaoke.join(1).await.unwrap();
        karaoke.next().await.unwrap();

        assert!(karaoke.ban(1).await.unwrap());
        assert_eq!(karaoke.snapshot().await.current, None);
    }

    #[tokio::test]
    async fn unban_allows_rejoining() {
        let karaoke = service();
        karaoke.ban(1).await.unwrap();
        karaoke.unban(1).await.unwrap();
        assert!(karaoke.join(1).await.is_ok());

        assert!(matches!(karaoke.unban(1).await, Err(KaraokeError::NotBanned)));
    }

    #[tokio::test]
    async fn leave_and_evict() {
        let karaoke = service();
        karaoke.join(1).await.unwrap();
        karaoke.join(2).await.unwrap();

        assert!(matches!(karaoke.leave(1).await, Ok(Tier::Priority)));
        assert!(matches!(karaoke.leave(1).await, Err(KaraokeError::NotQueued)));

        karaoke.evict(2).await.unwrap();
        assert!(karaoke.snapshot().await.is_empty());
        assert!(matches!(karaoke.evict(2).await, Err(KaraokeError::NotQueued)));
    }

    #[tokio::test]
    async fn reorder_within_tier() {
        let karaoke = service();
        for id in 1..=4 {
            karaoke.join(id).await.unwrap();
        }

        karaoke.bump(3).await.unwrap();
        assert_eq!(karaoke.snapshot().await.priority, vec![3, 1, 2, 4]);

        karaoke.pull(3).await.unwrap();
        assert_eq!(karaoke.snapshot().await.priority, vec![1, 2, 4, 3]);

        karaoke.jump(4, 1).await.unwrap();
        assert_eq!(karaoke.snapshot().await.priority, vec![1, 4, 2, 3]);

        // Positions past the end clamp to the back.
        karaoke.jump(1, 99).await.unwrap();
        assert_eq!(karaoke.snapshot().await.priority, vec![4, 2, 3, 1]);

        assert!(matches!(karaoke.bump(42).await, Err(KaraokeError::NotQueued)));
    }

    #[tokio::test]
    async fn reorder_does_not_cross_tiers() {
        let karaoke = service();
        karaoke.join(1).await.unwrap();
        karaoke.next().await.unwrap();
        karaoke.join(1).await.unwrap(); // requeue
        karaoke.join(2).await.unwrap(); // priority

        karaoke.bump(1).await.unwrap();
        let snapshot = karaoke.snapshot().await;
        assert_eq!(snapshot.priority, vec![2]);
        assert_eq!(snapshot.requeue, vec![1]);
    }

    #[tokio::test]
    async fn clear_resets_session_but_keeps_bans() {
        let karaoke = service();
        karaoke.join(1).await.unwrap();
        karaoke.next().await.unwrap();
        karaoke.join(2).await.unwrap();
        karaoke.ban(3).await.unwrap();

        karaoke.clear().await;

        assert!(karaoke.snapshot().await.is_empty());
        // Sung history cleared: 1 is a first-timer again.
        assert!(matches!(karaoke.join(1).await, Ok(Tier::Priority)));
        // Bans survive the clear.
        assert!(matches!(karaoke.join(3).await, Err(KaraokeError::Banned)));
    }
}
