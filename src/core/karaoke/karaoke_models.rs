/// The two queue tiers. First-time singers wait in `Priority`; anyone who
/// already performed this session rejoins through `Requeue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Priority,
    Requeue,
}

/// Ordered view of the queue for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub current: Option<u64>,
    pub priority: Vec<u64>,
    pub requeue: Vec<u64>,
}

impl QueueSnapshot {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.priority.is_empty() && self.requeue.is_empty()
    }
}
