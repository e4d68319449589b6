// Owned deadline sets. A controller schedules keyed deadlines and drains them on tick.
// Dropping or clearing the set cancels everything it owns, so a timer can never
// outlive the phase or flag state that scheduled it.

use crate::types::Timestamp;

/// Handle returned by [`Timers::schedule`], used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Pending<K> {
    handle: TimerHandle,
    due: Timestamp,
    key: K,
}

/// A set of pending deadlines carrying a payload `K`.
#[derive(Debug, Clone)]
pub struct Timers<K> {
    pending: Vec<Pending<K>>,
    next_id: u64,
}

impl<K> Timers<K> {
    pub fn new() -> Self {
        Timers {
            pending: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedule `key` to fire at `due`.
    pub fn schedule(&mut self, due: Timestamp, key: K) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending { handle, due, key });
        handle
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("cancelling {} pending timers", self.pending.len());
        }
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Earliest pending deadline.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.pending.iter().map(|p| p.due).min()
    }

    /// Remove and return every key due at or before `now`, in deadline order.
    /// Ties keep scheduling order.
    pub fn drain_due(&mut self, now: Timestamp) -> Vec<(Timestamp, K)> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due <= now {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| (p.due, p.handle.0));
        due.into_iter().map(|p| (p.due, p.key)).collect()
    }
}

impl<K: PartialEq> Timers<K> {
    pub fn contains(&self, key: &K) -> bool {
        self.pending.iter().any(|p| &p.key == key)
    }
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Self::new()
    }
}
