//! Primary waiting list and admitted set.
//!
//! Strict FIFO: entries are only ever appended at the back and promoted from
//! the front, so the earliest joiner is always the next one admitted.

use std::collections::VecDeque;

use serde::Serialize;
use utoipa::ToSchema;

use super::time::{now_ms, FxHashSet};

/// A client waiting for admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaitingEntry {
    pub client_id: String,
    pub joined_at: u64,
}

impl WaitingEntry {
    pub fn new(client_id: String, joined_at: u64) -> Self {
        Self {
            client_id,
            joined_at,
        }
    }
}

/// Result of [`QueueStore::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Newly appended at the given 1-based position.
    Enqueued { position: usize },
    /// Already waiting; nothing changed.
    AlreadyWaiting { position: usize },
    /// Already admitted; nothing changed.
    Admitted,
    /// Waiting list is at capacity; nothing changed.
    Full,
}

impl EnqueueOutcome {
    /// True only when a new entry was appended.
    #[inline]
    pub fn is_enqueued(&self) -> bool {
        matches!(self, EnqueueOutcome::Enqueued { .. })
    }
}

/// Result of a batch promotion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromotionResult {
    pub promoted: Vec<String>,
    pub remaining: usize,
}

/// Point-in-time queue statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total_waiting: usize,
    pub total_admitted: usize,
    pub oldest_joined_at: Option<u64>,
}

/// What [`QueueStore::remove`] found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub was_waiting: bool,
    pub was_admitted: bool,
}

pub struct QueueStore {
    waiting: VecDeque<WaitingEntry>,
    waiting_ids: FxHashSet<String>,
    admitted: FxHashSet<String>,
    capacity: usize,
}

impl QueueStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            waiting: VecDeque::with_capacity(capacity.min(1024)),
            waiting_ids: FxHashSet::default(),
            admitted: FxHashSet::default(),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a client to the back of the waiting list.
    pub fn enqueue(&mut self, client_id: &str) -> EnqueueOutcome {
        self.enqueue_at(client_id, now_ms())
    }

    pub fn enqueue_at(&mut self, client_id: &str, joined_at: u64) -> EnqueueOutcome {
        if self.admitted.contains(client_id) {
            return EnqueueOutcome::Admitted;
        }
        if self.waiting_ids.contains(client_id) {
            // Membership set and list are kept in lockstep.
            let position = self.position_of(client_id).unwrap_or(self.waiting.len());
            return EnqueueOutcome::AlreadyWaiting { position };
        }
        if self.waiting.len() >= self.capacity {
            return EnqueueOutcome::Full;
        }

        self.waiting
            .push_back(WaitingEntry::new(client_id.to_string(), joined_at));
        self.waiting_ids.insert(client_id.to_string());
        EnqueueOutcome::Enqueued {
            position: self.waiting.len(),
        }
    }

    /// 1-based position in the waiting list.
    pub fn position_of(&self, client_id: &str) -> Option<usize> {
        if !self.waiting_ids.contains(client_id) {
            return None;
        }
        self.waiting
            .iter()
            .position(|e| e.client_id == client_id)
            .map(|idx| idx + 1)
    }

    #[inline]
    pub fn is_admitted(&self, client_id: &str) -> bool {
        self.admitted.contains(client_id)
    }

    #[inline]
    pub fn is_waiting(&self, client_id: &str) -> bool {
        self.waiting_ids.contains(client_id)
    }

    #[inline]
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    #[inline]
    pub fn admitted_len(&self) -> usize {
        self.admitted.len()
    }

    /// Promote up to `n` clients from the front of the waiting list.
    pub fn promote_batch(&mut self, n: usize) -> PromotionResult {
        let take = n.min(self.waiting.len());
        let mut promoted = Vec::with_capacity(take);

        for entry in self.waiting.drain(..take) {
            self.waiting_ids.remove(&entry.client_id);
            self.admitted.insert(entry.client_id.clone());
            promoted.push(entry.client_id);
        }

        PromotionResult {
            promoted,
            remaining: self.waiting.len(),
        }
    }

    /// Admit a client directly, bypassing the waiting list.
    pub fn admit(&mut self, client_id: &str) {
        if self.waiting_ids.remove(client_id) {
            self.waiting.retain(|e| e.client_id != client_id);
        }
        self.admitted.insert(client_id.to_string());
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            total_waiting: self.waiting.len(),
            total_admitted: self.admitted.len(),
            oldest_joined_at: self.waiting.front().map(|e| e.joined_at),
        }
    }

    /// Remove a client from both the waiting list and the admitted set.
    pub fn remove(&mut self, client_id: &str) -> RemoveOutcome {
        let was_waiting = self.waiting_ids.remove(client_id);
        if was_waiting {
            self.waiting.retain(|e| e.client_id != client_id);
        }
        let was_admitted = self.admitted.remove(client_id);
        RemoveOutcome {
            was_waiting,
            was_admitted,
        }
    }

    /// Drop all waiting and admitted clients, releasing memory.
    pub fn reset(&mut self) {
        self.waiting = VecDeque::new();
        self.waiting_ids = FxHashSet::default();
        self.admitted = FxHashSet::default();
    }
}
