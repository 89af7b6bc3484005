//! Secondary waiting list used while the primary path is degraded.
//!
//! Holds FIFO entries only. Nobody is admitted from here; clients are moved
//! back into the primary store when an operator leaves fallback mode.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{info, warn};

use super::types::{now_ms, EnqueueOutcome, FxHashSet, WaitingEntry};

#[derive(Default)]
struct FallbackInner {
    waiting: VecDeque<WaitingEntry>,
    ids: FxHashSet<String>,
}

pub struct FallbackQueueStore {
    active: AtomicBool,
    inner: Mutex<FallbackInner>,
    capacity: usize,
}

impl FallbackQueueStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            active: AtomicBool::new(false),
            inner: Mutex::new(FallbackInner::default()),
            capacity,
        }
    }

    /// Switch into fallback mode. Returns true if the mode changed.
    pub fn enable_fallback(&self) -> bool {
        let changed = !self.active.swap(true, Ordering::AcqRel);
        if changed {
            warn!("Fallback queue mode enabled");
        }
        changed
    }

    /// Leave fallback mode. Returns true if the mode changed.
    pub fn disable_fallback(&self) -> bool {
        let changed = self.active.swap(false, Ordering::AcqRel);
        if changed {
            info!("Fallback queue mode disabled");
        }
        changed
    }

    #[inline]
    pub fn is_in_fallback_mode(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn enqueue(&self, client_id: &str) -> EnqueueOutcome {
        let mut inner = self.inner.lock();
        if inner.ids.contains(client_id) {
            let position = inner
                .waiting
                .iter()
                .position(|e| e.client_id == client_id)
                .map_or(inner.waiting.len(), |idx| idx + 1);
            return EnqueueOutcome::AlreadyWaiting { position };
        }
        if inner.waiting.len() >= self.capacity {
            return EnqueueOutcome::Full;
        }
        inner
            .waiting
            .push_back(WaitingEntry::new(client_id.to_string(), now_ms()));
        inner.ids.insert(client_id.to_string());
        EnqueueOutcome::Enqueued {
            position: inner.waiting.len(),
        }
    }

    /// 1-based position, if the client is waiting here.
    pub fn position_of(&self, client_id: &str) -> Option<usize> {
        let inner = self.inner.lock();
        if !inner.ids.contains(client_id) {
            return None;
        }
        inner
            .waiting
            .iter()
            .position(|e| e.client_id == client_id)
            .map(|idx| idx + 1)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.inner.lock().waiting.len()
    }

    pub fn remove(&self, client_id: &str) -> bool {
        let mut inner = self.inner.lock();
        if !inner.ids.remove(client_id) {
            return false;
        }
        inner.waiting.retain(|e| e.client_id != client_id);
        true
    }

    /// The fallback store never admits anyone.
    #[inline]
    pub fn is_user_allowed(&self, _client_id: &str) -> bool {
        false
    }

    /// Take every entry out, in FIFO order.
    pub fn drain(&self) -> Vec<WaitingEntry> {
        let mut inner = self.inner.lock();
        inner.ids.clear();
        std::mem::take(&mut inner.waiting).into()
    }

    /// Clear all entries and leave fallback mode.
    pub fn reset(&self) {
        *self.inner.lock() = FallbackInner::default();
        self.active.store(false, Ordering::Release);
    }
}
