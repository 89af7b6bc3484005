//! Time utilities and hash type aliases.
//!
//! - FxHash: fast non-cryptographic hashing for client id keyed sets
//! - Millisecond wall-clock timestamps shared by every queue component

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use rustc_hash::FxBuildHasher;

// ============== FxHash Type Aliases ==============

pub type FxHashSet<T> = HashSet<T, FxBuildHasher>;

// ============== Timestamps ==============

/// Current wall-clock time in milliseconds since the Unix epoch.
#[inline(always)]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

