//! Per-client request rate limiting.

use std::fmt;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use utoipa::ToSchema;

// ============== Scope ==============

/// Which endpoint family a request counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RateScope {
    /// Queue mutations (join). Strict ceiling.
    Join,
    /// Read-only polling (status). Permissive ceiling.
    Status,
}

impl RateScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateScope::Join => "join",
            RateScope::Status => "status",
        }
    }
}

impl fmt::Display for RateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============== Policy ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub join: RateLimitPolicy,
    pub status: RateLimitPolicy,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            join: RateLimitPolicy {
                max_requests: 10,
                window_ms: 60_000,
            },
            status: RateLimitPolicy {
                max_requests: 60,
                window_ms: 60_000,
            },
        }
    }
}

impl RateLimitSettings {
    #[inline]
    pub fn policy(&self, scope: RateScope) -> RateLimitPolicy {
        match scope {
            RateScope::Join => self.join,
            RateScope::Status => self.status,
        }
    }
}

// ============== Rate Limiter ==============
// Fixed window counter. A burst straddling a window boundary can pass up to
// 2x the nominal rate.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    pub count: u32,
    pub reset_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub reset_at: u64,
    pub remaining: u32,
}

pub struct RateLimiter {
    settings: RateLimitSettings,
    windows: DashMap<String, RateLimitWindow, FxBuildHasher>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            windows: DashMap::with_capacity_and_hasher(1024, FxBuildHasher),
        }
    }

    #[inline]
    pub fn settings(&self) -> RateLimitSettings {
        self.settings
    }

    #[inline]
    fn window_key(key: &str, scope: RateScope) -> String {
        format!("{}:{}", scope.as_str(), key)
    }

    /// Count one request for `key` in `scope` at time `now`.
    pub fn check(&self, key: &str, scope: RateScope, now: u64) -> RateLimitDecision {
        let policy = self.settings.policy(scope);
        let mut window = self
            .windows
            .entry(Self::window_key(key, scope))
            .or_insert(RateLimitWindow {
                count: 0,
                reset_at: 0,
            });

        if window.count == 0 || now >= window.reset_at {
            window.count = 1;
            window.reset_at = now.saturating_add(policy.window_ms);
        } else {
            window.count = window.count.saturating_add(1);
        }

        RateLimitDecision {
            allowed: window.count <= policy.max_requests,
            reset_at: window.reset_at,
            remaining: policy.max_requests.saturating_sub(window.count),
        }
    }

    /// Remove windows that have already expired. Returns how many were dropped.
    pub fn sweep(&self, now: u64) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| now < w.reset_at);
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            self.windows.shrink_to_fit();
        }
        removed
    }

    #[inline]
    pub fn tracked_windows(&self) -> usize {
        self.windows.len()
    }

    pub fn clear(&self) {
        self.windows.clear();
        self.windows.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, window_ms: u64) -> RateLimiter {
        let policy = RateLimitPolicy {
            max_requests: max,
            window_ms,
        };
        RateLimiter::new(RateLimitSettings {
            join: policy,
            status: RateLimitPolicy {
                max_requests: max * 6,
                window_ms,
            },
        })
    }

    #[test]
    fn test_window_allows_ceiling_then_rejects() {
        let rl = limiter(3, 1_000);
        for i in 0..3 {
            let d = rl.check("client", RateScope::Join, 10_000 + i);
            assert!(d.allowed, "request {} should pass", i + 1);
        }
        let d = rl.check("client", RateScope::Join, 10_500);
        assert!(!d.allowed);
        assert_eq!(d.reset_at, 11_000);
        assert_eq!(d.remaining, 0);
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let rl = limiter(2, 1_000);
        rl.check("client", RateScope::Join, 0);
        rl.check("client", RateScope::Join, 1);
        assert!(!rl.check("client", RateScope::Join, 2).allowed);

        let d = rl.check("client", RateScope::Join, 1_000);
        assert!(d.allowed);
        assert_eq!(d.reset_at, 2_000);
        // Count restarted at 1, so exactly one more request fits.
        assert_eq!(d.remaining, 1);
    }

    #[test]
    fn test_huge_window_saturates() {
        let rl = limiter(1, u64::MAX);
        let d = rl.check("client", RateScope::Join, 1_700_000_000_000);
        assert!(d.allowed);
        assert_eq!(d.reset_at, u64::MAX);
        assert!(!rl.check("client", RateScope::Join, 1_700_000_000_001).allowed);
    }

    #[test]
    fn test_scopes_are_independent() {
        let rl = limiter(1, 60_000);
        assert!(rl.check("client", RateScope::Join, 0).allowed);
        assert!(!rl.check("client", RateScope::Join, 1).allowed);

        for i in 0..6 {
            assert!(rl.check("client", RateScope::Status, i).allowed);
        }
        assert!(!rl.check("client", RateScope::Status, 10).allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let rl = limiter(1, 60_000);
        assert!(rl.check("a", RateScope::Join, 0).allowed);
        assert!(rl.check("b", RateScope::Join, 0).allowed);
        assert!(!rl.check("a", RateScope::Join, 0).allowed);
    }

    #[test]
    fn test_sweep_drops_expired_windows() {
        let rl = limiter(5, 1_000);
        rl.check("a", RateScope::Join, 0);
        rl.check("b", RateScope::Join, 500);
        assert_eq!(rl.tracked_windows(), 2);

        assert_eq!(rl.sweep(1_000), 1);
        assert_eq!(rl.tracked_windows(), 1);
        assert_eq!(rl.sweep(1_500), 1);
        assert_eq!(rl.tracked_windows(), 0);
    }
}
