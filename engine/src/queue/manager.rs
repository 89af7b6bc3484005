//! Core QueueManager struct and constructors.
//!
//! The manager is the composition root: it owns the primary store, the
//! fallback store, the rate limiter, one resilience wrapper per guarded
//! operation and the auto-promotion scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use super::backend::{MockBackend, QueueBackend};
use super::background::AutoPromotionScheduler;
use super::captcha::CaptchaVerifier;
use super::fallback::FallbackQueueStore;
use super::resilience::ResilienceWrapper;
use super::settings::QueueConfig;
use super::types::{now_ms, FxHashSet, QueueMetrics, QueueStore, RateLimiter, RateScope};
use crate::error::QueueError;

/// Constant-time byte slice comparison to prevent timing attacks.
#[inline]
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

pub struct QueueManager {
    pub(crate) config: QueueConfig,
    pub(crate) store: Arc<RwLock<QueueStore>>,
    pub(crate) fallback: FallbackQueueStore,
    pub(crate) rate_limiter: RateLimiter,
    pub(crate) join_guard: ResilienceWrapper,
    pub(crate) status_guard: ResilienceWrapper,
    pub(crate) scheduler: Arc<AutoPromotionScheduler>,
    pub(crate) backend: Arc<dyn QueueBackend>,
    pub(crate) captcha: Option<Arc<dyn CaptchaVerifier>>,
    pub(crate) metrics: QueueMetrics,
    pub(crate) admin_tokens: RwLock<FxHashSet<String>>,
    pub(crate) shutdown_flag: AtomicBool,
    pub(crate) shutdown_notify: Notify,
}

impl QueueManager {
    /// Create a manager with the in-process mock backend and no CAPTCHA.
    pub fn new(config: QueueConfig) -> Arc<Self> {
        Self::with_components(config, Arc::new(MockBackend::default()), None)
    }

    /// Create a manager with explicit collaborators.
    pub fn with_components(
        config: QueueConfig,
        backend: Arc<dyn QueueBackend>,
        captcha: Option<Arc<dyn CaptchaVerifier>>,
    ) -> Arc<Self> {
        let store = Arc::new(RwLock::new(QueueStore::new(config.max_queue_size)));
        let scheduler = AutoPromotionScheduler::new(Arc::clone(&store), config.auto_promotion);
        let admin_tokens = config.admin_tokens.iter().cloned().collect();

        let manager = Arc::new(Self {
            fallback: FallbackQueueStore::new(config.max_queue_size),
            rate_limiter: RateLimiter::new(config.rate_limits),
            join_guard: ResilienceWrapper::new("join", config.join_breaker, config.retry),
            status_guard: ResilienceWrapper::new("status", config.status_breaker, config.retry),
            store,
            scheduler,
            backend,
            captcha,
            metrics: QueueMetrics::new(),
            admin_tokens: RwLock::new(admin_tokens),
            shutdown_flag: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
            config,
        });

        let mgr = Arc::clone(&manager);
        tokio::spawn(async move {
            mgr.background_tasks().await;
        });

        info!(
            backend = manager.backend.name(),
            max_queue_size = manager.config.max_queue_size,
            captcha = manager.captcha.is_some(),
            "Queue manager initialized"
        );
        manager
    }

    #[inline]
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    #[inline]
    pub fn scheduler(&self) -> &Arc<AutoPromotionScheduler> {
        &self.scheduler
    }

    #[inline]
    pub fn fallback(&self) -> &FallbackQueueStore {
        &self.fallback
    }

    pub fn has_admin_tokens(&self) -> bool {
        !self.admin_tokens.read().is_empty()
    }

    /// Verify an admin token using constant-time comparison.
    /// Any token is accepted when none are configured.
    #[inline]
    pub fn verify_token(&self, token: &str) -> bool {
        let tokens = self.admin_tokens.read();
        if tokens.is_empty() {
            return true;
        }
        let mut found = false;
        for valid_token in tokens.iter() {
            found |= constant_time_eq(token.as_bytes(), valid_token.as_bytes());
        }
        found
    }

    /// Count one request against `scope` for `client_id`.
    pub(crate) fn check_rate_limit(&self, client_id: &str, scope: RateScope) -> Result<(), QueueError> {
        let decision = self.rate_limiter.check(client_id, scope, now_ms());
        if decision.allowed {
            return Ok(());
        }
        self.metrics.record_rate_limited();
        warn!(
            client_id,
            scope = %scope,
            reset_at = decision.reset_at,
            "Rate limit exceeded"
        );
        Err(QueueError::RateLimitExceeded {
            scope,
            reset_at: decision.reset_at,
        })
    }

    /// Ask the CAPTCHA verifier for an opinion. Never fails the request.
    pub(crate) async fn verify_captcha(&self, token: Option<&str>, client_ip: Option<&str>) {
        let (Some(verifier), Some(token)) = (self.captcha.as_ref(), token) else {
            return;
        };
        match verifier.verify(token, client_ip).await {
            Ok(score) if score.passed => {
                debug!(score = ?score.score, "CAPTCHA verification passed");
            }
            Ok(score) => {
                warn!(score = ?score.score, "CAPTCHA verification failed, proceeding");
            }
            Err(e) => {
                warn!(error = %e, "CAPTCHA verification error, proceeding");
            }
        }
    }

    pub fn shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
        self.shutdown_notify.notify_one();
        self.scheduler.stop();
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }
}
