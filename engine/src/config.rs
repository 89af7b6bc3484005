//! Process configuration read from environment variables.

use std::str::FromStr;

use thiserror::Error;

use crate::queue::resilience::RetryPolicy;
use crate::queue::types::{BusinessHours, RateLimitPolicy};
use crate::queue::QueueConfig;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CAPTCHA_THRESHOLD: f64 = 0.5;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var}: cannot parse '{value}'")]
    Parse { var: &'static str, value: String },

    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct CaptchaSettings {
    pub secret: String,
    pub threshold: f64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_allow_origin: Option<String>,
    pub log_format: LogFormat,
    pub backend_failure_rate: f64,
    pub captcha: Option<CaptchaSettings>,
    pub queue: QueueConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_allow_origin: None,
            log_format: LogFormat::Pretty,
            backend_failure_rate: 0.0,
            captcha: None,
            queue: QueueConfig::default(),
        }
    }
}

/// Typed access to a variable source with defaults.
struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn raw(&self, var: &str) -> Option<String> {
        (self.lookup)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, var: &'static str, default: T) -> Result<T, ConfigError> {
        match self.raw(var) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| ConfigError::Parse { var, value }),
        }
    }

    fn flag(&self, var: &'static str, default: bool) -> bool {
        self.raw(var)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    fn string(&self, var: &'static str, default: &str) -> String {
        self.raw(var).unwrap_or_else(|| default.to_string())
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Unset or empty variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };
        let defaults = QueueConfig::default();

        let window_ms = vars.parse("RATE_LIMIT_WINDOW_MS", defaults.rate_limits.join.window_ms)?;
        let mut queue = QueueConfig {
            max_queue_size: vars.parse("MAX_QUEUE_SIZE", defaults.max_queue_size)?,
            auto_approve_threshold: vars
                .parse("AUTO_APPROVE_THRESHOLD", defaults.auto_approve_threshold)?,
            ..defaults.clone()
        };
        queue.rate_limits.join = RateLimitPolicy {
            max_requests: vars.parse("RATE_LIMIT_JOIN_MAX", defaults.rate_limits.join.max_requests)?,
            window_ms,
        };
        queue.rate_limits.status = RateLimitPolicy {
            max_requests: vars
                .parse("RATE_LIMIT_STATUS_MAX", defaults.rate_limits.status.max_requests)?,
            window_ms,
        };
        if window_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "RATE_LIMIT_WINDOW_MS",
                reason: "must be at least 1".to_string(),
            });
        }
        for (var, policy) in [
            ("RATE_LIMIT_JOIN_MAX", queue.rate_limits.join),
            ("RATE_LIMIT_STATUS_MAX", queue.rate_limits.status),
        ] {
            if policy.max_requests == 0 {
                return Err(ConfigError::Invalid {
                    var,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        queue.retry = RetryPolicy {
            max_attempts: vars.parse("RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts)?,
            base_delay_ms: vars.parse("RETRY_BASE_DELAY_MS", defaults.retry.base_delay_ms)?,
            max_delay_ms: vars.parse("RETRY_MAX_DELAY_MS", defaults.retry.max_delay_ms)?,
            jitter_ms: vars.parse("RETRY_JITTER_MS", defaults.retry.jitter_ms)?,
        };
        let threshold = vars.parse(
            "CIRCUIT_FAILURE_THRESHOLD",
            defaults.join_breaker.failure_threshold,
        )?;
        queue.join_breaker.failure_threshold = threshold;
        queue.status_breaker.failure_threshold = threshold;
        queue.join_breaker.cooldown_ms =
            vars.parse("JOIN_CIRCUIT_COOLDOWN_MS", defaults.join_breaker.cooldown_ms)?;
        queue.status_breaker.cooldown_ms =
            vars.parse("STATUS_CIRCUIT_COOLDOWN_MS", defaults.status_breaker.cooldown_ms)?;

        let auto = &mut queue.auto_promotion;
        auto.enabled = vars.flag("AUTO_QUEUE_ENABLED", auto.enabled);
        auto.interval_ms = vars.parse("AUTO_QUEUE_INTERVAL_MS", auto.interval_ms)?;
        auto.batch_size = vars.parse("AUTO_QUEUE_BATCH_SIZE", auto.batch_size)?;
        auto.max_concurrent_admitted =
            vars.parse("AUTO_QUEUE_MAX_CONCURRENT", auto.max_concurrent_admitted)?;

        let bh_defaults = BusinessHours::default();
        auto.business_hours = BusinessHours::parse(
            vars.flag("BUSINESS_HOURS_ENABLED", bh_defaults.enabled),
            &vars.string("BUSINESS_HOURS_START", "09:00"),
            &vars.string("BUSINESS_HOURS_END", "17:00"),
            &vars.string("BUSINESS_HOURS_TZ", bh_defaults.timezone.name()),
        )
        .map_err(|e| ConfigError::Invalid {
            var: "BUSINESS_HOURS_*",
            reason: e.to_string(),
        })?;
        auto.validate().map_err(|e| ConfigError::Invalid {
            var: "AUTO_QUEUE_*",
            reason: e.to_string(),
        })?;

        queue.admin_tokens = vars
            .string("ADMIN_TOKENS", "")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if queue.max_queue_size == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_QUEUE_SIZE",
                reason: "must be at least 1".to_string(),
            });
        }

        let backend_failure_rate: f64 = vars.parse("BACKEND_FAILURE_RATE", 0.0)?;
        if !(0.0..=1.0).contains(&backend_failure_rate) {
            return Err(ConfigError::Invalid {
                var: "BACKEND_FAILURE_RATE",
                reason: "must be between 0 and 1".to_string(),
            });
        }

        let captcha = if vars.flag("ENABLE_CAPTCHA", false) {
            match vars.raw("RECAPTCHA_SECRET_KEY") {
                Some(secret) => Some(CaptchaSettings {
                    secret,
                    threshold: vars.parse("CAPTCHA_THRESHOLD", DEFAULT_CAPTCHA_THRESHOLD)?,
                }),
                None => {
                    return Err(ConfigError::Invalid {
                        var: "RECAPTCHA_SECRET_KEY",
                        reason: "required when ENABLE_CAPTCHA is set".to_string(),
                    })
                }
            }
        } else {
            None
        };

        let log_format = match vars.raw("LOG_FORMAT").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            port: vars.parse("PORT", DEFAULT_PORT)?,
            cors_allow_origin: vars.raw("CORS_ALLOW_ORIGIN"),
            log_format,
            backend_failure_rate,
            captcha,
            queue,
        })
    }
}
