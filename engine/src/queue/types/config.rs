//! Auto-promotion configuration.
//!
//! Built once from raw values, validated, and replaced wholesale on every
//! runtime update so the scheduler never observes a half-applied change.

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

use crate::error::QueueError;

const TIME_FORMAT: &str = "%H:%M";
const MIN_INTERVAL_MS: u64 = 100;

fn serialize_hhmm<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.format(TIME_FORMAT).to_string())
}

fn serialize_tz<S: Serializer>(tz: &Tz, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(tz.name())
}

fn parse_hhmm(field: &str, value: &str) -> Result<NaiveTime, QueueError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|_| {
        QueueError::InvalidInput(format!("{field} must be HH:MM (24h), got '{value}'"))
    })
}

fn parse_tz(value: &str) -> Result<Tz, QueueError> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|_| QueueError::InvalidInput(format!("unknown timezone '{value}'")))
}

// ============== Business Hours ==============

/// Daily admission window `[start, end)` in a fixed timezone.
///
/// A window with `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHours {
    pub enabled: bool,
    #[serde(serialize_with = "serialize_hhmm")]
    #[schema(value_type = String, example = "09:00")]
    pub start: NaiveTime,
    #[serde(serialize_with = "serialize_hhmm")]
    #[schema(value_type = String, example = "17:00")]
    pub end: NaiveTime,
    #[serde(serialize_with = "serialize_tz")]
    #[schema(value_type = String, example = "Asia/Bangkok")]
    pub timezone: Tz,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            timezone: chrono_tz::Asia::Bangkok,
        }
    }
}

impl BusinessHours {
    pub fn parse(enabled: bool, start: &str, end: &str, timezone: &str) -> Result<Self, QueueError> {
        let hours = Self {
            enabled,
            start: parse_hhmm("businessHours.start", start)?,
            end: parse_hhmm("businessHours.end", end)?,
            timezone: parse_tz(timezone)?,
        };
        hours.validate()?;
        Ok(hours)
    }

    fn validate(&self) -> Result<(), QueueError> {
        if self.start == self.end {
            return Err(QueueError::InvalidInput(
                "businessHours.start and businessHours.end must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `now` falls inside the window. Always true when disabled.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return true;
        }
        let local = now.with_timezone(&self.timezone).time();
        // Compare at minute precision, matching the HH:MM configuration.
        let local = NaiveTime::from_hms_opt(local.hour(), local.minute(), 0).unwrap_or(local);

        if self.start < self.end {
            local >= self.start && local < self.end
        } else {
            local >= self.start || local < self.end
        }
    }
}

// ============== Auto-Promotion Config ==============

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoPromotionConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    pub batch_size: usize,
    pub max_concurrent_admitted: usize,
    pub business_hours: BusinessHours,
}

impl Default for AutoPromotionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 30_000,
            batch_size: 5,
            max_concurrent_admitted: 20,
            business_hours: BusinessHours::default(),
        }
    }
}

impl AutoPromotionConfig {
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.interval_ms < MIN_INTERVAL_MS {
            return Err(QueueError::InvalidInput(format!(
                "intervalMs must be at least {MIN_INTERVAL_MS}"
            )));
        }
        if self.batch_size == 0 {
            return Err(QueueError::InvalidInput(
                "batchSize must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_admitted == 0 {
            return Err(QueueError::InvalidInput(
                "maxConcurrentAdmitted must be at least 1".to_string(),
            ));
        }
        self.business_hours.validate()
    }

    /// Produce a new validated config with `patch` applied on top of `self`.
    pub fn apply(&self, patch: &AutoPromotionConfigPatch) -> Result<Self, QueueError> {
        let mut next = *self;
        if let Some(enabled) = patch.enabled {
            next.enabled = enabled;
        }
        if let Some(interval_ms) = patch.interval_ms {
            next.interval_ms = interval_ms;
        }
        if let Some(batch_size) = patch.batch_size {
            next.batch_size = batch_size;
        }
        if let Some(max) = patch.max_concurrent_admitted {
            next.max_concurrent_admitted = max;
        }
        if let Some(ref bh) = patch.business_hours {
            if let Some(enabled) = bh.enabled {
                next.business_hours.enabled = enabled;
            }
            if let Some(ref start) = bh.start {
                next.business_hours.start = parse_hhmm("businessHours.start", start)?;
            }
            if let Some(ref end) = bh.end {
                next.business_hours.end = parse_hhmm("businessHours.end", end)?;
            }
            if let Some(ref tz) = bh.timezone {
                next.business_hours.timezone = parse_tz(tz)?;
            }
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial update for [`AutoPromotionConfig`]. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoPromotionConfigPatch {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub max_concurrent_admitted: Option<usize>,
    #[serde(default)]
    pub business_hours: Option<BusinessHoursPatch>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHoursPatch {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_disabled_window_is_always_open() {
        let hours = BusinessHours::default();
        assert!(hours.contains(utc(3, 0)));
        assert!(hours.contains(utc(23, 59)));
    }

    #[test]
    fn test_window_uses_configured_timezone() {
        // 09:00-17:00 Bangkok (UTC+7) is 02:00-10:00 UTC.
        let hours = BusinessHours::parse(true, "09:00", "17:00", "Asia/Bangkok").unwrap();
        assert!(!hours.contains(utc(1, 59)));
        assert!(hours.contains(utc(2, 0)));
        assert!(hours.contains(utc(9, 59)));
        assert!(!hours.contains(utc(10, 0)));
    }

    #[test]
    fn test_overnight_window_wraps() {
        let hours = BusinessHours::parse(true, "22:00", "02:00", "UTC").unwrap();
        assert!(hours.contains(utc(23, 30)));
        assert!(hours.contains(utc(1, 0)));
        assert!(!hours.contains(utc(2, 0)));
        assert!(!hours.contains(utc(12, 0)));
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(BusinessHours::parse(true, "9am", "17:00", "UTC").is_err());
        assert!(BusinessHours::parse(true, "09:00", "17:00", "Mars/Olympus").is_err());
        assert!(BusinessHours::parse(true, "09:00", "09:00", "UTC").is_err());
    }

    #[test]
    fn test_apply_patch_validates() {
        let config = AutoPromotionConfig::default();

        let patched = config
            .apply(&AutoPromotionConfigPatch {
                batch_size: Some(2),
                business_hours: Some(BusinessHoursPatch {
                    enabled: Some(true),
                    timezone: Some("Europe/Rome".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(patched.batch_size, 2);
        assert!(patched.business_hours.enabled);
        assert_eq!(patched.business_hours.timezone, chrono_tz::Europe::Rome);
        assert_eq!(patched.interval_ms, config.interval_ms);

        let err = config
            .apply(&AutoPromotionConfigPatch {
                batch_size: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, QueueError::InvalidInput(_)));
    }

    #[test]
    fn test_config_serializes_hhmm() {
        let json = serde_json::to_value(AutoPromotionConfig::default()).unwrap();
        assert_eq!(json["businessHours"]["start"], "09:00");
        assert_eq!(json["businessHours"]["timezone"], "Asia/Bangkok");
        assert_eq!(json["maxConcurrentAdmitted"], 20);
    }
}
