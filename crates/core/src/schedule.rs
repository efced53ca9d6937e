//! Schedule configuration, interval math, and next-run calculation.

use chrono::{Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------------------

/// Scheduled backup frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Return the frequency name as persisted in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Parse a frequency string, returning an error for unknown values.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(CoreError::Parse(format!("Unknown frequency: '{other}'"))),
        }
    }

    /// Fixed interval between scheduled runs.
    ///
    /// "Monthly" is a fixed 30-day duration, not calendar-month arithmetic;
    /// a monthly backup drifts relative to calendar months over time. This
    /// approximation is intentional and load-bearing for retention math.
    pub fn interval(&self) -> Duration {
        match self {
            Self::Daily => Duration::hours(24),
            Self::Weekly => Duration::days(7),
            Self::Monthly => Duration::days(30),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ScheduleConfig
// ---------------------------------------------------------------------------

/// Persisted scheduler configuration.
///
/// A single object stored under the `backup_schedule` settings key,
/// replaced wholesale on update and re-read before every scheduled tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub frequency: Frequency,
    /// Wall-clock trigger time, `"HH:MM"` (24-hour, UTC).
    pub time: String,
    /// Automatic backups older than this many days are deleted.
    pub retention_days: i64,
    /// At most this many automatic backups are kept, newest first.
    pub max_backups: i64,
    pub include_ai_tools: bool,
    pub include_templates: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: Frequency::Daily,
            time: "02:00".to_string(),
            retention_days: 30,
            max_backups: 10,
            include_ai_tools: true,
            include_templates: true,
        }
    }
}

impl ScheduleConfig {
    /// Validate the configuration, rejecting unusable values.
    pub fn validate(&self) -> Result<(), CoreError> {
        parse_time(&self.time)?;
        if self.retention_days < 1 {
            return Err(CoreError::Validation(
                "retentionDays must be at least 1".to_string(),
            ));
        }
        if self.max_backups < 1 {
            return Err(CoreError::Validation(
                "maxBackups must be at least 1".to_string(),
            ));
        }
        if !self.include_ai_tools && !self.include_templates {
            return Err(CoreError::Validation(
                "at least one of includeAiTools/includeTemplates must be set".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Time helpers
// ---------------------------------------------------------------------------

/// Parse a `"HH:MM"` 24-hour time string.
pub fn parse_time(s: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| CoreError::Parse(format!("Invalid time '{s}', expected HH:MM")))
}

/// Compute the next wall-clock trigger from `time` + `frequency`.
///
/// Takes today's slot at the configured time; if that slot has already
/// passed relative to `now`, rolls forward by one full period.
pub fn next_backup_time(config: &ScheduleConfig, now: Timestamp) -> Result<Timestamp, CoreError> {
    let time = parse_time(&config.time)?;
    let today_slot = Utc
        .from_utc_datetime(&now.date_naive().and_time(time));
    if today_slot > now {
        Ok(today_slot)
    } else {
        Ok(today_slot + config.frequency.interval())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    // -- Frequency ------------------------------------------------------------

    #[test]
    fn frequency_round_trip() {
        for s in ["daily", "weekly", "monthly"] {
            assert_eq!(Frequency::from_str(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn unknown_frequency_rejected() {
        assert!(Frequency::from_str("hourly").is_err());
    }

    #[test]
    fn intervals_are_fixed_durations() {
        assert_eq!(Frequency::Daily.interval(), Duration::hours(24));
        assert_eq!(Frequency::Weekly.interval(), Duration::days(7));
        assert_eq!(Frequency::Monthly.interval(), Duration::days(30));
    }

    // -- Config validation ----------------------------------------------------

    #[test]
    fn default_config_is_valid_but_disabled() {
        let config = ScheduleConfig::default();
        assert!(!config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_time_rejected() {
        let config = ScheduleConfig {
            time: "25:99".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retention_rejected() {
        let config = ScheduleConfig {
            retention_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_backups_rejected() {
        let config = ScheduleConfig {
            max_backups: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nothing_included_rejected() {
        let config = ScheduleConfig {
            include_ai_tools: false,
            include_templates: false,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    // -- next_backup_time -----------------------------------------------------

    #[test]
    fn slot_later_today() {
        let config = ScheduleConfig {
            time: "23:00".to_string(),
            ..Default::default()
        };
        let next = next_backup_time(&config, at(10, 0)).unwrap();
        assert_eq!(next, at(23, 0));
    }

    #[test]
    fn passed_slot_rolls_forward_one_day() {
        let config = ScheduleConfig {
            time: "02:00".to_string(),
            ..Default::default()
        };
        let next = next_backup_time(&config, at(10, 0)).unwrap();
        assert_eq!(next, at(2, 0) + Duration::hours(24));
    }

    #[test]
    fn passed_slot_rolls_forward_one_week() {
        let config = ScheduleConfig {
            frequency: Frequency::Weekly,
            time: "02:00".to_string(),
            ..Default::default()
        };
        let next = next_backup_time(&config, at(10, 0)).unwrap();
        assert_eq!(next, at(2, 0) + Duration::days(7));
    }

    #[test]
    fn exact_slot_counts_as_passed() {
        let config = ScheduleConfig {
            time: "10:00".to_string(),
            ..Default::default()
        };
        let next = next_backup_time(&config, at(10, 0)).unwrap();
        assert_eq!(next, at(10, 0) + Duration::hours(24));
    }

    #[test]
    fn config_serializes_camel_case() {
        let text = serde_json::to_string(&ScheduleConfig::default()).unwrap();
        assert!(text.contains("\"retentionDays\""));
        assert!(text.contains("\"includeAiTools\""));
        assert!(text.contains("\"maxBackups\""));
    }
}
