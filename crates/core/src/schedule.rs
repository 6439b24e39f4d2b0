//! Recurring schedule types and next-execution arithmetic.
//!
//! A schedule is described by a [`ScheduleType`] plus a [`ScheduleConfig`].
//! The repeat unit is `interval_minutes` for every schedule type; the
//! calendar fields (`time_of_day`, `day_of_month`, `days_of_week`) are
//! validated and stored but do not alter the interval arithmetic.

use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Timezone applied to rules that do not specify one.
pub const DEFAULT_TIMEZONE: &str = "Asia/Riyadh";

// ---------------------------------------------------------------------------
// ScheduleType
// ---------------------------------------------------------------------------

/// The nominal cadence of a recurring rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

impl ScheduleType {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Custom => "custom",
        }
    }

    /// Parse from a wire-format string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "custom" => Ok(Self::Custom),
            _ => Err(CoreError::Validation(format!(
                "Invalid schedule_type: '{s}'. Must be one of: daily, weekly, monthly, yearly, custom"
            ))),
        }
    }
}

impl std::fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ScheduleConfig
// ---------------------------------------------------------------------------

/// Scheduling parameters of a recurring rule.
///
/// `interval_minutes` is the authoritative repeat unit. When it is absent
/// the caller resolves it against the system-wide default via
/// [`resolve_interval`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub interval_minutes: Option<i64>,
    pub time_of_day: Option<String>,
    pub day_of_month: Option<i16>,
    pub days_of_week: Option<Vec<i16>>,
}

/// Validate a schedule config eagerly, before it is persisted.
///
/// Rules with a malformed schedule must be rejected at create/update time
/// so the scheduler never encounters one.
pub fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), CoreError> {
    if let Some(interval) = config.interval_minutes {
        if interval <= 0 {
            return Err(CoreError::InvalidSchedule(format!(
                "interval_minutes must be positive, got {interval}"
            )));
        }
    }
    if let Some(ref time) = config.time_of_day {
        NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
            CoreError::InvalidSchedule(format!("time_of_day must be 'HH:MM', got '{time}'"))
        })?;
    }
    if let Some(day) = config.day_of_month {
        if !(1..=31).contains(&day) {
            return Err(CoreError::InvalidSchedule(format!(
                "day_of_month must be in 1..=31, got {day}"
            )));
        }
    }
    if let Some(ref days) = config.days_of_week {
        for day in days {
            if !(0..=6).contains(day) {
                return Err(CoreError::InvalidSchedule(format!(
                    "days_of_week entries must be in 0..=6, got {day}"
                )));
            }
        }
    }
    Ok(())
}

/// The rule's interval, or the system-wide default when absent.
pub fn resolve_interval(config: &ScheduleConfig, default_minutes: i64) -> i64 {
    config.interval_minutes.unwrap_or(default_minutes)
}

// ---------------------------------------------------------------------------
// Next-execution arithmetic
// ---------------------------------------------------------------------------

/// Compute the next execution instant: `from + interval_minutes`.
///
/// The arithmetic is timezone-independent; the rule's timezone only affects
/// how instants are rendered (see [`crate::template`]).
pub fn compute_next_execution(
    interval_minutes: i64,
    from: Timestamp,
) -> Result<Timestamp, CoreError> {
    if interval_minutes <= 0 {
        return Err(CoreError::InvalidSchedule(format!(
            "interval_minutes must be positive, got {interval_minutes}"
        )));
    }
    Ok(from + Duration::minutes(interval_minutes))
}

// ---------------------------------------------------------------------------
// Timezone handling
// ---------------------------------------------------------------------------

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, CoreError> {
    name.parse::<Tz>()
        .map_err(|_| CoreError::InvalidSchedule(format!("Invalid timezone: '{name}'")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    // -- ScheduleType parsing -----------------------------------------------

    #[test]
    fn schedule_type_all_variants_roundtrip() {
        let pairs = [
            ("daily", ScheduleType::Daily),
            ("weekly", ScheduleType::Weekly),
            ("monthly", ScheduleType::Monthly),
            ("yearly", ScheduleType::Yearly),
            ("custom", ScheduleType::Custom),
        ];
        for (s, variant) in &pairs {
            assert_eq!(&ScheduleType::from_str(s).unwrap(), variant);
            assert_eq!(variant.as_str(), *s);
        }
    }

    #[test]
    fn schedule_type_invalid_rejects() {
        assert!(ScheduleType::from_str("hourly").is_err());
    }

    // -- compute_next_execution ---------------------------------------------

    #[test]
    fn adds_interval_minutes() {
        let from = at(2024, 1, 1, 9, 5, 0);
        let next = compute_next_execution(1, from).unwrap();
        assert_eq!(next, at(2024, 1, 1, 9, 6, 0));
    }

    #[test]
    fn interval_is_literal_minutes_regardless_of_size() {
        let from = at(2024, 1, 31, 23, 30, 0);
        let next = compute_next_execution(60, from).unwrap();
        assert_eq!(next, at(2024, 2, 1, 0, 30, 0));
    }

    #[test]
    fn zero_interval_rejects() {
        let from = at(2024, 1, 1, 0, 0, 0);
        assert!(compute_next_execution(0, from).is_err());
    }

    #[test]
    fn negative_interval_rejects() {
        let from = at(2024, 1, 1, 0, 0, 0);
        assert!(compute_next_execution(-5, from).is_err());
    }

    // -- validate_schedule_config -------------------------------------------

    #[test]
    fn empty_config_is_valid() {
        assert!(validate_schedule_config(&ScheduleConfig::default()).is_ok());
    }

    #[test]
    fn positive_interval_is_valid() {
        let config = ScheduleConfig {
            interval_minutes: Some(1440),
            ..Default::default()
        };
        assert!(validate_schedule_config(&config).is_ok());
    }

    #[test]
    fn non_positive_interval_rejects() {
        for interval in [0, -1] {
            let config = ScheduleConfig {
                interval_minutes: Some(interval),
                ..Default::default()
            };
            assert!(validate_schedule_config(&config).is_err());
        }
    }

    #[test]
    fn time_of_day_parses_hh_mm() {
        let config = ScheduleConfig {
            time_of_day: Some("09:30".to_string()),
            ..Default::default()
        };
        assert!(validate_schedule_config(&config).is_ok());
    }

    #[test]
    fn malformed_time_of_day_rejects() {
        let config = ScheduleConfig {
            time_of_day: Some("9am".to_string()),
            ..Default::default()
        };
        assert!(validate_schedule_config(&config).is_err());
    }

    #[test]
    fn day_of_month_bounds() {
        for (day, ok) in [(1, true), (31, true), (0, false), (32, false)] {
            let config = ScheduleConfig {
                day_of_month: Some(day),
                ..Default::default()
            };
            assert_eq!(validate_schedule_config(&config).is_ok(), ok);
        }
    }

    #[test]
    fn days_of_week_bounds() {
        let valid = ScheduleConfig {
            days_of_week: Some(vec![0, 3, 6]),
            ..Default::default()
        };
        assert!(validate_schedule_config(&valid).is_ok());

        let invalid = ScheduleConfig {
            days_of_week: Some(vec![0, 7]),
            ..Default::default()
        };
        assert!(validate_schedule_config(&invalid).is_err());
    }

    // -- resolve_interval ---------------------------------------------------

    #[test]
    fn resolve_interval_prefers_rule_value() {
        let config = ScheduleConfig {
            interval_minutes: Some(15),
            ..Default::default()
        };
        assert_eq!(resolve_interval(&config, 60), 15);
    }

    #[test]
    fn resolve_interval_falls_back_to_default() {
        assert_eq!(resolve_interval(&ScheduleConfig::default(), 60), 60);
    }

    // -- parse_timezone -----------------------------------------------------

    #[test]
    fn default_timezone_parses() {
        assert!(parse_timezone(DEFAULT_TIMEZONE).is_ok());
    }

    #[test]
    fn invalid_timezone_rejects() {
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }
}
