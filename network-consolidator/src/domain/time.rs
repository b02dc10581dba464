//! Service-day clock times.
//!
//! Exports give stop times as "HH:MM" clock strings. A trip that runs past
//! midnight keeps counting from the start of its operating day, so a
//! `ServiceTime` may exceed 24 hours. The day shift is recovered from the
//! order of the clock values.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when parsing an invalid clock string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Time since the start of the operating day, in seconds.
///
/// # Examples
///
/// ```
/// use network_consolidator::domain::ServiceTime;
///
/// let t = ServiceTime::parse_hhmm("23:50").unwrap();
/// assert_eq!(t.to_string(), "23:50");
///
/// // The same clock value one day later
/// let next = t.with_day_shift(1);
/// assert_eq!(next.to_string(), "47:50");
/// assert_eq!(next.day_shift(), 1);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Create from hours, minutes and seconds since the start of the day.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Create from a total number of seconds.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Parse a clock value in "HH:MM" format (00:00 to 23:59).
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self::from_hms(hour, minute, 0))
    }

    /// Total seconds since the start of the operating day.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// Number of whole days past the operating day's start.
    pub fn day_shift(&self) -> u32 {
        self.0 / SECONDS_PER_DAY
    }

    /// Seconds since midnight of the calendar day this time falls on.
    pub fn clock_seconds(&self) -> u32 {
        self.0 % SECONDS_PER_DAY
    }

    /// The same clock value, `days` days later.
    pub fn with_day_shift(&self, days: u32) -> Self {
        Self(self.0 + days * SECONDS_PER_DAY)
    }

    /// Returns the duration between two times.
    ///
    /// Returns a negative duration if `other` is after `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        Duration::seconds(i64::from(self.0) - i64::from(other.0))
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.0 / 60;
        write!(f, "{:02}:{:02}", minutes / 60, minutes % 60)
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// Default threshold for detecting midnight rollover in time sequences.
pub const DEFAULT_ROLLOVER_THRESHOLD_HOURS: u32 = 6;

/// Parse a trip's clock values in travel order, recovering the day shift.
///
/// A clock value more than `threshold_hours` earlier than the previous one
/// is taken to be on the next day. Smaller backward steps stay on the same
/// day; they are data errors that stop-time clamping deals with. `None`
/// entries are preserved.
///
/// # Examples
///
/// ```
/// use network_consolidator::domain::parse_clock_sequence;
///
/// let times = vec![Some("23:40"), None, Some("00:05")];
/// let parsed = parse_clock_sequence(&times, 6).unwrap();
/// assert_eq!(parsed[0].unwrap().day_shift(), 0);
/// assert!(parsed[1].is_none());
/// assert_eq!(parsed[2].unwrap().to_string(), "24:05");
/// ```
pub fn parse_clock_sequence(
    times: &[Option<&str>],
    threshold_hours: u32,
) -> Result<Vec<Option<ServiceTime>>, TimeError> {
    let threshold = threshold_hours * 3600;
    let mut result = Vec::with_capacity(times.len());
    let mut day_shift = 0;
    let mut prev_clock: Option<u32> = None;

    for time_opt in times {
        let Some(time_str) = time_opt else {
            result.push(None);
            continue;
        };

        let clock = ServiceTime::parse_hhmm(time_str)?.seconds();
        if let Some(prev) = prev_clock {
            if prev > clock && prev - clock > threshold {
                day_shift += 1;
            }
        }

        result.push(Some(ServiceTime(clock).with_day_shift(day_shift)));
        prev_clock = Some(clock);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        let t = ServiceTime::parse_hhmm("00:00").unwrap();
        assert_eq!(t.seconds(), 0);

        let t = ServiceTime::parse_hhmm("23:59").unwrap();
        assert_eq!(t.seconds(), 23 * 3600 + 59 * 60);

        let t = ServiceTime::parse_hhmm("14:30").unwrap();
        assert_eq!(t, ServiceTime::from_hms(14, 30, 0));
    }

    #[test]
    fn parse_invalid_format() {
        assert!(ServiceTime::parse_hhmm("1430").is_err());
        assert!(ServiceTime::parse_hhmm("14:3").is_err());
        assert!(ServiceTime::parse_hhmm("14-30").is_err());
        assert!(ServiceTime::parse_hhmm("ab:cd").is_err());
        assert!(ServiceTime::parse_hhmm("24:00").is_err());
        assert!(ServiceTime::parse_hhmm("12:60").is_err());
    }

    #[test]
    fn display_past_midnight() {
        assert_eq!(ServiceTime::from_hms(25, 5, 0).to_string(), "25:05");
        assert_eq!(ServiceTime::from_hms(9, 5, 59).to_string(), "09:05");
    }

    #[test]
    fn day_shift_and_clock() {
        let t = ServiceTime::from_hms(26, 15, 0);
        assert_eq!(t.day_shift(), 1);
        assert_eq!(t.clock_seconds(), 2 * 3600 + 15 * 60);
    }

    #[test]
    fn duration_between() {
        let a = ServiceTime::from_hms(10, 0, 0);
        let b = ServiceTime::from_hms(12, 30, 0);
        assert_eq!(b.signed_duration_since(a), Duration::minutes(150));
        assert_eq!(a.signed_duration_since(b), Duration::minutes(-150));
    }

    #[test]
    fn sequence_same_day() {
        let parsed = parse_clock_sequence(&[Some("10:00"), Some("10:30"), Some("11:00")], 6).unwrap();
        assert!(parsed.iter().all(|t| t.unwrap().day_shift() == 0));
    }

    #[test]
    fn sequence_crosses_midnight() {
        let parsed =
            parse_clock_sequence(&[Some("23:00"), Some("23:30"), Some("00:15"), Some("01:00")], 6)
                .unwrap();

        assert_eq!(parsed[1].unwrap().day_shift(), 0);
        assert_eq!(parsed[2].unwrap().day_shift(), 1);
        assert_eq!(parsed[3].unwrap().to_string(), "25:00");
        assert!(parsed[1].unwrap() < parsed[2].unwrap());
    }

    #[test]
    fn small_backward_step_is_not_rollover() {
        let parsed = parse_clock_sequence(&[Some("10:00"), Some("09:58")], 6).unwrap();
        assert_eq!(parsed[1].unwrap().day_shift(), 0);
        assert!(parsed[1].unwrap() < parsed[0].unwrap());
    }

    #[test]
    fn exactly_at_threshold_is_not_rollover() {
        let parsed = parse_clock_sequence(&[Some("12:00"), Some("06:00")], 6).unwrap();
        assert_eq!(parsed[1].unwrap().day_shift(), 0);

        let parsed = parse_clock_sequence(&[Some("12:00"), Some("05:59")], 6).unwrap();
        assert_eq!(parsed[1].unwrap().day_shift(), 1);
    }

    #[test]
    fn sequence_with_gaps_and_errors() {
        let parsed = parse_clock_sequence(&[None, Some("23:30"), None, Some("00:30")], 6).unwrap();
        assert!(parsed[0].is_none());
        assert_eq!(parsed[3].unwrap().day_shift(), 1);

        assert!(parse_clock_sequence(&[Some("10:00"), Some("1x:00")], 6).is_err());
    }

    #[test]
    fn error_display() {
        let err = ServiceTime::parse_hhmm("25:00").unwrap_err();
        assert_eq!(err.to_string(), "invalid time: hour must be 0-23");
    }
}
