//! Service-day bitmaps.
//!
//! A `ServiceCalendar` records, for each day counted from the shared epoch,
//! whether something applies on that day. Calendars of different lengths can
//! be combined: the shorter one is treated as "not valid" past its end.

use std::fmt;
use std::str::FromStr;

/// Error returned by calendar parsing and indexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// The bitmap string contained something other than `0` or `1`.
    #[error("invalid calendar bitmap: unexpected {found:?} at position {position}")]
    Format { position: usize, found: char },

    /// A day index past the end of the calendar.
    #[error("day {day} is out of range for a calendar of {len} days")]
    DayOutOfRange { day: usize, len: usize },
}

/// A fixed-length bitmap of service days, indexed from the epoch.
///
/// # Examples
///
/// ```
/// use network_consolidator::calendar::ServiceCalendar;
///
/// let weekdays = ServiceCalendar::from_bitmap_str("1111100").unwrap();
/// let weekend = ServiceCalendar::from_bitmap_str("0000011").unwrap();
///
/// assert!(!weekdays.intersects(&weekend));
/// assert_eq!(weekdays.union(&weekend).to_string(), "1111111");
/// assert!(ServiceCalendar::from_bitmap_str("10x").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ServiceCalendar {
    days: Vec<bool>,
}

impl ServiceCalendar {
    /// Create a calendar of `len` days, none of them valid.
    pub fn new(len: usize) -> Self {
        Self {
            days: vec![false; len],
        }
    }

    /// Create a calendar of `len` days, all of them valid.
    pub fn full(len: usize) -> Self {
        Self {
            days: vec![true; len],
        }
    }

    /// Parse a string of `0`/`1` characters, one per day.
    pub fn from_bitmap_str(s: &str) -> Result<Self, CalendarError> {
        let days = s
            .chars()
            .enumerate()
            .map(|(position, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                found => Err(CalendarError::Format { position, found }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { days })
    }

    /// Number of days covered by this calendar.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// True iff no day is set.
    ///
    /// An empty calendar never applies, regardless of its length.
    pub fn is_empty(&self) -> bool {
        !self.days.iter().any(|&d| d)
    }

    /// Whether `day` is set. Out-of-range days are an error.
    pub fn get(&self, day: usize) -> Result<bool, CalendarError> {
        self.days
            .get(day)
            .copied()
            .ok_or(CalendarError::DayOutOfRange {
                day,
                len: self.days.len(),
            })
    }

    /// Set or clear `day`.
    pub fn set(&mut self, day: usize, valid: bool) -> Result<(), CalendarError> {
        let len = self.days.len();
        let slot = self
            .days
            .get_mut(day)
            .ok_or(CalendarError::DayOutOfRange { day, len })?;
        *slot = valid;
        Ok(())
    }

    /// Whether `day` is set, treating days past the end as not valid.
    pub fn is_valid_on(&self, day: usize) -> bool {
        self.days.get(day).copied().unwrap_or(false)
    }

    /// Iterate over the indices of valid days.
    pub fn valid_days(&self) -> impl Iterator<Item = usize> + '_ {
        self.days
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| d.then_some(i))
    }

    /// Number of valid days.
    pub fn count_valid_days(&self) -> usize {
        self.days.iter().filter(|&&d| d).count()
    }

    /// Per-day OR. The result has the longer operand's length.
    pub fn union(&self, other: &Self) -> Self {
        self.zip_with(other, self.len().max(other.len()), |a, b| a || b)
    }

    /// Per-day AND. The result has the longer operand's length.
    pub fn intersect(&self, other: &Self) -> Self {
        self.zip_with(other, self.len().max(other.len()), |a, b| a && b)
    }

    /// Per-day AND-NOT. The result keeps `self`'s length.
    pub fn subtract(&self, other: &Self) -> Self {
        self.zip_with(other, self.len(), |a, b| a && !b)
    }

    /// True iff every day set in `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.valid_days().all(|day| other.is_valid_on(day))
    }

    /// True iff at least one day is set in both calendars.
    pub fn intersects(&self, other: &Self) -> bool {
        self.days
            .iter()
            .zip(other.days.iter())
            .any(|(&a, &b)| a && b)
    }

    /// In-place union, used when folding versions together.
    pub fn union_with(&mut self, other: &Self) {
        *self = self.union(other);
    }

    fn zip_with(&self, other: &Self, len: usize, op: impl Fn(bool, bool) -> bool) -> Self {
        let days = (0..len)
            .map(|day| op(self.is_valid_on(day), other.is_valid_on(day)))
            .collect();
        Self { days }
    }
}

impl FromStr for ServiceCalendar {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bitmap_str(s)
    }
}

impl fmt::Display for ServiceCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &d in &self.days {
            f.write_str(if d { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for ServiceCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceCalendar({self})")
    }
}

impl FromIterator<bool> for ServiceCalendar {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}
