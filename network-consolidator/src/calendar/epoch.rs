//! Export period shared by all files of one consolidation run.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ServiceCalendar;

/// First day and length of an export period.
///
/// Day `0` of every [`ServiceCalendar`] in a run refers to `start`.
///
/// # Examples
///
/// ```
/// use network_consolidator::calendar::Epoch;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let epoch = Epoch::new(start, 7);
///
/// assert_eq!(epoch.date_of(1), NaiveDate::from_ymd_opt(2024, 3, 16));
/// assert_eq!(epoch.date_of(7), None);
/// assert_eq!(epoch.day_of(start), Some(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Epoch {
    pub start: NaiveDate,
    pub day_count: u32,
}

impl Epoch {
    pub fn new(start: NaiveDate, day_count: u32) -> Self {
        Self { start, day_count }
    }

    /// Last day covered by the period, if it covers any.
    pub fn end(&self) -> Option<NaiveDate> {
        self.day_count
            .checked_sub(1)
            .and_then(|last| self.date_of(last as usize))
    }

    /// Date of the day at `offset`, or `None` past the end of the period.
    pub fn date_of(&self, offset: usize) -> Option<NaiveDate> {
        if offset >= self.day_count as usize {
            return None;
        }
        self.start
            .checked_add_signed(Duration::days(offset as i64))
    }

    /// Offset of `date` within the period.
    pub fn day_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = date.signed_duration_since(self.start).num_days();
        (0..self.day_count as i64)
            .contains(&offset)
            .then_some(offset as usize)
    }

    /// Build a calendar spanning the whole period from a set of dates.
    ///
    /// Dates outside the period are ignored.
    pub fn calendar_from_dates<I>(&self, dates: I) -> ServiceCalendar
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut calendar = ServiceCalendar::new(self.day_count as usize);
        for day in dates.into_iter().filter_map(|d| self.day_of(d)) {
            // day_of only yields offsets inside the period
            let _ = calendar.set(day, true);
        }
        calendar
    }

    /// Dates on which `calendar` is valid.
    pub fn dates_of<'a>(
        &'a self,
        calendar: &'a ServiceCalendar,
    ) -> impl Iterator<Item = NaiveDate> + 'a {
        calendar.valid_days().filter_map(|day| self.date_of(day))
    }
}
