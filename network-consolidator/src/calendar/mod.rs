//! Service-day calendars.
//!
//! Every entity in an export carries a bitmap of the days it applies on,
//! counted from the first day of the export period. This module provides the
//! bitmap type and its set algebra, plus the [`Epoch`] that maps day offsets
//! to dates.

mod bitmap;
mod epoch;

pub use bitmap::{CalendarError, ServiceCalendar};
pub use epoch::Epoch;
