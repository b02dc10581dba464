//! Trips and their stop times.

use geo_types::Coord;
use serde::Serialize;
use std::fmt;

use super::{GraphId, LineNumber, RemarkId, RunKey, ServiceTime, StopKey, TripKey, VehicleTypeId};

/// Scheduled call of a trip at one stop post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopTime {
    pub stop: StopKey,
    pub arrival: Option<ServiceTime>,
    pub departure: Option<ServiceTime>,
}

impl StopTime {
    pub fn new(stop: StopKey, arrival: Option<ServiceTime>, departure: Option<ServiceTime>) -> Self {
        Self {
            stop,
            arrival,
            departure,
        }
    }

    /// The time the vehicle leaves this stop, falling back to its arrival.
    pub fn leaves_at(&self) -> Option<ServiceTime> {
        self.departure.or(self.arrival)
    }
}

/// A single vehicle journey along a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub key: TripKey,
    /// Route the trip runs on. Usually `key.line()`, kept separate so a trip
    /// can be reassigned to a substitute route.
    pub route: LineNumber,
    pub graph: GraphId,
    pub run: Option<RunKey>,
    pub vehicle_type: Option<VehicleTypeId>,
    pub remarks: Vec<RemarkId>,
    pub stop_times: Vec<StopTime>,
    /// Travelled path, when geometry reconstruction ran.
    pub geometry: Option<Vec<Coord<f64>>>,
}

impl Trip {
    /// Stop posts in visiting order.
    pub fn stop_keys(&self) -> impl Iterator<Item = StopKey> + '_ {
        self.stop_times.iter().map(|st| st.stop)
    }

    pub fn first_departure(&self) -> Option<ServiceTime> {
        self.stop_times.first().and_then(StopTime::leaves_at)
    }

    /// True if both trips provide the same service apart from their trip
    /// number and validity: same line and route, same calls at the same
    /// times, same run number and remarks.
    ///
    /// Runs are compared by number only, so copies of a trip from different
    /// files still match.
    pub fn same_service(&self, other: &Trip) -> bool {
        self.key.line() == other.key.line()
            && self.route == other.route
            && self.stop_times == other.stop_times
            && self.run.map(|r| r.run) == other.run.map(|r| r.run)
            && self.remarks == other.remarks
    }
}

/// Which time of a stop a correction applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectedField {
    /// Arrival was before the previous stop's departure.
    Arrival,
    /// Departure was before the arrival at the same stop.
    Departure,
}

/// One adjustment made by [`clamp_stop_times`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCorrection {
    pub index: usize,
    pub field: CorrectedField,
    pub from: ServiceTime,
    pub to: ServiceTime,
}

impl fmt::Display for TimeCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            CorrectedField::Arrival => "arrival",
            CorrectedField::Departure => "departure",
        };
        write!(
            f,
            "{} at stop {} moved from {} to {}",
            field, self.index, self.from, self.to
        )
    }
}

/// Make a trip's times non-decreasing.
///
/// An arrival earlier than the previous stop's departure is moved up to that
/// departure. A departure earlier than the arrival at the same stop is moved
/// up to the arrival. Missing times are left alone and do not break the
/// chain: the last known time carries over.
///
/// The result is already clamped, so applying the function again yields no
/// further corrections.
///
/// # Examples
///
/// ```
/// use network_consolidator::domain::{clamp_stop_times, ServiceTime, StopKey, StopTime};
///
/// let t = |h, m| Some(ServiceTime::from_hms(h, m, 0));
/// let times = vec![
///     StopTime::new(StopKey::new(1, 1), None, t(10, 5)),
///     StopTime::new(StopKey::new(2, 1), t(10, 3), t(10, 4)),
/// ];
///
/// let (clamped, corrections) = clamp_stop_times(&times);
/// assert_eq!(clamped[1].arrival, t(10, 5));
/// assert_eq!(clamped[1].departure, t(10, 5));
/// assert_eq!(corrections.len(), 2);
/// ```
pub fn clamp_stop_times(stop_times: &[StopTime]) -> (Vec<StopTime>, Vec<TimeCorrection>) {
    let mut clamped = stop_times.to_vec();
    let mut corrections = Vec::new();
    let mut floor: Option<ServiceTime> = None;

    for (index, stop_time) in clamped.iter_mut().enumerate() {
        if let (Some(arrival), Some(min)) = (stop_time.arrival, floor) {
            if arrival < min {
                corrections.push(TimeCorrection {
                    index,
                    field: CorrectedField::Arrival,
                    from: arrival,
                    to: min,
                });
                stop_time.arrival = Some(min);
            }
        }
        if stop_time.arrival.is_some() {
            floor = stop_time.arrival;
        }

        if let (Some(departure), Some(min)) = (stop_time.departure, floor) {
            if departure < min {
                corrections.push(TimeCorrection {
                    index,
                    field: CorrectedField::Departure,
                    from: departure,
                    to: min,
                });
                stop_time.departure = Some(min);
            }
        }
        if stop_time.departure.is_some() {
            floor = stop_time.departure;
        }
    }

    (clamped, corrections)
}
