//! Trip variant merging.

use tracing::debug;

use crate::domain::Trip;
use crate::merge::group_and_merge;
use crate::store::Version;

/// Merge trips that only differ in trip number and validity.
///
/// Exports often split one service into several trips, one per period it
/// runs in. Trips for which [`Trip::same_service`] holds are folded into
/// one: the calendars are united and the lowest trip number is kept.
/// Output order follows the first trip of each group.
pub fn merge_trip_variants(trips: Vec<Version<Trip>>) -> Vec<Version<Trip>> {
    let before = trips.len();

    let merged: Vec<Version<Trip>> = group_and_merge(
        trips,
        |a, b| a.value.same_service(&b.value),
        |into, other| {
            into.calendar.union_with(&other.calendar);
            if other.value.key < into.value.key {
                into.value.key = other.value.key;
            }
        },
    )
    .collect();

    debug!(trips = before, merged = merged.len(), "Merged trip variants");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ServiceCalendar;
    use crate::domain::{GraphId, LineNumber, ServiceTime, StopKey, StopTime, TripKey};

    fn variant(line: u32, number: u32, departure: u32, calendar: &str) -> Version<Trip> {
        let t = |m| Some(ServiceTime::from_hms(8, m, 0));
        Version {
            value: Trip {
                key: TripKey::new(line, number),
                route: LineNumber(line),
                graph: GraphId(1),
                run: None,
                vehicle_type: None,
                remarks: vec![],
                stop_times: vec![
                    StopTime::new(StopKey::new(1, 1), None, t(departure)),
                    StopTime::new(StopKey::new(2, 1), t(departure + 5), None),
                ],
                geometry: None,
            },
            calendar: calendar.parse::<ServiceCalendar>().unwrap(),
        }
    }

    #[test]
    fn identical_services_merge() {
        let merged = merge_trip_variants(vec![
            variant(10, 7, 0, "1100000"),
            variant(10, 3, 0, "0011000"),
            variant(10, 5, 30, "1111100"),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].value.key, TripKey::new(10, 3));
        assert_eq!(merged[0].calendar.to_string(), "1111000");
        assert_eq!(merged[1].value.key, TripKey::new(10, 5));
    }

    #[test]
    fn different_lines_never_merge() {
        let merged = merge_trip_variants(vec![
            variant(10, 1, 0, "10"),
            variant(11, 1, 0, "01"),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn empty_input() {
        assert!(merge_trip_variants(Vec::new()).is_empty());
    }
}
