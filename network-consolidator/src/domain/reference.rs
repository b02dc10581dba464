//! Reference entities that trips and routes point at.
//!
//! These are keyed by number only. A later record with the same number
//! must describe the same thing; the pipeline keeps the first one.

use geo_types::Coord;
use serde::Serialize;

use crate::calendar::ServiceCalendar;

use super::{CompanyId, GraphId, RemarkId, RunKey, ShapeKey, TariffId, TripKey, VehicleTypeId};

/// Operator of routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agency {
    pub id: CompanyId,
    pub name: String,
    pub url: Option<String>,
    pub phone: Option<String>,
}

/// Fare system a stop belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TariffSystem {
    pub id: TariffId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleType {
    pub id: VehicleTypeId,
    pub name: String,
    pub low_floor: bool,
}

/// Footnote attached to trips (e.g. "does not run on 24 December").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remark {
    pub id: RemarkId,
    pub symbol: String,
    pub text: String,
}

/// A timetable graph: the schedule a set of trips was published in.
///
/// Trips should not run outside the graph's validity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimetableGraph {
    pub id: GraphId,
    pub name: String,
    #[serde(serialize_with = "serialize_calendar")]
    pub validity: ServiceCalendar,
}

/// A vehicle run (block): the sequence of trips one vehicle operates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub key: RunKey,
    /// Union of the calendars of every record for this run in its file.
    #[serde(serialize_with = "serialize_calendar")]
    pub calendar: ServiceCalendar,
    /// Trips that reference this run, in arrival order.
    pub trips: Vec<TripKey>,
}

/// Geometry of the route between two consecutive stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeFragment {
    pub key: ShapeKey,
    pub coords: Vec<Coord<f64>>,
}

impl ShapeFragment {
    /// Fragments are interchangeable only if they trace the same points.
    pub fn is_equivalent(&self, other: &ShapeFragment) -> bool {
        self.coords == other.coords
    }
}

fn serialize_calendar<S>(calendar: &ServiceCalendar, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(calendar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BatchId, RunId, StopKey};

    #[test]
    fn calendars_serialize_as_bitmaps() {
        let run = Run {
            key: RunKey::new(BatchId(0), RunId(3)),
            calendar: "0110".parse().unwrap(),
            trips: vec![TripKey::new(1, 2)],
        };
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["calendar"], "0110");
        assert_eq!(json["trips"][0], serde_json::json!([1, 2]));
    }

    #[test]
    fn shape_equivalence_compares_points() {
        let key = ShapeKey {
            company: CompanyId(1),
            from: StopKey::new(1, 1),
            to: StopKey::new(2, 1),
            variant: 0,
        };
        let a = ShapeFragment {
            key,
            coords: vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }],
        };
        let mut b = a.clone();
        assert!(a.is_equivalent(&b));
        b.coords.push(Coord { x: 2.0, y: 0.0 });
        assert!(!a.is_equivalent(&b));
    }
}
