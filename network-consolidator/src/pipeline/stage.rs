//! Ingestion stages of one source file.

use serde::Serialize;
use std::fmt;

/// How far ingestion of the current file has progressed.
///
/// Entities are loaded in dependency order: anything a record refers to
/// is loaded in an earlier stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStage {
    Unopened,
    AgenciesLoaded,
    TariffsLoaded,
    StopsLoaded,
    RoutesLoaded,
    VehicleTypesLoaded,
    GraphsLoaded,
    ShapesLoaded,
    RunsLoaded,
    RemarksLoaded,
    TripsLoaded,
    Closed,
}

impl BatchStage {
    /// True if moving from `self` to `next` goes forward.
    pub fn may_advance_to(self, next: BatchStage) -> bool {
        next > self
    }
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatchStage::Unopened => "unopened",
            BatchStage::AgenciesLoaded => "agencies",
            BatchStage::TariffsLoaded => "tariffs",
            BatchStage::StopsLoaded => "stops",
            BatchStage::RoutesLoaded => "routes",
            BatchStage::VehicleTypesLoaded => "vehicle types",
            BatchStage::GraphsLoaded => "graphs",
            BatchStage::ShapesLoaded => "shapes",
            BatchStage::RunsLoaded => "runs",
            BatchStage::RemarksLoaded => "remarks",
            BatchStage::TripsLoaded => "trips",
            BatchStage::Closed => "closed",
        })
    }
}
