//! Domain types for the consolidated network.
//!
//! These are the payloads stored in the network database once source
//! records have been validated and their references resolved. Validity
//! calendars are kept next to the payload by the store, not inside it.

mod ids;
mod reference;
mod route;
mod stop;
mod time;
mod trip;

pub use ids::{
    BatchId, CompanyId, GraphId, LineNumber, NodeId, RemarkId, RunId, RunKey, ShapeKey, StopId,
    StopKey, TariffId, TripKey, TripNumber, VehicleTypeId,
};
pub use reference::{Agency, Remark, Run, ShapeFragment, TariffSystem, TimetableGraph, VehicleType};
pub use route::{Route, RouteCategory};
pub use stop::Stop;
pub use time::{DEFAULT_ROLLOVER_THRESHOLD_HOURS, ServiceTime, TimeError, parse_clock_sequence};
pub use trip::{CorrectedField, StopTime, TimeCorrection, Trip, clamp_stop_times};
