//! Source records as delivered by the export converters.
//!
//! The native export formats are converted to JSON upstream; this module
//! only defines the record shapes and reads the files.

mod error;
mod load;
mod types;

pub use error::SourceError;
pub use load::{load_source_dir, load_source_file};
pub use types::{
    AgencyRecord, GraphRecord, RemarkRecord, RouteRecord, RunRecord, ShapeRecord, SourceFile,
    StopRecord, StopTimeRecord, TariffRecord, TripRecord, VehicleTypeRecord,
};
