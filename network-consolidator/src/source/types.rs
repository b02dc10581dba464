//! Source record DTOs.
//!
//! One `SourceFile` holds everything a single export file contributed.
//! Records mirror the export columns; calendars are bitmap strings and
//! times are "HH:MM" clock values, both parsed by the pipeline. Optional
//! columns are `Option` because exports leave them blank.

use serde::Deserialize;

use crate::calendar::Epoch;
use crate::domain::RouteCategory;

/// Everything one export file contributed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    /// Name used in issue reports (usually the file name).
    pub name: String,

    /// Day zero and length of every calendar in the file.
    pub epoch: Epoch,

    #[serde(default)]
    pub agencies: Vec<AgencyRecord>,

    #[serde(default)]
    pub tariffs: Vec<TariffRecord>,

    #[serde(default)]
    pub stops: Vec<StopRecord>,

    #[serde(default)]
    pub routes: Vec<RouteRecord>,

    #[serde(default)]
    pub vehicle_types: Vec<VehicleTypeRecord>,

    #[serde(default)]
    pub graphs: Vec<GraphRecord>,

    #[serde(default)]
    pub shapes: Vec<ShapeRecord>,

    #[serde(default)]
    pub runs: Vec<RunRecord>,

    #[serde(default)]
    pub remarks: Vec<RemarkRecord>,

    #[serde(default)]
    pub trips: Vec<TripRecord>,

    /// Free-standing network polylines as `[x, y]` pairs, fed into the
    /// route geometry graph alongside shape fragments.
    #[serde(default)]
    pub network_polylines: Vec<Vec<[f64; 2]>>,
}

impl SourceFile {
    /// An empty file with the given name and epoch.
    pub fn empty(name: impl Into<String>, epoch: Epoch) -> Self {
        Self {
            name: name.into(),
            epoch,
            agencies: Vec::new(),
            tariffs: Vec::new(),
            stops: Vec::new(),
            routes: Vec::new(),
            vehicle_types: Vec::new(),
            graphs: Vec::new(),
            shapes: Vec::new(),
            runs: Vec::new(),
            remarks: Vec::new(),
            trips: Vec::new(),
            network_polylines: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencyRecord {
    pub company_id: u32,
    pub name: String,
    pub url: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffRecord {
    pub tariff_id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRecord {
    pub node_id: u32,
    pub stop_id: u32,
    pub name: String,

    /// Projected x (longitude-like).
    pub x: Option<f64>,

    /// Projected y (latitude-like).
    pub y: Option<f64>,

    pub tariff_id: Option<u32>,

    #[serde(default)]
    pub zones: Vec<String>,

    pub calendar: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub line: u32,
    pub name: String,
    pub company_id: u32,

    /// Falls back to the default category when blank.
    pub category: Option<RouteCategory>,

    pub calendar: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleTypeRecord {
    pub vehicle_type_id: u32,
    pub name: String,

    #[serde(default)]
    pub low_floor: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRecord {
    pub graph_id: u32,
    pub name: String,

    /// Validity range of the graph as a bitmap.
    pub calendar: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    pub company_id: u32,
    pub from_node: u32,
    pub from_stop: u32,
    pub to_node: u32,
    pub to_stop: u32,

    #[serde(default)]
    pub variant: u32,

    /// Points as `[x, y]` pairs, from `from` to `to`.
    pub coords: Vec<[f64; 2]>,

    pub calendar: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: u32,
    pub calendar: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemarkRecord {
    pub remark_id: u32,

    #[serde(default)]
    pub symbol: String,

    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    pub line: u32,
    pub trip: u32,
    pub graph_id: u32,
    pub run_id: Option<u32>,
    pub vehicle_type_id: Option<u32>,

    #[serde(default)]
    pub remark_ids: Vec<u32>,

    pub calendar: String,

    /// Calls in travel order.
    pub stop_times: Vec<StopTimeRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTimeRecord {
    pub node_id: u32,
    pub stop_id: u32,

    /// Scheduled arrival ("HH:MM"). Blank at the first stop.
    pub arrival: Option<String>,

    /// Scheduled departure ("HH:MM"). Blank at the last stop.
    pub departure: Option<String>,
}
