//! The consolidated network.

use std::collections::HashMap;

use serde::Serialize;

use crate::calendar::Epoch;
use crate::domain::{
    Agency, BatchId, CompanyId, GraphId, LineNumber, Remark, RemarkId, Route, Run, RunKey,
    ShapeFragment, ShapeKey, Stop, StopKey, TariffId, TariffSystem, TimetableGraph, Trip, TripKey, VehicleType,
    VehicleTypeId,
};
use crate::shape_graph::RouteShapeGraph;
use crate::store::{Version, VersionedStore};

/// Everything consolidated so far, across all ingested files.
///
/// Versioned entities keep one version per distinct payload, each with a
/// calendar disjoint from the others under the same key.
#[derive(Debug, Default)]
pub struct NetworkDatabase {
    epoch: Option<Epoch>,
    batches: u32,
    pub agencies: HashMap<CompanyId, Agency>,
    pub tariffs: HashMap<TariffId, TariffSystem>,
    pub vehicle_types: HashMap<VehicleTypeId, VehicleType>,
    pub graphs: HashMap<GraphId, TimetableGraph>,
    pub remarks: HashMap<RemarkId, Remark>,
    pub runs: HashMap<RunKey, Run>,
    pub stops: VersionedStore<StopKey, Stop>,
    pub routes: VersionedStore<LineNumber, Route>,
    pub shapes: VersionedStore<ShapeKey, ShapeFragment>,
    pub trips: VersionedStore<TripKey, Trip>,
    shape_graph: Option<RouteShapeGraph>,
}

/// Entity counts, for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub batches: u32,
    pub agencies: usize,
    pub tariffs: usize,
    pub vehicle_types: usize,
    pub graphs: usize,
    pub remarks: usize,
    pub runs: usize,
    pub stops: usize,
    pub stop_versions: usize,
    pub routes: usize,
    pub route_versions: usize,
    pub shapes: usize,
    pub trips: usize,
    pub geometry_points: usize,
}

impl NetworkDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a route geometry graph. Shape fragments loaded afterwards are
    /// added to it, and trips get a reconstructed geometry.
    pub fn with_shape_graph(mut self, graph: RouteShapeGraph) -> Self {
        self.shape_graph = Some(graph);
        self
    }

    /// Period covered by the network, fixed by the first ingested file.
    pub fn epoch(&self) -> Option<Epoch> {
        self.epoch
    }

    pub(super) fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = Some(epoch);
    }

    /// Number the next ingested file.
    pub(super) fn begin_batch(&mut self) -> BatchId {
        let batch = BatchId(self.batches);
        self.batches += 1;
        batch
    }

    pub fn shape_graph(&self) -> Option<&RouteShapeGraph> {
        self.shape_graph.as_ref()
    }

    pub(super) fn shape_graph_mut(&mut self) -> Option<&mut RouteShapeGraph> {
        self.shape_graph.as_mut()
    }

    /// Every stored trip version, in no particular order.
    pub fn trip_versions(&self) -> Vec<Version<Trip>> {
        self.trips
            .iter()
            .flat_map(|(_, versions)| versions.iter().cloned())
            .collect()
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            batches: self.batches,
            agencies: self.agencies.len(),
            tariffs: self.tariffs.len(),
            vehicle_types: self.vehicle_types.len(),
            graphs: self.graphs.len(),
            remarks: self.remarks.len(),
            runs: self.runs.len(),
            stops: self.stops.key_count(),
            stop_versions: self.stops.version_count(),
            routes: self.routes.key_count(),
            route_versions: self.routes.version_count(),
            shapes: self.shapes.version_count(),
            trips: self.trips.version_count(),
            geometry_points: self.shape_graph.as_ref().map_or(0, |g| g.point_count()),
        }
    }
}
