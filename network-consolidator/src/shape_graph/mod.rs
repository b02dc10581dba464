//! Route geometry graph.
//!
//! Polylines exported per route fragment are stitched into one undirected
//! graph so that missing trajectory segments between two stops can be
//! reconstructed with a shortest-path query.

mod distance;
mod graph;
mod path;

pub use distance::{
    METERS_PER_DEGREE_LAT, METERS_PER_DEGREE_LON, SegmentProjection, distance_m, path_length_m,
    project_onto_segment,
};
pub use graph::{
    DEFAULT_ON_EDGE_TOLERANCE_M, Edge, GraphError, PointId, RouteShapeGraph, SplitResult,
};
