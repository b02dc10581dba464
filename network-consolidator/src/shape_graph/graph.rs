//! Undirected point graph built from route polylines.
//!
//! Points live in an arena and are referred to by [`PointId`]. Polyline end
//! points are "border" points: two polylines ending at exactly the same
//! coordinate share one point, which is how separately-exported fragments
//! join up into a network. Interior points are never shared.
//!
//! Every point is also indexed by coordinate, and every edge by the grid
//! cells its bounding box covers, so point lookups and on-edge queries do
//! not scan the whole graph.

use std::collections::{BTreeSet, HashMap};

use geo_types::{Coord, LineString};
use tracing::{debug, trace};

use super::distance::{
    METERS_PER_DEGREE_LAT, METERS_PER_DEGREE_LON, distance_m, project_onto_segment,
};

/// Error from graph mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The edge is not part of the graph.
    #[error("edge {0} is not in the graph")]
    UnknownEdge(Edge),

    /// The point id does not belong to this graph.
    #[error("point {0} is not in the graph")]
    UnknownPoint(PointId),
}

/// Index of a point in the graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub usize);

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An unordered pair of points.
///
/// Always stored with the lower id first, so `Edge::new(a, b) == Edge::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    low: PointId,
    high: PointId,
}

impl Edge {
    pub fn new(a: PointId, b: PointId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Both end points, lower id first.
    pub fn endpoints(&self) -> (PointId, PointId) {
        (self.low, self.high)
    }

    /// The end point opposite `p`, if `p` is on this edge.
    pub fn other(&self, p: PointId) -> Option<PointId> {
        if p == self.low {
            Some(self.high)
        } else if p == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// Result of [`RouteShapeGraph::split_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitResult {
    pub point: PointId,
    pub first: Edge,
    pub second: Edge,
}

#[derive(Debug, Clone)]
struct Point {
    coord: Coord<f64>,
    neighbours: Vec<PointId>,
}

/// Exact-equality key for a coordinate.
///
/// `-0.0` and `0.0` compare equal as floats, so they are folded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordKey(u64, u64);

impl CoordKey {
    fn of(c: Coord<f64>) -> Self {
        fn bits(v: f64) -> u64 {
            if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
        }
        CoordKey(bits(c.x), bits(c.y))
    }
}

/// Default distance within which a queried coordinate counts as lying on an edge.
pub const DEFAULT_ON_EDGE_TOLERANCE_M: f64 = 1.0;

/// Side of an edge index cell, in degrees.
const CELL_SIZE_DEG: f64 = 0.01;

type Cell = (i64, i64);

fn cell_of(v: f64) -> i64 {
    (v / CELL_SIZE_DEG).floor() as i64
}

/// Cells overlapping the box `min`..`max`.
fn cells_covering(min: Coord<f64>, max: Coord<f64>) -> impl Iterator<Item = Cell> {
    let (x0, x1) = (cell_of(min.x), cell_of(max.x));
    let (y0, y1) = (cell_of(min.y), cell_of(max.y));
    (x0..=x1).flat_map(move |x| (y0..=y1).map(move |y| (x, y)))
}

fn bounding_box(a: Coord<f64>, b: Coord<f64>) -> (Coord<f64>, Coord<f64>) {
    (
        Coord {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
        },
        Coord {
            x: a.x.max(b.x),
            y: a.y.max(b.y),
        },
    )
}

/// Route geometry as an undirected, Euclidean-weighted point graph.
///
/// # Examples
///
/// ```
/// use geo_types::{Coord, LineString};
/// use network_consolidator::shape_graph::RouteShapeGraph;
///
/// let a = Coord { x: 14.0, y: 50.0 };
/// let b = Coord { x: 14.1, y: 50.0 };
/// let c = Coord { x: 14.2, y: 50.0 };
///
/// let mut graph = RouteShapeGraph::new();
/// graph.load_from_polylines([LineString::new(vec![a, b]), LineString::new(vec![b, c])]);
///
/// // `b` is shared by both polylines
/// assert_eq!(graph.point_count(), 3);
/// assert_eq!(graph.find_path_between(a, c), Some(vec![a, b, c]));
/// ```
#[derive(Debug, Clone)]
pub struct RouteShapeGraph {
    points: Vec<Point>,
    edges: BTreeSet<Edge>,
    border_index: HashMap<CoordKey, PointId>,
    /// First point created at each coordinate, border or not.
    point_index: HashMap<CoordKey, PointId>,
    edge_cells: HashMap<Cell, Vec<Edge>>,
    on_edge_tolerance_m: f64,
}

impl Default for RouteShapeGraph {
    fn default() -> Self {
        Self::with_tolerance(DEFAULT_ON_EDGE_TOLERANCE_M)
    }
}

impl RouteShapeGraph {
    /// Create an empty graph with the default on-edge tolerance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with a custom on-edge tolerance in meters.
    pub fn with_tolerance(on_edge_tolerance_m: f64) -> Self {
        Self {
            points: Vec::new(),
            edges: BTreeSet::new(),
            border_index: HashMap::new(),
            point_index: HashMap::new(),
            edge_cells: HashMap::new(),
            on_edge_tolerance_m,
        }
    }

    /// Add polylines to the graph.
    ///
    /// First and last coordinates are merged with existing border points at
    /// the exact same coordinate. Polylines with fewer than two coordinates
    /// are ignored.
    pub fn load_from_polylines<I>(&mut self, polylines: I)
    where
        I: IntoIterator<Item = LineString<f64>>,
    {
        let mut loaded = 0usize;
        for line in polylines {
            if self.add_polyline(&line.0) {
                loaded += 1;
            }
        }
        debug!(
            polylines = loaded,
            points = self.points.len(),
            edges = self.edges.len(),
            "Loaded route polylines"
        );
    }

    fn add_polyline(&mut self, coords: &[Coord<f64>]) -> bool {
        let [first, interior @ .., last] = coords else {
            return false;
        };

        let mut prev = self.border_point(*first);
        for &coord in interior {
            let next = self.push_point(coord);
            self.connect(prev, next);
            prev = next;
        }
        let end = self.border_point(*last);
        self.connect(prev, end);
        true
    }

    fn border_point(&mut self, coord: Coord<f64>) -> PointId {
        let key = CoordKey::of(coord);
        if let Some(&id) = self.border_index.get(&key) {
            return id;
        }
        let id = self.push_point(coord);
        self.border_index.insert(key, id);
        id
    }

    fn push_point(&mut self, coord: Coord<f64>) -> PointId {
        let id = PointId(self.points.len());
        self.points.push(Point {
            coord,
            neighbours: Vec::new(),
        });
        self.point_index.entry(CoordKey::of(coord)).or_insert(id);
        id
    }

    fn connect(&mut self, a: PointId, b: PointId) {
        if a == b {
            return;
        }
        let edge = Edge::new(a, b);
        if self.edges.insert(edge) {
            self.points[a.0].neighbours.push(b);
            self.points[b.0].neighbours.push(a);
            for cell in self.cells_of_edge(edge) {
                self.edge_cells.entry(cell).or_default().push(edge);
            }
        }
    }

    fn cells_of_edge(&self, edge: Edge) -> impl Iterator<Item = Cell> + use<> {
        let (a, b) = edge.endpoints();
        let (min, max) = bounding_box(self.points[a.0].coord, self.points[b.0].coord);
        cells_covering(min, max)
    }

    fn unindex_edge(&mut self, edge: Edge) {
        for cell in self.cells_of_edge(edge) {
            if let Some(edges) = self.edge_cells.get_mut(&cell) {
                edges.retain(|&e| e != edge);
                if edges.is_empty() {
                    self.edge_cells.remove(&cell);
                }
            }
        }
    }

    /// Edges whose bounding box comes within the on-edge tolerance of
    /// `coord`, in ascending order.
    fn edges_near(&self, coord: Coord<f64>) -> BTreeSet<Edge> {
        let margin = Coord {
            x: self.on_edge_tolerance_m / METERS_PER_DEGREE_LON,
            y: self.on_edge_tolerance_m / METERS_PER_DEGREE_LAT,
        };
        cells_covering(coord - margin, coord + margin)
            .filter_map(|cell| self.edge_cells.get(&cell))
            .flatten()
            .copied()
            .collect()
    }

    fn disconnect(&mut self, a: PointId, b: PointId) {
        self.points[a.0].neighbours.retain(|&n| n != b);
        self.points[b.0].neighbours.retain(|&n| n != a);
    }

    /// Number of points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().copied()
    }

    /// Coordinate of a point.
    pub fn coord(&self, id: PointId) -> Option<Coord<f64>> {
        self.points.get(id.0).map(|p| p.coord)
    }

    /// Neighbours of a point, in the order their edges were added.
    pub fn neighbours(&self, id: PointId) -> &[PointId] {
        self.points
            .get(id.0)
            .map(|p| p.neighbours.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `a` and `b` are joined by an edge.
    pub fn contains_edge(&self, a: PointId, b: PointId) -> bool {
        self.edges.contains(&Edge::new(a, b))
    }

    /// Find the point at exactly `coord`.
    ///
    /// A border point wins; otherwise the first point created there.
    pub fn point_at(&self, coord: Coord<f64>) -> Option<PointId> {
        let key = CoordKey::of(coord);
        self.border_index
            .get(&key)
            .or_else(|| self.point_index.get(&key))
            .copied()
    }

    /// Find or create the graph point for `coord`.
    ///
    /// Returns an existing point at that exact coordinate. Otherwise, if the
    /// coordinate lies within the on-edge tolerance of an edge, that edge is
    /// split at `coord` (or the edge's end point is returned when the
    /// coordinate projects onto it). Returns `None` when the coordinate is
    /// not on the network.
    pub fn resolve_point(&mut self, coord: Coord<f64>) -> Option<PointId> {
        if let Some(id) = self.point_at(coord) {
            return Some(id);
        }

        let (edge, projection) = self
            .edges_near(coord)
            .into_iter()
            .map(|edge| {
                let (a, b) = edge.endpoints();
                let proj = project_onto_segment(
                    coord,
                    self.points[a.0].coord,
                    self.points[b.0].coord,
                );
                (edge, proj)
            })
            .filter(|(_, proj)| proj.distance_m <= self.on_edge_tolerance_m)
            .min_by(|x, y| x.1.distance_m.total_cmp(&y.1.distance_m))?;

        let (a, b) = edge.endpoints();
        if projection.t <= 0.0 {
            return Some(a);
        }
        if projection.t >= 1.0 {
            return Some(b);
        }

        trace!(edge = %edge, x = coord.x, y = coord.y, "Splitting edge at queried point");
        self.split_edge(coord, edge).ok().map(|split| split.point)
    }

    /// Insert a new point at `coord` in the middle of `edge`.
    ///
    /// The original edge is replaced by two edges through the new point.
    pub fn split_edge(&mut self, coord: Coord<f64>, edge: Edge) -> Result<SplitResult, GraphError> {
        let (a, b) = edge.endpoints();
        if b.0 >= self.points.len() {
            return Err(GraphError::UnknownPoint(b));
        }
        if !self.edges.contains(&edge) {
            return Err(GraphError::UnknownEdge(edge));
        }
        self.unindex_edge(edge);
        self.edges.remove(&edge);
        self.disconnect(a, b);

        let point = self.push_point(coord);
        self.connect(a, point);
        self.connect(point, b);

        Ok(SplitResult {
            point,
            first: Edge::new(a, point),
            second: Edge::new(point, b),
        })
    }

    /// Resolve both coordinates onto the network and find the path between them.
    pub fn find_path_between(
        &mut self,
        from: Coord<f64>,
        to: Coord<f64>,
    ) -> Option<Vec<Coord<f64>>> {
        let from = self.resolve_point(from);
        let to = self.resolve_point(to);
        self.find_path(from, to)
    }

    /// Straight-line distance of an edge, in meters.
    pub(super) fn edge_length(&self, a: PointId, b: PointId) -> f64 {
        distance_m(self.points[a.0].coord, self.points[b.0].coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn line(coords: &[(f64, f64)]) -> LineString<f64> {
        LineString::new(coords.iter().map(|&(x, y)| c(x, y)).collect())
    }

    fn assert_symmetric(graph: &RouteShapeGraph) {
        for edge in graph.edges() {
            let (a, b) = edge.endpoints();
            assert!(graph.neighbours(a).contains(&b), "{edge} missing at {a}");
            assert!(graph.neighbours(b).contains(&a), "{edge} missing at {b}");
        }
        let adjacency: usize = (0..graph.point_count())
            .map(|i| graph.neighbours(PointId(i)).len())
            .sum();
        assert_eq!(adjacency, graph.edge_count() * 2);
    }

    #[test]
    fn border_points_are_shared() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([
            line(&[(0.0, 0.0), (0.5, 0.1), (1.0, 0.0)]),
            line(&[(1.0, 0.0), (2.0, 0.0)]),
        ]);

        assert_eq!(graph.point_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        let shared = graph.point_at(c(1.0, 0.0)).unwrap();
        assert_eq!(graph.neighbours(shared).len(), 2);
        assert_symmetric(&graph);
    }

    #[test]
    fn interior_points_are_never_shared() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([
            line(&[(0.0, 0.0), (0.5, 0.5), (1.0, 0.0)]),
            line(&[(0.0, 1.0), (0.5, 0.5), (1.0, 1.0)]),
        ]);

        assert_eq!(graph.point_count(), 6);
        assert_symmetric(&graph);
    }

    #[test]
    fn negative_zero_matches_zero() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([
            line(&[(0.0, 1.0), (0.0, 0.0)]),
            line(&[(-0.0, 0.0), (1.0, 0.0)]),
        ]);
        assert_eq!(graph.point_count(), 3);
    }

    #[test]
    fn short_polylines_are_ignored() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0)]), line(&[])]);
        assert_eq!(graph.point_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn closed_two_point_polyline_has_no_self_loop() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (0.0, 0.0)])]);
        assert_eq!(graph.point_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn duplicate_polylines_add_no_edges_between_borders() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (1.0, 0.0)]), line(&[(1.0, 0.0), (0.0, 0.0)])]);
        assert_eq!(graph.point_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_symmetric(&graph);
    }

    #[test]
    fn split_edge_replaces_edge() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (1.0, 0.0)])]);
        let a = graph.point_at(c(0.0, 0.0)).unwrap();
        let b = graph.point_at(c(1.0, 0.0)).unwrap();

        let split = graph.split_edge(c(0.4, 0.0), Edge::new(a, b)).unwrap();

        assert!(!graph.contains_edge(a, b));
        assert!(graph.contains_edge(a, split.point));
        assert!(graph.contains_edge(split.point, b));
        assert_eq!(split.first, Edge::new(a, split.point));
        assert_eq!(split.second, Edge::new(split.point, b));
        assert_eq!(graph.edge_count(), 2);
        assert_symmetric(&graph);
    }

    #[test]
    fn split_unknown_edge_fails() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (0.5, 0.0), (1.0, 0.0)])]);
        let a = graph.point_at(c(0.0, 0.0)).unwrap();
        let b = graph.point_at(c(1.0, 0.0)).unwrap();

        let err = graph.split_edge(c(0.2, 0.0), Edge::new(a, b)).unwrap_err();
        assert_eq!(err, GraphError::UnknownEdge(Edge::new(a, b)));

        let err = graph
            .split_edge(c(0.2, 0.0), Edge::new(a, PointId(99)))
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownPoint(PointId(99)));
        assert_eq!(graph.point_count(), 3);
    }

    #[test]
    fn resolve_point_splits_mid_edge() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (1.0, 0.0)])]);

        let mid = graph.resolve_point(c(0.5, 0.0)).unwrap();
        assert_eq!(graph.point_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        // The same coordinate resolves to the same point afterwards
        assert_eq!(graph.resolve_point(c(0.5, 0.0)), Some(mid));
        assert_eq!(graph.point_count(), 3);
    }

    #[test]
    fn resolve_point_off_network() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (1.0, 0.0)])]);

        assert_eq!(graph.resolve_point(c(0.5, 0.5)), None);
        assert_eq!(graph.point_count(), 2);
    }

    #[test]
    fn resolve_point_near_end_returns_end() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (1.0, 0.0)])]);
        let b = graph.point_at(c(1.0, 0.0)).unwrap();

        // A few millimeters past the end
        assert_eq!(graph.resolve_point(c(1.000_000_01, 0.0)), Some(b));
        assert_eq!(graph.point_count(), 2);
    }

    fn assert_indexed(graph: &RouteShapeGraph) {
        for edge in graph.edges() {
            for cell in graph.cells_of_edge(edge) {
                assert!(graph.edge_cells[&cell].contains(&edge), "{edge} not indexed");
            }
        }
        for edges in graph.edge_cells.values() {
            assert!(edges.iter().all(|e| graph.edges.contains(e)));
        }
    }

    #[test]
    fn point_at_finds_interior_and_split_points() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (0.5, 0.2), (1.0, 0.0)])]);

        let interior = graph.point_at(c(0.5, 0.2)).unwrap();
        assert_eq!(graph.coord(interior), Some(c(0.5, 0.2)));

        let a = graph.point_at(c(0.0, 0.0)).unwrap();
        let split = graph.split_edge(c(0.25, 0.1), Edge::new(a, interior)).unwrap();
        assert_eq!(graph.point_at(c(0.25, 0.1)), Some(split.point));
        assert_eq!(graph.point_at(c(0.25, 0.2)), None);
    }

    #[test]
    fn repeated_splits_keep_edge_index_current() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([
            line(&[(14.0, 50.0), (14.1, 50.0)]),
            line(&[(14.1, 50.0), (14.1, 50.1)]),
        ]);

        let first = graph.resolve_point(c(14.03, 50.0)).unwrap();
        let second = graph.resolve_point(c(14.07, 50.0)).unwrap();
        let third = graph.resolve_point(c(14.1, 50.05)).unwrap();

        assert_eq!(graph.point_count(), 6);
        assert_eq!(graph.edge_count(), 5);
        assert!(graph.contains_edge(first, second));
        assert_ne!(third, second);
        assert_indexed(&graph);
        assert_symmetric(&graph);
    }

    #[test]
    fn error_display() {
        let err = GraphError::UnknownEdge(Edge::new(PointId(3), PointId(1)));
        assert_eq!(err.to_string(), "edge #1-#3 is not in the graph");

        let err = GraphError::UnknownPoint(PointId(7));
        assert_eq!(err.to_string(), "point #7 is not in the graph");
    }
}
