//! Shortest paths over the route graph.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use geo_types::Coord;
use tracing::trace;

use super::graph::{PointId, RouteShapeGraph};

/// Priority queue entry. Ordered so that `BinaryHeap` pops the smallest
/// distance first and, among equal distances, the earliest-pushed entry.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    distance: f64,
    seq: u64,
    point: PointId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl RouteShapeGraph {
    /// Shortest path between two points, as coordinates from `from` to `to`
    /// inclusive.
    ///
    /// Returns `None` if either endpoint is `None` or unknown, or if the
    /// points are not connected. Among equally short paths the one whose
    /// vertices were reached first wins, so results are reproducible.
    pub fn find_path(
        &self,
        from: Option<PointId>,
        to: Option<PointId>,
    ) -> Option<Vec<Coord<f64>>> {
        let (from, to) = (from?, to?);
        let n = self.point_count();
        if from.0 >= n || to.0 >= n {
            return None;
        }

        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<PointId>> = vec![None; n];
        let mut settled = vec![false; n];
        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;

        dist[from.0] = 0.0;
        heap.push(QueueEntry {
            distance: 0.0,
            seq,
            point: from,
        });

        while let Some(QueueEntry { distance, point, .. }) = heap.pop() {
            if settled[point.0] {
                continue;
            }
            settled[point.0] = true;
            if point == to {
                break;
            }

            for &next in self.neighbours(point) {
                if settled[next.0] {
                    continue;
                }
                let candidate = distance + self.edge_length(point, next);
                if candidate < dist[next.0] {
                    dist[next.0] = candidate;
                    prev[next.0] = Some(point);
                    seq += 1;
                    heap.push(QueueEntry {
                        distance: candidate,
                        seq,
                        point: next,
                    });
                }
            }
        }

        if !settled[to.0] {
            trace!(from = %from, to = %to, "No path between points");
            return None;
        }

        let mut path = vec![to];
        let mut cursor = to;
        while let Some(p) = prev[cursor.0] {
            path.push(p);
            cursor = p;
        }
        path.reverse();

        trace!(
            from = %from,
            to = %to,
            points = path.len(),
            meters = dist[to.0],
            "Found path"
        );

        path.into_iter().map(|p| self.coord(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::LineString;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn line(coords: &[(f64, f64)]) -> LineString<f64> {
        LineString::new(coords.iter().map(|&(x, y)| c(x, y)).collect())
    }

    #[test]
    fn straight_line_path() {
        let (a, b, cc) = (c(0.0, 0.0), c(1.0, 0.0), c(2.0, 0.0));
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (1.0, 0.0)]), line(&[(1.0, 0.0), (2.0, 0.0)])]);

        let from = graph.point_at(a);
        let to = graph.point_at(cc);
        assert_eq!(graph.find_path(from, to), Some(vec![a, b, cc]));
    }

    #[test]
    fn disconnected_point_has_no_path() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(5.0, 5.0), (6.0, 5.0)]),
        ]);

        let from = graph.point_at(c(0.0, 0.0));
        let to = graph.point_at(c(5.0, 5.0));
        assert!(from.is_some() && to.is_some());
        assert_eq!(graph.find_path(from, to), None);
    }

    #[test]
    fn missing_endpoint_gives_none() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (1.0, 0.0)])]);
        let a = graph.point_at(c(0.0, 0.0));

        assert_eq!(graph.find_path(a, None), None);
        assert_eq!(graph.find_path(None, a), None);
        assert_eq!(graph.find_path(a, Some(PointId(42))), None);
    }

    #[test]
    fn same_point_path() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (1.0, 0.0)])]);
        let a = graph.point_at(c(0.0, 0.0));
        assert_eq!(graph.find_path(a, a), Some(vec![c(0.0, 0.0)]));
    }

    #[test]
    fn prefers_shorter_route() {
        // Two ways from A to D: a short detour via B, a long one via C.
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([
            line(&[(0.0, 0.0), (1.0, 0.1), (2.0, 0.0)]),
            line(&[(0.0, 0.0), (1.0, 3.0), (2.0, 0.0)]),
        ]);

        let path = graph
            .find_path(graph.point_at(c(0.0, 0.0)), graph.point_at(c(2.0, 0.0)))
            .unwrap();
        assert_eq!(path, vec![c(0.0, 0.0), c(1.0, 0.1), c(2.0, 0.0)]);
    }

    #[test]
    fn equal_routes_tie_break_is_stable() {
        // Symmetric detours above and below the axis.
        let polylines = || {
            [
                line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]),
                line(&[(0.0, 0.0), (1.0, -1.0), (2.0, 0.0)]),
            ]
        };

        let mut first = RouteShapeGraph::new();
        first.load_from_polylines(polylines());
        let mut second = RouteShapeGraph::new();
        second.load_from_polylines(polylines());

        let p1 = first.find_path(first.point_at(c(0.0, 0.0)), first.point_at(c(2.0, 0.0)));
        let p2 = second.find_path(second.point_at(c(0.0, 0.0)), second.point_at(c(2.0, 0.0)));
        assert_eq!(p1, p2);
        // The detour loaded first is reached first
        assert_eq!(p1.unwrap()[1], c(1.0, 1.0));
    }

    #[test]
    fn path_between_coordinates_on_edges() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])]);

        let path = graph.find_path_between(c(0.5, 0.0), c(1.5, 0.0)).unwrap();
        assert_eq!(path, vec![c(0.5, 0.0), c(1.0, 0.0), c(1.5, 0.0)]);
    }

    #[test]
    fn path_between_unresolvable_coordinate() {
        let mut graph = RouteShapeGraph::new();
        graph.load_from_polylines([line(&[(0.0, 0.0), (1.0, 0.0)])]);
        assert_eq!(graph.find_path_between(c(0.0, 0.0), c(3.0, 3.0)), None);
    }
}
