//! Equirectangular distance approximation.
//!
//! Coordinates are degree-like planar values; distances are scaled with fixed
//! per-degree constants for the export region instead of a geodesic formula.

use geo_types::Coord;

/// Meters per degree of latitude.
pub const METERS_PER_DEGREE_LAT: f64 = 111_200.0;

/// Meters per degree of longitude at roughly 50° north.
pub const METERS_PER_DEGREE_LON: f64 = 71_500.0;

fn to_meters(c: Coord<f64>) -> (f64, f64) {
    (c.x * METERS_PER_DEGREE_LON, c.y * METERS_PER_DEGREE_LAT)
}

/// Approximate distance between two coordinates, in meters.
pub fn distance_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (ax, ay) = to_meters(a);
    let (bx, by) = to_meters(b);
    (bx - ax).hypot(by - ay)
}

/// Total length of a coordinate sequence, in meters.
pub fn path_length_m(path: &[Coord<f64>]) -> f64 {
    path.windows(2).map(|w| distance_m(w[0], w[1])).sum()
}

/// Projection of a point onto a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Position along the segment: 0 at `a`, 1 at `b`, clamped to that range.
    pub t: f64,
    /// Distance from the point to its projection, in meters.
    pub distance_m: f64,
}

/// Project `p` onto the segment `a`–`b`.
pub fn project_onto_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> SegmentProjection {
    let (px, py) = to_meters(p);
    let (ax, ay) = to_meters(a);
    let (bx, by) = to_meters(b);

    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    };

    let (qx, qy) = (ax + t * dx, ay + t * dy);
    SegmentProjection {
        t,
        distance_m: (px - qx).hypot(py - qy),
    }
}
