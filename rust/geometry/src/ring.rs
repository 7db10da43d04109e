// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar ring primitives: shoelace areas, ray casting, winding.
//!
//! All computations are Euclidean on projected (UTM) coordinates. Geodesic
//! area formulas must never be applied here; they assume geographic
//! coordinates and produce garbage on metric easting/northing pairs.

use crate::error::{Error, Result};
use nalgebra::Point2;

/// An ordered boundary of planar points. Open or explicitly closed
/// (first point repeated at the end); every operation in this module
/// accepts both forms.
pub type Ring = Vec<Point2<f64>>;

/// A polygon with one exterior ring and zero or more interior rings (holes).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon2D {
    /// Outer boundary.
    pub exterior: Ring,
    /// Holes fully nested inside the exterior.
    pub holes: Vec<Ring>,
}

impl Polygon2D {
    /// Create a polygon without holes.
    pub fn new(exterior: Ring) -> Self {
        Self {
            exterior,
            holes: Vec::new(),
        }
    }

    /// Add an interior ring.
    pub fn add_hole(&mut self, hole: Ring) {
        self.holes.push(hole);
    }

    /// Planar area: |exterior| minus the sum of |holes|.
    pub fn planar_area(&self) -> f64 {
        let mut area = signed_area(&self.exterior).abs();
        for hole in &self.holes {
            area -= signed_area(hole).abs();
        }
        area
    }

    /// Check that every ring still describes a surface: at least 3 distinct
    /// vertices once the closure duplicate is ignored.
    pub fn validate(&self) -> Result<()> {
        let n = distinct_vertex_count(&self.exterior);
        if n < 3 {
            return Err(Error::DegenerateRing(n));
        }
        for hole in &self.holes {
            let n = distinct_vertex_count(hole);
            if n < 3 {
                return Err(Error::DegenerateRing(n));
            }
        }
        Ok(())
    }

    /// Deterministic representative point inside the exterior and outside
    /// every hole. Tries the vertex centroid first, then midpoints between
    /// the centroid and each vertex; falls back to the first vertex when the
    /// polygon is too degenerate for any probe to land.
    pub fn interior_point(&self) -> Point2<f64> {
        let c = centroid(&self.exterior);
        if self.covers(&c) {
            return c;
        }
        for v in &self.exterior {
            let probe = Point2::new((c.x + v.x) / 2.0, (c.y + v.y) / 2.0);
            if self.covers(&probe) {
                return probe;
            }
        }
        self.exterior.first().copied().unwrap_or(c)
    }

    /// Point-in-polygon including hole exclusion.
    pub fn covers(&self, point: &Point2<f64>) -> bool {
        if !point_in_ring(point, &self.exterior) {
            return false;
        }
        !self.holes.iter().any(|h| point_in_ring(point, h))
    }
}

/// Signed shoelace area. Positive = counter-clockwise, negative = clockwise.
/// The wrap term vanishes for explicitly closed rings, so both ring forms
/// yield the same value.
pub fn signed_area(ring: &[Point2<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let n = ring.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += ring[i].x * ring[j].y;
        area -= ring[j].x * ring[i].y;
    }
    area * 0.5
}

/// Ray-casting point-in-ring test.
pub fn point_in_ring(point: &Point2<f64>, ring: &[Point2<f64>]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let n = ring.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = &ring[i];
        let pj = &ring[j];
        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Number of vertices with the closure duplicate (if any) ignored.
pub fn distinct_vertex_count(ring: &[Point2<f64>]) -> usize {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => ring.len() - 1,
        _ => ring.len(),
    }
}

/// Append the first point when the ring is not explicitly closed.
pub fn close_ring(ring: &mut Ring) {
    if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(first);
        }
    }
}

/// Drop the explicit closure duplicate when present.
pub fn strip_closure(ring: &mut Ring) {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
}

/// Remove consecutive duplicate vertices.
pub fn dedup_consecutive(ring: &[Point2<f64>]) -> Ring {
    let mut out: Ring = Vec::with_capacity(ring.len());
    for p in ring {
        if out.last() != Some(p) {
            out.push(*p);
        }
    }
    out
}

/// Ensure counter-clockwise winding (positive signed area).
pub fn ensure_ccw(ring: &[Point2<f64>]) -> Ring {
    if signed_area(ring) < 0.0 {
        ring.iter().rev().cloned().collect()
    } else {
        ring.to_vec()
    }
}

/// Ensure clockwise winding (for holes).
pub fn ensure_cw(ring: &[Point2<f64>]) -> Ring {
    if signed_area(ring) > 0.0 {
        ring.iter().rev().cloned().collect()
    } else {
        ring.to_vec()
    }
}

/// Vertex-average centroid. Cheap and deterministic; good enough for label
/// placement and as the first interior-point probe.
pub fn centroid(ring: &[Point2<f64>]) -> Point2<f64> {
    if ring.is_empty() {
        return Point2::new(0.0, 0.0);
    }
    let n = distinct_vertex_count(ring).max(1);
    let mut x = 0.0;
    let mut y = 0.0;
    for p in &ring[..n] {
        x += p.x;
        y += p.y;
    }
    Point2::new(x / n as f64, y / n as f64)
}

/// Axis-aligned bounding box, `None` for an empty ring.
pub fn ring_bounds(ring: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = ring.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in ring.iter().skip(1) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}

/// Check whether two bounding boxes overlap.
pub fn bounds_overlap(
    a_min: &Point2<f64>,
    a_max: &Point2<f64>,
    b_min: &Point2<f64>,
    b_max: &Point2<f64>,
) -> bool {
    a_min.x <= b_max.x && a_max.x >= b_min.x && a_min.y <= b_max.y && a_max.y >= b_min.y
}
