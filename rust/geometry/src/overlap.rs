// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar polygon intersection via the i_overlay boolean kernel.
//!
//! Used by the topology validator to measure cross-layer overlaps. Areas are
//! planar shoelace sums of the intersection contours; adjacency along shared
//! edges produces zero-or-epsilon areas that callers filter with their own
//! tolerance.

use crate::ring::{ensure_ccw, ensure_cw, point_in_ring, Polygon2D};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Convert a polygon to i_overlay path format: exterior CCW, holes CW.
fn polygon_to_paths(poly: &Polygon2D) -> Vec<Vec<[f64; 2]>> {
    let mut paths = Vec::with_capacity(1 + poly.holes.len());
    paths.push(ring_to_path(&ensure_ccw(&poly.exterior)));
    for hole in &poly.holes {
        paths.push(ring_to_path(&ensure_cw(hole)));
    }
    paths
}

fn ring_to_path(ring: &[Point2<f64>]) -> Vec<[f64; 2]> {
    ring.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_ring(path: &[[f64; 2]]) -> Vec<Point2<f64>> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

/// Planar intersection of two polygons-with-holes. Each returned shape is one
/// connected piece of the overlap region.
pub fn intersection(a: &Polygon2D, b: &Polygon2D) -> Vec<Polygon2D> {
    let subject = polygon_to_paths(a);
    let clip = polygon_to_paths(b);

    let shapes = subject.overlay(&clip, OverlayRule::Intersect, FillRule::EvenOdd);

    let mut result = Vec::new();
    for shape in shapes {
        let mut contours = shape.iter();
        let Some(outer) = contours.next() else {
            continue;
        };
        let exterior = path_to_ring(outer);
        if exterior.len() < 3 {
            continue;
        }
        let mut poly = Polygon2D::new(exterior);
        for contour in contours {
            let hole = path_to_ring(contour);
            if hole.len() >= 3 {
                poly.add_hole(hole);
            }
        }
        result.push(poly);
    }
    result
}

/// Planar area of the intersection of two polygons. Zero when they are
/// disjoint or merely share an edge.
pub fn intersection_area(a: &Polygon2D, b: &Polygon2D) -> f64 {
    intersection(a, b).iter().map(Polygon2D::planar_area).sum()
}

/// Vertex-level containment: every exterior vertex of `inner` lies inside the
/// exterior of `outer`. Consistent with the ray-casting approach used by ring
/// classification; not an exact polygon-containment predicate on touching
/// boundaries.
pub fn contains(outer: &Polygon2D, inner: &Polygon2D) -> bool {
    !inner.exterior.is_empty()
        && inner
            .exterior
            .iter()
            .all(|p| point_in_ring(p, &outer.exterior))
}
