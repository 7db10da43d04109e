// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ring nesting: exterior/hole resolution across a set of closed rings.
//!
//! A single greedy pass over rings sorted by descending absolute area: the
//! largest unconsumed ring becomes an exterior, and every later unconsumed
//! ring whose first vertex ray-casts inside it is claimed as one of its
//! holes. This assumes properly nested, non-overlapping input and does NOT
//! resolve islands inside holes; rings at that third nesting level are
//! claimed by the outermost container. Replacing this with a full
//! containment-tree build is the known upgrade path if multi-level topology
//! ever becomes a requirement.

use crate::ring::{point_in_ring, signed_area, Polygon2D, Ring};

/// Index-level classification result: positions into the caller's ring slice.
/// Lets callers carry per-ring metadata (source layer, entity handle) through
/// nesting without threading it into the geometry pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nesting {
    pub exterior: usize,
    pub holes: Vec<usize>,
}

/// Classify rings into exterior/hole groups, returning indices into `rings`.
/// Groups come out sorted by descending exterior area.
pub fn classify_indexed(rings: &[Ring]) -> Vec<Nesting> {
    let mut order: Vec<usize> = (0..rings.len()).collect();
    order.sort_by(|&a, &b| {
        signed_area(&rings[b])
            .abs()
            .total_cmp(&signed_area(&rings[a]).abs())
    });

    let mut consumed = vec![false; rings.len()];
    let mut groups = Vec::new();

    for (pos, &i) in order.iter().enumerate() {
        if consumed[i] {
            continue;
        }
        consumed[i] = true;

        let mut holes = Vec::new();
        for &j in &order[pos + 1..] {
            if consumed[j] {
                continue;
            }
            let Some(first) = rings[j].first() else {
                continue;
            };
            if point_in_ring(first, &rings[i]) {
                holes.push(j);
                consumed[j] = true;
            }
        }

        groups.push(Nesting { exterior: i, holes });
    }

    groups
}

/// Convenience wrapper: classify and materialize the polygons.
pub fn classify(rings: Vec<Ring>) -> Vec<Polygon2D> {
    let groups = classify_indexed(&rings);
    groups
        .into_iter()
        .map(|g| Polygon2D {
            exterior: rings[g.exterior].clone(),
            holes: g.holes.iter().map(|&j| rings[j].clone()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn square(x: f64, y: f64, size: f64) -> Ring {
        vec![
            Point2::new(x, y),
            Point2::new(x + size, y),
            Point2::new(x + size, y + size),
            Point2::new(x, y + size),
        ]
    }

    #[test]
    fn hole_is_claimed_by_container() {
        let rings = vec![square(5.0, 5.0, 5.0), square(0.0, 0.0, 20.0)];
        let polys = classify(rings);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].holes.len(), 1);
        assert_eq!(polys[0].planar_area(), 400.0 - 25.0);
    }

    #[test]
    fn disjoint_rings_stay_separate() {
        let rings = vec![square(0.0, 0.0, 10.0), square(100.0, 100.0, 10.0)];
        let polys = classify(rings);
        assert_eq!(polys.len(), 2);
        assert!(polys.iter().all(|p| p.holes.is_empty()));
    }

    #[test]
    fn groups_sorted_by_descending_area() {
        let rings = vec![square(0.0, 0.0, 5.0), square(100.0, 0.0, 50.0)];
        let groups = classify_indexed(&rings);
        assert_eq!(groups[0].exterior, 1);
        assert_eq!(groups[1].exterior, 0);
    }

    #[test]
    fn nesting_property_holds() {
        let rings = vec![
            square(0.0, 0.0, 20.0),
            square(2.0, 2.0, 4.0),
            square(10.0, 10.0, 3.0),
        ];
        let groups = classify_indexed(&rings);
        assert_eq!(groups.len(), 1);
        let exterior = &rings[groups[0].exterior];
        for &h in &groups[0].holes {
            assert!(point_in_ring(&rings[h][0], exterior));
            assert!(signed_area(&rings[h]).abs() < signed_area(exterior).abs());
        }
    }

    #[test]
    fn island_in_hole_is_flattened_to_outermost() {
        // Known single-pass limitation: the innermost ring is claimed by the
        // outermost exterior, not promoted to its own feature.
        let rings = vec![
            square(0.0, 0.0, 30.0),
            square(5.0, 5.0, 20.0),
            square(10.0, 10.0, 5.0),
        ];
        let polys = classify(rings);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].holes.len(), 2);
    }
}
