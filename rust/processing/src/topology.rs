// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cross-layer topology validation and intra-set conflict marking.
//!
//! Findings are review material, not errors: serialization never blocks on
//! them. Areas are planar; tolerances suppress the float-precision slivers
//! that adjacent-but-not-overlapping boundaries produce.

use parcel_lite_core::{Layer, Parcel};
use parcel_lite_geometry::{bounds_overlap, contains, intersection, ring_bounds, Polygon2D};

/// Minimum overlap area (m²) for a cross-layer finding. Anything smaller is
/// treated as shared-edge noise.
pub const MIN_OVERLAP_AREA: f64 = 0.5;

/// Minimum overlap area (m²) for flagging a conflict inside one feature set.
pub const MIN_CONFLICT_AREA: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Overlap,
}

/// One detected overlap between two layers.
#[derive(Debug, Clone)]
pub struct TopologyIssue {
    pub kind: IssueKind,
    pub layer_a: String,
    pub layer_b: String,
    /// The overlap region itself, one polygon per connected piece.
    pub geometry: Vec<Polygon2D>,
    /// Planar overlap area in m².
    pub area: f64,
    pub message: String,
}

/// Detect overlaps between features of different layers.
///
/// No-op below two layers. Every unordered pair of layers is compared, every
/// cross-layer pair of polygons intersected; overlaps above
/// [`MIN_OVERLAP_AREA`] become one issue each. O(L² · Fa · Fb), fine for a
/// handful of uploaded files.
pub fn validate_topology(layers: &[Layer]) -> Vec<TopologyIssue> {
    let mut issues = Vec::new();
    if layers.len() < 2 {
        return issues;
    }

    for i in 0..layers.len() {
        for j in i + 1..layers.len() {
            let layer_a = &layers[i];
            let layer_b = &layers[j];

            for a in &layer_a.parcels {
                for b in &layer_b.parcels {
                    let pieces = intersection(&a.geometry, &b.geometry);
                    let area: f64 = pieces.iter().map(Polygon2D::planar_area).sum();
                    if area > MIN_OVERLAP_AREA {
                        issues.push(TopologyIssue {
                            kind: IssueKind::Overlap,
                            layer_a: layer_a.name.clone(),
                            layer_b: layer_b.name.clone(),
                            message: format!(
                                "overlap between {} and {} ({:.2} m²)",
                                layer_a.name, layer_b.name, area
                            ),
                            geometry: pieces,
                            area,
                        });
                    }
                }
            }
        }
    }

    tracing::debug!(layers = layers.len(), issues = issues.len(), "topology validated");
    issues
}

/// Flag partial overlaps inside one feature set.
///
/// Containment is legitimate nesting (a hole candidate) and hole features
/// never conflict; everything else overlapping by more than
/// [`MIN_CONFLICT_AREA`] marks both parcels.
pub fn mark_conflicts(parcels: &mut [Parcel]) {
    for i in 0..parcels.len() {
        if parcels[i].is_hole {
            continue;
        }
        for j in i + 1..parcels.len() {
            if parcels[j].is_hole {
                continue;
            }
            let (a, b) = (&parcels[i].geometry, &parcels[j].geometry);
            // Cheap reject before the boolean kernel runs.
            match (ring_bounds(&a.exterior), ring_bounds(&b.exterior)) {
                (Some((a_min, a_max)), Some((b_min, b_max)))
                    if bounds_overlap(&a_min, &a_max, &b_min, &b_max) => {}
                _ => continue,
            }
            let overlap: f64 = intersection(a, b).iter().map(Polygon2D::planar_area).sum();
            if overlap > MIN_CONFLICT_AREA && !contains(a, b) && !contains(b, a) {
                tracing::warn!(
                    a = %parcels[i].id,
                    b = %parcels[j].id,
                    area = overlap,
                    "conflict between parcels"
                );
                parcels[i].has_conflict = true;
                parcels[j].has_conflict = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use parcel_lite_geometry::Point2;

    fn square_parcel(id: &str, x: f64, y: f64, size: f64) -> Parcel {
        Parcel::new(
            id,
            Polygon2D::new(vec![
                Point2::new(x, y),
                Point2::new(x + size, y),
                Point2::new(x + size, y + size),
                Point2::new(x, y + size),
            ]),
        )
    }

    fn layer(name: &str, parcels: Vec<Parcel>) -> Layer {
        Layer::new(name, parcels)
    }

    #[test]
    fn single_layer_is_a_no_op() {
        let layers = vec![layer("a", vec![square_parcel("p", 0.0, 0.0, 10.0)])];
        assert!(validate_topology(&layers).is_empty());
    }

    #[test]
    fn disjoint_layers_produce_no_issues() {
        let layers = vec![
            layer("a", vec![square_parcel("p", 0.0, 0.0, 10.0)]),
            layer("b", vec![square_parcel("q", 100.0, 100.0, 10.0)]),
        ];
        assert!(validate_topology(&layers).is_empty());
    }

    #[test]
    fn known_overlap_is_reported_once_with_its_area() {
        let layers = vec![
            layer("a", vec![square_parcel("p", 0.0, 0.0, 10.0)]),
            layer("b", vec![square_parcel("q", 5.0, 5.0, 10.0)]),
        ];
        let issues = validate_topology(&layers);
        assert_eq!(issues.len(), 1);
        assert_relative_eq!(issues[0].area, 25.0, epsilon = 1e-6);
        assert_eq!(issues[0].layer_a, "a");
        assert_eq!(issues[0].layer_b, "b");
        assert!(issues[0].message.contains("25.00"));
    }

    #[test]
    fn shared_edge_stays_below_tolerance() {
        let layers = vec![
            layer("a", vec![square_parcel("p", 0.0, 0.0, 10.0)]),
            layer("b", vec![square_parcel("q", 10.0, 0.0, 10.0)]),
        ];
        assert!(validate_topology(&layers).is_empty());
    }

    #[test]
    fn three_layers_compare_all_pairs() {
        let overlapping = vec![
            layer("a", vec![square_parcel("p", 0.0, 0.0, 10.0)]),
            layer("b", vec![square_parcel("q", 5.0, 0.0, 10.0)]),
            layer("c", vec![square_parcel("r", 0.0, 5.0, 10.0)]),
        ];
        let issues = validate_topology(&overlapping);
        // a-b, a-c, and b-c all overlap.
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn partial_overlap_marks_both_parcels() {
        let mut parcels = vec![
            square_parcel("p", 0.0, 0.0, 10.0),
            square_parcel("q", 5.0, 5.0, 10.0),
            square_parcel("far", 100.0, 100.0, 10.0),
        ];
        mark_conflicts(&mut parcels);
        assert!(parcels[0].has_conflict);
        assert!(parcels[1].has_conflict);
        assert!(!parcels[2].has_conflict);
    }

    #[test]
    fn containment_is_not_a_conflict() {
        let mut parcels = vec![
            square_parcel("outer", 0.0, 0.0, 20.0),
            square_parcel("inner", 5.0, 5.0, 5.0),
        ];
        mark_conflicts(&mut parcels);
        assert!(!parcels[0].has_conflict);
        assert!(!parcels[1].has_conflict);
    }

    #[test]
    fn hole_features_are_exempt() {
        let mut parcels = vec![
            square_parcel("p", 0.0, 0.0, 10.0),
            square_parcel("void", 5.0, 5.0, 10.0),
        ];
        parcels[1].is_hole = true;
        mark_conflicts(&mut parcels);
        assert!(!parcels[0].has_conflict);
    }
}
