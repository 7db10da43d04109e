// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASCII DXF reader for cadastral drawings.
//!
//! Scans the ENTITIES section for LINE, LWPOLYLINE and POLYLINE geometry and
//! TEXT/MTEXT labels, grouped by layer. Each layer's edges go through the
//! fragment stitcher, and the resulting rings through exterior/hole
//! classification. Layer selection follows the issuing authority's drawing
//! convention: "PG-LP" carries parcel boundaries and "PG-LI" interior
//! divisions; drawings that use neither fall back through a list of common
//! layer names and finally to any populated layer.

use crate::error::{Error, Result};
use crate::model::{is_cadastral_reference, Parcel};
use parcel_lite_geometry::{
    classify_indexed, close_ring, point_in_ring, ring_bounds, stitch, Point2, Polygon2D, Ring,
    Segment, DEFAULT_STITCH_TOLERANCE,
};
use rustc_hash::FxHashSet;

const FORMAT: &str = "DXF";

/// Layer holding parcel boundary geometry in authority-issued drawings.
pub const EXTERIOR_LAYER: &str = "PG-LP";
/// Layer holding interior division / hole geometry.
pub const INTERIOR_LAYER: &str = "PG-LI";
/// Conventional layer names tried, in order, when the exterior layer is empty.
pub const FALLBACK_LAYERS: [&str; 6] =
    ["0", "RECINTO", "PARCELA", "CATASTRO", "RECINTOS", "POLIGONO"];
/// AutoCAD's dimension-definition layer; never geometry.
const SKIPPED_LAYER: &str = "Defpoints";

#[derive(Debug)]
struct CurveEntity {
    layer: String,
    vertices: Vec<Point2<f64>>,
    closed: bool,
    is_line: bool,
}

#[derive(Debug)]
struct TextEntity {
    insert: Point2<f64>,
    text: String,
}

#[derive(Debug, Default)]
struct Document {
    curves: Vec<CurveEntity>,
    texts: Vec<TextEntity>,
    /// Layer names in entity encounter order; keeps fallback selection
    /// deterministic.
    layer_order: Vec<String>,
}

fn parse_f64(format_value: &str) -> Option<f64> {
    lexical_core::parse::<f64>(format_value.trim().as_bytes()).ok()
}

/// Split the file into (group code, value) pairs.
fn read_pairs(text: &str) -> Result<Vec<(i32, &str)>> {
    let mut pairs = Vec::new();
    let mut lines = text.lines();
    while let Some(code_line) = lines.next() {
        let Some(value_line) = lines.next() else {
            return Err(Error::malformed(FORMAT, "truncated group code pair"));
        };
        let code: i32 = code_line
            .trim()
            .parse()
            .map_err(|_| Error::malformed(FORMAT, format!("invalid group code {code_line:?}")))?;
        pairs.push((code, value_line.trim()));
    }
    Ok(pairs)
}

fn parse_document(text: &str) -> Result<Document> {
    let pairs = read_pairs(text)?;

    let mut doc = Document::default();
    let mut seen_layers: FxHashSet<String> = FxHashSet::default();
    let mut in_entities = false;
    let mut saw_entities_section = false;

    let mut i = 0;
    while i < pairs.len() {
        let (code, value) = pairs[i];
        if code != 0 {
            i += 1;
            continue;
        }
        match value {
            "SECTION" => {
                if let Some(&(2, name)) = pairs.get(i + 1) {
                    in_entities = name == "ENTITIES";
                    saw_entities_section |= in_entities;
                }
                i += 1;
            }
            "ENDSEC" => {
                in_entities = false;
                i += 1;
            }
            _ if in_entities => {
                i = parse_entity(&pairs, i, &mut doc, &mut seen_layers);
            }
            _ => i += 1,
        }
    }

    if !saw_entities_section {
        return Err(Error::malformed(FORMAT, "no ENTITIES section"));
    }

    tracing::debug!(
        curves = doc.curves.len(),
        texts = doc.texts.len(),
        layers = doc.layer_order.len(),
        "parsed DXF entity table"
    );

    Ok(doc)
}

/// Consume one entity starting at the 0-code pair `start`; returns the index
/// of the next unconsumed pair.
fn parse_entity(
    pairs: &[(i32, &str)],
    start: usize,
    doc: &mut Document,
    seen_layers: &mut FxHashSet<String>,
) -> usize {
    let kind = pairs[start].1;
    let mut layer = String::from("0");
    let mut vertices: Vec<Point2<f64>> = Vec::new();
    let mut pending_x: Option<f64> = None;
    let mut line_end: (Option<f64>, Option<f64>) = (None, None);
    let mut closed = false;
    let mut text = String::new();

    let mut i = start + 1;
    while i < pairs.len() && pairs[i].0 != 0 {
        let (code, value) = pairs[i];
        match code {
            8 => layer = value.to_string(),
            10 => pending_x = parse_f64(value),
            20 => {
                if let (Some(x), Some(y)) = (pending_x.take(), parse_f64(value)) {
                    vertices.push(Point2::new(x, y));
                }
            }
            11 => line_end.0 = parse_f64(value),
            21 => line_end.1 = parse_f64(value),
            70 => {
                if let Ok(flags) = value.trim().parse::<i32>() {
                    closed = flags & 1 != 0;
                }
            }
            1 => {
                if !value.is_empty() {
                    text = value.to_string();
                }
            }
            _ => {}
        }
        i += 1;
    }

    match kind {
        "LINE" => {
            if let ((Some(ex), Some(ey)), Some(&start_pt)) = (line_end, vertices.first()) {
                register_layer(seen_layers, &mut doc.layer_order, &layer);
                doc.curves.push(CurveEntity {
                    layer,
                    vertices: vec![start_pt, Point2::new(ex, ey)],
                    closed: false,
                    is_line: true,
                });
            }
        }
        "LWPOLYLINE" => {
            register_layer(seen_layers, &mut doc.layer_order, &layer);
            doc.curves.push(CurveEntity {
                layer,
                vertices,
                closed,
                is_line: false,
            });
        }
        "POLYLINE" => {
            // Legacy polylines carry their vertices as separate VERTEX
            // entities terminated by SEQEND.
            let mut poly_vertices: Vec<Point2<f64>> = Vec::new();
            while i < pairs.len() {
                let (_, entity_name) = pairs[i];
                if entity_name == "SEQEND" {
                    // Skip SEQEND body.
                    i += 1;
                    while i < pairs.len() && pairs[i].0 != 0 {
                        i += 1;
                    }
                    break;
                }
                if entity_name != "VERTEX" {
                    break;
                }
                let mut vx: Option<f64> = None;
                let mut vy: Option<f64> = None;
                i += 1;
                while i < pairs.len() && pairs[i].0 != 0 {
                    match pairs[i].0 {
                        10 => vx = parse_f64(pairs[i].1),
                        20 => vy = parse_f64(pairs[i].1),
                        _ => {}
                    }
                    i += 1;
                }
                if let (Some(x), Some(y)) = (vx, vy) {
                    poly_vertices.push(Point2::new(x, y));
                }
            }
            register_layer(seen_layers, &mut doc.layer_order, &layer);
            doc.curves.push(CurveEntity {
                layer,
                vertices: poly_vertices,
                closed,
                is_line: false,
            });
        }
        "TEXT" | "MTEXT" => {
            if let (Some(&insert), false) = (vertices.first(), text.is_empty()) {
                doc.texts.push(TextEntity { insert, text });
            }
        }
        _ => {}
    }

    i
}

fn register_layer(seen: &mut FxHashSet<String>, order: &mut Vec<String>, layer: &str) {
    if seen.insert(layer.to_string()) {
        order.push(layer.to_string());
    }
}

/// Break every curve on `layer` into straight segments. Closed polylines get
/// an extra edge back to their first vertex.
fn segments_for_layer(doc: &Document, layer: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for curve in doc.curves.iter().filter(|c| c.layer == layer) {
        if curve.is_line {
            segments.push(Segment::new(curve.vertices[0], curve.vertices[1]));
            continue;
        }
        if curve.vertices.len() < 2 {
            continue;
        }
        for w in curve.vertices.windows(2) {
            segments.push(Segment::new(w[0], w[1]));
        }
        if curve.closed {
            segments.push(Segment::new(
                curve.vertices[curve.vertices.len() - 1],
                curve.vertices[0],
            ));
        }
    }
    segments
}

fn stitch_layer(doc: &Document, layer: &str) -> Vec<Ring> {
    stitch(segments_for_layer(doc, layer), DEFAULT_STITCH_TOLERANCE)
}

/// Read a cadastral drawing into classified parcels.
///
/// A base name matching the cadastral-reference pattern seeds the reference
/// on every resulting parcel; a TEXT/MTEXT label landing inside a boundary
/// overrides id and reference for that parcel.
pub fn read_dxf(text: &str, base_name: &str) -> Result<Vec<Parcel>> {
    let doc = parse_document(text)?;
    if doc.curves.is_empty() {
        return Err(Error::empty(FORMAT));
    }

    let mut exterior_layer = EXTERIOR_LAYER.to_string();
    let mut outer_rings = stitch_layer(&doc, EXTERIOR_LAYER);
    let inner_rings = stitch_layer(&doc, INTERIOR_LAYER);

    if outer_rings.is_empty() {
        for layer in FALLBACK_LAYERS {
            let found = stitch_layer(&doc, layer);
            if !found.is_empty() {
                tracing::warn!(layer, "boundary layer empty, using fallback layer");
                exterior_layer = layer.to_string();
                outer_rings = found;
                break;
            }
        }
    }

    if outer_rings.is_empty() {
        for layer in &doc.layer_order {
            if layer == SKIPPED_LAYER {
                continue;
            }
            let found = stitch_layer(&doc, layer);
            if !found.is_empty() {
                tracing::warn!(layer = %layer, "using first populated layer");
                exterior_layer = layer.clone();
                outer_rings = found;
                break;
            }
        }
    }

    if outer_rings.is_empty() && inner_rings.is_empty() {
        return Err(Error::empty(FORMAT));
    }

    // Union of boundary and division rings, each explicitly closed, with the
    // source layer carried alongside for provenance.
    let mut rings: Vec<Ring> = Vec::with_capacity(outer_rings.len() + inner_rings.len());
    let mut ring_layer: Vec<&str> = Vec::with_capacity(rings.capacity());
    for mut ring in outer_rings {
        close_ring(&mut ring);
        rings.push(ring);
        ring_layer.push(&exterior_layer);
    }
    for mut ring in inner_rings {
        close_ring(&mut ring);
        rings.push(ring);
        ring_layer.push(INTERIOR_LAYER);
    }

    let groups = classify_indexed(&rings);

    let seed_reference = {
        let clean = base_name.trim().to_ascii_uppercase();
        is_cadastral_reference(&clean).then_some(clean)
    };

    let single = groups.len() == 1;
    let mut parcels = Vec::with_capacity(groups.len());
    for (idx, group) in groups.iter().enumerate() {
        let mut polygon = Polygon2D::new(rings[group.exterior].clone());
        for &h in &group.holes {
            polygon.add_hole(rings[h].clone());
        }

        let id = if single {
            base_name.to_string()
        } else {
            format!("{base_name}_{}", idx + 1)
        };
        let mut parcel = Parcel::new(id, polygon);
        parcel.source_layer = Some(ring_layer[group.exterior].to_string());
        parcel.cadastral_reference = seed_reference.clone();
        if let Some(ref rc) = parcel.cadastral_reference {
            parcel.id = if single {
                rc.clone()
            } else {
                format!("{rc}_{}", idx + 1)
            };
        }
        apply_text_label(&mut parcel, &doc.texts);
        parcels.push(parcel);
    }

    tracing::debug!(parcels = parcels.len(), "DXF classification complete");
    Ok(parcels)
}

/// First text landing inside the parcel names it: references get the RC
/// treatment, anything else becomes a plain id.
fn apply_text_label(parcel: &mut Parcel, texts: &[TextEntity]) {
    let Some((min, max)) = ring_bounds(&parcel.geometry.exterior) else {
        return;
    };
    for t in texts {
        let p = &t.insert;
        if p.x < min.x || p.x > max.x || p.y < min.y || p.y > max.y {
            continue;
        }
        if !point_in_ring(p, &parcel.geometry.exterior) {
            continue;
        }
        let clean = t.text.replace(' ', "").to_ascii_uppercase();
        if is_cadastral_reference(&clean) {
            parcel.id = clean.clone();
            parcel.cadastral_reference = Some(clean);
        } else {
            parcel.id = crate::model::sanitize_id(t.text.trim());
        }
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(code: i32, value: &str) -> String {
        format!("{code}\n{value}\n")
    }

    fn dxf_with_entities(entities: &str) -> String {
        let mut out = String::new();
        out.push_str(&pair(0, "SECTION"));
        out.push_str(&pair(2, "ENTITIES"));
        out.push_str(entities);
        out.push_str(&pair(0, "ENDSEC"));
        out.push_str(&pair(0, "EOF"));
        out
    }

    fn line(layer: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> String {
        let mut e = String::new();
        e.push_str(&pair(0, "LINE"));
        e.push_str(&pair(8, layer));
        e.push_str(&pair(10, &x0.to_string()));
        e.push_str(&pair(20, &y0.to_string()));
        e.push_str(&pair(11, &x1.to_string()));
        e.push_str(&pair(21, &y1.to_string()));
        e
    }

    fn lwpolyline(layer: &str, points: &[(f64, f64)], closed: bool) -> String {
        let mut e = String::new();
        e.push_str(&pair(0, "LWPOLYLINE"));
        e.push_str(&pair(8, layer));
        e.push_str(&pair(90, &points.len().to_string()));
        e.push_str(&pair(70, if closed { "1" } else { "0" }));
        for (x, y) in points {
            e.push_str(&pair(10, &x.to_string()));
            e.push_str(&pair(20, &y.to_string()));
        }
        e
    }

    #[test]
    fn triangle_stitched_from_lines_and_open_polyline() {
        let entities = format!(
            "{}{}{}",
            line(EXTERIOR_LAYER, 0.0, 0.0, 10.0, 0.0),
            line(EXTERIOR_LAYER, 10.0, 0.0, 5.0, 10.0),
            lwpolyline(EXTERIOR_LAYER, &[(5.0, 10.0), (0.0, 0.0)], false),
        );
        let parcels = read_dxf(&dxf_with_entities(&entities), "TRIANGULO").unwrap();
        assert_eq!(parcels.len(), 1);
        // 3 distinct vertices plus explicit closure.
        assert_eq!(parcels[0].geometry.exterior.len(), 4);
        assert_eq!(parcels[0].area, 50.0);
    }

    #[test]
    fn interior_layer_becomes_hole() {
        let entities = format!(
            "{}{}",
            lwpolyline(
                EXTERIOR_LAYER,
                &[(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)],
                true
            ),
            lwpolyline(
                INTERIOR_LAYER,
                &[(5.0, 5.0), (10.0, 5.0), (10.0, 10.0), (5.0, 10.0)],
                true
            ),
        );
        let parcels = read_dxf(&dxf_with_entities(&entities), "FINCA").unwrap();
        assert_eq!(parcels.len(), 1);
        let p = &parcels[0];
        assert_eq!(p.geometry.holes.len(), 1);
        assert_eq!(p.area, 375.0);
        assert_eq!(p.source_layer.as_deref(), Some(EXTERIOR_LAYER));
        assert_eq!(p.id, "FINCA");
    }

    #[test]
    fn fallback_layers_tried_in_priority_order() {
        let entities = format!(
            "{}{}",
            lwpolyline("CROQUIS", &[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)], true),
            lwpolyline("RECINTO", &[(0.0, 0.0), (8.0, 0.0), (8.0, 8.0), (0.0, 8.0)], true),
        );
        let parcels = read_dxf(&dxf_with_entities(&entities), "F").unwrap();
        // RECINTO is in the fallback list, CROQUIS is not; RECINTO wins even
        // though CROQUIS appears first.
        assert_eq!(parcels[0].source_layer.as_deref(), Some("RECINTO"));
    }

    #[test]
    fn any_populated_layer_is_last_resort() {
        let entities = lwpolyline("CROQUIS", &[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)], true);
        let parcels = read_dxf(&dxf_with_entities(&entities), "F").unwrap();
        assert_eq!(parcels[0].source_layer.as_deref(), Some("CROQUIS"));
    }

    #[test]
    fn multiple_parcels_get_numbered_ids() {
        let entities = format!(
            "{}{}",
            lwpolyline(
                EXTERIOR_LAYER,
                &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
                true
            ),
            lwpolyline(
                EXTERIOR_LAYER,
                &[(50.0, 0.0), (55.0, 0.0), (55.0, 5.0), (50.0, 5.0)],
                true
            ),
        );
        let parcels = read_dxf(&dxf_with_entities(&entities), "POLIGONO7").unwrap();
        assert_eq!(parcels.len(), 2);
        // Numbered in descending-area order.
        assert_eq!(parcels[0].id, "POLIGONO7_1");
        assert_eq!(parcels[1].id, "POLIGONO7_2");
        assert!(parcels[0].area > parcels[1].area);
    }

    #[test]
    fn text_label_inside_parcel_sets_reference() {
        let mut entities = lwpolyline(
            EXTERIOR_LAYER,
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            true,
        );
        entities.push_str(&pair(0, "TEXT"));
        entities.push_str(&pair(8, "PG-TX"));
        entities.push_str(&pair(10, "5.0"));
        entities.push_str(&pair(20, "5.0"));
        entities.push_str(&pair(1, "9872023VH5797S"));
        let parcels = read_dxf(&dxf_with_entities(&entities), "F").unwrap();
        assert_eq!(parcels[0].cadastral_reference.as_deref(), Some("9872023VH5797S"));
        assert_eq!(parcels[0].id, "9872023VH5797S");
    }

    #[test]
    fn reference_shaped_base_name_seeds_reference() {
        let entities = lwpolyline(
            EXTERIOR_LAYER,
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            true,
        );
        let parcels = read_dxf(&dxf_with_entities(&entities), "9872023vh5797s").unwrap();
        assert_eq!(parcels[0].cadastral_reference.as_deref(), Some("9872023VH5797S"));
    }

    #[test]
    fn legacy_polyline_with_vertex_entities() {
        let mut e = String::new();
        e.push_str(&pair(0, "POLYLINE"));
        e.push_str(&pair(8, EXTERIOR_LAYER));
        e.push_str(&pair(70, "1"));
        for (x, y) in [(0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0)] {
            e.push_str(&pair(0, "VERTEX"));
            e.push_str(&pair(8, EXTERIOR_LAYER));
            e.push_str(&pair(10, &x.to_string()));
            e.push_str(&pair(20, &y.to_string()));
        }
        e.push_str(&pair(0, "SEQEND"));
        let parcels = read_dxf(&dxf_with_entities(&e), "VIEJA").unwrap();
        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].area, 36.0);
    }

    #[test]
    fn truncated_pair_is_malformed() {
        let err = read_dxf("0\nSECTION\n2", "F").unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn non_numeric_group_code_is_malformed() {
        let err = read_dxf("SECTION\n0\n", "F").unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn no_entities_section_is_malformed() {
        let err = read_dxf("0\nSECTION\n2\nHEADER\n0\nENDSEC\n0\nEOF\n", "F").unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn entities_without_geometry_is_empty() {
        let entities = lwpolyline(EXTERIOR_LAYER, &[(0.0, 0.0), (1.0, 0.0)], false);
        let err = read_dxf(&dxf_with_entities(&entities), "F").unwrap_err();
        assert!(err.is_empty_geometry());
    }
}
