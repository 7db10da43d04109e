// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adapter over shapefile-derived GeoJSON.
//!
//! Geometry extraction from the .shp/.shx/.dbf bundle is delegated to an
//! upstream shapefile-to-GeoJSON conversion; this module consumes that
//! conversion's output. Two quirks of the upstream path are handled here:
//! attribute tables name the cadastral reference column inconsistently, and
//! the converter sometimes re-projects to geographic WGS84, which is
//! detected by coordinate magnitude and undone.

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::model::Parcel;
use parcel_lite_geometry::{ensure_ccw, ensure_cw, Point2, Polygon2D, Ring};
use serde_json::Value;

const FORMAT: &str = "Shapefile";

/// Attribute-name prefixes accepted as the feature reference/label column.
const REFERENCE_KEY_PREFIXES: [&str; 5] = ["ref", "rc", "catastro", "referencia", "label"];

fn reference_property(properties: Option<&Value>) -> Option<String> {
    let map = properties?.as_object()?;
    for (key, value) in map {
        let lower = key.to_ascii_lowercase();
        if !REFERENCE_KEY_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            continue;
        }
        match value {
            Value::String(s) if !s.is_empty() => return Some(s.clone()),
            Value::Number(n) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn json_ring(value: &Value) -> Option<Ring> {
    let coords = value.as_array()?;
    let mut ring = Ring::with_capacity(coords.len());
    for pair in coords {
        let pair = pair.as_array()?;
        let x = pair.first()?.as_f64()?;
        let y = pair.get(1)?.as_f64()?;
        ring.push(Point2::new(x, y));
    }
    Some(ring)
}

/// `true` when the ring looks like geographic lon/lat rather than UTM.
fn looks_geographic(ring: &[Point2<f64>]) -> bool {
    ring.first()
        .is_some_and(|p| p.x.abs() <= 180.0 && p.y.abs() <= 90.0)
}

fn reproject_ring(ring: &mut Ring, crs: Crs) {
    for p in ring.iter_mut() {
        let (x, y) = crs.project(p.x, p.y);
        p.x = x;
        p.y = y;
    }
}

/// Read converted GeoJSON (one FeatureCollection, or an array of them for
/// multi-shapefile archives) into parcels in the working CRS.
pub fn read_shapefile_geojson(text: &str, base_name: &str, crs: Crs) -> Result<Vec<Parcel>> {
    let root: Value = serde_json::from_str(text)
        .map_err(|e| Error::malformed(FORMAT, format!("invalid GeoJSON: {e}")))?;

    let collections: Vec<&Value> = match &root {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut parcels: Vec<Parcel> = Vec::new();

    for collection in collections {
        if collection.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            continue;
        }
        let Some(features) = collection.get("features").and_then(Value::as_array) else {
            continue;
        };

        for feature in features {
            let Some(geometry) = feature.get("geometry") else {
                continue;
            };
            let geom_type = geometry.get("type").and_then(Value::as_str);
            let coordinates = geometry.get("coordinates");

            let polygons: Vec<&Value> = match (geom_type, coordinates) {
                (Some("Polygon"), Some(coords)) => vec![coords],
                (Some("MultiPolygon"), Some(coords)) => {
                    coords.as_array().map(|a| a.iter().collect()).unwrap_or_default()
                }
                _ => continue,
            };

            let reference = reference_property(feature.get("properties"));
            let multi_part = polygons.len() > 1;

            for (part_idx, poly_coords) in polygons.into_iter().enumerate() {
                let Some(ring_values) = poly_coords.as_array() else {
                    continue;
                };
                let mut rings: Vec<Ring> = Vec::with_capacity(ring_values.len());
                let mut valid = true;
                for rv in ring_values {
                    match json_ring(rv) {
                        Some(r) if r.len() >= 3 => rings.push(r),
                        _ => {
                            valid = false;
                            break;
                        }
                    }
                }
                if !valid || rings.is_empty() {
                    tracing::warn!("skipping invalid shapefile geometry");
                    continue;
                }

                // Consistent winding: exterior CCW, holes CW.
                let mut exterior = ensure_ccw(&rings[0]);
                let mut holes: Vec<Ring> =
                    rings[1..].iter().map(|r| ensure_cw(r)).collect();

                if looks_geographic(&exterior) {
                    tracing::debug!("geographic coordinates detected, re-projecting");
                    reproject_ring(&mut exterior, crs);
                    for hole in &mut holes {
                        reproject_ring(hole, crs);
                    }
                }

                let id = match &reference {
                    Some(r) if multi_part => format!("{r}.{}", part_idx + 1),
                    Some(r) => r.clone(),
                    None => format!("{base_name}_{}", parcels.len() + 1),
                };

                let mut polygon = Polygon2D::new(exterior);
                for hole in holes {
                    polygon.add_hole(hole);
                }
                let mut parcel = Parcel::new(id, polygon);
                parcel.source_file = Some(base_name.to_string());
                if let Some(r) = &reference {
                    let clean = r.replace(' ', "").to_ascii_uppercase();
                    if crate::model::is_cadastral_reference(&clean) {
                        parcel.cadastral_reference = Some(clean);
                    }
                }
                parcels.push(parcel);
            }
        }
    }

    if parcels.is_empty() {
        return Err(Error::empty(FORMAT));
    }

    tracing::debug!(parcels = parcels.len(), "shapefile GeoJSON adapted");
    Ok(parcels)
}
