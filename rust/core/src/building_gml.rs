// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! INSPIRE Buildings Extended 2D (bu-ext2d 2.0) document writer.
//!
//! One Building per document, following the template validated by the
//! island planning office: envelope, lifespan/condition, inspireId, a
//! Surface geometry with one PolygonPatch per part, fixed 0.1 m horizontal
//! accuracy, footprint reference geometry, and a minimum of one floor.
//!
//! Unlike the parcel writer, ring geometry is normalized here before
//! emission: coordinates rounded to 2 decimals, consecutive duplicates
//! dropped, explicit closure, exterior counter-clockwise and holes
//! clockwise per ISO 19107.

use crate::crs::Crs;
use crate::error::Result;
use crate::model::{sanitize_cadastral_name, Parcel};
use parcel_lite_geometry::{dedup_consecutive, ensure_ccw, ensure_cw, ring_bounds, Point2, Ring};
use std::fmt::Write;

const SCHEMA_LOCATION_BU: &str = "http://inspire.jrc.ec.europa.eu/schemas/bu-ext2d/2.0 http://inspire.ec.europa.eu/draft-schemas/bu-ext2d/2.0/BuildingExtended2D.xsd";

fn round2(p: &Point2<f64>) -> Point2<f64> {
    Point2::new((p.x * 100.0).round() / 100.0, (p.y * 100.0).round() / 100.0)
}

/// Round, dedupe, close, and orient a ring. `clockwise` selects hole winding.
fn normalize_ring(ring: &[Point2<f64>], clockwise: bool) -> Ring {
    let rounded: Ring = ring.iter().map(round2).collect();
    let mut cleaned = dedup_consecutive(&rounded);
    if let (Some(&first), Some(&last)) = (cleaned.first(), cleaned.last()) {
        if first != last {
            cleaned.push(first);
        }
    }
    if cleaned.len() < 4 {
        return cleaned;
    }
    if clockwise {
        ensure_cw(&cleaned)
    } else {
        ensure_ccw(&cleaned)
    }
}

fn pos_list(ring: &[Point2<f64>]) -> String {
    let mut out = String::with_capacity(ring.len() * 16);
    for (i, p) in ring.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:.2} {:.2}", p.x, p.y);
    }
    out
}

/// Serialize one building footprint as a bu-ext2d FeatureCollection.
/// `timestamp` is the generation instant (`%Y-%m-%dT%H:%M:%SZ`).
pub fn write_building_gml(parcel: &Parcel, crs: Crs, timestamp: &str) -> Result<String> {
    parcel.geometry.validate()?;

    let namespace_prefix = if parcel.cadastral_reference.is_some() {
        "ES.SDGC"
    } else {
        "ES.LOCAL"
    };
    let ns_bu = format!("{namespace_prefix}.BU");
    let local_id = match &parcel.cadastral_reference {
        Some(reference) => sanitize_cadastral_name(reference),
        None => sanitize_cadastral_name(&parcel.id),
    };
    let full_id = format!("{ns_bu}.{local_id}");
    let srs_name = crs.urn();

    let exterior = normalize_ring(&parcel.geometry.exterior, false);
    let holes: Vec<Ring> = parcel
        .geometry
        .holes
        .iter()
        .map(|h| normalize_ring(h, true))
        .collect();

    let (min, max) =
        ring_bounds(&exterior).unwrap_or((Point2::new(0.0, 0.0), Point2::new(0.0, 0.0)));

    let mut gml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gml:FeatureCollection xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:base="urn:x-inspire:specification:gmlas:BaseTypes:3.2" xmlns:bu-base="http://inspire.jrc.ec.europa.eu/schemas/bu-base/3.0" xmlns:bu-core2d="http://inspire.jrc.ec.europa.eu/schemas/bu-core2d/2.0" xmlns:bu-ext2d="http://inspire.jrc.ec.europa.eu/schemas/bu-ext2d/2.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" gml:id="{ns_bu}" xsi:schemaLocation="{SCHEMA_LOCATION_BU}">
  <gml:featureMember>
    <bu-ext2d:Building gml:id="{full_id}">
      <gml:boundedBy>
        <gml:Envelope srsName="{srs_name}">
          <gml:lowerCorner>{min_x:.2} {min_y:.2}</gml:lowerCorner>
          <gml:upperCorner>{max_x:.2} {max_y:.2}</gml:upperCorner>
        </gml:Envelope>
      </gml:boundedBy>
      <bu-core2d:beginLifespanVersion>{timestamp}</bu-core2d:beginLifespanVersion>
      <bu-core2d:conditionOfConstruction>functional</bu-core2d:conditionOfConstruction>
      <bu-core2d:inspireId>
        <base:Identifier>
          <base:localId>{local_id}</base:localId>
          <base:namespace>{ns_bu}</base:namespace>
        </base:Identifier>
      </bu-core2d:inspireId>
      <bu-ext2d:geometry>
        <bu-core2d:BuildingGeometry>
          <bu-core2d:geometry>
            <gml:Surface gml:id="Surface_{local_id}" srsName="{srs_name}">
              <gml:patches>
                <gml:PolygonPatch>
                  <gml:exterior>
                    <gml:LinearRing>
                      <gml:posList srsDimension="2">{exterior_coords}</gml:posList>
                    </gml:LinearRing>
                  </gml:exterior>"#,
        min_x = min.x,
        min_y = min.y,
        max_x = max.x,
        max_y = max.y,
        exterior_coords = pos_list(&exterior),
    );

    for hole in &holes {
        let _ = write!(
            gml,
            r#"
                  <gml:interior>
                    <gml:LinearRing>
                      <gml:posList srsDimension="2">{}</gml:posList>
                    </gml:LinearRing>
                  </gml:interior>"#,
            pos_list(hole),
        );
    }

    let _ = write!(
        gml,
        r#"
                </gml:PolygonPatch>
              </gml:patches>
            </gml:Surface>
          </bu-core2d:geometry>
          <bu-core2d:horizontalGeometryEstimatedAccuracy uom="m">0.1</bu-core2d:horizontalGeometryEstimatedAccuracy>
          <bu-core2d:horizontalGeometryReference>footPrint</bu-core2d:horizontalGeometryReference>
          <bu-core2d:referenceGeometry>true</bu-core2d:referenceGeometry>
        </bu-core2d:BuildingGeometry>
      </bu-ext2d:geometry>
      <bu-ext2d:numberOfFloorsAboveGround>1</bu-ext2d:numberOfFloorsAboveGround>
    </bu-ext2d:Building>
  </gml:featureMember>
</gml:FeatureCollection>"#
    );

    Ok(gml)
}
