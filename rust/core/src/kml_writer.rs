// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! KML export for Google Earth review.
//!
//! Parcels are re-projected from the working UTM zone to geographic WGS84
//! and colored by state: green for clean geometry, red for conflicts, blue
//! for interior voids. The description balloon carries id, area, reference
//! and flags so a surveyor can review a delivery without GIS tooling.

use crate::crs::Crs;
use crate::error::Result;
use crate::model::Parcel;
use parcel_lite_geometry::{Point2, Ring};
use std::fmt::Write;

// KML colors are aabbggrr.
const STYLE_CORRECT: (&str, &str, &str, &str) = ("parcelCorrect", "ff00ff00", "2", "6400ff00");
const STYLE_CONFLICT: (&str, &str, &str, &str) = ("parcelConflict", "ff0000ff", "3", "640000ff");
const STYLE_HOLE: (&str, &str, &str, &str) = ("parcelHole", "ffff0000", "2", "50ff0000");

fn style_block(out: &mut String, style: (&str, &str, &str, &str)) {
    let (id, line_color, width, poly_color) = style;
    let _ = write!(
        out,
        r#"
    <Style id="{id}">
      <LineStyle>
        <color>{line_color}</color>
        <width>{width}</width>
      </LineStyle>
      <PolyStyle>
        <color>{poly_color}</color>
      </PolyStyle>
    </Style>"#
    );
}

fn lonlat_coordinates(ring: &[Point2<f64>], crs: Crs) -> String {
    let mut out = String::with_capacity(ring.len() * 24);
    for (i, p) in ring.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let (lon, lat) = crs.unproject(p.x, p.y);
        let _ = write!(out, "{lon:.8},{lat:.8},0");
    }
    out
}

fn boundary(out: &mut String, tag: &str, ring: &Ring, crs: Crs) {
    let _ = write!(
        out,
        r#"
        <{tag}>
          <LinearRing>
            <coordinates>{}</coordinates>
          </LinearRing>
        </{tag}>"#,
        lonlat_coordinates(ring, crs),
    );
}

fn description(parcel: &Parcel) -> String {
    let mut html = format!(
        "<b>ID:</b> {}<br/><b>Área:</b> {:.2} m²<br/>",
        parcel.id, parcel.area
    );
    if let Some(reference) = &parcel.cadastral_reference {
        let _ = write!(html, "<b>Ref. Catastral:</b> {reference}<br/>");
    }
    if parcel.has_conflict {
        html.push_str("<b style='color:red'>⚠ CONFLICTO DETECTADO</b><br/>");
    }
    if parcel.is_hole {
        html.push_str("<b style='color:blue'>Hueco interior</b><br/>");
    }
    html
}

/// Serialize parcels as a styled KML document. Parcels without geometry are
/// skipped with a warning rather than failing the whole export.
pub fn write_kml(parcels: &[Parcel], crs: Crs) -> Result<String> {
    let mut kml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>Parcelas Catastrales</name>
    <description>Exportación de parcelas a KML</description>"#,
    );
    style_block(&mut kml, STYLE_CORRECT);
    style_block(&mut kml, STYLE_CONFLICT);
    style_block(&mut kml, STYLE_HOLE);

    for parcel in parcels {
        if parcel.geometry.exterior.is_empty() {
            tracing::warn!(id = %parcel.id, "parcel without coordinates skipped in KML export");
            continue;
        }

        let style = if parcel.has_conflict {
            STYLE_CONFLICT.0
        } else if parcel.is_hole {
            STYLE_HOLE.0
        } else {
            STYLE_CORRECT.0
        };

        let _ = write!(
            kml,
            r#"
    <Placemark>
      <name>{id}</name>
      <description><![CDATA[{description}]]></description>
      <styleUrl>#{style}</styleUrl>
      <Polygon>"#,
            id = parcel.id,
            description = description(parcel),
        );

        boundary(&mut kml, "outerBoundaryIs", &parcel.geometry.exterior, crs);
        for hole in &parcel.geometry.holes {
            boundary(&mut kml, "innerBoundaryIs", hole, crs);
        }

        kml.push_str(
            r#"
      </Polygon>
    </Placemark>"#,
        );
    }

    kml.push_str(
        r#"
  </Document>
</kml>"#,
    );
    Ok(kml)
}
