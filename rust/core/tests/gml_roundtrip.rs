// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serialize-then-parse round trips through the INSPIRE document shape.

use parcel_lite_core::{read_csv, read_gml, write_gml, Crs, Parcel};
use parcel_lite_geometry::{Point2, Polygon2D};

const TS: &str = "2025-06-01T12:00:00Z";

fn square(x: f64, y: f64, size: f64) -> Vec<Point2<f64>> {
    vec![
        Point2::new(x, y),
        Point2::new(x + size, y),
        Point2::new(x + size, y + size),
        Point2::new(x, y + size),
        Point2::new(x, y),
    ]
}

#[test]
fn feature_set_round_trips() {
    let mut with_hole = Polygon2D::new(square(0.0, 0.0, 20.0));
    with_hole.add_hole(square(5.0, 5.0, 5.0));
    let parcels = vec![
        Parcel::new("FINCA_GRANDE", with_hole),
        Parcel::new("FINCA_CHICA", Polygon2D::new(square(100.0, 100.0, 10.0))),
    ];

    let gml = write_gml(&parcels, Crs::ETRS89_UTM30, TS).unwrap();
    let back = read_gml(&gml, "roundtrip").unwrap();

    assert_eq!(back.len(), parcels.len());
    for (original, parsed) in parcels.iter().zip(&back) {
        assert_eq!(
            parsed.geometry.exterior.len(),
            original.geometry.exterior.len()
        );
        assert_eq!(parsed.geometry.holes.len(), original.geometry.holes.len());
        // Output area is integer-rounded, so equality within one unit.
        assert!((parsed.area - original.area).abs() <= 1.0);
    }
}

#[test]
fn csv_to_gml_to_features() {
    let parcels = read_csv("0,0\n10,0\n10,10\n0,10", "PARCELA_CSV").unwrap();
    assert_eq!(parcels.len(), 1);
    assert_eq!(parcels[0].geometry.exterior.len(), 5);
    assert_eq!(parcels[0].area, 100.0);

    let gml = write_gml(&parcels, Crs::ETRS89_UTM30, TS).unwrap();
    let back = read_gml(&gml, "PARCELA_CSV").unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].geometry.exterior.len(), 5);
    assert_eq!(back[0].area, 100.0);
}

#[test]
fn empty_set_round_trips_without_error() {
    let gml = write_gml(&[], Crs::ETRS89_UTM30, TS).unwrap();
    assert!(gml.contains(r#"numberMatched="0" numberReturned="0""#));
    assert!(!gml.contains("<member>"));

    // Empty but valid: distinct from a parse failure.
    let back = read_gml(&gml, "empty").unwrap();
    assert!(back.is_empty());
}

#[test]
fn reference_id_round_trips_with_official_namespace() {
    let parcels = vec![Parcel::new(
        "9872023VH5797S",
        Polygon2D::new(square(0.0, 0.0, 10.0)),
    )];
    let gml = write_gml(&parcels, Crs::ETRS89_UTM30, TS).unwrap();
    let back = read_gml(&gml, "rc").unwrap();
    assert_eq!(back[0].id, "ES.SDGC.CP.9872023VH5797S");
}

#[test]
fn crs_appears_as_ogc_uri() {
    for code in [25829u32, 25830, 25831, 32628] {
        let crs = Crs::from_epsg(code).unwrap();
        let gml = write_gml(
            &[Parcel::new("P", Polygon2D::new(square(0.0, 0.0, 1.0)))],
            crs,
            TS,
        )
        .unwrap();
        assert!(gml.contains(&format!(
            r#"srsName="http://www.opengis.net/def/crs/EPSG/0/{code}""#
        )));
    }
}
