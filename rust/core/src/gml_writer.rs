// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! INSPIRE Cadastral Parcels (cp 4.0) document writer.
//!
//! !!! FROZEN OUTPUT SHAPE !!!
//!
//! This document layout has been validated and accepted by the cadastral
//! authority. Element order, attribute names, whitespace, and numeric
//! formatting are an external compliance contract: any change here is a
//! compatibility-breaking change of the wire format, not a style choice,
//! and must survive the golden-file test in `tests/gml_golden.rs`.
//!
//! The writer is pure and deterministic: the generation timestamp is a
//! parameter, the area is always recomputed from geometry at serialization
//! time, and no I/O happens here.

use crate::crs::Crs;
use crate::error::Result;
use crate::model::{is_cadastral_reference, sanitize_id, Parcel};
use parcel_lite_geometry::{Point2, Ring};
use std::fmt::Write;

/// Lifespan start emitted for features carrying a real cadastral reference.
const REFERENCE_LIFESPAN_START: &str = "2025-01-01T00:00:00";

const VOID_REASON_UNPOPULATED: &str =
    "http://inspire.ec.europa.eu/codelist/VoidReasonValue/Unpopulated";

const NS_BASE: &str = "http://inspire.ec.europa.eu/schemas/base/3.3";

const SCHEMA_LOCATION: &str = "http://www.opengis.net/wfs/2.0 http://schemas.opengis.net/wfs/2.0/wfs.xsd http://inspire.ec.europa.eu/schemas/cp/4.0 http://inspire.ec.europa.eu/schemas/cp/4.0/CadastralParcels.xsd";

/// Identifier facts derived from a feature id.
struct Naming {
    gml_id: String,
    namespace: String,
    local_id: String,
    label: String,
    is_reference: bool,
    reference: String,
}

/// Root of the id with internal suffixing stripped: up to the first `_`,
/// then up to the first `.`.
fn clean_id_root(id: &str) -> &str {
    let head = id.split('_').next().unwrap_or(id);
    head.split('.').next().unwrap_or(head)
}

fn derive_naming(id: &str) -> Naming {
    let root = clean_id_root(id);
    if is_cadastral_reference(root) {
        // Pre-formatted ids are respected; bare references get the official
        // authority namespace.
        let (gml_id, namespace, local_id) = if id.starts_with("ES.") {
            let local = id.rsplit('.').next().unwrap_or(id).to_string();
            let ns = id.split('.').take(3).collect::<Vec<_>>().join(".");
            (id.to_string(), ns, local)
        } else {
            (format!("ES.SDGC.CP.{id}"), "ES.SDGC.CP".to_string(), id.to_string())
        };
        let label = if root.len() >= 7 {
            root[5..7].to_string()
        } else {
            String::new()
        };
        Naming {
            gml_id,
            namespace,
            local_id,
            label,
            is_reference: true,
            reference: root.to_string(),
        }
    } else {
        let safe = sanitize_id(id);
        Naming {
            gml_id: format!("ES.LOCAL.CP.{safe}"),
            namespace: "ES.LOCAL.CP".to_string(),
            local_id: safe,
            label: String::new(),
            is_reference: false,
            reference: String::new(),
        }
    }
}

/// Explicitly closed copy of a ring: output rings always repeat the first
/// coordinate at the end.
fn closed(ring: &Ring) -> Ring {
    let mut out = ring.clone();
    if let (Some(&first), Some(&last)) = (out.first(), out.last()) {
        if first != last {
            out.push(first);
        }
    }
    out
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

/// Serialize parcels as a WFS 2.0 FeatureCollection of `cp:CadastralParcel`
/// members. `timestamp` is the generation instant in `%Y-%m-%dT%H:%M:%SZ`
/// form, supplied by the caller so the output is reproducible.
pub fn write_gml(parcels: &[Parcel], crs: Crs, timestamp: &str) -> Result<String> {
    for parcel in parcels {
        parcel.geometry.validate()?;
    }

    let srs_name = crs.ogc_uri();
    let count = parcels.len();

    let mut gml = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<FeatureCollection xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:xlink="http://www.w3.org/1999/xlink" xmlns:cp="http://inspire.ec.europa.eu/schemas/cp/4.0" xmlns:gmd="http://www.isotc211.org/2005/gmd" xsi:schemaLocation="{SCHEMA_LOCATION}" xmlns="http://www.opengis.net/wfs/2.0" timeStamp="{timestamp}" numberMatched="{count}" numberReturned="{count}">"#
    );

    for parcel in parcels {
        let exterior = closed(&parcel.geometry.exterior);
        let interiors: Vec<Ring> = parcel.geometry.holes.iter().map(closed).collect();

        // Output area is always recomputed from geometry for consistency with
        // the emitted rings, whatever the stored value says.
        let area = parcel.geometry.planar_area();
        let area_str = format!("{}", area.round() as i64);

        let reference_point = parcel.geometry.interior_point();

        let naming = derive_naming(&parcel.id);
        let begin_lifespan = if naming.is_reference {
            REFERENCE_LIFESPAN_START
        } else {
            timestamp
        };
        let reference_element = if naming.is_reference {
            format!(
                "<cp:nationalCadastralReference>{}</cp:nationalCadastralReference>",
                naming.reference
            )
        } else {
            "<cp:nationalCadastralReference/>".to_string()
        };

        let _ = write!(
            gml,
            r#"
<member>
  <cp:CadastralParcel gml:id="{gml_id}">
    <cp:areaValue uom="m2">{area_str}</cp:areaValue>
    <cp:beginLifespanVersion>{begin_lifespan}</cp:beginLifespanVersion>
    <cp:endLifespanVersion xsi:nil="true" nilReason="{VOID_REASON_UNPOPULATED}"></cp:endLifespanVersion>
    <cp:geometry>
      <gml:MultiSurface gml:id="MultiSurface_{gml_id}" srsName="{srs_name}">
        <gml:surfaceMember>
          <gml:Surface gml:id="Surface_{gml_id}" srsName="{srs_name}">
            <gml:patches>
              <gml:PolygonPatch>
                <gml:exterior>
                  <gml:LinearRing>
                    <gml:posList srsDimension="2" count="{count}">{coords}</gml:posList>
                  </gml:LinearRing>
                </gml:exterior>"#,
            gml_id = naming.gml_id,
            count = exterior.len(),
            coords = pos_list(&exterior),
        );

        for hole in &interiors {
            let _ = write!(
                gml,
                r#"
                <gml:interior>
                  <gml:LinearRing>
                    <gml:posList srsDimension="2" count="{count}">{coords}</gml:posList>
                  </gml:LinearRing>
                </gml:interior>"#,
                count = hole.len(),
                coords = pos_list(hole),
            );
        }

        let _ = write!(
            gml,
            r#"
              </gml:PolygonPatch>
            </gml:patches>
          </gml:Surface>
        </gml:surfaceMember>
      </gml:MultiSurface>
    </cp:geometry>
    <cp:inspireId>
      <Identifier xmlns="{NS_BASE}">
        <localId>{local_id}</localId>
        <namespace>{namespace}</namespace>
      </Identifier>
    </cp:inspireId>
    <cp:label>{label}</cp:label>
    {reference_element}
    <cp:referencePoint>
      <gml:Point gml:id="ReferencePoint_{gml_id}" srsName="{srs_name}">
        <gml:pos>{rp_x:.2} {rp_y:.2}</gml:pos>
      </gml:Point>
    </cp:referencePoint>
  </cp:CadastralParcel>
</member>"#,
            gml_id = naming.gml_id,
            local_id = naming.local_id,
            namespace = naming.namespace,
            label = naming.label,
            rp_x = reference_point.x,
            rp_y = reference_point.y,
        );
    }

    gml.push_str("\n</FeatureCollection>");
    Ok(gml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_lite_geometry::Polygon2D;

    fn square_parcel(id: &str) -> Parcel {
        Parcel::new(
            id,
            Polygon2D::new(vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
                Point2::new(0.0, 0.0),
            ]),
        )
    }

    const TS: &str = "2025-06-01T12:00:00Z";

    #[test]
    fn local_namespace_for_plain_ids() {
        let gml = write_gml(&[square_parcel("PARCELA")], Crs::ETRS89_UTM30, TS).unwrap();
        assert!(gml.contains(r#"gml:id="ES.LOCAL.CP.PARCELA""#));
        assert!(gml.contains("<namespace>ES.LOCAL.CP</namespace>"));
        assert!(gml.contains("<cp:nationalCadastralReference/>"));
        assert!(gml.contains(&format!("<cp:beginLifespanVersion>{TS}</cp:beginLifespanVersion>")));
    }

    #[test]
    fn official_namespace_for_references() {
        let gml = write_gml(&[square_parcel("9872023VH5797S")], Crs::ETRS89_UTM30, TS).unwrap();
        assert!(gml.contains(r#"gml:id="ES.SDGC.CP.9872023VH5797S""#));
        assert!(gml.contains(
            "<cp:nationalCadastralReference>9872023VH5797S</cp:nationalCadastralReference>"
        ));
        assert!(gml.contains("<cp:label>23</cp:label>"));
        assert!(gml.contains(
            "<cp:beginLifespanVersion>2025-01-01T00:00:00</cp:beginLifespanVersion>"
        ));
    }

    #[test]
    fn sixteen_character_id_is_not_a_reference() {
        let gml = write_gml(&[square_parcel("1234567890123456")], Crs::ETRS89_UTM30, TS).unwrap();
        assert!(gml.contains(r#"gml:id="ES.LOCAL.CP.1234567890123456""#));
        assert!(gml.contains("<cp:nationalCadastralReference/>"));
    }

    #[test]
    fn suffixed_reference_keeps_official_namespace() {
        let gml = write_gml(&[square_parcel("9872023VH5797S_2")], Crs::ETRS89_UTM30, TS).unwrap();
        assert!(gml.contains(r#"gml:id="ES.SDGC.CP.9872023VH5797S_2""#));
        assert!(gml.contains(
            "<cp:nationalCadastralReference>9872023VH5797S</cp:nationalCadastralReference>"
        ));
    }

    #[test]
    fn counts_match_feature_count() {
        let parcels = vec![square_parcel("A"), square_parcel("B")];
        let gml = write_gml(&parcels, Crs::ETRS89_UTM30, TS).unwrap();
        assert!(gml.contains(r#"numberMatched="2" numberReturned="2""#));
        assert_eq!(gml.matches("<member>").count(), 2);
    }

    #[test]
    fn empty_feature_set_is_a_bare_envelope() {
        let gml = write_gml(&[], Crs::ETRS89_UTM30, TS).unwrap();
        assert!(gml.contains(r#"numberMatched="0" numberReturned="0""#));
        assert!(!gml.contains("<member>"));
        assert!(gml.ends_with("</FeatureCollection>"));
    }

    #[test]
    fn area_is_recomputed_not_trusted() {
        let mut parcel = square_parcel("P");
        parcel.area = 999_999.0;
        let gml = write_gml(&[parcel], Crs::ETRS89_UTM30, TS).unwrap();
        assert!(gml.contains(r#"<cp:areaValue uom="m2">100</cp:areaValue>"#));
    }

    #[test]
    fn open_ring_is_closed_on_output() {
        let parcel = Parcel::new(
            "P",
            Polygon2D::new(vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
            ]),
        );
        let gml = write_gml(&[parcel], Crs::ETRS89_UTM30, TS).unwrap();
        assert!(gml.contains(r#"count="5">0.00 0.00 10.00 0.00 10.00 10.00 0.00 10.00 0.00 0.00<"#));
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        let parcel = Parcel::new(
            "P",
            Polygon2D::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]),
        );
        assert!(write_gml(&[parcel], Crs::ETRS89_UTM30, TS).is_err());
    }
}
