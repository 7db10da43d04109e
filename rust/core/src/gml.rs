// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Round-trip reader for INSPIRE Cadastral Parcels documents.
//!
//! Reads back the shape produced by [`crate::gml_writer`] (and documents
//! from the issuing authority that follow the same schema). Elements are
//! matched by local name, which covers namespace-aware, `cp:`/`gml:`
//! prefixed, and unprefixed documents alike. The authoritative `areaValue`
//! is kept when present; otherwise the area is recomputed from geometry.

use crate::error::{Error, Result};
use crate::model::Parcel;
use parcel_lite_geometry::{Point2, Polygon2D, Ring};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const FORMAT: &str = "GML";

#[derive(Debug, Default)]
struct PatchRings {
    exterior: Option<Ring>,
    interiors: Vec<Ring>,
}

#[derive(Debug, Default)]
struct ParcelState {
    id: Option<String>,
    area: Option<f64>,
    patches: Vec<PatchRings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RingTarget {
    Exterior,
    Interior,
}

fn gml_id_attribute(e: &BytesStart) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"id" {
            if let Ok(value) = attr.unescape_value() {
                return Some(value.into_owned());
            }
        }
    }
    None
}

fn parse_pos_list(text: &str) -> Ring {
    let values: Vec<f64> = text
        .split_whitespace()
        .filter_map(|t| lexical_core::parse::<f64>(t.as_bytes()).ok())
        .collect();
    if values.len() % 2 != 0 {
        tracing::warn!(count = values.len(), "posList has odd coordinate count");
    }
    values
        .chunks_exact(2)
        .map(|c| Point2::new(c[0], c[1]))
        .collect()
}

/// Parse a Cadastral Parcels GML document into parcels.
///
/// A well-formed FeatureCollection with zero members is a valid empty result,
/// not an empty-geometry error; any other XML without parcels is.
pub fn read_gml(text: &str, base_name: &str) -> Result<Vec<Parcel>> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut parcels: Vec<Parcel> = Vec::new();
    let mut saw_collection = false;
    let mut parcel_index = 0usize;

    let mut current: Option<ParcelState> = None;
    let mut ring_target: Option<RingTarget> = None;
    let mut in_pos_list = false;
    let mut in_area = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"FeatureCollection" => saw_collection = true,
                b"CadastralParcel" => {
                    let mut state = ParcelState::default();
                    state.id = gml_id_attribute(&e);
                    current = Some(state);
                }
                b"PolygonPatch" => {
                    if let Some(state) = current.as_mut() {
                        state.patches.push(PatchRings::default());
                    }
                }
                b"exterior" => ring_target = Some(RingTarget::Exterior),
                b"interior" => ring_target = Some(RingTarget::Interior),
                b"posList" => in_pos_list = current.is_some() && ring_target.is_some(),
                b"areaValue" => in_area = current.is_some(),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::malformed(FORMAT, e.to_string()))?;
                if in_pos_list {
                    let ring = parse_pos_list(&text);
                    if let (Some(state), Some(target)) = (current.as_mut(), ring_target) {
                        if let Some(patch) = state.patches.last_mut() {
                            match target {
                                RingTarget::Exterior => patch.exterior = Some(ring),
                                RingTarget::Interior => patch.interiors.push(ring),
                            }
                        }
                    }
                } else if in_area {
                    if let Some(state) = current.as_mut() {
                        state.area = lexical_core::parse::<f64>(text.trim().as_bytes()).ok();
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"posList" => in_pos_list = false,
                b"areaValue" => in_area = false,
                b"exterior" | b"interior" => ring_target = None,
                b"CadastralParcel" => {
                    if let Some(state) = current.take() {
                        finalize_parcel(state, &mut parcels, &mut parcel_index);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::malformed(FORMAT, e.to_string())),
            _ => {}
        }
    }

    if parcels.is_empty() && !saw_collection {
        return Err(Error::empty(FORMAT));
    }

    tracing::debug!(parcels = parcels.len(), source = base_name, "GML parsed");
    Ok(parcels)
}

fn finalize_parcel(state: ParcelState, parcels: &mut Vec<Parcel>, parcel_index: &mut usize) {
    let id = state
        .id
        .unwrap_or_else(|| format!("parcel_{parcel_index}"));
    *parcel_index += 1;

    let multi_patch = state.patches.len() > 1;
    for (patch_idx, patch) in state.patches.into_iter().enumerate() {
        let Some(exterior) = patch.exterior else {
            continue;
        };
        if exterior.len() < 3 {
            continue;
        }
        let mut polygon = Polygon2D::new(exterior);
        for hole in patch.interiors {
            if hole.len() >= 3 {
                polygon.add_hole(hole);
            }
        }

        let feature_id = if multi_patch {
            format!("{id}.{}", patch_idx + 1)
        } else {
            id.clone()
        };
        let mut parcel = Parcel::new(feature_id, polygon);
        if let Some(area) = state.area {
            parcel.area = area;
        }
        parcels.push(parcel);
    }
}
