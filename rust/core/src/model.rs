// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory feature model shared by every reader and writer.

use parcel_lite_geometry::Polygon2D;

/// Which INSPIRE theme a feature serializes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityType {
    /// Cadastral Parcels 4.0 (`cp`)
    #[default]
    CadastralParcel,
    /// Buildings Extended 2D (`bu-ext2d`)
    Building,
}

impl EntityType {
    /// Two-letter code used in identifier namespaces (`ES.SDGC.CP` / `ES.SDGC.BU`).
    pub fn code(&self) -> &'static str {
        match self {
            EntityType::CadastralParcel => "CP",
            EntityType::Building => "BU",
        }
    }
}

/// One cadastral feature: an exterior boundary, its holes, and the metadata
/// a reader could recover from the source document.
///
/// Rings are stored explicitly closed (first point repeated at the end),
/// matching the serialized form. Value-like: owned by whichever pipeline
/// stage produced it, immutable after construction except for the
/// user-editable cadastral reference.
#[derive(Debug, Clone)]
pub struct Parcel {
    pub id: String,
    pub geometry: Polygon2D,
    /// Planar area: exterior minus holes. Writers recompute at serialization
    /// time; this copy is for display and the backend contract.
    pub area: f64,
    /// Official 14/20-character reference, when one was recovered or entered.
    pub cadastral_reference: Option<String>,
    /// Overlap flag assigned by conflict analysis.
    pub has_conflict: bool,
    /// Marks features that are interior voids of another feature.
    pub is_hole: bool,
    /// CAD layer the exterior ring came from, when the source had layers.
    pub source_layer: Option<String>,
    /// Originating file name (without extension).
    pub source_file: Option<String>,
    pub entity_type: EntityType,
}

impl Parcel {
    pub fn new(id: impl Into<String>, geometry: Polygon2D) -> Self {
        let area = geometry.planar_area();
        Self {
            id: id.into(),
            geometry,
            area,
            cadastral_reference: None,
            has_conflict: false,
            is_hole: false,
            source_layer: None,
            source_file: None,
            entity_type: EntityType::default(),
        }
    }

    /// Refresh the cached area after editing geometry.
    pub fn recompute_area(&mut self) {
        self.area = self.geometry.planar_area();
    }
}

/// A named group of features sharing one origin (one uploaded file).
/// Only the topology validator cares about this grouping.
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub parcels: Vec<Parcel>,
}

impl Layer {
    pub fn new(name: impl Into<String>, parcels: Vec<Parcel>) -> Self {
        Self {
            name: name.into(),
            parcels,
        }
    }
}

/// True when `s` has the shape of a national cadastral reference:
/// exactly 14 or 20 alphanumeric characters.
pub fn is_cadastral_reference(s: &str) -> bool {
    (s.len() == 14 || s.len() == 20) && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Replace every character outside `[A-Za-z0-9_]` with an underscore.
/// This is the identifier form the GML writer embeds in `gml:id` values.
pub fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Aggressive identifier cleanup for display names: whitespace runs become
/// single underscores, everything else non-alphanumeric is dropped,
/// underscore runs collapse, and the result is uppercased. Never empty.
pub fn sanitize_cadastral_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_sep = true;
    for c in s.trim().chars() {
        if c.is_whitespace() || c == '_' {
            if !last_was_sep {
                out.push('_');
                last_was_sep = true;
            }
        } else if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
            last_was_sep = false;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        "PARCELA".to_string()
    } else {
        out
    }
}

/// Derive a feature base name from an uploaded file name: extension stripped,
/// illegal characters underscored.
pub fn base_name_from_filename(name: &str) -> String {
    let stem = match name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => name,
    };
    sanitize_id(stem)
}
