// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Versioned boundary types shared with the external analysis service.
//!
//! The remote service analyzes uploaded CAD/GIS bundles at scale and returns
//! structured parcel data; these types pin that contract down as explicit
//! schema instead of free-form JSON. Ring coordinates travel as plain
//! `[x, y]` pairs in both the working UTM zone and geographic lon/lat (the
//! latter for web map display).

use parcel_lite_core::{Crs, Parcel};
use parcel_lite_geometry::{Point2, Polygon2D, Ring};
use serde::{Deserialize, Serialize};

fn ring_to_pairs(ring: &[Point2<f64>]) -> Vec<[f64; 2]> {
    ring.iter().map(|p| [p.x, p.y]).collect()
}

fn ring_to_lonlat(ring: &[Point2<f64>], crs: Crs) -> Vec<[f64; 2]> {
    ring.iter()
        .map(|p| {
            let (lon, lat) = crs.unproject(p.x, p.y);
            [lon, lat]
        })
        .collect()
}

fn pairs_to_ring(pairs: &[[f64; 2]]) -> Ring {
    pairs.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

/// One parcel crossing the service boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadastral_reference: Option<String>,
    pub area: f64,
    pub exterior_utm: Vec<[f64; 2]>,
    pub exterior_lonlat: Vec<[f64; 2]>,
    #[serde(default)]
    pub interiors_utm: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub interiors_lonlat: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub has_conflict: bool,
    #[serde(default)]
    pub is_hole: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl ParcelRecord {
    pub fn from_parcel(parcel: &Parcel, crs: Crs) -> Self {
        Self {
            id: parcel.id.clone(),
            cadastral_reference: parcel.cadastral_reference.clone(),
            area: parcel.area,
            exterior_utm: ring_to_pairs(&parcel.geometry.exterior),
            exterior_lonlat: ring_to_lonlat(&parcel.geometry.exterior, crs),
            interiors_utm: parcel.geometry.holes.iter().map(|h| ring_to_pairs(h)).collect(),
            interiors_lonlat: parcel
                .geometry
                .holes
                .iter()
                .map(|h| ring_to_lonlat(h, crs))
                .collect(),
            has_conflict: parcel.has_conflict,
            is_hole: parcel.is_hole,
            source_layer: parcel.source_layer.clone(),
            source_file: parcel.source_file.clone(),
        }
    }

    /// Rebuild the in-memory feature from the UTM rings; lon/lat rings are
    /// display-only and dropped.
    pub fn into_parcel(self) -> Parcel {
        let mut polygon = Polygon2D::new(pairs_to_ring(&self.exterior_utm));
        for hole in &self.interiors_utm {
            polygon.add_hole(pairs_to_ring(hole));
        }
        let mut parcel = Parcel::new(self.id, polygon);
        parcel.area = self.area;
        parcel.cadastral_reference = self.cadastral_reference;
        parcel.has_conflict = self.has_conflict;
        parcel.is_hole = self.is_hole;
        parcel.source_layer = self.source_layer;
        parcel.source_file = self.source_file;
        parcel
    }
}

/// Whole-analysis response shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub parcels: Vec<ParcelRecord>,
    pub parcel_count: usize,
    pub conflict_count: usize,
    pub hole_count: usize,
    /// Working CRS as `EPSG:<code>`.
    pub epsg: String,
    pub message: String,
}

impl AnalysisSummary {
    pub fn new(parcels: Vec<ParcelRecord>, crs: Crs, message: impl Into<String>) -> Self {
        let conflict_count = parcels.iter().filter(|p| p.has_conflict).count();
        let hole_count = parcels.iter().filter(|p| p.is_hole).count();
        Self {
            parcel_count: parcels.len(),
            conflict_count,
            hole_count,
            epsg: crs.epsg_id(),
            message: message.into(),
            parcels,
        }
    }
}
