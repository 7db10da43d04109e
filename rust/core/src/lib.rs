// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Parcel-Lite Core
//!
//! Cadastral feature model, format readers, and document writers.
//!
//! ## Overview
//!
//! Readers turn already-read file contents into [`Parcel`] features:
//!
//! - **CSV**: delimited coordinate lists, one hole-free parcel
//! - **DXF**: layered CAD drawings; loose fragments are stitched into rings
//!   and classified into boundaries and holes
//! - **Shapefile**: GeoJSON produced by the upstream shapefile conversion
//! - **GML**: this crate's own INSPIRE output, for round-trip editing
//!
//! Writers serialize features back out: the frozen INSPIRE Cadastral
//! Parcels document, the INSPIRE Buildings variant, KML for Google Earth,
//! and a minimal DXF drawing.
//!
//! ## Quick Start
//!
//! ```rust
//! use parcel_lite_core::{csv, gml_writer, Crs};
//!
//! let parcels = csv::read_csv("0,0\n10,0\n10,10\n0,10", "PARCELA").unwrap();
//! let gml = gml_writer::write_gml(
//!     &parcels,
//!     Crs::ETRS89_UTM30,
//!     "2025-06-01T12:00:00Z",
//! )
//! .unwrap();
//! assert!(gml.contains("CadastralParcel"));
//! ```
//!
//! Everything is synchronous and pure: no file or network access, no shared
//! state; the caller owns I/O and supplies timestamps.

pub mod building_gml;
pub mod crs;
pub mod csv;
pub mod dxf;
pub mod dxf_writer;
pub mod error;
pub mod gml;
pub mod gml_writer;
pub mod kml_writer;
pub mod model;
pub mod shapefile;

pub use building_gml::write_building_gml;
pub use crs::{Crs, SUPPORTED_EPSG};
pub use csv::read_csv;
pub use dxf::{read_dxf, EXTERIOR_LAYER, FALLBACK_LAYERS, INTERIOR_LAYER};
pub use dxf_writer::write_dxf;
pub use error::{Error, Result};
pub use gml::read_gml;
pub use gml_writer::write_gml;
pub use kml_writer::write_kml;
pub use model::{
    base_name_from_filename, is_cadastral_reference, sanitize_cadastral_name, sanitize_id,
    EntityType, Layer, Parcel,
};
pub use shapefile::read_shapefile_geojson;
