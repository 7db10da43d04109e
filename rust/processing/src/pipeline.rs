// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Upload-to-GML pipeline.
//!
//! The one impure concern — the generation timestamp — lives here, so every
//! reader and writer underneath stays deterministic and testable.

use chrono::Utc;
use parcel_lite_core::{
    csv, dxf, gml, gml_writer, model, shapefile, Crs, Error, Parcel, Result,
};

/// Source formats accepted by [`process_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Dxf,
    /// GeoJSON produced by the upstream shapefile conversion.
    Shapefile,
    Gml,
}

impl SourceFormat {
    /// Guess the format from a file extension (`"dxf"`, `"parcela.csv"`, ...).
    pub fn from_extension(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "dxf" => Some(Self::Dxf),
            "zip" | "shp" | "json" | "geojson" => Some(Self::Shapefile),
            "gml" | "xml" => Some(Self::Gml),
            _ => None,
        }
    }
}

/// Result of one processed upload: the parsed features and their serialized
/// INSPIRE document.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub gml: String,
    pub parcels: Vec<Parcel>,
}

/// Current UTC instant in the second-precision ISO-8601 form the writers
/// expect.
pub fn generation_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse one uploaded source and serialize it as Cadastral Parcels GML.
///
/// `base_name` should already be filesystem-stem form; use
/// [`model::base_name_from_filename`] on raw upload names.
pub fn process_source(
    contents: &str,
    format: SourceFormat,
    base_name: &str,
    crs: Crs,
) -> Result<ProcessOutcome> {
    tracing::info!(?format, base_name, crs = crs.code(), "processing upload");

    let mut parcels = match format {
        SourceFormat::Csv => csv::read_csv(contents, base_name)?,
        SourceFormat::Dxf => dxf::read_dxf(contents, base_name)?,
        SourceFormat::Shapefile => shapefile::read_shapefile_geojson(contents, base_name, crs)?,
        SourceFormat::Gml => gml::read_gml(contents, base_name)?,
    };

    for parcel in &mut parcels {
        if parcel.source_file.is_none() {
            parcel.source_file = Some(base_name.to_string());
        }
    }

    let gml = gml_writer::write_gml(&parcels, crs, &generation_timestamp())?;

    tracing::info!(parcels = parcels.len(), "upload processed");
    Ok(ProcessOutcome { gml, parcels })
}

/// Process a raw upload by file name, deriving format and base name from it.
pub fn process_upload(contents: &str, file_name: &str, crs: Crs) -> Result<ProcessOutcome> {
    let format = SourceFormat::from_extension(file_name).ok_or_else(|| {
        Error::malformed("upload", format!("unrecognized file extension in {file_name:?}"))
    })?;
    let base_name = model::base_name_from_filename(file_name);
    process_source(contents, format, &base_name, crs)
}

/// Serialize one building footprint with a fresh generation timestamp.
pub fn export_building_gml(parcel: &Parcel, crs: Crs) -> Result<String> {
    parcel_lite_core::write_building_gml(parcel, crs, &generation_timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_guessing() {
        assert_eq!(SourceFormat::from_extension("a.dxf"), Some(SourceFormat::Dxf));
        assert_eq!(SourceFormat::from_extension("b.CSV"), Some(SourceFormat::Csv));
        assert_eq!(
            SourceFormat::from_extension("c.geojson"),
            Some(SourceFormat::Shapefile)
        );
        assert_eq!(SourceFormat::from_extension("d.gml"), Some(SourceFormat::Gml));
        assert_eq!(SourceFormat::from_extension("e.pdf"), None);
    }

    #[test]
    fn csv_upload_end_to_end() {
        let outcome = process_upload(
            "0,0\n10,0\n10,10\n0,10",
            "mi parcela.csv",
            Crs::ETRS89_UTM30,
        )
        .unwrap();
        assert_eq!(outcome.parcels.len(), 1);
        assert_eq!(outcome.parcels[0].id, "mi_parcela");
        assert!(outcome.gml.contains(r#"numberMatched="1""#));
        assert!(outcome.gml.contains("ES.LOCAL.CP.mi_parcela"));
    }

    #[test]
    fn source_file_is_stamped() {
        let outcome = process_source(
            "0,0\n5,0\n5,5",
            SourceFormat::Csv,
            "LINDE",
            Crs::ETRS89_UTM30,
        )
        .unwrap();
        assert_eq!(outcome.parcels[0].source_file.as_deref(), Some("LINDE"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = process_upload("x", "datos.bin", Crs::ETRS89_UTM30).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn timestamp_shape() {
        let ts = generation_timestamp();
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
    }
}
