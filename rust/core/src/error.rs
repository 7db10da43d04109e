// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error taxonomy for the format readers and document writers.
//!
//! The two reader failures callers must tell apart:
//!
//! - [`Error::MalformedInput`] — the document cannot be parsed in its
//!   declared format at all. "Your file is broken."
//! - [`Error::EmptyGeometry`] — the document parsed fine but no usable
//!   geometry came out. "Check your layer names / point list."
//!
//! Degenerate rings dropped during stitching are neither; they only surface
//! as `EmptyGeometry` when nothing else survives.

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The source document is not syntactically valid in its format.
    #[error("malformed {format} input: {reason}")]
    MalformedInput {
        format: &'static str,
        reason: String,
    },

    /// Parsing succeeded but yielded zero usable features.
    #[error("no usable geometry found in {format} input")]
    EmptyGeometry { format: &'static str },

    /// EPSG code outside the supported UTM set.
    #[error("unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    /// A feature handed to a writer fails ring validation.
    #[error("geometry error: {0}")]
    Geometry(#[from] parcel_lite_geometry::Error),
}

impl Error {
    pub fn malformed(format: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            format,
            reason: reason.into(),
        }
    }

    pub fn empty(format: &'static str) -> Self {
        Self::EmptyGeometry { format }
    }

    /// True for the "parsed fine, nothing usable" case.
    pub fn is_empty_geometry(&self) -> bool {
        matches!(self, Self::EmptyGeometry { .. })
    }
}
