// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Delimited coordinate-list reader.
//!
//! One vertex per line; comma, tab, and semicolon all act as delimiters.
//! Lines may carry leading columns (point number, station id) — the last two
//! tokens are taken as x/y when both parse as numbers, everything else on
//! the line is ignored.

use crate::error::{Error, Result};
use crate::model::Parcel;
use parcel_lite_geometry::{close_ring, Point2, Polygon2D, Ring};

const FORMAT: &str = "CSV";

fn parse_number(token: &str) -> Option<f64> {
    lexical_core::parse::<f64>(token.trim().as_bytes()).ok()
}

/// Read a point list into a single hole-free parcel. The ring is closed
/// automatically when the source leaves it open.
pub fn read_csv(text: &str, base_name: &str) -> Result<Vec<Parcel>> {
    let mut points: Ring = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line
            .split(|c| c == ',' || c == '\t' || c == ';')
            .collect();
        if tokens.len() < 2 {
            continue;
        }
        let x = parse_number(tokens[tokens.len() - 2]);
        let y = parse_number(tokens[tokens.len() - 1]);
        if let (Some(x), Some(y)) = (x, y) {
            points.push(Point2::new(x, y));
        }
    }

    if points.len() < 3 {
        tracing::debug!(points = points.len(), "CSV input below 3 valid vertices");
        return Err(Error::empty(FORMAT));
    }

    close_ring(&mut points);

    let mut parcel = Parcel::new(base_name, Polygon2D::new(points));
    parcel.source_file = Some(base_name.to_string());
    Ok(vec![parcel])
}
