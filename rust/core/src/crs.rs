// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Supported coordinate reference systems and the UTM transform.
//!
//! The core works in projected UTM coordinates throughout; geographic
//! lon/lat pairs only appear at two edges (shapefile-derived GeoJSON that an
//! upstream converter re-projected to WGS84, and KML output for web globes),
//! so a single Transverse Mercator forward/inverse over the four supported
//! zones replaces a general projection library. Series terms follow the
//! standard USGS formulation.

use crate::error::{Error, Result};

/// EPSG codes the toolchain accepts.
pub const SUPPORTED_EPSG: [u32; 4] = [25829, 25830, 25831, 32628];

const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;

/// A validated coordinate reference system (always one of the supported
/// northern-hemisphere UTM zones).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crs {
    code: u32,
}

impl Crs {
    /// ETRS89 / UTM zone 30N, the default for peninsular Spain.
    pub const ETRS89_UTM30: Crs = Crs { code: 25830 };

    pub fn from_epsg(code: u32) -> Result<Self> {
        if SUPPORTED_EPSG.contains(&code) {
            Ok(Self { code })
        } else {
            Err(Error::UnsupportedCrs(format!("EPSG:{code}")))
        }
    }

    /// Accepts `"EPSG:25830"` (any case, even doubled prefixes) or bare digits.
    pub fn parse(s: &str) -> Result<Self> {
        let digits = s
            .trim()
            .to_ascii_uppercase()
            .replace("EPSG:", "")
            .trim()
            .to_string();
        let code: u32 = digits
            .parse()
            .map_err(|_| Error::UnsupportedCrs(s.to_string()))?;
        Self::from_epsg(code)
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    /// `EPSG:25830` form.
    pub fn epsg_id(&self) -> String {
        format!("EPSG:{}", self.code)
    }

    /// OGC URI form used as `srsName` in WFS FeatureCollections.
    pub fn ogc_uri(&self) -> String {
        format!("http://www.opengis.net/def/crs/EPSG/0/{}", self.code)
    }

    /// URN form required by the Buildings schema template.
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.code)
    }

    /// Central meridian of the zone, in degrees.
    fn central_meridian(&self) -> f64 {
        match self.code {
            25829 => -9.0,
            25830 => -3.0,
            25831 => 3.0,
            32628 => -15.0,
            _ => unreachable!("constructor validates the code"),
        }
    }

    /// Ellipsoid semi-major axis and flattening. ETRS89 zones sit on GRS80,
    /// the Canary Islands zone on WGS84.
    fn ellipsoid(&self) -> (f64, f64) {
        match self.code {
            32628 => (6_378_137.0, 1.0 / 298.257_223_563),
            _ => (6_378_137.0, 1.0 / 298.257_222_101),
        }
    }

    /// Geographic (lon, lat) degrees → projected (easting, northing) meters.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (a, f) = self.ellipsoid();
        let e2 = f * (2.0 - f);
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let lam = lon.to_radians();
        let lam0 = self.central_meridian().to_radians();

        let sin_phi = phi.sin();
        let cos_phi = phi.cos();

        let n = a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = (phi.tan()).powi(2);
        let c = ep2 * cos_phi * cos_phi;
        let aa = (lam - lam0) * cos_phi;

        let m = meridian_arc(a, e2, phi);

        let easting = K0
            * n
            * (aa
                + (1.0 - t + c) * aa.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * aa.powi(5) / 120.0)
            + FALSE_EASTING;

        let northing = K0
            * (m + n
                * phi.tan()
                * (aa * aa / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * aa.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * aa.powi(6) / 720.0));

        (easting, northing)
    }

    /// Projected (easting, northing) meters → geographic (lon, lat) degrees.
    pub fn unproject(&self, easting: f64, northing: f64) -> (f64, f64) {
        let (a, f) = self.ellipsoid();
        let e2 = f * (2.0 - f);
        let ep2 = e2 / (1.0 - e2);

        let m = northing / K0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));

        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let t1 = (phi1.tan()).powi(2);
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let n1 = a / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = (easting - FALSE_EASTING) / (n1 * K0);

        let phi = phi1
            - (n1 * phi1.tan() / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let lam = self.central_meridian().to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        (lam.to_degrees(), phi.to_degrees())
    }
}

/// Meridian arc length from the equator to latitude `phi`.
fn meridian_arc(a: f64, e2: f64, phi: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_prefixed_and_bare_codes() {
        assert_eq!(Crs::parse("EPSG:25830").unwrap().code(), 25830);
        assert_eq!(Crs::parse("epsg:25831").unwrap().code(), 25831);
        assert_eq!(Crs::parse("EPSG:EPSG:25830").unwrap().code(), 25830);
        assert_eq!(Crs::parse("32628").unwrap().code(), 32628);
        assert!(Crs::parse("EPSG:4326").is_err());
        assert!(Crs::parse("banana").is_err());
    }

    #[test]
    fn uri_forms() {
        let crs = Crs::from_epsg(25830).unwrap();
        assert_eq!(crs.ogc_uri(), "http://www.opengis.net/def/crs/EPSG/0/25830");
        assert_eq!(crs.urn(), "urn:ogc:def:crs:EPSG::25830");
        assert_eq!(crs.epsg_id(), "EPSG:25830");
    }

    #[test]
    fn central_meridian_projects_to_false_easting() {
        let crs = Crs::from_epsg(25830).unwrap();
        let (x, y) = crs.project(-3.0, 40.0);
        assert_relative_eq!(x, 500_000.0, epsilon = 1e-6);
        assert!(y > 4_000_000.0 && y < 4_600_000.0);
    }

    #[test]
    fn project_unproject_round_trips() {
        for code in SUPPORTED_EPSG {
            let crs = Crs::from_epsg(code).unwrap();
            let lon0 = crs.central_meridian() + 1.2;
            let lat0 = if code == 32628 { 28.3 } else { 40.4 };
            let (x, y) = crs.project(lon0, lat0);
            let (lon, lat) = crs.unproject(x, y);
            assert_relative_eq!(lon, lon0, epsilon = 1e-7);
            assert_relative_eq!(lat, lat0, epsilon = 1e-7);
        }
    }

    #[test]
    fn northing_grows_with_latitude() {
        let crs = Crs::ETRS89_UTM30;
        let (_, y1) = crs.project(-3.5, 39.0);
        let (_, y2) = crs.project(-3.5, 41.0);
        assert!(y2 > y1);
    }
}
