//! Parcel-Lite Geometry
//!
//! Planar geometry for cadastral parcel reconstruction: shoelace areas and
//! ray casting, fragment stitching of loose CAD segments into closed rings,
//! exterior/hole nesting, and i_overlay-backed overlap measurement.
//!
//! Everything here is synchronous, allocation-light, and pure: no I/O, no
//! shared state, coordinates are already-projected planar pairs.

pub mod classify;
pub mod error;
pub mod overlap;
pub mod ring;
pub mod stitch;

// Re-export nalgebra types for convenience
pub use nalgebra::Point2;

pub use classify::{classify, classify_indexed, Nesting};
pub use error::{Error, Result};
pub use overlap::{contains, intersection, intersection_area};
pub use ring::{
    bounds_overlap, centroid, close_ring, dedup_consecutive, distinct_vertex_count, ensure_ccw,
    ensure_cw, point_in_ring, ring_bounds, signed_area, strip_closure, Polygon2D, Ring,
};
pub use stitch::{stitch, Segment, DEFAULT_STITCH_TOLERANCE};
