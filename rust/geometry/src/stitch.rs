// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fragment stitching: closed-ring reconstruction from loose segments.
//!
//! Survey CAD files routinely ship a parcel boundary as dozens of
//! disconnected LINE entities and open polylines. This module chains those
//! fragments back into closed rings by matching endpoints within a distance
//! tolerance.

use crate::ring::Ring;
use nalgebra::Point2;

/// Default endpoint-matching tolerance in CRS units (1 cm in UTM meters).
/// Tests reproduce reference outputs only when they use this exact value.
pub const DEFAULT_STITCH_TOLERANCE: f64 = 0.01;

/// One straight edge extracted from a source entity. Consumed by [`stitch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl Segment {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }
}

#[inline]
fn dist(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Reconstruct closed rings from an unordered segment pool.
///
/// Repeatedly seeds a chain with an arbitrary remaining segment, then greedily
/// extends it: the first remaining segment (in pool order) with an endpoint
/// within `tolerance` of the chain's open end is consumed and its far endpoint
/// appended. When no match remains, a chain whose ends meet within `tolerance`
/// has the duplicate closing point dropped; chains with at least 3 points
/// become rings, shorter ones are dangling fragments and are discarded.
///
/// The first-match tie-break means ambiguous branch points (three or more
/// segment ends within tolerance of each other) can stitch differently than a
/// human would draw them. That is inherited behavior; callers wanting a
/// nearest-candidate preference must not get it silently here.
///
/// Never fails: an empty or unmatched pool yields an empty ring list.
pub fn stitch(mut segments: Vec<Segment>, tolerance: f64) -> Vec<Ring> {
    let mut rings = Vec::new();

    while let Some(seed) = segments.pop() {
        let mut chain: Ring = vec![seed.start, seed.end];
        let mut open_end = seed.end;

        loop {
            let mut matched = None;
            for (i, s) in segments.iter().enumerate() {
                if dist(&s.start, &open_end) < tolerance {
                    matched = Some((i, s.end));
                    break;
                }
                if dist(&s.end, &open_end) < tolerance {
                    matched = Some((i, s.start));
                    break;
                }
            }
            match matched {
                Some((i, next)) => {
                    segments.remove(i);
                    chain.push(next);
                    open_end = next;
                }
                None => break,
            }
        }

        // Closed chains carry the seed start twice; keep the internal
        // representation free of the closure duplicate.
        if chain.len() > 1 && dist(&chain[0], &chain[chain.len() - 1]) < tolerance {
            chain.pop();
        }

        if chain.len() >= 3 {
            rings.push(chain);
        }
    }

    rings
}
