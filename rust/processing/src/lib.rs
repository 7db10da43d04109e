// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Parcel-Lite Processing
//!
//! Shared pipeline over the core readers and writers: upload dispatch,
//! cross-layer topology validation, conflict marking, and the typed
//! boundary contract with the external analysis service.

pub mod pipeline;
pub mod topology;
pub mod types;

pub use pipeline::{
    export_building_gml, generation_timestamp, process_source, process_upload, ProcessOutcome,
    SourceFormat,
};
pub use topology::{
    mark_conflicts, validate_topology, IssueKind, TopologyIssue, MIN_CONFLICT_AREA,
    MIN_OVERLAP_AREA,
};
pub use types::{AnalysisSummary, ParcelRecord};
