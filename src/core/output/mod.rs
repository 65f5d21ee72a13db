// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Output routing and unified aggregation
//!
//! Streaming per-scope writes, the mutex-guarded aggregation buffer, and
//! the JSON/spreadsheet renderers for unified modes.

pub mod router;
pub mod unified;
pub mod xlsx;

pub use router::OutputRouter;
pub use unified::{AggregationBuffer, MULTI_ORG_LABEL, ORG_NAME_KEY};
