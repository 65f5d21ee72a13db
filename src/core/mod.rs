// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Core business logic
//!
//! The pipeline runs in three stages: [`resolve`] turns the include/exclude
//! selection into typed report targets, [`fetch`] fans report fetches out
//! under a bounded pool, and [`output`] routes payloads to per-scope files
//! or the unified aggregator. [`coordinator`] wires the stages together and
//! [`summary`] tracks the outcome.

pub mod coordinator;
pub mod fetch;
pub mod output;
pub mod resolve;
pub mod summary;

pub use coordinator::RunCoordinator;
pub use summary::{RunError, RunErrorType, RunSummary};
