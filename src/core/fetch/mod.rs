// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Bounded concurrent report fetching

pub mod orchestrator;

pub use orchestrator::{FetchOrchestrator, FetchOutcome};
