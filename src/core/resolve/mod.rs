// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Scope resolution
//!
//! Converts include/exclude specifications into typed, deduplicated report
//! targets. See [`resolver::ScopeResolver`] for the filter/expansion order.

pub mod resolver;
pub mod sanitize;

pub use resolver::{Resolution, ScopeResolver};
pub use sanitize::sanitize;
