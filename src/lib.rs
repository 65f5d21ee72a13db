// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! # Quarry - Bulk Compliance Report Exporter
//!
//! Quarry bulk-exports compliance and security reports from a multi-tenant
//! platform across an arbitrary set of organizations, products, and
//! projects, writing results as per-scope files or a single consolidated
//! JSON document or spreadsheet.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Resolving** include/exclude tokens and names into a deduplicated,
//!   typed list of report targets, expanding products into projects where
//!   the report granularity requires it
//! - **Fetching** one report per target under a bounded worker pool that
//!   tolerates partial failure
//! - **Routing** fetched payloads to per-scope files or a unified
//!   aggregator that renders one JSON array or a multi-sheet workbook
//!
//! ## Architecture
//!
//! Quarry follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (resolve, fetch, output, coordinator)
//! - [`adapters`] - The reporting platform integration
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quarry::adapters::platform::PlatformClient;
//! use quarry::config::load_config;
//! use quarry::core::RunCoordinator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("quarry.toml")?;
//!     let run_config = config.to_run_config()?;
//!
//!     let client = Arc::new(PlatformClient::new(
//!         config.platform.base_url.clone(),
//!         config.platform.user_key.clone().expect("user key required"),
//!     ));
//!
//!     let coordinator = RunCoordinator::new(client, run_config);
//!     let summary = coordinator.execute().await?;
//!
//!     println!("Exported {} targets", summary.successful);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Quarry uses the [`domain::QuarryError`] type for all errors. Per-target
//! fetch and write failures never abort a run; they are recorded in the
//! [`core::RunSummary`]. Only configuration and connection problems are
//! fatal, and those are detected before the first fetch.
//!
//! ## Logging
//!
//! Quarry uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(targets = 12, "Resolved report targets");
//! warn!(org = "Acme", "Organization is disabled and will be skipped");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
