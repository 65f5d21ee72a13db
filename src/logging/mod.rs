// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Logging and observability
//!
//! Structured logging via `tracing`: console output always, optional
//! JSON file logging with rotation.
//!
//! # Example
//!
//! ```no_run
//! use quarry::logging::init_logging;
//! use quarry::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};
