// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Configuration management for Quarry.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Quarry uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Environment variable overrides (`QUARRY_*` prefix)
//! - Default values for optional settings
//! - Eager validation: every configuration error surfaces before the first
//!   fetch
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [platform]
//! base_url = "https://api.platform.example.com/api/v1.3"
//! user_key = "${QUARRY_USER_KEY}"
//! tokens = ["org-token-1", "org-token-2"]
//! token_type = "organization"
//!
//! [report]
//! kind = "vulnerability"
//! scope = "project"
//! output_mode = "unified_xlsx"
//! output_dir = "reports"
//! concurrency = 10
//!
//! [selection]
//! included_names = ["Payments Platform"]
//! excluded_tokens = ["deadbeef01"]
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use quarry::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("quarry.toml")?;
//! let run = config.to_run_config()?;
//! println!("Exporting {} reports", run.report_kind);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, LoggingConfig, PlatformConfig, QuarryConfig, ReportConfig, RunConfig,
    SelectionConfig, TokenType,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
