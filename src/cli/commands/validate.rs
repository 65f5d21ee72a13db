// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Quarry configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        match config.to_run_config() {
            Ok(run) => {
                println!("✅ Configuration is valid");
                println!();
                println!("Configuration Summary:");
                println!("  Log Level: {}", config.application.log_level);
                println!("  Platform URL: {}", config.platform.base_url);
                println!("  Token Type: {}", config.platform.token_type.as_str());
                println!("  Tokens: {}", run.tokens.len());
                println!("  Report: {}", run.report_kind);
                println!("  Report Scope: {}", run.report_scope_kind);
                println!("  Output Mode: {}", run.output_mode);
                println!("  Output Directory: {}", run.output_dir.display());
                println!("  Concurrency: {}", run.effective_concurrency());
                if !run.selection.is_empty() {
                    println!(
                        "  Selection: {} included / {} excluded tokens, {} included / {} excluded names",
                        run.selection.included_tokens.len(),
                        run.selection.excluded_tokens.len(),
                        run.selection.included_names.len(),
                        run.selection.excluded_names.len()
                    );
                }
                Ok(0)
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                Ok(2)
            }
        }
    }
}
