// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Export command implementation
//!
//! This module implements the `export` command: the bulk report export
//! across every resolved scope.

use crate::adapters::platform::PlatformClient;
use crate::config::{load_config, secret_string};
use crate::core::RunCoordinator;
use crate::domain::QuarryError;
use clap::Args;
use std::sync::Arc;

/// Arguments for the export command
///
/// Every flag overrides the corresponding configuration file setting.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Report kind to produce
    #[arg(short, long)]
    pub report: Option<String>,

    /// Output type (binary, json, unified_json, unified_xlsx,
    /// unified_xlsx_per_sheet)
    #[arg(short = 't', long)]
    pub output_type: Option<String>,

    /// Scope granularity of the report (product or project)
    #[arg(short, long)]
    pub scope: Option<String>,

    /// Credential token(s), comma-separated
    #[arg(short = 'k', long)]
    pub token: Option<String>,

    /// Token type (organization or umbrella)
    #[arg(long)]
    pub token_type: Option<String>,

    /// Platform user key
    #[arg(short, long, env = "QUARRY_USER_KEY", hide_env_values = true)]
    pub user_key: Option<String>,

    /// Platform API URL
    #[arg(short = 'a', long)]
    pub url: Option<String>,

    /// Output directory
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Included scope tokens, comma-separated (default: all scopes)
    #[arg(short = 'i', long)]
    pub include_tokens: Option<String>,

    /// Excluded scope tokens, comma-separated
    #[arg(short = 'e', long)]
    pub exclude_tokens: Option<String>,

    /// Included scope names, comma-separated
    #[arg(long)]
    pub include_names: Option<String>,

    /// Excluded scope names, comma-separated
    #[arg(long)]
    pub exclude_names: Option<String>,

    /// Extra key=value argument passed to the report (repeatable)
    #[arg(short = 'x', long = "extra-arg")]
    pub extra_args: Vec<String>,

    /// Concurrent fetch workers
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        // Load configuration
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        // Apply CLI overrides
        if let Some(report) = &self.report {
            tracing::info!(report = %report, "Overriding report kind from CLI");
            config.report.kind = report.clone();
        }
        if let Some(output_type) = &self.output_type {
            tracing::info!(output_type = %output_type, "Overriding output type from CLI");
            config.report.output_mode = output_type.clone();
        }
        if let Some(scope) = &self.scope {
            tracing::info!(scope = %scope, "Overriding report scope from CLI");
            config.report.scope = scope.clone();
        }
        if let Some(token) = &self.token {
            config.platform.tokens = split_csv(token);
        }
        if let Some(token_type) = &self.token_type {
            match crate::config::TokenType::parse(token_type) {
                Some(parsed) => config.platform.token_type = parsed,
                None => {
                    eprintln!(
                        "Invalid token type: {token_type}. Use 'organization' or 'umbrella'"
                    );
                    return Ok(2);
                }
            }
        }
        if let Some(user_key) = &self.user_key {
            config.platform.user_key = Some(secret_string(user_key.clone()));
        }
        if let Some(url) = &self.url {
            config.platform.base_url = url.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.report.output_dir = output_dir.clone();
        }
        if let Some(tokens) = &self.include_tokens {
            config.selection.included_tokens = split_csv(tokens);
        }
        if let Some(tokens) = &self.exclude_tokens {
            config.selection.excluded_tokens = split_csv(tokens);
        }
        if let Some(names) = &self.include_names {
            config.selection.included_names = split_csv(names);
        }
        if let Some(names) = &self.exclude_names {
            config.selection.excluded_names = split_csv(names);
        }
        if !self.extra_args.is_empty() {
            config.report.extra_args = self.extra_args.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.report.concurrency = concurrency;
        }

        // Build the immutable run configuration; this re-validates after
        // overrides.
        let run_config = match config.to_run_config() {
            Ok(rc) => rc,
            Err(e) => {
                tracing::error!(error = %e, "Configuration validation failed");
                eprintln!("Configuration validation failed: {e}");
                return Ok(2);
            }
        };

        // Confirmation prompt (unless --yes)
        if !self.yes {
            println!("Export Configuration:");
            println!("  Report: {}", run_config.report_kind);
            println!("  Scope: {}", run_config.report_scope_kind);
            println!("  Output: {}", run_config.output_mode);
            println!("  Directory: {}", run_config.output_dir.display());
            println!("  Tokens: {}", run_config.tokens.len());
            println!("  Concurrency: {}", run_config.effective_concurrency());
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(0);
            }
        }

        let user_key = config
            .platform
            .user_key
            .clone()
            .expect("user_key presence enforced by validation");
        let client = Arc::new(PlatformClient::new(
            config.platform.base_url.clone(),
            user_key,
        ));

        tracing::info!(
            report = %run_config.report_kind,
            output = %run_config.output_mode,
            concurrency = run_config.effective_concurrency(),
            "Executing bulk export"
        );
        println!("🚀 Starting export...");
        println!();

        let coordinator = RunCoordinator::new(client, run_config);
        let summary = match coordinator.execute().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(match e {
                    QuarryError::Platform(_) => 4, // Connection error exit code
                    _ => 5,                        // Fatal error exit code
                });
            }
        };

        // Display summary
        println!();
        println!("📊 Export Summary:");
        println!("  Targets: {}", summary.total_targets);
        println!("  Successful: {}", summary.successful);
        println!("  Failed: {}", summary.failed);
        println!("  Skipped tokens: {}", summary.skipped_tokens);
        println!("  Skipped organizations: {}", summary.skipped_orgs);
        println!("  Artifacts written: {}", summary.artifacts_written);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!("  Success Rate: {:.2}%", summary.success_rate());
        println!();

        if !summary.errors.is_empty() {
            println!("⚠️  Errors encountered:");
            for error in &summary.errors {
                println!("  - {:?}: {}", error.error_type, error.message);
                if let Some(context) = &error.context {
                    println!("    Context: {context}");
                }
            }
            println!();
        }

        let exit_code = if summary.is_successful() {
            if summary.total_targets == 0 {
                println!("✅ Nothing to export - no scopes matched the selection");
            } else {
                println!("✅ Export completed successfully!");
            }
            0
        } else {
            println!("⚠️  Export completed with failures");
            1 // Partial success
        };

        Ok(exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_csv() {
        assert_eq!(
            split_csv("a, b ,c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(split_csv("a,,b"), vec!["a".to_string(), "b".to_string()]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn test_export_args_defaults() {
        let args = ExportArgs {
            report: None,
            output_type: None,
            scope: None,
            token: None,
            token_type: None,
            user_key: None,
            url: None,
            output_dir: None,
            include_tokens: None,
            exclude_tokens: None,
            include_names: None,
            exclude_names: None,
            extra_args: Vec::new(),
            concurrency: None,
            yes: false,
        };

        assert!(!args.yes);
        assert!(args.report.is_none());
        assert!(args.extra_args.is_empty());
    }
}
