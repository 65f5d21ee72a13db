// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Quarry using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Quarry - Bulk Compliance Report Exporter
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(version, about, long_about = None)]
#[command(author = "Quarry Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "quarry.toml", env = "QUARRY_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "QUARRY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bulk-export reports across the configured scopes
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from(["quarry", "export"]);
        assert_eq!(cli.config, "quarry.toml");
        assert!(matches!(cli.command, Commands::Export(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["quarry", "--config", "custom.toml", "export"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["quarry", "--log-level", "debug", "export"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["quarry", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["quarry", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_parse_export_overrides() {
        let cli = Cli::parse_from([
            "quarry",
            "export",
            "--report",
            "vulnerability",
            "--output-type",
            "unified_xlsx",
            "--yes",
        ]);
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.report, Some("vulnerability".to_string()));
                assert_eq!(args.output_type, Some("unified_xlsx".to_string()));
                assert!(args.yes);
            }
            _ => panic!("Expected export command"),
        }
    }
}
