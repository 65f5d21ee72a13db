// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "quarry.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Quarry configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set QUARRY_USER_KEY in the environment (or a .env file)");
                println!("  3. Validate configuration: quarry validate-config");
                println!("  4. Run export: quarry export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate sample configuration
    fn generate_config() -> String {
        r#"# Quarry Configuration File
# Bulk compliance and security report exporter

[application]
log_level = "info"

[platform]
base_url = "https://api.platform.example.com/api/v1.3"
user_key = "${QUARRY_USER_KEY}"
# Organization token(s); multiple tokens run a multi-org export.
tokens = ["your-org-token"]
# "organization" or "umbrella" (a credential spanning all organizations)
token_type = "organization"

[report]
# vulnerability | inventory | due_diligence | attribution | risk
# | source_files | in_house_libraries
kind = "vulnerability"
# product | project
scope = "product"
# binary | json | unified_json | unified_xlsx | unified_xlsx_per_sheet
output_mode = "binary"
output_dir = "reports"
concurrency = 10
# Extra key=value arguments forwarded to the report fetch:
# extra_args = ["severities=high,critical"]

[selection]
# Empty selection exports every scope of the report granularity.
included_tokens = []
excluded_tokens = []
included_names = []
excluded_names = []

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_parses_and_validates() {
        std::env::set_var("QUARRY_USER_KEY", "uk-sample");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarry.toml");
        fs::write(&path, InitArgs::generate_config()).unwrap();

        let config = crate::config::load_config(&path).unwrap();
        assert_eq!(config.report.kind, "vulnerability");
        assert!(config.to_run_config().is_ok());
        std::env::remove_var("QUARRY_USER_KEY");
    }
}
