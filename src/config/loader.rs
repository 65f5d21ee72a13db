// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{QuarryConfig, TokenType};
use crate::config::secret_string;
use crate::domain::errors::QuarryError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into QuarryConfig
/// 4. Applies environment variable overrides (QUARRY_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use quarry::config::loader::load_config;
///
/// let config = load_config("quarry.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<QuarryConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(QuarryError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        QuarryError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: QuarryConfig = toml::from_str(&contents)
        .map_err(|e| QuarryError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        QuarryError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(QuarryError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the QUARRY_* prefix
///
/// Environment variables follow the pattern: QUARRY_<SECTION>_<KEY>
/// For example: QUARRY_PLATFORM_USER_KEY, QUARRY_REPORT_KIND
fn apply_env_overrides(config: &mut QuarryConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("QUARRY_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Platform overrides
    if let Ok(val) = std::env::var("QUARRY_PLATFORM_BASE_URL") {
        config.platform.base_url = val;
    }
    if let Ok(val) = std::env::var("QUARRY_PLATFORM_USER_KEY") {
        config.platform.user_key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("QUARRY_PLATFORM_TOKENS") {
        config.platform.tokens = val.split(',').map(|t| t.trim().to_string()).collect();
    }
    if let Ok(val) = std::env::var("QUARRY_PLATFORM_TOKEN_TYPE") {
        if let Some(token_type) = TokenType::parse(&val) {
            config.platform.token_type = token_type;
        }
    }

    // Report overrides
    if let Ok(val) = std::env::var("QUARRY_REPORT_KIND") {
        config.report.kind = val;
    }
    if let Ok(val) = std::env::var("QUARRY_REPORT_SCOPE") {
        config.report.scope = val;
    }
    if let Ok(val) = std::env::var("QUARRY_REPORT_OUTPUT_MODE") {
        config.report.output_mode = val;
    }
    if let Ok(val) = std::env::var("QUARRY_REPORT_OUTPUT_DIR") {
        config.report.output_dir = val;
    }
    if let Ok(val) = std::env::var("QUARRY_REPORT_CONCURRENCY") {
        if let Ok(concurrency) = val.parse() {
            config.report.concurrency = concurrency;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("QUARRY_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("QUARRY_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
