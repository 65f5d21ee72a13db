// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Configuration schema types
//!
//! The TOML file carries the stable operator surface; the CLI can override
//! most of it per run. Validation is eager: every configuration error is
//! caught before the first fetch, so a run never leaves partial output
//! behind a bad config.

use crate::config::SecretString;
use crate::domain::{
    parse_extra_arg, ExtraArgs, InclusionSpec, OutputMode, QuarryError, ReportKind, ScopeKind,
    ScopeToken,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// What a credential token spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Token names a single organization
    #[default]
    Organization,
    /// Token spans every organization under a global account
    Umbrella,
}

impl TokenType {
    /// Label used on the CLI and in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Organization => "organization",
            TokenType::Umbrella => "umbrella",
        }
    }

    /// Parses a token type from its label
    pub fn parse(s: &str) -> Option<TokenType> {
        match s.to_lowercase().as_str() {
            "organization" => Some(TokenType::Organization),
            "umbrella" => Some(TokenType::Umbrella),
            _ => None,
        }
    }
}

/// Main Quarry configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarryConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Platform connection and credentials
    pub platform: PlatformConfig,

    /// Report selection and output settings
    pub report: ReportConfig,

    /// Scope include/exclude selection
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl QuarryConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.platform.validate()?;
        self.report.validate()?;
        self.logging.validate()?;

        // Asynchronous kinds produce discrete named artifacts; there is
        // nothing to merge into a unified document.
        let kind = ReportKind::parse(&self.report.kind).map_err(|e| e.to_string())?;
        let mode = OutputMode::parse(&self.report.output_mode).map_err(|e| e.to_string())?;
        if kind.descriptor().asynchronous && mode.is_unified() {
            return Err(format!(
                "Report kind '{}' is asynchronous and cannot be combined with unified output mode '{}'",
                kind, mode
            ));
        }

        Ok(())
    }

    /// Builds the immutable per-run configuration from validated settings
    ///
    /// All derived values (typed enums, parsed extra arguments, token list)
    /// are computed here once; nothing downstream mutates configuration.
    pub fn to_run_config(&self) -> crate::domain::Result<RunConfig> {
        self.validate().map_err(QuarryError::Configuration)?;

        let report_kind = ReportKind::parse(&self.report.kind)?;
        let output_mode = OutputMode::parse(&self.report.output_mode)?;
        let report_scope_kind = ScopeKind::parse(&self.report.scope).ok_or_else(|| {
            QuarryError::Configuration(format!(
                "Invalid report scope '{}': must be 'product' or 'project'",
                self.report.scope
            ))
        })?;

        let mut extra_args = ExtraArgs::new();
        for raw in &self.report.extra_args {
            let (key, value) = parse_extra_arg(raw)?;
            extra_args.insert(key, value);
        }

        let tokens: Vec<ScopeToken> = self
            .platform
            .tokens
            .iter()
            .map(|t| ScopeToken::new(t.trim()))
            .collect();

        let selection = InclusionSpec {
            included_tokens: self
                .selection
                .included_tokens
                .iter()
                .map(|t| ScopeToken::new(t.trim()))
                .collect::<HashSet<_>>(),
            excluded_tokens: self
                .selection
                .excluded_tokens
                .iter()
                .map(|t| ScopeToken::new(t.trim()))
                .collect::<HashSet<_>>(),
            included_names: self.selection.included_names.clone(),
            excluded_names: self.selection.excluded_names.clone(),
        };

        Ok(RunConfig {
            report_kind,
            output_mode,
            report_scope_kind,
            output_dir: PathBuf::from(&self.report.output_dir),
            concurrency: self.report.concurrency,
            extra_args,
            token_type: self.platform.token_type,
            tokens,
            selection,
        })
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Platform connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User key used to authenticate every request
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub user_key: Option<SecretString>,

    /// Credential token(s); multiple organization tokens run a multi-org
    /// export
    #[serde(default)]
    pub tokens: Vec<String>,

    /// Whether the tokens name organizations or one umbrella account
    #[serde(default)]
    pub token_type: TokenType,
}

impl PlatformConfig {
    fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid platform base_url '{}': {}", self.base_url, e))?;

        match &self.user_key {
            None => return Err("platform.user_key is required".to_string()),
            Some(key) if key.expose_secret().is_empty() => {
                return Err("platform.user_key must not be empty".to_string())
            }
            Some(_) => {}
        }

        if self.tokens.is_empty() {
            return Err("platform.tokens requires at least one token".to_string());
        }
        if self.tokens.iter().any(|t| t.trim().is_empty()) {
            return Err("platform.tokens must not contain empty tokens".to_string());
        }
        if self.token_type == TokenType::Umbrella && self.tokens.len() > 1 {
            return Err("Multiple umbrella tokens are not supported".to_string());
        }

        Ok(())
    }
}

/// Report selection and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report kind to produce
    pub kind: String,

    /// Scope granularity of the report (product or project)
    #[serde(default = "default_report_scope")]
    pub scope: String,

    /// Output mode
    #[serde(default = "default_output_mode")]
    pub output_mode: String,

    /// Directory artifacts are written to; created if missing
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Concurrent fetch workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Extra key=value arguments forwarded to the report fetch
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl ReportConfig {
    fn validate(&self) -> Result<(), String> {
        ReportKind::parse(&self.kind).map_err(|e| e.to_string())?;
        OutputMode::parse(&self.output_mode).map_err(|e| e.to_string())?;

        match ScopeKind::parse(&self.scope) {
            Some(ScopeKind::Product) | Some(ScopeKind::Project) => {}
            _ => {
                return Err(format!(
                    "Invalid report scope '{}': must be 'product' or 'project'",
                    self.scope
                ))
            }
        }

        if self.concurrency == 0 {
            return Err("report.concurrency must be at least 1".to_string());
        }

        for raw in &self.extra_args {
            parse_extra_arg(raw).map_err(|e| e.to_string())?;
        }

        Ok(())
    }
}

/// Scope selection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Included scope tokens (empty selects every scope of the report
    /// granularity)
    #[serde(default)]
    pub included_tokens: Vec<String>,

    /// Excluded scope tokens
    #[serde(default)]
    pub excluded_tokens: Vec<String>,

    /// Names resolved into included tokens before filtering
    #[serde(default)]
    pub included_names: Vec<String>,

    /// Names resolved into excluded tokens before filtering
    #[serde(default)]
    pub excluded_names: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for local log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation policy (daily or hourly)
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

/// Immutable per-run configuration
///
/// Constructed once from a validated [`QuarryConfig`] and passed by
/// reference into each pipeline component. Derived values are computed up
/// front; nothing mutates this during a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Report kind to fetch
    pub report_kind: ReportKind,
    /// How payloads are routed to disk
    pub output_mode: OutputMode,
    /// Granularity reports are produced at (product or project)
    pub report_scope_kind: ScopeKind,
    /// Directory artifacts are written to
    pub output_dir: PathBuf,
    /// Requested fetch concurrency (forced to 1 for asynchronous kinds)
    pub concurrency: usize,
    /// Extra arguments forwarded to every fetch
    pub extra_args: ExtraArgs,
    /// Credential token span
    pub token_type: TokenType,
    /// Credential tokens
    pub tokens: Vec<ScopeToken>,
    /// Scope include/exclude selection
    pub selection: InclusionSpec,
}

impl RunConfig {
    /// True when the run spans more than one organization token
    pub fn is_multi_org(&self) -> bool {
        self.token_type == TokenType::Umbrella || self.tokens.len() > 1
    }

    /// Effective worker-pool size; asynchronous kinds are serialized
    /// because the backend cannot service concurrent asynchronous requests
    /// reliably.
    pub fn effective_concurrency(&self) -> usize {
        if self.report_kind.descriptor().asynchronous {
            1
        } else {
            self.concurrency
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://api.platform.example.com/api/v1.3".to_string()
}

fn default_report_scope() -> String {
    "product".to_string()
}

fn default_output_mode() -> String {
    "binary".to_string()
}

fn default_output_dir() -> String {
    "reports".to_string()
}

fn default_concurrency() -> usize {
    10
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn base_config() -> QuarryConfig {
        QuarryConfig {
            application: ApplicationConfig::default(),
            platform: PlatformConfig {
                base_url: default_base_url(),
                user_key: Some(secret_string("uk-1".to_string())),
                tokens: vec!["org-token-1".to_string()],
                token_type: TokenType::Organization,
            },
            report: ReportConfig {
                kind: "vulnerability".to_string(),
                scope: default_report_scope(),
                output_mode: default_output_mode(),
                output_dir: default_output_dir(),
                concurrency: default_concurrency(),
                extra_args: Vec::new(),
            },
            selection: SelectionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_missing_user_key() {
        let mut config = base_config();
        config.platform.user_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.contains("user_key"));
    }

    #[test]
    fn test_unknown_report_kind() {
        let mut config = base_config();
        config.report.kind = "telemetry".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.contains("telemetry"));
    }

    #[test]
    fn test_multiple_umbrella_tokens_rejected() {
        let mut config = base_config();
        config.platform.token_type = TokenType::Umbrella;
        config.platform.tokens = vec!["g1".to_string(), "g2".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.contains("umbrella"));
    }

    #[test]
    fn test_async_kind_with_unified_mode_rejected() {
        let mut config = base_config();
        config.report.kind = "attribution".to_string();
        config.report.output_mode = "unified_json".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.contains("asynchronous"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = base_config();
        config.report.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = base_config();
        config.platform.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_extra_arg_rejected() {
        let mut config = base_config();
        config.report.extra_args = vec!["noequals".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_run_config() {
        let mut config = base_config();
        config.report.kind = "due_diligence".to_string();
        config.report.scope = "project".to_string();
        config.report.output_mode = "unified_xlsx".to_string();
        config.report.extra_args = vec!["severities=high,critical".to_string()];
        config.selection.included_tokens = vec!["p1".to_string()];

        let run = config.to_run_config().unwrap();
        assert_eq!(run.report_kind, ReportKind::DueDiligence);
        assert_eq!(run.report_scope_kind, ScopeKind::Project);
        assert_eq!(run.output_mode, OutputMode::UnifiedXlsx);
        assert_eq!(run.effective_concurrency(), 10);
        assert!(run
            .selection
            .included_tokens
            .contains(&ScopeToken::new("p1")));
        assert!(run.extra_args.contains_key("severities"));
    }

    #[test]
    fn test_async_kind_forces_serial_fetching() {
        let mut config = base_config();
        config.report.kind = "attribution".to_string();
        let run = config.to_run_config().unwrap();
        assert_eq!(run.concurrency, 10);
        assert_eq!(run.effective_concurrency(), 1);
    }

    #[test]
    fn test_multi_org_detection() {
        let mut config = base_config();
        config.platform.tokens = vec!["a".to_string(), "b".to_string()];
        let run = config.to_run_config().unwrap();
        assert!(run.is_multi_org());

        let run = base_config().to_run_config().unwrap();
        assert!(!run.is_multi_org());
    }
}
