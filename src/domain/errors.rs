// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Domain error types
//!
//! All errors are domain-specific and don't expose third-party types.
//! The taxonomy mirrors the run lifecycle: configuration errors are fatal
//! and checked eagerly, resolution/fetch/output errors are recoverable at
//! the per-entry level and never abort the run.

use thiserror::Error;

/// Main Quarry error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum QuarryError {
    /// Configuration-related errors (fatal, detected at startup)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Platform API errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Scope resolution errors (recoverable, per-entry)
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Report fetch errors (recoverable, per-target)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Output routing/writing errors (recoverable, per-target)
    #[error("Output error: {0}")]
    Output(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Platform-specific errors
///
/// Errors that occur when interacting with the reporting platform.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Failed to connect to the platform
    #[error("Failed to connect to platform: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Scope token not found or belongs to another organization
    #[error("Scope not found: {0}")]
    ScopeNotFound(String),

    /// Organization is disabled on the platform
    #[error("Organization is inactive: {0}")]
    InactiveOrganization(String),

    /// Report kind rejected by the platform
    #[error("Report not available: {0}")]
    ReportUnavailable(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for QuarryError {
    fn from(err: std::io::Error) -> Self {
        QuarryError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for QuarryError {
    fn from(err: serde_json::Error) -> Self {
        QuarryError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for QuarryError {
    fn from(err: toml::de::Error) -> Self {
        QuarryError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarry_error_display() {
        let err = QuarryError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_platform_error_conversion() {
        let platform_err = PlatformError::ConnectionFailed("Network error".to_string());
        let quarry_err: QuarryError = platform_err.into();
        assert!(matches!(quarry_err, QuarryError::Platform(_)));
    }

    #[test]
    fn test_inactive_org_display() {
        let err = PlatformError::InactiveOrganization("Acme Corp".to_string());
        assert_eq!(err.to_string(), "Organization is inactive: Acme Corp");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let quarry_err: QuarryError = io_err.into();
        assert!(matches!(quarry_err, QuarryError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let quarry_err: QuarryError = json_err.into();
        assert!(matches!(quarry_err, QuarryError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let quarry_err: QuarryError = toml_err.into();
        assert!(matches!(quarry_err, QuarryError::Configuration(_)));
        assert!(quarry_err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_quarry_error_implements_std_error() {
        let err = QuarryError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn test_platform_error_implements_std_error() {
        let err = PlatformError::ConnectionFailed("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
