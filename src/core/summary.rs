// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Run summary and reporting
//!
//! This module defines structures for tracking and reporting bulk export
//! results.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Category of a per-target error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunErrorType {
    /// Scope resolution failure
    Resolution,
    /// Report fetch failure
    Fetch,
    /// Artifact write failure
    Output,
    /// Anything else
    Unknown,
}

/// One recorded error with optional context
#[derive(Debug, Clone)]
pub struct RunError {
    /// Error category
    pub error_type: RunErrorType,
    /// Error message
    pub message: String,
    /// Additional context (target name, organization)
    pub context: Option<String>,
}

impl RunError {
    /// Create a new run error
    pub fn new(error_type: RunErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            context: None,
        }
    }

    /// Attach context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Summary of one bulk export run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Number of resolved report targets
    pub total_targets: usize,

    /// Targets whose fetch and routing succeeded
    pub successful: usize,

    /// Targets that failed fetching or writing
    pub failed: usize,

    /// Tokens dropped during resolution
    pub skipped_tokens: usize,

    /// Organizations skipped (disabled)
    pub skipped_orgs: usize,

    /// Artifacts written to disk
    pub artifacts_written: usize,

    /// Duration of the run
    pub duration: Duration,

    /// Errors encountered
    pub errors: Vec<RunError>,
}

impl RunSummary {
    /// Create a new empty run summary
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            total_targets: 0,
            successful: 0,
            failed: 0,
            skipped_tokens: 0,
            skipped_orgs: 0,
            artifacts_written: 0,
            duration: Duration::from_secs(0),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: RunError) {
        self.errors.push(error);
    }

    /// True when every target succeeded
    ///
    /// An empty target list counts as success; "nothing to do" is a clean
    /// outcome, not a failure.
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }

    /// Success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_targets == 0 {
            return 100.0;
        }
        (self.successful as f64 / self.total_targets as f64) * 100.0
    }

    /// Log the summary at info level
    pub fn log_summary(&self) {
        tracing::info!(
            total_targets = self.total_targets,
            successful = self.successful,
            failed = self.failed,
            skipped_tokens = self.skipped_tokens,
            skipped_orgs = self.skipped_orgs,
            artifacts_written = self.artifacts_written,
            duration_secs = self.duration.as_secs_f64(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Run completed"
        );
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}
