// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Run coordinator - main orchestrator for one bulk export
//!
//! Wires the pipeline together: gather organizations, resolve scopes into
//! targets, fan fetches out under the bounded pool, and finalize unified
//! output once the pool drains. Per-target failures are folded into the
//! summary; only configuration and connection problems abort the run.

use crate::adapters::platform::PlatformApi;
use crate::config::{RunConfig, TokenType};
use crate::core::fetch::FetchOrchestrator;
use crate::core::output::{OutputRouter, MULTI_ORG_LABEL};
use crate::core::resolve::ScopeResolver;
use crate::core::summary::{RunError, RunErrorType, RunSummary};
use crate::domain::{Organization, QuarryError, Result};
use std::sync::Arc;
use std::time::Instant;

/// Coordinates one bulk export run from resolution to final artifact
pub struct RunCoordinator {
    api: Arc<dyn PlatformApi>,
    config: RunConfig,
}

impl RunCoordinator {
    /// Create a new coordinator
    pub fn new(api: Arc<dyn PlatformApi>, config: RunConfig) -> Self {
        Self { api, config }
    }

    /// Execute the bulk export
    ///
    /// This is the main entry point. It:
    /// 1. Ensures the output directory exists
    /// 2. Gathers the organizations in scope
    /// 3. Resolves the include/exclude selection into report targets
    /// 4. Fetches one report per target under bounded concurrency
    /// 5. Finalizes unified output after the pool drains
    ///
    /// An empty target list or an empty unified payload are clean
    /// non-fatal outcomes.
    pub async fn execute(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::new();

        if !self.config.output_dir.exists() {
            tracing::info!(dir = %self.config.output_dir.display(), "Creating output directory");
            std::fs::create_dir_all(&self.config.output_dir)?;
        }

        let orgs = self.gather_organizations().await?;
        tracing::info!(count = orgs.len(), "Operating on organizations");

        let resolver = ScopeResolver::new(Arc::clone(&self.api));
        let resolution = resolver.resolve(&self.config, &orgs).await?;
        summary.total_targets = resolution.targets.len();
        summary.skipped_tokens = resolution.skipped_tokens;
        summary.skipped_orgs = resolution.skipped_orgs;

        if resolution.targets.is_empty() {
            tracing::warn!("No scopes were found to generate reports. Please check configuration");
            summary = summary.with_duration(start_time.elapsed());
            summary.log_summary();
            return Ok(summary);
        }

        let router = Arc::new(OutputRouter::new(self.config.output_mode));
        let orchestrator = FetchOrchestrator::new(Arc::clone(&self.api), Arc::clone(&router));
        let outcomes = orchestrator.run(resolution.targets, &self.config).await;

        for outcome in outcomes {
            match outcome.result {
                Ok(written) => {
                    summary.successful += 1;
                    summary.artifacts_written += written;
                }
                Err(e) => {
                    summary.failed += 1;
                    let error_type = match &e {
                        QuarryError::Platform(_) | QuarryError::Fetch(_) => RunErrorType::Fetch,
                        QuarryError::Output(_) | QuarryError::Io(_) => RunErrorType::Output,
                        _ => RunErrorType::Unknown,
                    };
                    summary.add_error(RunError::new(error_type, e.to_string()).with_context(
                        format!(
                            "target={}, org={}",
                            outcome.target.display_name, outcome.target.parent_org_name
                        ),
                    ));
                }
            }
        }

        // Unified rendering happens exactly once, after every worker has
        // reported.
        let org_label = self.unified_org_label(&orgs);
        match router.finalize(&self.config, &org_label) {
            Ok(Some(_)) => summary.artifacts_written += 1,
            Ok(None) => {}
            Err(e) => {
                summary.add_error(RunError::new(RunErrorType::Output, e.to_string()));
            }
        }

        summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    /// Gathers the organizations the run spans
    ///
    /// Umbrella credentials enumerate every organization underneath;
    /// organization tokens are looked up individually. Failures here are
    /// fatal - without organizations there is nothing to resolve against.
    async fn gather_organizations(&self) -> Result<Vec<Organization>> {
        match self.config.token_type {
            TokenType::Umbrella => {
                let orgs = self.api.organizations().await?;
                tracing::info!(
                    count = orgs.len(),
                    "Found organizations under umbrella token"
                );
                Ok(orgs)
            }
            TokenType::Organization => {
                let mut orgs = Vec::with_capacity(self.config.tokens.len());
                for token in &self.config.tokens {
                    orgs.push(self.api.organization_details(token).await?);
                }
                Ok(orgs)
            }
        }
    }

    /// Label used in the unified artifact filename
    fn unified_org_label(&self, orgs: &[Organization]) -> String {
        if orgs.len() == 1 {
            orgs[0].name.clone()
        } else {
            MULTI_ORG_LABEL.to_string()
        }
    }
}
