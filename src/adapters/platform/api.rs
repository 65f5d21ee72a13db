// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Platform API trait definition
//!
//! This module defines the `PlatformApi` trait that abstracts the reporting
//! backend. The resolver and orchestrator only ever see this interface,
//! which keeps the HTTP transport out of the pipeline and lets tests drive
//! the whole pipeline with an in-memory implementation.

use crate::domain::errors::PlatformError;
use crate::domain::{
    ExtraArgs, Organization, ReportKind, ReportPayload, Scope, ScopeKind, ScopeToken,
};
use async_trait::async_trait;

/// Trait for reporting platform implementations
///
/// All scope lookups are per-organization except [`tokens_from_name`],
/// which queries the platform's global name index.
///
/// [`tokens_from_name`]: PlatformApi::tokens_from_name
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// List every organization under an umbrella credential
    async fn organizations(&self) -> Result<Vec<Organization>, PlatformError>;

    /// Fetch details of a single organization by its token
    async fn organization_details(
        &self,
        org_token: &ScopeToken,
    ) -> Result<Organization, PlatformError>;

    /// List all scopes of `kind` under an organization
    ///
    /// With `expand_names` set, project scopes carry their parent product
    /// name for filename construction.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InactiveOrganization`] for disabled
    /// organizations; callers skip those and continue.
    async fn scopes(
        &self,
        org_token: &ScopeToken,
        kind: ScopeKind,
        expand_names: bool,
    ) -> Result<Vec<Scope>, PlatformError>;

    /// Look up a single scope by its token within an organization
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::ScopeNotFound`] when the token does not
    /// exist or belongs to another organization.
    async fn scope_by_token(
        &self,
        org_token: &ScopeToken,
        token: &ScopeToken,
    ) -> Result<Scope, PlatformError>;

    /// List the child projects of a product
    async fn child_projects(
        &self,
        org_token: &ScopeToken,
        product_token: &ScopeToken,
    ) -> Result<Vec<Scope>, PlatformError>;

    /// Resolve a display name to zero or more scope tokens
    async fn tokens_from_name(&self, name: &str) -> Result<Vec<ScopeToken>, PlatformError>;

    /// Fetch one report for one scope
    ///
    /// `binary` selects the raw rendition; otherwise a structured record
    /// list is returned. Asynchronous kinds return a named map of
    /// sub-payloads regardless of `binary`.
    async fn fetch_report(
        &self,
        scope_token: &ScopeToken,
        scope_kind: ScopeKind,
        kind: ReportKind,
        binary: bool,
        extra_args: &ExtraArgs,
    ) -> Result<ReportPayload, PlatformError>;
}
