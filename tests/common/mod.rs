// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! In-memory platform fake shared by the integration tests

use async_trait::async_trait;
use quarry::adapters::platform::PlatformApi;
use quarry::config::{RunConfig, TokenType};
use quarry::domain::errors::PlatformError;
use quarry::domain::{
    ExtraArgs, InclusionSpec, Organization, OutputMode, Record, ReportKind, ReportPayload, Scope,
    ScopeKind, ScopeToken,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Configurable in-memory platform
#[derive(Default)]
pub struct FakePlatform {
    pub orgs: Vec<Organization>,
    /// Scopes (products and projects) per organization token
    pub scopes: HashMap<ScopeToken, Vec<Scope>>,
    /// Child projects per product token
    pub children: HashMap<ScopeToken, Vec<Scope>>,
    /// Global name index
    pub names: HashMap<String, Vec<ScopeToken>>,
    /// Fetches for these scope tokens fail with a server error
    pub fail_fetch: HashSet<ScopeToken>,
    /// Canned payloads per scope token; anything else gets a default
    /// one-record payload
    pub payloads: HashMap<ScopeToken, ReportPayload>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org(mut self, token: &str, name: &str, disabled: bool) -> Self {
        self.orgs.push(Organization {
            token: ScopeToken::new(token),
            name: name.to_string(),
            disabled,
        });
        self
    }

    pub fn with_product(mut self, org: &str, token: &str, name: &str) -> Self {
        self.scopes
            .entry(ScopeToken::new(org))
            .or_default()
            .push(product(token, name));
        self
    }

    pub fn with_project(mut self, org: &str, product_token: &str, token: &str, name: &str) -> Self {
        let scope = project(token, name, product_token);
        self.scopes
            .entry(ScopeToken::new(org))
            .or_default()
            .push(scope.clone());
        self.children
            .entry(ScopeToken::new(product_token))
            .or_default()
            .push(scope);
        self
    }

    pub fn with_name(mut self, name: &str, tokens: &[&str]) -> Self {
        self.names.insert(
            name.to_string(),
            tokens.iter().map(|t| ScopeToken::new(*t)).collect(),
        );
        self
    }

    pub fn failing_fetch(mut self, token: &str) -> Self {
        self.fail_fetch.insert(ScopeToken::new(token));
        self
    }

    pub fn with_payload(mut self, token: &str, payload: ReportPayload) -> Self {
        self.payloads.insert(ScopeToken::new(token), payload);
        self
    }
}

pub fn product(token: &str, name: &str) -> Scope {
    Scope {
        token: ScopeToken::new(token),
        kind: ScopeKind::Product,
        name: name.to_string(),
        product_name: None,
    }
}

pub fn project(token: &str, name: &str, product_name: &str) -> Scope {
    Scope {
        token: ScopeToken::new(token),
        kind: ScopeKind::Project,
        name: name.to_string(),
        product_name: Some(product_name.to_string()),
    }
}

pub fn record(pairs: &[(&str, Value)]) -> Record {
    let mut map = Map::new();
    for (key, value) in pairs {
        map.insert(key.to_string(), value.clone());
    }
    map
}

/// Default payload: one record naming the scope it came from
fn default_payload(token: &ScopeToken) -> ReportPayload {
    ReportPayload::Records(vec![record(&[
        ("scope", Value::from(token.as_str())),
        ("severity", Value::from("high")),
    ])])
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn organizations(&self) -> Result<Vec<Organization>, PlatformError> {
        Ok(self.orgs.clone())
    }

    async fn organization_details(
        &self,
        org_token: &ScopeToken,
    ) -> Result<Organization, PlatformError> {
        self.orgs
            .iter()
            .find(|o| o.token == *org_token)
            .cloned()
            .ok_or_else(|| PlatformError::ScopeNotFound(org_token.to_string()))
    }

    async fn scopes(
        &self,
        org_token: &ScopeToken,
        kind: ScopeKind,
        _expand_names: bool,
    ) -> Result<Vec<Scope>, PlatformError> {
        let org = self
            .orgs
            .iter()
            .find(|o| o.token == *org_token)
            .ok_or_else(|| PlatformError::ScopeNotFound(org_token.to_string()))?;
        if org.disabled {
            return Err(PlatformError::InactiveOrganization(org.name.clone()));
        }
        Ok(self
            .scopes
            .get(org_token)
            .map(|scopes| {
                scopes
                    .iter()
                    .filter(|s| s.kind == kind)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn scope_by_token(
        &self,
        org_token: &ScopeToken,
        token: &ScopeToken,
    ) -> Result<Scope, PlatformError> {
        self.scopes
            .get(org_token)
            .and_then(|scopes| scopes.iter().find(|s| s.token == *token))
            .cloned()
            .ok_or_else(|| PlatformError::ScopeNotFound(token.to_string()))
    }

    async fn child_projects(
        &self,
        _org_token: &ScopeToken,
        product_token: &ScopeToken,
    ) -> Result<Vec<Scope>, PlatformError> {
        Ok(self
            .children
            .get(product_token)
            .cloned()
            .unwrap_or_default())
    }

    async fn tokens_from_name(&self, name: &str) -> Result<Vec<ScopeToken>, PlatformError> {
        Ok(self.names.get(name).cloned().unwrap_or_default())
    }

    async fn fetch_report(
        &self,
        scope_token: &ScopeToken,
        _scope_kind: ScopeKind,
        _kind: ReportKind,
        binary: bool,
        _extra_args: &ExtraArgs,
    ) -> Result<ReportPayload, PlatformError> {
        if self.fail_fetch.contains(scope_token) {
            return Err(PlatformError::ServerError {
                status: 500,
                message: format!("injected failure for {scope_token}"),
            });
        }
        if let Some(payload) = self.payloads.get(scope_token) {
            return Ok(payload.clone());
        }
        if binary {
            Ok(ReportPayload::Binary(
                format!("report:{scope_token}").into_bytes(),
            ))
        } else {
            Ok(default_payload(scope_token))
        }
    }
}

/// Run configuration for tests, pointed at a temp directory
pub fn run_config(dir: &Path) -> RunConfig {
    RunConfig {
        report_kind: ReportKind::Vulnerability,
        output_mode: OutputMode::Json,
        report_scope_kind: ScopeKind::Product,
        output_dir: dir.to_path_buf(),
        concurrency: 4,
        extra_args: ExtraArgs::new(),
        token_type: TokenType::Organization,
        tokens: vec![ScopeToken::new("org-1")],
        selection: InclusionSpec::default(),
    }
}

pub fn tokens(raw: &[&str]) -> HashSet<ScopeToken> {
    raw.iter().map(|t| ScopeToken::new(*t)).collect()
}
