// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Scope resolution
//!
//! Turns the raw include/exclude specification into the final deduplicated
//! list of report targets. The order is fixed: names are resolved to
//! tokens first, then the shallow filter removes tokens present in both
//! sets, then coarse tokens are expanded per organization, and finally the
//! deep filter drops the remaining exclusions from the expanded set.
//!
//! Resolution failures are recoverable: unknown tokens, tokens of the
//! wrong granularity, and disabled organizations are logged and skipped
//! without aborting the run.

use crate::adapters::platform::PlatformApi;
use crate::config::RunConfig;
use crate::domain::{Organization, ReportTarget, Result, Scope, ScopeKind, ScopeToken};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::sanitize;

/// Outcome of scope resolution
#[derive(Debug, Default)]
pub struct Resolution {
    /// Final deduplicated targets, one per fetch
    pub targets: Vec<ReportTarget>,
    /// Tokens dropped during resolution (unknown, wrong granularity)
    pub skipped_tokens: usize,
    /// Organizations skipped because they are disabled
    pub skipped_orgs: usize,
}

/// Resolves include/exclude specifications into report targets
pub struct ScopeResolver {
    api: Arc<dyn PlatformApi>,
}

/// Per-organization expansion result, merged by [`ScopeResolver::resolve`]
struct OrgScopes {
    org_name: String,
    scopes: Vec<Scope>,
    skipped_tokens: usize,
    org_skipped: bool,
}

impl ScopeResolver {
    /// Create a new resolver over a platform API
    pub fn new(api: Arc<dyn PlatformApi>) -> Self {
        Self { api }
    }

    /// Resolve the final target list
    ///
    /// An empty result is a valid, non-fatal outcome; the caller ends the
    /// run cleanly without fetching.
    pub async fn resolve(
        &self,
        config: &RunConfig,
        orgs: &[Organization],
    ) -> Result<Resolution> {
        let spec = &config.selection;

        // Whether anything was ever included decides between per-token
        // expansion and enumerate-all. Decided on the raw spec: a selection
        // that filters down to nothing yields no targets, it does not fall
        // back to exporting everything.
        let enumerate_all = spec.included_tokens.is_empty() && spec.included_names.is_empty();

        // Step 1: names become tokens before any filtering runs.
        let mut included = spec.included_tokens.clone();
        let mut excluded = spec.excluded_tokens.clone();
        self.resolve_names(&spec.included_names, &mut included, "included")
            .await;
        self.resolve_names(&spec.excluded_names, &mut excluded, "excluded")
            .await;

        // Step 2: shallow filter. A token both included and excluded is
        // treated as unspecified, not as excluded.
        let intersection: HashSet<ScopeToken> =
            included.intersection(&excluded).cloned().collect();
        if !intersection.is_empty() {
            tracing::debug!(
                removed = intersection.len(),
                "Shallow filter removed tokens present in both sets"
            );
            included.retain(|t| !intersection.contains(t));
            excluded.retain(|t| !intersection.contains(t));
        }

        // Step 3: expand per organization, each under its own permit.
        let included = Arc::new(included);
        let semaphore = Arc::new(Semaphore::new(config.concurrency));
        let mut handles = Vec::with_capacity(orgs.len());
        for org in orgs {
            let api = Arc::clone(&self.api);
            let included = Arc::clone(&included);
            let semaphore = Arc::clone(&semaphore);
            let org = org.clone();
            let report_scope_kind = config.report_scope_kind;
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.expect("Semaphore closed");
                expand_org(api, org, included, report_scope_kind, enumerate_all).await
            }));
        }

        let mut resolution = Resolution::default();
        let mut seen: HashSet<ScopeToken> = HashSet::new();
        for joined in futures::future::join_all(handles).await {
            let org_scopes =
                joined.map_err(|e| crate::domain::QuarryError::Resolution(e.to_string()))?;
            resolution.skipped_tokens += org_scopes.skipped_tokens;
            if org_scopes.org_skipped {
                resolution.skipped_orgs += 1;
            }
            for scope in org_scopes.scopes {
                // Step 4: deep filter on the expanded set, then global
                // dedup by token.
                if excluded.contains(&scope.token) {
                    tracing::debug!(token = %scope.token, "Deep filter dropped excluded scope");
                    continue;
                }
                if !seen.insert(scope.token.clone()) {
                    continue;
                }
                resolution
                    .targets
                    .push(build_target(scope, &org_scopes.org_name, config));
            }
        }

        if resolution.targets.is_empty() {
            tracing::warn!("No scopes were found to generate reports");
        } else {
            tracing::info!(
                targets = resolution.targets.len(),
                "Resolved report targets"
            );
        }

        Ok(resolution)
    }

    /// Resolves names into the given token set; failed lookups are skipped
    async fn resolve_names(
        &self,
        names: &[String],
        tokens: &mut HashSet<ScopeToken>,
        label: &str,
    ) {
        for name in names {
            match self.api.tokens_from_name(name).await {
                Ok(resolved) if resolved.is_empty() => {
                    tracing::warn!(name = %name, "No {label} scope matches name, skipping");
                }
                Ok(resolved) => {
                    tracing::debug!(name = %name, count = resolved.len(), "Resolved {label} name");
                    tokens.extend(resolved);
                }
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "Failed to resolve {label} name, skipping");
                }
            }
        }
    }
}

/// Expands the included token set within one organization
///
/// With nothing included, every scope of the report granularity is
/// enumerated. Coarser tokens (an organization under product scope, a
/// product under project scope) expand to their children; finer tokens are
/// skipped with a warning.
async fn expand_org(
    api: Arc<dyn PlatformApi>,
    org: Organization,
    included: Arc<HashSet<ScopeToken>>,
    report_scope_kind: ScopeKind,
    enumerate_all: bool,
) -> OrgScopes {
    let mut result = OrgScopes {
        org_name: org.name.clone(),
        scopes: Vec::new(),
        skipped_tokens: 0,
        org_skipped: false,
    };

    if org.disabled {
        tracing::warn!(org = %org.name, "Organization is disabled and will be skipped");
        result.org_skipped = true;
        return result;
    }

    if enumerate_all {
        match api.scopes(&org.token, report_scope_kind, true).await {
            Ok(scopes) => result.scopes = scopes,
            Err(crate::domain::PlatformError::InactiveOrganization(_)) => {
                tracing::warn!(org = %org.name, "Organization is disabled and will be skipped");
                result.org_skipped = true;
            }
            Err(e) => {
                tracing::warn!(org = %org.name, error = %e, "Failed to enumerate scopes, skipping organization");
                result.org_skipped = true;
            }
        }
        return result;
    }

    if included.is_empty() {
        tracing::debug!(org = %org.name, "Selection filtered down to nothing, no scopes to expand");
        return result;
    }

    for token in included.iter() {
        match api.scope_by_token(&org.token, token).await {
            Ok(scope) if scope.kind == report_scope_kind => result.scopes.push(scope),
            Ok(scope) if scope.kind.is_coarser_than(report_scope_kind) => {
                match expand_coarse_scope(&api, &org.token, &scope, report_scope_kind).await {
                    Ok(children) => {
                        tracing::debug!(
                            token = %token,
                            kind = %scope.kind,
                            children = children.len(),
                            "Expanded coarse scope to report granularity"
                        );
                        result.scopes.extend(children);
                    }
                    Err(e) => {
                        tracing::warn!(token = %token, error = %e, "Failed to expand scope, skipping");
                        result.skipped_tokens += 1;
                    }
                }
            }
            Ok(scope) => {
                tracing::warn!(
                    token = %token,
                    kind = %scope.kind,
                    report_scope = %report_scope_kind,
                    "Token is finer-grained than the report scope and will be skipped"
                );
                result.skipped_tokens += 1;
            }
            Err(crate::domain::PlatformError::ScopeNotFound(_)) => {
                tracing::warn!(org = %org.name, token = %token, "Token does not exist in organization and will be skipped");
                result.skipped_tokens += 1;
            }
            Err(e) => {
                tracing::warn!(org = %org.name, token = %token, error = %e, "Failed to look up token, skipping");
                result.skipped_tokens += 1;
            }
        }
    }

    result
}

/// Expands one coarse scope down to the report granularity
async fn expand_coarse_scope(
    api: &Arc<dyn PlatformApi>,
    org_token: &ScopeToken,
    scope: &Scope,
    report_scope_kind: ScopeKind,
) -> std::result::Result<Vec<Scope>, crate::domain::PlatformError> {
    match scope.kind {
        ScopeKind::Product => api.child_projects(org_token, &scope.token).await,
        ScopeKind::Organization => api.scopes(org_token, report_scope_kind, true).await,
        ScopeKind::Project => Ok(vec![scope.clone()]),
    }
}

/// Builds the immutable work unit for one resolved scope
///
/// The output path embeds the organization name only for multi-org runs;
/// single-org filenames match the single-tenant layout.
fn build_target(scope: Scope, org_name: &str, config: &RunConfig) -> ReportTarget {
    let display_name = scope.display_name();
    let extension = config.output_mode.extension(config.report_kind);
    let org_part = if config.is_multi_org() {
        format!("_org_{}", sanitize(org_name))
    } else {
        String::new()
    };
    let filename = format!(
        "{}_{}{}_{}.{}",
        scope.kind.as_str(),
        sanitize(&display_name),
        org_part,
        config.report_kind.as_str(),
        extension
    );

    ReportTarget {
        token: scope.token,
        kind: scope.kind,
        display_name,
        parent_org_name: org_name.to_string(),
        output_path: config.output_dir.join(filename),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunConfig, TokenType};
    use crate::domain::{InclusionSpec, OutputMode, ReportKind};
    use std::path::PathBuf;

    fn run_config(multi_org: bool) -> RunConfig {
        RunConfig {
            report_kind: ReportKind::Vulnerability,
            output_mode: OutputMode::Binary,
            report_scope_kind: ScopeKind::Product,
            output_dir: PathBuf::from("reports"),
            concurrency: 10,
            extra_args: Default::default(),
            token_type: TokenType::Organization,
            tokens: if multi_org {
                vec![ScopeToken::new("o1"), ScopeToken::new("o2")]
            } else {
                vec![ScopeToken::new("o1")]
            },
            selection: InclusionSpec::default(),
        }
    }

    #[test]
    fn test_build_target_single_org() {
        let scope = Scope {
            token: ScopeToken::new("p1"),
            kind: ScopeKind::Product,
            name: "Payments".to_string(),
            product_name: None,
        };
        let target = build_target(scope, "Acme", &run_config(false));
        assert_eq!(
            target.output_path,
            PathBuf::from("reports/product_Payments_vulnerability.xlsx")
        );
        assert_eq!(target.parent_org_name, "Acme");
    }

    #[test]
    fn test_build_target_multi_org_embeds_org_name() {
        let scope = Scope {
            token: ScopeToken::new("p1"),
            kind: ScopeKind::Product,
            name: "Payments".to_string(),
            product_name: None,
        };
        let target = build_target(scope, "Acme/EU", &run_config(true));
        assert_eq!(
            target.output_path,
            PathBuf::from("reports/product_Payments_org_Acme_EU_vulnerability.xlsx")
        );
    }

    #[test]
    fn test_build_target_sanitizes_display_name() {
        let scope = Scope {
            token: ScopeToken::new("pj1"),
            kind: ScopeKind::Project,
            name: "web: frontend".to_string(),
            product_name: Some("Platform".to_string()),
        };
        let mut config = run_config(false);
        config.report_scope_kind = ScopeKind::Project;
        let target = build_target(scope, "Acme", &config);
        assert_eq!(
            target.output_path,
            PathBuf::from("reports/project_web_ frontend_Platform_vulnerability.xlsx")
        );
    }
}
