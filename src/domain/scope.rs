// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Scope types for the multi-tenant hierarchy
//!
//! The platform organizes tenants as organization → product → project.
//! Every scope is addressed by an opaque token issued by the backend; this
//! module provides the newtype wrapper for tokens plus the typed scope
//! models the resolver and orchestrator operate on.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Opaque scope identifier issued by the platform
///
/// Uniquely identifies one organization, product, or project. Tokens are
/// treated as opaque strings; no format is assumed.
///
/// # Examples
///
/// ```
/// use quarry::domain::scope::ScopeToken;
///
/// let token = ScopeToken::new("a1b2c3d4");
/// assert_eq!(token.as_str(), "a1b2c3d4");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeToken(String);

impl ScopeToken {
    /// Creates a new token from a string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ScopeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ScopeToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ScopeToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of a scope in the tenant hierarchy
///
/// Ordering reflects granularity: `Organization` is the coarsest,
/// `Project` the finest. Expansion during resolution only ever moves from
/// coarse to fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// Top-level tenant
    Organization,
    /// Product under an organization
    Product,
    /// Project under a product
    Project,
}

impl ScopeKind {
    /// Lowercase label used in filenames and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Organization => "organization",
            ScopeKind::Product => "product",
            ScopeKind::Project => "project",
        }
    }

    /// True if `self` is coarser-grained than `other`
    pub fn is_coarser_than(&self, other: ScopeKind) -> bool {
        *self < other
    }

    /// Parses a kind from its lowercase label
    pub fn parse(s: &str) -> Option<ScopeKind> {
        match s.to_lowercase().as_str() {
            "organization" => Some(ScopeKind::Organization),
            "product" => Some(ScopeKind::Product),
            "project" => Some(ScopeKind::Project),
            _ => None,
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An organization as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization token
    pub token: ScopeToken,
    /// Display name
    pub name: String,
    /// Disabled organizations are skipped during resolution
    #[serde(default)]
    pub disabled: bool,
}

/// A scope (product or project) as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Scope token
    pub token: ScopeToken,
    /// Scope kind
    pub kind: ScopeKind,
    /// Display name
    pub name: String,
    /// Parent product name, present for projects when names were expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

impl Scope {
    /// Name used in output filenames; projects splice in the parent
    /// product name when it is known.
    pub fn display_name(&self) -> String {
        match (&self.kind, &self.product_name) {
            (ScopeKind::Project, Some(product)) => format!("{}_{}", self.name, product),
            _ => self.name.clone(),
        }
    }
}

/// Resolved unit of work, consumed exactly once by the orchestrator
///
/// Produced by the scope resolver; immutable once created. `output_path`
/// is precomputed from the sanitized display name, report kind, parent
/// organization (multi-org runs) and a format-dependent extension.
/// Filename collisions are not deduplicated - last writer wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTarget {
    /// Scope token to fetch against
    pub token: ScopeToken,
    /// Kind of the resolved scope
    pub kind: ScopeKind,
    /// Human-readable name, pre-sanitization
    pub display_name: String,
    /// Name of the organization this scope belongs to
    pub parent_org_name: String,
    /// Where the per-scope artifact lands
    pub output_path: PathBuf,
}

impl ReportTarget {
    /// Derives an output path for one named sub-result of an asynchronous
    /// report by splicing the key into the target's filename. Callers
    /// sanitize the key first; this only assembles the path.
    pub fn output_path_for(&self, sub_key: &str) -> PathBuf {
        let stem = self
            .output_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("report");
        let ext = self
            .output_path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("dat");
        self.output_path
            .with_file_name(format!("{stem}_{sub_key}.{ext}"))
    }
}

/// Raw include/exclude specification, input to the scope resolver
///
/// Names are resolved to tokens before any filtering runs. A token
/// appearing in both the included and excluded sets after name resolution
/// is dropped from both (symmetric-difference semantics) by the shallow
/// filter; the deep filter applies the remaining exclusions after
/// scope-kind expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusionSpec {
    /// Explicitly included tokens
    pub included_tokens: HashSet<ScopeToken>,
    /// Explicitly excluded tokens
    pub excluded_tokens: HashSet<ScopeToken>,
    /// Names to resolve into included tokens
    pub included_names: Vec<String>,
    /// Names to resolve into excluded tokens
    pub excluded_names: Vec<String>,
}

impl InclusionSpec {
    /// True when nothing at all was specified
    pub fn is_empty(&self) -> bool {
        self.included_tokens.is_empty()
            && self.excluded_tokens.is_empty()
            && self.included_names.is_empty()
            && self.excluded_names.is_empty()
    }
}
