// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Wire models for the platform API
//!
//! The platform speaks a request-type envelope: every call is a POST with
//! a `requestType` discriminator and the user key; responses are JSON
//! objects. Application-level failures come back as an error envelope on
//! a 200 response.

use crate::domain::{Organization, Scope, ScopeKind, ScopeToken};
use serde::Deserialize;

/// Application-level error envelope
///
/// The platform reports failures in the response body with an HTTP 200.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    /// Platform-defined error code
    #[serde(rename = "errorCode")]
    pub error_code: i64,
    /// Human-readable message
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

/// Error code the platform uses for disabled organizations
pub const ERROR_INACTIVE_ORG: i64 = 2015;

/// Error code the platform uses for unknown or foreign scope tokens
pub const ERROR_SCOPE_NOT_FOUND: i64 = 1009;

/// One organization on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationWire {
    #[serde(rename = "orgToken")]
    pub token: String,
    #[serde(rename = "orgName")]
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
}

impl From<OrganizationWire> for Organization {
    fn from(wire: OrganizationWire) -> Self {
        Organization {
            token: ScopeToken::new(wire.token),
            name: wire.name,
            disabled: wire.disabled,
        }
    }
}

/// Response listing organizations under an umbrella token
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationsResponse {
    pub organizations: Vec<OrganizationWire>,
}

/// One product or project on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeWire {
    pub token: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "productName", default)]
    pub product_name: Option<String>,
}

impl ScopeWire {
    /// Converts the wire scope into the domain model; unknown kinds come
    /// back as None so callers can warn and skip.
    pub fn into_scope(self) -> Option<Scope> {
        let kind = ScopeKind::parse(&self.kind)?;
        Some(Scope {
            token: ScopeToken::new(self.token),
            kind,
            name: self.name,
            product_name: self.product_name,
        })
    }
}

/// Response listing scopes of one kind
#[derive(Debug, Clone, Deserialize)]
pub struct ScopesResponse {
    #[serde(default)]
    pub scopes: Vec<ScopeWire>,
}

/// Response resolving a name to tokens
#[derive(Debug, Clone, Deserialize)]
pub struct TokensResponse {
    #[serde(default)]
    pub tokens: Vec<String>,
}
