// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! HTTP implementation of the platform API
//!
//! Every call is a POST carrying a `requestType` discriminator, the user
//! key, and call-specific fields. Binary report renditions come back as
//! raw bytes; everything else is JSON. Application-level failures arrive
//! as an error envelope on a 200 response and are mapped onto
//! [`PlatformError`] variants here so nothing downstream ever sees wire
//! details.

use super::api::PlatformApi;
use super::models::{
    ErrorEnvelope, OrganizationWire, OrganizationsResponse, ScopeWire, ScopesResponse,
    TokensResponse, ERROR_INACTIVE_ORG, ERROR_SCOPE_NOT_FOUND,
};
use crate::config::SecretString;
use crate::domain::errors::PlatformError;
use crate::domain::{
    ExtraArgValue, ExtraArgs, Organization, ReportKind, ReportPayload, Scope, ScopeKind,
    ScopeToken,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Report fetches can take a long time server-side; the platform keeps the
/// connection open until the report is rendered.
const REQUEST_TIMEOUT_SECS: u64 = 3600;

/// HTTP client for the reporting platform
pub struct PlatformClient {
    base_url: String,
    user_key: SecretString,
    client: Client,
}

impl PlatformClient {
    /// Create a new platform client
    ///
    /// # Arguments
    ///
    /// * `base_url` - API endpoint URL
    /// * `user_key` - User key injected into every request
    pub fn new(base_url: impl Into<String>, user_key: SecretString) -> Self {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            base_url: base_url.into(),
            user_key,
            client,
        }
    }

    /// POST one request-type envelope and return the raw response
    async fn post(&self, mut body: Map<String, Value>) -> Result<reqwest::Response, PlatformError> {
        body.insert(
            "userKey".to_string(),
            Value::from(self.user_key.expose_secret().as_ref()),
        );

        let response = self
            .client
            .post(&self.base_url)
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlatformError::Timeout(e.to_string())
                } else {
                    PlatformError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_client_error() {
            return Err(PlatformError::ClientError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        if status.is_server_error() {
            return Err(PlatformError::ServerError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response)
    }

    /// POST and parse the JSON response, mapping error envelopes
    async fn post_json(&self, body: Map<String, Value>) -> Result<Value, PlatformError> {
        let response = self.post(body).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        Self::check_error_envelope(&value)?;
        Ok(value)
    }

    /// Maps the platform's 200-with-error-body convention onto errors
    fn check_error_envelope(value: &Value) -> Result<(), PlatformError> {
        if value.get("errorCode").is_none() {
            return Ok(());
        }
        let envelope: ErrorEnvelope = serde_json::from_value(value.clone())
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        Err(match envelope.error_code {
            ERROR_INACTIVE_ORG => PlatformError::InactiveOrganization(envelope.error_message),
            ERROR_SCOPE_NOT_FOUND => PlatformError::ScopeNotFound(envelope.error_message),
            _ => PlatformError::InvalidResponse(format!(
                "Platform error {}: {}",
                envelope.error_code, envelope.error_message
            )),
        })
    }

    fn request(request_type: &str) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("requestType".to_string(), Value::from(request_type));
        body
    }

    /// Field name carrying the scope token for a given kind
    fn token_field(kind: ScopeKind) -> &'static str {
        match kind {
            ScopeKind::Organization => "orgToken",
            ScopeKind::Product => "productToken",
            ScopeKind::Project => "projectToken",
        }
    }

    /// Request-type prefix for a given kind
    fn request_prefix(kind: ScopeKind) -> &'static str {
        match kind {
            ScopeKind::Organization => "Organization",
            ScopeKind::Product => "Product",
            ScopeKind::Project => "Project",
        }
    }

    fn parse_scopes(wires: Vec<ScopeWire>) -> Vec<Scope> {
        wires
            .into_iter()
            .filter_map(|wire| {
                let token = wire.token.clone();
                let scope = wire.into_scope();
                if scope.is_none() {
                    tracing::warn!(token = %token, "Skipping scope with unknown kind");
                }
                scope
            })
            .collect()
    }

    /// Interprets a structured (non-binary) report response
    fn parse_report_value(value: Value) -> Result<ReportPayload, PlatformError> {
        match value {
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(record) => records.push(record),
                        other => {
                            return Err(PlatformError::InvalidFormat(format!(
                                "Expected record object in report payload, got: {other}"
                            )))
                        }
                    }
                }
                Ok(ReportPayload::Records(records))
            }
            Value::Object(mut obj) => {
                // Asynchronous kinds wrap named sub-results in a
                // "reports" mapping.
                let reports = obj.remove("reports").ok_or_else(|| {
                    PlatformError::InvalidFormat(
                        "Expected record array or named reports object".to_string(),
                    )
                })?;
                let Value::Object(entries) = reports else {
                    return Err(PlatformError::InvalidFormat(
                        "Named reports must be an object".to_string(),
                    ));
                };
                let mut subs = Vec::with_capacity(entries.len());
                for (name, sub) in entries {
                    let payload = match sub {
                        Value::String(encoded) => {
                            let bytes =
                                general_purpose::STANDARD.decode(encoded).map_err(|e| {
                                    PlatformError::InvalidFormat(format!(
                                        "Sub-report '{name}' is not valid base64: {e}"
                                    ))
                                })?;
                            ReportPayload::Binary(bytes)
                        }
                        other => Self::parse_report_value(other)?,
                    };
                    subs.push((name, payload));
                }
                Ok(ReportPayload::Named(subs))
            }
            other => Err(PlatformError::InvalidFormat(format!(
                "Unexpected report payload: {other}"
            ))),
        }
    }
}

#[async_trait]
impl PlatformApi for PlatformClient {
    async fn organizations(&self) -> Result<Vec<Organization>, PlatformError> {
        let body = Self::request("getAllOrganizations");
        let value = self.post_json(body).await?;
        let parsed: OrganizationsResponse = serde_json::from_value(value)
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        Ok(parsed.organizations.into_iter().map(Into::into).collect())
    }

    async fn organization_details(
        &self,
        org_token: &ScopeToken,
    ) -> Result<Organization, PlatformError> {
        let mut body = Self::request("getOrganizationDetails");
        body.insert("orgToken".to_string(), Value::from(org_token.as_str()));
        let value = self.post_json(body).await?;
        let parsed: OrganizationWire = serde_json::from_value(value)
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        Ok(parsed.into())
    }

    async fn scopes(
        &self,
        org_token: &ScopeToken,
        kind: ScopeKind,
        expand_names: bool,
    ) -> Result<Vec<Scope>, PlatformError> {
        let request_type = match kind {
            ScopeKind::Product => "getAllProducts",
            ScopeKind::Project => "getAllProjects",
            ScopeKind::Organization => {
                return Err(PlatformError::InvalidFormat(
                    "Organizations are not enumerable as report scopes".to_string(),
                ))
            }
        };
        let mut body = Self::request(request_type);
        body.insert("orgToken".to_string(), Value::from(org_token.as_str()));
        body.insert("includeItemNames".to_string(), Value::from(expand_names));
        let value = self.post_json(body).await?;
        let parsed: ScopesResponse = serde_json::from_value(value)
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        Ok(Self::parse_scopes(parsed.scopes))
    }

    async fn scope_by_token(
        &self,
        org_token: &ScopeToken,
        token: &ScopeToken,
    ) -> Result<Scope, PlatformError> {
        let mut body = Self::request("getScopeByToken");
        body.insert("orgToken".to_string(), Value::from(org_token.as_str()));
        body.insert("scopeToken".to_string(), Value::from(token.as_str()));
        let value = self.post_json(body).await?;
        let parsed: ScopeWire = serde_json::from_value(value)
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        parsed
            .into_scope()
            .ok_or_else(|| PlatformError::ScopeNotFound(token.to_string()))
    }

    async fn child_projects(
        &self,
        org_token: &ScopeToken,
        product_token: &ScopeToken,
    ) -> Result<Vec<Scope>, PlatformError> {
        let mut body = Self::request("getProductProjects");
        body.insert("orgToken".to_string(), Value::from(org_token.as_str()));
        body.insert(
            "productToken".to_string(),
            Value::from(product_token.as_str()),
        );
        let value = self.post_json(body).await?;
        let parsed: ScopesResponse = serde_json::from_value(value)
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        Ok(Self::parse_scopes(parsed.scopes))
    }

    async fn tokens_from_name(&self, name: &str) -> Result<Vec<ScopeToken>, PlatformError> {
        let mut body = Self::request("getTokensByName");
        body.insert("name".to_string(), Value::from(name));
        let value = self.post_json(body).await?;
        let parsed: TokensResponse = serde_json::from_value(value)
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        Ok(parsed.tokens.into_iter().map(ScopeToken::new).collect())
    }

    async fn fetch_report(
        &self,
        scope_token: &ScopeToken,
        scope_kind: ScopeKind,
        kind: ReportKind,
        binary: bool,
        extra_args: &ExtraArgs,
    ) -> Result<ReportPayload, PlatformError> {
        let request_type = format!(
            "get{}{}",
            Self::request_prefix(scope_kind),
            kind.descriptor().request_suffix
        );
        let mut body = Self::request(&request_type);
        body.insert(
            Self::token_field(scope_kind).to_string(),
            Value::from(scope_token.as_str()),
        );
        body.insert(
            "format".to_string(),
            Value::from(if binary { "binary" } else { "json" }),
        );
        for (key, value) in extra_args {
            let json_value = match value {
                ExtraArgValue::One(v) => Value::from(v.as_str()),
                ExtraArgValue::Many(vs) => json!(vs),
            };
            body.insert(key.clone(), json_value);
        }

        if binary && !kind.descriptor().asynchronous {
            let response = self.post(body).await?;
            let is_json = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.contains("json"))
                .unwrap_or(false);
            let bytes = response
                .bytes()
                .await
                .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
            if is_json {
                // The platform reports fetch failures as JSON even when a
                // binary rendition was requested.
                let value: Value = serde_json::from_slice(&bytes)
                    .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
                Self::check_error_envelope(&value)?;
                return Err(PlatformError::InvalidResponse(
                    "Expected binary payload, got JSON".to_string(),
                ));
            }
            return Ok(ReportPayload::Binary(bytes.to_vec()));
        }

        let value = self.post_json(body).await?;
        Self::parse_report_value(value)
    }
}
