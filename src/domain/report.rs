// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Report kinds, output modes, and fetched payloads
//!
//! Report kinds form a closed registry: every kind carries its binary
//! extension, optional fixed column set, and whether the backend fulfils
//! it asynchronously. Unknown kinds are a fatal configuration error at
//! startup, never a failure at first use.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use super::errors::QuarryError;
use super::result::Result;

/// One record of a structured report payload
pub type Record = Map<String, Value>;

/// Closed enumeration of the report kinds the platform serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Security vulnerabilities per scope
    Vulnerability,
    /// Open source component inventory
    Inventory,
    /// License due diligence
    DueDiligence,
    /// Attribution notices; fulfilled asynchronously by the backend
    Attribution,
    /// Aggregated risk summary
    Risk,
    /// Source file to library matches
    SourceFiles,
    /// In-house (proprietary) libraries
    InHouseLibraries,
}

/// Static capabilities of one report kind
#[derive(Debug, Clone, Copy)]
pub struct ReportDescriptor {
    /// Extension used for binary per-scope artifacts
    pub binary_extension: &'static str,
    /// Fixed column set for spreadsheet rendering, if the kind has one
    pub column_names: Option<&'static [&'static str]>,
    /// Asynchronous kinds return named sub-results and force serialized
    /// fetching
    pub asynchronous: bool,
    /// Suffix of the platform request type for this kind
    pub request_suffix: &'static str,
}

const VULNERABILITY_COLUMNS: &[&str] = &[
    "name", "severity", "score", "library", "description", "topFix", "publishDate",
];

const DUE_DILIGENCE_COLUMNS: &[&str] = &["library", "license", "copyright", "author", "reference"];

impl ReportKind {
    /// All kinds, in registry order
    pub const ALL: &'static [ReportKind] = &[
        ReportKind::Vulnerability,
        ReportKind::Inventory,
        ReportKind::DueDiligence,
        ReportKind::Attribution,
        ReportKind::Risk,
        ReportKind::SourceFiles,
        ReportKind::InHouseLibraries,
    ];

    /// Registry entry for this kind
    pub fn descriptor(&self) -> ReportDescriptor {
        match self {
            ReportKind::Vulnerability => ReportDescriptor {
                binary_extension: "xlsx",
                column_names: Some(VULNERABILITY_COLUMNS),
                asynchronous: false,
                request_suffix: "VulnerabilityReport",
            },
            ReportKind::Inventory => ReportDescriptor {
                binary_extension: "xlsx",
                column_names: None,
                asynchronous: false,
                request_suffix: "InventoryReport",
            },
            ReportKind::DueDiligence => ReportDescriptor {
                binary_extension: "xlsx",
                column_names: Some(DUE_DILIGENCE_COLUMNS),
                asynchronous: false,
                request_suffix: "DueDiligenceReport",
            },
            ReportKind::Attribution => ReportDescriptor {
                binary_extension: "html",
                column_names: None,
                asynchronous: true,
                request_suffix: "AttributionReport",
            },
            ReportKind::Risk => ReportDescriptor {
                binary_extension: "pdf",
                column_names: None,
                asynchronous: false,
                request_suffix: "RiskReport",
            },
            ReportKind::SourceFiles => ReportDescriptor {
                binary_extension: "xlsx",
                column_names: None,
                asynchronous: false,
                request_suffix: "SourceFileInventoryReport",
            },
            ReportKind::InHouseLibraries => ReportDescriptor {
                binary_extension: "xlsx",
                column_names: None,
                asynchronous: false,
                request_suffix: "InHouseReport",
            },
        }
    }

    /// Snake_case label used on the CLI and in filenames
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Vulnerability => "vulnerability",
            ReportKind::Inventory => "inventory",
            ReportKind::DueDiligence => "due_diligence",
            ReportKind::Attribution => "attribution",
            ReportKind::Risk => "risk",
            ReportKind::SourceFiles => "source_files",
            ReportKind::InHouseLibraries => "in_house_libraries",
        }
    }

    /// Parses a kind from its label; unknown kinds are a configuration
    /// error
    pub fn parse(s: &str) -> Result<ReportKind> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                QuarryError::Configuration(format!(
                    "Unknown report kind '{}'. Available kinds: {}",
                    s,
                    Self::ALL
                        .iter()
                        .map(|k| k.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How fetched payloads are routed to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One raw binary file per target
    Binary,
    /// One JSON document per target
    Json,
    /// All successful payloads merged into one JSON array
    UnifiedJson,
    /// All successful payloads rendered as one workbook
    UnifiedXlsx,
    /// One worksheet per organization in a single workbook
    UnifiedXlsxPerSheet,
}

impl OutputMode {
    /// All modes, in declaration order
    pub const ALL: &'static [OutputMode] = &[
        OutputMode::Binary,
        OutputMode::Json,
        OutputMode::UnifiedJson,
        OutputMode::UnifiedXlsx,
        OutputMode::UnifiedXlsxPerSheet,
    ];

    /// Unified modes buffer every successful payload before writing
    pub fn is_unified(&self) -> bool {
        matches!(
            self,
            OutputMode::UnifiedJson | OutputMode::UnifiedXlsx | OutputMode::UnifiedXlsxPerSheet
        )
    }

    /// Whether fetches request the raw binary rendition
    pub fn is_binary(&self) -> bool {
        matches!(self, OutputMode::Binary)
    }

    /// Extension of artifacts produced under this mode
    pub fn extension(&self, kind: ReportKind) -> &'static str {
        match self {
            OutputMode::Binary => kind.descriptor().binary_extension,
            OutputMode::Json | OutputMode::UnifiedJson => "json",
            OutputMode::UnifiedXlsx | OutputMode::UnifiedXlsxPerSheet => "xlsx",
        }
    }

    /// Label used on the CLI and in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Binary => "binary",
            OutputMode::Json => "json",
            OutputMode::UnifiedJson => "unified_json",
            OutputMode::UnifiedXlsx => "unified_xlsx",
            OutputMode::UnifiedXlsxPerSheet => "unified_xlsx_per_sheet",
        }
    }

    /// Parses a mode from its label
    pub fn parse(s: &str) -> Result<OutputMode> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                QuarryError::Configuration(format!(
                    "Unknown output mode '{}'. Available modes: {}",
                    s,
                    Self::ALL
                        .iter()
                        .map(|m| m.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extra key=value arguments forwarded verbatim to the report fetch
///
/// Values are a single string or a comma-separated list, matching the
/// `key=val` / `key=val1,val2` operator syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraArgValue {
    /// Single value
    One(String),
    /// Comma-separated list
    Many(Vec<String>),
}

/// Parsed extra report arguments
pub type ExtraArgs = HashMap<String, ExtraArgValue>;

/// Parses one `key=value` or `key=val1,val2,...` argument
pub fn parse_extra_arg(raw: &str) -> Result<(String, ExtraArgValue)> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        QuarryError::Configuration(format!(
            "Invalid extra report argument '{raw}': expected key=value"
        ))
    })?;
    if key.trim().is_empty() {
        return Err(QuarryError::Configuration(format!(
            "Invalid extra report argument '{raw}': empty key"
        )));
    }
    let values: Vec<String> = value.split(',').map(|v| v.trim().to_string()).collect();
    let parsed = if values.len() > 1 {
        ExtraArgValue::Many(values)
    } else {
        ExtraArgValue::One(value.trim().to_string())
    };
    Ok((key.trim().to_string(), parsed))
}

/// Payload returned by one report fetch
///
/// Shape depends on the output mode and report kind: raw bytes for binary
/// renditions, a record list for structured renditions, and a named map of
/// sub-payloads for asynchronous kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportPayload {
    /// Raw bytes of a binary rendition
    Binary(Vec<u8>),
    /// Structured list of records
    Records(Vec<Record>),
    /// Named sub-results of an asynchronous report
    Named(Vec<(String, ReportPayload)>),
}

impl ReportPayload {
    /// True when the payload carries no data at all
    pub fn is_empty(&self) -> bool {
        match self {
            ReportPayload::Binary(bytes) => bytes.is_empty(),
            ReportPayload::Records(records) => records.is_empty(),
            ReportPayload::Named(subs) => subs.is_empty(),
        }
    }
}
