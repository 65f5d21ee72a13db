// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Output routing
//!
//! Per-scope modes write each payload to disk as soon as its fetch
//! completes; unified modes buffer everything and render once after the
//! pool drains. The router is shared by every fetch worker, so its only
//! mutable state is the synchronized aggregation buffer.

use crate::config::RunConfig;
use crate::core::output::unified::{
    unified_file_name, write_unified_json, AggregationBuffer,
};
use crate::core::output::xlsx;
use crate::core::resolve::sanitize;
use crate::domain::{OutputMode, QuarryError, ReportPayload, ReportTarget, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Routes fetched payloads to their destination
pub struct OutputRouter {
    mode: OutputMode,
    buffer: Option<AggregationBuffer>,
}

impl OutputRouter {
    /// Create a router for the given output mode
    pub fn new(mode: OutputMode) -> Self {
        let buffer = mode.is_unified().then(AggregationBuffer::new);
        Self { mode, buffer }
    }

    /// Route one successful payload
    ///
    /// Returns the number of artifacts written immediately; unified modes
    /// always return zero here because they only buffer.
    pub async fn route(&self, target: &ReportTarget, payload: ReportPayload) -> Result<usize> {
        if let Some(buffer) = &self.buffer {
            return match payload {
                ReportPayload::Records(records) if records.is_empty() => {
                    tracing::debug!(
                        target = %target.display_name,
                        org = %target.parent_org_name,
                        "Report returned empty, nothing to aggregate"
                    );
                    Ok(0)
                }
                ReportPayload::Records(records) => {
                    buffer.append(records, &target.parent_org_name);
                    Ok(0)
                }
                other => Err(QuarryError::Output(format!(
                    "Unified output requires structured records, got {} payload",
                    payload_label(&other)
                ))),
            };
        }

        match payload {
            ReportPayload::Named(subs) => {
                let mut written = 0;
                for (key, sub) in subs {
                    let path = target.output_path_for(&sanitize(&key));
                    write_artifact(&path, sub).await?;
                    written += 1;
                }
                Ok(written)
            }
            payload => {
                write_artifact(&target.output_path, payload).await?;
                Ok(1)
            }
        }
    }

    /// Close the aggregation buffer and render the unified artifact
    ///
    /// Must be called after the fetch pool has fully drained. Returns the
    /// written path, or None when there was no data (a non-fatal outcome).
    pub fn finalize(&self, config: &RunConfig, org_label: &str) -> Result<Option<PathBuf>> {
        let Some(buffer) = &self.buffer else {
            return Ok(None);
        };

        let records = buffer.close_and_drain();
        if records.is_empty() {
            tracing::info!("No data returned. No report will be saved");
            return Ok(None);
        }

        let filename = unified_file_name(org_label, config.report_kind, self.mode);
        let path = config.output_dir.join(filename);
        let start = Instant::now();
        match self.mode {
            OutputMode::UnifiedJson => write_unified_json(&path, &records)?,
            OutputMode::UnifiedXlsx => {
                tracing::info!("Converting output to Excel");
                xlsx::render_flat_workbook(&path, &records, config.report_kind)?;
            }
            OutputMode::UnifiedXlsxPerSheet => {
                tracing::info!("Converting output to Excel, one worksheet per organization");
                xlsx::render_per_sheet_workbook(&path, &records, config.report_kind)?;
            }
            _ => unreachable!("per-scope modes carry no aggregation buffer"),
        }

        tracing::info!(
            path = %path.display(),
            rows = records.len(),
            duration_secs = start.elapsed().as_secs_f64(),
            "Finished writing unified report"
        );
        Ok(Some(path))
    }
}

/// Writes one artifact: raw bytes as-is, records as a JSON document
async fn write_artifact(path: &Path, payload: ReportPayload) -> Result<()> {
    match payload {
        ReportPayload::Binary(bytes) => {
            tokio::fs::write(path, bytes).await?;
        }
        ReportPayload::Records(records) => {
            let json = serde_json::to_vec(&records)?;
            tokio::fs::write(path, json).await?;
        }
        ReportPayload::Named(_) => {
            return Err(QuarryError::Output(
                "Nested named payloads are not supported".to_string(),
            ))
        }
    }
    tracing::debug!(path = %path.display(), "Saved report artifact");
    Ok(())
}

fn payload_label(payload: &ReportPayload) -> &'static str {
    match payload {
        ReportPayload::Binary(_) => "binary",
        ReportPayload::Records(_) => "records",
        ReportPayload::Named(_) => "named",
    }
}
