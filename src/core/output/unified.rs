// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Unified aggregation buffer and JSON rendering
//!
//! Unified output modes buffer every successful payload until the fetch
//! pool drains, then render once. The buffer is the only resource mutated
//! by multiple workers; appends are mutex-guarded and the drain happens
//! exactly once, after pool completion, on the coordinator task.

use crate::domain::{OutputMode, Record, ReportKind, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Mutex;

/// Key each unified record is tagged with so spreadsheet partitioning and
/// consumers can attribute rows to their organization
pub const ORG_NAME_KEY: &str = "org_name";

/// Label used in the unified filename when a run spans organizations
pub const MULTI_ORG_LABEL: &str = "Multiple Org";

/// Process-lifetime accumulator for unified payloads
///
/// Written by every fetch worker, read once by the renderer after the
/// pool drains. Appending after the drain is a programming error.
#[derive(Debug)]
pub struct AggregationBuffer {
    records: Mutex<Option<Vec<Record>>>,
}

impl AggregationBuffer {
    /// Create an empty open buffer
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Some(Vec::new())),
        }
    }

    /// Append records from one fetch, tagging each with its organization
    pub fn append(&self, records: Vec<Record>, org_name: &str) {
        let mut guard = self.records.lock().expect("Aggregation buffer poisoned");
        let buffer = guard.as_mut().expect("Aggregation buffer already drained");
        buffer.reserve(records.len());
        for mut record in records {
            record.insert(ORG_NAME_KEY.to_string(), Value::from(org_name));
            buffer.push(record);
        }
    }

    /// Close the buffer and take everything accumulated so far
    ///
    /// Called exactly once, after the worker pool has drained.
    pub fn close_and_drain(&self) -> Vec<Record> {
        self.records
            .lock()
            .expect("Aggregation buffer poisoned")
            .take()
            .expect("Aggregation buffer already drained")
    }
}

/// Unified artifact filename: `{org} - {kind} report.{ext}`
pub fn unified_file_name(org_label: &str, kind: ReportKind, mode: OutputMode) -> String {
    format!(
        "{} - {} report.{}",
        org_label,
        kind.as_str(),
        mode.extension(kind)
    )
}

/// Writes the merged record list as one JSON array
pub fn write_unified_json(path: &Path, records: &[Record]) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, records)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OutputMode;
    use serde_json::Map;

    fn record(key: &str, value: &str) -> Record {
        let mut map = Map::new();
        map.insert(key.to_string(), Value::from(value));
        map
    }

    #[test]
    fn test_append_tags_org_name() {
        let buffer = AggregationBuffer::new();
        buffer.append(vec![record("library", "serde")], "Acme");
        buffer.append(vec![record("library", "tokio")], "Globex");

        let records = buffer.close_and_drain();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0][ORG_NAME_KEY], "Acme");
        assert_eq!(records[1][ORG_NAME_KEY], "Globex");
    }

    #[test]
    fn test_drain_empty_buffer() {
        let buffer = AggregationBuffer::new();
        assert!(buffer.close_and_drain().is_empty());
    }

    #[test]
    #[should_panic(expected = "already drained")]
    fn test_append_after_drain_panics() {
        let buffer = AggregationBuffer::new();
        buffer.close_and_drain();
        buffer.append(vec![record("a", "b")], "Acme");
    }

    #[test]
    fn test_unified_file_name() {
        assert_eq!(
            unified_file_name("Acme", crate::domain::ReportKind::Vulnerability, OutputMode::UnifiedJson),
            "Acme - vulnerability report.json"
        );
        assert_eq!(
            unified_file_name(
                MULTI_ORG_LABEL,
                crate::domain::ReportKind::Inventory,
                OutputMode::UnifiedXlsx
            ),
            "Multiple Org - inventory report.xlsx"
        );
    }

    #[test]
    fn test_write_and_reread_unified_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let buffer = AggregationBuffer::new();
        buffer.append(vec![record("library", "serde")], "Acme");
        let records = buffer.close_and_drain();

        write_unified_json(&path, &records).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Record> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, records);
    }
}
