// Quarry - Bulk Compliance Report Exporter
// Copyright (c) 2025 Quarry Contributors
// Licensed under the MIT License

//! Spreadsheet rendering for unified output
//!
//! Two layouts: a flat workbook that rolls over to a new worksheet when a
//! sheet fills up, and a per-organization workbook with one worksheet per
//! tenant. Both write a bolded header on row 0 of every worksheet and
//! JSON-stringify composite cell values.

use crate::core::output::unified::ORG_NAME_KEY;
use crate::core::resolve::sanitize;
use crate::domain::{QuarryError, Record, ReportKind, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;
use std::path::Path;

/// Hard row limit of the xlsx format, per worksheet
pub const SHEET_ROW_LIMIT: u32 = 1_048_576;

/// Data rows that fit under the header on one worksheet
pub const SHEET_DATA_ROW_CAPACITY: u32 = SHEET_ROW_LIMIT - 1;

/// The format caps worksheet names at 31 characters
pub const SHEET_NAME_LIMIT: usize = 31;

/// Column set for a record list: the report kind's fixed columns when it
/// has them, otherwise the key set of the first record
pub fn column_names(kind: ReportKind, records: &[Record]) -> Vec<String> {
    if let Some(columns) = kind.descriptor().column_names {
        return columns.iter().map(|c| c.to_string()).collect();
    }
    records
        .first()
        .map(|record| record.keys().cloned().collect())
        .unwrap_or_default()
}

/// Data-row counts per worksheet for a flat workbook
///
/// Pure planning function so rollover is testable without materializing a
/// million rows.
pub fn sheet_splits(total: usize, capacity: usize) -> Vec<usize> {
    if total == 0 {
        return vec![0];
    }
    let mut splits = Vec::with_capacity(total / capacity + 1);
    let mut remaining = total;
    while remaining > 0 {
        let take = remaining.min(capacity);
        splits.push(take);
        remaining -= take;
    }
    splits
}

/// Worksheet name for an organization: sanitized, truncated to the format
/// limit on a character boundary
pub fn sheet_name_for(org_name: &str) -> String {
    sanitize(org_name).chars().take(SHEET_NAME_LIMIT).collect()
}

/// Groups records by their organization tag, preserving first-seen order
///
/// Records without a tag land on a worksheet named after the empty string
/// replacement; that only happens if a payload was never tagged, which the
/// aggregation buffer prevents.
pub fn partition_by_sheet(records: &[Record]) -> Vec<(String, Vec<&Record>)> {
    let mut partitions: Vec<(String, Vec<&Record>)> = Vec::new();
    for record in records {
        let org = record
            .get(ORG_NAME_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let name = sheet_name_for(org);
        match partitions.iter_mut().find(|(n, _)| *n == name) {
            Some((_, rows)) => rows.push(record),
            None => partitions.push((name, vec![record])),
        }
    }
    partitions
}

/// Renders the merged record list as a flat workbook
///
/// Returns the number of worksheets written.
pub fn render_flat_workbook(path: &Path, records: &[Record], kind: ReportKind) -> Result<usize> {
    render_flat_with_capacity(path, records, kind, SHEET_DATA_ROW_CAPACITY as usize)
}

/// Flat rendering with an explicit per-sheet capacity
///
/// The capacity parameter exists so tests can exercise rollover with a
/// small workbook.
pub fn render_flat_with_capacity(
    path: &Path,
    records: &[Record],
    kind: ReportKind,
    capacity: usize,
) -> Result<usize> {
    let columns = column_names(kind, records);
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    let splits = sheet_splits(records.len(), capacity);

    let mut offset = 0;
    for rows in &splits {
        let worksheet = workbook.add_worksheet();
        write_header(worksheet, &columns, &bold)?;
        for (row_index, record) in records[offset..offset + rows].iter().enumerate() {
            write_record(worksheet, row_index as u32 + 1, &columns, record)?;
        }
        offset += rows;
    }

    workbook.save(path).map_err(xlsx_error)?;
    tracing::debug!(
        rows = records.len(),
        worksheets = splits.len(),
        "Rendered flat workbook"
    );
    Ok(splits.len())
}

/// Renders the merged record list with one worksheet per organization
///
/// Each record is routed to the worksheet matching its organization tag;
/// row cursors are tracked independently per worksheet. Returns the number
/// of worksheets written.
pub fn render_per_sheet_workbook(
    path: &Path,
    records: &[Record],
    kind: ReportKind,
) -> Result<usize> {
    let columns = column_names(kind, records);
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    let partitions = partition_by_sheet(records);

    for (name, rows) in &partitions {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name).map_err(xlsx_error)?;
        write_header(worksheet, &columns, &bold)?;
        for (row_index, record) in rows.iter().enumerate() {
            write_record(worksheet, row_index as u32 + 1, &columns, record)?;
        }
    }

    workbook.save(path).map_err(xlsx_error)?;
    tracing::debug!(
        rows = records.len(),
        worksheets = partitions.len(),
        "Rendered per-organization workbook"
    );
    Ok(partitions.len())
}

fn write_header(worksheet: &mut Worksheet, columns: &[String], bold: &Format) -> Result<()> {
    for (col, name) in columns.iter().enumerate() {
        worksheet
            .write_with_format(0, col as u16, name.as_str(), bold)
            .map_err(xlsx_error)?;
    }
    Ok(())
}

fn write_record(
    worksheet: &mut Worksheet,
    row: u32,
    columns: &[String],
    record: &Record,
) -> Result<()> {
    for (col, name) in columns.iter().enumerate() {
        write_cell(worksheet, row, col as u16, record.get(name))?;
    }
    Ok(())
}

/// Writes one cell; composite values are serialized to a JSON string
fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: Option<&Value>) -> Result<()> {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) => {
            worksheet.write(row, col, s.as_str()).map_err(xlsx_error)?;
        }
        Some(Value::Number(n)) => {
            worksheet
                .write(row, col, n.as_f64().unwrap_or_default())
                .map_err(xlsx_error)?;
        }
        Some(Value::Bool(b)) => {
            worksheet.write(row, col, *b).map_err(xlsx_error)?;
        }
        Some(composite) => {
            let serialized = serde_json::to_string(composite)?;
            worksheet
                .write(row, col, serialized.as_str())
                .map_err(xlsx_error)?;
        }
    }
    Ok(())
}

fn xlsx_error(e: rust_xlsxwriter::XlsxError) -> QuarryError {
    QuarryError::Output(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn record(pairs: &[(&str, Value)]) -> Record {
        let mut map = Map::new();
        for (key, value) in pairs {
            map.insert(key.to_string(), value.clone());
        }
        map
    }

    #[test]
    fn test_sheet_splits_under_capacity() {
        assert_eq!(sheet_splits(10, 100), vec![10]);
    }

    #[test]
    fn test_sheet_splits_exact_capacity() {
        assert_eq!(sheet_splits(100, 100), vec![100]);
    }

    #[test]
    fn test_sheet_splits_one_over_capacity() {
        // The row-ceiling property: one record past a full sheet starts a
        // second worksheet holding exactly that record.
        assert_eq!(sheet_splits(101, 100), vec![100, 1]);
    }

    #[test]
    fn test_sheet_splits_production_capacity() {
        let capacity = SHEET_DATA_ROW_CAPACITY as usize;
        assert_eq!(sheet_splits(capacity + 1, capacity), vec![capacity, 1]);
        assert_eq!(sheet_splits(capacity, capacity), vec![capacity]);
    }

    #[test]
    fn test_sheet_splits_empty() {
        assert_eq!(sheet_splits(0, 100), vec![0]);
    }

    #[test]
    fn test_sheet_capacity_fits_format_limit() {
        // Header plus data rows must stay within the format's row limit.
        assert_eq!(SHEET_DATA_ROW_CAPACITY + 1, SHEET_ROW_LIMIT);
    }

    #[test]
    fn test_column_names_from_registry() {
        let columns = column_names(ReportKind::Vulnerability, &[]);
        assert!(columns.contains(&"severity".to_string()));
    }

    #[test]
    fn test_column_names_from_first_record() {
        let records = vec![record(&[("alpha", json!(1)), ("beta", json!(2))])];
        let columns = column_names(ReportKind::Inventory, &records);
        assert_eq!(columns, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_sheet_name_truncated() {
        let name = sheet_name_for("An Organization With A Very Long Name Indeed");
        assert_eq!(name.chars().count(), SHEET_NAME_LIMIT);
    }

    #[test]
    fn test_sheet_name_sanitized() {
        assert_eq!(sheet_name_for("Acme/EU: *West*"), "Acme_EU_ _West_");
    }

    #[test]
    fn test_partition_by_sheet() {
        let records = vec![
            record(&[("org_name", json!("A")), ("v", json!(1))]),
            record(&[("org_name", json!("B")), ("v", json!(2))]),
            record(&[("org_name", json!("A")), ("v", json!(3))]),
        ];
        let partitions = partition_by_sheet(&records);
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].0, "A");
        assert_eq!(partitions[0].1.len(), 2);
        assert_eq!(partitions[1].0, "B");
        assert_eq!(partitions[1].1.len(), 1);
    }

    #[test]
    fn test_render_flat_rollover() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.xlsx");
        let records: Vec<Record> = (0..7)
            .map(|i| record(&[("library", json!(format!("lib-{i}"))), ("count", json!(i))]))
            .collect();

        let sheets = render_flat_with_capacity(&path, &records, ReportKind::Inventory, 3).unwrap();
        assert_eq!(sheets, 3);
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_render_per_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("per_org.xlsx");
        let records = vec![
            record(&[("org_name", json!("Acme")), ("library", json!("serde"))]),
            record(&[("org_name", json!("Globex")), ("library", json!("tokio"))]),
        ];

        let sheets = render_per_sheet_workbook(&path, &records, ReportKind::Inventory).unwrap();
        assert_eq!(sheets, 2);
        assert!(path.exists());
    }

    #[test]
    fn test_composite_cells_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composite.xlsx");
        let records = vec![record(&[
            ("library", json!("serde")),
            ("licenses", json!(["MIT", "Apache-2.0"])),
            ("vuln", json!({"id": "CVE-2021-0001"})),
        ])];

        let sheets = render_flat_workbook(&path, &records, ReportKind::Inventory).unwrap();
        assert_eq!(sheets, 1);
        assert!(path.exists());
    }
}
