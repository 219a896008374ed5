//! CSV encoding of aligned tables.
//!
//! Timestamps serialize as RFC 3339 UTC; null cells serialize as empty
//! fields so residual gaps stay visible to downstream consumers.

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use marketloom_core::frame::{CombinedTable, SymbolFrame};

/// Encode one per-symbol table: `symbol,timestamp,<columns...>`.
pub fn frame_to_csv(frame: &SymbolFrame) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["symbol".to_string(), "timestamp".to_string()];
    header.extend(frame.columns.iter().map(|c| c.name.clone()));
    wtr.write_record(&header)?;

    for i in 0..frame.len() {
        let mut record = Vec::with_capacity(header.len());
        record.push(frame.symbol.clone());
        record.push(stamp(frame.hours[i]));
        for col in &frame.columns {
            record.push(cell(col.values[i]));
        }
        wtr.write_record(&record)?;
    }

    wtr.into_inner().context("failed to flush CSV writer")
}

/// Encode the combined cross-symbol table with the union schema.
pub fn combined_to_csv(table: &CombinedTable) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["symbol".to_string(), "timestamp".to_string()];
    header.extend(table.column_names.iter().cloned());
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.symbol.clone());
        record.push(stamp(row.hour));
        for value in &row.values {
            record.push(cell(*value));
        }
        wtr.write_record(&record)?;
    }

    wtr.into_inner().context("failed to flush CSV writer")
}

fn stamp(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}
