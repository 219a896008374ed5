//! Source loading: cleaned CSV extracts into typed series.
//!
//! Failures are reported precisely — `NotFound` versus `Parse` — and the
//! optional-source substitution decision belongs to the caller, not to a
//! catch-all inside the loader. Cell-level problems (unparseable numbers or
//! timestamps) degrade to nulls; only structural problems (missing required
//! header, malformed CSV) are errors.

use crate::store::{BlobStore, StoreError};
use csv::StringRecord;
use marketloom_core::extract::{
    BarRow, BarSeries, MacroObservation, MacroSeries, QuoteRow, QuoteSeries, TrendColumn,
    TrendSeries,
};
use marketloom_core::normalize::parse_instant;
use thiserror::Error;

/// Errors from the loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source not found: {path}")]
    NotFound { path: String },

    #[error("source '{path}' failed to parse: {reason}")]
    Parse { path: String, reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Presence and size of one extract, for status reporting.
#[derive(Debug, Clone)]
pub struct SourceStatus {
    pub name: &'static str,
    pub path: String,
    pub present: bool,
    /// Parsed row count; `None` when absent or unreadable.
    pub rows: Option<usize>,
}

pub fn load_quotes(store: &dyn BlobStore, path: &str) -> Result<QuoteSeries, LoadError> {
    let bytes = fetch(store, path)?;
    parse_quotes(&bytes).map_err(|reason| LoadError::Parse {
        path: path.to_string(),
        reason,
    })
}

pub fn load_bars(store: &dyn BlobStore, path: &str) -> Result<BarSeries, LoadError> {
    let bytes = fetch(store, path)?;
    parse_bars(&bytes).map_err(|reason| LoadError::Parse {
        path: path.to_string(),
        reason,
    })
}

pub fn load_trends(store: &dyn BlobStore, path: &str) -> Result<TrendSeries, LoadError> {
    let bytes = fetch(store, path)?;
    parse_trends(&bytes).map_err(|reason| LoadError::Parse {
        path: path.to_string(),
        reason,
    })
}

pub fn load_fred(store: &dyn BlobStore, path: &str) -> Result<MacroSeries, LoadError> {
    let bytes = fetch(store, path)?;
    parse_fred(&bytes).map_err(|reason| LoadError::Parse {
        path: path.to_string(),
        reason,
    })
}

/// Probe all four extracts for the status report.
pub fn probe(store: &dyn BlobStore, config: &crate::config::IntegrateConfig) -> Vec<SourceStatus> {
    vec![
        SourceStatus {
            name: "stock",
            path: config.stock_path.clone(),
            present: store.exists(&config.stock_path),
            rows: load_quotes(store, &config.stock_path)
                .ok()
                .map(|s| s.rows.len()),
        },
        SourceStatus {
            name: "yahoo",
            path: config.yahoo_path.clone(),
            present: store.exists(&config.yahoo_path),
            rows: load_bars(store, &config.yahoo_path)
                .ok()
                .map(|s| s.rows.len()),
        },
        SourceStatus {
            name: "trends",
            path: config.trends_path.clone(),
            present: store.exists(&config.trends_path),
            rows: load_trends(store, &config.trends_path)
                .ok()
                .map(|s| s.timestamps.len()),
        },
        SourceStatus {
            name: "fred",
            path: config.fred_path.clone(),
            present: store.exists(&config.fred_path),
            rows: load_fred(store, &config.fred_path)
                .ok()
                .map(|s| s.rows.len()),
        },
    ]
}

fn fetch(store: &dyn BlobStore, path: &str) -> Result<Vec<u8>, LoadError> {
    store.load(path).map_err(|e| match e {
        StoreError::NotFound { path } => LoadError::NotFound { path },
        other => LoadError::Store(other),
    })
}

fn parse_quotes(bytes: &[u8]) -> Result<QuoteSeries, String> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let headers = rdr.headers().map_err(|e| e.to_string())?.clone();

    let symbol_idx = require(&headers, "symbol")?;
    let ts_idx = require(&headers, "timestamp")?;
    let declared: Vec<Option<usize>> = QuoteRow::NUMERIC_FIELDS
        .iter()
        .map(|name| position(&headers, name))
        .collect();
    let extras = extra_columns(
        &headers,
        &[&["symbol", "timestamp"][..], &QuoteRow::NUMERIC_FIELDS[..]],
    );

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| e.to_string())?;
        let fields: Vec<Option<f64>> = declared.iter().map(|idx| num(&record, *idx)).collect();
        rows.push(QuoteRow {
            symbol: text(&record, symbol_idx),
            timestamp: instant(&record, ts_idx),
            last: fields[0],
            open: fields[1],
            high: fields[2],
            low: fields[3],
            prev_close: fields[4],
            change: fields[5],
            change_pct: fields[6],
            extras: extras
                .iter()
                .map(|(_, idx)| num(&record, Some(*idx)))
                .collect(),
        });
    }

    Ok(QuoteSeries {
        extra_columns: extras.into_iter().map(|(name, _)| name).collect(),
        rows,
    })
}

fn parse_bars(bytes: &[u8]) -> Result<BarSeries, String> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let headers = rdr.headers().map_err(|e| e.to_string())?.clone();

    let symbol_idx = require(&headers, "symbol")?;
    let ts_idx = require(&headers, "timestamp")?;
    let declared: Vec<Option<usize>> = BarRow::NUMERIC_FIELDS
        .iter()
        .map(|name| position(&headers, name))
        .collect();
    let extras = extra_columns(
        &headers,
        &[&["symbol", "timestamp"][..], &BarRow::NUMERIC_FIELDS[..]],
    );

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| e.to_string())?;
        let fields: Vec<Option<f64>> = declared.iter().map(|idx| num(&record, *idx)).collect();
        rows.push(BarRow {
            symbol: text(&record, symbol_idx),
            timestamp: instant(&record, ts_idx),
            open: fields[0],
            high: fields[1],
            low: fields[2],
            close: fields[3],
            adj_close: fields[4],
            volume: fields[5],
            extras: extras
                .iter()
                .map(|(_, idx)| num(&record, Some(*idx)))
                .collect(),
        });
    }

    Ok(BarSeries {
        extra_columns: extras.into_iter().map(|(name, _)| name).collect(),
        rows,
    })
}

fn parse_trends(bytes: &[u8]) -> Result<TrendSeries, String> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let headers = rdr.headers().map_err(|e| e.to_string())?.clone();

    // The time axis header is matched case-insensitively; every other
    // column is a keyword, label taken verbatim.
    let ts_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("timestamp"))
        .ok_or_else(|| "missing 'timestamp' column".to_string())?;
    let keyword_indices: Vec<(String, usize)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ts_idx)
        .map(|(i, h)| (h.to_string(), i))
        .collect();

    let mut timestamps = Vec::new();
    let mut scores: Vec<Vec<Option<f64>>> = vec![Vec::new(); keyword_indices.len()];
    for record in rdr.records() {
        let record = record.map_err(|e| e.to_string())?;
        timestamps.push(instant(&record, ts_idx));
        for (col, (_, idx)) in scores.iter_mut().zip(&keyword_indices) {
            col.push(num(&record, Some(*idx)));
        }
    }

    Ok(TrendSeries {
        timestamps,
        columns: keyword_indices
            .into_iter()
            .zip(scores)
            .map(|((label, _), scores)| TrendColumn { label, scores })
            .collect(),
    })
}

fn parse_fred(bytes: &[u8]) -> Result<MacroSeries, String> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let headers = rdr.headers().map_err(|e| e.to_string())?.clone();

    let indicator_idx = require(&headers, "indicator")?;
    let value_idx = require(&headers, "value")?;
    let ts_idx = require(&headers, "timestamp")?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| e.to_string())?;
        rows.push(MacroObservation {
            indicator: text(&record, indicator_idx),
            value: num(&record, Some(value_idx)),
            timestamp: instant(&record, ts_idx),
        });
    }

    Ok(MacroSeries { rows })
}

// ── Header and cell helpers ─────────────────────────────────────────

fn position(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn require(headers: &StringRecord, name: &str) -> Result<usize, String> {
    position(headers, name).ok_or_else(|| format!("missing '{name}' column"))
}

/// Header columns not claimed by any declared set, in file order.
fn extra_columns(headers: &StringRecord, declared: &[&[&str]]) -> Vec<(String, usize)> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !declared.iter().any(|set| set.contains(h)))
        .map(|(i, h)| (h.to_string(), i))
        .collect()
}

fn text(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").trim().to_string()
}

fn instant(record: &StringRecord, idx: usize) -> Option<chrono::DateTime<chrono::Utc>> {
    record.get(idx).and_then(parse_instant)
}

fn num(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use chrono::{TimeZone, Utc};

    #[test]
    fn quotes_parse_declared_fields_and_extras() {
        let csv = "symbol,timestamp,last,open,high,low,prev_close,change,change_pct,spread\n\
                   AAPL,2025-08-03T05:00:00Z,100.5,99.0,101.0,98.5,99.5,1.0,1.01,0.02\n\
                   MSFT,2025-08-03T05:00:00Z,,,,,,,,\n";
        let series = parse_quotes(csv.as_bytes()).unwrap();

        assert_eq!(series.extra_columns, vec!["spread"]);
        assert_eq!(series.rows.len(), 2);
        assert_eq!(series.rows[0].symbol, "AAPL");
        assert_eq!(series.rows[0].last, Some(100.5));
        assert_eq!(series.rows[0].extras, vec![Some(0.02)]);
        assert_eq!(
            series.rows[0].timestamp,
            Some(Utc.with_ymd_and_hms(2025, 8, 3, 5, 0, 0).unwrap())
        );
        // Empty cells are nulls, not errors.
        assert_eq!(series.rows[1].last, None);
        assert_eq!(series.rows[1].extras, vec![None]);
    }

    #[test]
    fn unparseable_cells_become_null() {
        let csv = "symbol,timestamp,last,open,high,low,prev_close,change,change_pct\n\
                   AAPL,yesterday,abc,,,,,,\n";
        let series = parse_quotes(csv.as_bytes()).unwrap();
        assert_eq!(series.rows[0].timestamp, None);
        assert_eq!(series.rows[0].last, None);
    }

    #[test]
    fn quotes_without_symbol_header_fail_structurally() {
        let err = parse_quotes(b"timestamp,last\n2025-08-03,1.0\n").unwrap_err();
        assert!(err.contains("symbol"));
    }

    #[test]
    fn trends_keep_keyword_labels_verbatim() {
        let csv = "Timestamp,AAPL stock,NFLX: search interest\n\
                   2025-08-03T05:00:00Z,55,60\n\
                   2025-08-03T06:00:00Z,,61\n";
        let series = parse_trends(csv.as_bytes()).unwrap();

        assert_eq!(series.timestamps.len(), 2);
        assert_eq!(series.columns.len(), 2);
        assert_eq!(series.columns[0].label, "AAPL stock");
        assert_eq!(series.columns[0].scores, vec![Some(55.0), None]);
        assert_eq!(series.columns[1].label, "NFLX: search interest");
    }

    #[test]
    fn fred_long_format_roundtrips() {
        let csv = "indicator,value,timestamp\n\
                   GDP,27000.5,2025-08-03T05:00:00Z\n\
                   UNRATE,,2025-08-03T05:00:00Z\n";
        let series = parse_fred(csv.as_bytes()).unwrap();
        assert_eq!(series.rows.len(), 2);
        assert_eq!(series.rows[0].indicator, "GDP");
        assert_eq!(series.rows[0].value, Some(27000.5));
        assert_eq!(series.rows[1].value, None);
    }

    #[test]
    fn load_distinguishes_not_found_from_parse_failure() {
        let store = MemStore::new();
        assert!(matches!(
            load_quotes(&store, "cleaned_data/cleaned_stock.csv"),
            Err(LoadError::NotFound { .. })
        ));

        store.insert("cleaned_data/cleaned_stock.csv", "no,usable,headers\n1,2,3\n");
        assert!(matches!(
            load_quotes(&store, "cleaned_data/cleaned_stock.csv"),
            Err(LoadError::Parse { .. })
        ));
    }
}
