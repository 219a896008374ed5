//! Typed records for the four raw extracts.
//!
//! Each extract has a declared schema plus an extra-column bag, so an
//! upstream feed growing a column does not break ingestion. Timestamps stay
//! `Option` until normalization has dropped the rows that never parsed.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// One row of the primary quote extract.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRow {
    pub symbol: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// The primary price. Rows where this is null never reach the output.
    pub last: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub prev_close: Option<f64>,
    pub change: Option<f64>,
    pub change_pct: Option<f64>,
    /// Values for `QuoteSeries::extra_columns`, same order.
    pub extras: Vec<Option<f64>>,
}

impl QuoteRow {
    /// Declared numeric fields, in output order.
    pub const NUMERIC_FIELDS: [&'static str; 7] = [
        "last",
        "open",
        "high",
        "low",
        "prev_close",
        "change",
        "change_pct",
    ];

    /// Values of the declared numeric fields, parallel to `NUMERIC_FIELDS`.
    pub fn numeric_values(&self) -> [Option<f64>; 7] {
        [
            self.last,
            self.open,
            self.high,
            self.low,
            self.prev_close,
            self.change,
            self.change_pct,
        ]
    }
}

/// The primary quote extract (mandatory source).
#[derive(Debug, Clone, Default)]
pub struct QuoteSeries {
    /// Column names beyond the declared schema, in file order.
    pub extra_columns: Vec<String>,
    pub rows: Vec<QuoteRow>,
}

impl QuoteSeries {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct non-empty symbols, first-appearance order.
    pub fn symbols(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            if row.symbol.is_empty() {
                continue;
            }
            if seen.insert(row.symbol.as_str()) {
                out.push(row.symbol.clone());
            }
        }
        out
    }
}

/// One row of the secondary price extract.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRow {
    pub symbol: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<f64>,
    /// Values for `BarSeries::extra_columns`, same order.
    pub extras: Vec<Option<f64>>,
}

impl BarRow {
    /// Declared numeric fields, in output order.
    pub const NUMERIC_FIELDS: [&'static str; 6] =
        ["open", "high", "low", "close", "adj_close", "volume"];

    /// Values of the declared numeric fields, parallel to `NUMERIC_FIELDS`.
    pub fn numeric_values(&self) -> [Option<f64>; 6] {
        [
            self.open,
            self.high,
            self.low,
            self.close,
            self.adj_close,
            self.volume,
        ]
    }
}

/// The secondary price extract (optional source).
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    pub extra_columns: Vec<String>,
    pub rows: Vec<BarRow>,
}

impl BarSeries {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One keyword column of the search-interest extract.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendColumn {
    /// Free-text keyword label, e.g. `"AAPL stock"`.
    pub label: String,
    /// Interest scores, parallel to `TrendSeries::timestamps`.
    pub scores: Vec<Option<f64>>,
}

/// The search-interest extract (optional source): one shared time axis,
/// one column per keyword.
#[derive(Debug, Clone, Default)]
pub struct TrendSeries {
    pub timestamps: Vec<Option<DateTime<Utc>>>,
    pub columns: Vec<TrendColumn>,
}

impl TrendSeries {
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty() || self.columns.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    pub fn column(&self, label: &str) -> Option<&TrendColumn> {
        self.columns.iter().find(|c| c.label == label)
    }

    /// Keep only the rows where `keep` is true. `keep` must cover all rows.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        let mut i = 0;
        self.timestamps.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
        for col in &mut self.columns {
            let mut i = 0;
            col.scores.retain(|_| {
                let k = keep[i];
                i += 1;
                k
            });
        }
    }
}

/// One observation of the macro-economic extract (long format).
#[derive(Debug, Clone, PartialEq)]
pub struct MacroObservation {
    pub indicator: String,
    pub value: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// The macro-economic extract (optional source).
#[derive(Debug, Clone, Default)]
pub struct MacroSeries {
    pub rows: Vec<MacroObservation>,
}

impl MacroSeries {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All four extracts of one pipeline run. Any optional extract may be
/// empty; the merge simply has nothing to join from it.
#[derive(Debug, Clone, Default)]
pub struct Extracts {
    pub quotes: QuoteSeries,
    pub bars: BarSeries,
    pub trends: TrendSeries,
    pub fred: MacroSeries,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_dedupe_in_first_appearance_order() {
        let series = QuoteSeries {
            extra_columns: vec![],
            rows: vec![
                quote_row("MSFT"),
                quote_row("AAPL"),
                quote_row("MSFT"),
                quote_row(""),
                quote_row("TSLA"),
            ],
        };
        assert_eq!(series.symbols(), vec!["MSFT", "AAPL", "TSLA"]);
    }

    #[test]
    fn trend_retain_rows_filters_axis_and_every_column() {
        let mut trends = TrendSeries {
            timestamps: vec![None, None, None],
            columns: vec![
                TrendColumn {
                    label: "AAPL stock".into(),
                    scores: vec![Some(1.0), Some(2.0), Some(3.0)],
                },
                TrendColumn {
                    label: "TSLA stock".into(),
                    scores: vec![Some(4.0), Some(5.0), Some(6.0)],
                },
            ],
        };
        trends.retain_rows(&[true, false, true]);
        assert_eq!(trends.timestamps.len(), 2);
        assert_eq!(trends.columns[0].scores, vec![Some(1.0), Some(3.0)]);
        assert_eq!(trends.columns[1].scores, vec![Some(4.0), Some(6.0)]);
    }

    fn quote_row(symbol: &str) -> QuoteRow {
        QuoteRow {
            symbol: symbol.to_string(),
            timestamp: None,
            last: None,
            open: None,
            high: None,
            low: None,
            prev_close: None,
            change: None,
            change_pct: None,
            extras: vec![],
        }
    }
}
