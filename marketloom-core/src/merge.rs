//! Per-symbol assembly: joins, gap-filling, and derived returns.
//!
//! The primary quote series is the backbone. Every other source left-joins
//! onto its hours, so an hour without a primary observation never reaches
//! the output, and a row without a primary price is dropped outright.

use crate::extract::{BarRow, BarSeries, QuoteRow, QuoteSeries, TrendSeries};
use crate::frame::{Column, SymbolFrame};
use crate::fred::MacroWide;
use crate::matcher::TrendMapping;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Name of the primary price column; the row-drop rule and the return
/// derivation key on it.
pub const PRICE_COLUMN: &str = "last";

/// Suffix applied to secondary columns whose name collides with a column
/// already on the frame.
pub const SECONDARY_SUFFIX: &str = "_y";

/// Name of the joined search-interest column.
pub const TREND_COLUMN: &str = "trend_score";

/// Hourly fractional return of the primary price.
pub const RETURN_COLUMN: &str = "ret_1h";

/// `ret_1h` of the next retained row, aligned onto the current one.
pub const NEXT_RETURN_COLUMN: &str = "ret_1h_next";

#[derive(Debug, Error)]
pub enum MergeError {
    /// A join would introduce a column name the frame already carries
    /// (beyond the secondary suffix rule), e.g. a macro indicator named
    /// like a quote field.
    #[error("join would duplicate column '{column}'")]
    ColumnCollision { column: String },
}

/// Build the aligned table for one symbol.
///
/// Inputs are the normalized extracts (shared read-only), the keyword
/// mapping, and the widened macro grid. See the module doc for the join
/// discipline; gap-filling and returns run after the joins.
pub fn build_symbol_frame(
    symbol: &str,
    quotes: &QuoteSeries,
    bars: &BarSeries,
    trends: &TrendSeries,
    mappings: &[TrendMapping],
    macros: &MacroWide,
) -> Result<SymbolFrame, MergeError> {
    // 1. Backbone: this symbol's primary rows, sorted by hour (stable, so
    //    duplicate hours keep file order).
    let mut rows: Vec<&QuoteRow> = quotes
        .rows
        .iter()
        .filter(|r| r.symbol == symbol && r.timestamp.is_some())
        .collect();
    rows.sort_by_key(|r| r.timestamp);
    let hours: Vec<DateTime<Utc>> = rows.iter().filter_map(|r| r.timestamp).collect();

    let mut frame = SymbolFrame::new(symbol);
    frame.hours = hours.clone();

    for (i, name) in QuoteRow::NUMERIC_FIELDS.iter().enumerate() {
        let values = rows.iter().map(|r| r.numeric_values()[i]).collect();
        push_column(&mut frame, name, values)?;
    }
    for (i, name) in quotes.extra_columns.iter().enumerate() {
        let values = rows
            .iter()
            .map(|r| r.extras.get(i).copied().flatten())
            .collect();
        push_column(&mut frame, name, values)?;
    }

    // 2. Secondary price source, suffixed where names collide.
    if !bars.is_empty() {
        let by_hour: HashMap<DateTime<Utc>, &BarRow> = bars
            .rows
            .iter()
            .filter(|r| r.symbol == symbol)
            .filter_map(|r| r.timestamp.map(|t| (t, r)))
            .collect();

        for (i, name) in BarRow::NUMERIC_FIELDS.iter().enumerate() {
            let values = hours
                .iter()
                .map(|h| by_hour.get(h).and_then(|r| r.numeric_values()[i]))
                .collect();
            let name = disambiguated(&frame, name);
            push_column(&mut frame, &name, values)?;
        }
        for (i, extra) in bars.extra_columns.iter().enumerate() {
            let values = hours
                .iter()
                .map(|h| by_hour.get(h).and_then(|r| r.extras.get(i).copied().flatten()))
                .collect();
            let name = disambiguated(&frame, extra);
            push_column(&mut frame, &name, values)?;
        }
    }

    // 3. Search-interest score, when a mapping claimed this symbol.
    if let Some(mapping) = mappings.iter().find(|m| m.symbol == symbol) {
        if let Some(col) = trends.column(&mapping.label) {
            let by_hour: HashMap<DateTime<Utc>, Option<f64>> = trends
                .timestamps
                .iter()
                .zip(&col.scores)
                .filter_map(|(ts, score)| ts.map(|t| (t, *score)))
                .collect();
            let values = hours
                .iter()
                .map(|h| by_hour.get(h).copied().flatten())
                .collect();
            push_column(&mut frame, TREND_COLUMN, values)?;
        }
    }

    // 4. Macro indicators, broadcast identically to every symbol.
    if !macros.is_empty() {
        for (i, name) in macros.indicators.iter().enumerate() {
            let values = hours.iter().map(|h| macros.value_at(i, *h)).collect();
            push_column(&mut frame, name, values)?;
        }
    }

    // 5. Drop rows with no primary price.
    let keep: Vec<bool> = rows.iter().map(|r| r.last.is_some()).collect();
    frame.retain_rows(&keep);

    // 6. Fill remaining gaps from the same UTC calendar day.
    impute_day_means(&mut frame);

    // 7. Returns on the retained rows.
    let price: Vec<Option<f64>> = frame
        .column(PRICE_COLUMN)
        .map(|c| c.values.clone())
        .unwrap_or_default();
    let mut ret = vec![None; price.len()];
    for i in 1..price.len() {
        if let (Some(prev), Some(cur)) = (price[i - 1], price[i]) {
            ret[i] = Some((cur - prev) / prev);
        }
    }
    let mut ret_next: Vec<Option<f64>> = ret.iter().skip(1).copied().collect();
    if !ret.is_empty() {
        ret_next.push(None);
    }
    push_column(&mut frame, RETURN_COLUMN, ret)?;
    push_column(&mut frame, NEXT_RETURN_COLUMN, ret_next)?;

    Ok(frame)
}

fn push_column(
    frame: &mut SymbolFrame,
    name: &str,
    values: Vec<Option<f64>>,
) -> Result<(), MergeError> {
    if frame.has_column(name) {
        return Err(MergeError::ColumnCollision {
            column: name.to_string(),
        });
    }
    frame.columns.push(Column {
        name: name.to_string(),
        values,
    });
    Ok(())
}

fn disambiguated(frame: &SymbolFrame, name: &str) -> String {
    if frame.has_column(name) {
        format!("{name}{SECONDARY_SUFFIX}")
    } else {
        name.to_string()
    }
}

/// Replace nulls with the column mean over the row's UTC calendar day.
/// A day whose values are all null keeps its nulls (mean of nothing).
fn impute_day_means(frame: &mut SymbolFrame) {
    let mut days: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (i, hour) in frame.hours.iter().enumerate() {
        days.entry(hour.date_naive()).or_default().push(i);
    }

    for col in &mut frame.columns {
        for indices in days.values() {
            let mut sum = 0.0;
            let mut n = 0usize;
            for &i in indices {
                if let Some(v) = col.values[i] {
                    sum += v;
                    n += 1;
                }
            }
            if n == 0 {
                continue;
            }
            let mean = sum / n as f64;
            for &i in indices {
                if col.values[i].is_none() {
                    col.values[i] = Some(mean);
                }
            }
        }
    }
}
