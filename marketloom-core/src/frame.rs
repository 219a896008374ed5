//! Column-oriented aligned tables.
//!
//! `SymbolFrame` is the per-symbol output of the merger: one hourly axis
//! plus named numeric columns of equal length. `concat` unions frames into
//! the combined cross-symbol table, matching columns by name.

use chrono::{DateTime, Utc};

/// A named numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// The aligned table for one symbol. Constructed fresh per run, never
/// mutated after it is written.
#[derive(Debug, Clone, Default)]
pub struct SymbolFrame {
    pub symbol: String,
    pub hours: Vec<DateTime<Utc>>,
    pub columns: Vec<Column>,
}

impl SymbolFrame {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            hours: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Keep only the rows where `keep` is true. `keep` must cover all rows.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        let mut i = 0;
        self.hours.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
        for col in &mut self.columns {
            let mut i = 0;
            col.values.retain(|_| {
                let k = keep[i];
                i += 1;
                k
            });
        }
    }
}

/// One row of the combined cross-symbol table.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
    pub symbol: String,
    pub hour: DateTime<Utc>,
    /// Parallel to `CombinedTable::column_names`.
    pub values: Vec<Option<f64>>,
}

/// Row-wise concatenation of per-symbol frames with column union.
#[derive(Debug, Clone, Default)]
pub struct CombinedTable {
    /// Union of the input frames' columns, first-appearance order.
    pub column_names: Vec<String>,
    pub rows: Vec<CombinedRow>,
}

impl CombinedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Concatenate frames in input order. Cells a frame does not carry are
/// null, so symbols with different joined sources still share one schema.
pub fn concat(frames: &[SymbolFrame]) -> CombinedTable {
    let mut column_names: Vec<String> = Vec::new();
    for frame in frames {
        for col in &frame.columns {
            if !column_names.contains(&col.name) {
                column_names.push(col.name.clone());
            }
        }
    }

    let mut rows = Vec::new();
    for frame in frames {
        let lookup: Vec<Option<&Column>> = column_names
            .iter()
            .map(|name| frame.column(name))
            .collect();
        for i in 0..frame.len() {
            let values = lookup
                .iter()
                .map(|col| col.and_then(|c| c.values[i]))
                .collect();
            rows.push(CombinedRow {
                symbol: frame.symbol.clone(),
                hour: frame.hours[i],
                values,
            });
        }
    }

    CombinedTable { column_names, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 3, h, 0, 0).unwrap()
    }

    fn frame(symbol: &str, columns: &[(&str, Vec<Option<f64>>)], hours: Vec<DateTime<Utc>>) -> SymbolFrame {
        SymbolFrame {
            symbol: symbol.into(),
            hours,
            columns: columns
                .iter()
                .map(|(name, values)| Column {
                    name: name.to_string(),
                    values: values.clone(),
                })
                .collect(),
        }
    }

    #[test]
    fn retain_rows_filters_axis_and_columns_together() {
        let mut f = frame(
            "AAPL",
            &[("last", vec![Some(1.0), Some(2.0), Some(3.0)])],
            vec![hour(1), hour(2), hour(3)],
        );
        f.retain_rows(&[true, false, true]);
        assert_eq!(f.hours, vec![hour(1), hour(3)]);
        assert_eq!(f.columns[0].values, vec![Some(1.0), Some(3.0)]);
    }

    #[test]
    fn concat_unions_columns_in_first_appearance_order() {
        let a = frame(
            "AAPL",
            &[("last", vec![Some(1.0)]), ("trend_score", vec![Some(50.0)])],
            vec![hour(1)],
        );
        let b = frame(
            "MSFT",
            &[("last", vec![Some(2.0)]), ("GDP", vec![Some(1000.0)])],
            vec![hour(1)],
        );
        let combined = concat(&[a, b]);

        assert_eq!(combined.column_names, vec!["last", "trend_score", "GDP"]);
        assert_eq!(combined.rows.len(), 2);
        // AAPL has no GDP column; MSFT has no trend_score column.
        assert_eq!(combined.rows[0].values, vec![Some(1.0), Some(50.0), None]);
        assert_eq!(combined.rows[1].values, vec![Some(2.0), None, Some(1000.0)]);
    }

    #[test]
    fn concat_of_nothing_is_empty() {
        assert!(concat(&[]).is_empty());
    }
}
