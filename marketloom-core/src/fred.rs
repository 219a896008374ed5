//! Macro-indicator widening: long observations onto an hourly wide grid.
//!
//! The macro extract arrives long (indicator, value, timestamp). Joining it
//! onto hourly price series needs one row per hour and one column per
//! indicator. Macro series publish at daily or slower cadence, so missing
//! hours carry the latest known value forward rather than interpolating.

use crate::extract::MacroSeries;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// `MacroSeries` pivoted wide and resampled to a contiguous hourly grid.
///
/// Invariants: `hours` is strictly increasing with no gaps; every value
/// vector has the same length as `hours`; entries before an indicator's
/// first observation stay null.
#[derive(Debug, Clone, Default)]
pub struct MacroWide {
    pub hours: Vec<DateTime<Utc>>,
    /// Indicator names, sorted.
    pub indicators: Vec<String>,
    /// One vector per indicator, parallel to `indicators` and `hours`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl MacroWide {
    pub fn is_empty(&self) -> bool {
        self.hours.is_empty() || self.indicators.is_empty()
    }

    /// Grid index of an hour-truncated instant, if covered by the grid.
    pub fn hour_index(&self, ts: DateTime<Utc>) -> Option<usize> {
        let first = *self.hours.first()?;
        if ts < first {
            return None;
        }
        let offset = (ts - first).num_seconds();
        if offset % 3600 != 0 {
            return None;
        }
        let idx = (offset / 3600) as usize;
        (idx < self.hours.len()).then_some(idx)
    }

    /// Forward-filled value of one indicator at one grid hour.
    pub fn value_at(&self, indicator_idx: usize, ts: DateTime<Utc>) -> Option<f64> {
        let hour = self.hour_index(ts)?;
        self.values.get(indicator_idx)?.get(hour).copied().flatten()
    }
}

/// Pivot and resample the macro extract.
///
/// Observations with a null timestamp or null value contribute nothing; on
/// duplicate (hour, indicator) cells the last observation wins. Timestamps
/// are expected hour-truncated already (normalization runs first).
pub fn to_hourly_wide(series: &MacroSeries) -> MacroWide {
    let mut cells: BTreeMap<DateTime<Utc>, BTreeMap<&str, f64>> = BTreeMap::new();
    let mut names: BTreeSet<&str> = BTreeSet::new();

    for obs in &series.rows {
        let (Some(ts), Some(value)) = (obs.timestamp, obs.value) else {
            continue;
        };
        names.insert(obs.indicator.as_str());
        cells.entry(ts).or_default().insert(obs.indicator.as_str(), value);
    }

    let (Some(first), Some(last)) = (
        cells.keys().next().copied(),
        cells.keys().next_back().copied(),
    ) else {
        return MacroWide::default();
    };

    let mut hours = Vec::new();
    let mut cursor = first;
    while cursor <= last {
        hours.push(cursor);
        cursor = cursor + Duration::hours(1);
    }

    let indicators: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    let mut values = Vec::with_capacity(indicators.len());
    for name in &names {
        let mut carried: Option<f64> = None;
        let mut col = Vec::with_capacity(hours.len());
        for hour in &hours {
            if let Some(v) = cells.get(hour).and_then(|row| row.get(*name)) {
                carried = Some(*v);
            }
            col.push(carried);
        }
        values.push(col);
    }

    MacroWide {
        hours,
        indicators,
        values,
    }
}
