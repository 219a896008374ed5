//! marketloom-core — extract schemas and the integration transforms.
//!
//! The pure in-memory layer of the pipeline, no I/O:
//! - Typed records for the four raw extracts
//! - Temporal normalization (UTC hours, cutoff filter)
//! - Keyword-to-symbol matching for search-trend columns
//! - Macro long-to-wide pivot with hourly forward-fill
//! - Per-symbol merge, gap-filling, and return derivation

pub mod extract;
pub mod frame;
pub mod fred;
pub mod matcher;
pub mod merge;
pub mod normalize;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: extract and frame types are Send + Sync.
    ///
    /// The runner shares normalized extracts read-only across a rayon pool,
    /// so every input to the merger must cross thread boundaries.
    #[test]
    fn shared_types_are_send_sync() {
        fn require<T: Send + Sync>() {}

        require::<extract::Extracts>();
        require::<extract::QuoteSeries>();
        require::<extract::BarSeries>();
        require::<extract::TrendSeries>();
        require::<extract::MacroSeries>();
        require::<fred::MacroWide>();
        require::<frame::SymbolFrame>();
        require::<frame::CombinedTable>();
        require::<matcher::TrendMapping>();
    }
}
