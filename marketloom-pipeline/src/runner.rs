//! Integration runner — wires loading, normalization, matching, merging,
//! and persistence into one batch pass.
//!
//! Two entry points:
//! - `run_integration()`: the typed pipeline; errors only on conditions
//!   that abort the whole run (missing primary source, shared-artifact
//!   write failure).
//! - `integrate_entry()`: stateless wrapper for external triggering;
//!   always returns a terminal `RunStatus` with an HTTP-style code.
//!
//! Per-symbol failures never abort the run: the symbol is logged, recorded
//! in the summary and manifest, and contributes to neither artifact.

use chrono::Utc;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{error, info, warn};

use marketloom_core::extract::Extracts;
use marketloom_core::frame::{concat, SymbolFrame};
use marketloom_core::fred::to_hourly_wide;
use marketloom_core::matcher::map_trend_columns;
use marketloom_core::merge::{build_symbol_frame, MergeError};
use marketloom_core::normalize;

use crate::config::IntegrateConfig;
use crate::export::{combined_to_csv, frame_to_csv};
use crate::loader::{self, LoadError};
use crate::manifest::{content_hash, RunManifest, SkippedSymbol, SymbolArtifact};
use crate::store::{BlobStore, StoreError};

/// Errors that abort an entire run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required source missing: {path}")]
    MissingRequiredSource { path: String },

    #[error("primary source unusable: {0}")]
    PrimarySource(#[source] LoadError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to encode {artifact}: {reason}")]
    Export { artifact: String, reason: String },
}

/// What one run produced; the manifest persists the same information.
#[derive(Debug, Clone)]
pub struct IntegrationSummary {
    pub written: Vec<SymbolArtifact>,
    pub skipped: Vec<SkippedSymbol>,
    pub combined_rows: usize,
}

/// Terminal status for external callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    /// HTTP-style code: 200 on (possibly partial) success, 500 on abort.
    pub code: u16,
    pub message: String,
}

/// Execute one integration run against the given store.
pub fn run_integration(
    store: &dyn BlobStore,
    config: &IntegrateConfig,
) -> Result<IntegrationSummary, PipelineError> {
    // The primary extract is mandatory; optional extracts degrade to empty.
    let quotes = match loader::load_quotes(store, &config.stock_path) {
        Ok(series) => series,
        Err(LoadError::NotFound { path }) => {
            return Err(PipelineError::MissingRequiredSource { path })
        }
        Err(e) => return Err(PipelineError::PrimarySource(e)),
    };
    let bars = optional(
        loader::load_bars(store, &config.yahoo_path),
        "secondary price",
    );
    let trends = optional(
        loader::load_trends(store, &config.trends_path),
        "search interest",
    );
    let fred = optional(loader::load_fred(store, &config.fred_path), "macro");

    let mut extracts = Extracts {
        quotes,
        bars,
        trends,
        fred,
    };
    normalize::apply(&mut extracts, config.cutoff);

    let symbols = extracts.quotes.symbols();
    let mappings = map_trend_columns(&extracts.trends.labels(), &symbols);
    let macro_wide = to_hourly_wide(&extracts.fred);

    info!(
        symbols = symbols.len(),
        trend_mappings = mappings.len(),
        macro_indicators = macro_wide.indicators.len(),
        "building aligned tables"
    );

    // Frames build independently from shared read-only inputs.
    let built: Vec<(String, Result<SymbolFrame, MergeError>)> = symbols
        .par_iter()
        .map(|symbol| {
            let result = build_symbol_frame(
                symbol,
                &extracts.quotes,
                &extracts.bars,
                &extracts.trends,
                &mappings,
                &macro_wide,
            );
            (symbol.clone(), result)
        })
        .collect();

    let mut written: Vec<SymbolArtifact> = Vec::new();
    let mut skipped: Vec<SkippedSymbol> = Vec::new();
    let mut frames: Vec<SymbolFrame> = Vec::new();

    for (symbol, result) in built {
        let frame = match result {
            Ok(frame) => frame,
            Err(e) => {
                error!(symbol = %symbol, cause = %e, "skipping symbol: merge failed");
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let path = config.symbol_output_path(&symbol);
        let outcome = frame_to_csv(&frame)
            .map_err(|e| e.to_string())
            .and_then(|bytes| match store.save(&path, &bytes) {
                Ok(()) => Ok(bytes),
                Err(e) => Err(e.to_string()),
            });
        match outcome {
            Ok(bytes) => {
                written.push(SymbolArtifact {
                    symbol,
                    path,
                    rows: frame.len(),
                    data_hash: content_hash(&bytes),
                });
                frames.push(frame);
            }
            Err(reason) => {
                error!(symbol = %symbol, cause = %reason, "skipping symbol: write failed");
                skipped.push(SkippedSymbol { symbol, reason });
            }
        }
    }

    let combined = concat(&frames);
    let mut combined_path = None;
    if !combined.is_empty() {
        let path = config.combined_output_path();
        let bytes = combined_to_csv(&combined).map_err(|e| PipelineError::Export {
            artifact: path.clone(),
            reason: e.to_string(),
        })?;
        store.save(&path, &bytes)?;
        combined_path = Some(path);
    }

    let manifest = RunManifest {
        generated_at: Utc::now(),
        cutoff: config.cutoff,
        symbols: written.clone(),
        skipped: skipped.clone(),
        combined_rows: combined.rows.len(),
        combined_path,
    };
    let manifest_bytes = manifest.to_json().map_err(|e| PipelineError::Export {
        artifact: config.manifest_path(),
        reason: e.to_string(),
    })?;
    store.save(&config.manifest_path(), &manifest_bytes)?;

    info!(
        written = written.len(),
        skipped = skipped.len(),
        combined_rows = combined.rows.len(),
        "integration complete"
    );

    Ok(IntegrationSummary {
        written,
        skipped,
        combined_rows: combined.rows.len(),
    })
}

/// Stateless entry point for external triggering (e.g. a scheduler).
/// Always returns a terminal status; partial success is still a 200, with
/// omissions visible only through logs and the manifest.
pub fn integrate_entry(store: &dyn BlobStore, config: &IntegrateConfig) -> RunStatus {
    match run_integration(store, config) {
        Ok(summary) => RunStatus {
            code: 200,
            message: format!(
                "Integration completed successfully: {} symbol(s) written, {} skipped.",
                summary.written.len(),
                summary.skipped.len()
            ),
        },
        Err(e) => RunStatus {
            code: 500,
            message: format!("Integration failed: {e}"),
        },
    }
}

fn optional<T: Default>(result: Result<T, LoadError>, source: &str) -> T {
    match result {
        Ok(series) => series,
        Err(LoadError::NotFound { path }) => {
            warn!(%path, "{source} extract not found; continuing without it");
            T::default()
        }
        Err(e) => {
            warn!(cause = %e, "{source} extract unusable; continuing without it");
            T::default()
        }
    }
}
