//! Run manifest: what one integration run produced, content-addressed.
//!
//! The manifest is the only machine-readable record of partial success —
//! the entry point reports overall success even when symbols were skipped,
//! so auditing a run means reading this file (or the logs).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata sidecar written next to the integration outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub generated_at: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
    pub symbols: Vec<SymbolArtifact>,
    pub skipped: Vec<SkippedSymbol>,
    pub combined_rows: usize,
    /// Path of the combined artifact; `None` when no symbol succeeded.
    pub combined_path: Option<String>,
}

/// One successfully written per-symbol table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolArtifact {
    pub symbol: String,
    pub path: String,
    pub rows: usize,
    /// BLAKE3 hex digest of the written CSV bytes.
    pub data_hash: String,
}

/// One symbol that contributed nothing to this run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

impl RunManifest {
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// BLAKE3 hex digest of an artifact payload.
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manifest_roundtrips_through_json() {
        let manifest = RunManifest {
            generated_at: Utc.with_ymd_and_hms(2025, 8, 3, 12, 0, 0).unwrap(),
            cutoff: Utc.with_ymd_and_hms(2025, 8, 3, 5, 0, 0).unwrap(),
            symbols: vec![SymbolArtifact {
                symbol: "AAPL".into(),
                path: "integrated_data/AAPL.csv".into(),
                rows: 24,
                data_hash: content_hash(b"payload"),
            }],
            skipped: vec![SkippedSymbol {
                symbol: "TSLA".into(),
                reason: "join would duplicate column 'last'".into(),
            }],
            combined_rows: 24,
            combined_path: Some("integrated_data/integrated_all.csv".into()),
        };

        let parsed = RunManifest::from_json(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(parsed.symbols[0].symbol, "AAPL");
        assert_eq!(parsed.symbols[0].rows, 24);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.combined_rows, 24);
    }

    #[test]
    fn content_hash_is_stable_and_distinguishes_payloads() {
        assert_eq!(content_hash(b"a"), content_hash(b"a"));
        assert_ne!(content_hash(b"a"), content_hash(b"b"));
        assert_eq!(content_hash(b"a").len(), 64);
    }
}
