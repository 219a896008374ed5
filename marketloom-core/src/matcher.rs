//! Keyword-to-symbol mapping for the search-interest extract.
//!
//! Trend columns carry free-text labels ("AAPL stock", "tesla shares"),
//! not tickers. The containment pass claims each label for the first known
//! symbol found inside it; the structural fallback only runs when the
//! containment pass produced nothing at all.

/// A trend column resolved to a ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendMapping {
    /// The trend column label, verbatim.
    pub label: String,
    /// The claimed symbol. Under the fallback this may be synthetic, i.e.
    /// absent from the primary extract; joins on it simply find no rows.
    pub symbol: String,
}

/// Map trend column labels to symbols.
///
/// Pass 1: per label, the first symbol (in `symbols` order) contained
/// case-insensitively in the label wins; later symbols are not tested.
/// Pass 2 (only when pass 1 mapped nothing and labels exist): a label's
/// leading token becomes a synthetic symbol iff it is 1-5 uppercase ASCII
/// letters. Labels matching neither pass are dropped without error.
pub fn map_trend_columns(labels: &[String], symbols: &[String]) -> Vec<TrendMapping> {
    let mut mappings = Vec::new();

    for label in labels {
        let haystack = label.to_lowercase();
        let hit = symbols
            .iter()
            .find(|sym| !sym.is_empty() && haystack.contains(&sym.to_lowercase()));
        if let Some(sym) = hit {
            mappings.push(TrendMapping {
                label: label.clone(),
                symbol: sym.clone(),
            });
        }
    }

    if mappings.is_empty() && !labels.is_empty() {
        for label in labels {
            let token = leading_token(label);
            if looks_like_ticker(token) {
                mappings.push(TrendMapping {
                    label: label.clone(),
                    symbol: token.to_string(),
                });
            }
        }
    }

    mappings
}

/// First token of a label, split on whitespace, `:` or `-`.
fn leading_token(label: &str) -> &str {
    label
        .trim()
        .split(|c: char| c.is_whitespace() || c == ':' || c == '-')
        .next()
        .unwrap_or("")
}

fn looks_like_ticker(token: &str) -> bool {
    (1..=5).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_uppercase())
}
