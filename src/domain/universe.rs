//! Ticker universe.
//!
//! Parses the comma-separated ticker list from configuration into an
//! explicitly constructed, deduplicated value that is handed to the scanner.

use std::collections::HashSet;

use crate::domain::error::GapscoutError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    tickers: Vec<String>,
}

impl Universe {
    /// Builds a universe from a comma-separated list.
    ///
    /// Fails with [`GapscoutError::EmptyUniverse`] if no ticker survives parsing.
    pub fn parse(input: &str) -> Result<Self, GapscoutError> {
        let tickers = parse_tickers(input)?;
        Self::new(tickers)
    }

    pub fn new(tickers: Vec<String>) -> Result<Self, GapscoutError> {
        if tickers.is_empty() {
            return Err(GapscoutError::EmptyUniverse);
        }
        Ok(Self { tickers })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn count(&self) -> usize {
        self.tickers.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("invalid ticker symbol: {0}")]
    InvalidSymbol(String),
}

fn is_valid_symbol(symbol: &str) -> bool {
    symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}

/// Splits, trims and uppercases tickers. Empty tokens are ignored and
/// repeats are dropped, keeping the first occurrence.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        let ticker = trimmed.to_uppercase();
        if !is_valid_symbol(&ticker) {
            return Err(UniverseError::InvalidSymbol(trimmed.to_string()));
        }
        if seen.insert(ticker.clone()) {
            tickers.push(ticker);
        }
    }

    Ok(tickers)
}
