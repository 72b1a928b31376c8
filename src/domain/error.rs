//! Domain error types.
//!
//! Only [`GapscoutError`] ever aborts a scan. Everything that can go wrong for
//! a single symbol is folded into a [`SkipReason`] and reported alongside the
//! results.

use std::fmt;

use crate::domain::risk::RiskError;
use crate::domain::universe::UniverseError;

/// Top-level error type for gapscout.
#[derive(Debug, thiserror::Error)]
pub enum GapscoutError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("ticker universe is empty")]
    EmptyUniverse,

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to start scan workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl GapscoutError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        GapscoutError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&GapscoutError> for std::process::ExitCode {
    fn from(err: &GapscoutError) -> Self {
        let code: u8 = match err {
            GapscoutError::Io(_) | GapscoutError::Csv(_) | GapscoutError::WorkerPool(_) => 1,
            GapscoutError::ConfigParse { .. }
            | GapscoutError::ConfigMissing { .. }
            | GapscoutError::ConfigInvalid { .. } => 2,
            GapscoutError::EmptyUniverse | GapscoutError::Universe(_) => 3,
        };
        std::process::ExitCode::from(code)
    }
}

/// Failure reported by a market data provider for one request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("no data for {symbol}")]
    NotFound { symbol: String },

    #[error("request for {symbol} timed out after {millis} ms")]
    Timeout { symbol: String, millis: u64 },

    #[error("network error: {reason}")]
    Network { reason: String },

    #[error("malformed response for {symbol}: {reason}")]
    Malformed { symbol: String, reason: String },

    #[error("rate limited by provider")]
    RateLimited,
}

impl ProviderError {
    /// Whether the same request may succeed if repeated later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout { .. } | ProviderError::Network { .. } | ProviderError::RateLimited
        )
    }
}

/// A series that violates the bar ordering or value invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("timestamp at index {index} is not after the previous bar")]
    NonMonotonicTimestamp { index: usize },

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },
}

/// The series is too short for at least one requested indicator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("insufficient data: have {bars} bars, need {required}")]
    InsufficientData { required: usize, bars: usize },
}

/// Why a symbol produced no row. Never escapes the scan.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    DataUnavailable { bars: usize, minimum: usize },
    InsufficientWindow {
        indicator: String,
        bars: usize,
        required: usize,
    },
    Provider(ProviderError),
    NoPriorSession,
    InvalidPrice { price: f64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DataUnavailable { bars, minimum } => {
                write!(f, "data unavailable ({} bars, minimum {})", bars, minimum)
            }
            SkipReason::InsufficientWindow {
                indicator,
                bars,
                required,
            } => write!(
                f,
                "{} undefined at latest bar ({} bars, needs {})",
                indicator, bars, required
            ),
            SkipReason::Provider(e) => write!(f, "provider error: {}", e),
            SkipReason::NoPriorSession => write!(f, "no completed prior session"),
            SkipReason::InvalidPrice { price } => write!(f, "cannot size risk at price {}", price),
        }
    }
}

impl From<ProviderError> for SkipReason {
    fn from(err: ProviderError) -> Self {
        SkipReason::Provider(err)
    }
}

impl From<RiskError> for SkipReason {
    fn from(err: RiskError) -> Self {
        match err {
            RiskError::NonPositivePrice { price } => SkipReason::InvalidPrice { price },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::ExitCode;

    #[test]
    fn exit_codes_by_category() {
        let cfg = GapscoutError::invalid("risk", "risk_k", "must be positive");
        let io = GapscoutError::Io(std::io::Error::other("disk"));
        // ExitCode has no PartialEq; compare the debug rendering.
        let code = |e: &GapscoutError| format!("{:?}", ExitCode::from(e));
        assert_eq!(code(&cfg), format!("{:?}", ExitCode::from(2)));
        assert_eq!(code(&GapscoutError::EmptyUniverse), format!("{:?}", ExitCode::from(3)));
        assert_eq!(code(&io), format!("{:?}", ExitCode::from(1)));
    }

    #[test]
    fn retryable_provider_errors() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(
            ProviderError::Network {
                reason: "reset".into()
            }
            .is_retryable()
        );
        assert!(
            !ProviderError::NotFound {
                symbol: "ABC".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn skip_reason_display() {
        let reason = SkipReason::DataUnavailable {
            bars: 3,
            minimum: 21,
        };
        assert_eq!(reason.to_string(), "data unavailable (3 bars, minimum 21)");
    }
}
