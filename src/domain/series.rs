//! Per-symbol OHLCV series at a fixed sampling interval.
//!
//! A [`Series`] is immutable once built and always strictly ordered by
//! timestamp. Construction through [`Series::new`] enforces this, so every
//! downstream calculation may index bars without re-checking order.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::domain::error::SeriesError;
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
    Daily,
}

impl Interval {
    pub fn duration(&self) -> Duration {
        match self {
            Interval::OneMinute => Duration::minutes(1),
            Interval::FiveMinutes => Duration::minutes(5),
            Interval::FifteenMinutes => Duration::minutes(15),
            Interval::ThirtyMinutes => Duration::minutes(30),
            Interval::SixtyMinutes => Duration::minutes(60),
            Interval::Daily => Duration::days(1),
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, Interval::Daily)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::SixtyMinutes => "60m",
            Interval::Daily => "1d",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinutes),
            "15m" => Ok(Interval::FifteenMinutes),
            "30m" => Ok(Interval::ThirtyMinutes),
            "60m" | "1h" => Ok(Interval::SixtyMinutes),
            "1d" => Ok(Interval::Daily),
            other => Err(format!("unknown interval '{}'", other)),
        }
    }
}

/// Parameters for one history fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryRequest {
    pub period_days: u32,
    pub interval: Interval,
    pub include_extended_hours: bool,
}

impl HistoryRequest {
    pub fn intraday(period_days: u32, interval: Interval, include_extended_hours: bool) -> Self {
        Self {
            period_days,
            interval,
            include_extended_hours,
        }
    }

    pub fn daily(period_days: u32) -> Self {
        Self {
            period_days,
            interval: Interval::Daily,
            include_extended_hours: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Series {
    symbol: String,
    interval: Interval,
    bars: Vec<OhlcvBar>,
}

impl Series {
    /// Builds a series, rejecting out-of-order or duplicate timestamps and
    /// bars with non-finite or negative prices.
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        bars: Vec<OhlcvBar>,
    ) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            let prices = [bar.open, bar.high, bar.low, bar.close];
            if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(SeriesError::InvalidBar {
                    index,
                    reason: "non-finite or negative price".into(),
                });
            }
            if bar.volume < 0 {
                return Err(SeriesError::InvalidBar {
                    index,
                    reason: "negative volume".into(),
                });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(SeriesError::NonMonotonicTimestamp { index });
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            interval,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(minute: u32, close: f64) -> OhlcvBar {
        OhlcvBar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 14, minute, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    #[test]
    fn interval_parse_and_display() {
        assert_eq!("15m".parse::<Interval>(), Ok(Interval::FifteenMinutes));
        assert_eq!("1H".parse::<Interval>(), Ok(Interval::SixtyMinutes));
        assert_eq!(Interval::Daily.to_string(), "1d");
        assert!("2w".parse::<Interval>().is_err());
    }

    #[test]
    fn interval_durations() {
        assert_eq!(Interval::FifteenMinutes.duration(), Duration::minutes(15));
        assert!(Interval::ThirtyMinutes.is_intraday());
        assert!(!Interval::Daily.is_intraday());
    }

    #[test]
    fn series_accepts_increasing_timestamps() {
        let series = Series::new(
            "ABC",
            Interval::FifteenMinutes,
            vec![bar(30, 1.0), bar(45, 2.0)],
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "ABC");
        assert!((series.latest().unwrap().close - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn series_rejects_duplicate_timestamp() {
        let result = Series::new(
            "ABC",
            Interval::FifteenMinutes,
            vec![bar(30, 1.0), bar(30, 2.0)],
        );
        assert_eq!(
            result.unwrap_err(),
            SeriesError::NonMonotonicTimestamp { index: 1 }
        );
    }

    #[test]
    fn series_rejects_nan_price() {
        let result = Series::new("ABC", Interval::FifteenMinutes, vec![bar(30, f64::NAN)]);
        assert!(matches!(result, Err(SeriesError::InvalidBar { index: 0, .. })));
    }

    #[test]
    fn empty_series_is_allowed() {
        let series = Series::new("ABC", Interval::Daily, vec![]).unwrap();
        assert!(series.is_empty());
        assert!(series.latest().is_none());
    }
}
