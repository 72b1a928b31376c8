//! Technical indicator engine.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Numeric reading or boolean pattern flag
//! - `IndicatorType`: Indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values aligned with the bars
//! - `IndicatorSet`: Every requested series for one symbol, built by
//!   [`compute_indicators`]
//!
//! Every value at index `i` depends only on bars `0..=i`. Points inside an
//! indicator's warmup are marked invalid and must not be read as numbers.

pub mod atr;
pub mod breakout;
pub mod candle;
pub mod ema;
pub mod rsi;
pub mod sma;
pub mod volume;
pub mod vwap;

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::error::IndicatorError;
use crate::domain::series::Series;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub valid: bool,
    pub value: IndicatorValue,
}

impl IndicatorPoint {
    pub(crate) fn invalid(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            valid: false,
            value: IndicatorValue::Simple(0.0),
        }
    }

    pub(crate) fn simple(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            valid: true,
            value: IndicatorValue::Simple(value),
        }
    }

    pub(crate) fn flag(timestamp: DateTime<Utc>, value: bool) -> Self {
        Self {
            timestamp,
            valid: true,
            value: IndicatorValue::Flag(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Flag(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Vwap,
    RelativeVolume(usize),
    Hammer,
    BullishEngulfing,
}

impl IndicatorType {
    /// Bars needed before the first valid value appears.
    pub fn required_bars(&self) -> usize {
        match self {
            IndicatorType::Sma(n) | IndicatorType::Ema(n) | IndicatorType::Atr(n) => (*n).max(1),
            IndicatorType::Rsi(n) | IndicatorType::RelativeVolume(n) => n + 1,
            IndicatorType::Vwap | IndicatorType::Hammer => 1,
            IndicatorType::BullishEngulfing => 2,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Vwap => write!(f, "VWAP"),
            IndicatorType::RelativeVolume(lookback) => write!(f, "RVOL({})", lookback),
            IndicatorType::Hammer => write!(f, "HAMMER"),
            IndicatorType::BullishEngulfing => write!(f, "BULLISH_ENGULFING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Numeric value at `index`, or `None` during warmup.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    pub fn flag_at(&self, index: usize) -> Option<bool> {
        match self.values.get(index) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Flag(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    pub fn latest_value(&self) -> Option<f64> {
        self.values.len().checked_sub(1).and_then(|i| self.value_at(i))
    }

    pub fn latest_flag(&self) -> Option<bool> {
        self.values.len().checked_sub(1).and_then(|i| self.flag_at(i))
    }
}

/// All requested indicator series for one series, keyed by type.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    series: HashMap<IndicatorType, IndicatorSeries>,
    len: usize,
}

impl IndicatorSet {
    pub fn get(&self, indicator: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series.get(indicator)
    }

    pub fn latest(&self, indicator: &IndicatorType) -> Option<f64> {
        self.get(indicator).and_then(|s| s.latest_value())
    }

    pub fn latest_flag(&self, indicator: &IndicatorType) -> Option<bool> {
        self.get(indicator).and_then(|s| s.latest_flag())
    }

    /// Number of bars each contained series is aligned with.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn types(&self) -> impl Iterator<Item = &IndicatorType> {
        self.series.keys()
    }
}

/// Largest warmup among `indicators`; a series shorter than this is rejected.
pub fn minimum_bars(indicators: &[IndicatorType]) -> usize {
    indicators
        .iter()
        .map(IndicatorType::required_bars)
        .max()
        .unwrap_or(1)
}

fn calculate(series: &Series, indicator: IndicatorType) -> IndicatorSeries {
    let bars = series.bars();
    match indicator {
        IndicatorType::Sma(n) => sma::calculate_sma(bars, n),
        IndicatorType::Ema(n) => ema::calculate_ema(bars, n),
        IndicatorType::Rsi(n) => rsi::calculate_rsi(bars, n),
        IndicatorType::Atr(n) => atr::calculate_atr(bars, n),
        IndicatorType::Vwap => vwap::calculate_vwap(bars),
        IndicatorType::RelativeVolume(n) => volume::calculate_relative_volume(bars, n),
        IndicatorType::Hammer => candle::calculate_hammer(bars),
        IndicatorType::BullishEngulfing => candle::calculate_bullish_engulfing(bars),
    }
}

/// Computes every requested indicator over `series`.
///
/// Fails with [`IndicatorError::InsufficientData`] if the series is shorter
/// than the largest requested window; callers treat that as a skip.
pub fn compute_indicators(
    series: &Series,
    indicators: &[IndicatorType],
) -> Result<IndicatorSet, IndicatorError> {
    let required = minimum_bars(indicators);
    if series.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            bars: series.len(),
        });
    }

    let computed = indicators
        .iter()
        .map(|&indicator| (indicator, calculate(series, indicator)))
        .collect();

    Ok(IndicatorSet {
        series: computed,
        len: series.len(),
    })
}
