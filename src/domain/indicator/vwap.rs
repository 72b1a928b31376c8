//! Volume-Weighted Average Price.
//!
//! VWAP[i] = sum(C[0..=i] * V[0..=i]) / sum(V[0..=i])
//!
//! Accumulates over the whole loaded window rather than resetting at each
//! session open. Invalid while cumulative volume is zero.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_vwap(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut cum_pv = 0.0;
    let mut cum_volume = 0.0;

    for bar in bars {
        cum_pv += bar.close * bar.volume as f64;
        cum_volume += bar.volume as f64;

        if cum_volume > 0.0 {
            values.push(IndicatorPoint::simple(bar.timestamp, cum_pv / cum_volume));
        } else {
            values.push(IndicatorPoint::invalid(bar.timestamp));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Vwap,
        values,
    }
}
