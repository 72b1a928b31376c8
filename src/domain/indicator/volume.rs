//! Relative volume: a bar's volume against the mean of the preceding bars.
//!
//! RVOL(n)[i] = V[i] / mean(V[i-n..i])
//! Warmup: first n bars are invalid. Invalid when the trailing mean is zero.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_relative_volume(bars: &[OhlcvBar], lookback: usize) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if lookback == 0 || i < lookback {
                return IndicatorPoint::invalid(bar.timestamp);
            }
            let mean = bars[i - lookback..i]
                .iter()
                .map(|b| b.volume as f64)
                .sum::<f64>()
                / lookback as f64;
            if mean > 0.0 {
                IndicatorPoint::simple(bar.timestamp, bar.volume as f64 / mean)
            } else {
                IndicatorPoint::invalid(bar.timestamp)
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::RelativeVolume(lookback),
        values,
    }
}
