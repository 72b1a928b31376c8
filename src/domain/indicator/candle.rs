//! Single- and two-bar candle patterns, evaluated per bar from OHLC only.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

/// Lower wick longer than twice the body, upper wick shorter than the body.
pub fn is_hammer(bar: &OhlcvBar) -> bool {
    let body = bar.body();
    bar.lower_wick() > 2.0 * body && bar.upper_wick() < body
}

/// Red bar followed by a green bar whose body covers the red body.
pub fn is_bullish_engulfing(prev: &OhlcvBar, curr: &OhlcvBar) -> bool {
    prev.is_red() && curr.is_green() && curr.open <= prev.close && curr.close >= prev.open
}

pub fn calculate_hammer(bars: &[OhlcvBar]) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Hammer,
        values: bars
            .iter()
            .map(|b| IndicatorPoint::flag(b.timestamp, is_hammer(b)))
            .collect(),
    }
}

pub fn calculate_bullish_engulfing(bars: &[OhlcvBar]) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                IndicatorPoint::invalid(bar.timestamp)
            } else {
                IndicatorPoint::flag(bar.timestamp, is_bullish_engulfing(&bars[i - 1], bar))
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::BullishEngulfing,
        values,
    }
}
