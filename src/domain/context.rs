//! Multi-day context from daily bars: oversold streaks, trend, recent highs.
//!
//! Only fully closed days count. Any daily bar dated on or after the current
//! trading day is dropped before analysis.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::domain::indicator::sma::trailing_mean;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::session::local_date;

pub const OVERSOLD_STREAK_DAYS: usize = 3;
pub const TREND_SMA_DAYS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketContext {
    pub is_oversold: bool,
    pub is_uptrend: bool,
    /// High of the most recent completed day.
    pub reference_high: f64,
    /// Highest high over the trailing breakout lookback of completed days.
    pub period_high: f64,
    pub completed_days: usize,
}

/// Three strictly falling closes, or three red candles in a row.
fn is_oversold_streak(days: &[OhlcvBar]) -> bool {
    if days.len() < OVERSOLD_STREAK_DAYS {
        return false;
    }
    let recent = &days[days.len() - OVERSOLD_STREAK_DAYS..];
    let falling = recent.windows(2).all(|w| w[1].close < w[0].close);
    let all_red = recent.iter().all(OhlcvBar::is_red);
    falling || all_red
}

/// Analyzes daily bars completed before `today` (exchange-local date).
///
/// Returns `None` if no completed day remains. `is_uptrend` is false until
/// at least [`TREND_SMA_DAYS`] completed days are available.
pub fn analyze_context(
    daily: &[OhlcvBar],
    today: NaiveDate,
    tz: Tz,
    breakout_lookback_days: usize,
) -> Option<MarketContext> {
    let completed: Vec<OhlcvBar> = daily
        .iter()
        .filter(|bar| local_date(bar.timestamp, tz) < today)
        .cloned()
        .collect();
    let last = completed.last()?;

    let closes: Vec<f64> = completed.iter().map(|b| b.close).collect();
    let is_uptrend = trailing_mean(&closes, TREND_SMA_DAYS).is_some_and(|sma| last.close > sma);

    let lookback = breakout_lookback_days.clamp(1, completed.len());
    let period_high = completed[completed.len() - lookback..]
        .iter()
        .map(|b| b.high)
        .fold(f64::MIN, f64::max);

    Some(MarketContext {
        is_oversold: is_oversold_streak(&completed),
        is_uptrend,
        reference_high: last.high,
        period_high,
        completed_days: completed.len(),
    })
}
