//! Breakout test: price at or near a recent high.

/// Fraction of the rolling high a price must reach to count as a breakout.
pub const BREAKOUT_PROXIMITY: f64 = 0.98;

pub fn is_breakout(price: f64, rolling_high: f64, proximity: f64) -> bool {
    rolling_high > 0.0 && price >= proximity * rolling_high
}
