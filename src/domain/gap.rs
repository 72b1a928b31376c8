//! Gap against the previous session's close.
//!
//! The reference close is taken from the last bar of the most recent
//! exchange-local day strictly before the latest bar's day. Counting a fixed
//! number of bars back instead would break whenever pre-market bars, holidays
//! or a different sampling interval change how many bars a day holds.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::session::partition_sessions;

#[derive(Debug, Clone, PartialEq)]
pub struct GapReading {
    pub current_price: f64,
    pub reference_close: f64,
    pub reference_date: NaiveDate,
    pub current_date: NaiveDate,
    pub gap_pct: f64,
}

pub fn gap_percent(current: f64, reference: f64) -> f64 {
    (current - reference) / reference * 100.0
}

/// Computes the gap of the latest bar against the prior completed session.
///
/// Returns `None` when the bars cover only a single day or the reference
/// close is not a positive price.
pub fn session_gap(bars: &[OhlcvBar], tz: Tz) -> Option<GapReading> {
    let sessions = partition_sessions(bars, tz);
    let current = sessions.last()?;
    let reference = sessions.iter().rev().nth(1)?;

    let current_price = bars[current.last_index()].close;
    let reference_close = bars[reference.last_index()].close;
    if reference_close <= 0.0 {
        return None;
    }

    Some(GapReading {
        current_price,
        reference_close,
        reference_date: reference.date,
        current_date: current.date,
        gap_pct: gap_percent(current_price, reference_close),
    })
}

/// Coarse direction of the move relative to the prior close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapBias {
    GapUp,
    GapUpExtended,
    GapDown,
    Flat,
}

pub const GAP_BIAS_PCT: f64 = 3.0;
pub const EXTENDED_GAP_PCT: f64 = 15.0;

impl GapBias {
    pub fn from_gap(gap_pct: f64) -> Self {
        if gap_pct > EXTENDED_GAP_PCT {
            GapBias::GapUpExtended
        } else if gap_pct > GAP_BIAS_PCT {
            GapBias::GapUp
        } else if gap_pct < -GAP_BIAS_PCT {
            GapBias::GapDown
        } else {
            GapBias::Flat
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GapBias::GapUp => "gap-up",
            GapBias::GapUpExtended => "gap-up-extended",
            GapBias::GapDown => "gap-down",
            GapBias::Flat => "flat",
        }
    }

    /// Whether the row belongs with the gappers rather than the watchlist.
    pub fn is_gapper(&self) -> bool {
        !matches!(self, GapBias::Flat)
    }
}
