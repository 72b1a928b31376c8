//! Point-based confidence score.
//!
//! Starts at [`BASE_SCORE`], applies every matching rule from a
//! [`ScoringRules`] table to a shared accumulator, then clamps to 0..=100.
//! Rules are additive, so evaluation order only affects the order of the
//! reason strings.

use crate::domain::context::MarketContext;

pub const BASE_SCORE: i32 = 50;
pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// Weights and trigger levels for every scoring rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRules {
    pub gap_up_pct: f64,
    pub gap_up: i32,
    pub gap_strong_pct: f64,
    pub gap_strong: i32,
    pub gap_extended_pct: f64,
    pub gap_extended: i32,
    pub gap_down_pct: f64,
    pub gap_down_dip: i32,
    pub volume_active_shares: i64,
    pub volume_active: i32,
    pub volume_heavy_shares: i64,
    pub volume_heavy: i32,
    pub above_vwap: i32,
    pub above_ema: i32,
    pub oversold_rsi: f64,
    pub oversold: i32,
    pub overbought_rsi: f64,
    pub overbought: i32,
    pub spring_loaded: i32,
    pub breakout: i32,
    pub low_float_shares: u64,
    pub low_float: i32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            gap_up_pct: 2.0,
            gap_up: 10,
            gap_strong_pct: 5.0,
            gap_strong: 5,
            gap_extended_pct: 15.0,
            gap_extended: -5,
            gap_down_pct: -5.0,
            gap_down_dip: 10,
            volume_active_shares: 10_000,
            volume_active: 10,
            volume_heavy_shares: 50_000,
            volume_heavy: 10,
            above_vwap: 10,
            above_ema: 10,
            oversold_rsi: 30.0,
            oversold: 20,
            overbought_rsi: 70.0,
            overbought: -10,
            spring_loaded: 30,
            breakout: 20,
            low_float_shares: 20_000_000,
            low_float: 20,
        }
    }
}

/// Latest readings for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub price: f64,
    pub gap_pct: f64,
    pub latest_volume: i64,
    pub vwap: Option<f64>,
    pub ema: f64,
    pub rsi: f64,
    pub sentiment: i32,
    pub context: Option<MarketContext>,
    pub breakout: bool,
    pub float_shares: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub score: i32,
    pub reasons: Vec<String>,
}

struct Accumulator {
    total: i32,
    reasons: Vec<String>,
}

impl Accumulator {
    fn apply(&mut self, delta: i32, reason: String) {
        self.total = self.total.saturating_add(delta);
        self.reasons.push(reason);
    }
}

pub fn score(snapshot: &Snapshot, rules: &ScoringRules) -> ScoreResult {
    let mut acc = Accumulator {
        total: BASE_SCORE,
        reasons: Vec::new(),
    };
    let gap = snapshot.gap_pct;

    if gap > rules.gap_up_pct {
        acc.apply(rules.gap_up, format!("Gapped up +{:.1}%", gap));
    }
    if gap > rules.gap_strong_pct {
        acc.apply(rules.gap_strong, "Strong gap".to_string());
    }
    if gap > rules.gap_extended_pct {
        acc.apply(rules.gap_extended, "Extended move, risk of pullback".to_string());
    }
    if gap < rules.gap_down_pct {
        acc.apply(rules.gap_down_dip, format!("Dip opportunity {:.1}%", gap));
    }

    if snapshot.latest_volume > rules.volume_active_shares {
        acc.apply(
            rules.volume_active,
            format!("Active volume ({})", snapshot.latest_volume),
        );
    }
    if snapshot.latest_volume > rules.volume_heavy_shares {
        acc.apply(rules.volume_heavy, "Heavy volume".to_string());
    }

    if let Some(vwap) = snapshot.vwap
        && snapshot.price > vwap
    {
        acc.apply(rules.above_vwap, "Above VWAP".to_string());
    }
    if snapshot.price > snapshot.ema {
        acc.apply(rules.above_ema, "Above EMA(9)".to_string());
    }

    if snapshot.rsi < rules.oversold_rsi {
        acc.apply(rules.oversold, format!("Oversold RSI {:.0}", snapshot.rsi));
    } else if snapshot.rsi > rules.overbought_rsi {
        acc.apply(rules.overbought, format!("Overbought RSI {:.0}", snapshot.rsi));
    }

    if snapshot.sentiment > 0 {
        acc.apply(snapshot.sentiment, "Positive news".to_string());
    } else if snapshot.sentiment < 0 {
        acc.apply(snapshot.sentiment, "Negative news".to_string());
    }

    if let Some(ctx) = &snapshot.context
        && ctx.is_oversold
        && gap > 0.0
    {
        acc.apply(rules.spring_loaded, "Spring-loaded: multi-day drop then gap up".to_string());
    }

    if snapshot.breakout {
        acc.apply(rules.breakout, "Breakout near recent high".to_string());
    }

    if let Some(float) = snapshot.float_shares
        && float < rules.low_float_shares
    {
        acc.apply(
            rules.low_float,
            format!("Low float ({:.1}M)", float as f64 / 1_000_000.0),
        );
    }

    ScoreResult {
        score: acc.total.clamp(MIN_SCORE, MAX_SCORE),
        reasons: acc.reasons,
    }
}
