//! Stop-loss and take-profit levels for long setups.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    #[error("price must be positive, got {price}")]
    NonPositivePrice { price: f64 },
}

/// Named aggressiveness presets for the target multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggressiveness {
    Conservative,
    Balanced,
    Aggressive,
    Moonshot,
}

impl Aggressiveness {
    /// `(risk_k, min_target_multiple)` for this preset.
    pub fn multipliers(&self) -> (f64, f64) {
        match self {
            Aggressiveness::Conservative => (3.0, 1.10),
            Aggressiveness::Balanced => (4.0, 1.15),
            Aggressiveness::Aggressive => (4.5, 1.20),
            Aggressiveness::Moonshot => (4.5, 1.30),
        }
    }
}

impl FromStr for Aggressiveness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Aggressiveness::Conservative),
            "balanced" => Ok(Aggressiveness::Balanced),
            "aggressive" => Ok(Aggressiveness::Aggressive),
            "moonshot" => Ok(Aggressiveness::Moonshot),
            other => Err(format!("unknown risk profile '{other}'")),
        }
    }
}

impl fmt::Display for Aggressiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Aggressiveness::Conservative => "conservative",
            Aggressiveness::Balanced => "balanced",
            Aggressiveness::Aggressive => "aggressive",
            Aggressiveness::Moonshot => "moonshot",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskProfile {
    pub risk_k: f64,
    pub min_target_multiple: f64,
    pub stop_atr_multiple: f64,
    pub fallback_stop_pct: f64,
    pub stop_floor_pct: f64,
}

impl RiskProfile {
    pub fn from_preset(preset: Aggressiveness) -> Self {
        let (risk_k, min_target_multiple) = preset.multipliers();
        Self {
            risk_k,
            min_target_multiple,
            ..Self::default()
        }
    }
}

impl Default for RiskProfile {
    fn default() -> Self {
        Self {
            risk_k: 4.0,
            min_target_multiple: 1.15,
            stop_atr_multiple: 1.5,
            fallback_stop_pct: 0.05,
            stop_floor_pct: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
    /// True when the levels were sized from ATR rather than fixed percentages.
    pub atr_based: bool,
}

/// Derives stop and target for a long entry at `price`.
///
/// ATR is used only when finite and positive. A stop that would land at or
/// below zero is clamped to `stop_floor_pct` of price.
pub fn compute_levels(
    price: f64,
    atr: Option<f64>,
    profile: &RiskProfile,
) -> Result<RiskLevels, RiskError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(RiskError::NonPositivePrice { price });
    }

    let atr = atr.filter(|a| a.is_finite() && *a > 0.0);
    let minimum_target = price * profile.min_target_multiple;

    let (stop, take_profit) = match atr {
        Some(atr) => (
            price - profile.stop_atr_multiple * atr,
            (price + profile.risk_k * atr).max(minimum_target),
        ),
        None => (price * (1.0 - profile.fallback_stop_pct), minimum_target),
    };

    let stop_loss = if stop <= 0.0 {
        price * profile.stop_floor_pct
    } else {
        stop
    };

    Ok(RiskLevels {
        stop_loss,
        take_profit,
        atr_based: atr.is_some(),
    })
}
