//! Maps a score plus raw signal flags to an action.
//!
//! The decision table is evaluated top to bottom and the first matching rule
//! wins, so a spring-loaded reversal takes precedence over a breakout even
//! when both flags are set.

use std::fmt;

/// Score cutoffs for each classification tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreTiers {
    pub watch: i32,
    pub action: i32,
    pub elite: i32,
}

impl Default for ScoreTiers {
    fn default() -> Self {
        Self {
            watch: 60,
            action: 70,
            elite: 85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReversalBuy,
    MomentumBreakout,
    Watch,
    Sleep,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::ReversalBuy => "reversal-buy",
            Action::MomentumBreakout => "momentum-breakout",
            Action::Watch => "watch",
            Action::Sleep => "sleep/ignore",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Action::ReversalBuy => "limit order, spring-loaded setup",
            Action::MomentumBreakout => "ride the move",
            Action::Watch => "wait for confirmation",
            Action::Sleep => "no action",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    None,
    Watch,
    Action,
    Elite,
}

impl Tier {
    pub fn from_score(score: i32, tiers: &ScoreTiers) -> Self {
        if score >= tiers.elite {
            Tier::Elite
        } else if score >= tiers.action {
            Tier::Action
        } else if score >= tiers.watch {
            Tier::Watch
        } else {
            Tier::None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::None => "none",
            Tier::Watch => "watch",
            Tier::Action => "action",
            Tier::Elite => "elite",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalFlags {
    pub is_oversold: bool,
    pub breakout: bool,
}

pub fn classify(score: i32, gap_pct: f64, flags: SignalFlags, tiers: &ScoreTiers) -> Action {
    if score >= tiers.action && flags.is_oversold && gap_pct > 0.0 {
        Action::ReversalBuy
    } else if score >= tiers.action && flags.breakout && gap_pct > 0.0 {
        Action::MomentumBreakout
    } else if score >= tiers.watch {
        Action::Watch
    } else {
        Action::Sleep
    }
}
