//! Typed scan configuration built from a [`ConfigPort`].

use std::time::Duration;

use chrono_tz::Tz;

use crate::domain::classifier::ScoreTiers;
use crate::domain::config_validation::validate_scan_config;
use crate::domain::error::GapscoutError;
use crate::domain::indicator::breakout::BREAKOUT_PROXIMITY;
use crate::domain::risk::{Aggressiveness, RiskProfile};
use crate::domain::scoring::ScoringRules;
use crate::domain::series::{HistoryRequest, Interval};
use crate::domain::universe::Universe;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_INTERVAL: &str = "15m";
pub const DEFAULT_INTRADAY_PERIOD_DAYS: i64 = 5;
pub const DEFAULT_DAILY_PERIOD_DAYS: i64 = 90;
pub const DEFAULT_MAX_IN_FLIGHT: i64 = 4;
pub const DEFAULT_FETCH_TIMEOUT_SECS: i64 = 10;
pub const DEFAULT_NEWS_SCORE_THRESHOLD: i64 = 60;
pub const DEFAULT_RELATIVE_VOLUME_LOOKBACK: i64 = 20;
pub const DEFAULT_BREAKOUT_LOOKBACK_DAYS: i64 = 20;
pub const DEFAULT_REQUESTS_PER_SECOND: i64 = 5;
pub const DEFAULT_RETRY_ATTEMPTS: i64 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: i64 = 250;
pub const DEFAULT_PROFILE: &str = "balanced";

/// Largest magnitude accepted for a single `[weights]` score delta.
pub const MAX_WEIGHT: i64 = 100;

/// Score deltas in `[weights]`. Share and percentage levels live beside them.
pub(crate) const WEIGHT_KEYS: &[&str] = &[
    "gap_up",
    "gap_strong",
    "gap_extended",
    "gap_down_dip",
    "volume_active",
    "volume_heavy",
    "above_vwap",
    "above_ema",
    "oversold",
    "overbought",
    "spring_loaded",
    "breakout",
    "low_float",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleConfig {
    pub requests_per_second: u32,
    pub retry_attempts: u32,
    pub retry_base_delay: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND as u32,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS as u32,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS as u64),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub universe: Universe,
    pub timezone: Tz,
    pub intraday: HistoryRequest,
    pub daily_period_days: u32,
    pub max_in_flight: usize,
    pub fetch_timeout: Duration,
    pub news_score_threshold: i32,
    pub relative_volume_lookback: usize,
    pub breakout_proximity: f64,
    pub breakout_lookback_days: usize,
    pub throttle: ThrottleConfig,
    pub risk: RiskProfile,
    pub rules: ScoringRules,
    pub tiers: ScoreTiers,
}

impl ScanConfig {
    /// Defaults for everything except the universe.
    pub fn with_universe(universe: Universe) -> Self {
        Self {
            universe,
            timezone: chrono_tz::America::New_York,
            intraday: HistoryRequest::intraday(
                DEFAULT_INTRADAY_PERIOD_DAYS as u32,
                Interval::FifteenMinutes,
                true,
            ),
            daily_period_days: DEFAULT_DAILY_PERIOD_DAYS as u32,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT as usize,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS as u64),
            news_score_threshold: DEFAULT_NEWS_SCORE_THRESHOLD as i32,
            relative_volume_lookback: DEFAULT_RELATIVE_VOLUME_LOOKBACK as usize,
            breakout_proximity: BREAKOUT_PROXIMITY,
            breakout_lookback_days: DEFAULT_BREAKOUT_LOOKBACK_DAYS as usize,
            throttle: ThrottleConfig::default(),
            risk: RiskProfile::default(),
            rules: ScoringRules::default(),
            tiers: ScoreTiers::default(),
        }
    }

    /// Validates and loads the full configuration.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GapscoutError> {
        validate_scan_config(config)?;

        let tickers = config
            .get_string("scan", "tickers")
            .ok_or_else(|| GapscoutError::ConfigMissing {
                section: "scan".to_string(),
                key: "tickers".to_string(),
            })?;
        let universe = Universe::parse(&tickers)?;

        let timezone = parse_timezone(config)?;
        let interval = parse_interval(config)?;
        let intraday = HistoryRequest::intraday(
            config.get_int("scan", "intraday_period_days", DEFAULT_INTRADAY_PERIOD_DAYS) as u32,
            interval,
            config.get_bool("scan", "include_extended_hours", true),
        );

        Ok(Self {
            universe,
            timezone,
            intraday,
            daily_period_days: config.get_int("scan", "daily_period_days", DEFAULT_DAILY_PERIOD_DAYS)
                as u32,
            max_in_flight: config.get_int("scan", "max_in_flight", DEFAULT_MAX_IN_FLIGHT) as usize,
            fetch_timeout: Duration::from_secs(
                config.get_int("scan", "fetch_timeout_secs", DEFAULT_FETCH_TIMEOUT_SECS) as u64,
            ),
            news_score_threshold: i32::try_from(config.get_int(
                "scan",
                "news_score_threshold",
                DEFAULT_NEWS_SCORE_THRESHOLD,
            ))
            .unwrap_or(DEFAULT_NEWS_SCORE_THRESHOLD as i32),
            relative_volume_lookback: config.get_int(
                "scan",
                "relative_volume_lookback",
                DEFAULT_RELATIVE_VOLUME_LOOKBACK,
            ) as usize,
            breakout_proximity: config.get_double(
                "thresholds",
                "breakout_proximity",
                BREAKOUT_PROXIMITY,
            ),
            breakout_lookback_days: config.get_int(
                "thresholds",
                "breakout_lookback_days",
                DEFAULT_BREAKOUT_LOOKBACK_DAYS,
            ) as usize,
            throttle: load_throttle(config),
            risk: load_risk(config)?,
            rules: load_rules(config),
            tiers: load_tiers(config),
        })
    }
}

pub(crate) fn parse_timezone(config: &dyn ConfigPort) -> Result<Tz, GapscoutError> {
    let name = config
        .get_string("scan", "exchange_timezone")
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    name.trim().parse::<Tz>().map_err(|_| {
        GapscoutError::invalid(
            "scan",
            "exchange_timezone",
            format!("unknown timezone '{}'", name.trim()),
        )
    })
}

pub(crate) fn parse_interval(config: &dyn ConfigPort) -> Result<Interval, GapscoutError> {
    let raw = config
        .get_string("scan", "intraday_interval")
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string());
    raw.parse::<Interval>()
        .map_err(|reason| GapscoutError::invalid("scan", "intraday_interval", reason))
}

pub(crate) fn parse_profile(config: &dyn ConfigPort) -> Result<Aggressiveness, GapscoutError> {
    let raw = config
        .get_string("risk", "profile")
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
    raw.parse::<Aggressiveness>()
        .map_err(|reason| GapscoutError::invalid("risk", "profile", reason))
}

fn load_throttle(config: &dyn ConfigPort) -> ThrottleConfig {
    ThrottleConfig {
        requests_per_second: config.get_int(
            "throttle",
            "requests_per_second",
            DEFAULT_REQUESTS_PER_SECOND,
        ) as u32,
        retry_attempts: config.get_int("throttle", "retry_attempts", DEFAULT_RETRY_ATTEMPTS) as u32,
        retry_base_delay: Duration::from_millis(config.get_int(
            "throttle",
            "retry_base_delay_ms",
            DEFAULT_RETRY_BASE_DELAY_MS,
        ) as u64),
    }
}

/// Preset multipliers, with `risk_k` and `min_target_multiple` overriding
/// the preset when present.
pub(crate) fn load_risk(config: &dyn ConfigPort) -> Result<RiskProfile, GapscoutError> {
    let preset = RiskProfile::from_preset(parse_profile(config)?);
    Ok(RiskProfile {
        risk_k: config.get_double("risk", "risk_k", preset.risk_k),
        min_target_multiple: config.get_double(
            "risk",
            "min_target_multiple",
            preset.min_target_multiple,
        ),
        stop_atr_multiple: config.get_double("risk", "stop_atr_multiple", preset.stop_atr_multiple),
        fallback_stop_pct: config.get_double("risk", "fallback_stop_pct", preset.fallback_stop_pct),
        stop_floor_pct: config.get_double("risk", "stop_floor_pct", preset.stop_floor_pct),
    })
}

pub(crate) fn load_tiers(config: &dyn ConfigPort) -> ScoreTiers {
    let d = ScoreTiers::default();
    let tier = |key: &str, default: i32| {
        i32::try_from(config.get_int("thresholds", key, default as i64)).unwrap_or(default)
    };
    ScoreTiers {
        watch: tier("watch", d.watch),
        action: tier("action", d.action),
        elite: tier("elite", d.elite),
    }
}

/// Rule table from `[weights]`, with RSI and float cutoffs from `[thresholds]`.
pub(crate) fn load_rules(config: &dyn ConfigPort) -> ScoringRules {
    let d = ScoringRules::default();
    let weight = |key: &str, default: i32| {
        i32::try_from(config.get_int("weights", key, default as i64)).unwrap_or(default)
    };
    let level = |key: &str, default: f64| config.get_double("weights", key, default);

    ScoringRules {
        gap_up_pct: level("gap_up_pct", d.gap_up_pct),
        gap_up: weight("gap_up", d.gap_up),
        gap_strong_pct: level("gap_strong_pct", d.gap_strong_pct),
        gap_strong: weight("gap_strong", d.gap_strong),
        gap_extended_pct: level("gap_extended_pct", d.gap_extended_pct),
        gap_extended: weight("gap_extended", d.gap_extended),
        gap_down_pct: level("gap_down_pct", d.gap_down_pct),
        gap_down_dip: weight("gap_down_dip", d.gap_down_dip),
        volume_active_shares: config.get_int(
            "weights",
            "volume_active_shares",
            d.volume_active_shares,
        ),
        volume_active: weight("volume_active", d.volume_active),
        volume_heavy_shares: config.get_int("weights", "volume_heavy_shares", d.volume_heavy_shares),
        volume_heavy: weight("volume_heavy", d.volume_heavy),
        above_vwap: weight("above_vwap", d.above_vwap),
        above_ema: weight("above_ema", d.above_ema),
        oversold_rsi: config.get_double("thresholds", "oversold_rsi_threshold", d.oversold_rsi),
        oversold: weight("oversold", d.oversold),
        overbought_rsi: config.get_double(
            "thresholds",
            "overbought_rsi_threshold",
            d.overbought_rsi,
        ),
        overbought: weight("overbought", d.overbought),
        spring_loaded: weight("spring_loaded", d.spring_loaded),
        breakout: weight("breakout", d.breakout),
        low_float_shares: u64::try_from(config.get_int(
            "thresholds",
            "low_float_threshold",
            d.low_float_shares as i64,
        ))
        .unwrap_or(d.low_float_shares),
        low_float: weight("low_float", d.low_float),
    }
}
