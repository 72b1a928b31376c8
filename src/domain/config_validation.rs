//! Configuration validation.
//!
//! Validates all config fields before a scan runs. An invalid configuration
//! and an empty universe are the only failures that stop a scan outright.

use crate::domain::classifier::ScoreTiers;
use crate::domain::config::{
    DEFAULT_MAX_IN_FLIGHT, DEFAULT_NEWS_SCORE_THRESHOLD, DEFAULT_REQUESTS_PER_SECOND,
    MAX_WEIGHT, WEIGHT_KEYS, load_risk, load_rules, parse_interval, parse_timezone,
};
use crate::domain::error::GapscoutError;
use crate::domain::indicator::breakout::BREAKOUT_PROXIMITY;
use crate::domain::universe::Universe;
use crate::ports::config_port::ConfigPort;

/// Longest history window, in days, a scan may request.
pub const MAX_PERIOD_DAYS: i64 = 3650;
pub const MAX_RETRY_ATTEMPTS: i64 = 10;

const INT_KEYS: &[(&str, &str)] = &[
    ("scan", "intraday_period_days"),
    ("scan", "daily_period_days"),
    ("scan", "max_in_flight"),
    ("scan", "fetch_timeout_secs"),
    ("scan", "news_score_threshold"),
    ("scan", "relative_volume_lookback"),
    ("throttle", "requests_per_second"),
    ("throttle", "retry_attempts"),
    ("throttle", "retry_base_delay_ms"),
    ("thresholds", "low_float_threshold"),
    ("thresholds", "breakout_lookback_days"),
    ("thresholds", "watch"),
    ("thresholds", "action"),
    ("thresholds", "elite"),
    ("weights", "volume_active_shares"),
    ("weights", "volume_heavy_shares"),
];

const FLOAT_KEYS: &[(&str, &str)] = &[
    ("risk", "risk_k"),
    ("risk", "min_target_multiple"),
    ("risk", "stop_atr_multiple"),
    ("risk", "fallback_stop_pct"),
    ("risk", "stop_floor_pct"),
    ("thresholds", "oversold_rsi_threshold"),
    ("thresholds", "overbought_rsi_threshold"),
    ("thresholds", "breakout_proximity"),
    ("weights", "gap_up_pct"),
    ("weights", "gap_strong_pct"),
    ("weights", "gap_extended_pct"),
    ("weights", "gap_down_pct"),
];

const BOOL_KEYS: &[(&str, &str)] = &[("scan", "include_extended_hours")];

pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    validate_tickers(config)?;
    validate_value_types(config)?;
    validate_market(config)?;
    validate_scan_limits(config)?;
    validate_throttle(config)?;
    validate_risk(config)?;
    validate_rsi_thresholds(config)?;
    validate_low_float(config)?;
    validate_breakout(config)?;
    validate_weights(config)?;
    validate_tiers(config)?;
    Ok(())
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    match config.get_string("scan", "tickers") {
        Some(list) => Universe::parse(&list).map(|_| ()),
        None => Err(GapscoutError::ConfigMissing {
            section: "scan".to_string(),
            key: "tickers".to_string(),
        }),
    }
}

/// Present values must parse as their key's type. The typed getters fall
/// back to defaults, so a typo would otherwise go unnoticed.
fn validate_value_types(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    let weight_keys = WEIGHT_KEYS.iter().map(|key| ("weights", *key));
    for (section, key) in INT_KEYS.iter().copied().chain(weight_keys) {
        config
            .parse_int(section, key)
            .map_err(|reason| GapscoutError::invalid(section, key, reason))?;
    }
    for &(section, key) in FLOAT_KEYS {
        config
            .parse_double(section, key)
            .map_err(|reason| GapscoutError::invalid(section, key, reason))?;
    }
    for &(section, key) in BOOL_KEYS {
        config
            .parse_bool(section, key)
            .map_err(|reason| GapscoutError::invalid(section, key, reason))?;
    }
    Ok(())
}

fn validate_market(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    parse_timezone(config)?;
    let interval = parse_interval(config)?;
    if !interval.is_intraday() {
        return Err(GapscoutError::invalid(
            "scan",
            "intraday_interval",
            "intraday_interval must be an intraday interval",
        ));
    }
    Ok(())
}

fn validate_scan_limits(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    for (key, default) in [("intraday_period_days", 5), ("daily_period_days", 90)] {
        let days = config.get_int("scan", key, default);
        if !(1..=MAX_PERIOD_DAYS).contains(&days) {
            return Err(GapscoutError::invalid(
                "scan",
                key,
                format!("{key} must be between 1 and {MAX_PERIOD_DAYS}"),
            ));
        }
    }
    if config.get_int("scan", "max_in_flight", DEFAULT_MAX_IN_FLIGHT) < 1 {
        return Err(GapscoutError::invalid(
            "scan",
            "max_in_flight",
            "max_in_flight must be at least 1",
        ));
    }
    let news = config.get_int("scan", "news_score_threshold", DEFAULT_NEWS_SCORE_THRESHOLD);
    if !(0..=100).contains(&news) {
        return Err(GapscoutError::invalid(
            "scan",
            "news_score_threshold",
            "news_score_threshold must be between 0 and 100",
        ));
    }
    if config.get_int("scan", "fetch_timeout_secs", 10) < 1 {
        return Err(GapscoutError::invalid(
            "scan",
            "fetch_timeout_secs",
            "fetch_timeout_secs must be at least 1",
        ));
    }
    if config.get_int("scan", "relative_volume_lookback", 20) < 1 {
        return Err(GapscoutError::invalid(
            "scan",
            "relative_volume_lookback",
            "relative_volume_lookback must be at least 1",
        ));
    }
    Ok(())
}

fn validate_throttle(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    let rps = config.get_int("throttle", "requests_per_second", DEFAULT_REQUESTS_PER_SECOND);
    if rps < 1 || rps > u32::MAX as i64 {
        return Err(GapscoutError::invalid(
            "throttle",
            "requests_per_second",
            "requests_per_second must be at least 1",
        ));
    }
    if !(0..=MAX_RETRY_ATTEMPTS).contains(&config.get_int("throttle", "retry_attempts", 3)) {
        return Err(GapscoutError::invalid(
            "throttle",
            "retry_attempts",
            format!("retry_attempts must be between 0 and {MAX_RETRY_ATTEMPTS}"),
        ));
    }
    if config.get_int("throttle", "retry_base_delay_ms", 250) < 0 {
        return Err(GapscoutError::invalid(
            "throttle",
            "retry_base_delay_ms",
            "retry_base_delay_ms must be non-negative",
        ));
    }
    Ok(())
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    let risk = load_risk(config)?;
    if risk.risk_k <= 0.0 {
        return Err(GapscoutError::invalid(
            "risk",
            "risk_k",
            "risk_k must be positive",
        ));
    }
    if risk.min_target_multiple <= 1.0 {
        return Err(GapscoutError::invalid(
            "risk",
            "min_target_multiple",
            "min_target_multiple must be greater than 1",
        ));
    }
    if risk.stop_atr_multiple <= 0.0 {
        return Err(GapscoutError::invalid(
            "risk",
            "stop_atr_multiple",
            "stop_atr_multiple must be positive",
        ));
    }
    for (key, value) in [
        ("fallback_stop_pct", risk.fallback_stop_pct),
        ("stop_floor_pct", risk.stop_floor_pct),
    ] {
        if value <= 0.0 || value >= 1.0 {
            return Err(GapscoutError::invalid(
                "risk",
                key,
                format!("{key} must be between 0 and 1"),
            ));
        }
    }
    Ok(())
}

fn validate_rsi_thresholds(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    let rules = load_rules(config);
    if rules.oversold_rsi <= 0.0 || rules.oversold_rsi >= 100.0 {
        return Err(GapscoutError::invalid(
            "thresholds",
            "oversold_rsi_threshold",
            "oversold_rsi_threshold must be between 0 and 100",
        ));
    }
    if rules.overbought_rsi <= rules.oversold_rsi || rules.overbought_rsi >= 100.0 {
        return Err(GapscoutError::invalid(
            "thresholds",
            "overbought_rsi_threshold",
            "overbought_rsi_threshold must be above oversold_rsi_threshold and below 100",
        ));
    }
    Ok(())
}

fn validate_low_float(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    if config.get_int("thresholds", "low_float_threshold", 20_000_000) <= 0 {
        return Err(GapscoutError::invalid(
            "thresholds",
            "low_float_threshold",
            "low_float_threshold must be positive",
        ));
    }
    Ok(())
}

fn validate_breakout(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    let proximity = config.get_double("thresholds", "breakout_proximity", BREAKOUT_PROXIMITY);
    if proximity <= 0.0 || proximity > 1.0 {
        return Err(GapscoutError::invalid(
            "thresholds",
            "breakout_proximity",
            "breakout_proximity must be in (0, 1]",
        ));
    }
    if config.get_int("thresholds", "breakout_lookback_days", 20) < 1 {
        return Err(GapscoutError::invalid(
            "thresholds",
            "breakout_lookback_days",
            "breakout_lookback_days must be at least 1",
        ));
    }
    Ok(())
}

/// Score deltas stay within +/-`MAX_WEIGHT`; share levels are non-negative.
fn validate_weights(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    for &key in WEIGHT_KEYS {
        if !(-MAX_WEIGHT..=MAX_WEIGHT).contains(&config.get_int("weights", key, 0)) {
            return Err(GapscoutError::invalid(
                "weights",
                key,
                format!("{key} must be between -{MAX_WEIGHT} and {MAX_WEIGHT}"),
            ));
        }
    }
    for key in ["volume_active_shares", "volume_heavy_shares"] {
        if config.get_int("weights", key, 0) < 0 {
            return Err(GapscoutError::invalid(
                "weights",
                key,
                format!("{key} must be non-negative"),
            ));
        }
    }
    Ok(())
}

fn validate_tiers(config: &dyn ConfigPort) -> Result<(), GapscoutError> {
    // Raw values, so nothing wraps before the comparison.
    let d = ScoreTiers::default();
    let watch = config.get_int("thresholds", "watch", d.watch as i64);
    let action = config.get_int("thresholds", "action", d.action as i64);
    let elite = config.get_int("thresholds", "elite", d.elite as i64);
    if !(0..=100).contains(&watch) {
        return Err(GapscoutError::invalid(
            "thresholds",
            "watch",
            "watch must be between 0 and 100",
        ));
    }
    if action < watch {
        return Err(GapscoutError::invalid(
            "thresholds",
            "action",
            "action must not be below watch",
        ));
    }
    if elite < action || elite > 100 {
        return Err(GapscoutError::invalid(
            "thresholds",
            "elite",
            "elite must be between action and 100",
        ));
    }
    Ok(())
}
