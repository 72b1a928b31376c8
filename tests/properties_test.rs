mod common;

use chrono_tz::America::New_York;
use common::*;
use gapscout::domain::error::IndicatorError;
use gapscout::domain::gap::session_gap;
use gapscout::domain::indicator::rsi::calculate_rsi;
use gapscout::domain::indicator::{IndicatorType, compute_indicators};
use gapscout::domain::risk::{Aggressiveness, RiskProfile, compute_levels};
use gapscout::domain::scoring::{MAX_SCORE, MIN_SCORE, ScoringRules, Snapshot, score};
use gapscout::domain::series::{Interval, Series};
use proptest::prelude::*;

fn closes_to_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    let volumes = vec![1_000; closes.len()];
    bars_from(date(3, 4), (9, 30), 15, closes, &volumes)
}

/// Merges consecutive pairs into one bar carrying the second bar's close.
fn aggregate_pairs(bars: &[OhlcvBar]) -> Vec<OhlcvBar> {
    bars.chunks(2)
        .map(|pair| {
            let first = &pair[0];
            let last = &pair[pair.len() - 1];
            OhlcvBar {
                timestamp: first.timestamp,
                open: first.open,
                high: pair.iter().map(|b| b.high).fold(f64::MIN, f64::max),
                low: pair.iter().map(|b| b.low).fold(f64::MAX, f64::min),
                close: last.close,
                volume: pair.iter().map(|b| b.volume).sum(),
            }
        })
        .collect()
}

fn aggressiveness() -> impl Strategy<Value = Aggressiveness> {
    prop_oneof![
        Just(Aggressiveness::Conservative),
        Just(Aggressiveness::Balanced),
        Just(Aggressiveness::Aggressive),
        Just(Aggressiveness::Moonshot),
    ]
}

proptest! {
    #[test]
    fn rsi_stays_in_range(closes in prop::collection::vec(1.0f64..500.0, 16..80)) {
        let rsi = calculate_rsi(&closes_to_bars(&closes), 14);
        for i in 0..closes.len() {
            if let Some(v) = rsi.value_at(i) {
                prop_assert!((0.0..=100.0).contains(&v), "rsi {} at {}", v, i);
            }
        }
    }

    #[test]
    fn rsi_is_100_without_losses(
        start in 1.0f64..100.0,
        steps in prop::collection::vec(0.0f64..2.0, 15..40),
    ) {
        let closes: Vec<f64> = steps
            .iter()
            .scan(start, |price, step| {
                *price += step;
                Some(*price)
            })
            .collect();
        let rsi = calculate_rsi(&closes_to_bars(&closes), 14);
        prop_assert_eq!(rsi.latest_value(), Some(100.0));
    }

    #[test]
    fn score_is_clamped(
        price in 0.5f64..500.0,
        gap_pct in -60.0f64..60.0,
        latest_volume in 0i64..5_000_000,
        vwap in prop::option::of(0.5f64..500.0),
        ema in 0.5f64..500.0,
        rsi in 0.0f64..=100.0,
        sentiment in -40i32..=40,
        breakout in any::<bool>(),
        float_shares in prop::option::of(0u64..100_000_000),
    ) {
        let snapshot = Snapshot {
            price,
            gap_pct,
            latest_volume,
            vwap,
            ema,
            rsi,
            sentiment,
            context: None,
            breakout,
            float_shares,
        };
        let result = score(&snapshot, &ScoringRules::default());
        prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&result.score));
    }

    #[test]
    fn risk_levels_bracket_price(
        price in 0.01f64..10_000.0,
        atr in prop::option::of(0.0f64..5_000.0),
        preset in aggressiveness(),
    ) {
        let levels = compute_levels(price, atr, &RiskProfile::from_preset(preset)).unwrap();
        prop_assert!(levels.stop_loss > 0.0);
        prop_assert!(levels.stop_loss < price);
        prop_assert!(levels.take_profit > price);
        prop_assert!(levels.take_profit >= price * preset.multipliers().1 - 1e-9);
    }

    #[test]
    fn gap_ignores_sampling_interval(
        prior in prop::collection::vec(5.0f64..50.0, 26),
        current in prop::collection::vec(5.0f64..50.0, 1..13usize),
    ) {
        // Current day holds whole 30-minute pairs from the open.
        let current: Vec<f64> = current.iter().flat_map(|c| [*c + 0.01, *c]).collect();
        let mut fifteen = session(date(3, 4), &prior, 1_000);
        fifteen.extend(bars_from(date(3, 5), (9, 30), 15, &current, &vec![1_000; current.len()]));
        let thirty = aggregate_pairs(&fifteen);

        let a = session_gap(&fifteen, New_York).unwrap();
        let b = session_gap(&thirty, New_York).unwrap();
        prop_assert_eq!(a.reference_date, b.reference_date);
        prop_assert_eq!(a.current_date, b.current_date);
        prop_assert!((a.gap_pct - b.gap_pct).abs() < 1e-9);
    }

    #[test]
    fn short_series_rejects_indicators(len in 0usize..15) {
        let closes = vec![10.0; len];
        let series = Series::new("ABC", Interval::FifteenMinutes, closes_to_bars(&closes)).unwrap();
        let result = compute_indicators(&series, &[IndicatorType::Ema(9), IndicatorType::Rsi(14)]);
        prop_assert_eq!(
            result.unwrap_err(),
            IndicatorError::InsufficientData { required: 15, bars: len }
        );
    }
}
