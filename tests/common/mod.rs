#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use gapscout::domain::error::ProviderError;
pub use gapscout::domain::ohlcv::OhlcvBar;
use gapscout::domain::series::HistoryRequest;
use gapscout::ports::market_data_port::{MarketDataPort, NewsItem, StaticInfo};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct MockMarketData {
    pub intraday: HashMap<String, Vec<OhlcvBar>>,
    pub daily: HashMap<String, Vec<OhlcvBar>>,
    pub info: HashMap<String, StaticInfo>,
    pub news: HashMap<String, Vec<NewsItem>>,
    pub errors: HashMap<String, ProviderError>,
    pub delays: HashMap<String, std::time::Duration>,
    pub news_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intraday(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.intraday.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_daily(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.daily.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_info(mut self, symbol: &str, info: StaticInfo) -> Self {
        self.info.insert(symbol.to_string(), info);
        self
    }

    pub fn with_headline(mut self, symbol: &str, title: &str) -> Self {
        self.news.entry(symbol.to_string()).or_default().push(NewsItem {
            title: title.to_string(),
            publisher: "Newswire".to_string(),
            link: format!("https://news.example.com/{}", symbol.to_lowercase()),
        });
        self
    }

    pub fn with_error(mut self, symbol: &str, error: ProviderError) -> Self {
        self.errors.insert(symbol.to_string(), error);
        self
    }

    pub fn with_delay(mut self, symbol: &str, delay: std::time::Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    pub fn news_calls(&self) -> usize {
        self.news_calls.load(Ordering::SeqCst)
    }

    /// Most provider calls observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn check(&self, symbol: &str) -> Result<(), ProviderError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(symbol) {
            std::thread::sleep(*delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.errors.get(symbol) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn not_found(symbol: &str) -> ProviderError {
    ProviderError::NotFound {
        symbol: symbol.to_string(),
    }
}

impl MarketDataPort for MockMarketData {
    fn fetch_history(
        &self,
        symbol: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<OhlcvBar>, ProviderError> {
        self.check(symbol)?;
        let source = if request.interval.is_intraday() {
            &self.intraday
        } else {
            &self.daily
        };
        source.get(symbol).cloned().ok_or_else(|| not_found(symbol))
    }

    fn fetch_static_info(&self, symbol: &str) -> Result<StaticInfo, ProviderError> {
        self.check(symbol)?;
        self.info.get(symbol).cloned().ok_or_else(|| not_found(symbol))
    }

    fn fetch_latest_news(&self, symbol: &str) -> Result<Vec<NewsItem>, ProviderError> {
        self.news_calls.fetch_add(1, Ordering::SeqCst);
        self.check(symbol)?;
        Ok(self.news.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

/// Instant of a New York wall-clock time.
pub fn ny(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    New_York
        .from_local_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc)
}

/// Bar with a 10 cent range around the close.
pub fn bar_at(timestamp: DateTime<Utc>, close: f64, volume: i64) -> OhlcvBar {
    OhlcvBar {
        timestamp,
        open: close,
        high: close + 0.05,
        low: close - 0.05,
        close,
        volume,
    }
}

/// Consecutive bars `minutes` apart starting at `start` local time.
pub fn bars_from(
    date: NaiveDate,
    start: (u32, u32),
    minutes: i64,
    closes: &[f64],
    volumes: &[i64],
) -> Vec<OhlcvBar> {
    let first = ny(date, start.0, start.1);
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&c, &v))| bar_at(first + Duration::minutes(minutes * i as i64), c, v))
        .collect()
}

/// A full regular session of 26 fifteen-minute bars from 09:30.
pub fn session(date: NaiveDate, closes: &[f64], volume: i64) -> Vec<OhlcvBar> {
    assert_eq!(closes.len(), 26, "a regular session has 26 bars");
    bars_from(date, (9, 30), 15, closes, &vec![volume; closes.len()])
}

/// Three quiet days at 9.00, a day that fades from 11.50 to 10.00, then two
/// pre-market bars at 10.20 and 10.40 on 2024-03-08.
///
/// Latest close 10.40 against a prior close of 10.00 is a +4% gap. RSI(14) is
/// about 21, EMA(9) about 10.33, VWAP about 9.07, ATR(14) about 0.193, and the
/// latest bar trades at 3x the trailing 20-bar volume.
pub fn abc_intraday() -> Vec<OhlcvBar> {
    let mut bars = Vec::new();
    for day in 4..=6 {
        bars.extend(session(date(3, day), &[9.0; 26], 200_000));
    }
    let mut fade = vec![11.5; 14];
    fade.extend((1..=10).map(|i| 11.5 - 0.15 * i as f64));
    fade.extend([10.0, 10.0]);
    bars.extend(session(date(3, 7), &fade, 20_000));
    bars.extend(bars_from(
        date(3, 8),
        (8, 0),
        15,
        &[10.2, 10.4],
        &[40_000, 63_000],
    ));
    bars
}

pub const ABC_ATR: f64 = 0.192_857_142_857_143;

/// Daily bars at local midnight, one per calendar day from `start`.
pub fn daily_bars(start: NaiveDate, ohlc: &[(f64, f64, f64, f64)]) -> Vec<OhlcvBar> {
    ohlc.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| OhlcvBar {
            timestamp: ny(start + Duration::days(i as i64), 0, 0),
            open,
            high,
            low,
            close,
            volume: 1_000_000,
        })
        .collect()
}

/// Three completed down days ending 2024-03-07.
pub fn falling_daily() -> Vec<OhlcvBar> {
    daily_bars(
        date(3, 5),
        &[
            (12.5, 13.0, 11.8, 12.0),
            (12.0, 12.2, 10.9, 11.0),
            (11.5, 11.6, 9.9, 10.0),
        ],
    )
}

/// Flat, quiet bars that score below every tier.
pub fn quiet_intraday() -> Vec<OhlcvBar> {
    let mut bars = session(date(3, 6), &[20.0; 26], 500);
    bars.extend(session(date(3, 7), &[20.0; 26], 500));
    bars
}
