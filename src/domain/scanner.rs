//! MarketScanner: runs the per-symbol pipeline across a universe.
//!
//! Each ticker is fetched, analyzed, scored, classified and sized in
//! isolation. Failures for one ticker become a [`SkipReason`] and never stop
//! the others. Work fans out on a dedicated rayon pool of `max_in_flight`
//! threads. Provider calls additionally hold an in-flight permit until they
//! return, so calls abandoned after a timeout still count against the limit.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::classifier::{Action, SignalFlags, Tier, classify};
use crate::domain::config::ScanConfig;
use crate::domain::context::{MarketContext, analyze_context};
use crate::domain::error::{GapscoutError, IndicatorError, ProviderError, SkipReason};
use crate::domain::gap::{GapBias, GapReading, session_gap};
use crate::domain::indicator::breakout::is_breakout;
use crate::domain::indicator::{IndicatorSet, IndicatorType, compute_indicators, minimum_bars};
use crate::domain::risk::compute_levels;
use crate::domain::scoring::{Snapshot, score};
use crate::domain::sentiment::{self, Sentiment};
use crate::domain::series::{HistoryRequest, Series};
use crate::domain::universe::Universe;
use crate::ports::market_data_port::{MarketDataPort, StaticInfo};

pub const EMA_PERIOD: usize = 9;
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;

pub type SharedProvider = Arc<dyn MarketDataPort + Send + Sync>;

/// One symbol that survived every filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRow {
    pub ticker: String,
    pub price: f64,
    pub gap_pct: f64,
    pub gap_bias: GapBias,
    pub score: i32,
    pub tier: Tier,
    pub action: Action,
    pub instruction: String,
    pub stop: f64,
    pub target: f64,
    /// Stop and target were sized from ATR rather than fixed percentages.
    pub atr_sized: bool,
    pub reasons: Vec<String>,
    pub headline: Option<String>,
    pub sentiment: Sentiment,
    pub patterns: Vec<String>,
    pub volume_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    /// Rows in universe order.
    pub rows: Vec<ScanRow>,
    pub skipped: Vec<SkippedSymbol>,
    /// Symbols that scored but classified as sleep.
    pub ignored: usize,
}

impl ScanResult {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn sorted_by_score(&self) -> Vec<&ScanRow> {
        let mut rows: Vec<&ScanRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        rows
    }

    /// Descending gap, largest gappers first.
    pub fn sorted_by_gap(&self) -> Vec<&ScanRow> {
        let mut rows: Vec<&ScanRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.gap_pct.total_cmp(&a.gap_pct));
        rows
    }

    pub fn gappers(&self) -> impl Iterator<Item = &ScanRow> {
        self.rows.iter().filter(|r| r.gap_bias.is_gapper())
    }

    pub fn watchlist(&self) -> impl Iterator<Item = &ScanRow> {
        self.rows.iter().filter(|r| !r.gap_bias.is_gapper())
    }
}

/// Read-only view of one symbol's analysis.
#[derive(Debug, Clone)]
pub struct SymbolSnapshot {
    pub series: Series,
    pub indicators: IndicatorSet,
    pub gap: GapReading,
    pub context: Option<MarketContext>,
    pub static_info: StaticInfo,
}

/// Counting gate over provider calls that have not returned yet.
struct InFlightLimit {
    limit: usize,
    active: Mutex<usize>,
    released: Condvar,
}

impl InFlightLimit {
    fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            limit: limit.max(1),
            active: Mutex::new(0),
            released: Condvar::new(),
        })
    }

    /// Waits up to `timeout` for a free slot.
    fn acquire(self: &Arc<Self>, timeout: Duration) -> Option<InFlightPermit> {
        let deadline = Instant::now() + timeout;
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        while *active >= self.limit {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = self
                .released
                .wait_timeout(active, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            active = guard;
        }
        *active += 1;
        Some(InFlightPermit(Arc::clone(self)))
    }
}

struct InFlightPermit(Arc<InFlightLimit>);

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        let mut active = self.0.active.lock().unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
        self.0.released.notify_one();
    }
}

enum Outcome {
    Row(Box<ScanRow>),
    Ignored,
    Skipped(SkipReason),
}

pub struct MarketScanner {
    provider: SharedProvider,
    config: ScanConfig,
    in_flight: Arc<InFlightLimit>,
}

impl MarketScanner {
    pub fn new(provider: SharedProvider, config: ScanConfig) -> Self {
        let in_flight = InFlightLimit::new(config.max_in_flight);
        Self {
            provider,
            config,
            in_flight,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Indicators computed on the intraday series.
    pub fn indicator_set(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Ema(EMA_PERIOD),
            IndicatorType::Rsi(RSI_PERIOD),
            IndicatorType::Atr(ATR_PERIOD),
            IndicatorType::Vwap,
            IndicatorType::RelativeVolume(self.config.relative_volume_lookback),
            IndicatorType::Hammer,
            IndicatorType::BullishEngulfing,
        ]
    }

    pub fn scan(&self, universe: &Universe) -> Result<ScanResult, GapscoutError> {
        info!(
            tickers = universe.count(),
            workers = self.config.max_in_flight,
            "Starting scan"
        );
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.max_in_flight.max(1))
            .build()?;

        let outcomes: Vec<(String, Outcome)> = pool.install(|| {
            universe
                .tickers()
                .par_iter()
                .map(|ticker| (ticker.clone(), self.scan_symbol(ticker)))
                .collect()
        });

        let mut result = ScanResult::default();
        for (symbol, outcome) in outcomes {
            match outcome {
                Outcome::Row(row) => result.rows.push(*row),
                Outcome::Ignored => result.ignored += 1,
                Outcome::Skipped(reason) => {
                    warn!(symbol = %symbol, reason = %reason, "Skipping symbol");
                    result.skipped.push(SkippedSymbol { symbol, reason });
                }
            }
        }

        info!(
            rows = result.rows.len(),
            skipped = result.skipped_count(),
            ignored = result.ignored,
            "Scan complete"
        );
        Ok(result)
    }

    /// Runs the analysis half of the pipeline for one symbol.
    pub fn inspect(&self, symbol: &str) -> Result<SymbolSnapshot, SkipReason> {
        self.analyze(symbol)
    }

    fn scan_symbol(&self, symbol: &str) -> Outcome {
        let outcome = self
            .analyze(symbol)
            .and_then(|snapshot| self.evaluate(symbol, &snapshot));
        match outcome {
            Ok(Some(row)) => Outcome::Row(Box::new(row)),
            Ok(None) => Outcome::Ignored,
            Err(reason) => Outcome::Skipped(reason),
        }
    }

    fn analyze(&self, symbol: &str) -> Result<SymbolSnapshot, SkipReason> {
        let indicators = self.indicator_set();
        let minimum = minimum_bars(&indicators);
        let tz = self.config.timezone;

        let request = self.config.intraday;
        let bars = self.fetch(symbol, move |p, s| p.fetch_history(s, &request))?;
        debug!(symbol, bars = bars.len(), interval = %request.interval, "Fetched intraday series");
        if bars.len() < minimum {
            return Err(SkipReason::DataUnavailable {
                bars: bars.len(),
                minimum,
            });
        }

        let series = Series::new(symbol, request.interval, bars).map_err(|e| {
            SkipReason::Provider(ProviderError::Malformed {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            })
        })?;

        let indicator_set = compute_indicators(&series, &indicators).map_err(
            |IndicatorError::InsufficientData { required, bars }| SkipReason::DataUnavailable {
                bars,
                minimum: required,
            },
        )?;

        let gap = session_gap(series.bars(), tz).ok_or(SkipReason::NoPriorSession)?;

        let daily_request = HistoryRequest::daily(self.config.daily_period_days);
        let context = match self.fetch(symbol, move |p, s| p.fetch_history(s, &daily_request)) {
            Ok(daily) => analyze_context(
                &daily,
                gap.current_date,
                tz,
                self.config.breakout_lookback_days,
            ),
            Err(error) => {
                warn!(symbol, %error, "Daily history unavailable, scoring without context");
                None
            }
        };

        let static_info = match self.fetch(symbol, |p, s| p.fetch_static_info(s)) {
            Ok(info) => info,
            Err(error) => {
                warn!(symbol, %error, "Static info unavailable");
                StaticInfo::default()
            }
        };

        Ok(SymbolSnapshot {
            series,
            indicators: indicator_set,
            gap,
            context,
            static_info,
        })
    }

    fn evaluate(&self, symbol: &str, snap: &SymbolSnapshot) -> Result<Option<ScanRow>, SkipReason> {
        let bars = snap.series.len();
        let latest_required = |indicator: IndicatorType| {
            snap.indicators
                .latest(&indicator)
                .ok_or_else(|| SkipReason::InsufficientWindow {
                    indicator: indicator.to_string(),
                    bars,
                    required: indicator.required_bars(),
                })
        };
        let ema = latest_required(IndicatorType::Ema(EMA_PERIOD))?;
        let rsi = latest_required(IndicatorType::Rsi(RSI_PERIOD))?;
        let vwap = snap.indicators.latest(&IndicatorType::Vwap);
        let atr = snap.indicators.latest(&IndicatorType::Atr(ATR_PERIOD));

        let price = snap.gap.current_price;
        let latest_volume = snap.series.latest().map(|b| b.volume).unwrap_or(0);
        let breakout = snap
            .context
            .as_ref()
            .is_some_and(|ctx| is_breakout(price, ctx.period_high, self.config.breakout_proximity));

        let mut inputs = Snapshot {
            price,
            gap_pct: snap.gap.gap_pct,
            latest_volume,
            vwap,
            ema,
            rsi,
            sentiment: 0,
            context: snap.context.clone(),
            breakout,
            float_shares: snap.static_info.float_shares,
        };

        let preliminary = score(&inputs, &self.config.rules);
        let (headline, tagged) = if preliminary.score >= self.config.news_score_threshold {
            self.latest_headline(symbol)
        } else {
            (None, Sentiment::neutral())
        };
        inputs.sentiment = tagged.score;
        let result = score(&inputs, &self.config.rules);

        let flags = SignalFlags {
            is_oversold: snap.context.as_ref().is_some_and(|c| c.is_oversold),
            breakout,
        };
        let action = classify(result.score, inputs.gap_pct, flags, &self.config.tiers);
        if action == Action::Sleep {
            debug!(symbol, score = result.score, "Classified as sleep");
            return Ok(None);
        }

        let levels = compute_levels(price, atr, &self.config.risk)?;

        let mut patterns = Vec::new();
        if snap.indicators.latest_flag(&IndicatorType::Hammer) == Some(true) {
            patterns.push("hammer".to_string());
        }
        if snap.indicators.latest_flag(&IndicatorType::BullishEngulfing) == Some(true) {
            patterns.push("bullish-engulfing".to_string());
        }

        Ok(Some(ScanRow {
            ticker: symbol.to_string(),
            price,
            gap_pct: inputs.gap_pct,
            gap_bias: GapBias::from_gap(inputs.gap_pct),
            score: result.score,
            tier: Tier::from_score(result.score, &self.config.tiers),
            action,
            instruction: action.instruction().to_string(),
            stop: levels.stop_loss,
            target: levels.take_profit,
            atr_sized: levels.atr_based,
            reasons: result.reasons,
            headline,
            sentiment: tagged,
            patterns,
            volume_ratio: snap.indicators.latest(&IndicatorType::RelativeVolume(
                self.config.relative_volume_lookback,
            )),
        }))
    }

    /// Tags the first headline. A news failure only costs the sentiment.
    fn latest_headline(&self, symbol: &str) -> (Option<String>, Sentiment) {
        match self.fetch(symbol, |p, s| p.fetch_latest_news(s)) {
            Ok(items) => match items.into_iter().next() {
                Some(item) => {
                    let tagged = sentiment::tag(&item.title);
                    (Some(item.title), tagged)
                }
                None => (None, Sentiment::neutral()),
            },
            Err(error) => {
                warn!(symbol, %error, "News unavailable");
                (None, Sentiment::neutral())
            }
        }
    }

    /// Runs a provider call on a helper thread and gives up after
    /// `fetch_timeout`, counting the wait for an in-flight slot. An abandoned
    /// call keeps its slot until it returns; its result is dropped.
    fn fetch<T, F>(&self, symbol: &str, call: F) -> Result<T, ProviderError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn MarketDataPort, &str) -> Result<T, ProviderError> + Send + 'static,
    {
        let started = Instant::now();
        let timeout = self.config.fetch_timeout;
        let timed_out = || ProviderError::Timeout {
            symbol: symbol.to_string(),
            millis: timeout.as_millis() as u64,
        };

        let Some(permit) = self.in_flight.acquire(timeout) else {
            debug!(symbol, "No in-flight slot before the fetch deadline");
            return Err(timed_out());
        };

        let provider = Arc::clone(&self.provider);
        let owned_symbol = symbol.to_string();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = call(provider.as_ref(), &owned_symbol);
            drop(permit);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout.saturating_sub(started.elapsed())) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(timed_out()),
            Err(RecvTimeoutError::Disconnected) => Err(ProviderError::Network {
                reason: format!("provider call for {symbol} ended without a response"),
            }),
        }
    }
}
