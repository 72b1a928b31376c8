//! CSV file market data adapter.
//!
//! Layout of the data directory:
//! - `{SYMBOL}_{interval}.csv` with `timestamp,open,high,low,close,volume`.
//!   Timestamps are RFC 3339; daily files may use plain `YYYY-MM-DD` dates,
//!   read as midnight in the exchange time zone.
//! - `info.csv` with `symbol,float_shares,short_percent_of_float,average_volume_10d`.
//! - `news.csv` with `symbol,title,publisher,link`, newest first per symbol.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::domain::error::ProviderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::HistoryRequest;
use crate::domain::session::{is_regular_hours, local_date};
use crate::ports::market_data_port::{MarketDataPort, NewsItem, StaticInfo};

pub const INFO_FILE: &str = "info.csv";
pub const NEWS_FILE: &str = "news.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
    timezone: Tz,
}

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

#[derive(Debug, Deserialize)]
struct InfoRecord {
    symbol: String,
    float_shares: Option<u64>,
    short_percent_of_float: Option<f64>,
    average_volume_10d: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct NewsRecord {
    symbol: String,
    title: String,
    publisher: String,
    link: String,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf, timezone: Tz) -> Self {
        Self {
            base_path,
            timezone,
        }
    }

    fn history_path(&self, symbol: &str, request: &HistoryRequest) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol, request.interval))
    }

    fn parse_timestamp(&self, raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw.trim()) {
            return Some(ts.with_timezone(&Utc));
        }
        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
        self.timezone
            .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
            .earliest()
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Keeps bars from the last `period_days` distinct local dates.
    fn trim_to_period(&self, bars: Vec<OhlcvBar>, period_days: u32) -> Vec<OhlcvBar> {
        let dates: BTreeSet<NaiveDate> = bars
            .iter()
            .map(|b| local_date(b.timestamp, self.timezone))
            .collect();
        let Some(&cutoff) = dates.iter().rev().nth(period_days.max(1) as usize - 1) else {
            return bars;
        };
        bars.into_iter()
            .filter(|b| local_date(b.timestamp, self.timezone) >= cutoff)
            .collect()
    }
}

fn read_error(symbol: &str, path: &Path, err: io::Error) -> ProviderError {
    match err.kind() {
        io::ErrorKind::NotFound => ProviderError::NotFound {
            symbol: symbol.to_string(),
        },
        _ => ProviderError::Network {
            reason: format!("failed to read {}: {}", path.display(), err),
        },
    }
}

fn malformed(symbol: &str, reason: impl std::fmt::Display) -> ProviderError {
    ProviderError::Malformed {
        symbol: symbol.to_string(),
        reason: reason.to_string(),
    }
}

impl MarketDataPort for CsvAdapter {
    fn fetch_history(
        &self,
        symbol: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<OhlcvBar>, ProviderError> {
        let path = self.history_path(symbol, request);
        let content = fs::read_to_string(&path).map_err(|e| read_error(symbol, &path, e))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.deserialize::<BarRecord>() {
            let record = result.map_err(|e| malformed(symbol, format!("CSV parse error: {}", e)))?;
            let timestamp = self.parse_timestamp(&record.timestamp).ok_or_else(|| {
                malformed(symbol, format!("invalid timestamp '{}'", record.timestamp))
            })?;

            if request.interval.is_intraday()
                && !request.include_extended_hours
                && !is_regular_hours(timestamp, self.timezone)
            {
                continue;
            }

            bars.push(OhlcvBar {
                timestamp,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(self.trim_to_period(bars, request.period_days))
    }

    fn fetch_static_info(&self, symbol: &str) -> Result<StaticInfo, ProviderError> {
        let path = self.base_path.join(INFO_FILE);
        let content = fs::read_to_string(&path).map_err(|e| read_error(symbol, &path, e))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        for result in rdr.deserialize::<InfoRecord>() {
            let record = result.map_err(|e| malformed(symbol, format!("CSV parse error: {}", e)))?;
            if record.symbol.eq_ignore_ascii_case(symbol) {
                return Ok(StaticInfo {
                    float_shares: record.float_shares,
                    short_percent_of_float: record.short_percent_of_float,
                    average_volume_10d: record.average_volume_10d,
                });
            }
        }

        Err(ProviderError::NotFound {
            symbol: symbol.to_string(),
        })
    }

    fn fetch_latest_news(&self, symbol: &str) -> Result<Vec<NewsItem>, ProviderError> {
        let path = self.base_path.join(NEWS_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_error(symbol, &path, e)),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut items = Vec::new();
        for result in rdr.deserialize::<NewsRecord>() {
            let record = result.map_err(|e| malformed(symbol, format!("CSV parse error: {}", e)))?;
            if record.symbol.eq_ignore_ascii_case(symbol) {
                items.push(NewsItem {
                    title: record.title,
                    publisher: record.publisher,
                    link: record.link,
                });
            }
        }
        Ok(items)
    }
}
