//! Market data provider port.
//!
//! Every call may fail for a single symbol. The scanner treats all failures
//! as soft skips, so implementations should return a [`ProviderError`] rather
//! than panic on bad responses.

use crate::domain::error::ProviderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::HistoryRequest;

/// Slow-moving per-symbol facts. Every field is optional because providers
/// routinely omit them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticInfo {
    pub float_shares: Option<u64>,
    pub short_percent_of_float: Option<f64>,
    pub average_volume_10d: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub publisher: String,
    pub link: String,
}

pub trait MarketDataPort {
    /// Bars for `symbol`, oldest first.
    fn fetch_history(
        &self,
        symbol: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<OhlcvBar>, ProviderError>;

    fn fetch_static_info(&self, symbol: &str) -> Result<StaticInfo, ProviderError>;

    /// Latest headlines, newest first.
    fn fetch_latest_news(&self, symbol: &str) -> Result<Vec<NewsItem>, ProviderError>;
}
