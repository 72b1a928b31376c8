//! CSV export of scan results.
//!
//! One row per scored symbol in presentation order, followed by nothing
//! else; skipped symbols go to the log, not the file.

use serde::Serialize;

use crate::domain::error::GapscoutError;
use crate::domain::scanner::{ScanResult, ScanRow};
use crate::ports::report_port::ReportPort;

/// Row ordering used when writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Score,
    Gap,
}

#[derive(Debug, Serialize)]
struct ScanRecord<'a> {
    ticker: &'a str,
    price: f64,
    gap_pct: f64,
    gap_bias: &'static str,
    score: i32,
    tier: &'static str,
    action: &'static str,
    instruction: &'a str,
    stop: f64,
    target: f64,
    volume_ratio: Option<f64>,
    patterns: String,
    sentiment: String,
    headline: Option<&'a str>,
    reasons: String,
    stop_basis: &'static str,
}

impl<'a> From<&'a ScanRow> for ScanRecord<'a> {
    fn from(row: &'a ScanRow) -> Self {
        Self {
            ticker: &row.ticker,
            price: round2(row.price),
            gap_pct: round2(row.gap_pct),
            gap_bias: row.gap_bias.label(),
            score: row.score,
            tier: row.tier.label(),
            action: row.action.label(),
            instruction: &row.instruction,
            stop: round2(row.stop),
            target: round2(row.target),
            volume_ratio: row.volume_ratio.map(round2),
            patterns: row.patterns.join(";"),
            sentiment: row.sentiment.label.to_string(),
            headline: row.headline.as_deref(),
            reasons: row.reasons.join("; "),
            stop_basis: if row.atr_sized { "atr" } else { "fixed" },
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter {
    order: SortOrder,
}

impl CsvReportAdapter {
    pub fn new(order: SortOrder) -> Self {
        Self { order }
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &ScanResult, output_path: &str) -> Result<(), GapscoutError> {
        let rows = match self.order {
            SortOrder::Score => result.sorted_by_score(),
            SortOrder::Gap => result.sorted_by_gap(),
        };

        let mut writer = csv::Writer::from_path(output_path)?;
        for row in rows {
            writer.serialize(ScanRecord::from(row))?;
        }
        writer.flush()?;
        Ok(())
    }
}
