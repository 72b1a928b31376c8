//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{CsvReportAdapter, SortOrder};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::throttled_provider::ThrottledProvider;
use crate::domain::config::ScanConfig;
use crate::domain::indicator::IndicatorType;
use crate::domain::scanner::{MarketScanner, ScanResult, ScanRow, SymbolSnapshot};
use crate::domain::sentiment;
use crate::domain::session::{local_date, market_phase};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "gapscout", about = "Pre-market gap scanner")]
pub struct Cli {
    /// Also append logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    #[default]
    Score,
    Gap,
}

impl From<SortKey> for SortOrder {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Score => SortOrder::Score,
            SortKey::Gap => SortOrder::Gap,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the configured universe
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = SortKey::Score)]
        sort: SortKey,
    },
    /// Show the latest bars and indicators for one symbol
    Inspect {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(long, default_value_t = 10)]
        bars: usize,
    },
    /// Validate a scan configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Tag a headline with keyword sentiment
    Tag { headline: String },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Scan {
            config,
            data_dir,
            output,
            sort,
        } => run_scan(&config, &data_dir, output.as_deref(), sort),
        Command::Inspect {
            config,
            data_dir,
            symbol,
            bars,
        } => run_inspect(&config, &data_dir, &symbol, bars),
        Command::Validate { config } => run_validate(&config),
        Command::Tag { headline } => run_tag(&headline),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_scan_config(path: &Path) -> Result<ScanConfig, ExitCode> {
    let adapter = load_config(path)?;
    ScanConfig::from_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

pub fn build_scanner(config: ScanConfig, data_dir: &Path) -> MarketScanner {
    let csv = CsvAdapter::new(data_dir.to_path_buf(), config.timezone);
    let provider = ThrottledProvider::new(csv, &config.throttle);
    MarketScanner::new(Arc::new(provider), config)
}

fn run_scan(config_path: &Path, data_dir: &Path, output: Option<&Path>, sort: SortKey) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_scan_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let phase = market_phase(Utc::now(), config.timezone);
    let universe = config.universe.clone();
    let scanner = build_scanner(config, data_dir);

    let result = match scanner.scan(&universe) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    println!("Market status: {}", phase.label());
    print_result(&result, sort);

    if let Some(path) = output {
        let report = CsvReportAdapter::new(sort.into());
        if let Err(e) = report.write(&result, &path.to_string_lossy()) {
            eprintln!("error: failed to write report: {e}");
            return (&e).into();
        }
        eprintln!("\nReport written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn print_result(result: &ScanResult, sort: SortKey) {
    let rows = match sort {
        SortKey::Score => result.sorted_by_score(),
        SortKey::Gap => result.sorted_by_gap(),
    };
    let (gappers, watchlist): (Vec<&ScanRow>, Vec<&ScanRow>) =
        rows.into_iter().partition(|r| r.gap_bias.is_gapper());

    println!("\n=== Action Now (gappers) ===");
    print_rows(&gappers);
    println!("\n=== Watchlist ===");
    print_rows(&watchlist);

    println!(
        "\n{} rows, {} ignored, {} skipped",
        result.rows.len(),
        result.ignored,
        result.skipped_count()
    );
    for skipped in &result.skipped {
        println!("  skipped {}: {}", skipped.symbol, skipped.reason);
    }
}

fn print_rows(rows: &[&ScanRow]) {
    if rows.is_empty() {
        println!("  (none)");
        return;
    }
    println!(
        "  {:<8} {:>9} {:>8} {:<16} {:>5} {:<7} {:<18} {:>9} {:>9} {:>6}",
        "TICKER", "PRICE", "GAP%", "BIAS", "SCORE", "TIER", "ACTION", "STOP", "TARGET", "RVOL"
    );
    for row in rows {
        let rvol = row
            .volume_ratio
            .map(|r| format!("{r:.1}x"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<8} {:>9.2} {:>+7.2}% {:<16} {:>5} {:<7} {:<18} {:>9.2} {:>9.2} {:>6}",
            row.ticker,
            row.price,
            row.gap_pct,
            row.gap_bias.label(),
            row.score,
            row.tier.label(),
            row.action.label(),
            row.stop,
            row.target,
            rvol,
        );
        let basis = if row.atr_sized { "ATR stop" } else { "fixed % stop" };
        println!("           {} ({})", row.instruction, basis);
        if !row.reasons.is_empty() {
            println!("           {}", row.reasons.join(", "));
        }
        if !row.patterns.is_empty() {
            println!("           patterns: {}", row.patterns.join(", "));
        }
        if let Some(headline) = &row.headline {
            println!("           news ({}): {}", row.sentiment.label, headline);
        }
    }
}

fn run_inspect(config_path: &Path, data_dir: &Path, symbol: &str, bars: usize) -> ExitCode {
    let config = match load_scan_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let scanner = build_scanner(config, data_dir);
    let symbol = symbol.trim().to_uppercase();

    match scanner.inspect(&symbol) {
        Ok(snapshot) => {
            print_snapshot(&scanner, &snapshot, bars);
            ExitCode::SUCCESS
        }
        Err(reason) => {
            eprintln!("error: {symbol} skipped: {reason}");
            ExitCode::from(5)
        }
    }
}

fn print_snapshot(scanner: &MarketScanner, snap: &SymbolSnapshot, count: usize) {
    let tz = scanner.config().timezone;
    let gap = &snap.gap;
    println!(
        "{} ({}, {} bars)",
        snap.series.symbol(),
        snap.series.interval(),
        snap.series.len()
    );
    println!(
        "Gap: {:+.2}% ({:.2} on {} vs close {:.2} on {})",
        gap.gap_pct, gap.current_price, gap.current_date, gap.reference_close, gap.reference_date
    );
    match &snap.context {
        Some(ctx) => println!(
            "Context: oversold={} uptrend={} prior high {:.2}, period high {:.2} ({} days)",
            ctx.is_oversold, ctx.is_uptrend, ctx.reference_high, ctx.period_high, ctx.completed_days
        ),
        None => println!("Context: unavailable"),
    }
    if let Some(float) = snap.static_info.float_shares {
        println!("Float: {:.1}M shares", float as f64 / 1_000_000.0);
    }

    let columns = scanner.indicator_set();
    let numeric: Vec<IndicatorType> = columns
        .iter()
        .copied()
        .filter(|t| !matches!(t, IndicatorType::Hammer | IndicatorType::BullishEngulfing))
        .collect();

    print!("\n{:<6} {:<6} {:>9} {:>10}", "DATE", "TIME", "CLOSE", "VOLUME");
    for t in &numeric {
        print!(" {:>9}", t.to_string());
    }
    println!();

    let all = snap.series.bars();
    let start = all.len().saturating_sub(count);
    for (i, bar) in all.iter().enumerate().skip(start) {
        let local = bar.timestamp.with_timezone(&tz);
        print!(
            "{:<6} {:<6} {:>9.2} {:>10}",
            local_date(bar.timestamp, tz).format("%m-%d"),
            local.format("%H:%M"),
            bar.close,
            bar.volume
        );
        for t in &numeric {
            let value = snap
                .indicators
                .get(t)
                .and_then(|s| s.value_at(i))
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string());
            print!(" {:>9}", value);
        }
        println!();
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_scan_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    eprintln!("  Tickers:   {}", config.universe.tickers().join(", "));
    eprintln!("  Timezone:  {}", config.timezone);
    eprintln!(
        "  Intraday:  {} over {} days (extended hours: {})",
        config.intraday.interval, config.intraday.period_days, config.intraday.include_extended_hours
    );
    eprintln!(
        "  Risk:      k={} min target x{} stop {}xATR",
        config.risk.risk_k, config.risk.min_target_multiple, config.risk.stop_atr_multiple
    );
    eprintln!(
        "  Tiers:     watch {} / action {} / elite {}",
        config.tiers.watch, config.tiers.action, config.tiers.elite
    );
    eprintln!("\nScan configuration is valid.");
    ExitCode::SUCCESS
}

fn run_tag(headline: &str) -> ExitCode {
    let tagged = sentiment::tag(headline);
    match tagged.keyword {
        Some(keyword) => println!("{} {:+} ({})", tagged.label, tagged.score, keyword),
        None => println!("{} {:+}", tagged.label, tagged.score),
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scan_command() {
        let cli = Cli::try_parse_from([
            "gapscout", "scan", "-c", "scan.ini", "-d", "data", "--sort", "gap",
        ])
        .unwrap();
        match cli.command {
            Command::Scan { sort, output, .. } => {
                assert_eq!(sort, SortKey::Gap);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn log_file_is_global() {
        let cli = Cli::try_parse_from([
            "gapscout", "validate", "--config", "scan.ini", "--log-file", "scan.log",
        ])
        .unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("scan.log")));
    }

    #[test]
    fn inspect_defaults_to_ten_bars() {
        let cli = Cli::try_parse_from([
            "gapscout", "inspect", "-c", "a.ini", "-d", "data", "-s", "abc",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Inspect { bars: 10, .. }));
    }

    #[test]
    fn missing_config_file_exits_with_config_code() {
        let code = run_validate(Path::new("/nonexistent/gapscout.ini"));
        assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::from(2)));
    }
}
