//! Exchange-local trading sessions.
//!
//! Bars carry UTC timestamps; anything that reasons about "yesterday" or
//! "today" must first convert them to the exchange's wall clock. All of that
//! happens here so the gap and context rules only ever see calendar days.

use std::ops::Range;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::domain::ohlcv::OhlcvBar;

/// One exchange-local calendar day worth of consecutive bars.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub date: NaiveDate,
    pub range: Range<usize>,
}

impl Session {
    pub fn last_index(&self) -> usize {
        self.range.end - 1
    }
}

pub fn local_date(timestamp: DateTime<Utc>, tz: Tz) -> NaiveDate {
    timestamp.with_timezone(&tz).date_naive()
}

pub fn local_time(timestamp: DateTime<Utc>, tz: Tz) -> NaiveTime {
    timestamp.with_timezone(&tz).time()
}

/// Splits time-ordered bars into runs that share the same local date.
pub fn partition_sessions(bars: &[OhlcvBar], tz: Tz) -> Vec<Session> {
    let mut sessions: Vec<Session> = Vec::new();

    for (i, bar) in bars.iter().enumerate() {
        let date = local_date(bar.timestamp, tz);
        match sessions.last_mut() {
            Some(session) if session.date == date => session.range.end = i + 1,
            _ => sessions.push(Session {
                date,
                range: i..i + 1,
            }),
        }
    }

    sessions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketPhase {
    PreMarket,
    Regular,
    AfterHours,
    Closed,
}

impl MarketPhase {
    pub fn label(&self) -> &'static str {
        match self {
            MarketPhase::PreMarket => "pre-market",
            MarketPhase::Regular => "market open",
            MarketPhase::AfterHours => "after hours",
            MarketPhase::Closed => "closed",
        }
    }
}

const PRE_MARKET_OPEN: (u32, u32) = (4, 0);
const REGULAR_OPEN: (u32, u32) = (9, 30);
const REGULAR_CLOSE: (u32, u32) = (16, 0);
const AFTER_HOURS_CLOSE: (u32, u32) = (20, 0);

fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn hm(pair: (u32, u32)) -> u32 {
    pair.0 * 60 + pair.1
}

/// Whether a bar's local wall-clock time lies inside regular trading hours.
pub fn is_regular_hours(timestamp: DateTime<Utc>, tz: Tz) -> bool {
    let m = minutes_of_day(local_time(timestamp, tz));
    m >= hm(REGULAR_OPEN) && m < hm(REGULAR_CLOSE)
}

/// Which part of the trading day `now` falls in. Holidays are not modelled.
pub fn market_phase(now: DateTime<Utc>, tz: Tz) -> MarketPhase {
    let local = now.with_timezone(&tz);
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return MarketPhase::Closed;
    }

    let m = minutes_of_day(local.time());
    if m < hm(PRE_MARKET_OPEN) {
        MarketPhase::Closed
    } else if m < hm(REGULAR_OPEN) {
        MarketPhase::PreMarket
    } else if m < hm(REGULAR_CLOSE) {
        MarketPhase::Regular
    } else if m < hm(AFTER_HOURS_CLOSE) {
        MarketPhase::AfterHours
    } else {
        MarketPhase::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn bar_at(ts: DateTime<Utc>) -> OhlcvBar {
        OhlcvBar {
            timestamp: ts,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1,
        }
    }

    #[test]
    fn partition_uses_exchange_local_date() {
        // 2024-03-05 03:00Z is still 2024-03-04 22:00 in New York.
        let bars = vec![
            bar_at(Utc.with_ymd_and_hms(2024, 3, 4, 20, 0, 0).unwrap()),
            bar_at(Utc.with_ymd_and_hms(2024, 3, 5, 3, 0, 0).unwrap()),
            bar_at(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap()),
        ];
        let sessions = partition_sessions(&bars, New_York);

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(sessions[0].range, 0..2);
        assert_eq!(sessions[1].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(sessions[1].last_index(), 2);
    }

    #[test]
    fn partition_empty() {
        assert!(partition_sessions(&[], New_York).is_empty());
    }

    #[test]
    fn regular_hours_boundaries() {
        // EST: 09:30 local = 14:30Z, 16:00 local = 21:00Z
        assert!(is_regular_hours(
            Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap(),
            New_York
        ));
        assert!(!is_regular_hours(
            Utc.with_ymd_and_hms(2024, 3, 4, 14, 15, 0).unwrap(),
            New_York
        ));
        assert!(!is_regular_hours(
            Utc.with_ymd_and_hms(2024, 3, 4, 21, 0, 0).unwrap(),
            New_York
        ));
    }

    #[test]
    fn market_phase_by_time_of_day() {
        let at = |h, m| New_York.with_ymd_and_hms(2024, 3, 5, h, m, 0).unwrap().with_timezone(&Utc);
        assert_eq!(market_phase(at(3, 0), New_York), MarketPhase::Closed);
        assert_eq!(market_phase(at(8, 15), New_York), MarketPhase::PreMarket);
        assert_eq!(market_phase(at(9, 30), New_York), MarketPhase::Regular);
        assert_eq!(market_phase(at(17, 0), New_York), MarketPhase::AfterHours);
        assert_eq!(market_phase(at(21, 0), New_York), MarketPhase::Closed);
    }

    #[test]
    fn market_phase_weekend_closed() {
        let saturday = New_York
            .with_ymd_and_hms(2024, 3, 9, 11, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(market_phase(saturday, New_York), MarketPhase::Closed);
    }
}
