//! In-memory providers for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::config::{scoring, Config};
use crate::error::{AppError, Result};
use crate::fetcher::{BarProvider, EarningsProvider, UniverseProvider};
use crate::session::regular_session_bounds;
use crate::types::{AnnouncementEvent, Bar, DailyBar};

#[derive(Default)]
pub struct FakeBars {
    intraday: HashMap<String, Vec<Bar>>,
    daily: HashMap<String, Vec<DailyBar>>,
    failing: HashSet<String>,
    /// Every `daily_bars` range requested, in call order.
    pub daily_requests: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl FakeBars {
    pub fn new() -> Self {
        Self::default()
    }

    /// One 5-minute bar opening the regular session of `day`.
    pub fn with_session(mut self, ticker: &str, day: NaiveDate, ohlc: (f64, f64, f64, f64)) -> Self {
        let (start, _) = regular_session_bounds(day).unwrap();
        let (open, high, low, close) = ohlc;
        self.intraday.entry(ticker.to_string()).or_default().push(Bar {
            timestamp: start,
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        });
        self
    }

    pub fn with_daily(mut self, ticker: &str, day: NaiveDate, open: f64, close: f64) -> Self {
        let bars = self.daily.entry(ticker.to_string()).or_default();
        bars.push(DailyBar {
            date: day,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 10_000.0,
        });
        bars.sort_by_key(|b| b.date);
        self
    }

    pub fn failing(mut self, ticker: &str) -> Self {
        self.failing.insert(ticker.to_string());
        self
    }

    fn check(&self, ticker: &str) -> Result<()> {
        if self.failing.contains(ticker) {
            return Err(AppError::Parse(format!("upstream unavailable for {ticker}")));
        }
        Ok(())
    }
}

#[async_trait]
impl BarProvider for FakeBars {
    async fn intraday_bars(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        self.check(ticker)?;
        Ok(self
            .intraday
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.timestamp >= start && b.timestamp <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn daily_bars(
        &self,
        ticker: &str,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> Result<Vec<DailyBar>> {
        self.check(ticker)?;
        self.daily_requests
            .lock()
            .unwrap()
            .push((ticker.to_string(), start_day, end_day));
        Ok(self
            .daily
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_day && b.date <= end_day)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeEarnings {
    events: HashMap<String, Vec<AnnouncementEvent>>,
}

impl FakeEarnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, ticker: &str, announced_at: DateTime<Utc>, flag: &str) -> Self {
        self.events
            .entry(ticker.to_string())
            .or_default()
            .push(announcement(ticker, Some(announced_at), Some(flag)));
        self
    }
}

#[async_trait]
impl EarningsProvider for FakeEarnings {
    async fn fetch(&self, ticker: &str) -> Result<Vec<AnnouncementEvent>> {
        Ok(self.events.get(ticker).cloned().unwrap_or_default())
    }
}

pub struct FakeUniverse(pub Vec<String>);

#[async_trait]
impl UniverseProvider for FakeUniverse {
    async fn fetch(&self, top_n: usize) -> Result<Vec<String>> {
        Ok(self.0.iter().take(top_n).cloned().collect())
    }
}

pub fn announcement(
    ticker: &str,
    announced_at: Option<DateTime<Utc>>,
    flag: Option<&str>,
) -> AnnouncementEvent {
    AnnouncementEvent {
        ticker: ticker.to_string(),
        announced_at,
        period: None,
        eps: Some(1.0),
        eps_estimate: Some(0.9),
        surprise_pct: Some(11.1),
        release_flag: flag.map(|f| f.to_string()),
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Instant at `hour:minute` exchange-local time on `day`.
pub fn et(day: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    chrono_tz::America::New_York
        .from_local_datetime(&day.and_hms_opt(hour, minute, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc)
}

/// Config with every provider URL pointed at `base_url`.
pub fn test_config(base_url: &str) -> Config {
    Config {
        polygon_api_key: "test-key".to_string(),
        polygon_api_url: base_url.to_string(),
        earnings_api_url: base_url.to_string(),
        universe_url: base_url.to_string(),
        log_level: "debug".to_string(),
        sample_non_earnings_days: scoring::DEFAULT_SAMPLE_DAYS,
        non_earnings_lookback_days: scoring::DEFAULT_LOOKBACK_DAYS,
    }
}
