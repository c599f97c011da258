use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::config::{Config, DAYS_PER_YEAR};
use crate::error::{AppError, Result};
use crate::fetcher::{http_client, EarningsProvider};
use crate::session::parse_announcement_timestamp;
use crate::types::AnnouncementEvent;

/// The calendar page embeds its state as `root.App.main = {...};\n}(this));`.
const APP_MAIN_MARKER: &str = "root.App.main = ";
const APP_MAIN_END: &str = ";\n}(this)";
const ROWS_POINTER: &str = "/context/dispatcher/stores/ScreenerResultsStore/results/rows";

/// Historical earnings dates scraped from the Yahoo earnings calendar.
pub struct YahooEarningsFetcher {
    client: reqwest::Client,
    base_url: String,
    lookback_years: u32,
}

impl YahooEarningsFetcher {
    pub fn new(cfg: &Config, lookback_years: u32) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: cfg.earnings_api_url.trim_end_matches('/').to_string(),
            lookback_years,
        })
    }
}

#[async_trait]
impl EarningsProvider for YahooEarningsFetcher {
    async fn fetch(&self, ticker: &str) -> Result<Vec<AnnouncementEvent>> {
        info!("Fetching earnings history for {ticker}");
        let url = format!("{}/calendar/earnings", self.base_url);
        let page = self
            .client
            .get(&url)
            .query(&[("symbol", ticker)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let raw = parse_earnings_page(&page, ticker)?;
        if raw.is_empty() {
            warn!("No earnings history found for {ticker}");
            return Ok(raw);
        }

        let events = within_lookback(raw, Utc::now(), self.lookback_years);
        debug!("Fetched {} earnings events for {ticker}", events.len());
        Ok(events)
    }
}

/// Extract every earnings row from a calendar page. Rows keep their raw
/// timing flag; validation happens downstream.
pub fn parse_earnings_page(page: &str, ticker: &str) -> Result<Vec<AnnouncementEvent>> {
    let start = page
        .find(APP_MAIN_MARKER)
        .map(|i| i + APP_MAIN_MARKER.len())
        .ok_or_else(|| AppError::Parse(format!("earnings page for {ticker} has no embedded state")))?;
    let rest = &page[start..];
    let end = rest
        .find(APP_MAIN_END)
        .ok_or_else(|| AppError::Parse(format!("earnings page for {ticker} has unterminated state")))?;

    let root: serde_json::Value = serde_json::from_str(&rest[..end])?;
    let rows = match root.pointer(ROWS_POINTER).and_then(|r| r.as_array()) {
        Some(rows) => rows,
        None => return Ok(Vec::new()),
    };

    Ok(rows.iter().map(|row| parse_row(row, ticker)).collect())
}

fn parse_row(row: &serde_json::Value, ticker: &str) -> AnnouncementEvent {
    let announced_at = row
        .get("startdatetime")
        .and_then(|v| v.as_str())
        .and_then(parse_announcement_timestamp);

    let release_flag = row
        .get("startdatetimetype")
        .or_else(|| row.get("time"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let period = row
        .get("period")
        .or_else(|| row.get("quarter"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    AnnouncementEvent {
        ticker: ticker.to_string(),
        announced_at,
        period,
        eps: number(row, "epsactual"),
        eps_estimate: number(row, "epsestimate"),
        surprise_pct: number(row, "epssurprisepct"),
        release_flag,
    }
}

/// Numeric field that may arrive as a JSON number or a numeric string.
fn number(row: &serde_json::Value, key: &str) -> Option<f64> {
    row.get(key)
        .and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
}

/// Drop undated rows and anything older than `years` before `now`; sort ascending.
/// A lookback reaching past the earliest representable instant keeps every dated row.
pub fn within_lookback(
    events: Vec<AnnouncementEvent>,
    now: DateTime<Utc>,
    years: u32,
) -> Vec<AnnouncementEvent> {
    let cutoff = TimeDelta::try_days(DAYS_PER_YEAR * i64::from(years))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut kept: Vec<AnnouncementEvent> = events
        .into_iter()
        .filter(|e| e.announced_at.is_some_and(|ts| ts >= cutoff))
        .collect();
    kept.sort_by_key(|e| e.announced_at);
    kept
}
