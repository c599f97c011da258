pub mod earnings;
pub mod polygon;
pub mod universe;

#[cfg(test)]
pub mod fake;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::config::{HTTP_TIMEOUT_SECS, PREVIOUS_CLOSE_WINDOW_DAYS, USER_AGENT};
use crate::error::Result;
use crate::session::{previous_trading_day, regular_session_bounds};
use crate::types::{AnnouncementEvent, Bar, DailyBar};

pub use earnings::YahooEarningsFetcher;
pub use polygon::PolygonClient;
pub use universe::MarketCapUniverse;

/// Source of the ticker universe, ranked by market cap.
#[async_trait]
pub trait UniverseProvider: Send + Sync {
    async fn fetch(&self, top_n: usize) -> Result<Vec<String>>;
}

/// Source of historical earnings announcements for one ticker.
#[async_trait]
pub trait EarningsProvider: Send + Sync {
    async fn fetch(&self, ticker: &str) -> Result<Vec<AnnouncementEvent>>;
}

/// Source of OHLCV bars. An empty series means "no data", not an error.
#[async_trait]
pub trait BarProvider: Send + Sync {
    /// 5-minute bars in `[start, end]`, time-ascending.
    async fn intraday_bars(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>>;

    /// Daily bars whose exchange date lies in `[start_day, end_day]`, date-ascending.
    async fn daily_bars(
        &self,
        ticker: &str,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> Result<Vec<DailyBar>>;

    /// Intraday bars covering the regular session of `day`.
    async fn regular_session_bars(&self, ticker: &str, day: NaiveDate) -> Result<Vec<Bar>> {
        let (start, end) = regular_session_bounds(day)?;
        self.intraday_bars(ticker, start, end).await
    }

    /// Close of the most recent daily bar strictly before `session_day`,
    /// searched in a short window ending on the previous weekday.
    async fn previous_close(&self, ticker: &str, session_day: NaiveDate) -> Result<Option<f64>> {
        let prev_day = previous_trading_day(session_day);
        let start = prev_day - chrono::Duration::days(PREVIOUS_CLOSE_WINDOW_DAYS);
        let bars = self.daily_bars(ticker, start, prev_day).await?;
        Ok(select_previous_close(&bars, session_day))
    }
}

/// Latest bar dated before `session_day`. Bars on or after it are ignored so a
/// provider gap can never hand back the session's own close.
pub fn select_previous_close(bars: &[DailyBar], session_day: NaiveDate) -> Option<f64> {
    bars.iter()
        .filter(|b| b.date < session_day)
        .max_by_key(|b| b.date)
        .map(|b| b.close)
}

/// Shared HTTP client: fixed timeout, browser user agent, no retries.
pub fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?)
}
