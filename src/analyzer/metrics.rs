use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::error::Result;
use crate::fetcher::BarProvider;
use crate::types::{Bar, ReactionMetrics, ReleaseFlag};

/// OHLC summary of one regular session plus the returns derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionMetrics {
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub gap_ret: Option<f64>,
    pub oc_ret: Option<f64>,
    pub range_pct: Option<f64>,
}

/// Summarise a session's intraday bars. `None` when there are no bars.
///
/// Returns are left absent rather than zeroed when their denominator is zero
/// or the previous close is unknown.
pub fn session_metrics(bars: &[Bar], prev_close: Option<f64>) -> Option<SessionMetrics> {
    let first = bars.first()?;
    let last = bars.last()?;

    let open = first.open;
    let close = last.close;
    let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

    let gap_ret = prev_close.filter(|pc| *pc != 0.0).map(|pc| open / pc - 1.0);
    let (oc_ret, range_pct) = if open != 0.0 {
        (Some(close / open - 1.0), Some((high - low) / open))
    } else {
        (None, None)
    };

    Some(SessionMetrics {
        open,
        close,
        high,
        low,
        gap_ret,
        oc_ret,
        range_pct,
    })
}

/// Fetch the session's bars and previous close, then build the event's record.
/// `Ok(None)` means the session had no intraday data.
pub async fn compute_reaction<B: BarProvider + ?Sized>(
    bars: &B,
    ticker: &str,
    announced_at: DateTime<Utc>,
    session_day: NaiveDate,
    release_flag: ReleaseFlag,
) -> Result<Option<ReactionMetrics>> {
    let intraday = bars.regular_session_bars(ticker, session_day).await?;
    if intraday.is_empty() {
        warn!("No intraday data for {ticker} on {session_day}");
        return Ok(None);
    }

    let prev_close = bars.previous_close(ticker, session_day).await?;
    if prev_close.is_none() {
        warn!("No previous close for {ticker} before {session_day}");
    }

    let Some(m) = session_metrics(&intraday, prev_close) else {
        return Ok(None);
    };

    Ok(Some(ReactionMetrics {
        ticker: ticker.to_string(),
        announced_at,
        release_flag,
        session_day,
        gap_ret: m.gap_ret,
        oc_ret: m.oc_ret,
        range_pct: m.range_pct,
        open: m.open,
        close: m.close,
        high: m.high,
        low: m.low,
        prev_close,
    }))
}
