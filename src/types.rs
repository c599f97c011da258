use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Release timing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseFlag {
    /// Released after the close; the market reacts on the next session.
    #[serde(rename = "AMC")]
    AfterMarketClose,
    /// Released before the open; the market reacts the same day.
    #[serde(rename = "BMO")]
    BeforeMarketOpen,
}

impl FromStr for ReleaseFlag {
    type Err = AppError;

    /// Case-insensitive; anything other than AMC/BMO is unsupported.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AMC" => Ok(ReleaseFlag::AfterMarketClose),
            "BMO" => Ok(ReleaseFlag::BeforeMarketOpen),
            _ => Err(AppError::UnsupportedReleaseFlag(raw.to_string())),
        }
    }
}

impl std::fmt::Display for ReleaseFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReleaseFlag::AfterMarketClose => "AMC",
            ReleaseFlag::BeforeMarketOpen => "BMO",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Earnings announcements
// ---------------------------------------------------------------------------

/// One historical earnings release as reported by the earnings provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementEvent {
    pub ticker: String,
    pub announced_at: Option<DateTime<Utc>>,
    /// Reporting period label, e.g. "Q3 2024". Not every source supplies it.
    pub period: Option<String>,
    pub eps: Option<f64>,
    pub eps_estimate: Option<f64>,
    pub surprise_pct: Option<f64>,
    /// Raw timing string from the provider; validated by the analyzer.
    pub release_flag: Option<String>,
}

// ---------------------------------------------------------------------------
// Price bars
// ---------------------------------------------------------------------------

/// A single intraday OHLCV bar. Series are time-ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A daily OHLCV bar keyed by its exchange-local trading date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

// ---------------------------------------------------------------------------
// Per-event reaction and per-ticker score
// ---------------------------------------------------------------------------

/// Price reaction for one earnings event. Optional fields are absent when
/// inputs were missing or a denominator was zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionMetrics {
    pub ticker: String,
    pub announced_at: DateTime<Utc>,
    pub release_flag: ReleaseFlag,
    pub session_day: NaiveDate,
    pub gap_ret: Option<f64>,
    pub oc_ret: Option<f64>,
    pub range_pct: Option<f64>,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub prev_close: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConsistencyScore {
    /// Records with a present open-to-close return.
    pub events_count: usize,
    pub hit_main_dir: f64,
    pub big_move_hit: f64,
    pub boost: f64,
    pub score: f64,
}
