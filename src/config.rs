use crate::error::{AppError, Result};

pub const POLYGON_API_URL: &str = "https://api.polygon.io";
pub const EARNINGS_API_URL: &str = "https://finance.yahoo.com";
pub const UNIVERSE_URL: &str = "https://stockanalysis.com/list/biggest-companies/";

/// Browser-like user agent; the earnings calendar rejects default client agents.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Per-request timeout for every provider call (seconds). No retries.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Regular session bounds, exchange-local (America/New_York).
pub const SESSION_OPEN: (u32, u32) = (9, 30);
pub const SESSION_CLOSE: (u32, u32) = (16, 0);

/// Intraday bar granularity in minutes.
pub const INTRADAY_BAR_MINUTES: u32 = 5;

/// Calendar days searched backwards for the previous session close.
pub const PREVIOUS_CLOSE_WINDOW_DAYS: i64 = 5;

/// Days per lookback year when filtering the earnings history.
pub const DAYS_PER_YEAR: i64 = 365;

/// Largest `--years` accepted on the command line.
pub const MAX_EARNINGS_YEARS: i64 = 100;

/// Scoring constants.
pub mod scoring {
    /// |open-to-close| at or above this counts as a big move.
    pub const BIG_MOVE_THRESHOLD: f64 = 0.02;
    pub const WEIGHT_HIT_MAIN_DIR: f64 = 0.5;
    pub const WEIGHT_BIG_MOVE: f64 = 0.3;
    pub const WEIGHT_BOOST: f64 = 0.2;
    pub const DEFAULT_SAMPLE_DAYS: usize = 10;
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 120;
    pub const MAX_LOOKBACK_DAYS: i64 = 36_500;
}

/// Number of rows echoed to stdout after a scan.
pub const CONSOLE_TOP_ROWS: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Polygon credential (POLYGON_API_KEY). Required.
    pub polygon_api_key: String,
    pub polygon_api_url: String,
    pub earnings_api_url: String,
    pub universe_url: String,
    pub log_level: String,
    /// Non-earnings days sampled for the baseline (SCORER_SAMPLE_DAYS)
    pub sample_non_earnings_days: usize,
    /// Baseline lookback in calendar days (SCORER_LOOKBACK_DAYS)
    pub non_earnings_lookback_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let polygon_api_key = std::env::var("POLYGON_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AppError::Config("POLYGON_API_KEY environment variable is required".to_string())
            })?;

        Ok(Self {
            polygon_api_key,
            polygon_api_url: std::env::var("POLYGON_API_URL")
                .unwrap_or_else(|_| POLYGON_API_URL.to_string()),
            earnings_api_url: std::env::var("EARNINGS_API_URL")
                .unwrap_or_else(|_| EARNINGS_API_URL.to_string()),
            universe_url: std::env::var("UNIVERSE_URL").unwrap_or_else(|_| UNIVERSE_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            sample_non_earnings_days: std::env::var("SCORER_SAMPLE_DAYS")
                .unwrap_or_else(|_| scoring::DEFAULT_SAMPLE_DAYS.to_string())
                .parse::<usize>()
                .unwrap_or(scoring::DEFAULT_SAMPLE_DAYS),
            non_earnings_lookback_days: lookback_days(std::env::var("SCORER_LOOKBACK_DAYS").ok())?,
        })
    }
}

/// Unparseable values fall back to the default; parsed values outside
/// `1..=MAX_LOOKBACK_DAYS` are rejected.
fn lookback_days(raw: Option<String>) -> Result<i64> {
    let Some(days) = raw.and_then(|r| r.trim().parse::<i64>().ok()) else {
        return Ok(scoring::DEFAULT_LOOKBACK_DAYS);
    };
    if !(1..=scoring::MAX_LOOKBACK_DAYS).contains(&days) {
        return Err(AppError::Config(format!(
            "SCORER_LOOKBACK_DAYS must be between 1 and {}, got {days}",
            scoring::MAX_LOOKBACK_DAYS
        )));
    }
    Ok(days)
}
