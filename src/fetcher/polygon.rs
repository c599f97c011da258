use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{Config, INTRADAY_BAR_MINUTES};
use crate::error::Result;
use crate::fetcher::{http_client, BarProvider};
use crate::session::exchange_date;
use crate::types::{Bar, DailyBar};

const INTRADAY_LIMIT: u32 = 50_000;
const DAILY_LIMIT: u32 = 5_000;

/// Aggregates client for the Polygon REST API.
pub struct PolygonClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// `/v2/aggs` payload. `results` is omitted entirely when the range is empty.
#[derive(Debug, Deserialize)]
struct AggsResponse {
    #[serde(default)]
    results: Option<Vec<AggBar>>,
}

#[derive(Debug, Deserialize)]
struct AggBar {
    /// Bar start, Unix milliseconds.
    #[serde(rename = "t")]
    timestamp_ms: i64,
    #[serde(rename = "o")]
    open: f64,
    #[serde(rename = "h")]
    high: f64,
    #[serde(rename = "l")]
    low: f64,
    #[serde(rename = "c")]
    close: f64,
    #[serde(rename = "v", default)]
    volume: f64,
}

impl PolygonClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: cfg.polygon_api_url.trim_end_matches('/').to_string(),
            api_key: cfg.polygon_api_key.clone(),
        })
    }

    async fn fetch_aggs(
        &self,
        ticker: &str,
        multiplier: u32,
        timespan: &str,
        from_ms: i64,
        to_ms: i64,
        limit: u32,
    ) -> Result<String> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            self.base_url, ticker, multiplier, timespan, from_ms, to_ms
        );
        let limit = limit.to_string();
        let body = self
            .client
            .get(&url)
            .query(&[
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", limit.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

#[async_trait]
impl BarProvider for PolygonClient {
    async fn intraday_bars(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        let body = self
            .fetch_aggs(
                ticker,
                INTRADAY_BAR_MINUTES,
                "minute",
                start.timestamp_millis(),
                end.timestamp_millis(),
                INTRADAY_LIMIT,
            )
            .await?;
        let bars = parse_intraday_bars(&body)?;
        if bars.is_empty() {
            warn!("No intraday bars returned for {ticker} between {start} and {end}");
        }
        Ok(bars)
    }

    async fn daily_bars(
        &self,
        ticker: &str,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> Result<Vec<DailyBar>> {
        let (Some(start), Some(end)) = (start_day.and_hms_opt(0, 0, 0), end_day.and_hms_opt(23, 59, 59))
        else {
            return Ok(Vec::new());
        };
        let body = self
            .fetch_aggs(
                ticker,
                1,
                "day",
                start.and_utc().timestamp_millis(),
                end.and_utc().timestamp_millis(),
                DAILY_LIMIT,
            )
            .await?;
        let bars: Vec<DailyBar> = parse_daily_bars(&body)?
            .into_iter()
            .filter(|b| b.date >= start_day && b.date <= end_day)
            .collect();
        debug!("Fetched {} daily bars for {ticker} {start_day}..{end_day}", bars.len());
        Ok(bars)
    }
}

/// Parse an aggregates body into intraday bars, time-ascending.
pub fn parse_intraday_bars(body: &str) -> Result<Vec<Bar>> {
    let resp: AggsResponse = serde_json::from_str(body)?;
    let mut bars: Vec<Bar> = resp
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| {
            let timestamp = DateTime::from_timestamp_millis(a.timestamp_ms)?;
            Some(Bar {
                timestamp,
                open: a.open,
                high: a.high,
                low: a.low,
                close: a.close,
                volume: a.volume,
            })
        })
        .collect();
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Parse an aggregates body into daily bars dated in the exchange zone.
pub fn parse_daily_bars(body: &str) -> Result<Vec<DailyBar>> {
    let resp: AggsResponse = serde_json::from_str(body)?;
    let mut bars: Vec<DailyBar> = resp
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| {
            let ts = DateTime::from_timestamp_millis(a.timestamp_ms)?;
            Some(DailyBar {
                date: exchange_date(ts),
                open: a.open,
                high: a.high,
                low: a.low,
                close: a.close,
                volume: a.volume,
            })
        })
        .collect();
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::fetcher::fake::{day, test_config};
    use chrono::TimeZone;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parses_intraday_aggregates() {
        // 14:30 and 14:35 UTC on 2024-01-25, delivered out of order
        let body = r#"{"ticker":"AAPL","status":"OK","resultsCount":2,"results":[
            {"t":1706193300000,"o":101.0,"h":102.0,"l":100.5,"c":101.5,"v":900},
            {"t":1706193000000,"o":100.0,"h":101.2,"l":99.8,"c":101.0,"v":1200,"vw":100.6,"n":42}
        ]}"#;
        let bars = parse_intraday_bars(body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 25, 14, 30, 0).unwrap());
        assert!((bars[0].open - 100.0).abs() < 1e-9);
        assert!((bars[1].close - 101.5).abs() < 1e-9);
        assert!((bars[0].volume - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn missing_results_is_empty_series() {
        let body = r#"{"ticker":"AAPL","status":"OK","resultsCount":0}"#;
        assert!(parse_intraday_bars(body).unwrap().is_empty());
        assert!(parse_daily_bars(body).unwrap().is_empty());
    }

    #[test]
    fn daily_bars_are_dated_in_exchange_zone() {
        // 05:00 UTC = midnight ET, winter
        let body = r#"{"results":[{"t":1706158800000,"o":190.0,"h":195.0,"l":189.0,"c":194.0,"v":5}]}"#;
        let bars = parse_daily_bars(body).unwrap();
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 25).unwrap());
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_intraday_bars("<html>rate limited</html>").is_err());
    }

    #[tokio::test]
    async fn intraday_request_covers_regular_session() {
        let server = MockServer::start().await;
        // 2024-01-25 09:30 and 16:00 ET
        Mock::given(method("GET"))
            .and(path("/v2/aggs/ticker/AAPL/range/5/minute/1706193000000/1706216400000"))
            .and(query_param("adjusted", "true"))
            .and(query_param("sort", "asc"))
            .and(query_param("limit", "50000"))
            .and(query_param("apiKey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"results":[{"t":1706193000000,"o":100.0,"h":101.0,"l":99.0,"c":100.5,"v":10}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = PolygonClient::new(&test_config(&server.uri())).unwrap();
        let bars = client.regular_session_bars("AAPL", day(2024, 1, 25)).await.unwrap();
        assert_eq!(bars.len(), 1);
        assert!((bars[0].close - 100.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn daily_request_spans_whole_utc_days() {
        let server = MockServer::start().await;
        // 2024-01-22 00:00:00 UTC to 2024-01-26 23:59:59 UTC
        Mock::given(method("GET"))
            .and(path("/v2/aggs/ticker/MSFT/range/1/day/1705881600000/1706313599000"))
            .and(query_param("limit", "5000"))
            .and(query_param("apiKey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"results":[
                    {"t":1705640400000,"o":10.0,"h":10.0,"l":10.0,"c":10.0},
                    {"t":1706158800000,"o":400.0,"h":405.0,"l":398.0,"c":404.0,"v":7}
                ]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = PolygonClient::new(&test_config(&server.uri())).unwrap();
        let bars = client
            .daily_bars("MSFT", day(2024, 1, 22), day(2024, 1, 26))
            .await
            .unwrap();
        // The 2024-01-19 bar falls outside the requested days.
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day(2024, 1, 25));
    }

    #[tokio::test]
    async fn server_error_is_an_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = PolygonClient::new(&test_config(&server.uri())).unwrap();
        let err = client
            .regular_session_bars("AAPL", day(2024, 1, 25))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Http(_)), "got {err:?}");
    }
}
