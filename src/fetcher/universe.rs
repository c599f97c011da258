use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::fetcher::{http_client, UniverseProvider};

/// Header labels that identify the symbol column, in preference order.
const TICKER_COLUMNS: &[&str] = &["Symbol", "Ticker", "Ticker Symbol"];

/// Top U.S. listings by market cap, read from a public ranking table.
pub struct MarketCapUniverse {
    client: reqwest::Client,
    source_url: String,
    parser: TableParser,
}

impl MarketCapUniverse {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            source_url: cfg.universe_url.clone(),
            parser: TableParser::new()?,
        })
    }
}

#[async_trait]
impl UniverseProvider for MarketCapUniverse {
    async fn fetch(&self, top_n: usize) -> Result<Vec<String>> {
        info!("Fetching top {top_n} tickers by market cap");
        let html = self
            .client
            .get(&self.source_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let tickers = self.parser.tickers(&html, top_n)?;
        debug!(count = tickers.len(), "Fetched tickers: {tickers:?}");
        Ok(tickers)
    }
}

/// Compiled patterns for reading the ranking table.
pub struct TableParser {
    table: Regex,
    row: Regex,
    cell: Regex,
    tag: Regex,
    symbol: Regex,
}

impl TableParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            table: Regex::new(r"(?is)<table\b.*?</table>")?,
            row: Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>")?,
            cell: Regex::new(r"(?is)<t([hd])\b[^>]*>(.*?)</t[hd]>")?,
            tag: Regex::new(r"(?s)<[^>]*>")?,
            symbol: Regex::new(r"^[A-Z.]+$")?,
        })
    }

    /// Read the ticker column of the first table in `html`, keeping only plain
    /// uppercase symbols (letters and dots), at most `top_n` of them.
    pub fn tickers(&self, html: &str, top_n: usize) -> Result<Vec<String>> {
        let table = self
            .table
            .find(html)
            .ok_or_else(|| AppError::Parse("no tables found on universe source page".to_string()))?
            .as_str();

        let mut header: Option<usize> = None;
        let mut tickers = Vec::new();

        for row in self.row.captures_iter(table) {
            let cells: Vec<(bool, String)> = self
                .cell
                .captures_iter(&row[1])
                .map(|c| {
                    let is_header = c[1].eq_ignore_ascii_case("h");
                    let text = self.tag.replace_all(&c[2], "").replace("&amp;", "&");
                    (is_header, text.trim().to_string())
                })
                .collect();

            let Some(col) = header else {
                if cells.iter().any(|(is_header, _)| *is_header) {
                    header = TICKER_COLUMNS
                        .iter()
                        .find_map(|name| cells.iter().position(|(_, text)| text == name));
                    if header.is_none() {
                        return Err(AppError::Parse("ticker column not found in universe table".to_string()));
                    }
                }
                continue;
            };

            if tickers.len() >= top_n {
                break;
            }
            if let Some((_, symbol)) = cells.get(col) {
                if self.symbol.is_match(symbol) {
                    tickers.push(symbol.clone());
                }
            }
        }

        if header.is_none() {
            return Err(AppError::Parse("ticker column not found in universe table".to_string()));
        }
        Ok(tickers)
    }
}
