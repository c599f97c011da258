use std::sync::Arc;

use tracing::{error, info, warn};

use crate::analyzer::EarningsReactionAnalyzer;
use crate::error::Result;
use crate::fetcher::{BarProvider, EarningsProvider, UniverseProvider};
use crate::report::ScanRow;
use crate::scorer::ConsistencyScorer;

/// Drives universe → earnings → reactions → score for every ticker, one at a time.
pub struct Scanner<U: ?Sized, E: ?Sized, B: ?Sized> {
    universe: Arc<U>,
    earnings: Arc<E>,
    analyzer: EarningsReactionAnalyzer<B>,
    scorer: ConsistencyScorer<B>,
}

impl<U, E, B> Scanner<U, E, B>
where
    U: UniverseProvider + ?Sized,
    E: EarningsProvider + ?Sized,
    B: BarProvider + ?Sized,
{
    pub fn new(
        universe: Arc<U>,
        earnings: Arc<E>,
        bars: Arc<B>,
        sample_non_earnings_days: usize,
        non_earnings_lookback_days: i64,
    ) -> Self {
        Self {
            universe,
            earnings,
            analyzer: EarningsReactionAnalyzer::new(Arc::clone(&bars)),
            scorer: ConsistencyScorer::new(bars, sample_non_earnings_days, non_earnings_lookback_days),
        }
    }

    /// Best-effort scan. Failed tickers are logged and left out; the result is
    /// ranked by score, highest first.
    pub async fn run(&self, top_n: usize) -> Vec<ScanRow> {
        let tickers = match self.universe.fetch(top_n).await {
            Ok(t) => t,
            Err(e) => {
                error!("Universe fetch failed: {e}");
                return Vec::new();
            }
        };
        info!(count = tickers.len(), "Scanning {} tickers", tickers.len());

        let mut rows = Vec::with_capacity(tickers.len());
        let mut failed = 0usize;
        for ticker in &tickers {
            match self.scan_ticker(ticker).await {
                Ok(row) => rows.push(row),
                Err(e) => {
                    failed += 1;
                    error!("Failed to process {ticker}: {e}");
                }
            }
        }

        if rows.is_empty() {
            warn!("No records generated.");
        }
        rank(&mut rows);
        info!(
            scanned = tickers.len(),
            scored = rows.len(),
            failed,
            "Scan complete: {} scored, {failed} failed",
            rows.len(),
        );
        rows
    }

    async fn scan_ticker(&self, ticker: &str) -> Result<ScanRow> {
        let events = self.earnings.fetch(ticker).await?;
        let metrics = self.analyzer.analyze_ticker(ticker, &events).await?;
        let score = self.scorer.score(ticker, &metrics).await?;
        Ok(ScanRow::new(ticker, &score, &metrics))
    }
}

/// Sort by score descending; equal scores keep universe order.
pub fn rank(rows: &mut [ScanRow]) {
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));
}
