use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};
use statrs::statistics::{Data, Median};
use tracing::{debug, warn};

use crate::config::scoring::{BIG_MOVE_THRESHOLD, WEIGHT_BIG_MOVE, WEIGHT_BOOST, WEIGHT_HIT_MAIN_DIR};
use crate::error::Result;
use crate::fetcher::BarProvider;
use crate::types::{ConsistencyScore, DailyBar, ReactionMetrics};

/// Scores how strongly and consistently a ticker moves on earnings sessions
/// compared with a sample of ordinary sessions.
pub struct ConsistencyScorer<B: ?Sized> {
    bars: Arc<B>,
    sample_non_earnings_days: usize,
    non_earnings_lookback_days: i64,
}

impl<B: BarProvider + ?Sized> ConsistencyScorer<B> {
    pub fn new(bars: Arc<B>, sample_non_earnings_days: usize, non_earnings_lookback_days: i64) -> Self {
        Self {
            bars,
            sample_non_earnings_days,
            non_earnings_lookback_days,
        }
    }

    /// Fetch the baseline daily bars for `records` and score them.
    pub async fn score(&self, ticker: &str, records: &[ReactionMetrics]) -> Result<ConsistencyScore> {
        let Some(end_day) = records
            .iter()
            .filter(|r| r.oc_ret.is_some())
            .map(|r| r.session_day)
            .max()
        else {
            return Ok(ConsistencyScore::default());
        };

        let start_day = TimeDelta::try_days(self.non_earnings_lookback_days)
            .and_then(|span| end_day.checked_sub_signed(span))
            .unwrap_or(NaiveDate::MIN);
        let baseline = self.bars.daily_bars(ticker, start_day, end_day).await?;
        if baseline.is_empty() {
            warn!("No daily bars for {ticker} between {start_day} and {end_day}");
        }

        Ok(score_reactions(ticker, records, &baseline, self.sample_non_earnings_days))
    }
}

/// Deterministic scoring of reaction records against baseline daily bars.
///
/// Only records with an open-to-close return take part. With none, the
/// all-zero score is returned.
pub fn score_reactions(
    ticker: &str,
    records: &[ReactionMetrics],
    baseline: &[DailyBar],
    sample_days: usize,
) -> ConsistencyScore {
    let valid: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter_map(|r| r.oc_ret.map(|oc| (r.session_day, oc)))
        .collect();
    if valid.is_empty() {
        return ConsistencyScore::default();
    }

    let n = valid.len() as f64;
    let mean_oc = valid.iter().map(|(_, oc)| oc).sum::<f64>() / n;
    let sign_mean = sign(mean_oc);

    let hit_main_dir = if sign_mean == 0 {
        0.0
    } else {
        valid.iter().filter(|(_, oc)| sign(*oc) == sign_mean).count() as f64 / n
    };

    let big_move_hit = valid
        .iter()
        .filter(|(_, oc)| oc.abs() >= BIG_MOVE_THRESHOLD)
        .count() as f64
        / n;

    let earnings_abs: Vec<f64> = valid.iter().map(|(_, oc)| oc.abs()).collect();
    let earnings_median_abs = median(earnings_abs).unwrap_or(0.0);

    let session_days: BTreeSet<NaiveDate> = valid.iter().map(|(d, _)| *d).collect();
    let non_earnings_median_abs = non_earnings_median_abs(baseline, &session_days, sample_days);
    if non_earnings_median_abs.is_none() && !baseline.is_empty() {
        warn!("No non-earnings baseline days for {ticker}");
    }

    let boost = match non_earnings_median_abs {
        Some(base) if base > 0.0 => earnings_median_abs / base,
        _ => 0.0,
    };

    let score = WEIGHT_HIT_MAIN_DIR * hit_main_dir + WEIGHT_BIG_MOVE * big_move_hit + WEIGHT_BOOST * boost;

    debug!(
        mean_oc,
        earnings_median_abs,
        baseline = ?non_earnings_median_abs,
        "Scored {ticker}: {score:.4}"
    );

    ConsistencyScore {
        events_count: valid.len(),
        hit_main_dir,
        big_move_hit,
        boost,
        score,
    }
}

/// Median |close/open - 1| over the `sample_days` most recent bars that are
/// not earnings sessions. Bars with a zero open are ignored.
pub fn non_earnings_median_abs(
    baseline: &[DailyBar],
    session_days: &BTreeSet<NaiveDate>,
    sample_days: usize,
) -> Option<f64> {
    let mut candidates: Vec<&DailyBar> = baseline
        .iter()
        .filter(|b| !session_days.contains(&b.date))
        .collect();
    candidates.sort_by(|a, b| b.date.cmp(&a.date));
    candidates.truncate(sample_days);

    let moves: Vec<f64> = candidates
        .iter()
        .filter(|b| b.open != 0.0)
        .map(|b| (b.close / b.open - 1.0).abs())
        .collect();
    median(moves)
}

/// Median of `values`; the mean of the middle pair for even lengths.
pub fn median(values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Data::new(values).median())
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}
