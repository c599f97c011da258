use serde::Serialize;

use crate::types::{ConsistencyScore, ReactionMetrics};

/// One ranked output row. Field order matches the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRow {
    pub ticker: String,
    pub events_count: usize,
    pub hit_main_dir: f64,
    pub big_move_hit: f64,
    pub boost: f64,
    pub score: f64,
    pub mean_gap: Option<f64>,
    pub mean_oc: Option<f64>,
    pub mean_range: Option<f64>,
}

impl ScanRow {
    pub fn new(ticker: &str, score: &ConsistencyScore, metrics: &[ReactionMetrics]) -> Self {
        Self {
            ticker: ticker.to_string(),
            events_count: score.events_count,
            hit_main_dir: score.hit_main_dir,
            big_move_hit: score.big_move_hit,
            boost: score.boost,
            score: score.score,
            mean_gap: mean_present(metrics.iter().map(|m| m.gap_ret)),
            mean_oc: mean_present(metrics.iter().map(|m| m.oc_ret)),
            mean_range: mean_present(metrics.iter().map(|m| m.range_pct)),
        }
    }
}

/// Mean of the present values; `None` when every value is absent.
pub fn mean_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
