use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;
use crate::report::models::ScanRow;

pub const CSV_COLUMNS: [&str; 9] = [
    "ticker",
    "events_count",
    "hit_main_dir",
    "big_move_hit",
    "boost",
    "score",
    "mean_gap",
    "mean_oc",
    "mean_range",
];

/// Write ranked rows to `path`. The header is always written, so an empty
/// scan still produces a valid file. Absent means become empty cells.
pub fn write_csv(path: &Path, rows: &[ScanRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(CSV_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Plain-text table of the first `limit` rows for the console.
pub fn render_top(rows: &[ScanRow], limit: usize) -> String {
    if rows.is_empty() {
        return "No results to display.".to_string();
    }

    let width = rows
        .iter()
        .take(limit)
        .map(|r| r.ticker.len())
        .max()
        .unwrap_or(0)
        .max("ticker".len());

    let mut out = format!(
        "{:<width$}  {:>8}  {:>12}  {:>12}  {:>8}",
        "ticker", "score", "hit_main_dir", "big_move_hit", "boost"
    );
    for r in rows.iter().take(limit) {
        let _ = write!(
            out,
            "\n{:<width$}  {:>8.4}  {:>12.4}  {:>12.4}  {:>8.4}",
            r.ticker, r.score, r.hit_main_dir, r.big_move_hit, r.boost
        );
    }
    out
}
