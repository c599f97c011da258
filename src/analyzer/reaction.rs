use std::sync::Arc;

use tracing::{debug, info};

use crate::analyzer::metrics::compute_reaction;
use crate::error::Result;
use crate::fetcher::BarProvider;
use crate::session::resolve_session_day;
use crate::types::{AnnouncementEvent, ReactionMetrics, ReleaseFlag};

/// Turns a ticker's announcement history into per-event reaction records.
pub struct EarningsReactionAnalyzer<B: ?Sized> {
    bars: Arc<B>,
}

impl<B: BarProvider + ?Sized> EarningsReactionAnalyzer<B> {
    pub fn new(bars: Arc<B>) -> Self {
        Self { bars }
    }

    /// Records come back ordered by announcement time. An empty result means
    /// no event was analyzable; fetch failures surface as `Err`.
    pub async fn analyze_ticker(
        &self,
        ticker: &str,
        events: &[AnnouncementEvent],
    ) -> Result<Vec<ReactionMetrics>> {
        let mut ordered: Vec<&AnnouncementEvent> = events.iter().collect();
        // Stable: equal timestamps keep their input order; undated rows go last.
        ordered.sort_by_key(|e| (e.announced_at.is_none(), e.announced_at));

        let mut records = Vec::with_capacity(ordered.len());
        let mut skipped = 0usize;

        for event in ordered {
            let raw_flag = event.release_flag.as_deref().unwrap_or_default();
            let release_flag = match raw_flag.parse::<ReleaseFlag>() {
                Ok(flag) => flag,
                Err(e) => {
                    debug!("Skipping {ticker} event without supported release flag: {e}");
                    skipped += 1;
                    continue;
                }
            };

            let Some(announced_at) = event.announced_at else {
                debug!("Skipping {ticker} event without announcement timestamp");
                skipped += 1;
                continue;
            };

            let session_day = resolve_session_day(announced_at, release_flag);
            match compute_reaction(self.bars.as_ref(), ticker, announced_at, session_day, release_flag)
                .await?
            {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }

        info!(
            events = events.len(),
            analyzed = records.len(),
            skipped,
            "Analyzed {} of {} earnings events for {ticker}",
            records.len(),
            events.len(),
        );
        Ok(records)
    }
}
