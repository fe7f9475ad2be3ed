//! Post-cycle notification hooks.

use async_trait::async_trait;
use kidpulse_core::{DailySummary, Result};
use tracing::info;

use crate::types::ScrapeReport;

/// Told about every cycle that found at least one event.
///
/// Errors are logged by the orchestrator and never fail the cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, scrape: &DailySummary, report: &ScrapeReport) -> Result<()>;
}

/// Writes a per-child digest to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, scrape: &DailySummary, report: &ScrapeReport) -> Result<()> {
        for (name, child) in &scrape.children {
            if child.is_empty() {
                continue;
            }
            let totals = child.totals();
            info!(
                "{}: {} | bottles {:.1} oz, fluids {:.1} oz, naps {} min, wet {}, BM {}",
                name,
                child.counts(),
                totals.total_bottle_consumed,
                totals.total_fluids,
                totals.total_nap_minutes,
                totals.wet_diapers,
                totals.bm_diapers
            );
        }
        info!("{} across {} date(s)", report.message(), report.dates_merged.len());
        Ok(())
    }
}
