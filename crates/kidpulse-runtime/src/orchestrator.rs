//! Orchestrator: runs scrape cycles one at a time.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use kidpulse_ai::AiConfig;
use kidpulse_core::{AttributionConfig, DailySummary, Error, KidPulseConfig, Result};
use kidpulse_extract::DedupIndex;
use kidpulse_reconcile::ReconcilePipeline;
use kidpulse_store::{SqliteStore, SummaryStore};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::chain::ExtractionChain;
use crate::notify::{LogNotifier, Notifier};
use crate::sources::{FeedCapture, FeedSource};
use crate::types::*;

pub struct Orchestrator {
    config: KidPulseConfig,
    store: Arc<dyn SummaryStore>,
    chain: ExtractionChain,
    notifiers: Vec<Arc<dyn Notifier>>,
    /// Held for the whole cycle; a second trigger is rejected, not queued.
    gate: Mutex<()>,
}

impl Orchestrator {
    pub fn new(config: KidPulseConfig, store: Arc<dyn SummaryStore>, chain: ExtractionChain) -> Self {
        Self {
            config,
            store,
            chain,
            notifiers: Vec::new(),
            gate: Mutex::new(()),
        }
    }

    /// Wire everything from the data directory: SQLite store, attribution
    /// rules, AI backend config, and the log notifier.
    pub fn from_config(config: KidPulseConfig) -> Result<Self> {
        let paths = &config.data_paths;
        let store = SqliteStore::open(&paths.db_dir)?;
        let attribution = AttributionConfig::load(&paths.classrooms_file);
        let ai = AiConfig::load(&paths.ai_config_file);
        let chain = ExtractionChain::from_config(attribution, &ai);

        info!(
            "Orchestrator initialized: timezone={}, ai={}, debug={}",
            config.timezone,
            chain.has_probabilistic(),
            config.debug
        );

        Ok(Self::new(config, Arc::new(store), chain).with_notifier(Arc::new(LogNotifier)))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn config(&self) -> &KidPulseConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn SummaryStore {
        self.store.as_ref()
    }

    /// Run one cycle against the current local time.
    pub async fn run_cycle(&self, source: &dyn FeedSource) -> Result<ScrapeReport> {
        self.run_cycle_at(source, self.config.reference_now()).await
    }

    /// Run one cycle, resolving bare clock times against `reference`.
    ///
    /// Returns `Error::ScrapeInProgress` if another cycle holds the gate.
    /// A capture or persistence failure is written to the scrape log and
    /// returned; dates merged before a persistence failure stay merged.
    pub async fn run_cycle_at(
        &self,
        source: &dyn FeedSource,
        reference: NaiveDateTime,
    ) -> Result<ScrapeReport> {
        let Ok(_guard) = self.gate.try_lock() else {
            warn!("Scrape already in progress, skipping");
            return Err(Error::ScrapeInProgress);
        };

        let start = std::time::Instant::now();
        info!("Starting scrape from {} (reference {})", source.name(), reference);

        let captures = match source.capture().await {
            Ok(captures) => captures,
            Err(e) => {
                self.record_failure(&format!("Capture failed: {}", e));
                return Err(e);
            }
        };
        if self.config.debug {
            self.save_captures(&captures, reference).await;
        }

        let mut scrape = DailySummary::new(reference.date());
        let mut paths = BTreeMap::new();
        for capture in &captures {
            let (child, path) = self.chain.extract(&capture.input(), reference).await;
            debug!("{} extracted via {}", capture.child_name, path);
            paths.insert(capture.child_name.clone(), path);

            let entry = scrape.child_mut(&capture.child_name);
            let mut index = DedupIndex::from_summary(entry);
            for record in child.records() {
                if index.admit(&record) {
                    entry.push(record);
                }
            }
        }

        let counts = scrape.counts();
        info!("Found {}", counts);

        let reconciled = match ReconcilePipeline::run(self.store.as_ref(), &scrape) {
            Ok(report) => report,
            Err(e) => {
                self.record_failure(&format!("Failed to save summary: {}", e));
                return Err(e);
            }
        };

        let report = ScrapeReport {
            reference,
            paths,
            counts,
            dates_merged: reconciled.dates_merged,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if let Err(e) = self
            .store
            .log_scrape(true, Some(&report.message()), report.event_count())
        {
            warn!("Failed to write scrape log: {}", e);
        }

        if report.event_count() > 0 {
            for notifier in &self.notifiers {
                if let Err(e) = notifier.notify(&scrape, &report).await {
                    warn!("Notifier {} failed: {}", notifier.name(), e);
                }
            }
        }

        info!(
            "Scrape complete: {} events, {} dates, {}ms",
            report.event_count(),
            report.dates_merged.len(),
            report.duration_ms
        );
        Ok(report)
    }

    fn record_failure(&self, message: &str) {
        error!("Scrape failed: {}", message);
        if let Err(e) = self.store.log_scrape(false, Some(message), 0) {
            warn!("Failed to write scrape log: {}", e);
        }
    }

    /// Keep the raw capture text under `<data>/debug/` for inspection.
    async fn save_captures(&self, captures: &[FeedCapture], reference: NaiveDateTime) {
        let dir = self.config.data_paths.root.join("debug");
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!("Failed to create {}: {}", dir.display(), e);
            return;
        }
        for capture in captures {
            let slug: String = capture
                .child_name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
                .collect();
            let path = dir.join(format!("{}-{}.txt", slug, reference.format("%Y%m%d-%H%M%S")));
            let text = match &capture.segments {
                Some(segments) => segments.join("\n---\n"),
                None => capture.raw_text.clone(),
            };
            match tokio::fs::write(&path, text).await {
                Ok(()) => debug!("Saved capture to {}", path.display()),
                Err(e) => warn!("Failed to save capture to {}: {}", path.display(), e),
            }
        }
    }
}
