//! Background search loop
//!
//! One dedicated thread wakes every interval, drains the collections'
//! added-item queue, runs the throttled inventory sweep, then asks the
//! candidate source for nearby references and decides each in the order
//! they arrive. Searching is paused by clearing the "search allowed" flag,
//! which is checked at the top of every pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use harvest_collections::{AddedItem, CollectionManager};
use harvest_core::FormStore;
use harvest_data::{BlockReason, DataCase, ValueWeightSettings, OBJECT_GLOW_DURATION};
use parking_lot::RwLock;

use crate::decision::{DecisionContext, LootCandidate, LootDecision};
use crate::error::RuntimeResult;
use crate::events::{EventSink, HarvestEvent, UiPing};

/// Supplies what the host's proximity scan and inventory can see
pub trait CandidateSource: Send + Sync {
    /// References near the player, nearest cell first
    fn scan(&self) -> Vec<LootCandidate>;

    /// Full player inventory, for the periodic sweep
    fn inventory(&self) -> Vec<AddedItem> {
        Vec::new()
    }
}

/// Counts from one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub candidates: usize,
    pub looted: usize,
    pub collected: usize,
    pub glowing: usize,
    pub skipped: usize,
    /// Sightings recorded from the added-item queue and sweep
    pub recorded: usize,
}

/// Shared state the worker reads
pub struct SearchContext {
    pub store: Arc<dyn FormStore>,
    pub data: Arc<DataCase>,
    pub collections: Arc<CollectionManager>,
    pub settings: Arc<RwLock<ValueWeightSettings>>,
    pub events: Arc<dyn EventSink>,
    pub source: Arc<dyn CandidateSource>,
    /// Asked before each pass when present
    pub ui: Option<UiPing>,
    pub record_dups: bool,
}

impl SearchContext {
    /// One scan pass at `now`
    pub fn run_pass(&self, now: Instant) -> PassReport {
        let mut report = PassReport::default();
        if let Some(ui) = &self.ui {
            if !ui.is_ui_ready() {
                log::debug!("UI not ready, skipping pass");
                return report;
            }
        }

        report.recorded += self.collections.process_added_items(self.store.as_ref(), &self.data);
        let inventory = self.source.inventory();
        if !inventory.is_empty() {
            report.recorded += self
                .collections
                .reconcile_inventory(&inventory, self.store.as_ref(), &self.data, now)
                .unwrap_or(0);
        }

        let settings = self.settings.read().clone();
        let context = DecisionContext {
            store: self.store.as_ref(),
            data: &self.data,
            collections: &self.collections,
            settings: &settings,
            record_dups: self.record_dups,
        };
        for candidate in self.source.scan() {
            report.candidates += 1;
            match context.decide(&candidate, now) {
                LootDecision::Loot => {
                    report.looted += 1;
                    self.data.block_reference(candidate.reference, BlockReason::Looted);
                    self.events.send(HarvestEvent::Loot {
                        reference: candidate.reference,
                        form: candidate.form.id,
                    });
                }
                LootDecision::Collect(handling) => {
                    report.collected += 1;
                    self.data.block_reference(candidate.reference, BlockReason::Looted);
                    self.events.send(HarvestEvent::Collect {
                        reference: candidate.reference,
                        form: candidate.form.id,
                        handling,
                    });
                }
                LootDecision::Glow => {
                    report.glowing += 1;
                    self.data.block_reference(candidate.reference, BlockReason::Unlootable);
                    self.events.send(HarvestEvent::Glow {
                        reference: candidate.reference,
                        duration: OBJECT_GLOW_DURATION,
                    });
                }
                LootDecision::Skip(reason) => {
                    report.skipped += 1;
                    log::trace!("Skipping {}: {:?}", candidate.reference, reason);
                }
            }
        }
        report
    }
}

/// Handle to the running search thread
pub struct SearchWorker {
    allowed: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SearchWorker {
    /// Start the search thread
    pub fn start(context: SearchContext, interval: Duration, allowed: bool) -> RuntimeResult<Self> {
        let allowed = Arc::new(AtomicBool::new(allowed));
        let running = Arc::new(AtomicBool::new(true));
        let handle = {
            let allowed = allowed.clone();
            let running = running.clone();
            thread::Builder::new().name("harvest-search".to_string()).spawn(move || {
                log::info!("Search worker started, interval {:?}", interval);
                while running.load(Ordering::Acquire) {
                    if allowed.load(Ordering::Acquire) {
                        let report = context.run_pass(Instant::now());
                        if report.candidates > 0 {
                            log::debug!("Search pass: {:?}", report);
                        }
                    }
                    thread::sleep(interval);
                }
                log::info!("Search worker stopped");
            })?
        };
        Ok(Self {
            allowed,
            running,
            handle: Some(handle),
        })
    }

    /// Pause or resume searching
    pub fn allow_search(&self, allowed: bool) {
        self.allowed.store(allowed, Ordering::Release);
    }

    pub fn is_search_allowed(&self) -> bool {
        self.allowed.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Stop the thread and wait for it, at most one interval
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Search worker panicked");
            }
        }
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
