//! Harvest context
//!
//! Built once when the host's data is loaded and passed to everything that
//! needs it. Owns the taxonomy, the collections and the play history, and
//! routes the host's lifecycle events to them.

use std::sync::Arc;

use harvest_collections::CollectionManager;
use harvest_core::{FormStore, Translations};
use harvest_data::{CategorizeReport, DataCase, ValueWeightSettings};
use harvest_gamestate::{GameHistory, RecordChannel, RestoreReport, SaveState};
use parking_lot::RwLock;

use crate::config::HarvestConfig;
use crate::error::RuntimeResult;
use crate::events::{ChannelEventSink, EventSink, UiPing};
use crate::search::{CandidateSource, SearchContext, SearchWorker};

/// Everything Harvest keeps for a session
pub struct HarvestContext {
    config: HarvestConfig,
    store: Arc<dyn FormStore>,
    data: Arc<DataCase>,
    collections: Arc<CollectionManager>,
    settings: Arc<RwLock<ValueWeightSettings>>,
    history: GameHistory,
    events: Arc<ChannelEventSink>,
    report: CategorizeReport,
}

impl HarvestContext {
    /// Build the taxonomy and load collections.
    ///
    /// A bad exceptions file is an error. Collections that fail to load
    /// only disable the collections feature.
    pub fn new(
        config: HarvestConfig,
        store: Arc<dyn FormStore>,
        translations: Translations,
        events: Arc<ChannelEventSink>,
    ) -> RuntimeResult<Self> {
        let exceptions = config.load_exceptions()?;
        let data = Arc::new(DataCase::new());
        let report = data.categorize_lootables(store.as_ref(), &translations, &exceptions);
        log::info!("Classified {} forms", report.classified());

        let collections = Arc::new(
            CollectionManager::new(events.clone())
                .with_translations(translations)
                .with_reconcile_interval(config.reconcile_interval()),
        );
        if config.collections.enabled {
            if let Err(e) = collections.load(
                &config.collections.directory,
                &config.collections.file_pattern,
                store.as_ref(),
                &data,
            ) {
                log::error!("Collections unavailable this session: {}", e);
            }
        }

        Ok(Self {
            settings: Arc::new(RwLock::new(config.value_weight.clone())),
            config,
            store,
            data,
            collections,
            history: GameHistory::new(),
            events,
            report,
        })
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn data(&self) -> &Arc<DataCase> {
        &self.data
    }

    pub fn collections(&self) -> &Arc<CollectionManager> {
        &self.collections
    }

    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    /// Taxonomy build summary
    pub fn categorize_report(&self) -> &CategorizeReport {
        &self.report
    }

    /// Current value/weight thresholds
    pub fn value_weight(&self) -> ValueWeightSettings {
        self.settings.read().clone()
    }

    /// Replace the value/weight thresholds; clears form blocks that were
    /// based on the old ones
    pub fn update_value_weight(&self, settings: ValueWeightSettings) {
        *self.settings.write() = settings;
        self.data.on_settings_changed();
    }

    /// Player moved to another cell
    pub fn on_cell_change(&self) {
        self.data.on_cell_change();
    }

    /// A new game was started
    pub fn on_new_game(&self) {
        self.data.on_game_reload();
        self.collections.reset_for_new_game();
        self.history.clear();
    }

    /// Write every Harvest record
    pub fn save(&self, channel: &mut dyn RecordChannel) -> RuntimeResult<()> {
        SaveState::capture(self.store.load_order(), &self.collections, &self.history).write(channel)?;
        Ok(())
    }

    /// Read every Harvest record and reinstate it
    pub fn load(&self, channel: &mut dyn RecordChannel) -> RuntimeResult<RestoreReport> {
        let state = SaveState::read(channel)?;
        self.data.on_game_reload();
        self.collections.reset_for_new_game();
        self.history.clear();
        let report = state.apply(self.store.load_order(), &self.collections, &self.history);
        log::info!("Restored save: {:?}", report);
        Ok(report)
    }

    /// Worker state for a candidate source
    pub fn search_context(&self, source: Arc<dyn CandidateSource>, ui: Option<UiPing>) -> SearchContext {
        let events: Arc<dyn EventSink> = self.events.clone();
        SearchContext {
            store: self.store.clone(),
            data: self.data.clone(),
            collections: self.collections.clone(),
            settings: self.settings.clone(),
            events,
            source,
            ui,
            record_dups: self.config.search.record_dups,
        }
    }

    /// Start the background search thread
    pub fn start_search(&self, source: Arc<dyn CandidateSource>, ui: Option<UiPing>) -> RuntimeResult<SearchWorker> {
        SearchWorker::start(
            self.search_context(source, ui),
            self.config.search_interval(),
            self.config.search.allowed,
        )
    }
}
