//! Harvest Runtime - Settings, Events and Search
//!
//! Ties the taxonomy, collections and save records together for a host
//! integration.
//!
//! # Features
//!
//! - TOML settings with environment override
//! - Logging bootstrap
//! - Fire-and-continue host events and a UI readiness ping that fails closed
//! - Per-candidate loot decision
//! - Background search thread with a pause flag
//!
//! # Example
//!
//! ```ignore
//! use harvest_runtime::prelude::*;
//!
//! let config = HarvestConfig::load();
//! logging::init(&config.logging.level);
//!
//! let (events, receiver) = ChannelEventSink::new();
//! let harvest = HarvestContext::new(config, store, translations, Arc::new(events))?;
//! let worker = harvest.start_search(source, Some(ui_ping))?;
//! ```

pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod events;
pub mod logging;
pub mod search;

pub mod prelude {
    pub use crate::config::{
        CollectionsConfig, ExceptionsConfig, HarvestConfig, LoggingConfig, SearchConfig, UiConfig, CONFIG_ENV,
        DEFAULT_CONFIG_FILE,
    };
    pub use crate::context::HarvestContext;
    pub use crate::decision::{DecisionContext, LootCandidate, LootDecision, SkipReason};
    pub use crate::error::{RuntimeError, RuntimeResult};
    pub use crate::events::{ui_ping, ChannelEventSink, EventSink, HarvestEvent, PingRequest, UiPing, UiPingResponder};
    pub use crate::logging;
    pub use crate::search::{CandidateSource, PassReport, SearchContext, SearchWorker};
}

pub use prelude::*;
