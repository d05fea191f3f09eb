//! Harvest GameState - Save Records and Play History
//!
//! Everything Harvest keeps across save and load, written to the host's
//! save-game channel as versioned, compressed records.
//!
//! # Features
//!
//! - `LORD` load order snapshot with FormID remapping on load
//! - `COLL` collection membership and sightings
//! - `PLAC`, `PRTY`, `VCTM` place, party and kill history
//! - LZ4-compressed JSON payloads with a checked size hint
//!
//! # Example
//!
//! ```ignore
//! use harvest_gamestate::prelude::*;
//!
//! let state = SaveState::capture(store.load_order(), &collections, &history);
//! state.write(&mut channel)?;
//!
//! let report = SaveState::read(&mut channel)?.apply(store.load_order(), &collections, &history);
//! ```

pub mod error;
pub mod history;
pub mod load_order;
pub mod record;
pub mod save;

pub mod prelude {
    pub use crate::error::{RecordError, RecordResult};
    pub use crate::history::{
        History, HistoryEntry, PartyChange, PartyEvent, PartyMembers, PartyVictims, PlaceVisit, PlacesHistory,
        VictimRecord,
    };
    pub use crate::load_order::{LoadOrderRemap, LoadOrderSnapshot};
    pub use crate::record::{
        decode_payload, encode_payload, MemoryRecordChannel, Record, RecordChannel, RecordTag, MAX_UNCOMPRESSED_SIZE,
        RECORD_VERSION,
    };
    pub use crate::save::{GameHistory, RestoreReport, SaveState};
}

pub use prelude::*;
