//! Play history
//!
//! Append-only logs of places visited, party membership changes and
//! actors the party has killed. Entries are stamped with game time and
//! persisted as the `PLAC`, `PRTY` and `VCTM` records. Runtime-created
//! forms are never recorded.

use harvest_core::FormId;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::load_order::LoadOrderRemap;

/// An entry of a [`History`]
pub trait HistoryEntry: Copy + Serialize + DeserializeOwned {
    /// Entry may be stored; false when its subject is a runtime form
    fn is_persistable(&self) -> bool;

    fn game_time(&self) -> f32;

    /// Rewrite the entry for a changed load order; `None` drops it
    fn remap(&self, remap: &LoadOrderRemap) -> Option<Self>;

    /// Entry adds nothing after `previous`
    fn repeats(&self, _previous: &Self) -> bool {
        false
    }
}

/// Append-only, game-time-stamped log
#[derive(Debug)]
pub struct History<E> {
    entries: Mutex<Vec<E>>,
}

impl<E> Default for History<E> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<E: HistoryEntry> History<E> {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns false when it was refused or repeats the
    /// last entry.
    pub fn record(&self, entry: E) -> bool {
        if !entry.is_persistable() {
            log::debug!("Ignoring history entry for a runtime form");
            return false;
        }
        let mut entries = self.entries.lock();
        if entries.last().map(|last| entry.repeats(last)).unwrap_or(false) {
            return false;
        }
        entries.push(entry);
        true
    }

    /// Every entry in recording order
    pub fn entries(&self) -> Vec<E> {
        self.entries.lock().clone()
    }

    /// Entries stamped at or after `game_time`
    pub fn since(&self, game_time: f32) -> Vec<E> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.game_time() >= game_time)
            .copied()
            .collect()
    }

    pub fn last(&self) -> Option<E> {
        self.entries.lock().last().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Forget everything, as on a new game
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Replace the log with saved entries, dropping any that cannot be
    /// stored
    pub fn restore<I: IntoIterator<Item = E>>(&self, saved: I) {
        let restored: Vec<E> = saved.into_iter().filter(|entry| entry.is_persistable()).collect();
        *self.entries.lock() = restored;
    }

    /// Rewrite every entry for a changed load order
    pub fn remap(&self, remap: &LoadOrderRemap) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        let kept: Vec<E> = entries.iter().filter_map(|entry| entry.remap(remap)).collect();
        *entries = kept;
        before - entries.len()
    }
}

/// Arrival at a place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceVisit {
    pub place: FormId,
    pub game_time: f32,
}

impl HistoryEntry for PlaceVisit {
    fn is_persistable(&self) -> bool {
        !self.place.is_none() && !self.place.is_dynamic()
    }

    fn game_time(&self) -> f32 {
        self.game_time
    }

    fn remap(&self, remap: &LoadOrderRemap) -> Option<Self> {
        let place = remap.remap(self.place)?;
        Some(Self { place, ..*self })
    }

    fn repeats(&self, previous: &Self) -> bool {
        self.place == previous.place
    }
}

/// Party membership change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartyChange {
    Joined,
    Left,
}

/// A follower joining or leaving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyEvent {
    pub actor: FormId,
    pub change: PartyChange,
    pub game_time: f32,
}

impl HistoryEntry for PartyEvent {
    fn is_persistable(&self) -> bool {
        !self.actor.is_none() && !self.actor.is_dynamic()
    }

    fn game_time(&self) -> f32 {
        self.game_time
    }

    fn remap(&self, remap: &LoadOrderRemap) -> Option<Self> {
        let actor = remap.remap(self.actor)?;
        Some(Self { actor, ..*self })
    }
}

/// An actor killed by the player or a follower
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VictimRecord {
    pub victim: FormId,
    /// Where it died, `NONE` when unknown or runtime-created
    pub place: FormId,
    pub game_time: f32,
}

impl HistoryEntry for VictimRecord {
    fn is_persistable(&self) -> bool {
        !self.victim.is_none() && !self.victim.is_dynamic()
    }

    fn game_time(&self) -> f32 {
        self.game_time
    }

    fn remap(&self, remap: &LoadOrderRemap) -> Option<Self> {
        let victim = remap.remap(self.victim)?;
        Some(Self {
            victim,
            place: remap.remap_or_none(self.place),
            ..*self
        })
    }
}

/// Places visited (`PLAC`)
pub type PlacesHistory = History<PlaceVisit>;
/// Party membership changes (`PRTY`)
pub type PartyMembers = History<PartyEvent>;
/// Party kills (`VCTM`)
pub type PartyVictims = History<VictimRecord>;

impl History<PlaceVisit> {
    /// Record arrival at a place
    pub fn visit(&self, place: FormId, game_time: f32) -> bool {
        self.record(PlaceVisit { place, game_time })
    }

    /// Place of the most recent visit
    pub fn current_place(&self) -> Option<FormId> {
        self.last().map(|visit| visit.place)
    }
}

impl History<PartyEvent> {
    pub fn joined(&self, actor: FormId, game_time: f32) -> bool {
        self.record(PartyEvent {
            actor,
            change: PartyChange::Joined,
            game_time,
        })
    }

    pub fn left(&self, actor: FormId, game_time: f32) -> bool {
        self.record(PartyEvent {
            actor,
            change: PartyChange::Left,
            game_time,
        })
    }

    /// Actors whose last change was joining, in joining order
    pub fn current_members(&self) -> Vec<FormId> {
        let mut members: Vec<FormId> = Vec::new();
        for event in self.entries.lock().iter() {
            members.retain(|actor| *actor != event.actor);
            if event.change == PartyChange::Joined {
                members.push(event.actor);
            }
        }
        members
    }

    pub fn is_member(&self, actor: FormId) -> bool {
        self.current_members().contains(&actor)
    }
}

impl History<VictimRecord> {
    /// Record a kill; a runtime-created place is stored as `NONE`
    pub fn killed(&self, victim: FormId, place: FormId, game_time: f32) -> bool {
        let place = if place.is_dynamic() { FormId::NONE } else { place };
        self.record(VictimRecord {
            victim,
            place,
            game_time,
        })
    }

    /// Kills at one place
    pub fn victims_at(&self, place: FormId) -> Vec<VictimRecord> {
        self.entries
            .lock()
            .iter()
            .filter(|record| record.place == place)
            .copied()
            .collect()
    }
}
