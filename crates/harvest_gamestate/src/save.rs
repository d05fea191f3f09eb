//! Save and load of everything Harvest persists

use std::fs;
use std::path::Path;

use harvest_collections::{CollectionManager, CollectionSnapshot, ObservationRecord};
use harvest_core::LoadOrder;

use crate::error::{RecordError, RecordResult};
use crate::history::{PartyEvent, PartyMembers, PartyVictims, PlaceVisit, PlacesHistory, VictimRecord};
use crate::load_order::{LoadOrderRemap, LoadOrderSnapshot};
use crate::record::{MemoryRecordChannel, Record, RecordChannel, RecordTag, MAX_UNCOMPRESSED_SIZE};

/// The three play histories
#[derive(Debug, Default)]
pub struct GameHistory {
    pub places: PlacesHistory,
    pub party: PartyMembers,
    pub victims: PartyVictims,
}

impl GameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, as on a new game
    pub fn clear(&self) {
        self.places.clear();
        self.party.clear();
        self.victims.clear();
    }
}

/// Counts from applying a save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub collections: usize,
    pub places: usize,
    pub party: usize,
    pub victims: usize,
    /// Entries lost because their plugin is no longer loaded
    pub dropped: usize,
}

/// Contents of every Harvest record in a save
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveState {
    /// `None` when the save predates the load order record
    pub load_order: Option<LoadOrderSnapshot>,
    pub collections: Vec<CollectionSnapshot>,
    pub places: Vec<PlaceVisit>,
    pub party: Vec<PartyEvent>,
    pub victims: Vec<VictimRecord>,
}

impl SaveState {
    /// Gather current state for saving
    pub fn capture(load_order: &LoadOrder, collections: &CollectionManager, history: &GameHistory) -> Self {
        Self {
            load_order: Some(LoadOrderSnapshot::capture(load_order)),
            collections: collections.snapshot(),
            places: history.places.entries(),
            party: history.party.entries(),
            victims: history.victims.entries(),
        }
    }

    /// Write one record per kind
    pub fn write(&self, channel: &mut dyn RecordChannel) -> RecordResult<()> {
        let records = [
            Record::encode(RecordTag::LoadOrder, &self.load_order)?,
            Record::encode(RecordTag::Collections, &self.collections)?,
            Record::encode(RecordTag::Places, &self.places)?,
            Record::encode(RecordTag::Party, &self.party)?,
            Record::encode(RecordTag::Victims, &self.victims)?,
        ];
        for record in &records {
            channel.write_record(record.tag, record.version, &record.payload)?;
            log::debug!("Wrote {} record, {} bytes", record.tag, record.payload.len());
        }
        Ok(())
    }

    /// Read every record. Records with an unknown tag or a newer version
    /// are skipped; damaged data is an error.
    pub fn read(channel: &mut dyn RecordChannel) -> RecordResult<Self> {
        Self::read_with_limit(channel, MAX_UNCOMPRESSED_SIZE)
    }

    /// [`read`](Self::read) with a custom uncompressed size limit
    pub fn read_with_limit(channel: &mut dyn RecordChannel, limit: usize) -> RecordResult<Self> {
        let mut state = Self::default();
        loop {
            let record = match channel.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(RecordError::UnknownTag(tag)) => {
                    log::warn!("Skipping unknown save record {}", tag);
                    continue;
                }
                Err(e) => return Err(e),
            };
            match state.apply_record(&record, limit) {
                Ok(()) => {}
                Err(e @ RecordError::VersionMismatch { .. }) => log::warn!("Skipping save record: {}", e),
                Err(e) => return Err(e),
            }
        }
        Ok(state)
    }

    fn apply_record(&mut self, record: &Record, limit: usize) -> RecordResult<()> {
        match record.tag {
            RecordTag::LoadOrder => self.load_order = record.decode(limit)?,
            RecordTag::Collections => self.collections = record.decode(limit)?,
            RecordTag::Places => self.places = record.decode(limit)?,
            RecordTag::Party => self.party = record.decode(limit)?,
            RecordTag::Victims => self.victims = record.decode(limit)?,
        }
        Ok(())
    }

    /// Move every saved FormID to the active load order. Returns the number
    /// of entries dropped.
    pub fn remap(&mut self, current: &LoadOrder) -> usize {
        let Some(saved) = &self.load_order else {
            return 0;
        };
        let remap = LoadOrderRemap::new(saved, current);
        if remap.is_identity() {
            return 0;
        }
        let mut dropped = 0;

        for snapshot in &mut self.collections {
            let members = snapshot.members.len();
            snapshot.members = snapshot.members.iter().filter_map(|id| remap.remap(*id)).collect();
            let observed = snapshot.observed.len();
            snapshot.observed = snapshot
                .observed
                .iter()
                .filter_map(|record| {
                    Some(ObservationRecord {
                        form: remap.remap(record.form)?,
                        item: remap.remap_or_none(record.item),
                        place: remap.remap_or_none(record.place),
                        game_time: record.game_time,
                    })
                })
                .collect();
            dropped += members - snapshot.members.len() + observed - snapshot.observed.len();
        }
        dropped += remap_entries(&mut self.places, &remap);
        dropped += remap_entries(&mut self.party, &remap);
        dropped += remap_entries(&mut self.victims, &remap);

        self.load_order = Some(LoadOrderSnapshot::capture(current));
        if dropped > 0 {
            log::info!("Dropped {} saved entries from plugins no longer loaded", dropped);
        }
        dropped
    }

    /// Remap to the active load order and reinstate everything
    pub fn apply(
        mut self,
        current: &LoadOrder,
        collections: &CollectionManager,
        history: &GameHistory,
    ) -> RestoreReport {
        let dropped = self.remap(current);
        let report = RestoreReport {
            collections: collections.restore(&self.collections),
            places: self.places.len(),
            party: self.party.len(),
            victims: self.victims.len(),
            dropped,
        };
        history.places.restore(self.places);
        history.party.restore(self.party);
        history.victims.restore(self.victims);
        report
    }

    /// Save to a standalone file
    pub fn save_to(&self, path: &Path) -> RecordResult<()> {
        let mut channel = MemoryRecordChannel::new();
        self.write(&mut channel)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, channel.into_bytes())?;
        Ok(())
    }

    /// Load from a file written by [`save_to`](Self::save_to)
    pub fn load_from(path: &Path) -> RecordResult<Self> {
        let mut channel = MemoryRecordChannel::from_bytes(fs::read(path)?);
        Self::read(&mut channel)
    }
}

fn remap_entries<E: crate::history::HistoryEntry>(entries: &mut Vec<E>, remap: &LoadOrderRemap) -> usize {
    let before = entries.len();
    *entries = entries.iter().filter_map(|entry| entry.remap(remap)).collect();
    before - entries.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::FormId;

    #[test]
    fn test_unknown_record_skipped() {
        let mut channel = MemoryRecordChannel::new();
        let places = vec![PlaceVisit {
            place: FormId::new(0x3C),
            game_time: 2.0,
        }];
        let record = Record::encode(RecordTag::Places, &places).unwrap();
        channel.write_record(record.tag, record.version, &record.payload).unwrap();

        let mut bytes = channel.into_bytes();
        let mut unknown = b"XTRA".to_vec();
        unknown.extend_from_slice(&1u32.to_le_bytes());
        unknown.extend_from_slice(&2u32.to_le_bytes());
        unknown.extend_from_slice(&[0, 0]);
        bytes.splice(0..0, unknown);

        let state = SaveState::read(&mut MemoryRecordChannel::from_bytes(bytes)).unwrap();
        assert_eq!(state.places, places);
        assert!(state.load_order.is_none());
    }

    #[test]
    fn test_remap_without_load_order_is_noop() {
        let mut state = SaveState {
            places: vec![PlaceVisit {
                place: FormId::new(0x0500_0001),
                game_time: 1.0,
            }],
            ..SaveState::default()
        };
        let order = LoadOrder::from_names(["Skyrim.esm"]).unwrap();
        assert_eq!(state.remap(&order), 0);
        assert_eq!(state.places.len(), 1);
    }
}
