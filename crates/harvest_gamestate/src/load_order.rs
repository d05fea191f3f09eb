//! Load order snapshot and FormID remapping
//!
//! FormIDs in a save carry the plugin slot they had when it was written.
//! When the plugin list changes between sessions, [`LoadOrderRemap`] moves
//! each saved ID to its plugin's current slot and drops IDs whose plugin
//! is gone.

use std::collections::HashMap;

use harvest_core::{FormId, LoadOrder, PluginIndex, PluginInfo};
use serde::{Deserialize, Serialize};

/// Plugin list stored in the `LORD` record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOrderSnapshot {
    pub plugins: Vec<PluginInfo>,
}

impl LoadOrderSnapshot {
    /// Capture the active load order
    pub fn capture(load_order: &LoadOrder) -> Self {
        Self {
            plugins: load_order.plugins().to_vec(),
        }
    }

    /// Saved plugin owning an ID
    pub fn plugin_of(&self, id: FormId) -> Option<&PluginInfo> {
        if id.is_dynamic() {
            return None;
        }
        self.plugins.iter().find(|plugin| plugin.index.owns(id))
    }
}

/// Saved slot to current slot mapping
#[derive(Debug, Clone)]
pub struct LoadOrderRemap {
    slots: HashMap<PluginIndex, Option<PluginIndex>>,
    identity: bool,
}

impl LoadOrderRemap {
    /// Build the mapping between a saved and the active load order
    pub fn new(saved: &LoadOrderSnapshot, current: &LoadOrder) -> Self {
        let mut slots = HashMap::new();
        let mut identity = true;
        for plugin in &saved.plugins {
            let now = current.index_of(&plugin.name);
            match now {
                Some(index) if index == plugin.index => {}
                Some(index) => {
                    log::info!("Plugin {} moved from {:?} to {:?}", plugin.name, plugin.index, index);
                    identity = false;
                }
                None => {
                    log::warn!("Plugin {} is no longer loaded, dropping its saved forms", plugin.name);
                    identity = false;
                }
            }
            slots.insert(plugin.index, now);
        }
        Self { slots, identity }
    }

    /// No plugin moved or disappeared
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Current ID for a saved one. `NONE` stays `NONE`; dynamic IDs and
    /// IDs from unloaded plugins map to `None`.
    pub fn remap(&self, id: FormId) -> Option<FormId> {
        if id.is_none() {
            return Some(FormId::NONE);
        }
        if id.is_dynamic() {
            return None;
        }
        let saved = self.slots.keys().find(|index| index.owns(id))?;
        self.slots.get(saved).copied().flatten().map(|index| index.form_id(id.local_id()))
    }

    /// Remap, turning lost IDs into `NONE`
    pub fn remap_or_none(&self, id: FormId) -> FormId {
        self.remap(id).unwrap_or(FormId::NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let order = LoadOrder::from_names(["Skyrim.esm", "Coins.esp"]).unwrap();
        let remap = LoadOrderRemap::new(&LoadOrderSnapshot::capture(&order), &order);

        assert!(remap.is_identity());
        assert_eq!(remap.remap(FormId::new(0x0100_0801)), Some(FormId::new(0x0100_0801)));
    }

    #[test]
    fn test_moved_and_removed_plugins() {
        let saved = LoadOrder::from_names(["Skyrim.esm", "Old.esp", "Coins.esp", "Tiny.esl"]).unwrap();
        let current = LoadOrder::from_names(["Skyrim.esm", "Extra.esl", "Tiny.esl", "Coins.esp"]).unwrap();
        let remap = LoadOrderRemap::new(&LoadOrderSnapshot::capture(&saved), &current);

        assert!(!remap.is_identity());
        assert_eq!(remap.remap(FormId::new(0x0000_0012)), Some(FormId::new(0x12)));
        assert_eq!(remap.remap(FormId::new(0x0200_0801)), Some(FormId::new(0x0100_0801)));
        assert_eq!(remap.remap(FormId::new(0x0100_0801)), None);
        assert_eq!(remap.remap(FormId::new(0xFE00_0801)), Some(FormId::new(0xFE00_1801)));
        assert_eq!(remap.remap(FormId::new(0xFF00_0001)), None);
        assert_eq!(remap.remap_or_none(FormId::new(0x0100_0801)), FormId::NONE);
        assert_eq!(remap.remap(FormId::NONE), Some(FormId::NONE));
    }
}
