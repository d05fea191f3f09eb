//! Plugin load order
//!
//! Maps plugin names to the index byte(s) baked into runtime FormIDs and
//! back. Full plugins occupy indices `0x00..=0xFD`; light plugins share the
//! `0xFE` prefix and get a 12-bit sub-index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::form_id::FormId;

const MAX_FULL_PLUGINS: usize = 0xFE;
const MAX_LIGHT_PLUGINS: usize = 0x1000;

/// Where a plugin sits in the load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginIndex {
    /// Regular plugin with its own index byte
    Full(u8),
    /// Light plugin under the `0xFE` prefix
    Light(u16),
}

impl PluginIndex {
    /// Build the runtime FormID for a plugin-local ID
    pub fn form_id(&self, local: u32) -> FormId {
        match self {
            PluginIndex::Full(index) => FormId::new(((*index as u32) << 24) | (local & 0x00FF_FFFF)),
            PluginIndex::Light(index) => {
                FormId::new(0xFE00_0000 | ((*index as u32 & 0xFFF) << 12) | (local & 0xFFF))
            }
        }
    }

    /// Check whether a FormID belongs to this plugin
    pub fn owns(&self, id: FormId) -> bool {
        match self {
            PluginIndex::Full(index) => !id.is_light() && !id.is_dynamic() && id.mod_index() == *index,
            PluginIndex::Light(index) => id.is_light() && id.light_index() == *index,
        }
    }
}

/// A loaded plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// File name, e.g. `Skyrim.esm`
    pub name: String,
    /// Load order slot
    pub index: PluginIndex,
}

/// The active load order
#[derive(Debug, Clone, Default)]
pub struct LoadOrder {
    plugins: Vec<PluginInfo>,
    by_name: HashMap<String, usize>,
    full_count: usize,
    light_count: usize,
}

impl LoadOrder {
    /// Create an empty load order
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a load order from plugin file names. `.esl` files are light.
    pub fn from_names<I, S>(names: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut order = Self::new();
        for name in names {
            let name = name.as_ref();
            let light = name.to_ascii_lowercase().ends_with(".esl");
            order.add_plugin(name, light)?;
        }
        Ok(order)
    }

    /// Add a full plugin
    pub fn with_plugin(mut self, name: impl Into<String>) -> CoreResult<Self> {
        self.add_plugin(name, false)?;
        Ok(self)
    }

    /// Add a light plugin
    pub fn with_light_plugin(mut self, name: impl Into<String>) -> CoreResult<Self> {
        self.add_plugin(name, true)?;
        Ok(self)
    }

    /// Append a plugin in the next free slot of its kind
    pub fn add_plugin(&mut self, name: impl Into<String>, light: bool) -> CoreResult<PluginIndex> {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        if let Some(existing) = self.by_name.get(&key) {
            return Ok(self.plugins[*existing].index);
        }

        let index = if light {
            if self.light_count >= MAX_LIGHT_PLUGINS {
                return Err(CoreError::LoadOrderFull(name));
            }
            self.light_count += 1;
            PluginIndex::Light((self.light_count - 1) as u16)
        } else {
            if self.full_count >= MAX_FULL_PLUGINS {
                return Err(CoreError::LoadOrderFull(name));
            }
            self.full_count += 1;
            PluginIndex::Full((self.full_count - 1) as u8)
        };

        self.by_name.insert(key, self.plugins.len());
        self.plugins.push(PluginInfo { name, index });
        Ok(index)
    }

    /// Index of a plugin by (case-insensitive) name
    pub fn index_of(&self, name: &str) -> Option<PluginIndex> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(|slot| self.plugins[*slot].index)
    }

    /// Check if a plugin is loaded
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_ascii_lowercase())
    }

    /// Runtime FormID for a plugin-qualified local ID
    pub fn form_id(&self, plugin: &str, local: u32) -> CoreResult<FormId> {
        self.index_of(plugin)
            .map(|index| index.form_id(local))
            .ok_or_else(|| CoreError::UnknownPlugin(plugin.to_string()))
    }

    /// Name of the plugin that owns a FormID
    pub fn plugin_of(&self, id: FormId) -> Option<&str> {
        if id.is_dynamic() {
            return None;
        }
        self.plugins
            .iter()
            .find(|plugin| plugin.index.owns(id))
            .map(|plugin| plugin.name.as_str())
    }

    /// Plugins in load order
    pub fn plugins(&self) -> &[PluginInfo] {
        &self.plugins
    }

    /// Number of loaded plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LoadOrder {
        LoadOrder::from_names(["Skyrim.esm", "Update.esm", "ccBGSSSE001-Fish.esl", "Mod.esp"]).unwrap()
    }

    #[test]
    fn test_indices() {
        let order = sample();
        assert_eq!(order.index_of("skyrim.esm"), Some(PluginIndex::Full(0)));
        assert_eq!(order.index_of("Mod.esp"), Some(PluginIndex::Full(2)));
        assert_eq!(order.index_of("ccBGSSSE001-Fish.esl"), Some(PluginIndex::Light(0)));
        assert_eq!(order.index_of("Missing.esp"), None);
    }

    #[test]
    fn test_form_id_round_trip() {
        let order = sample();
        let id = order.form_id("Mod.esp", 0x1234).unwrap();
        assert_eq!(id, FormId::new(0x0200_1234));
        assert_eq!(order.plugin_of(id), Some("Mod.esp"));

        let light = order.form_id("ccBGSSSE001-Fish.esl", 0x801).unwrap();
        assert_eq!(light, FormId::new(0xFE00_0801));
        assert_eq!(order.plugin_of(light), Some("ccBGSSSE001-Fish.esl"));
    }

    #[test]
    fn test_unknown_plugin() {
        let order = sample();
        assert_eq!(
            order.form_id("Nope.esp", 1),
            Err(CoreError::UnknownPlugin("Nope.esp".to_string()))
        );
    }

    #[test]
    fn test_dynamic_has_no_plugin() {
        let order = sample();
        assert_eq!(order.plugin_of(FormId::new(0xFF00_0001)), None);
    }

    #[test]
    fn test_duplicate_add_is_stable() {
        let mut order = sample();
        let again = order.add_plugin("SKYRIM.ESM", false).unwrap();
        assert_eq!(again, PluginIndex::Full(0));
        assert_eq!(order.len(), 4);
    }
}
