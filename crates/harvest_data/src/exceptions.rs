//! Known per-load-order exceptions
//!
//! Content-specific overrides (containers to never touch, containers to
//! treat as lootable, forms whose type the generic rules get wrong) live in
//! a TOML table rather than in code:
//!
//! ```toml
//! [[exception]]
//! plugin = "SomeMod.esp"
//! form = "0x00012AB4"
//! action = "block"
//!
//! [[exception]]
//! plugin = "SomeMod.esp"
//! form = "0x00012AB5"
//! action = "objectType"
//! objectType = "container"
//! ```
//!
//! Exceptions are applied after every generic rule and override them.

use std::path::Path;

use harvest_core::{FormId, FormStore, ObjectType};
use serde::{Deserialize, Serialize};

use crate::blocking::BlockReason;
use crate::data_case::DataCase;
use crate::error::{DataError, DataResult};

/// What an exception does to its form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExceptionAction {
    /// Never loot
    Block,
    /// Lift any permanent block, optionally forcing a type
    Include,
    /// Force the given object type
    ObjectType,
}

/// One exception row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionEntry {
    pub plugin: String,
    /// Plugin-local form ID in hex
    pub form: String,
    pub action: ExceptionAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<ObjectType>,
}

impl ExceptionEntry {
    /// Create an entry
    pub fn new(plugin: impl Into<String>, local: u32, action: ExceptionAction) -> Self {
        Self {
            plugin: plugin.into(),
            form: format!("{:08X}", local),
            action,
            object_type: None,
        }
    }

    /// Attach an object type
    pub fn with_object_type(mut self, object_type: ObjectType) -> Self {
        self.object_type = Some(object_type);
        self
    }

    /// Resolve against the current load order
    pub fn resolve(&self, store: &dyn FormStore) -> Option<FormId> {
        let local = FormId::parse_hex(&self.form)?;
        store.load_order().form_id(&self.plugin, local.local_id()).ok()
    }
}

/// Table of exceptions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionTable {
    #[serde(default, rename = "exception")]
    entries: Vec<ExceptionEntry>,
}

impl ExceptionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    pub fn with_entry(mut self, entry: ExceptionEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> DataResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file
    pub fn load(path: impl AsRef<Path>) -> DataResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_toml_str(&text)?;
        log::info!("Loaded {} exceptions from {}", table.len(), path.display());
        Ok(table)
    }

    /// Append another table's entries
    pub fn merge(&mut self, other: ExceptionTable) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[ExceptionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every entry whose plugin is loaded. Returns the number applied.
    pub fn apply(&self, data: &DataCase, store: &dyn FormStore) -> usize {
        let mut applied = 0;
        for entry in &self.entries {
            let Some(id) = entry.resolve(store) else {
                log::debug!("Exception {}:{} not in load order", entry.plugin, entry.form);
                continue;
            };
            let done = match entry.action {
                ExceptionAction::Block => data.block_form_permanently(id, BlockReason::Exception),
                ExceptionAction::Include => {
                    data.unblock_form_permanently(id);
                    match entry.object_type {
                        Some(object_type) => data.force_object_type_for_form(id, object_type),
                        None => true,
                    }
                }
                ExceptionAction::ObjectType => match entry.object_type {
                    Some(object_type) => data.force_object_type_for_form(id, object_type),
                    None => {
                        log::warn!("Exception {}:{} has no objectType", entry.plugin, entry.form);
                        false
                    }
                },
            };
            if done {
                applied += 1;
            }
        }
        applied
    }
}
