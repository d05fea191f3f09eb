//! Leveled list resolution

use std::collections::HashSet;

use harvest_core::{Form, FormData, FormId, FormStore, FormType};

/// Depth-first walk of a leveled list down to its first concrete item.
///
/// Nested lists are expanded at most once; a list that refers back to
/// itself (directly or through others) is skipped on the second visit.
pub struct LeveledItemCategorizer<'a> {
    store: &'a dyn FormStore,
    root: FormId,
    seen: HashSet<FormId>,
}

impl<'a> LeveledItemCategorizer<'a> {
    /// Create a walker for one leveled list
    pub fn new(store: &'a dyn FormStore, root: FormId) -> Self {
        Self {
            store,
            root,
            seen: HashSet::new(),
        }
    }

    /// First leaf accepted by `accept`, if any
    pub fn categorize<F>(&mut self, mut accept: F) -> Option<FormId>
    where
        F: FnMut(&Form) -> bool,
    {
        self.seen.clear();
        self.seen.insert(self.root);
        self.process_contents_at_level(self.root, &mut accept)
    }

    /// Leveled lists visited by the last walk
    pub fn visited(&self) -> usize {
        self.seen.len()
    }

    fn process_contents_at_level<F>(&mut self, list: FormId, accept: &mut F) -> Option<FormId>
    where
        F: FnMut(&Form) -> bool,
    {
        let form = self.store.lookup_form(list)?;
        let FormData::LeveledItem { entries } = &form.data else {
            return None;
        };
        for entry in entries {
            let Some(item) = self.store.lookup_form(entry.form) else {
                continue;
            };
            if item.form_type == FormType::LeveledItem {
                if !self.seen.insert(item.id) {
                    log::debug!("Leveled list {} revisits {}", list, item.id);
                    continue;
                }
                if let Some(leaf) = self.process_contents_at_level(item.id, accept) {
                    return Some(leaf);
                }
            } else if accept(&item) {
                return Some(item.id);
            }
        }
        None
    }
}
