//! Form lookup interface
//!
//! [`FormStore`] is the whole of what the decision engine asks of the host's
//! object model: lookup by ID, enumerate by record kind, and the load order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::form::{Form, FormType};
use crate::form_id::FormId;
use crate::load_order::LoadOrder;

/// Read access to the host's loaded records
pub trait FormStore: Send + Sync {
    /// Active load order
    fn load_order(&self) -> &LoadOrder;

    /// Look up a form by runtime ID
    fn lookup_form(&self, id: FormId) -> Option<Arc<Form>>;

    /// Every loaded form of one kind, in load order
    fn forms_of_type(&self, form_type: FormType) -> Vec<Arc<Form>>;

    /// Owning plugin of a form
    fn plugin_of(&self, id: FormId) -> Option<&str> {
        self.load_order().plugin_of(id)
    }

    /// Resolve a plugin-qualified local ID to a loaded form
    fn lookup_in_plugin(&self, plugin: &str, local: u32) -> Option<Arc<Form>> {
        let id = self.load_order().form_id(plugin, local).ok()?;
        self.lookup_form(id)
    }
}

/// In-memory [`FormStore`]
///
/// Used by tests and by integrations that snapshot the host's records once
/// at data load.
#[derive(Debug, Default)]
pub struct MemoryFormStore {
    load_order: LoadOrder,
    forms: HashMap<FormId, Arc<Form>>,
    by_type: HashMap<FormType, Vec<FormId>>,
}

impl MemoryFormStore {
    /// Create an empty store over a load order
    pub fn new(load_order: LoadOrder) -> Self {
        Self {
            load_order,
            forms: HashMap::new(),
            by_type: HashMap::new(),
        }
    }

    /// Add a form, replacing any previous form with the same ID
    pub fn insert(&mut self, form: Form) -> Arc<Form> {
        let id = form.id;
        let form_type = form.form_type;
        let form = Arc::new(form);
        if let Some(previous) = self.forms.insert(id, form.clone()) {
            if let Some(ids) = self.by_type.get_mut(&previous.form_type) {
                ids.retain(|existing| *existing != id);
            }
        }
        self.by_type.entry(form_type).or_default().push(id);
        form
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_form(mut self, form: Form) -> Self {
        self.insert(form);
        self
    }

    /// Number of forms
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl FormStore for MemoryFormStore {
    fn load_order(&self) -> &LoadOrder {
        &self.load_order
    }

    fn lookup_form(&self, id: FormId) -> Option<Arc<Form>> {
        self.forms.get(&id).cloned()
    }

    fn forms_of_type(&self, form_type: FormType) -> Vec<Arc<Form>> {
        self.by_type
            .get(&form_type)
            .map(|ids| ids.iter().filter_map(|id| self.forms.get(id).cloned()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let order = LoadOrder::from_names(["Skyrim.esm"]).unwrap();
        let mut store = MemoryFormStore::new(order);
        store.insert(Form::new(FormId::new(0x12), FormType::Misc).with_name("Bowl"));
        store.insert(Form::new(FormId::new(0x13), FormType::Weapon));

        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup_form(FormId::new(0x12)).unwrap().name, "Bowl");
        assert_eq!(store.forms_of_type(FormType::Misc).len(), 1);
        assert_eq!(store.plugin_of(FormId::new(0x12)), Some("Skyrim.esm"));
        assert!(store.lookup_in_plugin("Skyrim.esm", 0x13).is_some());
    }

    #[test]
    fn test_replace_moves_type_index() {
        let mut store = MemoryFormStore::default();
        store.insert(Form::new(FormId::new(0x12), FormType::Misc));
        store.insert(Form::new(FormId::new(0x12), FormType::Key));

        assert!(store.forms_of_type(FormType::Misc).is_empty());
        assert_eq!(store.forms_of_type(FormType::Key).len(), 1);
    }
}
