//! Condition predicates
//!
//! Each predicate is built once from its JSON fragment at data load and is
//! immutable afterwards. Evaluation is a pure function of the matcher, with
//! one exception: [`ScopeCondition`] back-fills the matcher's scope.

use std::collections::HashSet;

use harvest_core::{FormData, FormId, FormStore, FormType, ObjectType, PluginIndex};
use serde_json::{json, Value};

use crate::error::{ConditionError, ConditionResult};
use crate::matcher::{ConditionMatcher, Scope};
use crate::tree::ConditionTree;

/// Record signatures a signature condition may name
pub const SIGNATURES: [&str; 8] = ["ALCH", "ARMO", "BOOK", "INGR", "KEYM", "MISC", "SLGM", "WEAP"];

/// A single node in a condition tree
#[derive(Debug, Clone)]
pub enum Condition {
    Plugin(PluginCondition),
    FormList(FormListCondition),
    Forms(FormsCondition),
    Keyword(KeywordCondition),
    Signature(SignatureCondition),
    Scope(ScopeCondition),
    Category(CategoryCondition),
    NameMatch(NameMatchCondition),
    /// Nested `subFilter`
    Tree(ConditionTree),
}

/// How a condition lands in the serialized `condition` object
pub(crate) enum Fragment {
    /// One element of a keyed array (`subFilter`, `formList`, `forms`)
    Element(&'static str, Value),
    /// The whole value of a key
    Whole(&'static str, Value),
}

impl Condition {
    /// Test a candidate
    pub fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        match self {
            Condition::Plugin(c) => c.evaluate(matcher),
            Condition::FormList(c) => c.evaluate(matcher),
            Condition::Forms(c) => c.evaluate(matcher),
            Condition::Keyword(c) => c.evaluate(matcher),
            Condition::Signature(c) => c.evaluate(matcher),
            Condition::Scope(c) => c.evaluate(matcher),
            Condition::Category(c) => c.evaluate(matcher),
            Condition::NameMatch(c) => c.evaluate(matcher),
            Condition::Tree(tree) => tree.evaluate(matcher),
        }
    }

    /// Forms known to match without any world scan
    pub fn static_members(&self) -> HashSet<FormId> {
        match self {
            Condition::Forms(c) => c.members.clone(),
            Condition::Tree(tree) => tree.static_members(),
            _ => HashSet::new(),
        }
    }

    pub(crate) fn fragment(&self) -> Fragment {
        match self {
            Condition::Plugin(c) => Fragment::Whole("plugin", json!(c.names)),
            Condition::FormList(c) => Fragment::Element(
                "formList",
                json!({ "listPlugin": c.plugin, "formID": format!("{:08X}", c.local_id) }),
            ),
            Condition::Forms(c) => {
                let forms: Vec<String> = c.local_ids.iter().map(|id| format!("{:08X}", id)).collect();
                Fragment::Element("forms", json!({ "plugin": c.plugin, "form": forms }))
            }
            Condition::Keyword(c) => Fragment::Whole("keyword", json!(c.names)),
            Condition::Signature(c) => {
                let signatures: Vec<&str> = c.form_types.iter().map(|t| t.signature()).collect();
                Fragment::Whole("signature", json!(signatures))
            }
            Condition::Scope(c) => {
                let scopes: Vec<&str> = c.scopes.iter().map(|s| s.name()).collect();
                Fragment::Whole("scope", json!(scopes))
            }
            Condition::Category(c) => {
                let names: Vec<&str> = c.categories.iter().map(|t| t.name()).collect();
                Fragment::Whole("category", json!(names))
            }
            Condition::NameMatch(c) => Fragment::Whole(
                "nameMatch",
                json!({ "isNPC": c.is_npc, "matchIf": c.match_if.name(), "names": c.names }),
            ),
            Condition::Tree(tree) => Fragment::Element("subFilter", tree.to_json()),
        }
    }
}

/// Candidate comes from one of a set of plugins
#[derive(Debug, Clone)]
pub struct PluginCondition {
    names: Vec<String>,
    indices: Vec<PluginIndex>,
}

impl PluginCondition {
    /// Build from plugin names. Fails on the first plugin not in the load order.
    pub fn new<I, S>(names: I, store: &dyn FormStore) -> ConditionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut condition = Self {
            names: Vec::new(),
            indices: Vec::new(),
        };
        for name in names {
            let name = name.into();
            let index = store
                .load_order()
                .index_of(&name)
                .ok_or_else(|| ConditionError::Plugin { name: name.clone() })?;
            condition.indices.push(index);
            condition.names.push(name);
        }
        Ok(condition)
    }

    /// Configured plugin names
    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        let id = matcher.target().id;
        self.indices.iter().any(|index| index.owns(id))
    }
}

/// Candidate is in a (recursively flattened) form list
#[derive(Debug, Clone)]
pub struct FormListCondition {
    plugin: String,
    local_id: u32,
    members: HashSet<FormId>,
}

impl FormListCondition {
    /// Build from a plugin-qualified form list. An unresolvable list logs and
    /// yields a condition that never matches.
    pub fn new(plugin: impl Into<String>, local_id: u32, store: &dyn FormStore) -> Self {
        let plugin = plugin.into();
        let mut members = HashSet::new();

        match store.lookup_in_plugin(&plugin, local_id) {
            Some(list) if list.form_type == FormType::FormList => {
                let mut visited = HashSet::new();
                flatten_form_list(list.id, store, &mut members, &mut visited);
            }
            Some(other) => {
                log::warn!(
                    "{}:{:08X} is a {} record, not a form list",
                    plugin,
                    local_id,
                    other.form_type.signature()
                );
            }
            None => {
                log::warn!("Form list {}:{:08X} not found in load order", plugin, local_id);
            }
        }

        Self {
            plugin,
            local_id,
            members,
        }
    }

    /// Owning plugin of the list
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Flattened list membership, each form once
    pub fn static_members(&self) -> &HashSet<FormId> {
        &self.members
    }

    fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        self.members.contains(&matcher.target().id)
    }
}

/// Expand a form list into `members`. Lists already in `visited` are skipped,
/// so self-referencing content terminates.
fn flatten_form_list(
    list_id: FormId,
    store: &dyn FormStore,
    members: &mut HashSet<FormId>,
    visited: &mut HashSet<FormId>,
) {
    if !visited.insert(list_id) {
        log::debug!("Form list {} already expanded, skipping cycle", list_id);
        return;
    }
    let Some(list) = store.lookup_form(list_id) else {
        return;
    };
    let FormData::FormList { entries } = &list.data else {
        return;
    };
    for entry in entries {
        match store.lookup_form(*entry) {
            Some(form) if form.form_type == FormType::FormList => {
                flatten_form_list(form.id, store, members, visited);
            }
            Some(form) => {
                members.insert(form.id);
            }
            None => log::debug!("Form list {} references missing form {}", list_id, entry),
        }
    }
}

/// Candidate is one of an explicit set of forms
#[derive(Debug, Clone)]
pub struct FormsCondition {
    plugin: String,
    local_ids: Vec<u32>,
    members: HashSet<FormId>,
}

impl FormsCondition {
    /// Build from plugin-local IDs. Unresolvable forms are logged and skipped.
    pub fn new(plugin: impl Into<String>, local_ids: Vec<u32>, store: &dyn FormStore) -> Self {
        let plugin = plugin.into();
        let mut members = HashSet::new();

        if !store.load_order().contains(&plugin) {
            log::info!("Plugin {} not loaded, {} forms ignored", plugin, local_ids.len());
        } else {
            for local in &local_ids {
                match store.lookup_in_plugin(&plugin, *local) {
                    Some(form) => {
                        members.insert(form.id);
                    }
                    None => log::warn!("Form {}:{:08X} not found", plugin, local),
                }
            }
        }

        Self {
            plugin,
            local_ids,
            members,
        }
    }

    /// Resolved forms
    pub fn members(&self) -> &HashSet<FormId> {
        &self.members
    }

    fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        self.members.contains(&matcher.target().id)
    }
}

/// Candidate carries any of a set of keywords
#[derive(Debug, Clone)]
pub struct KeywordCondition {
    names: Vec<String>,
    keywords: HashSet<FormId>,
}

impl KeywordCondition {
    /// Build from keyword editor IDs. Every loaded keyword is scanned once;
    /// the first requested name left unmatched is the error.
    pub fn new<I, S>(names: I, store: &dyn FormStore) -> ConditionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut unmatched: Vec<bool> = vec![true; names.len()];
        let mut keywords = HashSet::new();

        for keyword in store.forms_of_type(FormType::Keyword) {
            for (slot, name) in names.iter().enumerate() {
                if keyword.editor_id.eq_ignore_ascii_case(name) {
                    keywords.insert(keyword.id);
                    unmatched[slot] = false;
                }
            }
        }

        if let Some(slot) = unmatched.iter().position(|missing| *missing) {
            return Err(ConditionError::Keyword {
                name: names[slot].clone(),
            });
        }
        Ok(Self { names, keywords })
    }

    /// Configured keyword names
    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        matcher
            .target()
            .keywords
            .iter()
            .any(|keyword| self.keywords.contains(keyword))
    }
}

/// Candidate's record type is in an allow-list
#[derive(Debug, Clone)]
pub struct SignatureCondition {
    form_types: Vec<FormType>,
}

impl SignatureCondition {
    /// Build from signature tokens; unrecognized tokens are dropped
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut form_types = Vec::new();
        for signature in signatures {
            let signature = signature.as_ref();
            let allowed = SIGNATURES.iter().any(|s| s.eq_ignore_ascii_case(signature));
            match FormType::from_signature(signature).filter(|_| allowed) {
                Some(form_type) if !form_types.contains(&form_type) => form_types.push(form_type),
                Some(_) => {}
                None => log::debug!("Dropping unsupported signature {}", signature),
            }
        }
        Self { form_types }
    }

    /// Accepted record types
    pub fn form_types(&self) -> &[FormType] {
        &self.form_types
    }

    fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        self.form_types.contains(&matcher.target().form_type)
    }
}

/// Evaluation scope is in a set
#[derive(Debug, Clone)]
pub struct ScopeCondition {
    scopes: Vec<Scope>,
}

impl ScopeCondition {
    /// Build from scope tokens; unrecognized tokens are dropped
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scopes = Vec::new();
        for token in tokens {
            match Scope::from_name(token.as_ref()) {
                Some(scope) if !scopes.contains(&scope) => scopes.push(scope),
                Some(_) => {}
                None => log::debug!("Dropping unknown scope {}", token.as_ref()),
            }
        }
        Self { scopes }
    }

    /// Accepted scopes
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        match matcher.resolve_scope() {
            Some(scope) => self.scopes.contains(&scope),
            None => matcher.is_membership_probe(),
        }
    }
}

/// Candidate's resolved object type is in a set
#[derive(Debug, Clone)]
pub struct CategoryCondition {
    categories: Vec<ObjectType>,
}

impl CategoryCondition {
    /// Build from object type names; unrecognized names are dropped
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories = Vec::new();
        for name in names {
            match ObjectType::from_name(name.as_ref()) {
                ObjectType::Unknown => log::debug!("Dropping unknown category {}", name.as_ref()),
                category if !categories.contains(&category) => categories.push(category),
                _ => {}
            }
        }
        Self { categories }
    }

    /// Accepted categories
    pub fn categories(&self) -> &[ObjectType] {
        &self.categories
    }

    fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        self.categories.contains(&matcher.object_type())
    }
}

/// How a name is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchIf {
    Equals,
    StartsWith,
    Contains,
    /// None of the names occur
    Omits,
}

impl MatchIf {
    /// Definition token
    pub fn name(&self) -> &'static str {
        match self {
            MatchIf::Equals => "equals",
            MatchIf::StartsWith => "startsWith",
            MatchIf::Contains => "contains",
            MatchIf::Omits => "omits",
        }
    }

    /// Parse a definition token
    pub fn from_name(name: &str) -> Option<MatchIf> {
        [MatchIf::Equals, MatchIf::StartsWith, MatchIf::Contains, MatchIf::Omits]
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

/// Candidate (or its holder) name matches a substring rule
#[derive(Debug, Clone)]
pub struct NameMatchCondition {
    is_npc: bool,
    match_if: MatchIf,
    names: Vec<String>,
    lowered: Vec<String>,
}

impl NameMatchCondition {
    /// Create a name rule
    pub fn new(is_npc: bool, match_if: MatchIf, names: Vec<String>) -> Self {
        let lowered = names.iter().map(|n| n.to_lowercase()).collect();
        Self {
            is_npc,
            match_if,
            names,
            lowered,
        }
    }

    fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        let subject = if self.is_npc {
            matcher.owner_name()
        } else {
            Some(matcher.target().name.as_str())
        };
        let Some(subject) = subject else {
            return false;
        };
        let subject = subject.to_lowercase();
        match self.match_if {
            MatchIf::Equals => self.lowered.iter().any(|n| subject == *n),
            MatchIf::StartsWith => self.lowered.iter().any(|n| subject.starts_with(n.as_str())),
            MatchIf::Contains => self.lowered.iter().any(|n| subject.contains(n.as_str())),
            MatchIf::Omits => !self.lowered.iter().any(|n| subject.contains(n.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::{Form, LoadOrder, MemoryFormStore};

    fn store() -> MemoryFormStore {
        let order = LoadOrder::from_names(["Skyrim.esm", "Mod.esp"]).unwrap();
        MemoryFormStore::new(order)
            .with_form(Form::new(FormId::new(0x100), FormType::Keyword).with_editor_id("VendorItemGem"))
            .with_form(Form::new(FormId::new(0x101), FormType::Keyword).with_editor_id("VendorItemOreIngot"))
            .with_form(
                Form::new(FormId::new(0x200), FormType::Misc)
                    .with_name("Flawless Ruby")
                    .with_keyword(FormId::new(0x100)),
            )
            .with_form(Form::new(FormId::new(0x0100_0800), FormType::Weapon).with_name("Mod Sword"))
    }

    #[test]
    fn test_plugin_condition() {
        let store = store();
        let condition = PluginCondition::new(["Mod.esp"], &store).unwrap();
        let sword = store.lookup_form(FormId::new(0x0100_0800)).unwrap();
        let ruby = store.lookup_form(FormId::new(0x200)).unwrap();

        assert!(condition.evaluate(&ConditionMatcher::new(&sword)));
        assert!(!condition.evaluate(&ConditionMatcher::new(&ruby)));
    }

    #[test]
    fn test_plugin_condition_missing_plugin() {
        let store = store();
        let err = PluginCondition::new(["Mod.esp", "Gone.esp"], &store).unwrap_err();
        assert!(matches!(err, ConditionError::Plugin { ref name } if name == "Gone.esp"));
        assert!(err.to_string().contains("Gone.esp"));
    }

    #[test]
    fn test_keyword_condition() {
        let store = store();
        let condition = KeywordCondition::new(["vendoritemgem"], &store).unwrap();
        let ruby = store.lookup_form(FormId::new(0x200)).unwrap();
        assert!(condition.evaluate(&ConditionMatcher::new(&ruby)));
    }

    #[test]
    fn test_keyword_condition_reports_first_unmatched() {
        let store = store();
        let err = KeywordCondition::new(["VendorItemGem", "NoSuchA", "NoSuchB"], &store).unwrap_err();
        assert!(matches!(err, ConditionError::Keyword { ref name } if name == "NoSuchA"));
    }

    #[test]
    fn test_signature_drops_unknown() {
        let condition = SignatureCondition::new(["WEAP", "LVLI", "bogus", "weap"]);
        assert_eq!(condition.form_types(), &[FormType::Weapon]);
    }

    #[test]
    fn test_forms_condition_soft_failure() {
        let store = store();
        let missing_plugin = FormsCondition::new("Gone.esp", vec![0x800], &store);
        assert!(missing_plugin.members().is_empty());

        let partial = FormsCondition::new("Mod.esp", vec![0x800, 0x999], &store);
        assert_eq!(partial.members().len(), 1);
    }

    #[test]
    fn test_scope_condition_backfills() {
        let store = store();
        let ruby = store.lookup_form(FormId::new(0x200)).unwrap();
        let condition = ScopeCondition::new(["container", "nonsense"]);
        assert_eq!(condition.scopes(), &[Scope::Container]);

        let matcher = ConditionMatcher::new(&ruby).found_in(Scope::Container);
        assert!(condition.evaluate(&matcher));
        assert_eq!(matcher.scope(), Some(Scope::Container));

        let loose = ConditionMatcher::new(&ruby).found_in(Scope::LooseItem);
        assert!(!condition.evaluate(&loose));

        let nowhere = ConditionMatcher::new(&ruby);
        assert!(!condition.evaluate(&nowhere));
    }

    #[test]
    fn test_category_condition() {
        let store = store();
        let ruby = store.lookup_form(FormId::new(0x200)).unwrap();
        let condition = CategoryCondition::new(["gem", "notACategory"]);
        assert_eq!(condition.categories(), &[ObjectType::Gem]);

        assert!(condition.evaluate(&ConditionMatcher::new(&ruby).with_object_type(ObjectType::Gem)));
        assert!(!condition.evaluate(&ConditionMatcher::new(&ruby).with_object_type(ObjectType::Clutter)));
    }

    #[test]
    fn test_name_match() {
        let store = store();
        let ruby = store.lookup_form(FormId::new(0x200)).unwrap();
        let names = vec!["ruby".to_string()];

        let contains = NameMatchCondition::new(false, MatchIf::Contains, names.clone());
        assert!(contains.evaluate(&ConditionMatcher::new(&ruby)));

        let starts = NameMatchCondition::new(false, MatchIf::StartsWith, names.clone());
        assert!(!starts.evaluate(&ConditionMatcher::new(&ruby)));

        let omits = NameMatchCondition::new(false, MatchIf::Omits, names.clone());
        assert!(!omits.evaluate(&ConditionMatcher::new(&ruby)));

        let npc = NameMatchCondition::new(true, MatchIf::Equals, vec!["Draugr".to_string()]);
        assert!(!npc.evaluate(&ConditionMatcher::new(&ruby)));
        assert!(npc.evaluate(&ConditionMatcher::new(&ruby).with_owner_name("draugr")));
    }
}
