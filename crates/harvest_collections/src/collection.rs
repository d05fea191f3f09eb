//! A single collection
//!
//! Membership is the union of the rule's static members and every form the
//! rule has matched since. Membership checks never re-run the rule.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use harvest_conditions::{ConditionMatcher, ConditionTree, Scope};
use harvest_core::{FormId, ObjectType, Translations};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::definition::CollectionDefinition;
use crate::policy::CollectionPolicy;

/// Translation key for the "new member" message
pub const COLLECTION_ADDED_KEY: &str = "$HARVEST_COLLECTION_ADDED";
/// Fallback for [`COLLECTION_ADDED_KEY`]: item name, then collection name
pub const COLLECTION_ADDED_TEXT: &str = "{} added to {}";

/// How a collection recognizes members
#[derive(Debug, Clone)]
pub enum CollectionFilter {
    /// Condition tree from `rootFilter`
    Tree(ConditionTree),
    /// Object types from `category`
    Category(Vec<ObjectType>),
}

impl CollectionFilter {
    /// Test a candidate
    pub fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        match self {
            CollectionFilter::Tree(tree) => tree.evaluate(matcher),
            CollectionFilter::Category(categories) => categories.contains(&matcher.object_type()),
        }
    }

    fn static_members(&self) -> HashSet<FormId> {
        match self {
            CollectionFilter::Tree(tree) => tree.static_members(),
            CollectionFilter::Category(_) => HashSet::new(),
        }
    }

    fn required_scopes(&self) -> Option<HashSet<Scope>> {
        match self {
            CollectionFilter::Tree(tree) => tree.required_scopes(),
            CollectionFilter::Category(_) => None,
        }
    }

    fn has_scope_condition(&self) -> bool {
        match self {
            CollectionFilter::Tree(tree) => tree.has_scope_condition(),
            CollectionFilter::Category(_) => false,
        }
    }
}

/// First sighting of a member
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    /// The item instance, `NONE` when it was a runtime-created reference
    pub item: FormId,
    /// Base form
    pub form: FormId,
    /// In-game days since the start of the game
    pub game_time: f32,
    /// Where it was found
    pub place: FormId,
}

#[derive(Debug, Default)]
struct CollectionState {
    members: HashSet<FormId>,
    observed: BTreeMap<FormId, ObservationRecord>,
}

/// A named set of items and its sightings
#[derive(Debug)]
pub struct Collection {
    name: String,
    description: String,
    policy: CollectionPolicy,
    overrides_group: bool,
    filter: CollectionFilter,
    scopes: Option<HashSet<Scope>>,
    /// Rule looks at scope, so membership alone does not settle a sighting
    scoped: bool,
    static_members: HashSet<FormId>,
    state: Mutex<CollectionState>,
}

impl Collection {
    /// Create a collection seeded with its rule's static members
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        policy: CollectionPolicy,
        overrides_group: bool,
        filter: CollectionFilter,
    ) -> Self {
        let static_members: HashSet<FormId> = filter
            .static_members()
            .into_iter()
            .filter(|id| !id.is_dynamic())
            .collect();
        let scopes = filter.required_scopes();
        let scoped = filter.has_scope_condition();
        Self {
            name: name.into(),
            description: description.into(),
            policy,
            overrides_group,
            filter,
            scopes,
            scoped,
            state: Mutex::new(CollectionState {
                members: static_members.clone(),
                observed: BTreeMap::new(),
            }),
            static_members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn policy(&self) -> &CollectionPolicy {
        &self.policy
    }

    /// Policy came from the collection rather than the group
    pub fn overrides_group(&self) -> bool {
        self.overrides_group
    }

    pub fn filter(&self) -> &CollectionFilter {
        &self.filter
    }

    /// Scopes a sighting must come from; `None` allows any
    pub fn scopes(&self) -> Option<&HashSet<Scope>> {
        self.scopes.as_ref()
    }

    /// Replace the policy
    pub fn set_policy(&mut self, policy: CollectionPolicy) {
        self.policy = policy;
    }

    /// Set lookup; never re-runs the rule
    pub fn is_member_of(&self, form: FormId) -> bool {
        self.state.lock().members.contains(&form)
    }

    /// Run the rule; a match becomes a member
    pub fn matches_filter(&self, matcher: &ConditionMatcher<'_>) -> bool {
        if !self.filter.evaluate(matcher) {
            return false;
        }
        self.add_member_id(matcher.target().id);
        true
    }

    /// Add a member. Runtime-created forms are refused.
    pub fn add_member_id(&self, form: FormId) -> bool {
        if form.is_none() || form.is_dynamic() {
            log::debug!("Collection {} ignoring dynamic form {}", self.name, form);
            return false;
        }
        self.state.lock().members.insert(form);
        true
    }

    /// Scope allowed, not yet seen (or repeats allowed), and a member
    pub fn in_scope_and_collectible_for(&self, matcher: &ConditionMatcher<'_>) -> bool {
        self.is_collectible_for(matcher, false)
    }

    /// As [`in_scope_and_collectible_for`](Self::in_scope_and_collectible_for),
    /// optionally ignoring earlier sightings
    pub fn is_collectible_for(&self, matcher: &ConditionMatcher<'_>, ignore_observed: bool) -> bool {
        if let Some(scopes) = &self.scopes {
            match matcher.resolve_scope() {
                Some(scope) if scopes.contains(&scope) => {}
                _ => return false,
            }
        }
        if self.scoped && !matcher.is_membership_probe() && !self.filter.evaluate(matcher) {
            return false;
        }
        let form = matcher.target().id;
        let state = self.state.lock();
        if !ignore_observed && !self.policy.repeat && state.observed.contains_key(&form) {
            return false;
        }
        state.members.contains(&form)
    }

    /// Whether a member has been seen
    pub fn is_observed(&self, form: FormId) -> bool {
        self.state.lock().observed.contains_key(&form)
    }

    /// Record the first sighting of a member. Returns false when it was
    /// already recorded or is a runtime-created form.
    pub fn record_item(&self, item: FormId, form: FormId, game_time: f32, place: FormId) -> bool {
        if form.is_none() || form.is_dynamic() {
            return false;
        }
        let mut state = self.state.lock();
        if state.observed.contains_key(&form) {
            return false;
        }
        let record = ObservationRecord {
            item: if item.is_dynamic() { FormId::NONE } else { item },
            form,
            game_time,
            place: if place.is_dynamic() { FormId::NONE } else { place },
        };
        state.observed.insert(form, record);
        log::debug!("Collection {} recorded {}", self.name, form);
        true
    }

    pub fn observation(&self, form: FormId) -> Option<ObservationRecord> {
        self.state.lock().observed.get(&form).copied()
    }

    /// Members in ID order
    pub fn members(&self) -> Vec<FormId> {
        let state = self.state.lock();
        let sorted: BTreeSet<FormId> = state.members.iter().copied().collect();
        sorted.into_iter().collect()
    }

    /// Members found by the rule after construction
    pub fn discovered_members(&self) -> Vec<FormId> {
        self.members()
            .into_iter()
            .filter(|id| !self.static_members.contains(id))
            .collect()
    }

    pub fn member_count(&self) -> usize {
        self.state.lock().members.len()
    }

    /// Sightings in form order
    pub fn observed(&self) -> Vec<ObservationRecord> {
        self.state.lock().observed.values().copied().collect()
    }

    pub fn observed_count(&self) -> usize {
        self.state.lock().observed.len()
    }

    /// Reinstate saved members and sightings
    pub fn restore<M, O>(&self, members: M, observed: O)
    where
        M: IntoIterator<Item = FormId>,
        O: IntoIterator<Item = ObservationRecord>,
    {
        let mut state = self.state.lock();
        state
            .members
            .extend(members.into_iter().filter(|id| !id.is_none() && !id.is_dynamic()));
        for record in observed {
            if record.form.is_none() || record.form.is_dynamic() {
                continue;
            }
            state.observed.entry(record.form).or_insert(record);
        }
    }

    /// Forget sightings and discovered members
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.observed.clear();
        state.members = self.static_members.clone();
    }

    /// Message shown when a member is first recorded
    pub fn notification_text(&self, item_name: &str, translations: &Translations) -> String {
        let template = translations.get_or(COLLECTION_ADDED_KEY, COLLECTION_ADDED_TEXT);
        Translations::format(template, &[item_name, &self.name])
    }

    /// Definition that rebuilds this collection
    pub fn to_definition(&self) -> CollectionDefinition {
        let (root_filter, category) = match &self.filter {
            CollectionFilter::Tree(tree) => (Some(tree.to_json()), None),
            CollectionFilter::Category(categories) => (
                None,
                Some(categories.iter().map(|c| c.name().to_string()).collect()),
            ),
        };
        CollectionDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            policy: self.overrides_group.then_some(self.policy),
            root_filter,
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_conditions::{Condition, Operator, SignatureCondition};
    use harvest_core::{Form, FormType};

    fn weapons(policy: CollectionPolicy) -> Collection {
        let tree = ConditionTree::new(Operator::Or)
            .with_condition(Condition::Signature(SignatureCondition::new(["WEAP"])));
        Collection::new("Weapons", "", policy, false, CollectionFilter::Tree(tree))
    }

    #[test]
    fn test_matches_filter_adds_member() {
        let collection = weapons(CollectionPolicy::default());
        let sword = Form::new(FormId::new(0x10), FormType::Weapon);
        let ruby = Form::new(FormId::new(0x11), FormType::Misc);

        assert!(!collection.is_member_of(sword.id));
        assert!(collection.matches_filter(&ConditionMatcher::new(&sword)));
        assert!(collection.is_member_of(sword.id));
        assert!(!collection.matches_filter(&ConditionMatcher::new(&ruby)));
        assert_eq!(collection.discovered_members(), vec![sword.id]);
    }

    #[test]
    fn test_dynamic_forms_never_join() {
        let collection = weapons(CollectionPolicy::default());
        let forged = Form::new(FormId::new(0xFF00_0010), FormType::Weapon);

        assert!(collection.matches_filter(&ConditionMatcher::new(&forged)));
        assert!(!collection.is_member_of(forged.id));
        assert!(!collection.record_item(forged.id, forged.id, 1.0, FormId::NONE));
        assert_eq!(collection.observed_count(), 0);
    }

    #[test]
    fn test_record_once() {
        let collection = weapons(CollectionPolicy::default());
        let sword = FormId::new(0x10);
        collection.add_member_id(sword);

        assert!(collection.record_item(FormId::new(0xFF00_0001), sword, 2.5, FormId::new(0x3C)));
        assert!(!collection.record_item(FormId::new(0x0001_0000), sword, 9.0, FormId::NONE));

        let record = collection.observation(sword).unwrap();
        assert_eq!(record.item, FormId::NONE);
        assert_eq!(record.game_time, 2.5);
    }

    #[test]
    fn test_repeat_policy() {
        let sword = Form::new(FormId::new(0x10), FormType::Weapon);
        let once = weapons(CollectionPolicy::default());
        let repeat = weapons(CollectionPolicy {
            repeat: true,
            ..CollectionPolicy::default()
        });
        for collection in [&once, &repeat] {
            collection.add_member_id(sword.id);
            collection.record_item(sword.id, sword.id, 0.0, FormId::NONE);
        }

        let matcher = ConditionMatcher::new(&sword);
        assert!(!once.in_scope_and_collectible_for(&matcher));
        assert!(once.is_collectible_for(&matcher, true));
        assert!(repeat.in_scope_and_collectible_for(&matcher));
    }

    #[test]
    fn test_scope_gate() {
        let tree = ConditionTree::parse(
            &serde_json::json!({"operator": "AND", "condition": {"scope": ["deadBody"], "signature": ["WEAP"]}}),
            &harvest_core::MemoryFormStore::default(),
        )
        .unwrap();
        let collection = Collection::new("Trophies", "", CollectionPolicy::default(), false, CollectionFilter::Tree(tree));
        let sword = Form::new(FormId::new(0x10), FormType::Weapon);
        collection.add_member_id(sword.id);

        let on_body = ConditionMatcher::new(&sword).found_in(Scope::DeadBody);
        let loose = ConditionMatcher::new(&sword).found_in(Scope::LooseItem);
        let unknown = ConditionMatcher::new(&sword);
        assert!(collection.in_scope_and_collectible_for(&on_body));
        assert!(!collection.in_scope_and_collectible_for(&loose));
        assert!(!collection.in_scope_and_collectible_for(&unknown));
    }

    #[test]
    fn test_nested_scope_gate() {
        let tree = ConditionTree::parse(
            &serde_json::json!({"operator": "AND", "condition": {"subFilter": [
                {"operator": "AND", "condition": {"scope": ["deadBody"], "signature": ["WEAP"]}}
            ]}}),
            &harvest_core::MemoryFormStore::default(),
        )
        .unwrap();
        let collection = Collection::new("Trophies", "", CollectionPolicy::default(), false, CollectionFilter::Tree(tree));
        let sword = Form::new(FormId::new(0x10), FormType::Weapon);
        collection.add_member_id(sword.id);

        let on_body = ConditionMatcher::new(&sword).found_in(Scope::DeadBody);
        let loose = ConditionMatcher::new(&sword).found_in(Scope::LooseItem);
        assert!(collection.in_scope_and_collectible_for(&on_body));
        assert!(!collection.in_scope_and_collectible_for(&loose));
    }

    #[test]
    fn test_scope_under_or_checked_per_branch() {
        let tree = ConditionTree::parse(
            &serde_json::json!({"operator": "OR", "condition": {"subFilter": [
                {"operator": "AND", "condition": {"scope": ["deadBody"], "signature": ["WEAP"]}},
                {"operator": "AND", "condition": {"scope": ["container"], "signature": ["ARMO"]}}
            ]}}),
            &harvest_core::MemoryFormStore::default(),
        )
        .unwrap();
        let collection = Collection::new("Spoils", "", CollectionPolicy::default(), false, CollectionFilter::Tree(tree));
        let sword = Form::new(FormId::new(0x10), FormType::Weapon);
        collection.add_member_id(sword.id);

        // container is allowed by the other branch only
        let in_chest = ConditionMatcher::new(&sword).found_in(Scope::Container);
        let on_body = ConditionMatcher::new(&sword).found_in(Scope::DeadBody);
        assert!(!collection.in_scope_and_collectible_for(&in_chest));
        assert!(collection.in_scope_and_collectible_for(&on_body));
    }

    #[test]
    fn test_reset_keeps_static_members() {
        let tree = ConditionTree::parse(
            &serde_json::json!({"operator": "OR", "condition": {"forms": [{"plugin": "Skyrim.esm", "form": ["00000020"]}]}}),
            &harvest_core::MemoryFormStore::new(harvest_core::LoadOrder::from_names(["Skyrim.esm"]).unwrap())
                .with_form(Form::new(FormId::new(0x20), FormType::Misc)),
        )
        .unwrap();
        let collection = Collection::new("Static", "", CollectionPolicy::default(), false, CollectionFilter::Tree(tree));
        collection.add_member_id(FormId::new(0x21));
        collection.record_item(FormId::NONE, FormId::new(0x20), 1.0, FormId::NONE);

        collection.reset();
        assert_eq!(collection.members(), vec![FormId::new(0x20)]);
        assert_eq!(collection.observed_count(), 0);
    }

    #[test]
    fn test_notification_text() {
        let collection = weapons(CollectionPolicy::default());
        let english = collection.notification_text("Iron Sword", &Translations::new());
        assert_eq!(english, "Iron Sword added to Weapons");

        let custom = Translations::from_pairs([(COLLECTION_ADDED_KEY, "{} -> {}")]);
        assert_eq!(collection.notification_text("Iron Sword", &custom), "Iron Sword -> Weapons");
    }
}
