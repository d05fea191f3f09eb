//! Loot decision for one candidate
//!
//! Checks run cheapest first: blacklist and block lists, locked container
//! aging, classification, producer resolution, collections, then
//! value/weight.

use std::sync::Arc;
use std::time::Instant;

use harvest_collections::{CollectibleHandling, CollectionManager};
use harvest_conditions::{ConditionMatcher, Scope};
use harvest_core::{Form, FormId, FormStore, ObjectType};
use harvest_data::{BlockReason, DataCase, LootableItem, ProducerLootable, ValueWeightSettings};

/// Why a candidate is left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Reference is on the session blacklist
    Blacklisted,
    /// Reference or form is blocked
    Blocked(BlockReason),
    /// Container is locked or was locked moments ago
    LockedContainer,
    /// No object type assigned
    Unclassified,
    /// Must be looted by hand
    ManualLoot,
    /// Dead actor whose base form is excluded
    ExcludedActor,
    /// Producer's lootable is still being resolved
    ProducerPending,
    /// Producer yields nothing
    NoLootable,
    /// Worth too little for its weight
    ValueWeight,
}

/// Outcome for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LootDecision {
    Skip(SkipReason),
    /// Take it
    Loot,
    /// Belongs to a collection
    Collect(CollectibleHandling),
    /// Leave it but highlight it
    Glow,
}

/// One reference found by the scan
#[derive(Debug, Clone)]
pub struct LootCandidate {
    /// The placed reference
    pub reference: FormId,
    /// Its base form
    pub form: Arc<Form>,
    /// Container or actor holding it, if any
    pub container: Option<FormId>,
    pub scope: Scope,
    /// Holding container is currently locked
    pub locked: bool,
}

impl LootCandidate {
    /// A loose item lying in the world
    pub fn loose(reference: FormId, form: Arc<Form>) -> Self {
        Self {
            reference,
            form,
            container: None,
            scope: Scope::LooseItem,
            locked: false,
        }
    }

    /// An item inside a container or on a body
    pub fn inside(mut self, container: FormId, scope: Scope, locked: bool) -> Self {
        self.container = Some(container);
        self.scope = scope;
        self.locked = locked;
        self
    }
}

/// Everything a decision reads
pub struct DecisionContext<'a> {
    pub store: &'a dyn FormStore,
    pub data: &'a DataCase,
    pub collections: &'a CollectionManager,
    pub settings: &'a ValueWeightSettings,
    /// Recorded collection members still count as collectible
    pub record_dups: bool,
}

impl<'a> DecisionContext<'a> {
    /// Decide what to do with a candidate at `now`
    pub fn decide(&self, candidate: &LootCandidate, now: Instant) -> LootDecision {
        if self.data.is_reference_blacklisted(candidate.reference) {
            return LootDecision::Skip(SkipReason::Blacklisted);
        }
        if let Some(reason) = self.data.reference_block_reason(candidate.reference) {
            return LootDecision::Skip(SkipReason::Blocked(reason));
        }
        if let Some(reason) = self.data.form_block_reason(candidate.form.id) {
            return LootDecision::Skip(SkipReason::Blocked(reason));
        }
        if let Some(container) = candidate.container {
            if self.data.is_reference_locked_container_at(container, candidate.locked, now) {
                return LootDecision::Skip(SkipReason::LockedContainer);
            }
        }

        let object_type = self.data.object_type_for_form(&candidate.form);
        match object_type {
            ObjectType::Unknown => return LootDecision::Skip(SkipReason::Unclassified),
            ObjectType::ManualLoot => return LootDecision::Skip(SkipReason::ManualLoot),
            ObjectType::Actor if self.data.is_actor_excluded(candidate.form.id) => {
                return LootDecision::Skip(SkipReason::ExcludedActor)
            }
            _ => {}
        }

        // harvestables are judged by what they yield
        let (lootable, lootable_type) = if object_type.is_harvestable() {
            match self.data.producer_lootable(candidate.form.id) {
                ProducerLootable::Resolved(id) => match self.store.lookup_form(id) {
                    Some(form) => {
                        let yielded = self.data.object_type_for_form(&form);
                        (form, yielded)
                    }
                    None => return LootDecision::Skip(SkipReason::NoLootable),
                },
                ProducerLootable::Pending => return LootDecision::Skip(SkipReason::ProducerPending),
                ProducerLootable::Unresolved => (candidate.form.clone(), object_type),
            }
        } else {
            (candidate.form.clone(), object_type)
        };

        let matcher = ConditionMatcher::new(&lootable)
            .with_object_type(lootable_type)
            .found_in(candidate.scope);
        let (collectible, handling) = self.collections.treat_as_collectible(&matcher, self.record_dups);
        if collectible {
            return match handling {
                CollectibleHandling::Glow => LootDecision::Glow,
                other => LootDecision::Collect(other),
            };
        }

        if !LootableItem::new(&lootable, lootable_type).passes_value_weight(self.settings) {
            return LootDecision::Skip(SkipReason::ValueWeight);
        }
        LootDecision::Loot
    }
}
