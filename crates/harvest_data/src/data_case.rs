//! Classification and eligibility tables
//!
//! [`DataCase`] is built once per game load by
//! [`categorize_lootables`](DataCase::categorize_lootables) and read by
//! everything else. Each table group sits behind its own lock; no method
//! holds two of them at once.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use harvest_core::{BookTeaches, Form, FormData, FormId, FormStore, FormType, ObjectType, ResourceType};
use parking_lot::{Mutex, RwLock};

use crate::blocking::{BlockReason, BlockTables, ReferenceReset};
use crate::keywords::KeywordTable;
use crate::leveled::LeveledItemCategorizer;
use crate::locked::LockedContainers;

/// Resolution state of a flora/tree producer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerLootable {
    /// Never looked up
    Unresolved,
    /// Looked up, no concrete item found yet
    Pending,
    /// Produces this item
    Resolved(FormId),
}

/// A rejected second classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationConflict {
    pub form: FormId,
    /// Type that was kept
    pub existing: ObjectType,
    /// Type that was refused
    pub rejected: ObjectType,
}

/// Enchanted variant for enchanted weapons and armor. Idempotent.
pub fn decorate_if_enchanted(form: &Form, object_type: ObjectType) -> ObjectType {
    if form.is_enchanted() {
        object_type.enchanted()
    } else {
        object_type
    }
}

#[derive(Debug, Default)]
struct Taxonomy {
    by_form_type: HashMap<FormType, ObjectType>,
    by_form: HashMap<FormId, ObjectType>,
    resource_by_ore_vein: HashMap<FormId, ResourceType>,
    verbs: HashMap<String, ObjectType>,
    keywords: KeywordTable,
    conflicts: Vec<ClassificationConflict>,
}

#[derive(Debug, Default)]
struct Resolution {
    producers: HashMap<FormId, ProducerLootable>,
    leveled: HashMap<FormId, Option<FormId>>,
}

#[derive(Debug, Default)]
struct Indexes {
    crafting_components: HashSet<FormId>,
    leveled_loot_perks: HashSet<FormId>,
    harvest_perks: HashSet<FormId>,
    excluded_actors: HashSet<FormId>,
}

/// Owner of every classification table
#[derive(Debug, Default)]
pub struct DataCase {
    taxonomy: RwLock<Taxonomy>,
    blocks: Mutex<BlockTables>,
    locked_containers: Mutex<LockedContainers>,
    resolution: RwLock<Resolution>,
    indexes: RwLock<Indexes>,
}

impl DataCase {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    // Object types

    /// Record a form's type. A different existing type wins and the
    /// conflict is logged; dynamic forms are refused.
    pub fn set_object_type_for_form(&self, id: FormId, object_type: ObjectType) -> bool {
        if id.is_none() || id.is_dynamic() {
            log::debug!("Not classifying dynamic form {}", id);
            return false;
        }
        let mut taxonomy = self.taxonomy.write();
        match taxonomy.by_form.get(&id).copied() {
            Some(existing) if existing == object_type => true,
            Some(existing) => {
                log::warn!(
                    "Form {} already classified as {}, ignoring {}",
                    id,
                    existing,
                    object_type
                );
                taxonomy.conflicts.push(ClassificationConflict {
                    form: id,
                    existing,
                    rejected: object_type,
                });
                false
            }
            None => {
                taxonomy.by_form.insert(id, object_type);
                true
            }
        }
    }

    /// Overwrite a form's type unconditionally
    pub fn force_object_type_for_form(&self, id: FormId, object_type: ObjectType) -> bool {
        if id.is_none() || id.is_dynamic() {
            log::debug!("Not classifying dynamic form {}", id);
            return false;
        }
        self.taxonomy.write().by_form.insert(id, object_type);
        true
    }

    /// Per-form type only
    pub fn object_type_for_form_id(&self, id: FormId) -> ObjectType {
        self.taxonomy
            .read()
            .by_form
            .get(&id)
            .copied()
            .unwrap_or(ObjectType::Unknown)
    }

    /// Whether a form has its own classification
    pub fn is_classified(&self, id: FormId) -> bool {
        self.taxonomy.read().by_form.contains_key(&id)
    }

    /// Type of a form: its own classification, else its record kind's
    pub fn object_type_for_form(&self, form: &Form) -> ObjectType {
        let taxonomy = self.taxonomy.read();
        taxonomy
            .by_form
            .get(&form.id)
            .or_else(|| taxonomy.by_form_type.get(&form.form_type))
            .copied()
            .unwrap_or(ObjectType::Unknown)
    }

    /// Book type, switched to the read variant once the player has read it
    pub fn object_type_for_book(&self, form: &Form, read: bool) -> ObjectType {
        let object_type = match self.object_type_for_form(form) {
            ObjectType::Unknown => match &form.data {
                FormData::Book(book) => match book.teaches {
                    BookTeaches::Spell(_) => ObjectType::Spellbook,
                    BookTeaches::Skill(_) => ObjectType::Skillbook,
                    BookTeaches::Nothing => ObjectType::Book,
                },
                _ => ObjectType::Unknown,
            },
            known => known,
        };
        if read {
            object_type.read_variant()
        } else {
            object_type
        }
    }

    /// Map a whole record kind
    pub fn set_object_type_for_form_type(&self, form_type: FormType, object_type: ObjectType) {
        self.taxonomy.write().by_form_type.insert(form_type, object_type);
    }

    pub fn object_type_for_form_type(&self, form_type: FormType) -> ObjectType {
        self.taxonomy
            .read()
            .by_form_type
            .get(&form_type)
            .copied()
            .unwrap_or(ObjectType::Unknown)
    }

    /// Record an ore vein's extraction flavor
    pub fn set_resource_type(&self, id: FormId, resource_type: ResourceType) -> bool {
        if id.is_none() || id.is_dynamic() {
            return false;
        }
        self.taxonomy.write().resource_by_ore_vein.insert(id, resource_type);
        true
    }

    /// Extraction flavor of an ore vein, `Ore` when unknown
    pub fn resource_type(&self, id: FormId) -> ResourceType {
        self.taxonomy
            .read()
            .resource_by_ore_vein
            .get(&id)
            .copied()
            .unwrap_or_default()
    }

    /// Register a localized activation verb
    pub fn register_activation_verb(&self, verb: &str, object_type: ObjectType) {
        let verb = verb.trim().to_lowercase();
        if verb.is_empty() {
            return;
        }
        self.taxonomy.write().verbs.insert(verb, object_type);
    }

    /// Type implied by an activation verb
    pub fn object_type_for_verb(&self, verb: &str) -> ObjectType {
        self.taxonomy
            .read()
            .verbs
            .get(&verb.trim().to_lowercase())
            .copied()
            .unwrap_or(ObjectType::Unknown)
    }

    pub(crate) fn set_keyword_table(&self, keywords: KeywordTable) {
        self.taxonomy.write().keywords = keywords;
    }

    /// Type implied by a single keyword
    pub fn object_type_for_keyword(&self, keyword: FormId) -> Option<ObjectType> {
        self.taxonomy.read().keywords.get(keyword)
    }

    /// Type implied by a form's keywords
    pub fn object_type_by_keywords(&self, form: &Form) -> Option<ObjectType> {
        self.taxonomy.read().keywords.object_type_for(form)
    }

    /// Every refused reclassification so far
    pub fn classification_conflicts(&self) -> Vec<ClassificationConflict> {
        self.taxonomy.read().conflicts.clone()
    }

    /// Count of per-form classifications by type
    pub fn classified_counts(&self) -> HashMap<ObjectType, usize> {
        let mut counts = HashMap::new();
        for object_type in self.taxonomy.read().by_form.values() {
            *counts.entry(*object_type).or_insert(0) += 1;
        }
        counts
    }

    // Blocks

    /// Block a base form until the next settings change
    pub fn block_form(&self, id: FormId, reason: BlockReason) -> bool {
        self.blocks.lock().block_form(id, reason)
    }

    /// Block a base form for the whole session, surviving resets
    pub fn block_form_permanently(&self, id: FormId, reason: BlockReason) -> bool {
        self.blocks.lock().block_form_permanently(id, reason)
    }

    /// Remove a permanent block
    pub fn unblock_form_permanently(&self, id: FormId) -> bool {
        self.blocks.lock().unblock_form_permanently(id)
    }

    pub fn is_form_blocked(&self, id: FormId) -> bool {
        self.blocks.lock().is_form_blocked(id).is_some()
    }

    pub fn form_block_reason(&self, id: FormId) -> Option<BlockReason> {
        self.blocks.lock().is_form_blocked(id)
    }

    /// Clear transient form blocks and reseed the permanent ones
    pub fn reset_blocked_forms(&self) {
        self.blocks.lock().reset_forms();
        log::info!("Blocked forms reset");
    }

    /// Block a world reference
    pub fn block_reference(&self, refr: FormId, reason: BlockReason) -> bool {
        self.blocks.lock().block_reference(refr, reason)
    }

    pub fn unblock_reference(&self, refr: FormId) -> bool {
        self.blocks.lock().unblock_reference(refr)
    }

    pub fn is_reference_blocked(&self, refr: FormId) -> bool {
        self.blocks.lock().is_reference_blocked(refr).is_some()
    }

    pub fn reference_block_reason(&self, refr: FormId) -> Option<BlockReason> {
        self.blocks.lock().is_reference_blocked(refr)
    }

    /// Clear reference blocks for a cell change or reload
    pub fn reset_blocked_references(&self, reset: ReferenceReset) {
        self.blocks.lock().reset_references(reset);
        log::debug!("Blocked references reset for {:?}", reset);
    }

    /// Never reconsider a reference this session
    pub fn blacklist_reference(&self, refr: FormId) -> bool {
        self.blocks.lock().blacklist_reference(refr)
    }

    pub fn is_reference_blacklisted(&self, refr: FormId) -> bool {
        self.blocks.lock().is_reference_blacklisted(refr)
    }

    // Locked containers

    /// Locked check using the current time
    pub fn is_reference_locked_container(&self, refr: FormId, is_locked: bool) -> bool {
        self.is_reference_locked_container_at(refr, is_locked, Instant::now())
    }

    /// Locked check at an explicit time
    pub fn is_reference_locked_container_at(&self, refr: FormId, is_locked: bool, now: Instant) -> bool {
        self.locked_containers.lock().check(refr, is_locked, now)
    }

    // Producers

    pub fn producer_lootable(&self, producer: FormId) -> ProducerLootable {
        self.resolution
            .read()
            .producers
            .get(&producer)
            .copied()
            .unwrap_or(ProducerLootable::Unresolved)
    }

    /// Mark a producer as looked up but not yet resolved
    pub fn mark_producer_pending(&self, producer: FormId) -> bool {
        if producer.is_none() || producer.is_dynamic() {
            return false;
        }
        self.resolution
            .write()
            .producers
            .entry(producer)
            .or_insert(ProducerLootable::Pending);
        true
    }

    /// Record what a producer yields. An existing resolution is kept.
    pub fn set_lootable_for_producer(&self, producer: FormId, lootable: FormId) -> bool {
        if producer.is_none() || producer.is_dynamic() || lootable.is_dynamic() {
            log::debug!("Not recording dynamic producer {} -> {}", producer, lootable);
            return false;
        }
        let mut resolution = self.resolution.write();
        match resolution.producers.get(&producer) {
            Some(ProducerLootable::Resolved(existing)) => *existing == lootable,
            _ => {
                resolution
                    .producers
                    .insert(producer, ProducerLootable::Resolved(lootable));
                true
            }
        }
    }

    /// Producers still waiting for a concrete item
    pub fn pending_producers(&self) -> usize {
        self.resolution
            .read()
            .producers
            .values()
            .filter(|state| **state == ProducerLootable::Pending)
            .count()
    }

    /// First concrete inventory item in a leveled list, walked once per list
    pub fn resolve_leveled_item(&self, store: &dyn FormStore, list: FormId) -> Option<FormId> {
        if let Some(cached) = self.resolution.read().leveled.get(&list) {
            return *cached;
        }
        let leaf = LeveledItemCategorizer::new(store, list)
            .categorize(|form| form.form_type.is_inventory_item());
        self.resolution.write().leveled.insert(list, leaf);
        leaf
    }

    // Crafting, perks and actors

    pub fn add_crafting_component(&self, id: FormId) -> bool {
        if id.is_none() || id.is_dynamic() {
            return false;
        }
        self.indexes.write().crafting_components.insert(id)
    }

    pub fn is_crafting_component(&self, id: FormId) -> bool {
        self.indexes.read().crafting_components.contains(&id)
    }

    pub fn crafting_component_count(&self) -> usize {
        self.indexes.read().crafting_components.len()
    }

    /// Index a perk's entry points
    pub fn register_perk(&self, perk: FormId, adds_leveled_loot: bool, modifies_harvest: bool) {
        let mut indexes = self.indexes.write();
        if adds_leveled_loot {
            indexes.leveled_loot_perks.insert(perk);
        }
        if modifies_harvest {
            indexes.harvest_perks.insert(perk);
        }
    }

    /// Perks that add leveled loot to victims
    pub fn leveled_loot_perks(&self) -> Vec<FormId> {
        self.indexes.read().leveled_loot_perks.iter().copied().collect()
    }

    /// Perks that change harvest yield
    pub fn harvest_perks(&self) -> Vec<FormId> {
        self.indexes.read().harvest_perks.iter().copied().collect()
    }

    pub fn exclude_actor(&self, npc: FormId) -> bool {
        if npc.is_none() || npc.is_dynamic() {
            return false;
        }
        self.indexes.write().excluded_actors.insert(npc)
    }

    /// Whether a dead actor's base form is off limits
    pub fn is_actor_excluded(&self, npc: FormId) -> bool {
        self.indexes.read().excluded_actors.contains(&npc)
    }

    pub fn excluded_actor_count(&self) -> usize {
        self.indexes.read().excluded_actors.len()
    }

    // Lifecycle

    /// Player changed cell
    pub fn on_cell_change(&self) {
        self.reset_blocked_references(ReferenceReset::CellChange);
    }

    /// Settings changed
    pub fn on_settings_changed(&self) {
        self.reset_blocked_forms();
    }

    /// Save loaded or new game started
    pub fn on_game_reload(&self) {
        self.reset_blocked_references(ReferenceReset::GameReload);
        self.locked_containers.lock().clear();
        self.reset_blocked_forms();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::{ArmorData, BookData, Enchantment, LeveledEntry, LoadOrder, MemoryFormStore};

    const DYNAMIC: FormId = FormId::new(0xFF00_0800);

    #[test]
    fn test_first_classification_wins() {
        let data = DataCase::new();
        let id = FormId::new(0x0001_0000);

        assert!(data.set_object_type_for_form(id, ObjectType::Gem));
        assert!(data.set_object_type_for_form(id, ObjectType::Gem));
        assert!(!data.set_object_type_for_form(id, ObjectType::Clutter));

        assert_eq!(data.object_type_for_form_id(id), ObjectType::Gem);
        let conflicts = data.classification_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].rejected, ObjectType::Clutter);

        assert!(data.force_object_type_for_form(id, ObjectType::Clutter));
        assert_eq!(data.object_type_for_form_id(id), ObjectType::Clutter);
    }

    #[test]
    fn test_dynamic_forms_never_stored() {
        let data = DataCase::new();
        assert!(!data.set_object_type_for_form(DYNAMIC, ObjectType::Weapon));
        assert!(!data.force_object_type_for_form(DYNAMIC, ObjectType::Weapon));
        assert!(!data.block_reference(DYNAMIC, BlockReason::Looted));
        assert!(!data.blacklist_reference(DYNAMIC));
        assert!(!data.set_lootable_for_producer(DYNAMIC, FormId::new(0x10)));

        assert!(!data.is_classified(DYNAMIC));
        assert!(!data.is_reference_blocked(DYNAMIC));
        assert!(!data.is_reference_blacklisted(DYNAMIC));
        assert_eq!(data.producer_lootable(DYNAMIC), ProducerLootable::Unresolved);
    }

    #[test]
    fn test_form_type_fallback() {
        let data = DataCase::new();
        data.set_object_type_for_form_type(FormType::Key, ObjectType::Key);
        let key = Form::new(FormId::new(0x20), FormType::Key);
        assert_eq!(data.object_type_for_form(&key), ObjectType::Key);
        assert_eq!(data.object_type_for_form_id(key.id), ObjectType::Unknown);
    }

    #[test]
    fn test_decorate_if_enchanted_idempotent() {
        let ring = Form::new(FormId::new(0x30), FormType::Armor).with_data(FormData::Armor(ArmorData {
            enchantment: Some(Enchantment {
                effect_costs: vec![40.0],
                charge: 0,
            }),
        }));
        let once = decorate_if_enchanted(&ring, ObjectType::Jewelry);
        assert_eq!(once, ObjectType::EnchantedJewelry);
        assert_eq!(decorate_if_enchanted(&ring, once), once);

        let plain = Form::new(FormId::new(0x31), FormType::Armor);
        assert_eq!(decorate_if_enchanted(&plain, ObjectType::Armor), ObjectType::Armor);
    }

    #[test]
    fn test_book_read_variants() {
        let data = DataCase::new();
        let tome = Form::new(FormId::new(0x40), FormType::Book).with_data(FormData::Book(BookData {
            teaches: BookTeaches::Spell(FormId::new(0x41)),
        }));
        assert_eq!(data.object_type_for_book(&tome, false), ObjectType::Spellbook);
        assert_eq!(data.object_type_for_book(&tome, true), ObjectType::SpellbookRead);
    }

    #[test]
    fn test_producer_states() {
        let data = DataCase::new();
        let flora = FormId::new(0x50);
        assert_eq!(data.producer_lootable(flora), ProducerLootable::Unresolved);

        data.mark_producer_pending(flora);
        assert_eq!(data.producer_lootable(flora), ProducerLootable::Pending);
        assert_eq!(data.pending_producers(), 1);

        assert!(data.set_lootable_for_producer(flora, FormId::new(0x51)));
        assert!(!data.set_lootable_for_producer(flora, FormId::new(0x52)));
        assert_eq!(data.producer_lootable(flora), ProducerLootable::Resolved(FormId::new(0x51)));
    }

    #[test]
    fn test_leveled_resolution_cached() {
        let store = MemoryFormStore::new(LoadOrder::new())
            .with_form(Form::new(FormId::new(0x60), FormType::LeveledItem).with_data(
                FormData::LeveledItem {
                    entries: vec![LeveledEntry::new(FormId::new(0x60)), LeveledEntry::new(FormId::new(0x61))],
                },
            ))
            .with_form(Form::new(FormId::new(0x61), FormType::Ingredient));
        let data = DataCase::new();

        assert_eq!(data.resolve_leveled_item(&store, FormId::new(0x60)), Some(FormId::new(0x61)));
        let empty = MemoryFormStore::new(LoadOrder::new());
        assert_eq!(data.resolve_leveled_item(&empty, FormId::new(0x60)), Some(FormId::new(0x61)));
    }

    #[test]
    fn test_game_reload_clears_blacklist() {
        let data = DataCase::new();
        let refr = FormId::new(0x0002_0000);
        data.blacklist_reference(refr);
        data.on_cell_change();
        assert!(data.is_reference_blacklisted(refr));
        data.on_game_reload();
        assert!(!data.is_reference_blacklisted(refr));
    }
}
