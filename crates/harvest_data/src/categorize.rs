//! Once-per-load taxonomy build
//!
//! The steps run in a fixed order; each one relies on the classifications
//! made before it. Per-form classification is first-wins, so a later, more
//! generic rule never overrides an earlier, more specific one. The
//! exception table runs last and is the only step that forces types.

use std::collections::{BTreeMap, HashSet};

use harvest_core::{
    BookTeaches, Form, FormData, FormId, FormStore, FormType, ObjectType, ResourceType, Translations,
};

use crate::data_case::{decorate_if_enchanted, DataCase};
use crate::exceptions::ExceptionTable;
use crate::keywords::KeywordTable;

/// Localized activation verb and the catch-all type it implies
#[derive(Debug, Clone, Copy)]
pub struct ActivationVerb {
    /// Translation key
    pub key: &'static str,
    /// English text used when the key is missing
    pub fallback: &'static str,
    pub object_type: ObjectType,
}

pub const ACTIVATION_VERBS: &[ActivationVerb] = &[
    ActivationVerb {
        key: "$HARVEST_VERB_HARVEST",
        fallback: "Harvest",
        object_type: ObjectType::Flora,
    },
    ActivationVerb {
        key: "$HARVEST_VERB_CATCH",
        fallback: "Catch",
        object_type: ObjectType::Critter,
    },
    ActivationVerb {
        key: "$HARVEST_VERB_MINE",
        fallback: "Mine",
        object_type: ObjectType::OreVein,
    },
];

/// Record kinds that classify wholesale
const FORM_TYPE_OBJECT_TYPES: &[(FormType, ObjectType)] = &[
    (FormType::Container, ObjectType::Container),
    (FormType::Ingredient, ObjectType::Ingredient),
    (FormType::SoulGem, ObjectType::Soulgem),
    (FormType::Key, ObjectType::Key),
    (FormType::Scroll, ObjectType::Scroll),
    (FormType::Ammo, ObjectType::Ammo),
    (FormType::Light, ObjectType::Light),
    (FormType::Npc, ObjectType::Actor),
    (FormType::Book, ObjectType::Book),
    (FormType::Misc, ObjectType::Clutter),
    (FormType::Weapon, ObjectType::Weapon),
    (FormType::Armor, ObjectType::Armor),
];

/// Base plugin of every load order
pub const BASE_PLUGIN: &str = "Skyrim.esm";
/// Local ID of the lockpick misc item
pub const LOCKPICK_LOCAL_ID: u32 = 0x0000_000A;
/// Local ID of the gold coin
pub const GOLD_LOCAL_ID: u32 = 0x0000_000F;
/// Local ID of the sound shared by every drink
pub const DRINK_SOUND_LOCAL_ID: u32 = 0x000B_6435;

/// NPC keywords whose corpses are never looted
pub const DEFAULT_EXCLUDED_NPC_KEYWORDS: &[&str] = &["ActorTypeGhost"];

const VOLCANIC_NAMES: &[&str] = &["Deposit", "Heart Stone", "Sulfur"];
const GEODE_NAME: &str = "Geode";
const DIG_SITE_EDITOR_ID: &str = "DigSite";
const ASH_PILE_EDITOR_ID: &str = "AshPile";

/// Ore vein flavor from its display name
pub fn resource_type_for_ore_vein(form: &Form) -> ResourceType {
    if form.editor_id.contains(DIG_SITE_EDITOR_ID) {
        ResourceType::VolcanicDigSite
    } else if VOLCANIC_NAMES.iter().any(|name| form.name.contains(name)) {
        ResourceType::Volcanic
    } else if form.name.contains(GEODE_NAME) {
        ResourceType::Geode
    } else {
        ResourceType::Ore
    }
}

/// Summary of one taxonomy build
#[derive(Debug, Clone, Default)]
pub struct CategorizeReport {
    pub by_type: BTreeMap<ObjectType, usize>,
    pub conflicts: usize,
    pub pending_producers: usize,
    pub crafting_components: usize,
    pub leveled_loot_perks: usize,
    pub harvest_perks: usize,
    pub excluded_actors: usize,
    pub exceptions_applied: usize,
}

impl CategorizeReport {
    /// Forms classified individually
    pub fn classified(&self) -> usize {
        self.by_type.values().sum()
    }
}

/// Ordered taxonomy build over one load order
pub struct CategorizeLootables<'a> {
    data: &'a DataCase,
    store: &'a dyn FormStore,
    translations: &'a Translations,
    exceptions: &'a ExceptionTable,
    excluded_npc_keywords: Vec<String>,
    keywords: KeywordTable,
}

impl<'a> CategorizeLootables<'a> {
    /// Create a build
    pub fn new(
        data: &'a DataCase,
        store: &'a dyn FormStore,
        translations: &'a Translations,
        exceptions: &'a ExceptionTable,
    ) -> Self {
        Self {
            data,
            store,
            translations,
            exceptions,
            excluded_npc_keywords: DEFAULT_EXCLUDED_NPC_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            keywords: KeywordTable::new(),
        }
    }

    /// Replace the NPC keyword exclusion list
    pub fn with_excluded_npc_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_npc_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Run every step in order
    pub fn run(mut self) -> CategorizeReport {
        self.register_activation_verbs();
        self.map_form_types();
        self.build_keyword_table();
        self.classify_consumables();
        self.classify_misc();
        self.classify_producers();
        self.classify_equipment();
        self.classify_activators();
        self.index_crafting_components();
        self.index_perks();
        self.exclude_npcs();
        let exceptions_applied = self.exceptions.apply(self.data, self.store);

        let report = CategorizeReport {
            by_type: self.data.classified_counts().into_iter().collect(),
            conflicts: self.data.classification_conflicts().len(),
            pending_producers: self.data.pending_producers(),
            crafting_components: self.data.crafting_component_count(),
            leveled_loot_perks: self.data.leveled_loot_perks().len(),
            harvest_perks: self.data.harvest_perks().len(),
            excluded_actors: self.data.excluded_actor_count(),
            exceptions_applied,
        };
        log::info!(
            "Categorized {} forms ({} conflicts, {} pending producers, {} exceptions)",
            report.classified(),
            report.conflicts,
            report.pending_producers,
            report.exceptions_applied
        );
        report
    }

    fn base_form(&self, local: u32) -> Option<FormId> {
        self.store.load_order().form_id(BASE_PLUGIN, local).ok()
    }

    fn register_activation_verbs(&self) {
        for verb in ACTIVATION_VERBS {
            let text = self.translations.get_or(verb.key, verb.fallback);
            self.data.register_activation_verb(text, verb.object_type);
        }
    }

    fn map_form_types(&self) {
        for (form_type, object_type) in FORM_TYPE_OBJECT_TYPES {
            self.data.set_object_type_for_form_type(*form_type, *object_type);
        }
        if let Some(lockpick) = self.base_form(LOCKPICK_LOCAL_ID) {
            self.data.set_object_type_for_form(lockpick, ObjectType::Lockpick);
        }
        if let Some(gold) = self.base_form(GOLD_LOCAL_ID) {
            self.data.set_object_type_for_form(gold, ObjectType::Septims);
        }
        for book in self.store.forms_of_type(FormType::Book) {
            let object_type = match &book.data {
                FormData::Book(data) => match data.teaches {
                    BookTeaches::Spell(_) => ObjectType::Spellbook,
                    BookTeaches::Skill(_) => ObjectType::Skillbook,
                    BookTeaches::Nothing => ObjectType::Book,
                },
                _ => ObjectType::Book,
            };
            self.data.set_object_type_for_form(book.id, object_type);
        }
    }

    fn build_keyword_table(&mut self) {
        for keyword in self.store.forms_of_type(FormType::Keyword) {
            self.keywords.register(&keyword);
        }
        log::debug!("{} classifying keywords", self.keywords.len());
        self.data.set_keyword_table(self.keywords.clone());
    }

    fn classify_consumables(&self) {
        let drink_sound = self.base_form(DRINK_SOUND_LOCAL_ID);
        for item in self.store.forms_of_type(FormType::Alchemy) {
            let FormData::Alchemy(alchemy) = &item.data else {
                self.data.set_object_type_for_form(item.id, ObjectType::Potion);
                continue;
            };
            let object_type = if alchemy.is_poison {
                ObjectType::Poison
            } else if alchemy.is_food {
                if drink_sound.is_some() && alchemy.consume_sound == drink_sound {
                    ObjectType::Drink
                } else {
                    ObjectType::Food
                }
            } else {
                ObjectType::Potion
            };
            self.data.set_object_type_for_form(item.id, object_type);
        }
        for ingredient in self.store.forms_of_type(FormType::Ingredient) {
            self.data.set_object_type_for_form(ingredient.id, ObjectType::Ingredient);
        }
    }

    fn classify_misc(&self) {
        for item in self.store.forms_of_type(FormType::Misc) {
            if self.data.is_classified(item.id) {
                continue;
            }
            let object_type = self.keywords.object_type_for(&item).unwrap_or(ObjectType::Clutter);
            self.data.set_object_type_for_form(item.id, object_type);
        }
    }

    fn classify_producers(&self) {
        for (form_type, default) in [(FormType::Flora, ObjectType::Flora), (FormType::Tree, ObjectType::Food)] {
            for producer in self.store.forms_of_type(form_type) {
                let object_type = self.classify_producer(&producer, default);
                self.data.set_object_type_for_form(producer.id, object_type);
            }
        }
    }

    fn classify_producer(&self, producer: &Form, default: ObjectType) -> ObjectType {
        let FormData::Producer {
            ingredient: Some(ingredient),
        } = &producer.data
        else {
            return default;
        };
        let ingredient = *ingredient;
        let Some(item) = self.store.lookup_form(ingredient) else {
            log::debug!("Producer {} yields missing form {}", producer.id, ingredient);
            return default;
        };
        let lootable = if item.form_type == FormType::LeveledItem {
            match self.data.resolve_leveled_item(self.store, item.id) {
                Some(leaf) => leaf,
                None => {
                    self.data.mark_producer_pending(producer.id);
                    return default;
                }
            }
        } else {
            item.id
        };
        self.data.set_lootable_for_producer(producer.id, lootable);

        let leaf_type = self
            .store
            .lookup_form(lootable)
            .map(|leaf| self.data.object_type_for_form(&leaf))
            .unwrap_or(ObjectType::Unknown);
        match leaf_type {
            ObjectType::Unknown | ObjectType::Ingredient => default,
            other => other,
        }
    }

    fn classify_equipment(&self) {
        for (form_type, default) in [(FormType::Armor, ObjectType::Armor), (FormType::Weapon, ObjectType::Weapon)] {
            for item in self.store.forms_of_type(form_type) {
                let chosen = self.keywords.object_type_for(&item).unwrap_or(default);
                let object_type = override_if_bad_choice(form_type, chosen);
                self.data
                    .set_object_type_for_form(item.id, decorate_if_enchanted(&item, object_type));
            }
        }
    }

    fn classify_activators(&self) {
        for activator in self.store.forms_of_type(FormType::Activator) {
            if self.data.is_classified(activator.id) {
                continue;
            }
            if activator.editor_id.contains(ASH_PILE_EDITOR_ID) {
                self.data.set_object_type_for_form(activator.id, ObjectType::AshPile);
                continue;
            }
            let FormData::Activator { verb: Some(verb) } = &activator.data else {
                continue;
            };
            let object_type = self.data.object_type_for_verb(verb);
            if object_type == ObjectType::Unknown {
                continue;
            }
            if self.data.set_object_type_for_form(activator.id, object_type) && object_type == ObjectType::OreVein {
                self.data
                    .set_resource_type(activator.id, resource_type_for_ore_vein(&activator));
            }
        }
    }

    fn index_crafting_components(&self) {
        for recipe in self.store.forms_of_type(FormType::ConstructibleObject) {
            if let FormData::Recipe { components, .. } = &recipe.data {
                for component in components {
                    self.data.add_crafting_component(*component);
                }
            }
        }
    }

    fn index_perks(&self) {
        for perk in self.store.forms_of_type(FormType::Perk) {
            if let FormData::Perk(data) = &perk.data {
                self.data
                    .register_perk(perk.id, data.adds_leveled_loot, data.modifies_harvest);
            }
        }
    }

    fn exclude_npcs(&self) {
        if self.excluded_npc_keywords.is_empty() {
            return;
        }
        let excluded: HashSet<FormId> = self
            .store
            .forms_of_type(FormType::Keyword)
            .into_iter()
            .filter(|keyword| {
                self.excluded_npc_keywords
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(&keyword.editor_id))
            })
            .map(|keyword| keyword.id)
            .collect();
        if excluded.is_empty() {
            return;
        }
        for npc in self.store.forms_of_type(FormType::Npc) {
            if npc.keywords.iter().any(|keyword| excluded.contains(keyword)) {
                self.data.exclude_actor(npc.id);
            }
        }
    }
}

/// Pull equipment back into its own family when a keyword put it elsewhere
fn override_if_bad_choice(form_type: FormType, chosen: ObjectType) -> ObjectType {
    match (form_type, chosen) {
        (FormType::Armor, ObjectType::Armor | ObjectType::Jewelry) => chosen,
        (FormType::Armor, _) => ObjectType::Armor,
        (FormType::Weapon, _) => ObjectType::Weapon,
        _ => chosen,
    }
}

impl DataCase {
    /// Build every taxonomy table from the loaded forms
    pub fn categorize_lootables(
        &self,
        store: &dyn FormStore,
        translations: &Translations,
        exceptions: &ExceptionTable,
    ) -> CategorizeReport {
        CategorizeLootables::new(self, store, translations, exceptions).run()
    }
}
