//! Integration tests for the taxonomy build
//!
//! Builds a small load order and checks the classifications each step of
//! the build produces.

use harvest_core::{
    AlchemyData, ArmorData, BookData, BookTeaches, Enchantment, Form, FormData, FormId, FormType, LeveledEntry,
    LoadOrder, MemoryFormStore, ObjectType, PerkData, ResourceType, Translations,
};
use harvest_data::*;

fn id(raw: u32) -> FormId {
    FormId::new(raw)
}

fn leveled(raw: u32, entries: &[u32]) -> Form {
    Form::new(id(raw), FormType::LeveledItem).with_data(FormData::LeveledItem {
        entries: entries.iter().map(|e| LeveledEntry::new(id(*e))).collect(),
    })
}

fn world() -> MemoryFormStore {
    let order = LoadOrder::from_names(["Skyrim.esm", "Harvest.esp"]).unwrap();
    MemoryFormStore::new(order)
        // keywords
        .with_form(Form::new(id(0x900), FormType::Keyword).with_editor_id("VendorItemAnimalHide"))
        .with_form(Form::new(id(0x901), FormType::Keyword).with_editor_id("VendorItemGem"))
        .with_form(Form::new(id(0x902), FormType::Keyword).with_editor_id("ClothingRing"))
        .with_form(Form::new(id(0x903), FormType::Keyword).with_editor_id("ActorTypeGhost"))
        .with_form(Form::new(id(0x904), FormType::Keyword).with_editor_id("VendorItemStrange"))
        // well-known forms
        .with_form(Form::new(id(0xA), FormType::Misc).with_name("Lockpick").with_keyword(id(0x904)))
        .with_form(Form::new(id(0xF), FormType::Misc).with_name("Gold"))
        // misc
        .with_form(Form::new(id(0x100), FormType::Misc).with_name("Ruby").with_keyword(id(0x901)))
        .with_form(Form::new(id(0x101), FormType::Misc).with_name("Tankard"))
        .with_form(Form::new(id(0x102), FormType::Misc).with_name("Odd Trinket").with_keyword(id(0x904)))
        // consumables
        .with_form(Form::new(id(0x200), FormType::Alchemy).with_data(FormData::Alchemy(AlchemyData {
            is_food: true,
            consume_sound: Some(id(0x000B_6435)),
            ..AlchemyData::default()
        })))
        .with_form(Form::new(id(0x201), FormType::Alchemy).with_data(FormData::Alchemy(AlchemyData {
            is_food: true,
            ..AlchemyData::default()
        })))
        .with_form(Form::new(id(0x202), FormType::Alchemy).with_data(FormData::Alchemy(AlchemyData {
            is_poison: true,
            ..AlchemyData::default()
        })))
        .with_form(Form::new(id(0x203), FormType::Alchemy).with_data(FormData::Alchemy(AlchemyData::default())))
        // producers
        .with_form(Form::new(id(0x300), FormType::Ingredient).with_name("Blue Mountain Flower"))
        .with_form(Form::new(id(0x301), FormType::Flora).with_data(FormData::Producer {
            ingredient: Some(id(0x300)),
        }))
        .with_form(leveled(0x310, &[0x311]))
        .with_form(leveled(0x311, &[0x310, 0x201]))
        .with_form(Form::new(id(0x302), FormType::Tree).with_data(FormData::Producer {
            ingredient: Some(id(0x310)),
        }))
        .with_form(leveled(0x320, &[0x321]))
        .with_form(leveled(0x321, &[0x320]))
        .with_form(Form::new(id(0x303), FormType::Flora).with_data(FormData::Producer {
            ingredient: Some(id(0x320)),
        }))
        // equipment
        .with_form(Form::new(id(0x400), FormType::Armor).with_keyword(id(0x900)))
        .with_form(
            Form::new(id(0x401), FormType::Armor)
                .with_keyword(id(0x902))
                .with_data(FormData::Armor(ArmorData {
                    enchantment: Some(Enchantment {
                        effect_costs: vec![30.0],
                        charge: 0,
                    }),
                })),
        )
        .with_form(Form::new(id(0x402), FormType::Weapon))
        // activators
        .with_form(
            Form::new(id(0x500), FormType::Activator)
                .with_name("Geode Vein")
                .with_data(FormData::Activator {
                    verb: Some("Mine".to_string()),
                }),
        )
        .with_form(
            Form::new(id(0x501), FormType::Activator)
                .with_name("Moth")
                .with_data(FormData::Activator {
                    verb: Some("Catch".to_string()),
                }),
        )
        .with_form(Form::new(id(0x502), FormType::Activator).with_editor_id("DefaultAshPile01"))
        .with_form(
            Form::new(id(0x503), FormType::Activator)
                .with_name("Lever")
                .with_data(FormData::Activator {
                    verb: Some("Pull".to_string()),
                }),
        )
        // books
        .with_form(Form::new(id(0x600), FormType::Book).with_data(FormData::Book(BookData {
            teaches: BookTeaches::Skill("Smithing".to_string()),
        })))
        // crafting, perks, actors
        .with_form(Form::new(id(0x700), FormType::ConstructibleObject).with_data(FormData::Recipe {
            created: id(0x402),
            components: vec![id(0x101), id(0x100)],
        }))
        .with_form(Form::new(id(0x710), FormType::Perk).with_data(FormData::Perk(PerkData {
            adds_leveled_loot: true,
            modifies_harvest: false,
        })))
        .with_form(Form::new(id(0x711), FormType::Perk).with_data(FormData::Perk(PerkData {
            adds_leveled_loot: false,
            modifies_harvest: true,
        })))
        .with_form(Form::new(id(0x720), FormType::Npc).with_keyword(id(0x903)))
        .with_form(Form::new(id(0x721), FormType::Npc))
        // plugin content
        .with_form(Form::new(id(0x0100_0C00), FormType::Container).with_name("Boss Chest"))
}

fn build(store: &MemoryFormStore, exceptions: &ExceptionTable) -> (DataCase, CategorizeReport) {
    let data = DataCase::new();
    let report = data.categorize_lootables(store, &Translations::new(), exceptions);
    (data, report)
}

fn object_type(data: &DataCase, store: &MemoryFormStore, raw: u32) -> ObjectType {
    use harvest_core::FormStore;
    let form = store.lookup_form(id(raw)).unwrap();
    data.object_type_for_form(&form)
}

#[test]
fn test_well_known_forms_and_misc() {
    let store = world();
    let (data, _) = build(&store, &ExceptionTable::new());

    assert_eq!(object_type(&data, &store, 0xA), ObjectType::Lockpick);
    assert_eq!(object_type(&data, &store, 0xF), ObjectType::Septims);
    assert_eq!(object_type(&data, &store, 0x100), ObjectType::Gem);
    assert_eq!(object_type(&data, &store, 0x101), ObjectType::Clutter);
    assert_eq!(object_type(&data, &store, 0x102), ObjectType::Clutter);
    assert!(data.classification_conflicts().is_empty());
}

#[test]
fn test_consumables() {
    let store = world();
    let (data, _) = build(&store, &ExceptionTable::new());

    assert_eq!(object_type(&data, &store, 0x200), ObjectType::Drink);
    assert_eq!(object_type(&data, &store, 0x201), ObjectType::Food);
    assert_eq!(object_type(&data, &store, 0x202), ObjectType::Poison);
    assert_eq!(object_type(&data, &store, 0x203), ObjectType::Potion);
    assert_eq!(object_type(&data, &store, 0x300), ObjectType::Ingredient);
}

#[test]
fn test_producers() {
    let store = world();
    let (data, report) = build(&store, &ExceptionTable::new());

    assert_eq!(object_type(&data, &store, 0x301), ObjectType::Flora);
    assert_eq!(data.producer_lootable(id(0x301)), ProducerLootable::Resolved(id(0x300)));

    // tree over a cyclic leveled list resolves to the first concrete leaf
    assert_eq!(data.producer_lootable(id(0x302)), ProducerLootable::Resolved(id(0x201)));
    assert_eq!(object_type(&data, &store, 0x302), ObjectType::Food);

    // nothing concrete anywhere in the cycle
    assert_eq!(data.producer_lootable(id(0x303)), ProducerLootable::Pending);
    assert_eq!(object_type(&data, &store, 0x303), ObjectType::Flora);
    assert_eq!(report.pending_producers, 1);
}

#[test]
fn test_equipment() {
    let store = world();
    let (data, _) = build(&store, &ExceptionTable::new());

    assert_eq!(object_type(&data, &store, 0x400), ObjectType::Armor);
    assert_eq!(object_type(&data, &store, 0x401), ObjectType::EnchantedJewelry);
    assert_eq!(object_type(&data, &store, 0x402), ObjectType::Weapon);
}

#[test]
fn test_activators() {
    let store = world();
    let (data, _) = build(&store, &ExceptionTable::new());

    assert_eq!(object_type(&data, &store, 0x500), ObjectType::OreVein);
    assert_eq!(data.resource_type(id(0x500)), ResourceType::Geode);
    assert_eq!(object_type(&data, &store, 0x501), ObjectType::Critter);
    assert_eq!(object_type(&data, &store, 0x502), ObjectType::AshPile);
    assert_eq!(object_type(&data, &store, 0x503), ObjectType::Unknown);
}

#[test]
fn test_localized_verbs() {
    let store = MemoryFormStore::new(LoadOrder::from_names(["Skyrim.esm"]).unwrap()).with_form(
        Form::new(id(0x500), FormType::Activator)
            .with_name("Geode")
            .with_data(FormData::Activator {
                verb: Some("Abbauen".to_string()),
            }),
    );
    let translations = Translations::from_pairs([("$HARVEST_VERB_MINE", "Abbauen")]);
    let data = DataCase::new();
    data.categorize_lootables(&store, &translations, &ExceptionTable::new());

    assert_eq!(data.object_type_for_form_id(id(0x500)), ObjectType::OreVein);
    assert_eq!(data.object_type_for_verb("Mine"), ObjectType::Unknown);
}

#[test]
fn test_books() {
    let store = world();
    let (data, _) = build(&store, &ExceptionTable::new());
    let book = {
        use harvest_core::FormStore;
        store.lookup_form(id(0x600)).unwrap()
    };

    assert_eq!(data.object_type_for_book(&book, false), ObjectType::Skillbook);
    assert_eq!(data.object_type_for_book(&book, true), ObjectType::SkillbookRead);
}

#[test]
fn test_crafting_perks_and_actors() {
    let store = world();
    let (data, report) = build(&store, &ExceptionTable::new());

    assert!(data.is_crafting_component(id(0x100)));
    assert!(data.is_crafting_component(id(0x101)));
    assert!(!data.is_crafting_component(id(0x402)));
    assert_eq!(data.leveled_loot_perks(), vec![id(0x710)]);
    assert_eq!(data.harvest_perks(), vec![id(0x711)]);
    assert!(data.is_actor_excluded(id(0x720)));
    assert!(!data.is_actor_excluded(id(0x721)));
    assert_eq!(report.crafting_components, 2);
    assert_eq!(report.excluded_actors, 1);
}

#[test]
fn test_exceptions_override_generic_rules() {
    let store = world();
    let exceptions = ExceptionTable::new()
        .with_entry(ExceptionEntry::new("Harvest.esp", 0xC00, ExceptionAction::Block))
        .with_entry(
            ExceptionEntry::new("Skyrim.esm", 0x101, ExceptionAction::ObjectType)
                .with_object_type(ObjectType::ManualLoot),
        );
    let (data, report) = build(&store, &exceptions);

    assert_eq!(report.exceptions_applied, 2);
    assert!(data.is_form_blocked(id(0x0100_0C00)));
    assert_eq!(object_type(&data, &store, 0x101), ObjectType::ManualLoot);

    data.on_settings_changed();
    assert!(data.is_form_blocked(id(0x0100_0C00)));
}

#[test]
fn test_value_weight_scenarios() {
    let settings = ValueWeightSettings::new(5.0).with_ammo_threshold(10.0);

    let heavy_gold = Form::new(id(0x800), FormType::Misc).with_value(100).with_weight(10.0);
    let heavy_junk = Form::new(id(0x801), FormType::Misc).with_value(10).with_weight(10.0);
    assert!(!LootableItem::new(&heavy_gold, ObjectType::Clutter).value_weight_too_low_to_loot(&settings));
    assert!(LootableItem::new(&heavy_junk, ObjectType::Clutter).value_weight_too_low_to_loot(&settings));

    let weak = Form::new(id(0x802), FormType::Ammo).with_data(FormData::Ammo { damage: 8.0 });
    let strong = Form::new(id(0x803), FormType::Ammo).with_data(FormData::Ammo { damage: 12.0 });
    assert!(LootableItem::new(&weak, ObjectType::Ammo).value_weight_too_low_to_loot(&settings));
    assert!(!LootableItem::new(&strong, ObjectType::Ammo).value_weight_too_low_to_loot(&settings));
}
