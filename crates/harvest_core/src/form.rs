//! Host form model
//!
//! A plain-data view of the host engine's records. The engine integration
//! materializes these from the live game; tests build them by hand.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::form_id::FormId;

/// Record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormType {
    Keyword,
    FormList,
    LeveledItem,
    Activator,
    Flora,
    Tree,
    Container,
    Npc,
    Light,
    Misc,
    Ingredient,
    Alchemy,
    Armor,
    Weapon,
    Ammo,
    Book,
    Scroll,
    SoulGem,
    Key,
    ConstructibleObject,
    Perk,
    Static,
}

impl FormType {
    /// Every record kind
    pub const ALL: [FormType; 22] = [
        FormType::Keyword,
        FormType::FormList,
        FormType::LeveledItem,
        FormType::Activator,
        FormType::Flora,
        FormType::Tree,
        FormType::Container,
        FormType::Npc,
        FormType::Light,
        FormType::Misc,
        FormType::Ingredient,
        FormType::Alchemy,
        FormType::Armor,
        FormType::Weapon,
        FormType::Ammo,
        FormType::Book,
        FormType::Scroll,
        FormType::SoulGem,
        FormType::Key,
        FormType::ConstructibleObject,
        FormType::Perk,
        FormType::Static,
    ];

    /// Four-character record signature
    pub fn signature(&self) -> &'static str {
        match self {
            FormType::Keyword => "KYWD",
            FormType::FormList => "FLST",
            FormType::LeveledItem => "LVLI",
            FormType::Activator => "ACTI",
            FormType::Flora => "FLOR",
            FormType::Tree => "TREE",
            FormType::Container => "CONT",
            FormType::Npc => "NPC_",
            FormType::Light => "LIGH",
            FormType::Misc => "MISC",
            FormType::Ingredient => "INGR",
            FormType::Alchemy => "ALCH",
            FormType::Armor => "ARMO",
            FormType::Weapon => "WEAP",
            FormType::Ammo => "AMMO",
            FormType::Book => "BOOK",
            FormType::Scroll => "SCRL",
            FormType::SoulGem => "SLGM",
            FormType::Key => "KEYM",
            FormType::ConstructibleObject => "COBJ",
            FormType::Perk => "PERK",
            FormType::Static => "STAT",
        }
    }

    /// Look up a record kind by signature
    pub fn from_signature(signature: &str) -> Option<FormType> {
        FormType::ALL
            .iter()
            .copied()
            .find(|form_type| form_type.signature().eq_ignore_ascii_case(signature))
    }

    /// Items that can sit in an inventory
    pub fn is_inventory_item(&self) -> bool {
        matches!(
            self,
            FormType::Light
                | FormType::Misc
                | FormType::Ingredient
                | FormType::Alchemy
                | FormType::Armor
                | FormType::Weapon
                | FormType::Ammo
                | FormType::Book
                | FormType::Scroll
                | FormType::SoulGem
                | FormType::Key
        )
    }
}

impl std::str::FromStr for FormType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormType::from_signature(s).ok_or_else(|| CoreError::UnknownSignature(s.to_string()))
    }
}

/// One row of a leveled list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeveledEntry {
    /// Item or nested leveled list
    pub form: FormId,
    /// Minimum level for this entry
    pub level: u16,
    /// Stack size
    pub count: u16,
}

impl LeveledEntry {
    /// Create a level-1 single-count entry
    pub fn new(form: FormId) -> Self {
        Self {
            form,
            level: 1,
            count: 1,
        }
    }
}

/// Enchantment attached to a weapon or armor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enchantment {
    /// Magic-effect costs, one per effect
    pub effect_costs: Vec<f32>,
    /// Charge capacity (weapons only)
    pub charge: u16,
}

impl Enchantment {
    /// Total cost of all effects
    pub fn cost(&self) -> f32 {
        self.effect_costs.iter().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    pub damage: u16,
    pub enchantment: Option<Enchantment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmorData {
    pub enchantment: Option<Enchantment>,
}

/// Potion, poison, food or drink
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlchemyData {
    pub is_food: bool,
    pub is_poison: bool,
    /// Sound played on consumption; drinks share a well-known sound
    pub consume_sound: Option<FormId>,
    pub effect_costs: Vec<f32>,
}

/// What reading a book grants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum BookTeaches {
    #[default]
    Nothing,
    Spell(FormId),
    Skill(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookData {
    pub teaches: BookTeaches,
}

/// Perk entry points the looting engine cares about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerkData {
    /// Adds a leveled list to the victim's inventory on death
    pub adds_leveled_loot: bool,
    /// Modifies the yield of harvested flora
    pub modifies_harvest: bool,
}

/// Type-specific record payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum FormData {
    #[default]
    None,
    FormList { entries: Vec<FormId> },
    LeveledItem { entries: Vec<LeveledEntry> },
    /// Activation verb override ("Harvest", "Mine", ...)
    Activator { verb: Option<String> },
    /// Flora or tree and the item it produces
    Producer { ingredient: Option<FormId> },
    Alchemy(AlchemyData),
    Weapon(WeaponData),
    Armor(ArmorData),
    Ammo { damage: f32 },
    Book(BookData),
    Recipe { created: FormId, components: Vec<FormId> },
    Perk(PerkData),
}

/// A game record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub form_type: FormType,
    pub editor_id: String,
    /// Localized display name
    pub name: String,
    pub keywords: Vec<FormId>,
    /// Base gold value
    pub value: u32,
    pub weight: f32,
    pub data: FormData,
}

impl Form {
    /// Create a new form with no payload
    pub fn new(id: FormId, form_type: FormType) -> Self {
        Self {
            id,
            form_type,
            editor_id: String::new(),
            name: String::new(),
            keywords: Vec::new(),
            value: 0,
            weight: 0.0,
            data: FormData::None,
        }
    }

    /// Set editor ID
    pub fn with_editor_id(mut self, editor_id: impl Into<String>) -> Self {
        self.editor_id = editor_id.into();
        self
    }

    /// Set display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a keyword
    pub fn with_keyword(mut self, keyword: FormId) -> Self {
        self.keywords.push(keyword);
        self
    }

    /// Set base value
    pub fn with_value(mut self, value: u32) -> Self {
        self.value = value;
        self
    }

    /// Set weight
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Set payload
    pub fn with_data(mut self, data: FormData) -> Self {
        self.data = data;
        self
    }

    /// Check for a keyword
    pub fn has_keyword(&self, keyword: FormId) -> bool {
        self.keywords.contains(&keyword)
    }

    /// Enchantment carried by a weapon or armor
    pub fn enchantment(&self) -> Option<&Enchantment> {
        match &self.data {
            FormData::Weapon(weapon) => weapon.enchantment.as_ref(),
            FormData::Armor(armor) => armor.enchantment.as_ref(),
            _ => None,
        }
    }

    /// Weapon or armor with a non-empty enchantment
    pub fn is_enchanted(&self) -> bool {
        self.enchantment()
            .map(|enchantment| !enchantment.effect_costs.is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_lookup() {
        assert_eq!(FormType::from_signature("WEAP"), Some(FormType::Weapon));
        assert_eq!(FormType::from_signature("slgm"), Some(FormType::SoulGem));
        assert_eq!(FormType::from_signature("XXXX"), None);
        assert_eq!("NPC_".parse::<FormType>(), Ok(FormType::Npc));
    }

    #[test]
    fn test_enchanted() {
        let plain = Form::new(FormId::new(1), FormType::Weapon)
            .with_data(FormData::Weapon(WeaponData::default()));
        assert!(!plain.is_enchanted());

        let enchanted = Form::new(FormId::new(2), FormType::Weapon).with_data(FormData::Weapon(WeaponData {
            damage: 7,
            enchantment: Some(Enchantment {
                effect_costs: vec![12.0],
                charge: 500,
            }),
        }));
        assert!(enchanted.is_enchanted());
        assert_eq!(enchanted.enchantment().map(Enchantment::cost), Some(12.0));
    }

    #[test]
    fn test_form_json_shape() {
        let form = Form::new(FormId::new(0x0100_0800), FormType::Misc)
            .with_name("Ruby")
            .with_value(100);
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["id"], 0x0100_0800u32);
        let back: Form = serde_json::from_value(json).unwrap();
        assert_eq!(back, form);
    }
}
