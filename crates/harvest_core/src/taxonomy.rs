//! Object taxonomy
//!
//! Every looting candidate maps to exactly one [`ObjectType`]. `Unknown` is
//! the explicit "not classified, not eligible" sentinel.

use serde::{Deserialize, Serialize};

/// Looting category of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectType {
    #[default]
    Unknown,
    Flora,
    Critter,
    Ingredient,
    Septims,
    Gem,
    Lockpick,
    AnimalHide,
    AnimalParts,
    OreIngot,
    Soulgem,
    Key,
    Clutter,
    Light,
    Book,
    Spellbook,
    Skillbook,
    BookRead,
    SpellbookRead,
    SkillbookRead,
    Scroll,
    Ammo,
    Weapon,
    EnchantedWeapon,
    Armor,
    EnchantedArmor,
    Jewelry,
    EnchantedJewelry,
    Potion,
    Poison,
    Food,
    Drink,
    OreVein,
    Container,
    Actor,
    AshPile,
    ManualLoot,
}

impl ObjectType {
    /// Every object type, in declaration order
    pub const ALL: [ObjectType; 37] = [
        ObjectType::Unknown,
        ObjectType::Flora,
        ObjectType::Critter,
        ObjectType::Ingredient,
        ObjectType::Septims,
        ObjectType::Gem,
        ObjectType::Lockpick,
        ObjectType::AnimalHide,
        ObjectType::AnimalParts,
        ObjectType::OreIngot,
        ObjectType::Soulgem,
        ObjectType::Key,
        ObjectType::Clutter,
        ObjectType::Light,
        ObjectType::Book,
        ObjectType::Spellbook,
        ObjectType::Skillbook,
        ObjectType::BookRead,
        ObjectType::SpellbookRead,
        ObjectType::SkillbookRead,
        ObjectType::Scroll,
        ObjectType::Ammo,
        ObjectType::Weapon,
        ObjectType::EnchantedWeapon,
        ObjectType::Armor,
        ObjectType::EnchantedArmor,
        ObjectType::Jewelry,
        ObjectType::EnchantedJewelry,
        ObjectType::Potion,
        ObjectType::Poison,
        ObjectType::Food,
        ObjectType::Drink,
        ObjectType::OreVein,
        ObjectType::Container,
        ObjectType::Actor,
        ObjectType::AshPile,
        ObjectType::ManualLoot,
    ];

    /// Canonical name, as used in settings and collection definitions
    pub fn name(&self) -> &'static str {
        match self {
            ObjectType::Unknown => "unknown",
            ObjectType::Flora => "flora",
            ObjectType::Critter => "critter",
            ObjectType::Ingredient => "ingredient",
            ObjectType::Septims => "septims",
            ObjectType::Gem => "gem",
            ObjectType::Lockpick => "lockpick",
            ObjectType::AnimalHide => "animalHide",
            ObjectType::AnimalParts => "animalParts",
            ObjectType::OreIngot => "oreIngot",
            ObjectType::Soulgem => "soulgem",
            ObjectType::Key => "key",
            ObjectType::Clutter => "clutter",
            ObjectType::Light => "light",
            ObjectType::Book => "book",
            ObjectType::Spellbook => "spellbook",
            ObjectType::Skillbook => "skillbook",
            ObjectType::BookRead => "bookRead",
            ObjectType::SpellbookRead => "spellbookRead",
            ObjectType::SkillbookRead => "skillbookRead",
            ObjectType::Scroll => "scroll",
            ObjectType::Ammo => "ammo",
            ObjectType::Weapon => "weapon",
            ObjectType::EnchantedWeapon => "enchantedWeapon",
            ObjectType::Armor => "armor",
            ObjectType::EnchantedArmor => "enchantedArmor",
            ObjectType::Jewelry => "jewelry",
            ObjectType::EnchantedJewelry => "enchantedJewelry",
            ObjectType::Potion => "potion",
            ObjectType::Poison => "poison",
            ObjectType::Food => "food",
            ObjectType::Drink => "drink",
            ObjectType::OreVein => "oreVein",
            ObjectType::Container => "container",
            ObjectType::Actor => "actor",
            ObjectType::AshPile => "ashPile",
            ObjectType::ManualLoot => "manualLoot",
        }
    }

    /// Inverse of [`name`](Self::name), case-insensitive. Unrecognized names
    /// map to `Unknown`.
    pub fn from_name(name: &str) -> ObjectType {
        ObjectType::ALL
            .iter()
            .copied()
            .find(|object_type| object_type.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(ObjectType::Unknown)
    }

    /// Categories whose looting decision is never value/weight gated
    pub fn is_value_weight_exempt(&self) -> bool {
        matches!(
            self,
            ObjectType::Septims
                | ObjectType::Key
                | ObjectType::OreVein
                | ObjectType::Ammo
                | ObjectType::Lockpick
        )
    }

    /// Enchanted counterpart of an equippable type. Enchanted types map to
    /// themselves, so applying this twice changes nothing.
    pub fn enchanted(&self) -> ObjectType {
        match self {
            ObjectType::Weapon => ObjectType::EnchantedWeapon,
            ObjectType::Armor => ObjectType::EnchantedArmor,
            ObjectType::Jewelry => ObjectType::EnchantedJewelry,
            other => *other,
        }
    }

    /// Check for one of the enchanted variants
    pub fn is_enchanted(&self) -> bool {
        matches!(
            self,
            ObjectType::EnchantedWeapon | ObjectType::EnchantedArmor | ObjectType::EnchantedJewelry
        )
    }

    /// Already-read counterpart of a book type
    pub fn read_variant(&self) -> ObjectType {
        match self {
            ObjectType::Book => ObjectType::BookRead,
            ObjectType::Spellbook => ObjectType::SpellbookRead,
            ObjectType::Skillbook => ObjectType::SkillbookRead,
            other => *other,
        }
    }

    /// Weapons, armor and jewelry, enchanted or not
    pub fn is_equippable(&self) -> bool {
        matches!(
            self,
            ObjectType::Weapon
                | ObjectType::EnchantedWeapon
                | ObjectType::Armor
                | ObjectType::EnchantedArmor
                | ObjectType::Jewelry
                | ObjectType::EnchantedJewelry
        )
    }

    /// Something in the world that yields loot rather than being loot
    pub fn is_harvestable(&self) -> bool {
        matches!(self, ObjectType::Flora | ObjectType::Critter | ObjectType::OreVein)
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Extraction flavor of an ore vein
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    #[default]
    Ore,
    Volcanic,
    Geode,
    VolcanicDigSite,
}

impl ResourceType {
    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Ore => "ore",
            ResourceType::Volcanic => "volcanic",
            ResourceType::Geode => "geode",
            ResourceType::VolcanicDigSite => "volcanicDigSite",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for object_type in ObjectType::ALL {
            assert_eq!(ObjectType::from_name(object_type.name()), object_type);
        }
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(ObjectType::from_name("dragonScale"), ObjectType::Unknown);
        assert_eq!(ObjectType::from_name("ENCHANTEDweapon"), ObjectType::EnchantedWeapon);
    }

    #[test]
    fn test_serde_matches_name() {
        for object_type in ObjectType::ALL {
            let json = serde_json::to_string(&object_type).unwrap();
            assert_eq!(json, format!("\"{}\"", object_type.name()));
        }
    }

    #[test]
    fn test_value_weight_exempt() {
        assert!(ObjectType::Septims.is_value_weight_exempt());
        assert!(ObjectType::Key.is_value_weight_exempt());
        assert!(ObjectType::OreVein.is_value_weight_exempt());
        assert!(ObjectType::Ammo.is_value_weight_exempt());
        assert!(ObjectType::Lockpick.is_value_weight_exempt());
        assert!(!ObjectType::Weapon.is_value_weight_exempt());
        assert!(!ObjectType::Clutter.is_value_weight_exempt());
    }

    #[test]
    fn test_enchanted_is_idempotent() {
        for object_type in ObjectType::ALL {
            assert_eq!(object_type.enchanted().enchanted(), object_type.enchanted());
        }
        assert_eq!(ObjectType::Jewelry.enchanted(), ObjectType::EnchantedJewelry);
        assert_eq!(ObjectType::Food.enchanted(), ObjectType::Food);
    }

    #[test]
    fn test_read_variant() {
        assert_eq!(ObjectType::Skillbook.read_variant(), ObjectType::SkillbookRead);
        assert_eq!(ObjectType::Scroll.read_variant(), ObjectType::Scroll);
    }
}
