//! Keyword classification table
//!
//! Vendor keywords sort most inventory items into an [`ObjectType`]. Exact
//! editor IDs are checked first, then a substring list in declared order,
//! then any remaining `VendorItem*` keyword counts as clutter.

use std::collections::HashMap;

use harvest_core::{Form, FormId, ObjectType};

/// Exact keyword editor IDs
pub const KEYWORD_OBJECT_TYPES: &[(&str, ObjectType)] = &[
    ("VendorItemAnimalHide", ObjectType::AnimalHide),
    ("VendorItemAnimalPart", ObjectType::AnimalParts),
    ("VendorItemGem", ObjectType::Gem),
    ("VendorItemOreIngot", ObjectType::OreIngot),
    ("VendorItemSoulGem", ObjectType::Soulgem),
    ("VendorItemKey", ObjectType::Key),
    ("VendorItemFood", ObjectType::Food),
    ("VendorItemFoodRaw", ObjectType::Food),
    ("VendorItemIngredient", ObjectType::Ingredient),
    ("VendorItemPotion", ObjectType::Potion),
    ("VendorItemPoison", ObjectType::Poison),
    ("VendorItemScroll", ObjectType::Scroll),
    ("VendorItemSpellTome", ObjectType::Spellbook),
    ("VendorItemBook", ObjectType::Book),
    ("VendorItemRecipe", ObjectType::Book),
    ("VendorItemArrow", ObjectType::Ammo),
    ("VendorItemJewelry", ObjectType::Jewelry),
    ("ArmorJewelry", ObjectType::Jewelry),
    ("ClothingRing", ObjectType::Jewelry),
    ("ClothingNecklace", ObjectType::Jewelry),
    ("ClothingCirclet", ObjectType::Jewelry),
    ("VendorItemClutter", ObjectType::Clutter),
    ("VendorItemTool", ObjectType::Clutter),
    ("VendorItemFireword", ObjectType::Clutter),
];

/// Substring fallbacks, first match wins
pub const KEYWORD_SUBSTRINGS: &[(&str, ObjectType)] = &[
    ("Jewelry", ObjectType::Jewelry),
    ("SoulGem", ObjectType::Soulgem),
    ("Gem", ObjectType::Gem),
    ("Hide", ObjectType::AnimalHide),
    ("Pelt", ObjectType::AnimalHide),
    ("AnimalPart", ObjectType::AnimalParts),
    ("Ingot", ObjectType::OreIngot),
    ("Food", ObjectType::Food),
    ("Drink", ObjectType::Drink),
];

const VENDOR_ITEM_PREFIX: &str = "VendorItem";

/// Classify a keyword by editor ID
pub fn classify_keyword(editor_id: &str) -> Option<ObjectType> {
    if let Some((_, object_type)) = KEYWORD_OBJECT_TYPES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(editor_id))
    {
        return Some(*object_type);
    }
    if let Some((_, object_type)) = KEYWORD_SUBSTRINGS
        .iter()
        .find(|(fragment, _)| editor_id.contains(fragment))
    {
        return Some(*object_type);
    }
    editor_id
        .starts_with(VENDOR_ITEM_PREFIX)
        .then_some(ObjectType::Clutter)
}

/// Resolved keyword -> object type map
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    by_keyword: HashMap<FormId, ObjectType>,
}

impl KeywordTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one keyword form; returns the type if it has one
    pub fn register(&mut self, keyword: &Form) -> Option<ObjectType> {
        let object_type = classify_keyword(&keyword.editor_id)?;
        self.by_keyword.insert(keyword.id, object_type);
        Some(object_type)
    }

    /// Type of a single keyword
    pub fn get(&self, keyword: FormId) -> Option<ObjectType> {
        self.by_keyword.get(&keyword).copied()
    }

    /// Type implied by the first classified keyword on a form
    pub fn object_type_for(&self, form: &Form) -> Option<ObjectType> {
        form.keywords.iter().find_map(|keyword| self.get(*keyword))
    }

    pub fn len(&self) -> usize {
        self.by_keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_keyword.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::FormType;

    #[test]
    fn test_exact_before_substring() {
        assert_eq!(classify_keyword("VendorItemSoulGem"), Some(ObjectType::Soulgem));
        assert_eq!(classify_keyword("VendorItemGem"), Some(ObjectType::Gem));
        assert_eq!(classify_keyword("ClothingRing"), Some(ObjectType::Jewelry));
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(classify_keyword("ModPrecious_GemCut"), Some(ObjectType::Gem));
        assert_eq!(classify_keyword("VendorItemDaedricArtifact"), Some(ObjectType::Clutter));
        assert_eq!(classify_keyword("MagicDisallowEnchanting"), None);
    }

    #[test]
    fn test_first_classified_keyword() {
        let mut table = KeywordTable::new();
        let hide = Form::new(FormId::new(0x1), FormType::Keyword).with_editor_id("VendorItemAnimalHide");
        let other = Form::new(FormId::new(0x2), FormType::Keyword).with_editor_id("ArmorHeavy");
        assert_eq!(table.register(&hide), Some(ObjectType::AnimalHide));
        assert_eq!(table.register(&other), None);
        assert_eq!(table.len(), 1);

        let pelt = Form::new(FormId::new(0x10), FormType::Misc)
            .with_keyword(FormId::new(0x2))
            .with_keyword(FormId::new(0x1));
        assert_eq!(table.object_type_for(&pelt), Some(ObjectType::AnimalHide));
    }
}
