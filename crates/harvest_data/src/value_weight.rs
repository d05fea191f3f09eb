//! Value/weight eligibility
//!
//! An item is skipped when its worth per unit weight falls below the
//! configured threshold for its type, unless it is worth enough to grab
//! regardless.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use harvest_core::{Form, FormData, ObjectType};
use serde::{Deserialize, Serialize};

/// Tolerance for ratio comparisons
pub const VALUE_WEIGHT_EPSILON: f64 = 0.01;

/// Gold added per point of weapon enchantment cost
const WEAPON_ENCHANTMENT_COST_FACTOR: f64 = 8.0;
/// Gold added per point of weapon charge
const WEAPON_CHARGE_FACTOR: f64 = 0.12;

/// Thresholds, all disabled at zero
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueWeightSettings {
    /// Ratio used for types without their own entry
    pub default_threshold: f64,
    /// Per-type ratio overrides, keyed by type name
    pub thresholds: BTreeMap<String, f64>,
    /// Absolute minimum worth for ammo
    pub ammo_threshold: f64,
    /// Worth at which an item is taken whatever its weight
    pub valuable_threshold: f64,
}

impl ValueWeightSettings {
    /// Create settings with one default ratio
    pub fn new(default_threshold: f64) -> Self {
        Self {
            default_threshold,
            ..Self::default()
        }
    }

    /// Override one type's ratio
    pub fn with_threshold(mut self, object_type: ObjectType, threshold: f64) -> Self {
        self.thresholds.insert(object_type.name().to_string(), threshold);
        self
    }

    pub fn with_ammo_threshold(mut self, threshold: f64) -> Self {
        self.ammo_threshold = threshold;
        self
    }

    pub fn with_valuable_threshold(mut self, threshold: f64) -> Self {
        self.valuable_threshold = threshold;
        self
    }

    /// Ratio threshold for a type
    pub fn threshold_for(&self, object_type: ObjectType) -> f64 {
        self.thresholds
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(object_type.name()))
            .map(|(_, threshold)| *threshold)
            .unwrap_or(self.default_threshold)
    }
}

/// A looting candidate with lazily computed worth
#[derive(Debug)]
pub struct LootableItem<'a> {
    form: &'a Form,
    object_type: ObjectType,
    worth: OnceCell<f64>,
}

impl<'a> LootableItem<'a> {
    /// Create a candidate
    pub fn new(form: &'a Form, object_type: ObjectType) -> Self {
        Self {
            form,
            object_type,
            worth: OnceCell::new(),
        }
    }

    pub fn form(&self) -> &'a Form {
        self.form
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Gold-equivalent worth, computed once
    pub fn worth(&self) -> f64 {
        *self.worth.get_or_init(|| compute_worth(self.form))
    }

    pub fn weight(&self) -> f64 {
        f64::from(self.form.weight)
    }

    /// True when the item should be skipped on value/weight grounds
    pub fn value_weight_too_low_to_loot(&self, settings: &ValueWeightSettings) -> bool {
        if self.object_type == ObjectType::Ammo {
            let threshold = settings.ammo_threshold;
            return threshold > 0.0 && self.worth() + VALUE_WEIGHT_EPSILON < threshold;
        }
        if self.object_type.is_value_weight_exempt() {
            return false;
        }
        let threshold = settings.threshold_for(self.object_type);
        if threshold <= 0.0 {
            return false;
        }
        let worth = self.worth();
        let weight = self.weight();
        if weight <= 0.0 {
            return false;
        }
        if worth <= 0.0 {
            return true;
        }
        worth / weight + VALUE_WEIGHT_EPSILON < threshold
    }

    /// Worth meets the always-take threshold
    pub fn is_valuable(&self, settings: &ValueWeightSettings) -> bool {
        settings.valuable_threshold > 0.0 && self.worth() >= settings.valuable_threshold
    }

    /// Combined check: valuable items pass before the ratio is considered
    pub fn passes_value_weight(&self, settings: &ValueWeightSettings) -> bool {
        self.is_valuable(settings) || !self.value_weight_too_low_to_loot(settings)
    }
}

fn compute_worth(form: &Form) -> f64 {
    let base = f64::from(form.value);
    match &form.data {
        FormData::Weapon(weapon) => match &weapon.enchantment {
            Some(enchantment) => {
                base + WEAPON_ENCHANTMENT_COST_FACTOR * f64::from(enchantment.cost())
                    + WEAPON_CHARGE_FACTOR * f64::from(enchantment.charge)
            }
            None => base,
        },
        FormData::Armor(armor) => match &armor.enchantment {
            Some(enchantment) => base + f64::from(enchantment.cost()),
            None => base,
        },
        FormData::Alchemy(alchemy) if !alchemy.effect_costs.is_empty() => {
            alchemy.effect_costs.iter().map(|cost| f64::from(*cost)).sum()
        }
        FormData::Ammo { damage } => f64::from(*damage),
        _ => base,
    }
}
