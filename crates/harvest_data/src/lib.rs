//! Harvest Data - Taxonomy and Eligibility State
//!
//! This crate owns every classification table the looting engine consults.
//!
//! # Features
//!
//! - Once-per-load taxonomy build assigning an [`ObjectType`] to each form
//! - Form/reference block lists and the session blacklist
//! - Locked-container aging
//! - Producer -> lootable and leveled-list resolution
//! - Value/weight eligibility
//!
//! # Example
//!
//! ```ignore
//! use harvest_data::prelude::*;
//!
//! let data = DataCase::new();
//! let report = data.categorize_lootables(&store, &translations, &ExceptionTable::default());
//! let object_type = data.object_type_for_form(&form);
//! ```
//!
//! [`ObjectType`]: harvest_core::ObjectType

pub mod blocking;
pub mod categorize;
pub mod data_case;
pub mod error;
pub mod exceptions;
pub mod keywords;
pub mod leveled;
pub mod locked;
pub mod value_weight;

pub mod prelude {
    pub use crate::blocking::{BlockReason, ReferenceReset};
    pub use crate::categorize::{ActivationVerb, CategorizeLootables, CategorizeReport, ACTIVATION_VERBS};
    pub use crate::data_case::{decorate_if_enchanted, ClassificationConflict, DataCase, ProducerLootable};
    pub use crate::error::{DataError, DataResult};
    pub use crate::exceptions::{ExceptionAction, ExceptionEntry, ExceptionTable};
    pub use crate::leveled::LeveledItemCategorizer;
    pub use crate::keywords::{classify_keyword, KeywordTable};
    pub use crate::locked::{LockedContainers, LOCKED_CONTAINER_GRACE, OBJECT_GLOW_DURATION};
    pub use crate::value_weight::{LootableItem, ValueWeightSettings};
}

pub use prelude::*;
