//! Harvest Collections - Item Collections
//!
//! Players define collections in JSON: named sets of items described by a
//! condition tree or a list of categories. Items found in the world are
//! checked against every collection, and the first sighting of each member
//! is recorded.
//!
//! # Features
//!
//! - Schema-checked definition files, one group per file
//! - Membership resolved once at load, then O(1) lookups
//! - Per-collection policy (what to do with an item, notify, allow repeats)
//! - Queue of newly acquired items drained once per scan tick
//!
//! # Example
//!
//! ```ignore
//! use harvest_collections::prelude::*;
//!
//! let manager = CollectionManager::new(Arc::new(LogNotifier));
//! manager.load(&config_dir, ".json", &store, &data)?;
//!
//! let matcher = ConditionMatcher::new(&form).with_object_type(object_type).found_in(Scope::Container);
//! let (collectible, handling) = manager.treat_as_collectible(&matcher, false);
//! ```

pub mod collection;
pub mod definition;
pub mod error;
pub mod factory;
pub mod group;
pub mod manager;
pub mod policy;

pub mod prelude {
    pub use crate::collection::{Collection, CollectionFilter, ObservationRecord};
    pub use crate::definition::{validate_group, CollectionDefinition, GroupDefinition};
    pub use crate::error::{CollectionError, CollectionResult};
    pub use crate::factory::{parse_collection, parse_group};
    pub use crate::group::CollectionGroup;
    pub use crate::manager::{AddedItem, CollectionManager, CollectionSnapshot, LoadReport};
    pub use crate::policy::{CollectibleHandling, CollectionPolicy};
}

pub use prelude::*;
