//! # harvest_core - Harvest Core
//!
//! The vocabulary every other Harvest crate speaks:
//! - **Form identity**: [`FormId`] with static/dynamic lifetime classes
//! - **Load order**: plugin name <-> FormID index mapping
//! - **Host form model**: the narrow view of the game's records that the
//!   engine integration materializes ([`Form`], [`FormStore`])
//! - **Taxonomy**: [`ObjectType`] and [`ResourceType`]
//!
//! The host engine itself is never touched from here. Everything the
//! decision engine needs from it comes through the traits in [`store`] and
//! [`host`].

pub mod error;
pub mod form;
pub mod form_id;
pub mod host;
pub mod load_order;
pub mod store;
pub mod taxonomy;

pub use error::{CoreError, CoreResult};
pub use form::{
    AlchemyData, ArmorData, BookData, BookTeaches, Enchantment, Form, FormData, FormType,
    LeveledEntry, PerkData, WeaponData,
};
pub use form_id::FormId;
pub use host::{LogNotifier, Notifier, Translations};
pub use load_order::{LoadOrder, PluginIndex, PluginInfo};
pub use store::{FormStore, MemoryFormStore};
pub use taxonomy::{ObjectType, ResourceType};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::form::{Form, FormData, FormType};
    pub use crate::form_id::FormId;
    pub use crate::host::{Notifier, Translations};
    pub use crate::load_order::LoadOrder;
    pub use crate::store::{FormStore, MemoryFormStore};
    pub use crate::taxonomy::{ObjectType, ResourceType};
}
