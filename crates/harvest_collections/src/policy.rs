//! Collection policy

use serde::{Deserialize, Serialize};

/// What happens to a collectible item. Ordered from least to most
/// intrusive; when several collections claim an item the highest wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectibleHandling {
    /// Leave it where it is
    #[serde(alias = "discard")]
    Leave,
    /// Leave it and mention it
    Print,
    /// Leave it and highlight it
    Glow,
    /// Pick it up
    #[default]
    #[serde(alias = "keep")]
    Take,
}

impl CollectibleHandling {
    /// Whether the item ends up in the player's inventory
    pub fn is_take(&self) -> bool {
        matches!(self, CollectibleHandling::Take)
    }
}

/// Per-collection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionPolicy {
    pub action: CollectibleHandling,
    /// Tell the player when a new member is recorded
    pub notify: bool,
    /// Keep treating already-recorded items as collectible
    pub repeat: bool,
}

impl Default for CollectionPolicy {
    fn default() -> Self {
        Self {
            action: CollectibleHandling::Take,
            notify: true,
            repeat: false,
        }
    }
}

impl CollectionPolicy {
    /// Create a policy
    pub fn new(action: CollectibleHandling, notify: bool, repeat: bool) -> Self {
        Self { action, notify, repeat }
    }
}
