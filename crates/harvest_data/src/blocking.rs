//! Block and blacklist tables
//!
//! Forms and references move between `Unblocked` and `Blocked(reason)`.
//! References can additionally be blacklisted, which holds for the rest of
//! the session and is only cleared by a full game reload.
//!
//! [`BlockTables`] is the unlocked state; [`DataCase`](crate::DataCase)
//! wraps it in a single lock and calls through, so a reset that reseeds
//! blocks never re-enters the lock.

use std::collections::{HashMap, HashSet};

use harvest_core::FormId;
use serde::{Deserialize, Serialize};

/// Why a form or reference is blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockReason {
    /// Already looted or harvested
    Looted,
    /// Checked and found not lootable
    Unlootable,
    /// Player blocked it by hand
    User,
    /// Listed in the known-exception table
    Exception,
    /// Item stream from a firehose source such as a waterfall or forge
    Firehose,
    /// Dig site that refills on a cooldown
    VolcanicDigSite,
}

impl BlockReason {
    /// Blocks that model a real cooldown and survive cell changes
    pub fn survives_cell_change(&self) -> bool {
        matches!(self, BlockReason::Firehose | BlockReason::VolcanicDigSite)
    }
}

/// Trigger for clearing reference blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceReset {
    /// Player moved to another cell
    CellChange,
    /// Save loaded or new game started
    GameReload,
}

/// Unlocked block state
#[derive(Debug, Default)]
pub(crate) struct BlockTables {
    forms: HashMap<FormId, BlockReason>,
    permanent_forms: HashMap<FormId, BlockReason>,
    references: HashMap<FormId, BlockReason>,
    blacklist: HashSet<FormId>,
}

impl BlockTables {
    pub(crate) fn block_form(&mut self, id: FormId, reason: BlockReason) -> bool {
        if id.is_none() || id.is_dynamic() {
            log::debug!("Not blocking dynamic form {}", id);
            return false;
        }
        self.forms.insert(id, reason);
        true
    }

    pub(crate) fn block_form_permanently(&mut self, id: FormId, reason: BlockReason) -> bool {
        if !self.block_form(id, reason) {
            return false;
        }
        self.permanent_forms.insert(id, reason);
        true
    }

    pub(crate) fn unblock_form_permanently(&mut self, id: FormId) -> bool {
        let had = self.permanent_forms.remove(&id).is_some();
        self.forms.remove(&id);
        had
    }

    pub(crate) fn is_form_blocked(&self, id: FormId) -> Option<BlockReason> {
        self.forms.get(&id).copied()
    }

    /// Drop every transient form block and reseed from the permanent set
    pub(crate) fn reset_forms(&mut self) {
        self.forms.clear();
        let permanent: Vec<(FormId, BlockReason)> =
            self.permanent_forms.iter().map(|(id, reason)| (*id, *reason)).collect();
        for (id, reason) in permanent {
            self.block_form(id, reason);
        }
    }

    pub(crate) fn block_reference(&mut self, refr: FormId, reason: BlockReason) -> bool {
        if refr.is_none() || refr.is_dynamic() {
            log::debug!("Not blocking dynamic reference {}", refr);
            return false;
        }
        self.references.insert(refr, reason);
        true
    }

    pub(crate) fn unblock_reference(&mut self, refr: FormId) -> bool {
        self.references.remove(&refr).is_some()
    }

    pub(crate) fn is_reference_blocked(&self, refr: FormId) -> Option<BlockReason> {
        self.references.get(&refr).copied()
    }

    pub(crate) fn reset_references(&mut self, reset: ReferenceReset) {
        match reset {
            ReferenceReset::CellChange => self
                .references
                .retain(|_, reason| reason.survives_cell_change()),
            ReferenceReset::GameReload => {
                self.references.clear();
                self.blacklist.clear();
            }
        }
    }

    pub(crate) fn blacklist_reference(&mut self, refr: FormId) -> bool {
        if refr.is_none() || refr.is_dynamic() {
            log::debug!("Not blacklisting dynamic reference {}", refr);
            return false;
        }
        self.blacklist.insert(refr);
        true
    }

    pub(crate) fn is_reference_blacklisted(&self, refr: FormId) -> bool {
        self.blacklist.contains(&refr)
    }

    #[cfg(test)]
    fn blocked_reference_count(&self) -> usize {
        self.references.len()
    }

    #[cfg(test)]
    fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }
}
