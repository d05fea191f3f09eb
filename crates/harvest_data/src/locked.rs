//! Locked-container aging
//!
//! A container the player just unlocked keeps counting as locked for a
//! short grace window, so they get first pick before auto-loot moves in.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use harvest_core::FormId;

/// How long an object glows after being flagged; also the unlock grace window
pub const OBJECT_GLOW_DURATION: Duration = Duration::from_secs(10);

/// Grace window after a container was last seen locked
pub const LOCKED_CONTAINER_GRACE: Duration = OBJECT_GLOW_DURATION;

/// Last-seen-locked timestamps per container reference
#[derive(Debug)]
pub struct LockedContainers {
    last_locked: HashMap<FormId, Instant>,
    grace: Duration,
}

impl LockedContainers {
    /// Create a tracker with the standard grace window
    pub fn new() -> Self {
        Self::with_grace(LOCKED_CONTAINER_GRACE)
    }

    /// Create a tracker with a custom grace window
    pub fn with_grace(grace: Duration) -> Self {
        Self {
            last_locked: HashMap::new(),
            grace,
        }
    }

    /// Check a container observed at `now`.
    ///
    /// Still-locked containers refresh their timestamp. An unlocked one is
    /// treated as locked until the grace window since it was last seen
    /// locked has elapsed, after which its entry is dropped.
    pub fn check(&mut self, refr: FormId, is_locked: bool, now: Instant) -> bool {
        if is_locked {
            self.last_locked.insert(refr, now);
            return true;
        }
        let Some(seen) = self.last_locked.get(&refr).copied() else {
            return false;
        };
        if now.saturating_duration_since(seen) > self.grace {
            self.last_locked.remove(&refr);
            log::debug!("Container {} no longer treated as locked", refr);
            false
        } else {
            true
        }
    }

    /// Whether a container is being tracked
    pub fn is_tracked(&self, refr: FormId) -> bool {
        self.last_locked.contains_key(&refr)
    }

    /// Number of tracked containers
    pub fn len(&self) -> usize {
        self.last_locked.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.last_locked.is_empty()
    }

    /// Forget every container
    pub fn clear(&mut self) {
        self.last_locked.clear();
    }
}

impl Default for LockedContainers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHEST: FormId = FormId::new(0x0001_2345);

    #[test]
    fn test_never_locked() {
        let mut locked = LockedContainers::new();
        assert!(!locked.check(CHEST, false, Instant::now()));
        assert!(locked.is_empty());
    }

    #[test]
    fn test_grace_window() {
        let mut locked = LockedContainers::new();
        let start = Instant::now();
        let epsilon = Duration::from_millis(1);

        assert!(locked.check(CHEST, true, start));
        assert!(locked.check(CHEST, false, start + LOCKED_CONTAINER_GRACE - epsilon));
        assert!(locked.is_tracked(CHEST));

        assert!(!locked.check(CHEST, false, start + LOCKED_CONTAINER_GRACE + epsilon));
        assert!(!locked.is_tracked(CHEST));
    }

    #[test]
    fn test_relock_refreshes() {
        let mut locked = LockedContainers::with_grace(Duration::from_secs(2));
        let start = Instant::now();

        locked.check(CHEST, true, start);
        locked.check(CHEST, true, start + Duration::from_secs(3));
        assert!(locked.check(CHEST, false, start + Duration::from_secs(4)));
    }
}
