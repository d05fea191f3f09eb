//! Stable 32-bit form identifiers

use core::fmt;
use serde::{Deserialize, Serialize};

/// Top byte of every dynamic (session-scoped) form
const DYNAMIC_INDEX: u32 = 0xFF;
/// Top byte shared by all light plugins
const LIGHT_INDEX: u32 = 0xFE;

/// A game form identifier
///
/// The top byte selects the owning plugin (or `0xFE` for light plugins, which
/// carry a further 12-bit index, or `0xFF` for forms created at runtime).
/// The rest is the plugin-local ID.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(u32);

impl FormId {
    /// The null form
    pub const NONE: FormId = FormId(0);

    /// Create from the raw 32-bit value
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw 32-bit value
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Check if this is the null form
    #[inline]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Session-scoped ID that the host recycles. Never persist these.
    #[inline]
    pub const fn is_dynamic(&self) -> bool {
        self.0 >> 24 == DYNAMIC_INDEX
    }

    /// Belongs to a light plugin
    #[inline]
    pub const fn is_light(&self) -> bool {
        self.0 >> 24 == LIGHT_INDEX
    }

    /// Load order index byte
    #[inline]
    pub const fn mod_index(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Light plugin index, only meaningful when [`is_light`](Self::is_light)
    #[inline]
    pub const fn light_index(&self) -> u16 {
        ((self.0 >> 12) & 0xFFF) as u16
    }

    /// Plugin-relative portion of the ID
    #[inline]
    pub const fn local_id(&self) -> u32 {
        if self.is_light() {
            self.0 & 0xFFF
        } else {
            self.0 & 0x00FF_FFFF
        }
    }

    /// Parse a hex FormID, with or without a `0x` prefix
    pub fn parse_hex(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > 8 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self)
    }
}

impl From<u32> for FormId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormId(0x{:08X})", self.0)
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}
