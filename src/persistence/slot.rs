//! Save slot identifiers and the status reported to the save menu

use std::fmt;
use std::str::FromStr;

use super::PersistenceError;

/// Wire token for the quick slot
pub const QUICK_TOKEN: &str = "q";
/// Prefix of autosave slot tokens (`a0`, `a1`, ...)
pub const AUTO_PREFIX: char = 'a';

/// A named save slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    /// Manual slot `0..max_slots`
    Numbered(u32),
    /// Autosave chain position, `Auto(0)` is the most recent
    Auto(u32),
    /// The single quick-save slot
    Quick,
}

impl SlotId {
    pub fn is_auto(&self) -> bool {
        matches!(self, SlotId::Auto(_))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::Numbered(i) => write!(f, "{i}"),
            SlotId::Auto(i) => write!(f, "{AUTO_PREFIX}{i}"),
            SlotId::Quick => f.write_str(QUICK_TOKEN),
        }
    }
}

impl FromStr for SlotId {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || PersistenceError::UnknownSlot(s.to_string());

        if s == QUICK_TOKEN {
            return Ok(SlotId::Quick);
        }
        // Canonical decimal only: no signs, whitespace or leading zeros, so
        // each slot has exactly one token
        let digits_only = |t: &str| {
            !t.is_empty()
                && t.bytes().all(|b| b.is_ascii_digit())
                && !(t.len() > 1 && t.starts_with('0'))
        };

        if let Some(rest) = s.strip_prefix(AUTO_PREFIX) {
            if digits_only(rest) {
                return rest.parse().map(SlotId::Auto).map_err(|_| unknown());
            }
            return Err(unknown());
        }
        if digits_only(s) {
            return s.parse().map(SlotId::Numbered).map_err(|_| unknown());
        }
        Err(unknown())
    }
}

/// What the save menu shows for one slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotStatus {
    pub slot: SlotId,
    pub occupied: bool,
    /// Timestamp label, present only when occupied
    pub label: Option<String>,
}

impl SlotStatus {
    pub fn empty(slot: SlotId) -> Self {
        Self {
            slot,
            occupied: false,
            label: None,
        }
    }

    /// Text for the slot's info line
    pub fn display_label(&self) -> &str {
        match &self.label {
            Some(label) if self.occupied => label,
            _ => "Empty",
        }
    }

    /// Caption for the slot's primary button
    pub fn button_caption(&self) -> &'static str {
        if self.occupied { "Load" } else { "Save" }
    }
}

/// A stored slot: serialized state plus its display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    pub state: String,
    pub label: String,
}
