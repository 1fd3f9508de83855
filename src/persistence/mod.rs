//! Save/load persistence over a string key-value store
//!
//! Features:
//! - Numbered manual slots, an autosave chain and a quick slot
//! - Namespaced keys so several stories can share one LocalStorage
//! - Autosave rotation (a0 → a1 → ... oldest dropped)
//! - Corrupt saves reported as errors, never panics

pub mod clock;
pub mod manager;
pub mod slot;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use manager::SaveManager;
pub use slot::{SlotEntry, SlotId, SlotStatus};
pub use store::{KeyValueStore, MemoryStore, StoreError};

use crate::engine::{ExportError, RestoreError};

/// Default number of manual slots in the save menu
pub const DEFAULT_MAX_SLOTS: u32 = 8;
/// Default autosave chain depth
pub const DEFAULT_MAX_AUTO_SLOTS: u32 = 2;

/// Persistence settings, fixed for the lifetime of a manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Prefix of every key this manager touches
    pub namespace: String,
    /// Manual slots `0..max_slots`
    pub max_slots: u32,
    /// Autosave chain depth, 0 disables autosave
    pub max_auto_slots: u32,
}

impl PersistenceConfig {
    /// Namespace derived from a story title and build id
    pub fn for_story(title: &str, build: &str) -> Self {
        Self {
            namespace: format!("{title}_{build}"),
            ..Self::default()
        }
    }

    pub fn with_slots(mut self, max_slots: u32, max_auto_slots: u32) -> Self {
        self.max_slots = max_slots;
        self.max_auto_slots = max_auto_slots;
        self
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            namespace: "story".to_string(),
            max_slots: DEFAULT_MAX_SLOTS,
            max_auto_slots: DEFAULT_MAX_AUTO_SLOTS,
        }
    }
}

/// Everything that can go wrong saving or loading
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("no save in slot {0}")]
    SlotEmpty(SlotId),
    #[error("could not load slot {slot}: {source}")]
    Restore {
        slot: SlotId,
        #[source]
        source: RestoreError,
    },
    #[error("could not serialize game state: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("unknown save slot {0:?}")]
    UnknownSlot(String),
    #[error("save slot {0} is out of range")]
    SlotOutOfRange(SlotId),
}

impl PersistenceError {
    /// Short text for the player
    pub fn user_message(&self) -> &'static str {
        match self {
            PersistenceError::SlotEmpty(_) => "No save available",
            PersistenceError::Restore { .. } => "Could not load save",
            PersistenceError::Serialization(_)
            | PersistenceError::Export(_)
            | PersistenceError::Storage(_) => "Save failed",
            PersistenceError::UnknownSlot(_) | PersistenceError::SlotOutOfRange(_) => {
                "No such save slot"
            }
        }
    }
}
