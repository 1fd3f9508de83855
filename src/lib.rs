//! Story Chat - chat-style presentation layer for an interactive fiction engine
//!
//! Core modules:
//! - `persistence`: Save slots, autosave chain and quick save over a key-value store
//! - `dialogue`: Speaker-prefixed lines → chat bubble markup
//! - `app`: Actions wired to persistence and page feedback
//! - `commands`: Input events → named actions
//! - `sidebar`: Sidebar visibility and swipe-to-close
//! - `platform`: Browser bindings (LocalStorage, DOM, JS engine)

pub mod app;
pub mod commands;
pub mod dialogue;
pub mod engine;
pub mod persistence;
#[cfg(target_arch = "wasm32")]
pub mod platform;
pub mod settings;
pub mod sidebar;
pub mod ui;

pub use app::{InputContext, StoryApp};
pub use dialogue::{PrefixTable, format_line};
pub use engine::StoryEngine;
pub use persistence::{PersistenceConfig, PersistenceError, SaveManager, SlotId};
pub use settings::Theme;
