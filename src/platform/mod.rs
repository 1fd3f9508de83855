//! Browser bindings
//!
//! Handles the browser side of:
//! - Storage (LocalStorage)
//! - The JS story engine object
//! - DOM feedback (notifications, save menu, sidebars, theme)

pub mod dom;
pub mod engine;
pub mod storage;

pub use dom::DomSink;
pub use engine::JsEngine;
pub use storage::LocalStore;
