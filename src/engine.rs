//! Story engine seam
//!
//! The engine owns scene traversal and game state; this crate only snapshots
//! and restores it. The browser implementation wraps the JS engine object
//! (`platform::engine`), [`InMemoryEngine`] serves native builds and tests.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The engine refused to hand out its state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("engine state could not be exported: {0}")]
pub struct ExportError(pub String);

/// A stored snapshot could not be applied
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("save data is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("engine rejected save data: {0}")]
    Rejected(String),
}

/// What the save system needs from the engine
pub trait StoryEngine {
    /// Snapshot of all mutable game state
    type State: Serialize + DeserializeOwned;

    fn exportable_state(&self) -> Result<Self::State, ExportError>;

    /// Replace the current state. Fails if the snapshot is structurally invalid.
    fn set_state(&mut self, state: Self::State) -> Result<(), RestoreError>;

    /// Current scene id, used only for save labels
    fn scene_id(&self) -> String;
}

/// Scene id of the title screen; new pages there are not autosaved
pub const ROOT_SCENE: &str = "root";

/// Engine holding a JSON document as its whole state
///
/// The snapshot must be an object with a string `sceneId` field. Anything
/// else is rejected on restore, the same way the JS engine refuses snapshots
/// it cannot walk.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryEngine {
    state: Value,
}

impl InMemoryEngine {
    pub fn new(scene_id: &str) -> Self {
        Self {
            state: serde_json::json!({ "sceneId": scene_id, "qualities": {} }),
        }
    }

    /// Move to another scene
    pub fn goto(&mut self, scene_id: &str) {
        self.state["sceneId"] = Value::from(scene_id);
    }

    /// Set a numeric quality
    pub fn set_quality(&mut self, name: &str, value: f64) {
        if !self.state["qualities"].is_object() {
            self.state["qualities"] = serde_json::json!({});
        }
        self.state["qualities"][name] = Value::from(value);
    }

    pub fn quality(&self, name: &str) -> Option<f64> {
        self.state["qualities"].get(name).and_then(Value::as_f64)
    }

    pub fn state(&self) -> &Value {
        &self.state
    }
}

impl StoryEngine for InMemoryEngine {
    type State = Value;

    fn exportable_state(&self) -> Result<Value, ExportError> {
        Ok(self.state.clone())
    }

    fn set_state(&mut self, state: Value) -> Result<(), RestoreError> {
        match state.get("sceneId") {
            Some(Value::String(_)) => {
                self.state = state;
                Ok(())
            }
            _ => Err(RestoreError::Rejected("snapshot has no sceneId".into())),
        }
    }

    fn scene_id(&self) -> String {
        self.state["sceneId"].as_str().unwrap_or_default().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_engine_restore() {
        let mut engine = InMemoryEngine::new("intro");
        engine.set_quality("courage", 2.0);
        let snapshot = engine.exportable_state().unwrap();

        engine.goto("library");
        engine.set_quality("courage", 5.0);
        assert_eq!(engine.scene_id(), "library");

        engine.set_state(snapshot).unwrap();
        assert_eq!(engine.scene_id(), "intro");
        assert_eq!(engine.quality("courage"), Some(2.0));
    }

    #[test]
    fn test_in_memory_engine_rejects_shapeless_state() {
        let mut engine = InMemoryEngine::new("intro");
        let err = engine.set_state(serde_json::json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, RestoreError::Rejected(_)));
        assert_eq!(engine.scene_id(), "intro");
    }
}
