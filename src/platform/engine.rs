//! Binding to the JS story engine
//!
//! State crosses the boundary as JSON text: `JSON.stringify` on the way out,
//! `JSON.parse` on the way in.

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::engine::{ExportError, RestoreError, StoryEngine};

#[wasm_bindgen]
extern "C" {
    /// The engine object the page hands us at startup
    pub type JsEngine;

    #[wasm_bindgen(method, catch, js_name = getExportableState)]
    fn get_exportable_state(this: &JsEngine) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = setState)]
    fn set_state_js(this: &JsEngine, state: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, getter)]
    fn state(this: &JsEngine) -> JsValue;
}

impl StoryEngine for JsEngine {
    type State = Value;

    fn exportable_state(&self) -> Result<Value, ExportError> {
        let state = self
            .get_exportable_state()
            .map_err(|e| ExportError(format!("{e:?}")))?;
        // stringify yields undefined for functions and undefined itself
        let json = js_sys::JSON::stringify(&state)
            .map_err(|e| ExportError(format!("{e:?}")))?
            .as_string()
            .ok_or_else(|| ExportError("state is not serializable".into()))?;
        serde_json::from_str(&json).map_err(|e| ExportError(e.to_string()))
    }

    fn set_state(&mut self, state: Value) -> Result<(), RestoreError> {
        let json = serde_json::to_string(&state)?;
        let parsed = js_sys::JSON::parse(&json)
            .map_err(|e| RestoreError::Rejected(format!("{e:?}")))?;
        self.set_state_js(parsed)
            .map_err(|e| RestoreError::Rejected(format!("{e:?}")))
    }

    fn scene_id(&self) -> String {
        js_sys::Reflect::get(&self.state(), &JsValue::from_str("sceneId"))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default()
    }
}
