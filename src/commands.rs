//! Input events → named actions
//!
//! Clicks are bound by element id, keys by `KeyboardEvent.key`. Save menu
//! buttons carry their slot in the id (`save_button_a0`, `delete_button_3`)
//! and are resolved by prefix.

use std::collections::HashMap;

use crate::persistence::SlotId;
use crate::sidebar::Side;

/// Something the player asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    QuickSave,
    QuickLoad,
    SaveSlot(SlotId),
    LoadSlot(SlotId),
    DeleteSlot(SlotId),
    /// Load if the slot is occupied, save otherwise
    SlotButton(SlotId),
    Autosave,
    OpenSaveMenu,
    CloseSaveMenu,
    ToggleTheme,
    ToggleSidebar(Side),
    CloseSidebars,
    FocusNextChoice,
    FocusPrevChoice,
    /// An available choice was clicked; the engine handles the choice itself
    SelectChoice(usize),
}

/// A raw input event, already reduced to what the registry matches on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Click on the element with this id
    Click(String),
    /// Key press anywhere on the page
    Key(String),
    /// Click on the n-th available choice
    Choice(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotButton {
    Primary,
    Delete,
}

/// Lookup table from events to actions
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    clicks: HashMap<String, Action>,
    keys: HashMap<String, Action>,
    slot_buttons: Vec<(String, SlotButton)>,
}

impl CommandRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings for the stock page layout
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .bind_click("progress-toggle", Action::ToggleSidebar(Side::Left))
            .bind_click("info-toggle", Action::ToggleSidebar(Side::Right))
            .bind_click("sidebar-theme-toggle", Action::ToggleTheme)
            .bind_click("sidebar-overlay", Action::CloseSidebars)
            .bind_click("quick-save", Action::QuickSave)
            .bind_click("quick-load", Action::QuickLoad)
            .bind_click("save-toggle", Action::OpenSaveMenu)
            // Clicking the save menu backdrop (not its contents) closes it
            .bind_click("save", Action::CloseSaveMenu)
            .bind_key("Escape", Action::CloseSidebars)
            .bind_key("ArrowDown", Action::FocusNextChoice)
            .bind_key("ArrowUp", Action::FocusPrevChoice);
        registry.slot_buttons = vec![
            ("save_button_".to_string(), SlotButton::Primary),
            ("delete_button_".to_string(), SlotButton::Delete),
        ];
        registry
    }

    pub fn bind_click(&mut self, element_id: &str, action: Action) -> &mut Self {
        self.clicks.insert(element_id.to_string(), action);
        self
    }

    pub fn bind_key(&mut self, key: &str, action: Action) -> &mut Self {
        self.keys.insert(key.to_string(), action);
        self
    }

    /// Action for an event, if anything is bound to it
    pub fn resolve(&self, event: &InputEvent) -> Option<Action> {
        match event {
            InputEvent::Key(key) => self.keys.get(key).copied(),
            InputEvent::Choice(index) => Some(Action::SelectChoice(*index)),
            InputEvent::Click(id) => self
                .clicks
                .get(id)
                .copied()
                .or_else(|| self.resolve_slot_button(id)),
        }
    }

    fn resolve_slot_button(&self, id: &str) -> Option<Action> {
        self.slot_buttons.iter().find_map(|(prefix, kind)| {
            let slot: SlotId = id.strip_prefix(prefix.as_str())?.parse().ok()?;
            Some(match kind {
                SlotButton::Primary => Action::SlotButton(slot),
                SlotButton::Delete => Action::DeleteSlot(slot),
            })
        })
    }
}

/// Next choice to focus with the arrow keys, wrapping at either end
///
/// With nothing focused, both directions land on the first choice.
pub fn step_choice(current: Option<usize>, count: usize, forward: bool) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let next = match current.filter(|&i| i < count) {
        None => 0,
        Some(i) if forward => (i + 1) % count,
        Some(i) => (i + count - 1) % count,
    };
    Some(next)
}
