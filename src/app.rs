//! The presentation layer as one object
//!
//! `StoryApp` turns actions into persistence calls and page feedback. Every
//! save error ends here: it is logged and shown once, never retried.

use crate::commands::{Action, CommandRegistry, InputEvent, step_choice};
use crate::dialogue::PrefixTable;
use crate::engine::{ROOT_SCENE, StoryEngine};
use crate::persistence::{Clock, KeyValueStore, PersistenceError, SaveManager, SlotId};
use crate::settings::Theme;
use crate::sidebar::{Drag, SidebarLayout, SwipeTracker};
use crate::ui::{HEADER_SCROLL_THRESHOLD, Severity, UiSink};

/// Page facts an event handler needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputContext {
    pub viewport_width: f64,
    /// Available (not greyed out) choices on screen
    pub choice_count: usize,
    /// Index among available choices of the focused one
    pub focused_choice: Option<usize>,
}

impl Default for InputContext {
    fn default() -> Self {
        Self {
            viewport_width: 1024.0,
            choice_count: 0,
            focused_choice: None,
        }
    }
}

pub struct StoryApp<S, C> {
    saves: SaveManager<S, C>,
    dialogue: PrefixTable,
    commands: CommandRegistry,
    theme: Theme,
    layout: SidebarLayout,
    swipe: SwipeTracker,
    header_scrolled: bool,
}

impl<S: KeyValueStore, C: Clock> StoryApp<S, C> {
    pub fn new(saves: SaveManager<S, C>) -> Self {
        let theme = Theme::load(saves.store());
        Self {
            saves,
            dialogue: PrefixTable::standard(),
            commands: CommandRegistry::standard(),
            theme,
            layout: SidebarLayout::default(),
            swipe: SwipeTracker::new(),
            header_scrolled: false,
        }
    }

    pub fn with_dialogue(mut self, dialogue: PrefixTable) -> Self {
        self.dialogue = dialogue;
        self
    }

    /// Push initial theme and sidebar state to the page
    pub fn start(&mut self, viewport_width: f64, ui: &mut impl UiSink) {
        ui.apply_theme(self.theme);
        self.resize(viewport_width, ui);
        log::info!("Interface ready ({} theme)", self.theme.as_str());
    }

    pub fn saves(&self) -> &SaveManager<S, C> {
        &self.saves
    }

    pub fn saves_mut(&mut self) -> &mut SaveManager<S, C> {
        &mut self.saves
    }

    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn layout(&self) -> &SidebarLayout {
        &self.layout
    }

    /// Engine hook: turn a line of story text into chat markup
    pub fn display_text(&self, text: &str) -> String {
        self.dialogue.format_line(text)
    }

    /// Engine hook: a new page was displayed
    pub fn on_new_page<E: StoryEngine>(&mut self, engine: &E, ui: &mut impl UiSink) {
        if engine.scene_id() != ROOT_SCENE {
            self.autosave(engine, ui);
        }
    }

    /// Engine hook: new content finished rendering
    ///
    /// Ends the busy state a choice click started and scrolls to the new text.
    pub fn on_display_content(&mut self, ui: &mut impl UiSink) {
        ui.set_busy(false);
        ui.scroll_to_latest();
    }

    /// Highlight a picked choice and show the spinner until the engine
    /// reports new content
    pub fn choice_selected(&mut self, index: usize, ctx: &InputContext, ui: &mut impl UiSink) {
        if index >= ctx.choice_count {
            log::debug!("Choice {index} is not available");
            return;
        }
        ui.mark_choice_selected(index);
        ui.set_busy(true);
    }

    /// Page scrolled to `offset`; only pushes the header state when it flips
    pub fn scroll(&mut self, offset: f64, ui: &mut impl UiSink) {
        let scrolled = offset > HEADER_SCROLL_THRESHOLD;
        if scrolled != self.header_scrolled {
            self.header_scrolled = scrolled;
            ui.set_header_scrolled(scrolled);
        }
    }

    /// Resolve an event and run whatever it is bound to
    pub fn handle_event<E: StoryEngine>(
        &mut self,
        event: &InputEvent,
        ctx: &InputContext,
        engine: &mut E,
        ui: &mut impl UiSink,
    ) -> Option<Action> {
        let action = self.commands.resolve(event)?;
        log::debug!("{event:?} -> {action:?}");
        self.perform(action, ctx, engine, ui);
        Some(action)
    }

    pub fn perform<E: StoryEngine>(
        &mut self,
        action: Action,
        ctx: &InputContext,
        engine: &mut E,
        ui: &mut impl UiSink,
    ) {
        match action {
            Action::QuickSave => self.quick_save(engine, ui),
            Action::QuickLoad => self.quick_load(engine, ui),
            Action::SaveSlot(slot) => self.save_slot(slot, engine, ui),
            Action::LoadSlot(slot) => self.load_slot(slot, engine, ui),
            Action::DeleteSlot(slot) => self.delete_slot(slot, ui),
            Action::SlotButton(slot) => {
                if self.saves.is_occupied(slot) {
                    self.load_slot(slot, engine, ui);
                } else {
                    self.save_slot(slot, engine, ui);
                }
            }
            Action::Autosave => self.autosave(engine, ui),
            Action::OpenSaveMenu => {
                self.refresh(ui);
                ui.show_save_menu();
            }
            Action::CloseSaveMenu => ui.hide_save_menu(),
            Action::ToggleTheme => self.toggle_theme(ui),
            Action::ToggleSidebar(side) => {
                self.layout.toggle(side, ctx.viewport_width);
                ui.apply_layout(&self.layout);
            }
            Action::CloseSidebars => {
                self.layout.close();
                ui.apply_layout(&self.layout);
            }
            Action::FocusNextChoice | Action::FocusPrevChoice => {
                let forward = action == Action::FocusNextChoice;
                if let Some(i) = step_choice(ctx.focused_choice, ctx.choice_count, forward) {
                    ui.focus_choice(i);
                }
            }
            Action::SelectChoice(index) => self.choice_selected(index, ctx, ui),
        }
    }

    /// Redraw the save menu from storage
    pub fn refresh(&self, ui: &mut impl UiSink) {
        ui.show_slots(&self.saves.slot_statuses());
    }

    fn report(&self, err: PersistenceError, ui: &mut impl UiSink) {
        log::warn!("{err}");
        ui.notify(err.user_message(), Severity::Error);
    }

    pub fn quick_save<E: StoryEngine>(&mut self, engine: &E, ui: &mut impl UiSink) {
        match self.saves.quick_save(engine) {
            Ok(()) => ui.notify("Saved.", Severity::Success),
            Err(e) => self.report(e, ui),
        }
    }

    pub fn quick_load<E: StoryEngine>(&mut self, engine: &mut E, ui: &mut impl UiSink) {
        match self.saves.quick_load(engine) {
            Ok(()) => ui.notify("Loaded.", Severity::Success),
            Err(e) => self.report(e, ui),
        }
    }

    pub fn save_slot<E: StoryEngine>(&mut self, slot: SlotId, engine: &E, ui: &mut impl UiSink) {
        match self.saves.save_slot(slot, engine) {
            Ok(()) => {
                self.refresh(ui);
                ui.notify("Game saved successfully", Severity::Success);
            }
            Err(e) => self.report(e, ui),
        }
    }

    pub fn load_slot<E: StoryEngine>(&mut self, slot: SlotId, engine: &mut E, ui: &mut impl UiSink) {
        // Nothing to load, skip the spinner
        if let Err(e) = self.saves.check_slot(slot) {
            return self.report(e, ui);
        }
        if !self.saves.is_occupied(slot) {
            return self.report(PersistenceError::SlotEmpty(slot), ui);
        }
        ui.set_busy(true);
        let result = self.saves.load_slot(slot, engine);
        ui.set_busy(false);
        match result {
            Ok(()) => {
                self.refresh(ui);
                ui.hide_save_menu();
                ui.notify("Game loaded successfully", Severity::Success);
            }
            Err(e) => self.report(e, ui),
        }
    }

    pub fn delete_slot(&mut self, slot: SlotId, ui: &mut impl UiSink) {
        match self.saves.delete_slot(slot) {
            Ok(()) => {
                self.refresh(ui);
                ui.notify("Save deleted", Severity::Info);
            }
            Err(e) => self.report(e, ui),
        }
    }

    /// Silent unless it fails
    pub fn autosave<E: StoryEngine>(&mut self, engine: &E, ui: &mut impl UiSink) {
        ui.set_busy(true);
        let result = self.saves.autosave(engine);
        self.refresh(ui);
        ui.set_busy(false);
        if let Err(e) = result {
            self.report(e, ui);
        }
    }

    pub fn toggle_theme(&mut self, ui: &mut impl UiSink) {
        self.theme = self.theme.toggled();
        if let Err(e) = self.theme.save(self.saves.store_mut()) {
            // Still switch for this session
            log::warn!("Theme not saved: {e}");
        }
        ui.apply_theme(self.theme);
    }

    pub fn resize(&mut self, viewport_width: f64, ui: &mut impl UiSink) {
        self.layout.resize(viewport_width);
        ui.apply_layout(&self.layout);
    }

    pub fn touch_start(&mut self, x: f64, y: f64, viewport_width: f64) {
        self.swipe.start(x, y, &self.layout, viewport_width);
    }

    /// Returns true while a sidebar drag is in progress (the page should not scroll)
    pub fn touch_move(&mut self, x: f64, y: f64, ui: &mut impl UiSink) -> bool {
        if !self.swipe.is_dragging() {
            return false;
        }
        let drag = self.swipe.update(x, y);
        if let Drag::Offset(..) = drag {
            ui.drag_sidebar(drag);
        }
        true
    }

    pub fn touch_end(&mut self, ui: &mut impl UiSink) {
        if !self.swipe.is_dragging() {
            return;
        }
        ui.drag_sidebar(Drag::Idle);
        if self.swipe.end().is_some() {
            self.layout.close();
            ui.apply_layout(&self.layout);
        }
    }
}
