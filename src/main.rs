//! Story Chat entry point
//!
//! In the browser this installs the page listeners and exports the hooks
//! the story engine calls. Natively it runs a short scripted session.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::convert::FromWasmAbi;
    use wasm_bindgen::prelude::*;
    use web_sys::{AddEventListenerOptions, Element, HtmlElement, KeyboardEvent, TouchEvent};

    use story_chat::app::StoryApp;
    use story_chat::commands::{Action, InputEvent};
    use story_chat::persistence::{PersistenceConfig, SaveManager, SlotId, SystemClock};
    use story_chat::platform::{DomSink, JsEngine, LocalStore};
    use story_chat::ui::{Severity, UiSink};

    /// Everything alive between engine callbacks
    struct Runtime {
        app: StoryApp<LocalStore, SystemClock>,
        engine: JsEngine,
        ui: DomSink,
    }

    thread_local! {
        static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
    }

    /// Run `f` on the runtime. Calls that arrive while another one is running
    /// (the engine calling back into us from `setState`) are dropped.
    fn with_runtime(f: impl FnOnce(&mut Runtime)) {
        RUNTIME.with(|cell| match cell.try_borrow_mut() {
            Ok(mut guard) => match guard.as_mut() {
                Some(rt) => f(rt),
                None => log::warn!("Story engine not attached yet"),
            },
            Err(_) => log::warn!("Re-entrant call ignored"),
        });
    }

    fn parse_slot(slot: &str) -> Option<SlotId> {
        match slot.parse() {
            Ok(slot) => Some(slot),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    fn run_action(action: Action) {
        with_runtime(|rt| {
            let ctx = rt.ui.input_context();
            rt.app.perform(action, &ctx, &mut rt.engine, &mut rt.ui);
        });
    }

    /// Hook the presentation layer up to an engine
    #[wasm_bindgen(js_name = attachEngine)]
    pub fn attach_engine(engine: JsEngine, title: &str, build: &str) {
        let Some(mut ui) = DomSink::new() else {
            log::error!("No document, cannot attach");
            return;
        };
        let config = PersistenceConfig::for_story(title, build);
        log::info!("Save namespace: {}", config.namespace);

        let saves = SaveManager::new(config, LocalStore::open(), SystemClock);
        let mut app = StoryApp::new(saves);
        app.start(ui.viewport_width(), &mut ui);

        let first = RUNTIME.with(|cell| {
            cell.borrow_mut()
                .replace(Runtime { app, engine, ui })
                .is_none()
        });
        if first {
            setup_listeners();
        }
    }

    #[wasm_bindgen(js_name = displayText)]
    pub fn display_text(text: &str) -> String {
        // Stateless, so safe to call from inside engine callbacks
        story_chat::dialogue::format_line(text)
    }

    #[wasm_bindgen(js_name = onNewPage)]
    pub fn on_new_page() {
        with_runtime(|rt| rt.app.on_new_page(&rt.engine, &mut rt.ui));
    }

    #[wasm_bindgen(js_name = onDisplayContent)]
    pub fn on_display_content() {
        with_runtime(|rt| rt.app.on_display_content(&mut rt.ui));
    }

    #[wasm_bindgen(js_name = quickSave)]
    pub fn quick_save() {
        run_action(Action::QuickSave);
    }

    #[wasm_bindgen(js_name = quickLoad)]
    pub fn quick_load() {
        run_action(Action::QuickLoad);
    }

    #[wasm_bindgen(js_name = saveSlot)]
    pub fn save_slot(slot: &str) {
        if let Some(slot) = parse_slot(slot) {
            run_action(Action::SaveSlot(slot));
        }
    }

    #[wasm_bindgen(js_name = loadSlot)]
    pub fn load_slot(slot: &str) {
        if let Some(slot) = parse_slot(slot) {
            run_action(Action::LoadSlot(slot));
        }
    }

    #[wasm_bindgen(js_name = deleteSlot)]
    pub fn delete_slot(slot: &str) {
        if let Some(slot) = parse_slot(slot) {
            run_action(Action::DeleteSlot(slot));
        }
    }

    #[wasm_bindgen]
    pub fn autosave() {
        run_action(Action::Autosave);
    }

    #[wasm_bindgen(js_name = populateSaveSlots)]
    pub fn populate_save_slots(max_slots: u32, max_auto_slots: u32) {
        with_runtime(|rt| {
            let slots = rt.app.saves().populate_save_slots(max_slots, max_auto_slots);
            rt.ui.show_slots(&slots);
        });
    }

    #[wasm_bindgen(js_name = showSaveSlots)]
    pub fn show_save_slots() {
        run_action(Action::OpenSaveMenu);
    }

    #[wasm_bindgen(js_name = hideSaveSlots)]
    pub fn hide_save_slots() {
        run_action(Action::CloseSaveMenu);
    }

    #[wasm_bindgen(js_name = showNotification)]
    pub fn show_notification(message: &str, kind: Option<String>) {
        let severity = match kind.as_deref() {
            Some("success") => Severity::Success,
            Some("error") => Severity::Error,
            _ => Severity::Info,
        };
        with_runtime(|rt| rt.ui.notify(message, severity));
    }

    /// Id of the clicked element, or of the button it sits in
    fn click_target_id(target: &Element) -> Option<String> {
        let id = target.id();
        if !id.is_empty() {
            return Some(id);
        }
        let button = target.closest("button[id], [role=button][id]").ok()??;
        Some(button.id())
    }

    fn event_element(event: &web_sys::Event) -> Option<Element> {
        event.target()?.dyn_into::<Element>().ok()
    }

    fn first_touch(event: &TouchEvent) -> Option<(f64, f64)> {
        let touch = event.touches().get(0)?;
        Some((touch.client_x() as f64, touch.client_y() as f64))
    }

    fn listen<E: FromWasmAbi + 'static>(
        target: &web_sys::EventTarget,
        name: &str,
        passive: bool,
        handler: impl FnMut(E) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        let _ = target.add_event_listener_with_callback_and_add_event_listener_options(
            name,
            closure.as_ref().unchecked_ref(),
            &options,
        );
        closure.forget();
    }

    fn setup_listeners() {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Clicks are routed through the command registry by element id, or
        // by position for story choices
        listen(&document, "click", true, |event: web_sys::MouseEvent| {
            let Some(target) = event_element(&event) else {
                return;
            };
            with_runtime(|rt| {
                let input = match rt.ui.choice_index(&target) {
                    Some(index) => InputEvent::Choice(index),
                    None => match click_target_id(&target) {
                        Some(id) => InputEvent::Click(id),
                        None => return,
                    },
                };
                let ctx = rt.ui.input_context();
                rt.app.handle_event(&input, &ctx, &mut rt.engine, &mut rt.ui);
            });
        });

        listen(&document, "keydown", false, |event: KeyboardEvent| {
            let key = event.key();

            // Enter/Space activate header buttons and choices
            if key == "Enter" || key == " " {
                if let Some(el) = event_element(&event)
                    .filter(|el| el.matches(".header-btn, ul.choices li").unwrap_or(false))
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                {
                    event.prevent_default();
                    el.click();
                }
                return;
            }

            with_runtime(|rt| {
                let ctx = rt.ui.input_context();
                let action =
                    rt.app
                        .handle_event(&InputEvent::Key(key), &ctx, &mut rt.engine, &mut rt.ui);
                if matches!(action, Some(Action::FocusNextChoice | Action::FocusPrevChoice))
                    && ctx.choice_count > 0
                {
                    event.prevent_default();
                }
            });
        });

        listen(&document, "touchstart", false, |event: TouchEvent| {
            let Some((x, y)) = first_touch(&event) else {
                return;
            };
            with_runtime(|rt| {
                let width = rt.ui.viewport_width();
                rt.app.touch_start(x, y, width);
            });
        });

        listen(&document, "touchmove", false, |event: TouchEvent| {
            let Some((x, y)) = first_touch(&event) else {
                return;
            };
            with_runtime(|rt| {
                if rt.app.touch_move(x, y, &mut rt.ui) {
                    event.prevent_default();
                }
            });
        });

        listen(&document, "touchend", true, |_event: TouchEvent| {
            with_runtime(|rt| rt.app.touch_end(&mut rt.ui));
        });

        listen(&window, "resize", true, |_event: web_sys::Event| {
            with_runtime(|rt| {
                let width = rt.ui.viewport_width();
                rt.app.resize(width, &mut rt.ui);
            });
        });

        listen(&window, "scroll", true, |_event: web_sys::Event| {
            with_runtime(|rt| {
                let offset = rt.ui.scroll_offset();
                rt.app.scroll(offset, &mut rt.ui);
            });
        });

        log::info!("Page listeners installed");
    }

    pub fn init() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
        log::info!("Story Chat loaded, waiting for attachEngine");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::init();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use story_chat::app::{InputContext, StoryApp};
    use story_chat::commands::InputEvent;
    use story_chat::engine::InMemoryEngine;
    use story_chat::persistence::{MemoryStore, PersistenceConfig, SaveManager, SlotId, SystemClock};
    use story_chat::ui::RecordingSink;

    env_logger::init();
    log::info!("Story Chat (native) starting...");
    log::info!("The page build runs in the browser - use `trunk serve` for the web version");

    let saves = SaveManager::new(
        PersistenceConfig::for_story("TestStory", "storyde"),
        MemoryStore::new(),
        SystemClock,
    );
    let mut app = StoryApp::new(saves);
    let mut ui = RecordingSink::new();
    let mut engine = InMemoryEngine::new("root");
    let ctx = InputContext::default();

    app.start(ctx.viewport_width, &mut ui);
    for scene in ["root", "reading-room", "stacks"] {
        engine.goto(scene);
        app.on_new_page(&engine, &mut ui);
    }
    app.save_slot(SlotId::Numbered(0), &engine, &mut ui);
    app.handle_event(&InputEvent::Click("save_button_a1".into()), &ctx, &mut engine, &mut ui);

    println!("\nSave slots:");
    for status in app.saves().slot_statuses() {
        println!("  {:>3}  {}", status.slot.to_string(), status.display_label().replace('\n', " "));
    }

    println!("\nNotifications:");
    for n in &ui.notifications {
        println!("  [{}] {}", n.severity.as_str(), n.message);
    }

    println!("\nDialogue:");
    for line in ["Narration: The lamps flicker.", "Librarian: Quiet, please.", "Me: Sorry!"] {
        println!("  {}", app.display_text(line));
    }
}
