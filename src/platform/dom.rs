//! UiSink on the real page
//!
//! Works against the pre-rendered page: element ids and classes here must
//! match the HTML template and stylesheet.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, Window};

use crate::app::InputContext;
use crate::persistence::SlotStatus;
use crate::settings::Theme;
use crate::sidebar::{Drag, Side, SidebarLayout};
use crate::ui::{CHOICE_FEEDBACK_MS, Severity, UiSink};

const AVAILABLE_CHOICES: &str = "ul.choices li:not(.unavailable)";
/// Time for the fade-out transition before a notification is removed
const NOTIFICATION_FADE_MS: i32 = 300;
/// Let the engine finish laying out new content before scrolling to it
const SCROLL_DELAY_MS: i32 = 100;

pub struct DomSink {
    window: Window,
    document: Document,
    spinner: Option<Element>,
}

impl DomSink {
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        let spinner = create_spinner(&document);
        Some(Self {
            window,
            document,
            spinner,
        })
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    /// Run `f` after `ms` milliseconds
    fn later(&self, ms: i32, f: impl FnOnce() + 'static) {
        let callback = Closure::once_into_js(f);
        let _ = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), ms);
    }

    pub fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(1024.0)
    }

    /// Current viewport and choice focus, for the event handlers
    pub fn input_context(&self) -> InputContext {
        let mut ctx = InputContext {
            viewport_width: self.viewport_width(),
            ..Default::default()
        };
        let Ok(choices) = self.document.query_selector_all(AVAILABLE_CHOICES) else {
            return ctx;
        };
        ctx.choice_count = choices.length() as usize;

        if let Some(active) = self.document.active_element() {
            let active: &web_sys::Node = active.as_ref();
            ctx.focused_choice = (0..choices.length())
                .position(|i| choices.item(i).is_some_and(|n| n.is_same_node(Some(active))));
        }
        ctx
    }

    /// Index among available choices of the choice `target` sits in
    pub fn choice_index(&self, target: &Element) -> Option<usize> {
        let item = target.closest("ul.choices li").ok()??;
        if item.class_list().contains("unavailable") {
            return None;
        }
        let choices = self.document.query_selector_all(AVAILABLE_CHOICES).ok()?;
        let item: &web_sys::Node = item.as_ref();
        (0..choices.length())
            .position(|i| choices.item(i).is_some_and(|n| n.is_same_node(Some(item))))
    }

    /// Vertical page scroll offset
    pub fn scroll_offset(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }
}

fn create_spinner(document: &Document) -> Option<Element> {
    let el = document.create_element("div").ok()?;
    el.set_class_name("loading-indicator");
    el.set_inner_html(r#"<div class="loading-spinner"></div><span>Loading...</span>"#);
    document.body()?.append_child(&el).ok()?;
    Some(el)
}

fn set_class(el: &Element, class: &str, on: bool) {
    let list = el.class_list();
    let _ = if on { list.add_1(class) } else { list.remove_1(class) };
}

fn set_style(el: &Element, property: &str, value: &str) {
    if let Some(el) = el.dyn_ref::<HtmlElement>() {
        let _ = el.style().set_property(property, value);
    }
}

impl UiSink for DomSink {
    fn notify(&mut self, message: &str, severity: Severity) {
        let Ok(el) = self.document.create_element("div") else {
            return;
        };
        el.set_class_name(&format!("notification notification-{}", severity.as_str()));
        el.set_text_content(Some(message));
        let _ = el.set_attribute("role", "alert");
        let _ = el.set_attribute("aria-live", severity.aria_live());
        if let Some(body) = self.document.body() {
            let _ = body.append_child(&el);
        }

        // Slide in on the next frame, fade out, then detach
        let shown = el.clone();
        self.later(10, move || set_class(&shown, "show", true));
        let window = self.window.clone();
        self.later(severity.duration_ms() as i32, move || {
            set_class(&el, "show", false);
            let remove = Closure::once_into_js(move || el.remove());
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                remove.unchecked_ref(),
                NOTIFICATION_FADE_MS,
            );
        });
    }

    fn show_slots(&mut self, slots: &[SlotStatus]) {
        for status in slots {
            let id = status.slot.to_string();
            if let Some(info) = self.by_id(&format!("save_info_{id}")) {
                info.set_text_content(Some(status.display_label()));
            }
            if let Some(button) = self.by_id(&format!("save_button_{id}")) {
                button.set_text_content(Some(status.button_caption()));
            }
            if let Some(delete) = self.by_id(&format!("delete_button_{id}")) {
                let _ = if status.occupied {
                    delete.remove_attribute("disabled")
                } else {
                    delete.set_attribute("disabled", "")
                };
            }
        }
    }

    fn set_busy(&mut self, busy: bool) {
        if let Some(spinner) = &self.spinner {
            set_class(spinner, "active", busy);
        }
    }

    fn show_save_menu(&mut self) {
        if let Some(menu) = self.by_id("save") {
            set_style(&menu, "display", "flex");
        }
    }

    fn hide_save_menu(&mut self) {
        if let Some(menu) = self.by_id("save") {
            set_style(&menu, "display", "none");
        }
    }

    fn apply_theme(&mut self, theme: Theme) {
        if let Some(body) = self.document.body() {
            set_class(&body, theme.toggled().body_class(), false);
            set_class(&body, theme.body_class(), true);
        }
        if let Ok(Some(icon)) = self.document.query_selector("#sidebar-theme-toggle span") {
            let _ = icon.set_attribute("uk-icon", theme.icon());
        }
    }

    fn apply_layout(&mut self, layout: &SidebarLayout) {
        let main = self.document.query_selector(".chat-main").ok().flatten();
        for side in [Side::Left, Side::Right] {
            let panel = layout.panel(side);
            if let Some(el) = self.by_id(side.element_id()) {
                set_class(&el, "active", panel.active);
                set_class(&el, "hidden", panel.hidden);
            }
            if let Some(main) = &main {
                set_class(main, side.hidden_class(), panel.hidden);
            }
        }
        if let Some(overlay) = self.by_id("sidebar-overlay") {
            set_class(&overlay, "active", layout.overlay);
        }
    }

    fn drag_sidebar(&mut self, drag: Drag) {
        match drag {
            Drag::Offset(side, px) => {
                if let Some(el) = self.by_id(side.element_id()) {
                    set_style(&el, "transform", &format!("translateX({px}px)"));
                }
            }
            Drag::Idle => {
                for side in [Side::Left, Side::Right] {
                    if let Some(el) = self.by_id(side.element_id()) {
                        set_style(&el, "transform", "");
                    }
                }
            }
        }
    }

    fn focus_choice(&mut self, index: usize) {
        let Ok(choices) = self.document.query_selector_all(AVAILABLE_CHOICES) else {
            return;
        };
        if let Some(choice) = choices
            .item(index as u32)
            .and_then(|n| n.dyn_into::<HtmlElement>().ok())
        {
            let _ = choice.focus();
        }
    }

    fn mark_choice_selected(&mut self, index: usize) {
        let Ok(choices) = self.document.query_selector_all(AVAILABLE_CHOICES) else {
            return;
        };
        let Some(choice) = choices
            .item(index as u32)
            .and_then(|n| n.dyn_into::<Element>().ok())
        else {
            return;
        };
        set_class(&choice, "selected", true);
        self.later(CHOICE_FEEDBACK_MS as i32, move || set_class(&choice, "selected", false));
    }

    fn scroll_to_latest(&mut self) {
        let Some(chat) = self.by_id("chat-container") else {
            return;
        };
        self.later(SCROLL_DELAY_MS, move || chat.set_scroll_top(chat.scroll_height()));
    }

    fn set_header_scrolled(&mut self, scrolled: bool) {
        if let Ok(Some(header)) = self.document.query_selector(".sticky-header") {
            set_class(&header, "scrolled", scrolled);
        }
    }
}
