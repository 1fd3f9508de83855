//! Feedback from actions back to the page
//!
//! [`UiSink`] is everything the app asks of the page. The browser build
//! implements it on the DOM (`platform::dom`); [`RecordingSink`] keeps a log
//! for native runs and tests.

use crate::persistence::SlotStatus;
use crate::settings::Theme;
use crate::sidebar::{Drag, SidebarLayout};

/// How long a clicked choice keeps its `selected` highlight
pub const CHOICE_FEEDBACK_MS: u32 = 200;

/// Page scroll offset past which the sticky header is marked `scrolled`
pub const HEADER_SCROLL_THRESHOLD: f64 = 10.0;

/// Notification styling and lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }

    /// How long the notification stays up; errors linger
    pub fn duration_ms(&self) -> u32 {
        match self {
            Severity::Error => 5000,
            Severity::Info | Severity::Success => 3000,
        }
    }

    /// Screen reader urgency
    pub fn aria_live(&self) -> &'static str {
        match self {
            Severity::Error => "assertive",
            Severity::Info | Severity::Success => "polite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// The page, as seen by the app
pub trait UiSink {
    /// Fire-and-forget toast
    fn notify(&mut self, message: &str, severity: Severity);

    /// Redraw the save menu
    fn show_slots(&mut self, slots: &[SlotStatus]);

    /// Show or hide the loading spinner
    fn set_busy(&mut self, busy: bool);

    fn show_save_menu(&mut self);

    fn hide_save_menu(&mut self);

    fn apply_theme(&mut self, theme: Theme);

    fn apply_layout(&mut self, layout: &SidebarLayout);

    /// Move the dragged sidebar; `Drag::Idle` clears any offset
    fn drag_sidebar(&mut self, drag: Drag);

    /// Focus the n-th available choice
    fn focus_choice(&mut self, index: usize);

    /// Briefly highlight the n-th available choice as picked
    fn mark_choice_selected(&mut self, index: usize);

    /// Bring the newest chat content into view
    fn scroll_to_latest(&mut self);

    fn set_header_scrolled(&mut self, scrolled: bool);
}

/// Remembers everything it was asked to do
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub notifications: Vec<Notification>,
    pub slots: Vec<SlotStatus>,
    pub refreshes: usize,
    pub busy: bool,
    /// Number of times the spinner was shown
    pub busy_count: usize,
    pub save_menu_open: bool,
    pub theme: Option<Theme>,
    pub layout: Option<SidebarLayout>,
    pub drag: Option<Drag>,
    pub focused_choice: Option<usize>,
    pub selected_choice: Option<usize>,
    pub scrolls_to_latest: usize,
    pub header_scrolled: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }
}

impl UiSink for RecordingSink {
    fn notify(&mut self, message: &str, severity: Severity) {
        log::info!("[{}] {}", severity.as_str(), message);
        self.notifications.push(Notification {
            message: message.to_string(),
            severity,
        });
    }

    fn show_slots(&mut self, slots: &[SlotStatus]) {
        self.slots = slots.to_vec();
        self.refreshes += 1;
    }

    fn set_busy(&mut self, busy: bool) {
        if busy {
            self.busy_count += 1;
        }
        self.busy = busy;
    }

    fn show_save_menu(&mut self) {
        self.save_menu_open = true;
    }

    fn hide_save_menu(&mut self) {
        self.save_menu_open = false;
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = Some(theme);
    }

    fn apply_layout(&mut self, layout: &SidebarLayout) {
        self.layout = Some(*layout);
    }

    fn drag_sidebar(&mut self, drag: Drag) {
        self.drag = Some(drag);
    }

    fn focus_choice(&mut self, index: usize) {
        self.focused_choice = Some(index);
    }

    fn mark_choice_selected(&mut self, index: usize) {
        self.selected_choice = Some(index);
    }

    fn scroll_to_latest(&mut self) {
        self.scrolls_to_latest += 1;
    }

    fn set_header_scrolled(&mut self, scrolled: bool) {
        self.header_scrolled = scrolled;
    }
}
