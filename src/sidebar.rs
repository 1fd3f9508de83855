//! Sidebar visibility and swipe-to-close
//!
//! Two sidebars flank the chat: progress on the left, info on the right.
//! On desktop each one is shown or hidden in place. On mobile at most one
//! slides over the chat at a time, with a dimming overlay behind it.

/// Widths at or below this are treated as mobile
pub const MOBILE_BREAKPOINT: f64 = 768.0;
/// A swipe must start this close to the open sidebar's edge
pub const EDGE_ZONE: f64 = 260.0;
/// Vertical travel that turns a swipe into a scroll
pub const VERTICAL_CANCEL: f64 = 50.0;
/// Horizontal travel before the sidebar follows the finger
pub const DRAG_START: f64 = 50.0;
/// Horizontal travel that closes the sidebar on release
pub const CLOSE_THRESHOLD: f64 = 100.0;

pub fn is_mobile(viewport_width: f64) -> bool {
    viewport_width <= MOBILE_BREAKPOINT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Progress sidebar
    Left,
    /// Info sidebar
    Right,
}

impl Side {
    /// DOM id of the sidebar element
    pub fn element_id(&self) -> &'static str {
        match self {
            Side::Left => "progress-sidebar",
            Side::Right => "info-sidebar",
        }
    }

    /// Class put on the chat area while this sidebar is hidden on desktop
    pub fn hidden_class(&self) -> &'static str {
        match self {
            Side::Left => "sidebar-left-hidden",
            Side::Right => "sidebar-right-hidden",
        }
    }
}

/// State of one sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Panel {
    /// Slid in over the chat (mobile)
    pub active: bool,
    /// Collapsed (desktop)
    pub hidden: bool,
}

/// Both sidebars plus the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SidebarLayout {
    pub left: Panel,
    pub right: Panel,
    pub overlay: bool,
}

impl SidebarLayout {
    pub fn panel(&self, side: Side) -> &Panel {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn panel_mut(&mut self, side: Side) -> &mut Panel {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Hide any slid-in sidebar and the overlay
    pub fn close(&mut self) {
        self.left.active = false;
        self.right.active = false;
        self.overlay = false;
    }

    /// Header button behaviour
    pub fn toggle(&mut self, side: Side, viewport_width: f64) {
        if is_mobile(viewport_width) {
            let was_active = self.panel(side).active;
            self.close();
            if !was_active {
                self.panel_mut(side).active = true;
                self.overlay = true;
            }
        } else {
            let panel = self.panel_mut(side);
            panel.hidden = !panel.hidden;
        }
    }

    /// Reset after the viewport changes size
    pub fn resize(&mut self, viewport_width: f64) {
        if is_mobile(viewport_width) {
            self.left.active = false;
            self.right.active = false;
        } else {
            self.left.hidden = false;
            self.right.hidden = false;
        }
        self.close();
    }

    /// Sidebar currently slid in, if any
    pub fn active_side(&self) -> Option<Side> {
        if self.left.active {
            Some(Side::Left)
        } else if self.right.active {
            Some(Side::Right)
        } else {
            None
        }
    }
}

/// What a touch move should do to the dragged sidebar
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drag {
    /// Not dragging; leave the sidebar alone
    Idle,
    /// Translate the sidebar horizontally by this many pixels
    Offset(Side, f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Swipe {
    side: Side,
    start: (f64, f64),
    current: (f64, f64),
}

/// Tracks a single-finger swipe that may close a mobile sidebar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwipeTracker {
    swipe: Option<Swipe>,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.swipe.is_some()
    }

    /// Begin tracking if the touch lands on the open sidebar
    pub fn start(&mut self, x: f64, y: f64, layout: &SidebarLayout, viewport_width: f64) {
        self.swipe = None;
        if !is_mobile(viewport_width) {
            return;
        }
        let side = if layout.left.active && x < EDGE_ZONE {
            Side::Left
        } else if layout.right.active && x > viewport_width - EDGE_ZONE {
            Side::Right
        } else {
            return;
        };
        self.swipe = Some(Swipe {
            side,
            start: (x, y),
            current: (x, y),
        });
    }

    /// Follow the finger. Returns the transform to apply, if any.
    pub fn update(&mut self, x: f64, y: f64) -> Drag {
        let Some(swipe) = self.swipe.as_mut() else {
            return Drag::Idle;
        };
        swipe.current = (x, y);

        let dx = x - swipe.start.0;
        let dy = (y - swipe.start.1).abs();
        if dy > VERTICAL_CANCEL {
            // Vertical scroll, not a swipe
            self.swipe = None;
            return Drag::Idle;
        }

        match swipe.side {
            Side::Left if dx < -DRAG_START => Drag::Offset(Side::Left, dx.min(0.0)),
            Side::Right if dx > DRAG_START => Drag::Offset(Side::Right, dx.max(0.0)),
            _ => Drag::Idle,
        }
    }

    /// Finger lifted. Returns the side to close if the swipe went far enough;
    /// `None` otherwise. Either way the drag ends.
    pub fn end(&mut self) -> Option<Side> {
        let swipe = self.swipe.take()?;
        let dx = swipe.current.0 - swipe.start.0;
        let closes = match swipe.side {
            Side::Left => dx < -CLOSE_THRESHOLD,
            Side::Right => dx > CLOSE_THRESHOLD,
        };
        closes.then_some(swipe.side)
    }

    /// Side being dragged, if a drag is in progress
    pub fn side(&self) -> Option<Side> {
        self.swipe.map(|s| s.side)
    }
}
