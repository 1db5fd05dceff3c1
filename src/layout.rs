//! Screen geometry shared by the renderer and the touch hit-tester.
//!
//! The CYD panel runs in landscape, 320 × 240.  The menu is a single
//! column of five buttons; the same rectangles are used to draw the
//! buttons and to decide which one a tap landed on, so the two can never
//! drift apart.
//!
//! ```text
//!   y=45  ┌──────────────────────────────┐  1. IP Configuration
//!         └──────────────────────────────┘
//!   y=80  ┌──────────────────────────────┐  2. Restore to Default Settings
//!         └──────────────────────────────┘
//!   ...   (30 px tall, 5 px gap, x = 10..=310)
//! ```

// ---------------------------------------------------------------------------
// Display bounds
// ---------------------------------------------------------------------------

/// Panel width in landscape orientation (pixels).
pub const DISPLAY_WIDTH: u16 = 320;
/// Panel height in landscape orientation (pixels).
pub const DISPLAY_HEIGHT: u16 = 240;

// ---------------------------------------------------------------------------
// Menu geometry
// ---------------------------------------------------------------------------

pub const MENU_BUTTON_COUNT: usize = 5;
pub const MENU_BUTTON_X: u16 = 10;
pub const MENU_BUTTON_W: u16 = 300;
pub const MENU_BUTTON_H: u16 = 30;
pub const MENU_BUTTON_GAP: u16 = 5;
/// Top edge of the first button (leaves room for the title line).
pub const MENU_BUTTONS_TOP: u16 = 45;

// ---------------------------------------------------------------------------
// Point / rectangle
// ---------------------------------------------------------------------------

/// A calibrated screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

impl TouchPoint {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Build a point saturated to the display bounds.
    pub fn clamped(x: u16, y: u16) -> Self {
        Self {
            x: x.min(DISPLAY_WIDTH - 1),
            y: y.min(DISPLAY_HEIGHT - 1),
        }
    }
}

/// Axis-aligned rectangle.  `contains` treats every edge as inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    pub const fn right(&self) -> u16 {
        self.x + self.w
    }

    pub const fn bottom(&self) -> u16 {
        self.y + self.h
    }

    pub fn contains(&self, p: TouchPoint) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

// ---------------------------------------------------------------------------
// Menu buttons
// ---------------------------------------------------------------------------

/// The five menu entries, numbered top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MenuButton {
    IpInfo = 1,
    FactoryReset = 2,
    SleepNow = 3,
    Reboot = 4,
    ExitMenu = 5,
}

impl MenuButton {
    pub const ALL: [MenuButton; MENU_BUTTON_COUNT] = [
        Self::IpInfo,
        Self::FactoryReset,
        Self::SleepNow,
        Self::Reboot,
        Self::ExitMenu,
    ];

    /// 1-based position in the menu.
    pub const fn number(self) -> u16 {
        self as u16
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::IpInfo => "1. IP Configuration",
            Self::FactoryReset => "2. Restore to Default Settings",
            Self::SleepNow => "3. Sleep Now",
            Self::Reboot => "4. Reboot Device",
            Self::ExitMenu => "5. Exit Menu",
        }
    }

    pub const fn rect(self) -> Rect {
        let top = MENU_BUTTONS_TOP + (self.number() - 1) * (MENU_BUTTON_H + MENU_BUTTON_GAP);
        Rect::new(MENU_BUTTON_X, top, MENU_BUTTON_W, MENU_BUTTON_H)
    }

    /// Which button, if any, contains `p`.  Points in the gaps hit nothing.
    pub fn hit_test(p: TouchPoint) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.rect().contains(p))
    }
}
