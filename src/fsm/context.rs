//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that mode handlers read from and
//! write to: the gesture recognised this tick, the activity clock, the
//! settings record, and the command outputs.  Think of it as the
//! "blackboard" in a blackboard architecture.  Handlers never touch a
//! port; the service drains [`ModeCommands`] after each tick and turns
//! them into port calls.

use crate::app::ports::Notice;
use crate::config::ClockConfig;
use crate::gesture::Gesture;
use crate::layout::{MenuButton, TouchPoint};

// ---------------------------------------------------------------------------
// Commands (written by handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Full-screen layouts the renderer can paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Static layout, time, date and weather panel, with cached strings reset.
    Clock,
    Menu,
    IpInfo,
    PortalInstructions,
}

/// Side effects that end or suspend the normal loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    Restart,
    FactoryReset,
    EnterSleep,
    /// Hand the device to the blocking setup portal.
    RunPortal,
}

/// One tick's worth of requested output.  Reset after every application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeCommands {
    pub screen: Option<Screen>,
    pub notice: Option<Notice>,
    pub blank: bool,
    pub backlight: Option<bool>,
    /// Repaint time/date if their text changed.
    pub refresh_clock: bool,
    /// Consult the weather gate this tick.
    pub check_weather: bool,
    pub selected: Option<MenuButton>,
    pub action: Option<DeviceAction>,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// Monotonic time of the current tick (ms since boot).
    pub now_ms: u64,
    /// Last recognised gesture or mode change.  Drives both the idle-sleep
    /// and menu timeouts.
    pub last_activity_ms: u64,

    // -- Input --
    pub gesture: Gesture,
    /// Where the gesture landed (last touched coordinate).
    pub point: TouchPoint,

    // -- Configuration --
    pub config: ClockConfig,

    // -- Outputs --
    pub commands: ModeCommands,
}

impl FsmContext {
    pub fn new(config: ClockConfig, now_ms: u64) -> Self {
        Self {
            now_ms,
            last_activity_ms: now_ms,
            gesture: Gesture::None,
            point: TouchPoint::default(),
            config,
            commands: ModeCommands::default(),
        }
    }

    /// Load this tick's inputs.  A recognised gesture refreshes the
    /// activity clock before any handler runs.
    pub fn begin_tick(&mut self, now_ms: u64, gesture: Gesture, point: TouchPoint) {
        self.now_ms = now_ms;
        self.gesture = gesture;
        self.point = point;
        if gesture.is_some() {
            self.touch_activity();
        }
    }

    pub fn touch_activity(&mut self) {
        self.last_activity_ms = self.now_ms;
    }

    pub fn idle_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.last_activity_ms)
    }
}
