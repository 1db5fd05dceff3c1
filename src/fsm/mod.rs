//! Function-pointer finite state machine engine for the device mode.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StateTable                                                   │
//! │  ┌──────────────┬───────────┬───────────────────┐             │
//! │  │ DeviceMode   │ on_enter  │ on_update         │             │
//! │  ├──────────────┼───────────┼───────────────────┤             │
//! │  │ Clock        │ fn(ctx)   │ fn(ctx)->Option<> │             │
//! │  │ Menu         │ fn(ctx)   │ fn(ctx)->Option<> │             │
//! │  │ IpInfo       │ fn(ctx)   │ fn(ctx)->Option<> │             │
//! │  │ ConfigPortal │ fn(ctx)   │ fn(ctx)->Option<> │             │
//! │  │ Sleep        │ fn(ctx)   │ fn(ctx)->Option<> │             │
//! │  └──────────────┴───────────┴───────────────────┘             │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** mode.
//! If it returns `Some(next)`, the engine moves the current pointer and
//! runs `on_enter` for the next mode.  Modes need no exit hook: every
//! entry repaints the whole screen.
//! All functions receive `&mut FsmContext` which holds the tick's gesture,
//! the activity clock, settings, and the command outputs the
//! [`AppService`](crate::app::service::AppService) applies afterwards.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Every mode the clock can be in.  Exactly one is active.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceMode {
    Clock = 0,
    Menu = 1,
    IpInfo = 2,
    ConfigPortal = 3,
    Sleep = 4,
}

impl DeviceMode {
    /// Total number of modes, used to size the table array.
    pub const COUNT: usize = 5;

    /// Convert an index back to `DeviceMode`.  Panics on out-of-range in
    /// debug builds; returns `Clock` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Clock,
            1 => Self::Menu,
            2 => Self::IpInfo,
            3 => Self::ConfigPortal,
            4 => Self::Sleep,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Clock
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions.
/// These run exactly once on each transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<DeviceMode>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single mode.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: DeviceMode,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `DeviceMode as usize`.
    table: [StateDescriptor; DeviceMode::COUNT],
    /// Index of the currently active mode.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given table, starting in `initial`.
    pub fn new(table: [StateDescriptor; DeviceMode::COUNT], initial: DeviceMode) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, row)| row.id as usize == i),
            "state table rows out of order"
        );
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting mode.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in mode: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current mode.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition from outside the table (used for
    /// configuration server requests such as remote sleep).
    pub fn force_transition(&mut self, next: DeviceMode, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> DeviceMode {
        DeviceMode::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: DeviceMode, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
