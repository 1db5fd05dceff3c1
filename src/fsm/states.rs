//! Concrete mode handler functions and table builder.
//!
//! Each mode is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  CLOCK ──[double tap]──▶ MENU ──[button 1]──▶ IP_INFO
//!    ▲  ▲                   │ │ ▲                   │
//!    │  └─[button 5/60 s]───┘ │ └────[any gesture]──┘
//!    │                        │
//!    │                   [button 3]──▶ SLEEP ◀──[idle timeout]── CLOCK
//!    │
//!  CONFIG_PORTAL (boot only, unprovisioned) ──[portal done]──▶ restart
//!
//!  MENU ──[button 2 / button 4]──▶ factory reset / restart (never returns)
//! ```

use super::context::{DeviceAction, FsmContext, Screen};
use super::{DeviceMode, StateDescriptor};
use crate::app::ports::Notice;
use crate::gesture::Gesture;
use crate::layout::MenuButton;
use log::{debug, info};

/// Menu closes after this long without a recognised gesture.
pub const MENU_TIMEOUT_MS: u64 = 60_000;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static mode table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; DeviceMode::COUNT] {
    [
        // Index 0: Clock
        StateDescriptor {
            id: DeviceMode::Clock,
            name: "Clock",
            on_enter: Some(clock_enter),
            on_update: clock_update,
        },
        // Index 1: Menu
        StateDescriptor {
            id: DeviceMode::Menu,
            name: "Menu",
            on_enter: Some(menu_enter),
            on_update: menu_update,
        },
        // Index 2: IpInfo
        StateDescriptor {
            id: DeviceMode::IpInfo,
            name: "IpInfo",
            on_enter: Some(ip_info_enter),
            on_update: ip_info_update,
        },
        // Index 3: ConfigPortal
        StateDescriptor {
            id: DeviceMode::ConfigPortal,
            name: "ConfigPortal",
            on_enter: Some(portal_enter),
            on_update: portal_update,
        },
        // Index 4: Sleep
        StateDescriptor {
            id: DeviceMode::Sleep,
            name: "Sleep",
            on_enter: Some(sleep_enter),
            on_update: sleep_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOCK: time, date, weather
// ═══════════════════════════════════════════════════════════════════════════

fn clock_enter(ctx: &mut FsmContext) {
    ctx.touch_activity();
    ctx.commands.screen = Some(Screen::Clock);
    info!("CLOCK: full redraw");
}

fn clock_update(ctx: &mut FsmContext) -> Option<DeviceMode> {
    if ctx.gesture == Gesture::DoubleTap {
        return Some(DeviceMode::Menu);
    }

    if let Some(timeout_ms) = ctx.config.sleep_timeout_ms() {
        if ctx.idle_ms() > timeout_ms {
            info!("CLOCK: idle for {} ms, sleeping", ctx.idle_ms());
            return Some(DeviceMode::Sleep);
        }
    }

    ctx.commands.refresh_clock = true;
    ctx.commands.check_weather = true;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MENU: five buttons, 60 s timeout
// ═══════════════════════════════════════════════════════════════════════════

fn menu_enter(ctx: &mut FsmContext) {
    ctx.touch_activity();
    ctx.commands.screen = Some(Screen::Menu);
}

fn menu_update(ctx: &mut FsmContext) -> Option<DeviceMode> {
    if matches!(ctx.gesture, Gesture::Tap | Gesture::DoubleTap) {
        let Some(button) = MenuButton::hit_test(ctx.point) else {
            debug!("MENU: touch at ({}, {}) outside buttons", ctx.point.x, ctx.point.y);
            return None;
        };
        info!("MENU: button {} pressed", button.number());
        ctx.commands.selected = Some(button);

        return match button {
            MenuButton::IpInfo => Some(DeviceMode::IpInfo),
            MenuButton::FactoryReset => {
                ctx.commands.notice = Some(Notice::RestoringDefaults);
                ctx.commands.action = Some(DeviceAction::FactoryReset);
                None
            }
            MenuButton::SleepNow => {
                ctx.commands.notice = Some(Notice::GoingToSleep);
                Some(DeviceMode::Sleep)
            }
            MenuButton::Reboot => {
                ctx.commands.notice = Some(Notice::Rebooting);
                ctx.commands.action = Some(DeviceAction::Restart);
                None
            }
            MenuButton::ExitMenu => Some(DeviceMode::Clock),
        };
    }

    if ctx.idle_ms() > MENU_TIMEOUT_MS {
        info!("MENU: timeout, returning to clock");
        return Some(DeviceMode::Clock);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  IP_INFO: configuration URL and settings summary
// ═══════════════════════════════════════════════════════════════════════════

fn ip_info_enter(ctx: &mut FsmContext) {
    ctx.touch_activity();
    ctx.commands.screen = Some(Screen::IpInfo);
}

fn ip_info_update(ctx: &mut FsmContext) -> Option<DeviceMode> {
    ctx.gesture.is_some().then_some(DeviceMode::Menu)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONFIG_PORTAL: the provisioning collaborator owns the device
// ═══════════════════════════════════════════════════════════════════════════

fn portal_enter(ctx: &mut FsmContext) {
    ctx.touch_activity();
    ctx.commands.screen = Some(Screen::PortalInstructions);
    ctx.commands.action = Some(DeviceAction::RunPortal);
    info!("CONFIG_PORTAL: handing over to setup portal");
}

fn portal_update(_ctx: &mut FsmContext) -> Option<DeviceMode> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLEEP: blank, backlight off, wake on touch
// ═══════════════════════════════════════════════════════════════════════════

fn sleep_enter(ctx: &mut FsmContext) {
    ctx.touch_activity();
    ctx.commands.blank = true;
    ctx.commands.backlight = Some(false);
    ctx.commands.action = Some(DeviceAction::EnterSleep);
    info!("SLEEP: arming touch wake");
}

fn sleep_update(_ctx: &mut FsmContext) -> Option<DeviceMode> {
    None
}
