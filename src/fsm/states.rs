//! Per-screen FSM handlers and the state table.
//!
//! Handlers only contain the concerns of *being on* a screen: periodic
//! refresh, the bell's auto-fallback, and the inactivity timeout. Countdown
//! progression and screen-forcing commands live in the application service,
//! which applies them before the engine tick.

use log::{debug, info};

use super::context::UiContext;
use super::{Screen, StateDescriptor};

/// Build the complete state table. Index must equal `Screen as usize`.
pub fn build_state_table() -> [StateDescriptor; Screen::COUNT] {
    [
        StateDescriptor {
            id: Screen::Clock,
            name: "clock",
            on_enter: Some(clock_enter),
            on_exit: None,
            on_update: clock_update,
        },
        StateDescriptor {
            id: Screen::Menu,
            name: "menu",
            on_enter: None,
            on_exit: None,
            on_update: menu_update,
        },
        StateDescriptor {
            id: Screen::Timer,
            name: "timer",
            on_enter: None,
            on_exit: None,
            on_update: timer_update,
        },
        StateDescriptor {
            id: Screen::Bell,
            name: "bell",
            on_enter: Some(bell_enter),
            on_exit: None,
            on_update: bell_update,
        },
    ]
}

// ---------------------------------------------------------------------------
// Clock: idle screen showing wall time
// ---------------------------------------------------------------------------

fn clock_enter(ctx: &mut UiContext) {
    debug!("entering clock screen");
    ctx.dirty = true;
}

fn clock_update(ctx: &mut UiContext) -> Option<Screen> {
    // The displayed seconds must advance even with no other activity.
    // While a countdown runs the service already requests refreshes.
    if ctx.second_elapsed && !ctx.timer_running {
        ctx.refresh_needed = true;
    }
    None
}

// ---------------------------------------------------------------------------
// Menu: folder browser
// ---------------------------------------------------------------------------

fn menu_update(ctx: &mut UiContext) -> Option<Screen> {
    idle_fallback(ctx)
}

// ---------------------------------------------------------------------------
// Timer: countdown detail with progress arc
// ---------------------------------------------------------------------------

fn timer_update(ctx: &mut UiContext) -> Option<Screen> {
    // Applies only when the countdown has been superseded or never started;
    // a running countdown pins the screen.
    idle_fallback(ctx)
}

// ---------------------------------------------------------------------------
// Bell: "TIME UP!" ring
// ---------------------------------------------------------------------------

fn bell_enter(ctx: &mut UiContext) {
    info!("countdown finished, ringing bell");
    ctx.dirty = true;
}

fn bell_update(ctx: &mut UiContext) -> Option<Screen> {
    if ctx.ms_in_state >= ctx.bell_duration_ms() {
        // Falling back counts as activity so the menu gets its full
        // inactivity window before the clock takes over.
        ctx.touch();
        return Some(Screen::Menu);
    }
    None
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Inactivity fallback shared by the menu and timer screens. The clock never
/// times out and the bell has its own fixed expiry.
fn idle_fallback(ctx: &mut UiContext) -> Option<Screen> {
    if !ctx.timer_running && ctx.idle_ms() > ctx.idle_timeout_ms() {
        debug!("idle for {} ms, returning to clock", ctx.idle_ms());
        return Some(Screen::Clock);
    }
    None
}
