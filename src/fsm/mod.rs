//! Function-pointer display state machine engine.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌────────┬───────────┬──────────┬───────────────────┐   │
//! │  │ Screen  │ on_enter  │ on_exit  │ on_update         │   │
//! │  ├────────┼───────────┼──────────┼───────────────────┤   │
//! │  │ Clock   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  │ Menu    │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  │ Timer   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  │ Bell    │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  └────────┴───────────┴──────────┴───────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** screen.
//! If it returns `Some(next)`, the engine runs `on_exit` for the current
//! screen, then `on_enter` for the next, and updates the current pointer.
//! All handlers receive `&mut UiContext`, which carries the countdown
//! state, selection, interaction timestamps, and config.
//!
//! Unlike a pure tick-counted machine, state residency is tracked in
//! wall-clock milliseconds (`UiContext::ms_in_state`) so the bell expiry
//! and inactivity timeout stay correct if the loop cadence drifts.

pub mod context;
pub mod states;

use context::UiContext;
use log::info;

// ---------------------------------------------------------------------------
// Screen identity
// ---------------------------------------------------------------------------

/// The four screens of the device display.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Screen {
    Clock = 0,
    Menu = 1,
    Timer = 2,
    Bell = 3,
}

impl Screen {
    /// Total number of screens; used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert a `u8` index back to `Screen`. Panics on out-of-range in
    /// debug builds; returns `Clock` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Clock,
            1 => Self::Menu,
            2 => Self::Timer,
            3 => Self::Bell,
            _ => {
                debug_assert!(false, "invalid screen index: {idx}");
                Self::Clock
            }
        }
    }

    /// Human-readable name for logs and status reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Menu => "menu",
            Self::Timer => "timer",
            Self::Bell => "bell",
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each screen transition.
pub type StateActionFn = fn(&mut UiContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut UiContext) -> Option<Screen>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single screen.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: Screen,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The display state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]) and tracks the
/// wall-clock time at which the current screen was entered.
pub struct UiFsm {
    /// Fixed-size table indexed by `Screen as usize`.
    table: [StateDescriptor; Screen::COUNT],
    /// Index of the currently active screen.
    current: usize,
    /// `now_ms` at which the current screen was entered.
    state_entry_ms: i64,
}

impl UiFsm {
    /// Construct a new FSM with the given state table, starting on `initial`.
    pub fn new(table: [StateDescriptor; Screen::COUNT], initial: Screen) -> Self {
        Self {
            table,
            current: initial as usize,
            state_entry_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting screen.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut UiContext) {
        info!("FSM starting on screen: {}", self.table[self.current].name);
        self.state_entry_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Refresh `ctx.ms_in_state` from the current wall clock.
    /// 2. Call `on_update` for the current screen.
    /// 3. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut UiContext) {
        ctx.ms_in_state = ctx.now_ms.saturating_sub(self.state_entry_ms);

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition (used by the countdown step to jump to
    /// `Timer`/`Bell` and by external commands, regardless of what
    /// `on_update` returned).
    pub fn force_transition(&mut self, next: Screen, ctx: &mut UiContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current screen's identity.
    pub fn current_screen(&self) -> Screen {
        Screen::from_index(self.current)
    }

    /// Milliseconds spent on the current screen as of the last tick.
    pub fn ms_in_current_state(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.state_entry_ms)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: Screen, ctx: &mut UiContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current screen
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_ms = ctx.now_ms;
        ctx.ms_in_state = 0;

        // Enter new screen
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::context::UiContext;
    use super::*;
    use crate::config::SystemConfig;

    fn make_ctx() -> UiContext {
        UiContext::new(SystemConfig::default())
    }

    fn make_fsm() -> UiFsm {
        UiFsm::new(states::build_state_table(), Screen::Clock)
    }

    fn tick_at(fsm: &mut UiFsm, ctx: &mut UiContext, now_ms: i64) {
        ctx.now_ms = now_ms;
        fsm.tick(ctx);
    }

    #[test]
    fn starts_on_clock() {
        let fsm = make_fsm();
        assert_eq!(fsm.current_screen(), Screen::Clock);
    }

    #[test]
    fn screen_from_index_roundtrip() {
        for i in 0..Screen::COUNT {
            let id = Screen::from_index(i);
            assert_eq!(id as usize, i);
        }
    }

    #[test]
    fn clock_marks_refresh_on_second_boundary() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);

        ctx.second_elapsed = true;
        tick_at(&mut fsm, &mut ctx, 1_000);
        assert!(ctx.refresh_needed, "clock must tick visibly every second");
        assert_eq!(fsm.current_screen(), Screen::Clock);
    }

    #[test]
    fn clock_does_not_refresh_between_seconds() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);

        ctx.second_elapsed = false;
        tick_at(&mut fsm, &mut ctx, 100);
        assert!(!ctx.refresh_needed);
    }

    #[test]
    fn bell_expires_to_menu_after_four_seconds() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        ctx.now_ms = 10_000;
        fsm.force_transition(Screen::Bell, &mut ctx);

        tick_at(&mut fsm, &mut ctx, 13_900);
        assert_eq!(fsm.current_screen(), Screen::Bell, "3.9s: still ringing");

        tick_at(&mut fsm, &mut ctx, 14_000);
        assert_eq!(fsm.current_screen(), Screen::Menu, "4.0s: back to menu");
        assert!(ctx.dirty, "bell fallback must request a redraw");
    }

    #[test]
    fn bell_residency_resets_on_reentry() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);

        ctx.now_ms = 1_000;
        fsm.force_transition(Screen::Bell, &mut ctx);
        tick_at(&mut fsm, &mut ctx, 5_000);
        assert_eq!(fsm.current_screen(), Screen::Menu);

        // Re-enter much later; the 4s window must start over.
        ctx.now_ms = 60_000;
        fsm.force_transition(Screen::Bell, &mut ctx);
        tick_at(&mut fsm, &mut ctx, 62_000);
        assert_eq!(fsm.current_screen(), Screen::Bell);
        tick_at(&mut fsm, &mut ctx, 64_000);
        assert_eq!(fsm.current_screen(), Screen::Menu);
    }

    #[test]
    fn menu_times_out_to_clock_after_idle() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        fsm.force_transition(Screen::Menu, &mut ctx);
        ctx.last_interaction_ms = 0;

        tick_at(&mut fsm, &mut ctx, 30_000);
        assert_eq!(fsm.current_screen(), Screen::Menu, "exactly 30s: not yet");

        tick_at(&mut fsm, &mut ctx, 31_000);
        assert_eq!(fsm.current_screen(), Screen::Clock);
    }

    #[test]
    fn menu_does_not_time_out_while_countdown_runs() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        fsm.force_transition(Screen::Menu, &mut ctx);
        ctx.last_interaction_ms = 0;
        ctx.timer_running = true;

        tick_at(&mut fsm, &mut ctx, 120_000);
        assert_eq!(fsm.current_screen(), Screen::Menu);
    }

    #[test]
    fn timer_screen_times_out_when_not_running() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        fsm.force_transition(Screen::Timer, &mut ctx);
        ctx.last_interaction_ms = 0;
        ctx.timer_running = false;

        tick_at(&mut fsm, &mut ctx, 31_000);
        assert_eq!(fsm.current_screen(), Screen::Clock);
    }

    #[test]
    fn interaction_resets_idle_window() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        fsm.force_transition(Screen::Menu, &mut ctx);
        ctx.last_interaction_ms = 25_000;

        tick_at(&mut fsm, &mut ctx, 40_000);
        assert_eq!(
            fsm.current_screen(),
            Screen::Menu,
            "only 15s since last interaction"
        );
        tick_at(&mut fsm, &mut ctx, 56_000);
        assert_eq!(fsm.current_screen(), Screen::Clock);
    }
}
