//! Shared mutable context threaded through every FSM handler.

use crate::config::SystemConfig;

/// Mutable state shared between the FSM engine, the state handlers, and the
/// application service that drives them.
///
/// Owned exclusively by the UI loop thread. External inputs arrive as
/// commands through a channel and are applied between ticks, so no field
/// here needs atomics or locking.
pub struct UiContext {
    // --- Wall clock (fed by the service each tick) ---
    /// Monotonic uptime in milliseconds at the current tick.
    pub now_ms: i64,
    /// Milliseconds spent on the current screen (maintained by the engine).
    pub ms_in_state: i64,
    /// True when this tick crossed a one-second boundary.
    pub second_elapsed: bool,

    // --- Selection & countdown ---
    /// Slash-delimited path of the currently selected menu node.
    pub selected_path: String,
    /// Total seconds of the active countdown (denominator for the arc).
    pub timer_total: u32,
    /// Seconds remaining on the active countdown.
    pub timer_remaining: u32,
    /// Whether a countdown is in progress.
    pub timer_running: bool,

    // --- Interaction & redraw flags ---
    /// `now_ms` of the most recent user interaction.
    pub last_interaction_ms: i64,
    /// An immediate full redraw is required (content changed).
    pub dirty: bool,
    /// A periodic redraw is required (clock second / countdown second).
    pub refresh_needed: bool,

    // --- Connectivity (published by the network stack) ---
    /// Station interface currently holds an IP.
    pub connected: bool,

    /// Tunables (timeouts, fade parameters, row counts).
    pub config: SystemConfig,
}

impl UiContext {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            now_ms: 0,
            ms_in_state: 0,
            second_elapsed: false,
            selected_path: String::from("/"),
            timer_total: 0,
            timer_remaining: 0,
            timer_running: false,
            last_interaction_ms: 0,
            dirty: false,
            refresh_needed: false,
            connected: false,
            config,
        }
    }

    /// Register a user interaction: resets the inactivity window and
    /// requests an immediate redraw. Every external command calls this.
    pub fn touch(&mut self) {
        self.last_interaction_ms = self.now_ms;
        self.dirty = true;
    }

    /// Milliseconds since the last user interaction.
    pub fn idle_ms(&self) -> i64 {
        self.now_ms.saturating_sub(self.last_interaction_ms)
    }

    /// Inactivity timeout in milliseconds, derived from config.
    pub fn idle_timeout_ms(&self) -> i64 {
        i64::from(self.config.idle_timeout_secs) * 1000
    }

    /// Bell ring duration in milliseconds, derived from config.
    pub fn bell_duration_ms(&self) -> i64 {
        i64::from(self.config.bell_duration_secs) * 1000
    }
}
