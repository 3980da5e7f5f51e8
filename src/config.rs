//! System configuration parameters
//!
//! All tunable parameters for the BSQ Timer device. Values can be
//! overridden via NVS; the defaults reproduce the shipped behaviour
//! (100 ms UI tick, 4 s bell, 30 s idle timeout).

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- UI loop timing ---
    /// UI loop tick interval (milliseconds)
    pub ui_tick_interval_ms: u32,
    /// How long the bell screen rings before falling back to the menu (seconds)
    pub bell_duration_secs: u32,
    /// Inactivity timeout before returning to the clock screen (seconds)
    pub idle_timeout_secs: u32,

    // --- Display ---
    /// Maximum folder entries listed on the menu screen before truncation
    pub menu_display_rows: u8,
    /// Intensity delta per fade-transition step (0-255 scale)
    pub fade_intensity_step: u8,
    /// Delay between fade steps (milliseconds)
    pub fade_step_delay_ms: u32,

    // --- Timers ---
    /// Fallback duration for fixed timers created without a value (seconds)
    pub default_fixed_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // UI loop
            ui_tick_interval_ms: 100, // 10 Hz
            bell_duration_secs: 4,
            idle_timeout_secs: 30,

            // Display
            menu_display_rows: 3,
            fade_intensity_step: 25,
            fade_step_delay_ms: 20,

            // Timers
            default_fixed_secs: 150,
        }
    }
}
