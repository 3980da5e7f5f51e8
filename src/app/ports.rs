//! Port traits: the seams between the application core and hardware.
//!
//! The core only ever talks to these traits. On the device they are backed
//! by NVS, the SH1106 panel and the IDF logger; on the host, by in-memory
//! simulations used in tests.

use core::fmt;

use crate::config::SystemConfig;
use crate::error::StorageError;

use super::events::AppEvent;

// ---------------------------------------------------------------------------
// Persistent key/value storage
// ---------------------------------------------------------------------------

/// Durable key/value blob storage (NVS on the device).
pub trait StoragePort {
    /// Read the blob stored under `key` into `buf`, returning its length.
    fn read(&mut self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write (create or overwrite) the blob under `key`.
    fn write(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Errors when loading or persisting [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No stored configuration (first boot).
    NotFound,
    /// Stored blob failed to decode.
    Corrupted,
    /// Decoded values failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage failed.
    Io,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no stored configuration"),
            Self::Corrupted => write!(f, "stored configuration corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Io => write!(f, "storage I/O failed"),
        }
    }
}

/// Load and persist the system configuration.
pub trait ConfigPort {
    fn load_config(&mut self) -> Result<SystemConfig, ConfigError>;
    fn save_config(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Font selection for [`DisplayPort::set_font`]. The mapping to concrete
/// glyph sets lives in the display adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    /// Screen headers and menu title.
    Title,
    /// Menu rows and labels.
    Body,
    /// Footnotes ("No Sync", seconds).
    Small,
    /// Large numerals for the clock and countdown.
    BigNumeric,
    /// Symbol font (bell glyph).
    Icon,
}

/// Frame-buffered monochrome display, 128x64.
///
/// Drawing calls paint into an off-screen buffer; nothing reaches the panel
/// until [`present`](Self::present). Coordinates follow the panel: origin
/// top-left, `y` grows downward, text anchored at the baseline.
pub trait DisplayPort {
    fn clear_frame(&mut self);
    fn set_font(&mut self, style: FontStyle);
    fn draw_text(&mut self, x: i32, y: i32, text: &str);
    fn draw_hline(&mut self, x: i32, y: i32, len: u32);
    fn draw_pixel(&mut self, x: i32, y: i32);
    /// Draw a single glyph by code point from the current symbol font.
    fn draw_glyph(&mut self, x: i32, y: i32, glyph: u16);
    /// Panel contrast, 0 (dark) to 255 (full). Takes effect immediately,
    /// independent of the frame buffer. Used for fade transitions.
    fn set_intensity(&mut self, level: u8);
    /// Flush the frame buffer to the panel.
    fn present(&mut self);
    /// Pixel width `text` would occupy in the current font.
    fn text_width(&self, text: &str) -> i32;
}

// ---------------------------------------------------------------------------
// Event sink
// ---------------------------------------------------------------------------

/// Receives application events for logging or telemetry.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Sink that drops everything. Useful in tests and for optional wiring.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&mut self, _event: &AppEvent) {}
}
