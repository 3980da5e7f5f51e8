//! Console display adapter.
//!
//! Stand-in [`DisplayPort`] that narrates draw calls to the logger. Used by
//! the host simulation and as the placeholder wiring until the SH1106
//! driver crate is integrated.
//!
//! TODO: swap in an sh1106-over-I2C adapter and map [`FontStyle`] onto its
//! glyph sets.

use log::{debug, trace};

use crate::app::ports::{DisplayPort, FontStyle};

pub struct ConsoleDisplay {
    font: FontStyle,
    intensity: u8,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self {
            font: FontStyle::Body,
            intensity: 255,
        }
    }

    /// Approximate glyph advance per font, in pixels. Only used for the
    /// centring math; close enough to the real panel fonts.
    fn char_width(&self) -> i32 {
        match self.font {
            FontStyle::Title => 8,
            FontStyle::Body => 6,
            FontStyle::Small => 5,
            FontStyle::BigNumeric => 14,
            FontStyle::Icon => 16,
        }
    }
}

impl DisplayPort for ConsoleDisplay {
    fn clear_frame(&mut self) {
        trace!("display: clear");
    }

    fn set_font(&mut self, style: FontStyle) {
        self.font = style;
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str) {
        debug!("display: text ({x},{y}) {text:?}");
    }

    fn draw_hline(&mut self, x: i32, y: i32, len: u32) {
        trace!("display: hline ({x},{y}) len {len}");
    }

    fn draw_pixel(&mut self, _x: i32, _y: i32) {
        // Far too chatty even for trace; the arc paints hundreds per frame.
    }

    fn draw_glyph(&mut self, x: i32, y: i32, glyph: u16) {
        debug!("display: glyph ({x},{y}) #{glyph:#04x}");
    }

    fn set_intensity(&mut self, level: u8) {
        self.intensity = level;
        trace!("display: intensity {level}");
    }

    fn present(&mut self) {
        trace!("display: present (intensity {})", self.intensity);
    }

    fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * self.char_width()
    }
}
