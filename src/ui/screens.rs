//! Screen painters for the 128x64 panel.
//!
//! Pure functions from a [`FrameSnapshot`] to [`DisplayPort`] calls. No
//! state, no locking, no timing: that all lives in [`render`](super::render).

use crate::app::ports::{DisplayPort, FontStyle};
use crate::fsm::Screen;
use crate::menu::{MenuNode, TimerMode};

pub const DISPLAY_WIDTH: i32 = 128;
pub const DISPLAY_HEIGHT: i32 = 64;

/// Progress arc geometry: two concentric circles for a 2px stroke.
const ARC_CENTER_X: f32 = 64.0;
const ARC_CENTER_Y: f32 = 32.0;
const ARC_RADII: [f32; 2] = [28.0, 27.0];

/// Bell symbol code point in the icon font.
const GLYPH_BELL: u16 = 0x40;
/// Antenna symbol shown while the station is connected.
const GLYPH_ANTENNA: u16 = 0x51;

// ---------------------------------------------------------------------------
// Snapshot model
// ---------------------------------------------------------------------------

/// Local wall time, available once SNTP has synchronised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// One row of the folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRow {
    pub name: String,
    pub is_folder: bool,
}

/// What the menu screen shows for the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuView {
    /// A folder: its first rows, plus a marker if more follow.
    Folder {
        title: String,
        rows: Vec<MenuRow>,
        truncated: bool,
    },
    /// A timer leaf: its configuration.
    TimerDetail {
        title: String,
        mode: TimerMode,
        fixed: Option<u32>,
    },
}

impl MenuView {
    /// Build the view for `path` within `root`. A stale path (deleted from
    /// under the selection) falls back to the root folder.
    pub fn build(root: &MenuNode, path: &str, max_rows: usize) -> Self {
        let node = root.resolve(path).unwrap_or(root);
        match node {
            MenuNode::Folder { name, children } => Self::Folder {
                title: name.clone(),
                rows: children
                    .iter()
                    .take(max_rows)
                    .map(|c| MenuRow {
                        name: c.name().to_string(),
                        is_folder: c.is_folder(),
                    })
                    .collect(),
                truncated: children.len() > max_rows,
            },
            MenuNode::Timer { name, mode, fixed } => Self::TimerDetail {
                title: name.clone(),
                mode: *mode,
                fixed: *fixed,
            },
        }
    }
}

/// Everything a frame needs, captured under the menu lock and rendered
/// outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    pub screen: Screen,
    pub wall_time: Option<WallTime>,
    pub connected: bool,
    pub menu: MenuView,
    /// Name of the selected node (timer screen header).
    pub selected_name: String,
    pub timer_total: u32,
    pub timer_remaining: u32,
}

// ---------------------------------------------------------------------------
// Frame entry point
// ---------------------------------------------------------------------------

/// Paint one complete frame into the display's buffer and present it.
pub fn draw_frame(d: &mut impl DisplayPort, snap: &FrameSnapshot) {
    d.clear_frame();
    match snap.screen {
        Screen::Clock => draw_clock(d, snap),
        Screen::Menu => draw_menu(d, snap),
        Screen::Timer => draw_timer(d, snap),
        Screen::Bell => draw_bell(d),
    }
    if snap.connected {
        d.set_font(FontStyle::Icon);
        d.draw_glyph(DISPLAY_WIDTH - 12, 12, GLYPH_ANTENNA);
    }
    d.present();
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

fn draw_clock(d: &mut impl DisplayPort, snap: &FrameSnapshot) {
    match snap.wall_time {
        Some(t) => {
            let hhmm = format!("{:02}:{:02}", t.hour, t.minute);
            d.set_font(FontStyle::BigNumeric);
            let w = d.text_width(&hhmm);
            d.draw_text((DISPLAY_WIDTH - w) / 2, 40, &hhmm);

            let ss = format!("{:02}", t.second);
            d.set_font(FontStyle::Small);
            d.draw_text(DISPLAY_WIDTH / 2 + w / 2 + 4, 40, &ss);
        }
        None => {
            // Clock not synchronised yet (no network, SNTP pending).
            d.set_font(FontStyle::Body);
            let w = d.text_width("No Sync");
            d.draw_text((DISPLAY_WIDTH - w) / 2, 36, "No Sync");
        }
    }
}

// ---------------------------------------------------------------------------
// Menu
// ---------------------------------------------------------------------------

fn draw_menu(d: &mut impl DisplayPort, snap: &FrameSnapshot) {
    match &snap.menu {
        MenuView::Folder {
            title,
            rows,
            truncated,
        } => {
            draw_header(d, title);

            if rows.is_empty() {
                d.set_font(FontStyle::Body);
                d.draw_text(8, 36, "(Empty)");
                return;
            }

            d.set_font(FontStyle::Body);
            let mut y = 30;
            for row in rows {
                if row.is_folder {
                    d.draw_text(4, y, &format!("{}/", row.name));
                } else {
                    d.draw_text(4, y, &row.name);
                }
                y += 12;
            }
            if *truncated {
                d.draw_text(4, y, "...");
            }
        }
        MenuView::TimerDetail { title, mode, fixed } => {
            draw_header(d, title);
            d.set_font(FontStyle::Body);
            match (mode, fixed) {
                (TimerMode::Fixed, Some(secs)) => {
                    d.draw_text(4, 36, &format!("Fixed: {}", format_mmss(*secs)));
                }
                (TimerMode::Fixed, None) => d.draw_text(4, 36, "Fixed"),
                (TimerMode::Variable, _) => d.draw_text(4, 36, "Variable"),
            }
            d.set_font(FontStyle::Small);
            d.draw_text(4, 56, "Start from web UI");
        }
    }
}

fn draw_header(d: &mut impl DisplayPort, title: &str) {
    d.set_font(FontStyle::Title);
    d.draw_text(2, 12, title);
    d.draw_hline(0, 16, DISPLAY_WIDTH as u32);
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

fn draw_timer(d: &mut impl DisplayPort, snap: &FrameSnapshot) {
    draw_progress_arc(d, snap.timer_remaining, snap.timer_total);

    let remaining = format_mmss(snap.timer_remaining);
    d.set_font(FontStyle::BigNumeric);
    let w = d.text_width(&remaining);
    d.draw_text((DISPLAY_WIDTH - w) / 2, 38, &remaining);

    d.set_font(FontStyle::Small);
    let w = d.text_width(&snap.selected_name);
    d.draw_text((DISPLAY_WIDTH - w) / 2, 52, &snap.selected_name);
}

/// Clockwise progress arc from 12 o'clock, two pixels thick. Sweep is
/// proportional to the remaining fraction, shrinking as time runs out.
fn draw_progress_arc(d: &mut impl DisplayPort, remaining: u32, total: u32) {
    if total == 0 {
        return;
    }
    let frac = remaining as f32 / total as f32;
    let sweep_deg = (frac * 360.0) as i32;

    for deg in 0..sweep_deg {
        let rad = (deg as f32).to_radians();
        let (sin, cos) = (rad.sin(), rad.cos());
        for r in ARC_RADII {
            let x = ARC_CENTER_X + r * sin;
            let y = ARC_CENTER_Y - r * cos;
            d.draw_pixel(x.round() as i32, y.round() as i32);
        }
    }
}

// ---------------------------------------------------------------------------
// Bell
// ---------------------------------------------------------------------------

fn draw_bell(d: &mut impl DisplayPort) {
    d.set_font(FontStyle::Icon);
    d.draw_glyph(DISPLAY_WIDTH / 2 - 8, 28, GLYPH_BELL);

    d.set_font(FontStyle::Title);
    let w = d.text_width("TIME UP!");
    d.draw_text((DISPLAY_WIDTH - w) / 2, 52, "TIME UP!");
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `M:SS` with unbounded minutes (`"2:30"`, `"125:00"`).
pub fn format_mmss(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
