//! Display rendering: screen painters and the UI loop.

pub mod render;
pub mod screens;

pub use render::{RenderAction, Renderer, UiLoop};
pub use screens::{FrameSnapshot, MenuRow, MenuView, WallTime};
