//! BSQ networked countdown-timer firmware.
//!
//! An ESP32-C3 with a 128x64 SH1106 OLED, controlled from a phone over
//! HTTP. The device keeps a user-editable tree of named countdown timers in
//! NVS and cycles a four-screen display: wall clock when idle, menu while
//! browsing, a countdown with a progress arc, and a "TIME UP!" bell.
//!
//! Architecture (hexagonal):
//!
//! - [`app`]: the hardware-agnostic core: port traits, the tick-driven
//!   [`app::AppService`], and the [`app::CommandApi`] request handlers use.
//! - [`fsm`]: table-driven state machine over the four screens.
//! - [`menu`]: the timer tree and its persistent store.
//! - [`ui`]: screen painters and the periodic render loop.
//! - [`adapters`]: NVS, WiFi, HTTP, time and display implementations;
//!   device code behind the `espidf` feature, host simulations otherwise.
//!
//! Threading model: the UI loop thread owns all display state. HTTP
//! handlers enqueue [`app::UiCommand`]s over a channel, share the menu
//! store behind one mutex, and read status from loop-published atomics.

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod menu;
pub mod ui;
