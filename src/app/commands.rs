//! Commands sent from request handlers to the UI loop.
//!
//! HTTP handlers run on the server's threads; the UI context is owned by
//! the loop thread. Anything that mutates display state crosses over as one
//! of these, queued on an `mpsc` channel and drained at the top of each
//! tick.

/// A state-changing request for the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// User opened the web UI: leave the clock screen if on it.
    Wake,
    /// Select a menu node by slash-delimited path and show the menu.
    SelectPath(String),
    /// Start a countdown of the given number of seconds (> 0).
    StartTimer(u32),
    /// The menu tree changed (carries the new store version): redraw and
    /// reset the inactivity window.
    MenuChanged(u64),
    /// Station connectivity changed (published by the network stack).
    SetConnected(bool),
}
