//! Application events emitted by the service.

use crate::fsm::Screen;

/// Notable state changes, delivered to an [`EventSink`](super::ports::EventSink).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Service started on the given screen.
    Started(Screen),
    /// The display switched screens.
    ScreenChanged { from: Screen, to: Screen },
    /// A countdown began with this many seconds.
    TimerStarted(u32),
    /// The countdown reached zero.
    TimerFinished,
    /// The menu tree was modified (new version number).
    MenuChanged(u64),
}
