//! Event sink that writes application events to the logger.

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Forwards every [`AppEvent`] to the `log` facade. On the device that
/// lands in the IDF console; in tests, wherever the harness routes it.
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(screen) => info!("ui started on {}", screen.name()),
            AppEvent::ScreenChanged { from, to } => {
                debug!("screen {} -> {}", from.name(), to.name());
            }
            AppEvent::TimerStarted(seconds) => info!("countdown started: {seconds}s"),
            AppEvent::TimerFinished => info!("countdown finished"),
            AppEvent::MenuChanged(version) => debug!("menu changed (v{version})"),
        }
    }
}
