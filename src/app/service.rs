//! Application service: drives the display FSM and the countdown.
//!
//! Single-threaded by construction, owned by the UI loop thread. External
//! requests arrive as [`UiCommand`]s (drained from a channel by the loop)
//! and are applied through [`handle_command`](AppService::handle_command)
//! between ticks.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::fsm::context::UiContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Screen, UiFsm};

use super::commands::UiCommand;
use super::events::AppEvent;
use super::ports::EventSink;

pub struct AppService {
    fsm: UiFsm,
    ctx: UiContext,
    /// `now_ms` of the last whole-second boundary the countdown saw.
    last_second_ms: i64,
}

impl AppService {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            fsm: UiFsm::new(build_state_table(), Screen::Clock),
            ctx: UiContext::new(config),
            last_second_ms: 0,
        }
    }

    /// Enter the initial screen. Call once before the first tick.
    pub fn start(&mut self, now_ms: i64, sink: &mut impl EventSink) {
        self.ctx.now_ms = now_ms;
        self.last_second_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_screen()));
    }

    /// Advance one UI tick at wall clock `now_ms`.
    ///
    /// Order matters: the countdown step runs first (it may force the
    /// screen to `Timer` or `Bell`), then the current screen's handler.
    pub fn tick(&mut self, now_ms: i64, sink: &mut impl EventSink) {
        let before = self.fsm.current_screen();
        self.ctx.now_ms = now_ms;

        self.ctx.second_elapsed = now_ms.saturating_sub(self.last_second_ms) >= 1000;
        if self.ctx.second_elapsed {
            self.last_second_ms = now_ms;
            self.step_countdown(sink);
        }

        self.fsm.tick(&mut self.ctx);

        let after = self.fsm.current_screen();
        if after != before {
            sink.emit(&AppEvent::ScreenChanged {
                from: before,
                to: after,
            });
        }
    }

    /// Apply one external command. Commands always count as interaction.
    pub fn handle_command(&mut self, cmd: UiCommand, sink: &mut impl EventSink) {
        let before = self.fsm.current_screen();
        match cmd {
            UiCommand::Wake => {
                // Deliberately asymmetric: only the clock yields to the
                // menu; a visible countdown or bell stays put.
                if self.fsm.current_screen() == Screen::Clock {
                    self.fsm.force_transition(Screen::Menu, &mut self.ctx);
                }
                self.ctx.touch();
            }
            UiCommand::SelectPath(path) => {
                info!("selected menu path: {path}");
                self.ctx.selected_path = path;
                self.fsm.force_transition(Screen::Menu, &mut self.ctx);
                self.ctx.touch();
            }
            UiCommand::StartTimer(seconds) => {
                if seconds == 0 {
                    // The API layer rejects this; guard anyway.
                    warn!("ignoring zero-second timer start");
                    return;
                }
                // Supersedes any countdown already in progress.
                self.ctx.timer_total = seconds;
                self.ctx.timer_remaining = seconds;
                self.ctx.timer_running = true;
                self.fsm.force_transition(Screen::Timer, &mut self.ctx);
                self.ctx.touch();
                sink.emit(&AppEvent::TimerStarted(seconds));
            }
            UiCommand::MenuChanged(version) => {
                self.ctx.touch();
                sink.emit(&AppEvent::MenuChanged(version));
            }
            UiCommand::SetConnected(connected) => {
                if self.ctx.connected != connected {
                    info!("station connectivity: {connected}");
                    self.ctx.connected = connected;
                    self.ctx.refresh_needed = true;
                }
            }
        }

        let after = self.fsm.current_screen();
        if after != before {
            sink.emit(&AppEvent::ScreenChanged {
                from: before,
                to: after,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Queries (used by the render loop)
    // -----------------------------------------------------------------------

    pub fn screen(&self) -> Screen {
        self.fsm.current_screen()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    pub fn selected_path(&self) -> &str {
        &self.ctx.selected_path
    }

    pub fn timer_total(&self) -> u32 {
        self.ctx.timer_total
    }

    pub fn timer_remaining(&self) -> u32 {
        self.ctx.timer_remaining
    }

    pub fn timer_running(&self) -> bool {
        self.ctx.timer_running
    }

    pub fn connected(&self) -> bool {
        self.ctx.connected
    }

    /// Consume the immediate-redraw flag.
    pub fn take_dirty(&mut self) -> bool {
        core::mem::take(&mut self.ctx.dirty)
    }

    /// Consume the periodic-refresh flag.
    pub fn take_refresh(&mut self) -> bool {
        core::mem::take(&mut self.ctx.refresh_needed)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// One-second countdown step. Forces the timer screen into view while
    /// running and rings the bell at zero.
    fn step_countdown(&mut self, sink: &mut impl EventSink) {
        if !self.ctx.timer_running || self.ctx.timer_remaining == 0 {
            return;
        }

        self.ctx.timer_remaining -= 1;

        let screen = self.fsm.current_screen();
        if screen != Screen::Timer && screen != Screen::Bell {
            self.fsm.force_transition(Screen::Timer, &mut self.ctx);
            self.ctx.dirty = true;
        }

        if self.ctx.timer_remaining == 0 {
            self.ctx.timer_running = false;
            self.fsm.force_transition(Screen::Bell, &mut self.ctx);
            sink.emit(&AppEvent::TimerFinished);
        } else {
            self.ctx.refresh_needed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::NullEventSink;

    /// Records every emitted event.
    #[derive(Default)]
    struct VecSink(Vec<AppEvent>);

    impl EventSink for VecSink {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(*event);
        }
    }

    fn started_service() -> (AppService, VecSink) {
        let mut svc = AppService::new(SystemConfig::default());
        let mut sink = VecSink::default();
        svc.start(0, &mut sink);
        (svc, sink)
    }

    /// Advance in 100 ms ticks until `until_ms`.
    fn run_until(svc: &mut AppService, sink: &mut VecSink, from_ms: i64, until_ms: i64) {
        let mut t = from_ms;
        while t < until_ms {
            t += 100;
            svc.tick(t, sink);
        }
    }

    #[test]
    fn five_second_countdown_lifecycle() {
        let (mut svc, mut sink) = started_service();
        svc.handle_command(UiCommand::StartTimer(5), &mut sink);

        assert_eq!(svc.screen(), Screen::Timer, "timer shows immediately");
        assert_eq!(svc.timer_remaining(), 5);

        // Remaining decrements once per elapsed second: 4, 3, 2, 1, 0.
        let mut seen = Vec::new();
        let mut t = 0;
        for _ in 0..5 {
            let before = svc.timer_remaining();
            while svc.timer_remaining() == before {
                t += 100;
                svc.tick(t, &mut sink);
            }
            seen.push(svc.timer_remaining());
        }
        assert_eq!(seen, vec![4, 3, 2, 1, 0]);

        assert_eq!(svc.screen(), Screen::Bell, "bell rings at zero");
        assert!(!svc.timer_running());
        assert!(sink.0.contains(&AppEvent::TimerFinished));

        // Four seconds later the bell yields to the menu.
        run_until(&mut svc, &mut sink, t, t + 4_000);
        assert_eq!(svc.screen(), Screen::Menu);
    }

    #[test]
    fn countdown_forces_timer_screen_from_menu() {
        let (mut svc, mut sink) = started_service();
        svc.handle_command(UiCommand::StartTimer(10), &mut sink);

        // User navigates away...
        svc.handle_command(UiCommand::SelectPath("/".into()), &mut sink);
        assert_eq!(svc.screen(), Screen::Menu);

        // ...but the next countdown second pulls the timer back into view.
        run_until(&mut svc, &mut sink, 0, 1_000);
        assert_eq!(svc.screen(), Screen::Timer);
    }

    #[test]
    fn wake_moves_clock_to_menu_only() {
        let (mut svc, mut sink) = started_service();
        assert_eq!(svc.screen(), Screen::Clock);

        svc.handle_command(UiCommand::Wake, &mut sink);
        assert_eq!(svc.screen(), Screen::Menu);

        // From a running timer, wake keeps the timer visible.
        svc.handle_command(UiCommand::StartTimer(30), &mut sink);
        svc.handle_command(UiCommand::Wake, &mut sink);
        assert_eq!(svc.screen(), Screen::Timer);
    }

    #[test]
    fn wake_always_resets_idle_window() {
        let (mut svc, mut sink) = started_service();
        svc.handle_command(UiCommand::SelectPath("/".into()), &mut sink);

        // Keep waking every 20 s; the menu must never time out.
        let mut t = 0;
        for _ in 0..4 {
            run_until(&mut svc, &mut sink, t, t + 20_000);
            t += 20_000;
            svc.handle_command(UiCommand::Wake, &mut sink);
        }
        assert_eq!(svc.screen(), Screen::Menu);
    }

    #[test]
    fn menu_idles_back_to_clock() {
        let (mut svc, mut sink) = started_service();
        svc.handle_command(UiCommand::Wake, &mut sink);
        assert_eq!(svc.screen(), Screen::Menu);

        run_until(&mut svc, &mut sink, 0, 31_000);
        assert_eq!(svc.screen(), Screen::Clock);
    }

    #[test]
    fn new_start_supersedes_running_countdown() {
        let (mut svc, mut sink) = started_service();
        svc.handle_command(UiCommand::StartTimer(100), &mut sink);
        run_until(&mut svc, &mut sink, 0, 3_000);
        assert_eq!(svc.timer_remaining(), 97);

        svc.handle_command(UiCommand::StartTimer(7), &mut sink);
        assert_eq!(svc.timer_total(), 7);
        assert_eq!(svc.timer_remaining(), 7);
        assert_eq!(svc.screen(), Screen::Timer);
    }

    #[test]
    fn zero_second_start_is_ignored() {
        let (mut svc, mut sink) = started_service();
        svc.handle_command(UiCommand::StartTimer(0), &mut sink);
        assert!(!svc.timer_running());
        assert_eq!(svc.screen(), Screen::Clock);
    }

    #[test]
    fn select_path_updates_selection_and_shows_menu() {
        let (mut svc, mut sink) = started_service();
        svc.handle_command(UiCommand::SelectPath("/Sample Folder".into()), &mut sink);
        assert_eq!(svc.selected_path(), "/Sample Folder");
        assert_eq!(svc.screen(), Screen::Menu);
        assert!(svc.take_dirty());
    }

    #[test]
    fn connectivity_change_requests_refresh() {
        let (mut svc, _) = started_service();
        let mut sink = NullEventSink;
        let _ = svc.take_refresh();

        svc.handle_command(UiCommand::SetConnected(true), &mut sink);
        assert!(svc.connected());
        assert!(svc.take_refresh());

        // Idempotent: same value again requests nothing.
        svc.handle_command(UiCommand::SetConnected(true), &mut sink);
        assert!(!svc.take_refresh());
    }

    #[test]
    fn menu_change_resets_idle_and_emits_event() {
        let (mut svc, mut sink) = started_service();
        svc.handle_command(UiCommand::Wake, &mut sink);
        assert_eq!(svc.screen(), Screen::Menu);

        // An admin edit at 25 s counts as interaction; the menu must
        // still be up at 40 s and carry the edit's version in the trace.
        run_until(&mut svc, &mut sink, 0, 25_000);
        svc.handle_command(UiCommand::MenuChanged(3), &mut sink);
        assert!(svc.take_dirty());

        run_until(&mut svc, &mut sink, 25_000, 40_000);
        assert_eq!(svc.screen(), Screen::Menu);
        assert!(sink.0.contains(&AppEvent::MenuChanged(3)));
    }

    #[test]
    fn events_trace_screen_changes() {
        let (mut svc, mut sink) = started_service();
        svc.handle_command(UiCommand::StartTimer(1), &mut sink);
        run_until(&mut svc, &mut sink, 0, 1_000);

        assert!(sink.0.contains(&AppEvent::Started(Screen::Clock)));
        assert!(sink.0.contains(&AppEvent::TimerStarted(1)));
        assert!(sink.0.contains(&AppEvent::ScreenChanged {
            from: Screen::Clock,
            to: Screen::Timer
        }));
        assert!(sink.0.contains(&AppEvent::ScreenChanged {
            from: Screen::Timer,
            to: Screen::Bell
        }));
    }

    #[test]
    fn clock_refreshes_once_per_second() {
        let (mut svc, mut sink) = started_service();
        let _ = svc.take_refresh();
        let _ = svc.take_dirty();

        svc.tick(100, &mut sink);
        assert!(!svc.take_refresh(), "sub-second tick: nothing to do");

        svc.tick(1_000, &mut sink);
        assert!(svc.take_refresh(), "second boundary: clock advances");
    }
}
