//! Frame scheduling: fade transitions, redraws, and the UI loop.
//!
//! The display mutex is shared with nothing else today, but the discipline
//! still matters for the fade: the lock is taken per frame or per fade step
//! and *never* held across a sleep, so a slow animation cannot starve
//! anyone else who needs the panel.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::app::ports::{DisplayPort, EventSink, StoragePort};
use crate::app::{AppService, MenuState, SharedStatus, UiCommand};
use crate::config::SystemConfig;
use crate::fsm::Screen;

use super::screens::{self, FrameSnapshot, MenuView, WallTime};

/// What the renderer did for a tick. Returned for observability and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderAction {
    /// Nothing changed; no panel traffic.
    Idle,
    /// Screen switched: fade out, redraw, fade in.
    Faded,
    /// Content changed: immediate redraw.
    Redrew,
    /// Periodic update (clock or countdown second).
    Refreshed,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Owns the decision of *when* to repaint and the fade animation.
pub struct Renderer<D: DisplayPort> {
    display: Arc<Mutex<D>>,
    /// The screen currently visible on the panel.
    visual: Screen,
    fade_step: u8,
    fade_delay: Duration,
}

impl<D: DisplayPort> Renderer<D> {
    pub fn new(display: Arc<Mutex<D>>, config: &SystemConfig) -> Self {
        Self {
            display,
            visual: Screen::Clock,
            fade_step: config.fade_intensity_step.max(1),
            fade_delay: Duration::from_millis(u64::from(config.fade_step_delay_ms)),
        }
    }

    /// The screen currently on the panel (may lag the logical screen by
    /// one tick, never more).
    pub fn visual(&self) -> Screen {
        self.visual
    }

    /// Decide and perform this tick's panel work, in priority order:
    /// screen change → fade; dirty → redraw; refresh → plain redraw.
    pub fn render(&mut self, snap: &FrameSnapshot, dirty: bool, refresh: bool) -> RenderAction {
        if snap.screen != self.visual {
            debug!("fading {} -> {}", self.visual.name(), snap.screen.name());
            self.fade_to(snap);
            RenderAction::Faded
        } else if dirty {
            self.draw(snap);
            RenderAction::Redrew
        } else if refresh {
            self.draw(snap);
            RenderAction::Refreshed
        } else {
            RenderAction::Idle
        }
    }

    /// Paint one frame. The lock covers exactly one buffered frame.
    fn draw(&self, snap: &FrameSnapshot) {
        let mut d = self.lock_display();
        screens::draw_frame(&mut *d, snap);
    }

    /// Dim to black, swap the frame, brighten back up. Each intensity step
    /// takes the lock briefly and sleeps with it released.
    fn fade_to(&mut self, snap: &FrameSnapshot) {
        let mut level: u8 = 255;
        while level > 0 {
            level = level.saturating_sub(self.fade_step);
            self.lock_display().set_intensity(level);
            thread::sleep(self.fade_delay);
        }

        self.draw(snap);
        self.visual = snap.screen;

        while level < 255 {
            level = level.saturating_add(self.fade_step);
            self.lock_display().set_intensity(level);
            thread::sleep(self.fade_delay);
        }
    }

    fn lock_display(&self) -> MutexGuard<'_, D> {
        self.display.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// UI loop
// ---------------------------------------------------------------------------

/// The periodic loop that owns the application service.
///
/// Per tick: drain queued commands, advance the service, publish status,
/// and repaint if anything asks for it.
pub struct UiLoop<D: DisplayPort, S: StoragePort, E: EventSink> {
    app: AppService,
    renderer: Renderer<D>,
    menu: Arc<Mutex<MenuState<S>>>,
    commands: Receiver<UiCommand>,
    status: Arc<SharedStatus>,
    sink: E,
    tick_interval: Duration,
}

impl<D: DisplayPort, S: StoragePort, E: EventSink> UiLoop<D, S, E> {
    pub fn new(
        config: SystemConfig,
        display: Arc<Mutex<D>>,
        menu: Arc<Mutex<MenuState<S>>>,
        commands: Receiver<UiCommand>,
        status: Arc<SharedStatus>,
        sink: E,
    ) -> Self {
        let tick_interval = Duration::from_millis(u64::from(config.ui_tick_interval_ms));
        let renderer = Renderer::new(display, &config);
        Self {
            app: AppService::new(config),
            renderer,
            menu,
            commands,
            status,
            sink,
            tick_interval,
        }
    }

    /// Enter the initial screen.
    pub fn start(&mut self, now_ms: i64) {
        self.app.start(now_ms, &mut self.sink);
    }

    /// Run forever at the configured cadence. `now_ms` must be monotonic;
    /// `wall_time` is `None` until the clock synchronises.
    pub fn run(
        mut self,
        mut now_ms: impl FnMut() -> i64,
        mut wall_time: impl FnMut() -> Option<WallTime>,
    ) -> ! {
        self.start(now_ms());
        loop {
            self.tick_once(now_ms(), wall_time());
            thread::sleep(self.tick_interval);
        }
    }

    /// One full tick. Split out from [`run`](Self::run) so tests can drive
    /// it with simulated time.
    pub fn tick_once(&mut self, now_ms: i64, wall_time: Option<WallTime>) -> RenderAction {
        while let Ok(cmd) = self.commands.try_recv() {
            self.app.handle_command(cmd, &mut self.sink);
        }

        self.app.tick(now_ms, &mut self.sink);

        self.status.publish(
            self.app.screen(),
            self.app.connected(),
            self.app.timer_running(),
            self.app.timer_remaining(),
            self.app.timer_total(),
        );

        let dirty = self.app.take_dirty();
        let refresh = self.app.take_refresh();
        if !dirty && !refresh && self.app.screen() == self.renderer.visual() {
            return RenderAction::Idle;
        }

        let snap = self.build_snapshot(wall_time);
        self.renderer.render(&snap, dirty, refresh)
    }

    /// Capture everything the painters need. The menu lock is held only
    /// while copying rows out, never during drawing.
    fn build_snapshot(&self, wall_time: Option<WallTime>) -> FrameSnapshot {
        let path = self.app.selected_path();
        let selected_name = path
            .split('/')
            .rev()
            .find(|s| !s.is_empty())
            .unwrap_or("root")
            .to_string();

        let menu = {
            let state = self
                .menu
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.status.publish_menu_version(state.store.version());
            MenuView::build(
                state.store.root(),
                path,
                usize::from(self.app.config().menu_display_rows),
            )
        };

        FrameSnapshot {
            screen: self.app.screen(),
            wall_time,
            connected: self.app.connected(),
            menu,
            selected_name,
            timer_total: self.app.timer_total(),
            timer_remaining: self.app.timer_remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::FontStyle;

    /// Display that records the order of intensity changes and presents.
    #[derive(Default)]
    struct TraceDisplay {
        ops: Vec<TraceOp>,
    }

    #[derive(Debug, PartialEq, Eq)]
    enum TraceOp {
        Intensity(u8),
        Present,
    }

    impl DisplayPort for TraceDisplay {
        fn clear_frame(&mut self) {}
        fn set_font(&mut self, _style: FontStyle) {}
        fn draw_text(&mut self, _x: i32, _y: i32, _text: &str) {}
        fn draw_hline(&mut self, _x: i32, _y: i32, _len: u32) {}
        fn draw_pixel(&mut self, _x: i32, _y: i32) {}
        fn draw_glyph(&mut self, _x: i32, _y: i32, _glyph: u16) {}
        fn set_intensity(&mut self, level: u8) {
            self.ops.push(TraceOp::Intensity(level));
        }
        fn present(&mut self) {
            self.ops.push(TraceOp::Present);
        }
        fn text_width(&self, text: &str) -> i32 {
            text.len() as i32 * 6
        }
    }

    fn fast_config() -> SystemConfig {
        let mut cfg = SystemConfig::default();
        cfg.fade_step_delay_ms = 0; // no real sleeping in tests
        cfg
    }

    fn clock_snapshot(screen: Screen) -> FrameSnapshot {
        FrameSnapshot {
            screen,
            wall_time: None,
            connected: false,
            menu: MenuView::Folder {
                title: "root".into(),
                rows: vec![],
                truncated: false,
            },
            selected_name: "root".into(),
            timer_total: 0,
            timer_remaining: 0,
        }
    }

    #[test]
    fn same_screen_clean_frame_is_idle() {
        let display = Arc::new(Mutex::new(TraceDisplay::default()));
        let mut r = Renderer::new(Arc::clone(&display), &fast_config());
        let action = r.render(&clock_snapshot(Screen::Clock), false, false);
        assert_eq!(action, RenderAction::Idle);
        assert!(display.lock().unwrap().ops.is_empty());
    }

    #[test]
    fn dirty_beats_refresh() {
        let display = Arc::new(Mutex::new(TraceDisplay::default()));
        let mut r = Renderer::new(display, &fast_config());
        let action = r.render(&clock_snapshot(Screen::Clock), true, true);
        assert_eq!(action, RenderAction::Redrew);
    }

    #[test]
    fn screen_change_fades_out_presents_then_fades_in() {
        let display = Arc::new(Mutex::new(TraceDisplay::default()));
        let mut r = Renderer::new(Arc::clone(&display), &fast_config());

        let action = r.render(&clock_snapshot(Screen::Menu), true, false);
        assert_eq!(action, RenderAction::Faded);
        assert_eq!(r.visual(), Screen::Menu);

        let d = display.lock().unwrap();
        let present_at = d
            .ops
            .iter()
            .position(|op| *op == TraceOp::Present)
            .expect("frame presented during fade");

        // Everything before the present dims to zero...
        assert!(matches!(d.ops[present_at - 1], TraceOp::Intensity(0)));
        // ...and the fade ends back at full brightness.
        assert_eq!(*d.ops.last().unwrap(), TraceOp::Intensity(255));
    }

    #[test]
    fn fade_steps_follow_configured_granularity() {
        let display = Arc::new(Mutex::new(TraceDisplay::default()));
        let mut cfg = fast_config();
        cfg.fade_intensity_step = 100;
        let mut r = Renderer::new(Arc::clone(&display), &cfg);
        r.render(&clock_snapshot(Screen::Menu), false, false);

        let d = display.lock().unwrap();
        let levels: Vec<u8> = d
            .ops
            .iter()
            .filter_map(|op| match op {
                TraceOp::Intensity(l) => Some(*l),
                TraceOp::Present => None,
            })
            .collect();
        assert_eq!(levels, vec![155, 55, 0, 100, 200, 255]);
    }
}
