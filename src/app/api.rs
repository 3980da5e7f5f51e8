//! Command API: the surface the HTTP handlers (and tests) call.
//!
//! Menu operations need a synchronous answer, so they take the menu mutex
//! directly. Display-state operations are fire-and-forget: they enqueue a
//! [`UiCommand`] for the loop thread. Read-only status comes from
//! [`SharedStatus`], a handful of atomics the loop publishes every tick,
//! handlers never touch the UI context itself.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::{MenuError, StorageError};
use crate::fsm::Screen;
use crate::menu::{MenuNode, MenuStore, NodeKind, TimerMode};

use super::commands::UiCommand;
use super::ports::StoragePort;

/// Storage keys for station credentials (same namespace as the menu).
pub const KEY_SSID: &str = "ssid";
pub const KEY_PASS: &str = "pass";

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// The menu store together with the storage it persists into, behind one
/// mutex so a mutation and its durable write are a single critical section.
pub struct MenuState<S: StoragePort> {
    pub store: MenuStore,
    pub storage: S,
}

/// Loop-published snapshot of the display state. Written by the UI loop
/// once per tick, read lock-free by status handlers.
#[derive(Default)]
pub struct SharedStatus {
    screen: AtomicU8,
    connected: AtomicBool,
    timer_running: AtomicBool,
    timer_remaining: AtomicU32,
    timer_total: AtomicU32,
    menu_version: AtomicU64,
}

impl SharedStatus {
    pub fn publish(
        &self,
        screen: Screen,
        connected: bool,
        timer_running: bool,
        timer_remaining: u32,
        timer_total: u32,
    ) {
        self.screen.store(screen as u8, Ordering::Relaxed);
        self.connected.store(connected, Ordering::Relaxed);
        self.timer_running.store(timer_running, Ordering::Relaxed);
        self.timer_remaining
            .store(timer_remaining, Ordering::Relaxed);
        self.timer_total.store(timer_total, Ordering::Relaxed);
    }

    pub fn publish_menu_version(&self, version: u64) {
        self.menu_version.store(version, Ordering::Relaxed);
    }

    pub fn screen(&self) -> Screen {
        Screen::from_index(self.screen.load(Ordering::Relaxed) as usize)
    }

    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

/// JSON body of `GET /api/state`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub screen: &'static str,
    pub timer_running: bool,
    pub timer_remaining: u32,
    pub timer_total: u32,
    pub connected: bool,
    pub menu_version: u64,
}

// ---------------------------------------------------------------------------
// Command API
// ---------------------------------------------------------------------------

/// Handle given to each request handler. Cheap to clone.
pub struct CommandApi<S: StoragePort> {
    menu: Arc<Mutex<MenuState<S>>>,
    tx: Sender<UiCommand>,
    status: Arc<SharedStatus>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S: StoragePort> Clone for CommandApi<S> {
    fn clone(&self) -> Self {
        Self {
            menu: Arc::clone(&self.menu),
            tx: self.tx.clone(),
            status: Arc::clone(&self.status),
        }
    }
}

impl<S: StoragePort> CommandApi<S> {
    pub fn new(
        menu: Arc<Mutex<MenuState<S>>>,
        tx: Sender<UiCommand>,
        status: Arc<SharedStatus>,
    ) -> Self {
        Self { menu, tx, status }
    }

    // --- Display-state operations (fire-and-forget) ---

    /// The web UI was opened: bring up the menu if the clock is showing.
    pub fn wake(&self) {
        self.send(UiCommand::Wake);
    }

    /// Select a menu node and show it. Fails if the path does not resolve.
    pub fn select_path(&self, path: &str) -> Result<(), MenuError> {
        {
            let state = self.lock_menu();
            state.store.resolve(path)?;
        }
        self.send(UiCommand::SelectPath(path.to_string()));
        Ok(())
    }

    /// Start a countdown of `seconds`.
    pub fn start_timer(&self, seconds: u32) -> Result<(), MenuError> {
        if seconds == 0 {
            return Err(MenuError::InvalidArgument("seconds must be positive"));
        }
        self.send(UiCommand::StartTimer(seconds));
        Ok(())
    }

    /// Start the timer node at `path`. Fixed-mode nodes use their stored
    /// duration; variable-mode nodes require `seconds` from the client.
    pub fn start_node(&self, path: &str, seconds: Option<u32>) -> Result<(), MenuError> {
        let duration = {
            let state = self.lock_menu();
            match state.store.resolve(path)? {
                MenuNode::Folder { .. } => {
                    return Err(MenuError::InvalidArgument("not a timer node"));
                }
                MenuNode::Timer {
                    mode: TimerMode::Fixed,
                    fixed,
                    ..
                } => fixed.unwrap_or(0),
                MenuNode::Timer {
                    mode: TimerMode::Variable,
                    ..
                } => seconds.unwrap_or(0),
            }
        };
        if duration == 0 {
            return Err(MenuError::InvalidArgument("seconds must be positive"));
        }
        // Selection first: StartTimer forces the timer screen and must win.
        self.send(UiCommand::SelectPath(path.to_string()));
        self.send(UiCommand::StartTimer(duration));
        Ok(())
    }

    // --- Menu mutations (synchronous) ---

    pub fn add_node(
        &self,
        parent_path: &str,
        name: &str,
        kind: NodeKind,
        mode: TimerMode,
        fixed: Option<u32>,
    ) -> Result<u64, MenuError> {
        let version = {
            let mut state = self.lock_menu();
            let MenuState { store, storage } = &mut *state;
            store.add_child(storage, parent_path, name, kind, mode, fixed)?;
            let version = store.version();
            self.status.publish_menu_version(version);
            version
        };
        self.send(UiCommand::MenuChanged(version));
        Ok(version)
    }

    pub fn delete_node(&self, parent_path: &str, name: &str) -> Result<u64, MenuError> {
        let version = {
            let mut state = self.lock_menu();
            let MenuState { store, storage } = &mut *state;
            store.delete_child(storage, parent_path, name)?;
            let version = store.version();
            self.status.publish_menu_version(version);
            version
        };
        self.send(UiCommand::MenuChanged(version));
        Ok(version)
    }

    // --- Reads ---

    /// The whole menu tree as JSON.
    pub fn menu_snapshot(&self) -> String {
        self.lock_menu().store.snapshot_json()
    }

    pub fn status(&self) -> StatusReport {
        let s = &self.status;
        StatusReport {
            screen: s.screen().name(),
            timer_running: s.timer_running.load(Ordering::Relaxed),
            timer_remaining: s.timer_remaining.load(Ordering::Relaxed),
            timer_total: s.timer_total.load(Ordering::Relaxed),
            connected: s.connected(),
            menu_version: s.menu_version.load(Ordering::Relaxed),
        }
    }

    // --- Provisioning ---

    /// Store station credentials. Takes effect on the next boot.
    pub fn save_credentials(&self, ssid: &str, pass: &str) -> Result<(), StorageError> {
        let mut state = self.lock_menu();
        state.storage.write(KEY_SSID, ssid.as_bytes())?;
        state.storage.write(KEY_PASS, pass.as_bytes())?;
        Ok(())
    }

    // --- Internal ---

    fn send(&self, cmd: UiCommand) {
        // The receiver lives as long as the UI loop; a send can only fail
        // during shutdown, when dropping the command is the right thing.
        let _ = self.tx.send(cmd);
    }

    fn lock_menu(&self) -> MutexGuard<'_, MenuState<S>> {
        // A poisoned mutex means a panic elsewhere; the data itself is
        // still consistent thanks to the persist-then-swap discipline.
        self.menu.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
