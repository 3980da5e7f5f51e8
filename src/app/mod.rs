//! Application core: ports, commands, events, and the UI service.
//!
//! Everything in this module is hardware-agnostic. Hardware enters only
//! through the port traits in [`ports`], which the adapters implement.

pub mod api;
pub mod commands;
pub mod events;
pub mod ports;
pub mod service;

pub use api::{CommandApi, MenuState, SharedStatus, StatusReport};
pub use commands::UiCommand;
pub use events::AppEvent;
pub use service::AppService;
