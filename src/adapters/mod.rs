//! Hardware and platform adapters.
//!
//! Each adapter implements a port from [`crate::app::ports`]. Device code
//! is gated behind the `espidf` feature; without it every adapter compiles
//! to an in-memory simulation so the whole crate builds and tests on the
//! host.

pub mod display;
pub mod http;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
