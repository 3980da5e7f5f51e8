//! Unified error types for the BSQ Timer firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level loop's error handling uniform. Menu errors are `Copy` so they
//! can be returned straight through the HTTP dispatch layer without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A menu tree operation failed.
    Menu(MenuError),
    /// Persistent key/value storage failed.
    Storage(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Peripheral or service initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu(e) => write!(f, "menu: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}
impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Menu tree errors
// ---------------------------------------------------------------------------

/// Errors from [`MenuStore`](crate::menu::MenuStore) operations.
///
/// All variants are returned synchronously to the caller; the store never
/// retries internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuError {
    /// A path (or a child name under a path) did not resolve.
    NotFound,
    /// A sibling with the requested name already exists.
    AlreadyExists,
    /// The request itself is malformed (empty name, zero seconds, ...).
    InvalidArgument(&'static str),
    /// The durable write failed. The previous in-memory tree is retained;
    /// no automatic retry.
    Persistence,
    /// The persisted tree could not be parsed at load time.
    Parse,
}

impl MenuError {
    /// Short machine-readable tag, used in HTTP error payloads.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Persistence => "persistence_failure",
            Self::Parse => "parse_failure",
        }
    }
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "path or child not found"),
            Self::AlreadyExists => write!(f, "sibling name already exists"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Persistence => write!(f, "persistent write failed"),
            Self::Parse => write!(f, "persisted tree unparseable"),
        }
    }
}

impl From<MenuError> for Error {
    fn from(e: MenuError) -> Self {
        Self::Menu(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors from [`StoragePort`](crate::app::ports::StoragePort) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
