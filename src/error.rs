//! Error types for the window manager core.

use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto::Window;

/// Everything that can go wrong while setting up or running the manager.
#[derive(Debug, Error)]
pub enum WmError {
    #[error("unable to open a X display: {0}")]
    Connect(#[from] ConnectError),

    #[error("X connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X request failed: {0}")]
    Reply(#[from] ReplyError),

    #[error("X request failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),

    /// Substructure redirect on root is already held by someone else.
    #[error("another window manager is already running")]
    AnotherWmRunning(#[source] ReplyError),

    #[error("unknown key name {0:?}")]
    UnknownKey(String),

    #[error("key {name:?} (keysym 0x{keysym:x}) has no keycode on this keyboard")]
    NoKeycode { name: String, keysym: u32 },

    #[error("unknown cursor shape {0:?}")]
    UnknownCursor(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("window registry is full ({capacity} slots), dropping window 0x{window:x}")]
    RegistryFull { capacity: usize, window: Window },
}

pub type Result<T, E = WmError> = std::result::Result<T, E>;
