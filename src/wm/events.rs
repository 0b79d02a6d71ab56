//! Events Module
//!
//! Classifies raw X events into the handful of kinds the manager reacts to.
//! Everything else lands in [`WmEvent::Other`].

use x11rb::protocol::xproto::{KeyButMask, Keycode, Window};
use x11rb::protocol::Event;

/// An event as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmEvent {
    /// Pointer button press delivered through a button grab
    ButtonPress {
        window: Window,
        button: u8,
        state: KeyButMask,
    },
    /// Key press delivered through a key grab
    KeyPress {
        window: Window,
        keycode: Keycode,
        state: KeyButMask,
    },
    /// A child of root was created
    CreateNotify { parent: Window, window: Window },
    /// A client asked for a window to be mapped
    MapRequest { parent: Window, window: Window },
    /// Asynchronous X protocol error
    Error {
        error_code: u8,
        major_opcode: u8,
        bad_value: u32,
    },
    /// Any other event; `kind` is the x11rb variant name
    Other { kind: String },
}

impl WmEvent {
    /// Short name for logging
    pub fn kind(&self) -> &str {
        match self {
            Self::ButtonPress { .. } => "ButtonPress",
            Self::KeyPress { .. } => "KeyPress",
            Self::CreateNotify { .. } => "CreateNotify",
            Self::MapRequest { .. } => "MapRequest",
            Self::Error { .. } => "Error",
            Self::Other { kind } => kind,
        }
    }
}

impl From<Event> for WmEvent {
    fn from(event: Event) -> Self {
        match event {
            Event::ButtonPress(e) => Self::ButtonPress {
                window: e.event,
                button: e.detail,
                state: e.state,
            },
            Event::KeyPress(e) => Self::KeyPress {
                window: e.event,
                keycode: e.detail,
                state: e.state,
            },
            Event::CreateNotify(e) => Self::CreateNotify {
                parent: e.parent,
                window: e.window,
            },
            Event::MapRequest(e) => Self::MapRequest {
                parent: e.parent,
                window: e.window,
            },
            Event::Error(e) => Self::Error {
                error_code: e.error_code,
                major_opcode: e.major_opcode,
                bad_value: e.bad_value,
            },
            other => Self::Other {
                kind: variant_name(&other),
            },
        }
    }
}

/// `"ConfigureRequest"` for `Event::ConfigureRequest(..)`
fn variant_name(event: &Event) -> String {
    let debug = format!("{:?}", event);
    match debug.find(|c: char| c == '(' || c == ' ' || c == '{') {
        Some(end) => debug[..end].to_string(),
        None => debug,
    }
}
