//! Recording stand-in for the X server used by unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use x11rb::protocol::xproto::{Keycode, ModMask, Window};

use crate::error::{Result, WmError};
use crate::wm::events::WmEvent;
use crate::wm::keyboard::KeyboardMapping;
use crate::wm::session::DisplayServer;

pub const ROOT: Window = 0x100;

/// A request the manager issued, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    SelectSubstructure,
    SetRootCursor(u16),
    KeyboardMapping,
    GrabKey { keycode: Keycode, modifiers: u16 },
    GrabButton(u8),
    AllowReplay,
    MapWindow(Window),
    Sync,
}

#[derive(Default)]
pub struct FakeDisplay {
    requests: RefCell<Vec<Request>>,
    events: RefCell<VecDeque<WmEvent>>,
    redirect_taken: bool,
}

impl FakeDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// A server where another client already holds substructure redirect
    pub fn with_other_wm() -> Self {
        Self {
            redirect_taken: true,
            ..Self::default()
        }
    }

    pub fn push_event(&self, event: WmEvent) {
        self.events.borrow_mut().push_back(event);
    }

    /// Drain the recorded requests
    pub fn take_requests(&self) -> Vec<Request> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }

    fn log(&self, request: Request) {
        self.requests.borrow_mut().push(request);
    }
}

impl DisplayServer for FakeDisplay {
    fn root(&self) -> Window {
        ROOT
    }

    fn select_substructure_interest(&self) -> Result<()> {
        self.log(Request::SelectSubstructure);
        if self.redirect_taken {
            // BadAccess; the payload is never inspected by the manager
            return Err(WmError::AnotherWmRunning(
                x11rb::errors::ConnectionError::UnknownError.into(),
            ));
        }
        Ok(())
    }

    fn set_root_cursor(&self, glyph: u16) -> Result<()> {
        self.log(Request::SetRootCursor(glyph));
        Ok(())
    }

    /// US-ish layout: keycode 38 is a/A, 36 is Return, 67.. are F1..F10
    fn keyboard_mapping(&self) -> Result<KeyboardMapping> {
        self.log(Request::KeyboardMapping);
        let min_keycode = 8;
        let per = 2;
        let mut keysyms = vec![0u32; (255 - 8 + 1) * per];
        let mut set = |keycode: usize, syms: [u32; 2]| {
            let i = (keycode - min_keycode as usize) * per;
            keysyms[i..i + per].copy_from_slice(&syms);
        };
        set(24, [0x71, 0x51]); // q Q
        set(36, [0xff0d, 0]); // Return
        set(38, [0x61, 0x41]); // a A
        set(65, [0x20, 0]); // space
        for n in 0..10 {
            set(67 + n, [0xffbe + n as u32, 0]);
        }
        Ok(KeyboardMapping::new(min_keycode, per as u8, keysyms))
    }

    fn grab_key(&self, keycode: Keycode, modifiers: ModMask) -> Result<()> {
        self.log(Request::GrabKey {
            keycode,
            modifiers: u16::from(modifiers),
        });
        Ok(())
    }

    fn grab_button(&self, button: u8) -> Result<()> {
        self.log(Request::GrabButton(button));
        Ok(())
    }

    fn allow_replay(&self) -> Result<()> {
        self.log(Request::AllowReplay);
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.log(Request::MapWindow(window));
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.log(Request::Sync);
        Ok(())
    }

    fn next_event(&self) -> Result<WmEvent> {
        self.events
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| x11rb::errors::ConnectionError::UnknownError.into())
    }
}
