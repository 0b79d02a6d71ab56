//! Connection Session
//!
//! Owns the X connection and the root window for the lifetime of the
//! process. [`DisplayServer`] is the set of requests the rest of the manager
//! issues; [`X11Session`] implements it over x11rb.

use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::error::{Result, WmError};
use crate::wm::events::WmEvent;
use crate::wm::keyboard::KeyboardMapping;

/// X requests used by the window manager
pub trait DisplayServer {
    /// Root window of the managed screen
    fn root(&self) -> Window;

    /// Claim substructure redirect and notify on root.
    ///
    /// Fails with [`WmError::AnotherWmRunning`] if another client already
    /// holds the redirect.
    fn select_substructure_interest(&self) -> Result<()>;

    /// Define a cursor-font glyph as the root window's pointer shape
    fn set_root_cursor(&self, glyph: u16) -> Result<()>;

    /// Current keysym table of the keyboard
    fn keyboard_mapping(&self) -> Result<KeyboardMapping>;

    /// Asynchronous key grab on root
    fn grab_key(&self, keycode: Keycode, modifiers: ModMask) -> Result<()>;

    /// Synchronous pointer grab on root for `button`, any descendant
    fn grab_button(&self, button: u8) -> Result<()>;

    /// Thaw the pointer and replay the frozen press to its client
    fn allow_replay(&self) -> Result<()>;

    fn map_window(&self, window: Window) -> Result<()>;

    /// Round trip: every request issued so far has been processed
    fn sync(&self) -> Result<()>;

    /// Block until the next event arrives
    fn next_event(&self) -> Result<WmEvent>;
}

/// Live connection to the X server
pub struct X11Session {
    conn: RustConnection,
    screen_num: usize,
    root: Window,
}

impl X11Session {
    /// Connect to the default display (`$DISPLAY`).
    pub fn open() -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;

        info!(
            "Connected to X server, screen {}, root window 0x{:x} ({}x{})",
            screen_num, root, screen.width_in_pixels, screen.height_in_pixels
        );

        Ok(Self {
            conn,
            screen_num,
            root,
        })
    }

    pub fn screen_num(&self) -> usize {
        self.screen_num
    }

    /// Flush pending requests and drop the connection.
    pub fn close(self) -> Result<()> {
        self.conn.flush()?;
        info!("Closed X connection");
        Ok(())
    }
}

impl DisplayServer for X11Session {
    fn root(&self) -> Window {
        self.root
    }

    fn select_substructure_interest(&self) -> Result<()> {
        let mask = EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY;
        debug!("Selecting {:?} on root 0x{:x}", mask, self.root);

        let aux = ChangeWindowAttributesAux::new().event_mask(mask);
        self.conn
            .change_window_attributes(self.root, &aux)?
            .check()
            .map_err(|e| match e {
                ReplyError::X11Error(_) => WmError::AnotherWmRunning(e),
                other => WmError::Reply(other),
            })
    }

    fn set_root_cursor(&self, glyph: u16) -> Result<()> {
        let font = self.conn.generate_id()?;
        self.conn.open_font(font, b"cursor")?;

        let cursor = self.conn.generate_id()?;
        self.conn.create_glyph_cursor(
            cursor,
            font,
            font,
            glyph,
            glyph + 1, // mask glyph follows the shape
            0,
            0,
            0,
            0xffff,
            0xffff,
            0xffff,
        )?;
        self.conn.close_font(font)?;

        self.conn
            .change_window_attributes(self.root, &ChangeWindowAttributesAux::new().cursor(cursor))?;
        debug!("Root cursor set to glyph {}", glyph);
        Ok(())
    }

    fn keyboard_mapping(&self) -> Result<KeyboardMapping> {
        let setup = self.conn.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        let reply = self
            .conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;

        Ok(KeyboardMapping::new(
            min_keycode,
            reply.keysyms_per_keycode,
            reply.keysyms,
        ))
    }

    fn grab_key(&self, keycode: Keycode, modifiers: ModMask) -> Result<()> {
        self.conn.grab_key(
            false,
            self.root,
            modifiers,
            keycode,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )?;
        Ok(())
    }

    fn grab_button(&self, button: u8) -> Result<()> {
        self.conn.grab_button(
            false,
            self.root,
            EventMask::BUTTON_PRESS,
            GrabMode::SYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            ButtonIndex::from(button),
            ModMask::from(0u16),
        )?;
        Ok(())
    }

    fn allow_replay(&self) -> Result<()> {
        self.conn
            .allow_events(Allow::REPLAY_POINTER, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        // Any request with a reply works; the reply is ordered after every
        // request sent before it.
        self.conn.get_input_focus()?.reply()?;
        Ok(())
    }

    fn next_event(&self) -> Result<WmEvent> {
        let event = self.conn.wait_for_event()?;
        Ok(WmEvent::from(event))
    }
}

/// Glyph indices in the X core `cursor` font (X11/cursorfont.h)
const CURSOR_SHAPES: &[(&str, u16)] = &[
    ("X_cursor", 0),
    ("arrow", 2),
    ("crosshair", 34),
    ("fleur", 52),
    ("hand1", 58),
    ("hand2", 60),
    ("left_ptr", 68),
    ("question_arrow", 92),
    ("sizing", 120),
    ("top_left_arrow", 132),
    ("watch", 150),
    ("xterm", 152),
];

/// Look up a cursor-font glyph by its cursorfont.h name (without `XC_`).
pub fn cursor_glyph(shape: &str) -> Result<u16> {
    CURSOR_SHAPES
        .iter()
        .find(|(name, _)| *name == shape)
        .map(|&(_, glyph)| glyph)
        .ok_or_else(|| WmError::UnknownCursor(shape.to_string()))
}
