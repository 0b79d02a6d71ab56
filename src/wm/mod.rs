//! Window Manager Module
//!
//! Claims the root window, installs the configured grabs and runs the event
//! loop. All manager state lives in [`WindowManager`]; there are no globals.

pub mod events;
pub mod keyboard;
pub mod keysym;
pub mod registry;
pub mod session;

#[cfg(test)]
pub mod testing;

use std::convert::Infallible;
use tracing::{debug, error, info, warn};
use x11rb::protocol::xproto::Window;

use crate::config::Config;
use crate::error::{Result, WmError};
use events::WmEvent;
use keyboard::GrabTable;
use registry::WindowRegistry;
use session::DisplayServer;

pub struct WindowManager<D: DisplayServer> {
    display: D,
    registry: WindowRegistry,
    grabs: GrabTable,
}

impl<D: DisplayServer> WindowManager<D> {
    /// Wrap `display` without talking to the server yet.
    pub fn new(display: D, config: &Config) -> Self {
        Self {
            display,
            registry: WindowRegistry::new(config.registry.capacity),
            grabs: GrabTable::new(),
        }
    }

    /// Become the window manager on the display's root.
    ///
    /// Selects substructure redirect, sets the root cursor, then grabs the
    /// configured pointer buttons and keys. Each step is synced before the
    /// next one. Any failure here is fatal for the caller, which still owns
    /// the manager and can close the connection.
    pub fn setup(&mut self, config: &Config) -> Result<()> {
        let display = &self.display;
        let root = display.root();
        let cursor = session::cursor_glyph(&config.cursor.shape)?;
        let bindings = config.key_bindings()?;

        debug!("WM: Selecting substructure events on root 0x{:x}", root);
        display.select_substructure_interest()?;
        display.sync()?;
        info!("Registered as window manager");

        display.set_root_cursor(cursor)?;
        display.sync()?;

        for &button in &config.pointer.grab_buttons {
            self.grabs.grab_pointer_button(display, button)?;
        }

        if !bindings.is_empty() {
            let mapping = display.keyboard_mapping()?;
            for binding in &bindings {
                self.grabs.grab_key(display, &mapping, binding)?;
            }
        }
        Ok(())
    }

    /// Process events until the connection fails.
    pub fn run(&mut self) -> Result<Infallible> {
        info!("Entering event loop");
        loop {
            let event = self.display.next_event()?;
            self.dispatch(event)?;
        }
    }

    /// Handle one event, then sync so its effects land before the next wait.
    pub fn dispatch(&mut self, event: WmEvent) -> Result<()> {
        debug!("Event: {}", event.kind());
        self.handle_event(event)?;
        self.display.sync()
    }

    fn handle_event(&mut self, event: WmEvent) -> Result<()> {
        match event {
            WmEvent::ButtonPress {
                window,
                button,
                state,
            } => {
                // Replayed unconditionally: root does not select ButtonPress,
                // so presses only reach us through our own grabs.
                if !self.grabs.is_button_grabbed(button) {
                    debug!("Button {} pressed without a grab of its own", button);
                }
                keyboard::allow_replay(&self.display)?;
                self.display.sync()?;
                info!(
                    "Button pressed! (button {}, state 0x{:x}, window 0x{:x})",
                    button,
                    u16::from(state),
                    window
                );
            }

            WmEvent::KeyPress {
                window,
                keycode,
                state,
            } => match self.grabs.binding_for(state, keycode) {
                Some(b) => info!(
                    "Key pressed! ({:?} + mods 0x{:x}, window 0x{:x})",
                    b.binding.key,
                    u16::from(b.binding.modifiers),
                    window
                ),
                None => info!("Key pressed! (keycode {}, window 0x{:x})", keycode, window),
            },

            WmEvent::CreateNotify { parent, window } => self.on_create_notify(parent, window),

            WmEvent::MapRequest { parent, window } => {
                info!(
                    "map 0x{:x} (parent 0x{:x}, registered: {})",
                    window,
                    parent,
                    self.registry.contains(window)
                );
                self.display.map_window(window)?;
            }

            WmEvent::Error {
                error_code,
                major_opcode,
                bad_value,
            } => {
                warn!(
                    "X11 Error: error_code={}, request_code={}, bad_value=0x{:x}",
                    error_code, major_opcode, bad_value
                );
            }

            WmEvent::Other { kind } => info!("Unexpected event: {}", kind),
        }
        Ok(())
    }

    fn on_create_notify(&mut self, parent: Window, window: Window) {
        match self.registry.record(window) {
            Ok(entry) => info!(
                "windows[{}] = 0x{:x} (parent 0x{:x}, {}/{} slots used)",
                entry.order,
                entry.window,
                parent,
                self.registry.len(),
                self.registry.capacity()
            ),
            Err(e @ WmError::RegistryFull { .. }) => error!("{}", e),
            Err(e) => error!("Failed to record window 0x{:x}: {}", window, e),
        }
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn grabs(&self) -> &GrabTable {
        &self.grabs
    }

    #[cfg(test)]
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Give back the connection, e.g. to close it
    pub fn into_display(self) -> D {
        self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testing::{FakeDisplay, Request, ROOT};
    use x11rb::protocol::xproto::{KeyButMask, ModMask};

    fn start(display: FakeDisplay, config: &Config) -> Result<WindowManager<FakeDisplay>> {
        let mut wm = WindowManager::new(display, config);
        wm.setup(config)?;
        Ok(wm)
    }

    fn manager() -> WindowManager<FakeDisplay> {
        let wm = start(FakeDisplay::new(), &Config::default()).unwrap();
        wm.display().take_requests();
        wm
    }

    fn create(window: Window) -> WmEvent {
        WmEvent::CreateNotify {
            parent: ROOT,
            window,
        }
    }

    fn map(window: Window) -> WmEvent {
        WmEvent::MapRequest {
            parent: ROOT,
            window,
        }
    }

    fn button(button: u8) -> WmEvent {
        WmEvent::ButtonPress {
            window: ROOT,
            button,
            state: KeyButMask::from(0u16),
        }
    }

    #[test]
    fn setup_order() {
        let wm = start(FakeDisplay::new(), &Config::default()).unwrap();

        let requests = wm.display().take_requests();
        assert_eq!(
            requests,
            vec![
                Request::SelectSubstructure,
                Request::Sync,
                Request::SetRootCursor(68),
                Request::Sync,
                Request::GrabButton(1),
                Request::Sync,
                Request::KeyboardMapping,
                Request::GrabKey {
                    keycode: 38,
                    modifiers: u16::from(ModMask::SHIFT),
                },
                Request::Sync,
            ]
        );
        assert!(wm.registry().is_empty());
        assert_eq!(wm.registry().capacity(), 64);
    }

    #[test]
    fn other_wm_running_is_fatal() {
        let result = start(FakeDisplay::with_other_wm(), &Config::default());
        assert!(matches!(result, Err(WmError::AnotherWmRunning(_))));
    }

    #[test]
    fn unresolvable_binding_is_fatal_and_not_grabbed() {
        let config = Config::from_toml("[[keybindings]]\nkey = \"Bogus\"\n").unwrap();
        let display = FakeDisplay::new();
        let err = match start(display, &config) {
            Err(e) => e,
            Ok(_) => panic!("binding should not resolve"),
        };
        assert!(matches!(err, WmError::UnknownKey(ref name) if name == "Bogus"));
    }

    #[test]
    fn unknown_cursor_fails_before_any_request() {
        let config = Config::from_toml("[cursor]\nshape = \"nope\"\n").unwrap();
        let mut wm = WindowManager::new(FakeDisplay::new(), &config);
        assert!(matches!(wm.setup(&config), Err(WmError::UnknownCursor(_))));
        assert!(wm.display().take_requests().is_empty());
    }

    #[test]
    fn failed_setup_hands_the_connection_back() {
        let config = Config::default();
        let mut wm = WindowManager::new(FakeDisplay::with_other_wm(), &config);
        assert!(matches!(
            wm.setup(&config),
            Err(WmError::AnotherWmRunning(_))
        ));

        // The caller still owns the display and can close it
        let display = wm.into_display();
        assert_eq!(display.take_requests(), vec![Request::SelectSubstructure]);
    }

    #[test]
    fn creation_order_is_kept() {
        let mut wm = manager();
        let windows: Vec<Window> = (0..10).map(|i| 0x400000 + i).collect();
        for &w in &windows {
            wm.dispatch(create(w)).unwrap();
        }

        assert_eq!(wm.registry().windows().collect::<Vec<_>>(), windows);
        // One sync per event, nothing else
        assert_eq!(wm.display().take_requests(), vec![Request::Sync; 10]);
    }

    #[test]
    fn overflow_drops_new_window_and_keeps_running() {
        let config = Config::from_toml("[registry]\ncapacity = 3\n").unwrap();
        let mut wm = start(FakeDisplay::new(), &config).unwrap();

        for w in 1..=5 {
            wm.dispatch(create(w)).unwrap();
        }

        assert_eq!(wm.registry().windows().collect::<Vec<_>>(), vec![1, 2, 3]);

        // Still serving requests after the overflow
        wm.display().take_requests();
        wm.dispatch(map(4)).unwrap();
        assert_eq!(
            wm.display().take_requests(),
            vec![Request::MapWindow(4), Request::Sync]
        );
    }

    #[test]
    fn map_request_for_unregistered_window() {
        let mut wm = manager();
        wm.dispatch(map(0x600001)).unwrap();

        assert!(!wm.registry().contains(0x600001));
        assert_eq!(
            wm.display().take_requests(),
            vec![Request::MapWindow(0x600001), Request::Sync]
        );
    }

    #[test]
    fn repeated_map_requests() {
        let mut wm = manager();
        wm.dispatch(map(0x600001)).unwrap();
        wm.dispatch(map(0x600001)).unwrap();

        assert_eq!(
            wm.display().take_requests(),
            vec![
                Request::MapWindow(0x600001),
                Request::Sync,
                Request::MapWindow(0x600001),
                Request::Sync,
            ]
        );
    }

    #[test]
    fn button_press_replays_before_next_wait() {
        let mut wm = manager();
        wm.dispatch(button(1)).unwrap();

        assert_eq!(
            wm.display().take_requests(),
            vec![Request::AllowReplay, Request::Sync, Request::Sync]
        );
    }

    #[test]
    fn key_press_and_unknown_events_change_nothing() {
        let mut wm = manager();
        wm.dispatch(create(0x10)).unwrap();
        wm.display().take_requests();

        wm.dispatch(WmEvent::KeyPress {
            window: ROOT,
            keycode: 38,
            state: KeyButMask::SHIFT,
        })
        .unwrap();
        wm.dispatch(WmEvent::Other {
            kind: "ConfigureRequest".into(),
        })
        .unwrap();
        wm.dispatch(WmEvent::Error {
            error_code: 3,
            major_opcode: 8,
            bad_value: 0x10,
        })
        .unwrap();

        assert_eq!(wm.display().take_requests(), vec![Request::Sync; 3]);
        assert_eq!(wm.registry().windows().collect::<Vec<_>>(), vec![0x10]);
    }

    #[test]
    fn end_to_end() {
        let display = FakeDisplay::new();
        let w1: Window = 0x200001;
        let mut wm = start(display, &Config::default()).unwrap();
        let setup = wm.display().take_requests();
        assert_eq!(setup.first(), Some(&Request::SelectSubstructure));
        assert!(setup.contains(&Request::GrabButton(1)));
        assert!(setup.contains(&Request::GrabKey {
            keycode: 38,
            modifiers: u16::from(ModMask::SHIFT),
        }));

        wm.display().push_event(create(w1));
        wm.display().push_event(map(w1));
        wm.display().push_event(button(1));
        wm.display().push_event(WmEvent::Other {
            kind: "PropertyNotify".into(),
        });

        // The fake reports a lost connection once its queue is empty
        assert!(matches!(wm.run(), Err(WmError::Connection(_))));

        assert_eq!(wm.registry().windows().collect::<Vec<_>>(), vec![w1]);
        assert_eq!(
            wm.display().take_requests(),
            vec![
                Request::Sync,
                Request::MapWindow(w1),
                Request::Sync,
                Request::AllowReplay,
                Request::Sync,
                Request::Sync,
                Request::Sync,
            ]
        );
    }
}
