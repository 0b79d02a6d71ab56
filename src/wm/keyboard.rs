//! Keyboard Module
//!
//! Key binding resolution and the key/button grabs installed on root.
//! Bindings are resolved once at startup (name -> keysym -> keycode) into a
//! [`GrabTable`] that key presses are looked up in.

use std::collections::HashMap;
use tracing::{debug, info};
use x11rb::protocol::xproto::{KeyButMask, Keycode, ModMask};

use crate::error::{Result, WmError};
use crate::wm::keysym::{self, Keysym};
use crate::wm::session::DisplayServer;

/// Modifier bits that can appear in a grab (Shift .. Mod5)
const MODIFIER_BITS: u16 = 0x00ff;

/// Server keyboard mapping as returned by `GetKeyboardMapping`
#[derive(Debug, Clone)]
pub struct KeyboardMapping {
    min_keycode: Keycode,
    keysyms_per_keycode: u8,
    keysyms: Vec<Keysym>,
}

impl KeyboardMapping {
    pub fn new(min_keycode: Keycode, keysyms_per_keycode: u8, keysyms: Vec<Keysym>) -> Self {
        Self {
            min_keycode,
            keysyms_per_keycode,
            keysyms,
        }
    }

    /// Keycode that produces `keysym`, searched like `XKeysymToKeycode`:
    /// column 0 of every keycode first, then column 1, and so on.
    pub fn keycode_for(&self, keysym: Keysym) -> Option<Keycode> {
        let per = usize::from(self.keysyms_per_keycode);
        if per == 0 || keysym == 0 {
            return None;
        }

        let count = self.keysyms.len() / per;
        (0..per)
            .find_map(|col| (0..count).find(|&i| self.keysyms[i * per + col] == keysym))
            .and_then(|i| u8::try_from(usize::from(self.min_keycode) + i).ok())
    }
}

/// A configured key binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    /// Key name as written in the configuration
    pub key: String,
    /// Required modifiers
    pub modifiers: ModMask,
}

impl KeyBinding {
    pub fn new(key: impl Into<String>, modifiers: ModMask) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }
}

/// A binding after resolution against the server keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinding {
    pub binding: KeyBinding,
    pub keysym: Keysym,
    pub keycode: Keycode,
}

/// Resolve a binding to a keycode without grabbing anything.
pub fn resolve(mapping: &KeyboardMapping, binding: &KeyBinding) -> Result<ResolvedBinding> {
    let keysym =
        keysym::from_name(&binding.key).ok_or_else(|| WmError::UnknownKey(binding.key.clone()))?;
    let keycode = mapping.keycode_for(keysym).ok_or_else(|| WmError::NoKeycode {
        name: binding.key.clone(),
        keysym,
    })?;

    Ok(ResolvedBinding {
        binding: binding.clone(),
        keysym,
        keycode,
    })
}

/// Installed grabs, frozen once the event loop starts
#[derive(Debug, Default)]
pub struct GrabTable {
    keys: HashMap<(u16, Keycode), ResolvedBinding>,
    buttons: Vec<u8>,
}

impl GrabTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `binding` and grab it on root.
    ///
    /// Nothing is grabbed if the name or keycode cannot be resolved.
    pub fn grab_key<D: DisplayServer>(
        &mut self,
        display: &D,
        mapping: &KeyboardMapping,
        binding: &KeyBinding,
    ) -> Result<&ResolvedBinding> {
        let resolved = resolve(mapping, binding)?;
        let mods = u16::from(binding.modifiers) & MODIFIER_BITS;

        display.grab_key(resolved.keycode, binding.modifiers)?;
        display.sync()?;

        info!(
            "Grabbed key {:?} (keysym 0x{:x}, keycode {}, mods 0x{:x})",
            binding.key, resolved.keysym, resolved.keycode, mods
        );

        let key = (mods, resolved.keycode);
        self.keys.insert(key, resolved);
        Ok(&self.keys[&key])
    }

    /// Synchronously grab a pointer button on root.
    pub fn grab_pointer_button<D: DisplayServer>(&mut self, display: &D, button: u8) -> Result<()> {
        display.grab_button(button)?;
        display.sync()?;
        info!("Grabbed pointer button {}", button);

        if !self.buttons.contains(&button) {
            self.buttons.push(button);
        }
        Ok(())
    }

    /// Binding that a key press with `state` and `keycode` triggered, if any.
    ///
    /// Pointer button bits in `state` are ignored.
    pub fn binding_for(&self, state: KeyButMask, keycode: Keycode) -> Option<&ResolvedBinding> {
        let mods = u16::from(state) & MODIFIER_BITS;
        let hit = self.keys.get(&(mods, keycode));
        debug!(
            "Key lookup mods=0x{:x} keycode={} -> {:?}",
            mods,
            keycode,
            hit.map(|b| &b.binding.key)
        );
        hit
    }

    pub fn is_button_grabbed(&self, button: u8) -> bool {
        self.buttons.contains(&button)
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

/// Release a grabbed pointer so the press continues to its client.
///
/// Must run for every grabbed press, or pointer input stays frozen.
pub fn allow_replay<D: DisplayServer>(display: &D) -> Result<()> {
    display.allow_replay()?;
    debug!("Replayed pointer event");
    Ok(())
}
