//! Window Registry
//!
//! Append-only record of every window observed through `CreateNotify`.
//! Entries keep their arrival order and are never removed: destroy
//! notifications are not tracked, so the registry only grows until it is
//! full. Each entry stores its own order, so removal can be added later
//! without renumbering the survivors.

use tracing::debug;
use x11rb::protocol::xproto::Window;

use crate::error::{Result, WmError};

/// Slot count used when no configuration overrides it.
pub const DEFAULT_CAPACITY: usize = 64;

/// A recorded window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    pub window: Window,
    /// Position in creation order, starting at 0
    pub order: usize,
}

/// Bounded, append-only window registry
#[derive(Debug)]
pub struct WindowRegistry {
    entries: Vec<WindowEntry>,
    capacity: usize,
}

impl WindowRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `window` at the next free slot.
    ///
    /// Returns the stored entry. A full registry is left untouched and the
    /// window is rejected with [`WmError::RegistryFull`].
    pub fn record(&mut self, window: Window) -> Result<WindowEntry> {
        let order = self.entries.len();
        if self.is_full() {
            return Err(WmError::RegistryFull {
                capacity: self.capacity,
                window,
            });
        }

        let entry = WindowEntry { window, order };
        self.entries.push(entry);
        debug!("Registry: slot {} <- window 0x{:x}", order, window);
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn contains(&self, window: Window) -> bool {
        self.entries.iter().any(|e| e.window == window)
    }

    /// Entries in arrival order
    #[cfg(test)]
    pub fn entries(&self) -> &[WindowEntry] {
        &self.entries
    }

    /// Window ids in arrival order
    #[cfg(test)]
    pub fn windows(&self) -> impl Iterator<Item = Window> + '_ {
        self.entries().iter().map(|e| e.window)
    }
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
