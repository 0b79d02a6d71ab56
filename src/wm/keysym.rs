//! Keysym names
//!
//! First stage of key binding resolution: a symbolic key name is turned into
//! an X keysym. Names are looked up in libxkbcommon's copy of the keysymdef
//! table, so every spelling `XStringToKeysym` knows is accepted, together
//! with `0x`-prefixed raw keysyms and `UXXXX` Unicode code points.

use xkbcommon::xkb;

/// A keysym value (X11/keysymdef.h)
pub type Keysym = u32;

/// Resolve a key name to its keysym.
///
/// Lookup is case-sensitive. Returns `None` for names X would map to
/// `NoSymbol`.
pub fn from_name(name: &str) -> Option<Keysym> {
    // Keysym names are plain identifiers, so no signs or spaces in hex forms
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }

    let sym = xkb::keysym_from_name(name, xkb::KEYSYM_NO_FLAGS).raw();
    (sym != 0).then_some(sym)
}
