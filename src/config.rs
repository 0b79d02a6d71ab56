//! Configuration for tern
//!
//! The baseline configuration is a TOML document compiled into the binary
//! (`default_config.toml`). It is parsed and validated once at startup;
//! nothing is read from disk.

use serde::{Deserialize, Serialize};
use tracing::debug;
use x11rb::protocol::xproto::ModMask;

use crate::error::{Result, WmError};
use crate::wm::keyboard::KeyBinding;
use crate::wm::registry::DEFAULT_CAPACITY;

const BUILTIN: &str = include_str!("default_config.toml");

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub cursor: CursorConfig,
    pub pointer: PointerConfig,
    pub keybindings: Vec<KeybindingConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            cursor: CursorConfig::default(),
            pointer: PointerConfig::default(),
            keybindings: vec![KeybindingConfig {
                key: "a".to_string(),
                modifiers: vec!["Shift".to_string()],
            }],
        }
    }
}

impl Config {
    /// The configuration shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        debug!("Config: {:?}", config);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.registry.capacity == 0 {
            return Err(WmError::Config("registry.capacity must be at least 1".into()));
        }

        if let Some(&b) = self.pointer.grab_buttons.iter().find(|b| !(1..=5).contains(*b)) {
            return Err(WmError::Config(format!(
                "pointer button {} is out of range 1-5",
                b
            )));
        }

        for binding in &self.keybindings {
            binding.modifier_mask()?;
        }
        Ok(())
    }

    /// Key bindings with their modifier names parsed
    pub fn key_bindings(&self) -> Result<Vec<KeyBinding>> {
        self.keybindings
            .iter()
            .map(|b| -> Result<KeyBinding> {
                Ok(KeyBinding::new(b.key.clone(), b.modifier_mask()?))
            })
            .collect()
    }
}

/// Window registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Root cursor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorConfig {
    /// cursorfont.h glyph name, e.g. "left_ptr"
    pub shape: String,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            shape: "left_ptr".to_string(),
        }
    }
}

/// Pointer grab configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerConfig {
    pub grab_buttons: Vec<u8>,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            grab_buttons: vec![1],
        }
    }
}

/// One key binding as written in the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeybindingConfig {
    /// Keysym name: "a", "Return", "F1", ...
    pub key: String,
    /// Modifier names: Shift, Lock, Control, Mod1 .. Mod5
    #[serde(default)]
    pub modifiers: Vec<String>,
}

impl KeybindingConfig {
    pub fn modifier_mask(&self) -> Result<ModMask> {
        self.modifiers
            .iter()
            .try_fold(ModMask::from(0u16), |mask, name| -> Result<ModMask> {
                Ok(mask | parse_modifier(name)?)
            })
    }
}

fn parse_modifier(name: &str) -> Result<ModMask> {
    Ok(match name {
        "Shift" => ModMask::SHIFT,
        "Lock" => ModMask::LOCK,
        "Control" | "Ctrl" => ModMask::CONTROL,
        "Mod1" | "Alt" => ModMask::M1,
        "Mod2" => ModMask::M2,
        "Mod3" => ModMask::M3,
        "Mod4" | "Super" => ModMask::M4,
        "Mod5" => ModMask::M5,
        other => return Err(WmError::Config(format!("unknown modifier {:?}", other))),
    })
}
