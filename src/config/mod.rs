//! Configuration file management
//!
//! Loads TOML configuration files and provides application settings.
//! Default config path: ~/.config/glitchtail/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[cfg(target_os = "linux")]
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
#[cfg(target_os = "linux")]
use std::path::Path;
#[cfg(target_os = "linux")]
use std::sync::mpsc;

use crate::constants::{
    DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_X, DEFAULT_WINDOW_Y, RATE_DECAY,
    RATE_FLOOR, RATE_RESET,
};
use crate::render::renderer::{DEFAULT_BACKGROUND, DEFAULT_PRIMARY, DEFAULT_SECONDARY};
use crate::render::{JitterState, Palette};
use crate::utils::parse_hex_rgba;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font settings
    pub font: FontConfig,
    /// Tailed log file
    pub log: LogConfig,
    /// Window geometry
    pub window: WindowConfig,
    /// Colors
    pub appearance: AppearanceConfig,
    /// Jitter tuning
    pub jitter: JitterConfig,
    /// Keybind settings
    pub keybinds: KeybindConfig,
}

/// Font settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font file path (searches known locations if empty)
    pub path: String,
    /// Font size in pixels
    pub size: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            size: 16.0,
        }
    }
}

/// Log file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// File to tail
    pub path: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: "log.txt".to_string(),
        }
    }
}

/// Window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    /// Initial position (ignored by compositors that place windows themselves)
    pub x: i32,
    pub y: i32,
    /// Hide title bar and borders
    pub borderless: bool,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            x: DEFAULT_WINDOW_X,
            y: DEFAULT_WINDOW_Y,
            borderless: true,
            title: "tc".to_string(),
        }
    }
}

/// Appearance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Color before the first ':' or space of a row (RRGGBB)
    pub primary: String,
    /// Color for the rest of the row and continuation rows (RRGGBB)
    pub secondary: String,
    /// Background color (RRGGBB)
    pub background: String,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY.to_hex(),
            secondary: DEFAULT_SECONDARY.to_hex(),
            background: DEFAULT_BACKGROUND.to_hex(),
        }
    }
}

impl AppearanceConfig {
    /// Parsed palette, falling back to defaults for invalid entries
    pub fn palette(&self) -> Palette {
        Palette {
            primary: parse_hex_rgba(&self.primary, DEFAULT_PRIMARY),
            secondary: parse_hex_rgba(&self.secondary, DEFAULT_SECONDARY),
            background: parse_hex_rgba(&self.background, DEFAULT_BACKGROUND),
        }
    }
}

/// Jitter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    /// Amplitude restored when new lines arrive (pixels)
    pub rate_reset: f32,
    /// Amplitude never decays below this
    pub floor: f32,
    /// Amplitude decrement per drawn point
    pub decay: f32,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            rate_reset: RATE_RESET,
            floor: RATE_FLOOR,
            decay: RATE_DECAY,
        }
    }
}

impl JitterConfig {
    /// Fresh jitter state at full amplitude
    pub fn state(&self) -> JitterState {
        JitterState::new(self.rate_reset, self.floor, self.decay)
    }
}

/// Keybind settings
/// Each keybind can be a single key ("ctrl+q") or multiple keys (["escape", "ctrl+q"])
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindConfig {
    /// Quit (default: "escape")
    #[serde(deserialize_with = "deserialize_keybind")]
    pub quit: Vec<String>,
    /// Scroll up (default: "up")
    #[serde(deserialize_with = "deserialize_keybind")]
    pub scroll_up: Vec<String>,
    /// Scroll down (default: "down")
    #[serde(deserialize_with = "deserialize_keybind")]
    pub scroll_down: Vec<String>,
    /// Add rate_reset to the jitter amplitude (default: "e")
    #[serde(deserialize_with = "deserialize_keybind")]
    pub bump_rate: Vec<String>,
    /// Random primary color (default: "f2")
    #[serde(deserialize_with = "deserialize_keybind")]
    pub randomize_primary: Vec<String>,
    /// Random secondary color (default: "f1")
    #[serde(deserialize_with = "deserialize_keybind")]
    pub randomize_secondary: Vec<String>,
    /// Restore configured primary color (default: "f4")
    #[serde(deserialize_with = "deserialize_keybind")]
    pub reset_primary: Vec<String>,
    /// Restore configured secondary color (default: "f3")
    #[serde(deserialize_with = "deserialize_keybind")]
    pub reset_secondary: Vec<String>,
}

impl Default for KeybindConfig {
    fn default() -> Self {
        Self {
            quit: vec!["escape".to_string()],
            scroll_up: vec!["up".to_string()],
            scroll_down: vec!["down".to_string()],
            bump_rate: vec!["e".to_string()],
            randomize_primary: vec!["f2".to_string()],
            randomize_secondary: vec!["f1".to_string()],
            reset_primary: vec!["f4".to_string()],
            reset_secondary: vec!["f3".to_string()],
        }
    }
}

/// Keybind deserializer: accepts string or array
fn deserialize_keybind<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeybindVisitor;

    impl<'de> Visitor<'de> for KeybindVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeybindVisitor)
}

impl Config {
    /// System-wide config path
    const SYSTEM_CONFIG_PATH: &'static str = "/etc/glitchtail/config.toml";

    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. GLITCHTAIL_CONFIG environment variable
        if let Ok(path) = std::env::var("GLITCHTAIL_CONFIG") {
            let p = PathBuf::from(path);
            if p.exists() {
                return Some(p);
            }
        }

        // 2. User config: ~/.config/glitchtail/config.toml
        if let Some(path) = default_config_path() {
            if path.exists() {
                return Some(path);
            }
        }

        // 3. System config: /etc/glitchtail/config.toml
        let system_config = PathBuf::from(Self::SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with priority:
    /// 1. GLITCHTAIL_CONFIG environment variable
    /// 2. ~/.config/glitchtail/config.toml (user config)
    /// 3. /etc/glitchtail/config.toml (system config)
    /// 4. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Write the commented template to the user config path
    pub fn write_default_config(path: &std::path::Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        std::fs::write(path, CONFIG_TEMPLATE)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Commented default config written by --init-config
const CONFIG_TEMPLATE: &str = r#"# glitchtail configuration
#
# Positional command line arguments (FONT SIZE LOGFILE) override
# [font] path, [font] size and [log] path.

[font]
# Font file; empty searches GLITCHTAIL_FONT, fonts/Hack-Regular.ttf,
# then common system monospace fonts
path = ""
size = 16.0

[log]
# File to tail (relative to the working directory)
path = "log.txt"

[window]
width = 751
height = 822
x = 1794
y = 850
borderless = true
title = "tc"

[appearance]
# Row color until the first ':' or space
primary = "5599ff"
# Rest of the row, and every continuation row
secondary = "777777"
background = "000000"

[jitter]
# Amplitude in pixels restored whenever the log grows
rate_reset = 20.0
# Amplitude never decays below this
floor = 1.1
# Decrement per drawn point
decay = 0.0002

[keybinds]
# Single key ("e") or list (["escape", "ctrl+q"])
quit = "escape"
scroll_up = "up"
scroll_down = "down"
bump_rate = "e"
randomize_secondary = "f1"
randomize_primary = "f2"
reset_secondary = "f3"
reset_primary = "f4"
"#;

/// Parse multiple keybindings
#[derive(Debug, Clone, Default)]
pub struct ParsedKeybinds {
    pub bindings: Vec<ParsedKeybind>,
}

impl ParsedKeybinds {
    /// Parse from string array
    pub fn parse(keys: &[String]) -> Self {
        Self {
            bindings: keys.iter().map(|s| ParsedKeybind::parse(s)).collect(),
        }
    }

    /// Check if any keybind matches
    pub fn matches(&self, ctrl: bool, shift: bool, alt: bool, key: &str) -> bool {
        self.bindings
            .iter()
            .any(|kb| kb.matches(ctrl, shift, alt, key))
    }
}

/// Parse keybind string
/// Example: "ctrl+shift+c" -> (ctrl: true, shift: true, key: "c")
#[derive(Debug, Clone, Default)]
pub struct ParsedKeybind {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub key: String,
}

impl ParsedKeybind {
    pub fn parse(s: &str) -> Self {
        let lowercase = s.to_lowercase();
        let mut result = Self::default();

        for part in lowercase.split('+') {
            match part {
                "ctrl" | "control" => result.ctrl = true,
                "shift" => result.shift = true,
                "alt" => result.alt = true,
                other => result.key = normalize_key_name(other).to_string(),
            }
        }

        result
    }

    /// Check against a normalized key name and modifier state.
    ///
    /// Ctrl and Alt must match exactly; Shift is only checked when the
    /// binding names it, so "e" also fires for Shift+E.
    pub fn matches(&self, ctrl: bool, shift: bool, alt: bool, key: &str) -> bool {
        self.ctrl == ctrl && (!self.shift || shift) && self.alt == alt && self.key == key
    }
}

/// Fold key name aliases onto one spelling
fn normalize_key_name(name: &str) -> &str {
    match name {
        "esc" => "escape",
        "return" => "enter",
        "pgup" => "pageup",
        "pgdn" | "pgdown" => "pagedown",
        other => other,
    }
}

/// Config file change watcher (Linux only)
#[cfg(target_os = "linux")]
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<()>,
}

#[cfg(target_os = "linux")]
impl ConfigWatcher {
    /// Start watching config file
    pub fn new(config_path: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let file_name = config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // Editors often save by writing a temp file then renaming
                use notify::EventKind;
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                if ours && matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    let _ = tx.send(());
                }
            }
        })?;

        // Watch the parent directory to catch rename operations
        let watch_path = config_path.parent().unwrap_or(config_path);
        watcher.watch(watch_path, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Check if config file was modified (non-blocking, drains pending events)
    pub fn check_reload(&self) -> bool {
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("glitchtail").join("config.toml"))
}
