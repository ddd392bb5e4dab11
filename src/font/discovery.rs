//! Font file discovery
//!
//! Search order:
//! 1. Explicit path (command line, then config)
//! 2. GLITCHTAIL_FONT environment variable
//! 3. Bundled-location default (fonts/Hack-Regular.ttf)
//! 4. Known system monospace paths

use anyhow::{anyhow, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Default font path relative to the working directory
pub const DEFAULT_FONT_PATH: &str = "fonts/Hack-Regular.ttf";

const SYSTEM_CANDIDATES: &[&str] = &[
    // Linux
    "/usr/share/fonts/truetype/hack/Hack-Regular.ttf",
    "/usr/share/fonts/TTF/Hack-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
    // macOS (development/testing)
    "/System/Library/Fonts/Monaco.ttf",
    "/Library/Fonts/Courier New.ttf",
];

/// Resolve which font file to load.
///
/// An explicit path is returned untouched even if it does not exist,
/// so that opening it fails loudly instead of silently substituting.
pub fn resolve_font_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    if let Ok(path) = std::env::var("GLITCHTAIL_FONT") {
        info!("Font: {} (GLITCHTAIL_FONT)", path);
        return Ok(PathBuf::from(path));
    }

    if Path::new(DEFAULT_FONT_PATH).exists() {
        return Ok(PathBuf::from(DEFAULT_FONT_PATH));
    }

    debug!("{} not found, searching system fonts", DEFAULT_FONT_PATH);
    first_existing(SYSTEM_CANDIDATES).ok_or_else(|| {
        anyhow!(
            "No font found. Pass a font path or check the following paths:\n{}\n{}",
            DEFAULT_FONT_PATH,
            SYSTEM_CANDIDATES.join("\n")
        )
    })
}

fn first_existing(candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}
