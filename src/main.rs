//! glitchtail - jittery typewriter overlay for a growing log file
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Event Loop (winit)          │
//! ├──────────────────────────────────────────┤
//! │  Keyboard  →  Actions    FileTailer      │
//! │                  ↓           ↓           │
//! │          ChatLog (wrap) + Viewport       │
//! │                          ↓               │
//! │   JitterRenderer (GlyphAtlas points)     │
//! │                          ↓               │
//! │     FrameBuffer → softbuffer surface     │
//! └──────────────────────────────────────────┘
//! ```

mod app;
mod chat;
mod config;
mod constants;
mod font;
mod layout;
mod render;
mod tail;
mod utils;
mod window;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::app::App;
use crate::config::Config;
use crate::font::{resolve_font_path, FontdueRasterizer, GlyphAtlas};
use crate::render::RngJitter;
use crate::tail::FileTailer;
use crate::window::Overlay;

/// Print help message
fn print_help() {
    println!(
        r#"glitchtail {} - jittery typewriter overlay for a log file

USAGE:
    glitchtail [OPTIONS] [FONT] [SIZE] [LOGFILE]

ARGS:
    FONT        TTF/OTF font file (default: search GLITCHTAIL_FONT,
                fonts/Hack-Regular.ttf, system monospace fonts)
    SIZE        Font size in pixels (default: 16)
    LOGFILE     File to tail (default: log.txt)

OPTIONS:
    -h, --help          Print this help message
    -V, --version       Print version information
    --init-config       Generate config file
    -f, --force         Overwrite config file without confirmation

KEYS:
    Up / Down   Scroll by 50 px
    e           Shake harder
    F1 / F2     Random message / speaker color
    F3 / F4     Restore message / speaker color
    Escape      Quit

CONFIG FILE:
    ~/.config/glitchtail/config.toml
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Write the config template, asking before overwriting
fn init_config(force: bool) -> Result<()> {
    let path = config::default_config_path().context("No config directory on this system")?;

    if path.exists() && !force {
        println!("Config file already exists: {}", path.display());
        print!("Overwrite? [y/N]: ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("Aborted.");
            return Ok(());
        }
    }

    Config::write_default_config(&path)?;
    println!("Config file generated: {}", path.display());
    Ok(())
}

/// Apply positional FONT SIZE LOGFILE over the loaded config
fn apply_positional(cfg: &mut Config, positional: &[&String]) {
    if let Some(font) = positional.first() {
        cfg.font.path = font.to_string();
    }
    if let Some(size) = positional.get(1) {
        match size.parse::<f32>() {
            Ok(s) if s > 0.0 => cfg.font.size = s,
            _ => warn!("Invalid font size '{}', using {}", size, cfg.font.size),
        }
    }
    if let Some(log) = positional.get(2) {
        cfg.log.path = log.to_string();
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Check command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("glitchtail {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.iter().any(|a| a == "--init-config") {
        let force = args.iter().any(|a| a == "--force" || a == "-f");
        return init_config(force);
    }

    info!("glitchtail starting...");

    let mut cfg = Config::load();
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
    apply_positional(&mut cfg, &positional);

    // Font -> atlas; nothing to draw without it
    let font_path = resolve_font_path(Some(cfg.font.path.as_str()))?;
    info!("Font: {} ({}px)", font_path.display(), cfg.font.size);
    let rasterizer = FontdueRasterizer::open(&font_path, cfg.font.size)?;
    let atlas = GlyphAtlas::build(rasterizer)
        .with_context(|| format!("Failed to build glyph atlas from {}", font_path.display()))?;
    info!("Glyph atlas: {} glyphs", atlas.loaded_count());

    // Existing log content is loaded in bulk; polling picks up the rest
    let (tailer, initial_lines) = FileTailer::attach(&cfg.log.path);

    let app = App::new(
        atlas,
        RngJitter::thread(),
        tailer,
        initial_lines,
        &cfg,
        cfg.window.width as i32,
        cfg.window.height as i32,
    );

    Overlay::new(app, &cfg).run()?;

    info!("glitchtail exiting");
    Ok(())
}
