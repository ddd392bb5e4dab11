//! Application context
//!
//! Owns every piece of mutable overlay state (chat log, tail cursor,
//! jitter amplitude, scroll position, window size) and the renderer.
//! All mutation happens through `&mut App` from the event-loop thread.

use anyhow::Result;
use log::{debug, info};

use crate::chat::{wrap_width_for, ChatLog, Viewport};
use crate::config::{Config, KeybindConfig, ParsedKeybinds};
use crate::constants::SCROLL_STEP;
use crate::font::GlyphAtlas;
use crate::render::{Canvas, JitterRenderer, JitterSource, JitterState, Palette};
use crate::tail::FileTailer;
use crate::utils::Rgba;

/// User-triggered actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ScrollUp,
    ScrollDown,
    BumpRate,
    RandomizePrimary,
    RandomizeSecondary,
    ResetPrimary,
    ResetSecondary,
}

/// Key name -> action table built from the keybind config
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<(ParsedKeybinds, Action)>,
}

impl Keymap {
    pub fn from_config(kb: &KeybindConfig) -> Self {
        let table = [
            (&kb.quit, Action::Quit),
            (&kb.scroll_up, Action::ScrollUp),
            (&kb.scroll_down, Action::ScrollDown),
            (&kb.bump_rate, Action::BumpRate),
            (&kb.randomize_primary, Action::RandomizePrimary),
            (&kb.randomize_secondary, Action::RandomizeSecondary),
            (&kb.reset_primary, Action::ResetPrimary),
            (&kb.reset_secondary, Action::ResetSecondary),
        ];
        Self {
            bindings: table
                .into_iter()
                .map(|(keys, action)| (ParsedKeybinds::parse(keys), action))
                .collect(),
        }
    }

    /// First action bound to this key + modifier combination
    pub fn action_for(&self, ctrl: bool, shift: bool, alt: bool, key: &str) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(kb, _)| kb.matches(ctrl, shift, alt, key))
            .map(|(_, action)| *action)
    }
}

/// Overlay state
pub struct App<J> {
    renderer: JitterRenderer<J>,
    log: ChatLog,
    tailer: FileTailer,
    jitter: JitterState,
    viewport: Viewport,
    /// Palette from config, restored by the reset keys
    configured: Palette,
    width: i32,
    height: i32,
}

impl<J: JitterSource> App<J> {
    /// Build the context and lay out the lines already in the log
    pub fn new(
        atlas: GlyphAtlas,
        source: J,
        tailer: FileTailer,
        initial_lines: Vec<String>,
        config: &Config,
        width: i32,
        height: i32,
    ) -> Self {
        let palette = config.appearance.palette();
        let mut log = ChatLog::new(wrap_width_for(width));
        for line in &initial_lines {
            log.append(line, |c| atlas.advance_of(c));
        }

        let mut viewport = Viewport::new(height);
        viewport.scroll_to_bottom(log.total_height());
        info!(
            "Loaded {} entries ({}px) from {}, tailing from byte {}",
            log.len(),
            log.total_height(),
            tailer.path().display(),
            tailer.cursor().byte_offset
        );

        Self {
            renderer: JitterRenderer::new(atlas, source, palette),
            log,
            tailer,
            jitter: config.jitter.state(),
            viewport,
            configured: palette,
            width,
            height,
        }
    }

    /// Poll the log file and follow new content.
    ///
    /// Returns true if any entry was appended.
    pub fn tick(&mut self) -> bool {
        let update = self.tailer.poll();
        if update.grew {
            self.jitter.reset();
        }

        let atlas = self.renderer.atlas();
        let mut added = false;
        for line in &update.lines {
            added |= self.log.append(line, |c| atlas.advance_of(c));
        }
        if added {
            debug!("Log grew: {} entries", self.log.len());
        }

        self.viewport.refresh(self.log.total_height(), added);
        added
    }

    /// Window resized: reflow rows and re-clamp the scroll offset
    pub fn resize(&mut self, width: i32, height: i32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        let atlas = self.renderer.atlas();
        self.log
            .set_wrap_width(wrap_width_for(width), |c| atlas.advance_of(c));
        self.viewport.resize(height, self.log.total_height());
    }

    /// Scroll to an absolute offset (clamped)
    pub fn set_scroll_offset(&mut self, offset: i32) {
        self.viewport
            .set_scroll_offset(offset, self.log.total_height());
    }

    fn scroll_by(&mut self, delta: i32) {
        self.set_scroll_offset(self.viewport.offset().saturating_add(delta));
        debug!(
            "Scroll offset {} (following: {})",
            self.viewport.offset(),
            self.viewport.is_following()
        );
    }

    /// Change the jitter amplitude by `delta`
    pub fn bump_rate(&mut self, delta: f32) {
        self.jitter.bump(delta);
    }

    /// Apply a user action. Returns false when the app should quit.
    pub fn apply(&mut self, action: Action) -> bool {
        let mut rng = rand::thread_rng();
        match action {
            Action::Quit => return false,
            Action::ScrollUp => self.scroll_by(-SCROLL_STEP),
            Action::ScrollDown => self.scroll_by(SCROLL_STEP),
            Action::BumpRate => self.bump_rate(self.jitter.rate_reset()),
            Action::RandomizePrimary => self.renderer.palette.primary = Rgba::random(&mut rng),
            Action::RandomizeSecondary => self.renderer.palette.secondary = Rgba::random(&mut rng),
            Action::ResetPrimary => self.renderer.palette.primary = self.configured.primary,
            Action::ResetSecondary => self.renderer.palette.secondary = self.configured.secondary,
        }
        true
    }

    /// Apply colors and jitter tuning from a reloaded config
    pub fn reload(&mut self, config: &Config) {
        let palette = config.appearance.palette();
        self.configured = palette;
        self.renderer.palette = palette;
        let j = &config.jitter;
        self.jitter.retune(j.rate_reset, j.floor, j.decay);
        info!("Config reloaded");
    }

    /// Draw one frame
    pub fn render<C: Canvas + ?Sized>(&mut self, canvas: &mut C) -> Result<()> {
        self.renderer.render_frame(
            &self.log,
            self.viewport.offset(),
            self.height,
            &mut self.jitter,
            canvas,
        )
    }

    #[cfg(test)]
    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    #[cfg(test)]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[cfg(test)]
    pub fn jitter(&self) -> &JitterState {
        &self.jitter
    }

    #[cfg(test)]
    pub fn palette(&self) -> Palette {
        self.renderer.palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{LINE_HEIGHT, MARGIN_Y};
    use crate::font::atlas::tests::atlas_with_a;
    use crate::render::FrameBuffer;
    use std::io::Write;
    use std::path::Path;

    struct NoJitter;

    impl JitterSource for NoJitter {
        fn sample(&mut self, span: i32) -> i32 {
            span / 2
        }
    }

    fn append(path: &Path, text: &str) {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    fn app_for(path: &Path, height: i32) -> App<NoJitter> {
        let (tailer, lines) = FileTailer::attach(path);
        App::new(
            atlas_with_a(),
            NoJitter,
            tailer,
            lines,
            &Config::default(),
            751,
            height,
        )
    }

    #[test]
    fn test_initial_load_scrolls_to_bottom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, &"A\n".repeat(10));

        // visible = 110 - 10 = 100, total = 200
        let app = app_for(&path, 110);
        assert_eq!(app.log().len(), 10);
        assert_eq!(app.viewport().offset(), 10 * LINE_HEIGHT - (110 - 2 * MARGIN_Y));
    }

    #[test]
    fn test_tick_appends_and_resets_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, "A\n");
        let mut app = app_for(&path, 822);

        // Let the jitter settle a bit
        let mut fb = FrameBuffer::new(751, 822);
        for _ in 0..50 {
            app.render(&mut fb).unwrap();
        }
        assert!(app.jitter().rate() < app.jitter().rate_reset());

        assert!(!app.tick());
        append(&path, "A: A\n");
        assert!(app.tick());
        assert_eq!(app.log().len(), 2);
        assert_eq!(app.jitter().rate(), app.jitter().rate_reset());
        assert!(!app.tick());
    }

    #[test]
    fn test_scroll_actions_clamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, &"A\n".repeat(20));
        let mut app = app_for(&path, 110);
        let bottom = app.viewport().offset();
        assert_eq!(bottom, 300);

        assert!(app.apply(Action::ScrollDown));
        assert_eq!(app.viewport().offset(), bottom);
        app.apply(Action::ScrollUp);
        assert_eq!(app.viewport().offset(), bottom - SCROLL_STEP);

        // Manual position survives a quiet tick
        app.tick();
        assert_eq!(app.viewport().offset(), bottom - SCROLL_STEP);

        app.set_scroll_offset(-500);
        assert_eq!(app.viewport().offset(), 0);
    }

    #[test]
    fn test_color_and_rate_actions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let mut app = app_for(&path, 822);
        let configured = app.palette();

        app.apply(Action::RandomizeSecondary);
        app.apply(Action::ResetSecondary);
        assert_eq!(app.palette().secondary, configured.secondary);

        let before = app.jitter().rate();
        app.apply(Action::BumpRate);
        assert_eq!(app.jitter().rate(), before + app.jitter().rate_reset());

        assert!(!app.apply(Action::Quit));
    }

    #[test]
    fn test_resize_reflows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        append(&path, "AAAA AAAA AAAA AAAA\n");
        let mut app = app_for(&path, 822);
        assert_eq!(app.log().total_height(), LINE_HEIGHT);

        // Wrap width 36 is narrower than any 40px word: one word per row
        app.resize(50, 822);
        assert_eq!(app.log().total_height(), 4 * LINE_HEIGHT);
    }

    #[test]
    fn test_keymap_defaults() {
        let keymap = Keymap::from_config(&KeybindConfig::default());
        assert_eq!(keymap.action_for(false, false, false, "escape"), Some(Action::Quit));
        assert_eq!(keymap.action_for(false, false, false, "up"), Some(Action::ScrollUp));
        assert_eq!(keymap.action_for(false, false, false, "e"), Some(Action::BumpRate));
        assert_eq!(keymap.action_for(false, false, false, "f1"), Some(Action::RandomizeSecondary));
        assert_eq!(keymap.action_for(false, false, false, "f4"), Some(Action::ResetPrimary));
        assert_eq!(keymap.action_for(false, true, false, "e"), Some(Action::BumpRate));
        assert_eq!(keymap.action_for(true, false, false, "e"), None);
        assert_eq!(keymap.action_for(false, false, false, "x"), None);
    }
}
