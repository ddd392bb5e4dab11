//! Jittered glyph renderer
//!
//! Draws every visible atlas pixel as a single point, displaced by a
//! random offset whose range follows the current jitter rate.
//! Each row starts in the primary color and switches, for good, to the
//! secondary color at the first ':' or space (or immediately on
//! continuation rows).

use anyhow::Result;
use log::trace;

use super::jitter::{JitterSource, JitterState};
use super::Canvas;
use crate::chat::{ChatEntry, ChatLog};
use crate::constants::{
    is_glyph_code, LINE_HEIGHT, MARGIN_X, MARGIN_Y, OFFSCREEN_SLACK, SPACE_ADVANCE,
};
use crate::font::{Glyph, GlyphAtlas};
use crate::utils::Rgba;

/// Default primary color (speaker / first word)
pub const DEFAULT_PRIMARY: Rgba = Rgba::rgb(0x55, 0x99, 0xFF);
/// Default secondary color (message body)
pub const DEFAULT_SECONDARY: Rgba = Rgba::rgb(0x77, 0x77, 0x77);
/// Default background
pub const DEFAULT_BACKGROUND: Rgba = Rgba::rgb(0x00, 0x00, 0x00);

/// Colors used for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: Rgba,
    pub secondary: Rgba,
    pub background: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY,
            secondary: DEFAULT_SECONDARY,
            background: DEFAULT_BACKGROUND,
        }
    }
}

/// Draws chat entries from the glyph atlas
pub struct JitterRenderer<J> {
    atlas: GlyphAtlas,
    source: J,
    pub palette: Palette,
}

impl<J: JitterSource> JitterRenderer<J> {
    pub fn new(atlas: GlyphAtlas, source: J, palette: Palette) -> Self {
        Self {
            atlas,
            source,
            palette,
        }
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    /// Draw one entry with its first row at `origin_y`.
    ///
    /// Returns the y coordinate just below the entry.
    pub fn draw<C: Canvas + ?Sized>(
        &mut self,
        entry: &ChatEntry,
        origin_x: i32,
        origin_y: i32,
        state: &mut JitterState,
        canvas: &mut C,
    ) -> i32 {
        let mut y = origin_y;

        for (row, line) in entry.lines().iter().enumerate() {
            let mut x = origin_x;
            let mut secondary = false;

            for ch in line.text().chars() {
                if !is_glyph_code(ch as u32) {
                    continue;
                }
                if ch == ':' || ch == ' ' || row > 0 {
                    secondary = true;
                }
                if ch == ' ' {
                    x += SPACE_ADVANCE;
                    continue;
                }

                let Some(glyph) = self.atlas.get(ch) else {
                    continue;
                };
                if glyph.is_blank() {
                    x += self.atlas.advance_of(ch);
                    continue;
                }

                let color = if secondary {
                    self.palette.secondary
                } else {
                    self.palette.primary
                };
                Self::draw_glyph(&mut self.source, glyph, x, y, color, state, canvas);
                x += glyph.draw_advance();
            }

            y += LINE_HEIGHT;
        }

        y
    }

    /// Plot every visible pixel of a glyph with independent x/y jitter
    fn draw_glyph<C: Canvas + ?Sized>(
        source: &mut J,
        glyph: &Glyph,
        x: i32,
        y: i32,
        color: Rgba,
        state: &mut JitterState,
        canvas: &mut C,
    ) {
        for p in &glyph.pixels {
            let span = state.span();
            let jx = source.offset(span);
            let jy = source.offset(span);
            canvas.set_draw_color(color.with_alpha(p.color.a));
            canvas.draw_point(x + p.x + jx, y + p.y + jy);
            state.decay_step();
        }
    }

    /// Clear, draw every entry that intersects the window, present.
    pub fn render_frame<C: Canvas + ?Sized>(
        &mut self,
        log: &ChatLog,
        scroll_offset: i32,
        window_height: i32,
        state: &mut JitterState,
        canvas: &mut C,
    ) -> Result<()> {
        canvas.clear(self.palette.background);

        let mut y = MARGIN_Y - scroll_offset;
        let mut drawn = 0usize;
        for entry in log.entries() {
            if y > window_height + OFFSCREEN_SLACK {
                break;
            }
            if y + entry.rendered_height() < -OFFSCREEN_SLACK {
                y += entry.rendered_height();
                continue;
            }
            y = self.draw(entry, MARGIN_X, y, state, canvas);
            drawn += 1;
        }
        trace!("Frame: {} entries drawn, rate {:.2}", drawn, state.rate());

        canvas.present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::atlas::tests::{atlas_with_a, surface, StubRasterizer};

    /// Recorded draw_point call
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Point {
        x: i32,
        y: i32,
        color: Rgba,
    }

    #[derive(Default)]
    struct RecordingCanvas {
        color: Rgba,
        points: Vec<Point>,
        clears: usize,
        presents: usize,
    }

    impl Canvas for RecordingCanvas {
        fn set_draw_color(&mut self, color: Rgba) {
            self.color = color;
        }

        fn draw_point(&mut self, x: i32, y: i32) {
            self.points.push(Point {
                x,
                y,
                color: self.color,
            });
        }

        fn clear(&mut self, _color: Rgba) {
            self.clears += 1;
            self.points.clear();
        }

        fn present(&mut self) -> Result<()> {
            self.presents += 1;
            Ok(())
        }
    }

    /// Always returns the same sample
    struct FixedJitter(i32);

    impl JitterSource for FixedJitter {
        fn sample(&mut self, span: i32) -> i32 {
            self.0.min(span - 1)
        }
    }

    /// Cycles through 0..span so every offset gets exercised
    #[derive(Default)]
    struct SweepJitter(i32);

    impl JitterSource for SweepJitter {
        fn sample(&mut self, span: i32) -> i32 {
            self.0 = (self.0 + 1) % span.max(1);
            self.0
        }
    }

    fn still() -> JitterState {
        // Rate 1 never moves a point and never decays
        JitterState::new(1.0, 1.1, 0.0)
    }

    fn one_pixel_glyphs(chars: &str) -> GlyphAtlas {
        let mut stub = StubRasterizer::default();
        for ch in chars.chars() {
            stub.blended
                .insert(ch, surface(6, 1, &[(0, 0, Rgba::new(255, 255, 255, 200))]));
            stub.advances.insert(ch, 10);
        }
        GlyphAtlas::build(stub).unwrap()
    }

    fn entry(text: &str, atlas: &GlyphAtlas, width: i32) -> ChatEntry {
        let mut log = ChatLog::new(width);
        log.append(text, |c| atlas.advance_of(c));
        let first = log.entries().next().cloned();
        first.unwrap()
    }

    #[test]
    fn test_scenario_glyph_a_points() {
        let atlas = atlas_with_a();
        let e = entry("A A", &atlas, 100);
        let mut renderer = JitterRenderer::new(atlas, FixedJitter(0), Palette::default());
        let mut canvas = RecordingCanvas::default();
        let mut state = still();

        let next = renderer.draw(&e, 7, 5, &mut state, &mut canvas);
        assert_eq!(next, 5 + LINE_HEIGHT);
        assert_eq!(canvas.points.len(), 6);

        // First 'A' in primary, with per-pixel alpha
        assert_eq!(canvas.points[0], Point { x: 7, y: 5, color: DEFAULT_PRIMARY.with_alpha(255) });
        assert_eq!(canvas.points[1].x, 8);
        assert_eq!(canvas.points[2].y, 6);
        assert!(canvas.points[..3].iter().all(|p| p.color == DEFAULT_PRIMARY));

        // 'A' box is 2 wide, advance 10 -> step 2 + 4 = 6; then space 7
        let second_x = 7 + 6 + SPACE_ADVANCE;
        assert_eq!(canvas.points[3].x, second_x);
        assert!(canvas.points[3..].iter().all(|p| p.color == DEFAULT_SECONDARY));
    }

    #[test]
    fn test_colon_switches_color_for_rest_of_row() {
        let atlas = one_pixel_glyphs("abcd:");
        let e = entry("ab:cd", &atlas, 500);
        let mut renderer = JitterRenderer::new(atlas, FixedJitter(0), Palette::default());
        let mut canvas = RecordingCanvas::default();
        renderer.draw(&e, 0, 0, &mut still(), &mut canvas);

        let colors: Vec<Rgba> = canvas.points.iter().map(|p| p.color.with_alpha(255)).collect();
        assert_eq!(
            colors,
            vec![
                DEFAULT_PRIMARY,
                DEFAULT_PRIMARY,
                DEFAULT_SECONDARY,
                DEFAULT_SECONDARY,
                DEFAULT_SECONDARY,
            ]
        );
        assert!(canvas.points.iter().all(|p| p.color.a == 200));
    }

    #[test]
    fn test_continuation_rows_start_secondary() {
        let atlas = one_pixel_glyphs("ab");
        // Each word is 2 * 10 = 20px; budget 25 forces one word per row
        let e = entry("ab ab", &atlas, 25);
        assert_eq!(e.lines().len(), 2);

        let mut renderer = JitterRenderer::new(atlas, FixedJitter(0), Palette::default());
        let mut canvas = RecordingCanvas::default();
        let next = renderer.draw(&e, 0, 100, &mut still(), &mut canvas);
        assert_eq!(next, 100 + 2 * LINE_HEIGHT);

        let first_row: Vec<&Point> = canvas.points.iter().filter(|p| p.y == 100).collect();
        let second_row: Vec<&Point> =
            canvas.points.iter().filter(|p| p.y == 100 + LINE_HEIGHT).collect();
        assert!(first_row.iter().all(|p| p.color.with_alpha(255) == DEFAULT_PRIMARY));
        assert!(second_row.iter().all(|p| p.color.with_alpha(255) == DEFAULT_SECONDARY));
        // Each row restarts at the origin
        assert_eq!(second_row[0].x, 0);
    }

    #[test]
    fn test_blank_glyphs_advance_without_drawing() {
        let atlas = atlas_with_a();
        // 'q' has no ink: fallback advance, nothing drawn
        let e = entry("qA", &atlas, 500);
        let mut renderer = JitterRenderer::new(atlas, FixedJitter(0), Palette::default());
        let mut canvas = RecordingCanvas::default();
        renderer.draw(&e, 0, 0, &mut still(), &mut canvas);
        assert_eq!(canvas.points.len(), 3);
        assert_eq!(canvas.points[0].x, crate::constants::FALLBACK_ADVANCE);
    }

    #[test]
    fn test_jitter_offsets_stay_within_half_rate() {
        let atlas = atlas_with_a();
        let e = entry("AAAA AAAA AAAA", &atlas, 700);
        let mut renderer = JitterRenderer::new(atlas, SweepJitter::default(), Palette::default());
        let mut canvas = RecordingCanvas::default();
        let mut state = JitterState::new(20.0, 1.1, 0.0);
        renderer.draw(&e, 0, 0, &mut state, &mut canvas);

        let mut reference = RecordingCanvas::default();
        let mut flat = JitterRenderer::new(atlas_with_a(), FixedJitter(10), Palette::default());
        flat.draw(&e, 0, 0, &mut JitterState::new(20.0, 1.1, 0.0), &mut reference);

        assert_eq!(canvas.points.len(), reference.points.len());
        for (p, r) in canvas.points.iter().zip(&reference.points) {
            let (dx, dy) = (p.x - r.x, p.y - r.y);
            assert!((-10..10).contains(&dx), "dx {}", dx);
            assert!((-10..10).contains(&dy), "dy {}", dy);
        }
        assert!(canvas.points.iter().any(|p| p.x != reference.points[0].x));
    }

    #[test]
    fn test_rate_decays_once_per_point() {
        let atlas = atlas_with_a();
        let e = entry("A A", &atlas, 100);
        let mut renderer = JitterRenderer::new(atlas, FixedJitter(0), Palette::default());
        let mut canvas = RecordingCanvas::default();
        let mut state = JitterState::new(20.0, 1.1, 0.5);
        renderer.draw(&e, 0, 0, &mut state, &mut canvas);
        // 6 points drawn
        assert!((state.rate() - 17.0).abs() < 1e-4);
    }

    #[test]
    fn test_render_frame_skips_offscreen_entries() {
        let atlas = atlas_with_a();
        let mut log = ChatLog::new(700);
        for _ in 0..20 {
            log.append("A", |c| atlas.advance_of(c));
        }
        let mut renderer = JitterRenderer::new(atlas, FixedJitter(0), Palette::default());
        let mut canvas = RecordingCanvas::default();

        // Window only 40px tall: rows start at 5, 25, 45...; anything
        // starting below 40 + 100 is skipped
        renderer
            .render_frame(&log, 0, 40, &mut still(), &mut canvas)
            .unwrap();
        assert_eq!(canvas.clears, 1);
        assert_eq!(canvas.presents, 1);
        let rows = canvas.points.len() / 3;
        assert_eq!(rows, 7);
        assert!(canvas.points.iter().all(|p| p.y <= 40 + OFFSCREEN_SLACK + 1));

        // Scrolled down: entries far above are skipped, first drawn row is near the top
        let mut canvas = RecordingCanvas::default();
        renderer
            .render_frame(&log, 300, 40, &mut still(), &mut canvas)
            .unwrap();
        let min_y = canvas.points.iter().map(|p| p.y).min().unwrap();
        assert!(min_y >= -OFFSCREEN_SLACK - LINE_HEIGHT);
    }
}
