//! Software framebuffer
//!
//! CPU-side 0x00RRGGBB pixel buffer with source-over blending,
//! sized to the window and copied to the presentation surface.

use anyhow::Result;

use super::Canvas;
use crate::utils::{blend_over, Rgba};

/// Opaque XRGB pixel buffer
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    color: Rgba,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize)],
            color: Rgba::rgb(0, 0, 0),
        }
    }

    /// Resize, discarding contents
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; (width as usize) * (height as usize)];
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixels
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at (x, y), None outside the buffer
    #[cfg(test)]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl Canvas for FrameBuffer {
    fn set_draw_color(&mut self, color: Rgba) {
        self.color = color;
    }

    fn draw_point(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = blend_over(self.pixels[i], self.color);
        }
    }

    fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color.to_xrgb());
    }

    fn present(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_and_point() {
        let mut fb = FrameBuffer::new(4, 3);
        fb.clear(Rgba::rgb(0, 0, 0));
        fb.set_draw_color(Rgba::rgb(0x55, 0x99, 0xFF));
        fb.draw_point(2, 1);
        assert_eq!(fb.pixel(2, 1), Some(0x5599FF));
        assert_eq!(fb.pixel(1, 1), Some(0));
    }

    #[test]
    fn test_out_of_bounds_points_are_ignored() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.set_draw_color(Rgba::rgb(255, 255, 255));
        fb.draw_point(-1, 0);
        fb.draw_point(0, 2);
        fb.draw_point(5, 5);
        assert!(fb.pixels().iter().all(|&p| p == 0));
        assert_eq!(fb.pixel(2, 0), None);
    }

    #[test]
    fn test_alpha_accumulates() {
        let mut fb = FrameBuffer::new(1, 1);
        fb.set_draw_color(Rgba::new(255, 255, 255, 128));
        fb.draw_point(0, 0);
        let once = fb.pixel(0, 0).unwrap() & 0xFF;
        fb.draw_point(0, 0);
        let twice = fb.pixel(0, 0).unwrap() & 0xFF;
        assert!(twice > once);
    }

    #[test]
    fn test_resize_discards() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.clear(Rgba::rgb(1, 2, 3));
        fb.resize(3, 1);
        assert_eq!((fb.width(), fb.height()), (3, 1));
        assert_eq!(fb.pixels(), &[0, 0, 0]);
    }
}
