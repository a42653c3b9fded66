//! In-RAM framebuffer for the 128x64 monochrome OLED.
//!
//! Host-side panels (the simulator and tests) draw into this buffer and
//! mirror it to their output on flush, the same way the SSD1306 driver keeps
//! its own buffer and only talks to the panel when flushed.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::config::{OLED_HEIGHT_PX, OLED_WIDTH_PX};

const WIDTH: usize = OLED_WIDTH_PX as usize;
const HEIGHT: usize = OLED_HEIGHT_PX as usize;

/// One bit per pixel, row major (1024 bytes).
const BUFFER_BYTES: usize = WIDTH * HEIGHT / 8;

/// 1bpp framebuffer implementing `DrawTarget<Color = BinaryColor>`.
///
/// Out-of-bounds pixels are dropped, like the hardware driver does.
#[derive(Clone, PartialEq, Eq)]
pub struct MonoFrameBuffer {
    bits: [u8; BUFFER_BYTES],
    dirty: bool,
}

impl Default for MonoFrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoFrameBuffer {
    /// A blank (all pixels off) buffer.
    pub const fn new() -> Self {
        Self {
            bits: [0; BUFFER_BYTES],
            dirty: false,
        }
    }

    #[inline]
    fn index(x: usize, y: usize) -> (usize, u8) {
        let bit = y * WIDTH + x;
        (bit / 8, 1 << (bit % 8))
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let (byte, mask) = Self::index(x, y);
        let before = self.bits[byte];
        if color.is_on() {
            self.bits[byte] |= mask;
        } else {
            self.bits[byte] &= !mask;
        }
        if self.bits[byte] != before {
            self.dirty = true;
        }
    }

    /// Color of a single pixel, `None` outside the panel.
    pub fn pixel(&self, point: Point) -> Option<BinaryColor> {
        let (x, y) = (usize::try_from(point.x).ok()?, usize::try_from(point.y).ok()?);
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }
        let (byte, mask) = Self::index(x, y);
        Some(BinaryColor::from(self.bits[byte] & mask != 0))
    }

    /// Number of pixels that are on.
    pub fn lit_pixels(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Whether no pixel in the given row band is on.
    pub fn rows_blank(&self, rows: core::ops::Range<u32>) -> bool {
        rows.filter(|&y| (y as usize) < HEIGHT).all(|y| {
            let start = y as usize * WIDTH / 8;
            self.bits[start..start + WIDTH / 8].iter().all(|b| *b == 0)
        })
    }

    /// Whether the buffer changed since the last [`flush`](Self::flush).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Turn every pixel off.
    pub fn clear_buffer(&mut self) {
        if self.bits.iter().any(|b| *b != 0) {
            self.bits = [0; BUFFER_BYTES];
            self.dirty = true;
        }
    }

    /// Copy the whole buffer to another draw target, then reset the dirty
    /// state. If nothing changed, this is a no-op.
    pub fn flush<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        if !self.dirty {
            return Ok(());
        }

        debug!("Flushing {} lit pixels", self.lit_pixels());

        let area = Rectangle::new(Point::zero(), Size::new(OLED_WIDTH_PX, OLED_HEIGHT_PX));
        let bits = &self.bits;
        let colors = (0..HEIGHT).flat_map(move |y| {
            (0..WIDTH).map(move |x| {
                let (byte, mask) = Self::index(x, y);
                BinaryColor::from(bits[byte] & mask != 0)
            })
        });
        target.fill_contiguous(&area, colors)?;

        self.dirty = false;
        Ok(())
    }
}

impl core::fmt::Debug for MonoFrameBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MonoFrameBuffer")
            .field("lit_pixels", &self.lit_pixels())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl OriginDimensions for MonoFrameBuffer {
    fn size(&self) -> Size {
        Size::new(OLED_WIDTH_PX, OLED_HEIGHT_PX)
    }
}

impl DrawTarget for MonoFrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                let (x, y) = (point.x as usize, point.y as usize);
                if x < WIDTH && y < HEIGHT {
                    self.set_pixel(x, y, color);
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        if color.is_on() {
            self.bits = [0xFF; BUFFER_BYTES];
            self.dirty = true;
        } else {
            self.clear_buffer();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_new_buffer_is_blank() {
        let fb = MonoFrameBuffer::new();
        assert_eq!(fb.lit_pixels(), 0);
        assert!(!fb.is_dirty());
        assert!(fb.rows_blank(0..64));
    }

    #[test]
    fn test_draw_sets_pixels_and_dirty() {
        let mut fb = MonoFrameBuffer::new();
        Rectangle::new(Point::new(2, 3), Size::new(4, 2))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();

        assert_eq!(fb.lit_pixels(), 8);
        assert_eq!(fb.pixel(Point::new(2, 3)), Some(BinaryColor::On));
        assert_eq!(fb.pixel(Point::new(1, 3)), Some(BinaryColor::Off));
        assert!(fb.is_dirty());
        assert!(fb.rows_blank(0..3));
        assert!(!fb.rows_blank(3..5));
    }

    #[test]
    fn test_out_of_bounds_pixels_are_dropped() {
        let mut fb = MonoFrameBuffer::new();
        Pixel(Point::new(128, 0), BinaryColor::On).draw(&mut fb).unwrap();
        Pixel(Point::new(-1, 5), BinaryColor::On).draw(&mut fb).unwrap();
        Pixel(Point::new(0, 64), BinaryColor::On).draw(&mut fb).unwrap();

        assert_eq!(fb.lit_pixels(), 0);
        assert_eq!(fb.pixel(Point::new(128, 0)), None);
    }

    #[test]
    fn test_flush_mirrors_and_resets_dirty() {
        let mut fb = MonoFrameBuffer::new();
        Pixel(Point::new(127, 63), BinaryColor::On).draw(&mut fb).unwrap();

        let mut screen = MonoFrameBuffer::new();
        fb.flush(&mut screen).unwrap();

        assert!(!fb.is_dirty());
        assert_eq!(screen.pixel(Point::new(127, 63)), Some(BinaryColor::On));
        assert_eq!(screen.lit_pixels(), 1);
    }

    #[test]
    fn test_redrawing_same_color_stays_clean() {
        let mut fb = MonoFrameBuffer::new();
        Pixel(Point::new(0, 0), BinaryColor::Off).draw(&mut fb).unwrap();
        assert!(!fb.is_dirty());
    }
}
