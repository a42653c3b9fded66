//! Cursor-based text output for the OLED
//!
//! Mirrors the text model of the Adafruit GFX library the panel is usually
//! driven with: a foreground color, an integer text scale, a cursor that
//! advances one character cell per glyph and wraps at the right edge, and
//! `print` / `println`.
//!
//! The terminal also keeps a transcript of the logical lines written since
//! the last clear, so tests and the simulator can check what is on screen
//! without decoding pixels.

use embedded_graphics::{
    Drawable,
    mono_font::{
        MonoFont, MonoTextStyle,
        ascii::{FONT_6X10, FONT_10X20},
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use log::debug;

/// Lines kept in the transcript; older lines are dropped first.
pub const TRANSCRIPT_LINES: usize = 8;
/// Characters kept per transcript line.
pub const LINE_CAPACITY: usize = 48;

pub type Line = heapless::String<LINE_CAPACITY>;

/// Integer text magnification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextScale {
    /// 6x10 cells, 21 columns by 6 rows on a 128x64 panel
    #[default]
    Normal,
    /// 10x20 cells
    Double,
}

impl TextScale {
    pub fn font(self) -> &'static MonoFont<'static> {
        match self {
            TextScale::Normal => &FONT_6X10,
            TextScale::Double => &FONT_10X20,
        }
    }

    /// Horizontal advance per character
    pub fn cell_width(self) -> i32 {
        let font = self.font();
        (font.character_size.width + font.character_spacing) as i32
    }

    pub fn line_height(self) -> i32 {
        self.font().character_size.height as i32
    }
}

pub struct Terminal {
    color: BinaryColor,
    scale: TextScale,
    cursor: Point,
    wrap: bool,
    lines: heapless::Vec<Line, TRANSCRIPT_LINES>,
    line_open: bool,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            color: BinaryColor::On,
            scale: TextScale::Normal,
            cursor: Point::zero(),
            wrap: true,
            lines: heapless::Vec::new(),
            line_open: false,
        }
    }

    pub fn set_text_color(&mut self, color: BinaryColor) {
        self.color = color;
    }

    pub fn set_text_scale(&mut self, scale: TextScale) {
        self.scale = scale;
    }

    pub fn set_cursor(&mut self, cursor: Point) {
        self.cursor = cursor;
    }

    pub fn set_wrap(&mut self, wrap: bool) {
        self.wrap = wrap;
    }

    pub fn text_color(&self) -> BinaryColor {
        self.color
    }

    pub fn text_scale(&self) -> TextScale {
        self.scale
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    /// Logical lines written since the last clear, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.as_str())
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Blank the target and forget the transcript. The cursor and style are
    /// left alone.
    pub fn clear<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        target.clear(BinaryColor::Off)?;
        self.lines.clear();
        self.line_open = false;
        Ok(())
    }

    /// Draw `text` at the cursor, advancing it.
    pub fn print<D>(&mut self, target: &mut D, text: &str) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let width = target.bounding_box().size.width as i32;
        let style = MonoTextStyle::new(self.scale.font(), self.color);
        let cell_width = self.scale.cell_width();

        for ch in text.chars() {
            match ch {
                '\n' => self.newline(),
                '\r' => {}
                _ => {
                    if self.wrap && self.cursor.x + cell_width > width {
                        self.advance_row();
                    }

                    let mut utf8 = [0u8; 4];
                    let glyph = ch.encode_utf8(&mut utf8);
                    Text::with_baseline(glyph, self.cursor, style, Baseline::Top).draw(target)?;

                    self.cursor.x += cell_width;
                    self.record(ch);
                }
            }
        }

        Ok(())
    }

    /// [`print`](Self::print) followed by a line break.
    pub fn println<D>(&mut self, target: &mut D, text: &str) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        self.print(target, text)?;
        self.newline();
        Ok(())
    }

    fn advance_row(&mut self) {
        self.cursor.x = 0;
        self.cursor.y += self.scale.line_height();
    }

    fn newline(&mut self) {
        self.advance_row();
        if !self.line_open {
            // An empty println still produces a (blank) line.
            self.push_line();
        }
        self.line_open = false;
    }

    fn record(&mut self, ch: char) {
        if !self.line_open {
            self.push_line();
            self.line_open = true;
        }
        if let Some(line) = self.lines.last_mut() {
            if line.push(ch).is_err() {
                debug!("transcript line full, dropping {:?}", ch);
            }
        }
    }

    fn push_line(&mut self) {
        if self.lines.is_full() {
            self.lines.remove(0);
        }
        // Cannot fail: a slot was freed above.
        let _ = self.lines.push(Line::new());
    }
}
