//! # Kerned Bitmap Text Layout
//!
//! Measures and draws runs of [`font`](crate::font) glyphs into any
//! `embedded-graphics` draw target.
//!
//! Fields on a departure row (line label, destination, countdown) are packed
//! edge to edge at fixed pixel offsets, so clipping has to be exact:
//!
//! - **Right clip**: nothing is drawn at or beyond `clip_right`, and a glyph
//!   that would straddle the clip edge is dropped entirely.
//! - **Left clip**: with `skip_left = n` the run starts `n` columns before the
//!   requested origin; those columns are laid out but never drawn.
//!
//! ## Spacing
//!
//! Without kerning every glyph is followed by one blank column. With kerning
//! glyphs abut, and a single blank column is inserted only where the
//! previous glyph's trailing column would touch the new glyph's leading
//! column. Regular weight checks the trailing pixel in the same row and the
//! rows directly above and below; bold checks the same row only.
//!
//! [`measure`] runs the identical computation without drawing, so a measured
//! width always equals the advance returned by [`draw_text`].

use crate::font::{self, Glyph, FONT_HEIGHT};
use embedded_graphics::{pixelcolor::Rgb888, prelude::*};

/// Options for one run of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextRun {
    pub bold: bool,
    pub kerning: bool,
    /// First column that must stay untouched.
    pub clip_right: i32,
    /// Columns laid out but hidden before the origin.
    pub skip_left: i32,
}

impl TextRun {
    /// Regular weight, fixed spacing, clipped at `clip_right`.
    pub fn new(clip_right: i32) -> Self {
        Self {
            bold: false,
            kerning: false,
            clip_right,
            skip_left: 0,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn kerned(mut self) -> Self {
        self.kerning = true;
        self
    }

    pub fn skip(mut self, columns: i32) -> Self {
        self.skip_left = columns;
        self
    }
}

/// Horizontal advance of `text` laid out from column 0 with `run`.
pub fn measure(text: &str, run: &TextRun) -> i32 {
    lay_out(text, 0, run, |_, _| {})
}

/// Draw `text` with its top-left corner at `origin`.
///
/// Returns the horizontal advance consumed, measured from `origin.x`.
pub fn draw_text<D>(
    target: &mut D,
    text: &str,
    origin: Point,
    color: Rgb888,
    run: &TextRun,
) -> Result<i32, D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let mut pixels = Vec::new();
    let advance = lay_out(text, origin.x, run, |x, row| {
        pixels.push(Pixel(Point::new(x, origin.y + row), color));
    });
    target.draw_iter(pixels)?;
    Ok(advance)
}

/// Whether `glyph` needs one column of space after the previous glyph,
/// whose trailing column is recorded in `trailing` (offset by one row so the
/// neighbours of row 0 and the last row can be indexed directly).
fn collides(glyph: &Glyph, trailing: &[bool; FONT_HEIGHT + 2], bold: bool) -> bool {
    (0..FONT_HEIGHT).any(|row| {
        glyph.leading(row)
            && if bold {
                trailing[row + 1]
            } else {
                trailing[row] || trailing[row + 1] || trailing[row + 2]
            }
    })
}

fn lay_out<F>(text: &str, x: i32, run: &TextRun, mut plot: F) -> i32
where
    F: FnMut(i32, i32),
{
    let mut cursor = x - run.skip_left;
    let mut trailing = [false; FONT_HEIGHT + 2];

    for ch in text.chars() {
        if cursor >= run.clip_right {
            break;
        }
        let Some(glyph) = font::lookup(ch, run.bold) else {
            continue;
        };
        let width = i32::from(glyph.width);

        if run.kerning {
            if collides(glyph, &trailing, run.bold) {
                cursor += 1;
            }
            trailing = [false; FONT_HEIGHT + 2];
        }
        if cursor + width > run.clip_right {
            // no partial glyphs
            break;
        }
        if cursor + width <= x {
            // entirely left of the origin
            cursor += width;
            continue;
        }

        for row in 0..FONT_HEIGHT {
            if run.kerning {
                trailing[row + 1] = glyph.trailing(row);
            }
            for col in 0..glyph.width {
                let px = cursor + i32::from(col);
                if px >= run.clip_right {
                    break;
                }
                if px >= x && glyph.lit(col, row) {
                    plot(px, row as i32);
                }
            }
        }

        cursor += width;
        if !run.kerning {
            cursor += 1;
        }
    }

    cursor - x
}
