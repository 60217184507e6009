//! # Frame Buffer and Panel Interface
//!
//! The renderer draws every frame into an in-memory [`FrameBuffer`]; a
//! [`Panel`] then pushes the finished frame to the hardware in one call.
//! The LED matrix driver itself (row scanning, PWM, refresh timing) sits
//! behind [`Panel`] and is not part of this crate.
//!
//! Two panels ship with the library:
//! - [`TerminalPanel`]: ANSI truecolor preview for development (`--stdout`)
//! - [`HeadlessPanel`]: counts frames, for running without a matrix attached

use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use log::debug;
use std::convert::Infallible;
use std::io::{self, Write};

/// RGB frame buffer covering the whole matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl FrameBuffer {
    /// Create a black frame of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::BLACK; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color at `point`, or `None` outside the frame.
    pub fn pixel(&self, point: Point) -> Option<Rgb888> {
        self.index(point).map(|index| self.pixels[index])
    }

    /// All pixels that are not black, row by row.
    pub fn lit_pixels(&self) -> impl Iterator<Item = (Point, Rgb888)> + '_ {
        let width = self.width as usize;
        self.pixels
            .iter()
            .enumerate()
            .filter(|(_, color)| **color != Rgb888::BLACK)
            .map(move |(index, color)| {
                let point = Point::new((index % width) as i32, (index / width) as i32);
                (point, *color)
            })
    }

    fn index(&self, point: Point) -> Option<usize> {
        let (x, y) = (u32::try_from(point.x).ok()?, u32::try_from(point.y).ok()?);
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        // Pixels outside the matrix are dropped silently.
        for Pixel(point, color) in pixels {
            if let Some(index) = self.index(point) {
                self.pixels[index] = color;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}

/// Receiver of finished frames.
pub trait Panel {
    /// Show `frame`. Called once per rendered frame.
    fn present(&mut self, frame: &FrameBuffer) -> io::Result<()>;
}

/// Renders frames to a terminal using upper-half block characters, two
/// matrix rows per text line.
pub struct TerminalPanel<W: Write> {
    out: W,
}

impl TerminalPanel<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalPanel<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Panel for TerminalPanel<W> {
    fn present(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        let mut text = String::from("\x1b[H");
        for y in (0..frame.height() as i32).step_by(2) {
            for x in 0..frame.width() as i32 {
                let top = frame.pixel(Point::new(x, y)).unwrap_or(Rgb888::BLACK);
                let bottom = frame.pixel(Point::new(x, y + 1)).unwrap_or(Rgb888::BLACK);
                text.push_str(&format!(
                    "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m\u{2580}",
                    top.r(),
                    top.g(),
                    top.b(),
                    bottom.r(),
                    bottom.g(),
                    bottom.b()
                ));
            }
            text.push_str("\x1b[0m\n");
        }
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }
}

/// Accepts frames without showing them.
#[derive(Debug, Default)]
pub struct HeadlessPanel {
    frames: u64,
}

impl HeadlessPanel {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Panel for HeadlessPanel {
    fn present(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        self.frames += 1;
        debug!(
            "frame {}: {} lit pixels",
            self.frames,
            frame.lit_pixels().count()
        );
        Ok(())
    }
}
