//! # Departure Board Rendering
//!
//! Composes [`DisplayRow`]s into a frame and hands it to the panel.
//!
//! ## Row Layout
//!
//! Each row is one 8 px text line. Rows start at the top edge with no gap;
//! 64 px panels get a one-pixel top margin and one blank line between rows,
//! which fits seven rows instead of eight cramped ones.
//!
//! ```text
//!  x=0        dest_offset                               width
//!  |   [ U5]   |Hauptbahnhof ...........|          [ 2']|
//!      label   destination (clipped)               countdown
//! ```
//!
//! - **Line label**: bold, kerned, right-aligned to end 3 px left of
//!   `dest_offset`, drawn in the row color
//! - **Destination**: regular, kerned, starts at `dest_offset` and is clipped
//!   so the widest countdown (`30'`) still fits
//! - **Countdown**: regular, fixed spacing, right-aligned to the panel edge
//!
//! Destination and countdown always use the brand color. All colors go
//! through the frame's [`Pen`].

use crate::countdown::{DisplayRow, BRAND};
use crate::dimming::Pen;
use crate::frame::{FrameBuffer, Panel};
use crate::layout::{draw_text, measure, TextRun};
use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use std::convert::Infallible;
use std::io;
use thiserror::Error;

/// Text line height in pixels.
pub const ROW_HEIGHT: i32 = 8;

/// Shown until the first departures arrive.
pub const WAITING_TEXT: &str = "waiting for data...";

pub const WAITING_COLOR: Rgb888 = Rgb888::new(120, 0, 0);

/// Widest countdown the destination column leaves room for.
const WIDEST_ETA: &str = "30'";

/// Gap between the end of the line label and the destination column.
const LABEL_GAP: i32 = 3;

/// A frame could not be drawn or shown.
#[derive(Error, Debug)]
pub enum RenderFault {
    /// The panel driver rejected the frame
    #[error("panel error: {0}")]
    Panel(#[from] io::Error),
}

impl From<Infallible> for RenderFault {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Pixel geometry of the sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowGeometry {
    pub width: i32,
    pub height: i32,
    /// First column of the destination field.
    pub dest_offset: i32,
}

impl RowGeometry {
    pub fn new(width: i32, height: i32, dest_offset: i32) -> Self {
        Self {
            width,
            height,
            dest_offset,
        }
    }

    fn first_row(&self) -> i32 {
        if self.height == 64 {
            1
        } else {
            0
        }
    }

    fn pitch(&self) -> i32 {
        if self.height == 64 {
            ROW_HEIGHT + 1
        } else {
            ROW_HEIGHT
        }
    }

    /// Top edge of every row that fits on the panel.
    pub fn row_origins(&self) -> impl Iterator<Item = i32> {
        let last = self.height - ROW_HEIGHT;
        let pitch = self.pitch();
        std::iter::successors(Some(self.first_row()), move |y| Some(y + pitch))
            .take_while(move |y| *y <= last)
    }

    /// Number of departure rows the panel holds.
    pub fn row_capacity(&self) -> usize {
        self.row_origins().count()
    }

    /// Right clip of the destination field.
    fn destination_clip(&self) -> i32 {
        let eta_width = measure(WIDEST_ETA, &TextRun::new(self.width));
        self.dest_offset + (self.width - self.dest_offset - eta_width - 1)
    }
}

/// Draw `rows` top to bottom, replacing whatever `target` showed before.
///
/// Rows beyond the panel's capacity are ignored.
pub fn draw_departures<D>(
    target: &mut D,
    rows: &[DisplayRow],
    geometry: &RowGeometry,
    pen: Pen,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    target.clear(Rgb888::BLACK)?;

    let label_run = TextRun::new(geometry.width).bold().kerned();
    let destination_run = TextRun::new(geometry.destination_clip()).kerned();
    let eta_run = TextRun::new(geometry.width);

    for (row, y) in rows.iter().zip(geometry.row_origins()) {
        let label_x = geometry.dest_offset - measure(&row.line, &label_run) - LABEL_GAP;
        draw_text(
            target,
            &row.line,
            Point::new(label_x, y),
            pen.apply(row.color),
            &label_run,
        )?;

        if let Some(direction) = &row.direction_text {
            draw_text(
                target,
                direction,
                Point::new(geometry.dest_offset, y),
                pen.apply(BRAND),
                &destination_run,
            )?;
        }

        if let Some(eta) = row.eta_label() {
            let eta_x = geometry.width - measure(&eta, &eta_run) + 1;
            draw_text(target, &eta, Point::new(eta_x, y), pen.apply(BRAND), &eta_run)?;
        }
    }

    Ok(())
}

/// Draw the placeholder shown before the first snapshot.
pub fn draw_waiting<D>(target: &mut D, geometry: &RowGeometry, pen: Pen) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    target.clear(Rgb888::BLACK)?;
    draw_text(
        target,
        WAITING_TEXT,
        Point::new(0, geometry.first_row()),
        pen.apply(WAITING_COLOR),
        &TextRun::new(geometry.width).kerned(),
    )?;
    Ok(())
}

/// Owns the frame buffer and pushes finished frames to a [`Panel`].
pub struct SignRenderer<P: Panel> {
    geometry: RowGeometry,
    frame: FrameBuffer,
    panel: P,
}

impl<P: Panel> SignRenderer<P> {
    pub fn new(geometry: RowGeometry, panel: P) -> Self {
        let frame = FrameBuffer::new(geometry.width.max(0) as u32, geometry.height.max(0) as u32);
        Self {
            geometry,
            frame,
            panel,
        }
    }

    /// The last frame drawn.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Draw and show one frame of departures.
    pub fn show_departures(&mut self, rows: &[DisplayRow], pen: Pen) -> Result<(), RenderFault> {
        draw_departures(&mut self.frame, rows, &self.geometry, pen)?;
        self.panel.present(&self.frame)?;
        Ok(())
    }

    /// Draw and show the waiting screen.
    pub fn show_waiting(&mut self, pen: Pen) -> Result<(), RenderFault> {
        draw_waiting(&mut self.frame, &self.geometry, pen)?;
        self.panel.present(&self.frame)?;
        Ok(())
    }
}
