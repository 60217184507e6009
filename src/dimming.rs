//! # Night Dimming
//!
//! Scales every pen color down during a configured time-of-day window.
//!
//! The window is given in minutes of the local day. A window whose start is
//! after its end spans midnight (`22:00`-`06:00`). The dim level runs from
//! 0 (panel fully black) to 10 (no dimming); channels are scaled by
//! `level / 10` with integer truncation.
//!
//! Whether it is night is re-evaluated once a minute by the scheduler and
//! captured in a [`Pen`] that the renderer applies to every draw call of a
//! frame.

use chrono::{DateTime, Timelike, Utc};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

/// Minutes in one day.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Level at which colors pass through unchanged.
pub const FULL_BRIGHTNESS: u8 = 10;

/// Time-of-day range in which the panel is dimmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NightWindow {
    /// First dimmed minute of the day (0..1440)
    pub start_minutes: u16,
    /// First undimmed minute after the window (0..1440)
    pub end_minutes: u16,
    /// 0 = black, 10 = unchanged
    pub dim_level: u8,
}

/// Whether `minute_of_day` falls inside `window`.
///
/// Same-day windows are half-open `[start, end)`. Windows with
/// `start > end` wrap past midnight. `start == end` is an empty window.
pub fn is_night(minute_of_day: u16, window: &NightWindow) -> bool {
    let (start, end) = (window.start_minutes, window.end_minutes);
    if start <= end {
        start <= minute_of_day && minute_of_day < end
    } else {
        minute_of_day >= start || minute_of_day < end
    }
}

/// Scale `color` to `level` tenths of its brightness.
pub fn dim(color: Rgb888, level: u8) -> Rgb888 {
    if level >= FULL_BRIGHTNESS {
        return color;
    }
    let scale = |channel: u8| (u16::from(channel) * u16::from(level) / 10) as u8;
    Rgb888::new(scale(color.r()), scale(color.g()), scale(color.b()))
}

/// Local minute of the day for `now`, shifted by a whole-hour UTC offset.
pub fn minute_of_day(now: DateTime<Utc>, utc_offset_hours: i32) -> u16 {
    let hours = now.hour() as i32 + utc_offset_hours.rem_euclid(24);
    let minutes = hours * 60 + now.minute() as i32;
    minutes.rem_euclid(i32::from(MINUTES_PER_DAY)) as u16
}

/// Parse `HH:MM` into minutes of the day.
pub fn parse_hhmm(value: &str) -> Option<u16> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

/// Color transform for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pen {
    pub night: bool,
    pub dim_level: u8,
}

impl Pen {
    /// A pen that never dims.
    pub const DAY: Pen = Pen {
        night: false,
        dim_level: FULL_BRIGHTNESS,
    };

    pub fn new(night: bool, dim_level: u8) -> Self {
        Self { night, dim_level }
    }

    /// `color` as it should be drawn this frame.
    pub fn apply(&self, color: Rgb888) -> Rgb888 {
        if self.night {
            dim(color, self.dim_level)
        } else {
            color
        }
    }
}
