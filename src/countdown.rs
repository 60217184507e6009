//! # Arrival Countdown
//!
//! Turns a snapshot of departures into the rows shown on the sign.
//!
//! For every record, in feed order:
//!
//! 1. `eta = scheduled_at - now + BOARDING_BUFFER_SECS`
//! 2. drop excluded lines
//! 3. drop departures with `eta` below the walk delay (unreachable)
//! 4. `eta_minutes = eta / 60`, floored
//! 5. below one minute the countdown disappears and the destination blinks,
//!    visible on every other frame
//! 6. pick the line label color
//!
//! Computation stops as soon as the panel's rows are filled. The function is
//! pure: the blink phase is supplied by the caller and toggled once per
//! frame, so two calls with the same inputs give the same rows.

use crate::{DepartureRecord, Product};
use embedded_graphics::pixelcolor::Rgb888;

/// Seconds added to every countdown to cover the time between fetch and
/// display.
pub const BOARDING_BUFFER_SECS: i64 = 45;

/// Brand color used for destinations, countdowns and uncolored labels.
pub const BRAND: Rgb888 = Rgb888::new(255, 170, 0);

/// How line labels are colored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    /// Everything in [`BRAND`].
    Flat,
    /// Per transport mode; with `line_colors` subway lines get their own
    /// line color.
    ByProduct { line_colors: bool },
}

/// Which half of the blink cycle the current frame is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlinkPhase {
    Shown,
    Hidden,
}

impl BlinkPhase {
    pub fn toggled(self) -> Self {
        match self {
            BlinkPhase::Shown => BlinkPhase::Hidden,
            BlinkPhase::Hidden => BlinkPhase::Shown,
        }
    }
}

/// Inputs that stay fixed between frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountdownSettings {
    pub walk_delay_secs: i64,
    pub excluded_lines: Vec<String>,
    pub scheme: ColorScheme,
    /// Rows the panel can hold.
    pub max_rows: usize,
}

/// One line of the sign for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayRow {
    pub line: String,
    pub product: Product,
    /// Destination, or `None` while a blinking row is in its hidden phase.
    pub direction_text: Option<String>,
    /// Whole minutes to departure, `None` when departing now.
    pub eta_minutes: Option<i64>,
    /// Color of the line label.
    pub color: Rgb888,
    /// The row is departing now and blinks.
    pub blink: bool,
}

impl DisplayRow {
    /// Countdown text such as `2'`, if any.
    pub fn eta_label(&self) -> Option<String> {
        self.eta_minutes.map(|minutes| format!("{minutes}'"))
    }
}

/// Compute the rows for one frame.
pub fn compute_rows(
    records: &[DepartureRecord],
    now: i64,
    settings: &CountdownSettings,
    phase: BlinkPhase,
) -> Vec<DisplayRow> {
    let mut rows = Vec::with_capacity(settings.max_rows);

    for record in records {
        if rows.len() >= settings.max_rows {
            break;
        }
        if settings.excluded_lines.contains(&record.line) {
            continue;
        }
        let eta = record.scheduled_at - now + BOARDING_BUFFER_SECS;
        if eta < settings.walk_delay_secs {
            continue;
        }

        let minutes = eta.div_euclid(60);
        let blink = minutes < 1;
        let direction_text = if blink && phase == BlinkPhase::Hidden {
            None
        } else {
            Some(record.direction.clone())
        };

        rows.push(DisplayRow {
            line: record.line.clone(),
            product: record.product,
            direction_text,
            eta_minutes: (!blink).then_some(minutes),
            color: label_color(settings.scheme, record.product, &record.line),
            blink,
        });
    }

    rows
}

/// Line label color for `product`/`line` under `scheme`.
pub fn label_color(scheme: ColorScheme, product: Product, line: &str) -> Rgb888 {
    let ColorScheme::ByProduct { line_colors } = scheme else {
        return BRAND;
    };
    match product {
        Product::Tram | Product::Regional => Rgb888::new(190, 20, 20),
        Product::Bus => Rgb888::new(149, 39, 110),
        Product::Suburban => Rgb888::new(0, 141, 79),
        Product::Subway => line_colors
            .then(|| subway_line_color(line))
            .flatten()
            .unwrap_or(Rgb888::new(17, 93, 145)),
        _ => BRAND,
    }
}

fn subway_line_color(line: &str) -> Option<Rgb888> {
    let color = match line {
        "U1" => Rgb888::new(125, 173, 76),
        "U2" => Rgb888::new(218, 66, 30),
        "U3" => Rgb888::new(0, 122, 91),
        "U4" => Rgb888::new(240, 215, 34),
        "U5" | "U55" => Rgb888::new(126, 83, 48),
        "U6" => Rgb888::new(140, 109, 171),
        "U7" => Rgb888::new(82, 141, 186),
        "U8" => Rgb888::new(34, 79, 134),
        "U9" => Rgb888::new(243, 121, 29),
        _ => return None,
    };
    Some(color)
}
