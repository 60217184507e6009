//! # Departure Sign Core Library
//!
//! This library holds everything the departure sign does between the network
//! and the LED panel. The binary only wires these pieces to a runtime, a
//! settings file and a concrete panel.
//!
//! ## Pipeline
//!
//! 1. **Fetch**: [`departures`] requests the stop's departure board and streams
//!    the response body into a [`parser::DepartureStreamParser`] chunk by chunk.
//! 2. **Publish**: each complete batch replaces the shared [`Snapshot`] held by
//!    the [`scheduler`]; the renderer never observes a half-written batch.
//! 3. **Count down**: once per second [`countdown`] turns the snapshot and the
//!    current time into display rows (minutes to departure, color, blink).
//! 4. **Draw**: [`renderer`] lays the rows out with the kerned bitmap text
//!    engine in [`layout`], dimmed by [`dimming`] at night, into a
//!    [`frame::FrameBuffer`] that is handed to the panel.
//!
//! ## Resource Model
//!
//! The sign runs on a single cooperative executor. The fetch task and the
//! render task share exactly two things: the snapshot slot and the fetch gate
//! that the render task opens for one moment after every frame.
//!
//! ## Core Types
//!
//! - [`Product`]: transport mode of a departure
//! - [`DepartureRecord`]: one decoded departure, immutable once created
//! - [`Snapshot`]: one fetch cycle's complete batch of records

use std::sync::Arc;

// Module declarations
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod countdown;
pub mod departures;
pub mod dimming;
pub mod font;
pub mod frame;
pub mod layout;
pub mod parser;
pub mod renderer;
pub mod scheduler;

#[cfg(test)]
mod tests;

/// Transport mode as reported by the departures API.
///
/// Unknown product strings map to [`Product::Other`] instead of failing, so a
/// new mode on the API side still shows up on the sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Product {
    Tram,
    Bus,
    Subway,
    Suburban,
    Regional,
    Express,
    Ferry,
    Other,
}

impl Product {
    /// All modes the API lets a request switch on or off.
    pub const FILTERABLE: [Product; 7] = [
        Product::Bus,
        Product::Tram,
        Product::Subway,
        Product::Regional,
        Product::Suburban,
        Product::Ferry,
        Product::Express,
    ];

    /// Parse the API's `line.product` value.
    pub fn from_api(value: &str) -> Self {
        match value {
            "tram" => Product::Tram,
            "bus" => Product::Bus,
            "subway" => Product::Subway,
            "suburban" => Product::Suburban,
            "regional" => Product::Regional,
            "express" => Product::Express,
            "ferry" => Product::Ferry,
            _ => Product::Other,
        }
    }

    /// Name used by the API, both in responses and as a query flag.
    pub fn api_name(self) -> &'static str {
        match self {
            Product::Tram => "tram",
            Product::Bus => "bus",
            Product::Subway => "subway",
            Product::Suburban => "suburban",
            Product::Regional => "regional",
            Product::Express => "express",
            Product::Ferry => "ferry",
            Product::Other => "other",
        }
    }
}

/// One upcoming departure at the configured stop.
///
/// # Example
/// ```
/// use departure_sign_lib::{DepartureRecord, Product};
///
/// let record = DepartureRecord {
///     line: "U5".to_string(),
///     product: Product::Subway,
///     direction: "Hönow".to_string(),
///     scheduled_at: 1_767_500_000,
/// };
/// assert_eq!(record.product.api_name(), "subway");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepartureRecord {
    /// Line label as printed on the vehicle, e.g. `U5`, `M10`, `S41`
    pub line: String,
    pub product: Product,
    /// Destination text shown next to the line label
    pub direction: String,
    /// Expected departure in UTC epoch seconds (realtime if available)
    pub scheduled_at: i64,
}

/// A complete batch of departures from one successful fetch, in feed order.
///
/// Snapshots are shared, never mutated: a newer fetch replaces the whole
/// snapshot.
pub type Snapshot = Arc<[DepartureRecord]>;
