//! # Departure Fetching
//!
//! This module requests the departure board of one stop from a
//! `transport.rest` style API (`GET {base}/stops/{id}/departures`) and
//! streams the response body through the [`DepartureStreamParser`].
//!
//! ## Request
//!
//! - `results`, `duration`: size of the board
//! - `pretty=true`: the parser depends on the pretty-printed layout
//! - one boolean flag per transport mode from the filter settings
//! - `when`: start of the board in epoch seconds, sent once the clock is
//!   synced so the board starts at "now + walk delay"
//!
//! ## Clock Sync
//!
//! Every successful response carries a `Date` header (RFC 2822). It is the
//! sign's only time source, so it is returned with every batch. A
//! [`FetchMode::ClockOnly`] request stops after the headers; the sign uses
//! it once at start-up before it can send a meaningful `when`.
//!
//! ## Errors
//!
//! Everything that goes wrong here is transient from the sign's point of
//! view and surfaces as [`FetchError`]; the scheduler logs it and tries again
//! on the next cycle. Malformed records are not errors, they are dropped by
//! the parser and counted in the batch.

use crate::config::{ApiConfig, FilterConfig};
use crate::parser::DepartureStreamParser;
use crate::{DepartureRecord, Product};
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::header::{HeaderMap, DATE};
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// A fetch cycle failed; the previous departures stay on screen.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure: DNS, connect, TLS, timeout, truncated body
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    #[error("response has no Date header")]
    MissingDate,

    #[error("unparsable Date header {0:?}")]
    BadDate(String),
}

/// How much of the response is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchMode {
    /// Only the server time; the body is not read.
    ClockOnly,
    /// Server time and departures.
    Departures,
}

/// Result of one successful request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedBatch {
    /// Time from the response's `Date` header
    pub server_time: DateTime<Utc>,
    /// Departures in response order with cleaned-up destinations
    pub records: Vec<DepartureRecord>,
    /// Record terminators found in the body
    pub records_seen: usize,
    /// Records dropped because a field was missing or malformed
    pub skipped: usize,
    /// Body bytes thrown away without ever finding a record terminator
    pub discarded_bytes: usize,
}

impl FetchedBatch {
    /// Batch for a [`FetchMode::ClockOnly`] request.
    pub fn clock_only(server_time: DateTime<Utc>) -> Self {
        Self {
            server_time,
            records: Vec::new(),
            records_seen: 0,
            skipped: 0,
            discarded_bytes: 0,
        }
    }

    /// The body had content but none of it matched the expected layout:
    /// either records were found and all dropped, or bytes were discarded
    /// waiting for a terminator.
    pub fn layout_mismatch(&self) -> bool {
        self.records.is_empty() && (self.records_seen > 0 || self.discarded_bytes > 0)
    }
}

/// Source of departure batches.
#[allow(async_fn_in_trait)]
pub trait DepartureSource {
    /// Fetch the board starting at `when` (epoch seconds), or at the
    /// server's "now" when `None`.
    async fn fetch(&mut self, when: Option<i64>, mode: FetchMode)
        -> Result<FetchedBatch, FetchError>;
}

/// [`DepartureSource`] backed by the HTTP API.
pub struct HttpDepartureSource {
    client: Client,
    url: String,
    query: Vec<(&'static str, String)>,
    parser: DepartureStreamParser,
}

impl HttpDepartureSource {
    pub fn new(api: &ApiConfig, filter: &FilterConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(api.request_timeout())
            .build()?;
        Ok(Self::with_client(client, api, filter))
    }

    /// Use a preconfigured client (proxy, TLS roots, timeouts).
    pub fn with_client(client: Client, api: &ApiConfig, filter: &FilterConfig) -> Self {
        Self {
            client,
            url: departures_url(api),
            query: board_query(api, filter),
            parser: DepartureStreamParser::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DepartureSource for HttpDepartureSource {
    async fn fetch(
        &mut self,
        when: Option<i64>,
        mode: FetchMode,
    ) -> Result<FetchedBatch, FetchError> {
        let mut query = self.query.clone();
        if let Some(when) = when {
            query.push(("when", when.to_string()));
        }

        let mut response = self.client.get(&self.url).query(&query).send().await?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status()));
        }
        let server_time = server_date(response.headers())?;
        if mode == FetchMode::ClockOnly {
            return Ok(FetchedBatch::clock_only(server_time));
        }

        self.parser.clear();
        let mut received = 0;
        while let Some(chunk) = response.chunk().await? {
            received += chunk.len();
            self.parser.feed(&chunk);
        }
        debug!(
            "received {} bytes, {} records, {} bytes unterminated",
            received,
            self.parser.records_seen(),
            self.parser.pending_bytes()
        );

        let records = self
            .parser
            .take_departures()
            .into_iter()
            .map(|mut record| {
                record.direction = clean_direction(&record.direction);
                record
            })
            .collect();
        let batch = FetchedBatch {
            server_time,
            records,
            records_seen: self.parser.records_seen(),
            skipped: self.parser.skipped(),
            discarded_bytes: self.parser.discarded_bytes(),
        };
        self.parser.clear();
        Ok(batch)
    }
}

/// Endpoint for the configured stop.
pub fn departures_url(api: &ApiConfig) -> String {
    format!(
        "{}/stops/{}/departures",
        api.base_url.trim_end_matches('/'),
        api.station_id
    )
}

/// Query parameters shared by every request, without `when`.
pub fn board_query(api: &ApiConfig, filter: &FilterConfig) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("results", api.results.to_string()),
        ("duration", api.duration_minutes.to_string()),
        ("pretty", "true".to_string()),
    ];
    query.extend(
        Product::FILTERABLE
            .iter()
            .map(|product| (product.api_name(), filter.shows(*product).to_string())),
    );
    query
}

/// Server time from the `Date` header.
pub fn server_date(headers: &HeaderMap) -> Result<DateTime<Utc>, FetchError> {
    let value = headers.get(DATE).ok_or(FetchError::MissingDate)?;
    let text = value
        .to_str()
        .map_err(|_| FetchError::BadDate(String::from_utf8_lossy(value.as_bytes()).into_owned()))?;
    DateTime::parse_from_rfc2822(text)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|_| FetchError::BadDate(text.to_string()))
}

/// Shorten an API destination for the sign.
///
/// Keeps the part after the last `", "` (drops the town prefix), removes the
/// `[Endstelle]` and `(Berlin)` suffixes and collapses whitespace.
pub fn clean_direction(direction: &str) -> String {
    let name = direction.rsplit(", ").next().unwrap_or(direction);
    name.replace("[Endstelle]", "")
        .replace("(Berlin)", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
