//! # Streaming Departure Parser
//!
//! Extracts departures from the departures endpoint's pretty-printed JSON
//! body while it arrives, without ever holding the full response.
//!
//! ## Expected Layout
//!
//! The API pretty-prints with tabs and a fixed field order. Each departure
//! object sits at depth two and ends with a newline, two tabs and `}`:
//!
//! ```text
//! {
//! 	"departures": [
//! 		{
//! 			"tripId": "...",
//! 			"when": "2026-01-04T04:46:00+01:00",
//! 			"direction": "S+U Hauptbahnhof",
//! 			"line": {
//! 				"name": "U5",
//! 				"product": "subway",
//! 			},
//! 		},
//! ```
//!
//! The parser looks for that record terminator, then locates the four
//! labels `when`, `direction`, `line.name` and `line.product` in that order
//! inside the completed record and slices out their string values.
//!
//! ## Failure Behaviour
//!
//! This is deliberately not a JSON parser. A record whose fields cannot all
//! be found (a cancelled trip with `"when": null`, a field reordering after
//! an API change, an unparsable timestamp) is counted and dropped, and
//! scanning continues after it. Nothing is ever returned as an error. The
//! [`records_seen`](DepartureStreamParser::records_seen) and
//! [`skipped`](DepartureStreamParser::skipped) counters let the caller notice
//! a layout change that drops everything.
//!
//! ## Memory
//!
//! Only the bytes after the last complete record are retained between
//! [`feed`](DepartureStreamParser::feed) calls, so memory is bounded by the
//! largest single record rather than the response size. A tail that grows
//! past [`MAX_RECORD_BYTES`] without a terminator (compact JSON, another
//! indentation) is discarded and counted in
//! [`discarded_bytes`](DepartureStreamParser::discarded_bytes).

use crate::{DepartureRecord, Product};
use chrono::DateTime;

const RECORD_END: &[u8] = b"\n\t\t}";

/// Largest unterminated tail kept between chunks.
pub const MAX_RECORD_BYTES: usize = 16 * 1024;
const WHEN: &[u8] = b"\n\t\t\t\"when\": \"";
const DIRECTION: &[u8] = b"\n\t\t\t\"direction\": \"";
const LINE: &[u8] = b"\n\t\t\t\"line\": {";
const LINE_NAME: &[u8] = b"\n\t\t\t\t\"name\": \"";
const LINE_PRODUCT: &[u8] = b"\n\t\t\t\t\"product\": \"";

/// Incremental extractor of [`DepartureRecord`]s from one response body.
#[derive(Debug, Default)]
pub struct DepartureStreamParser {
    /// Unconsumed bytes after the last record terminator.
    tail: Vec<u8>,
    departures: Vec<DepartureRecord>,
    records_seen: usize,
    skipped: usize,
    discarded: usize,
}

impl DepartureStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the next slice of the response body.
    ///
    /// Chunks may split records, labels or the terminator itself at any byte.
    pub fn feed(&mut self, chunk: &[u8]) {
        // A terminator may straddle the previous chunk boundary.
        let mut search_from = self.tail.len().saturating_sub(RECORD_END.len() - 1);
        self.tail.extend_from_slice(chunk);

        let mut record_start = 0;
        while let Some(found) = find(&self.tail[search_from..], RECORD_END) {
            let record_end = search_from + found + RECORD_END.len();
            self.records_seen += 1;
            match extract_record(&self.tail[record_start..record_end]) {
                Some(record) => self.departures.push(record),
                None => self.skipped += 1,
            }
            record_start = record_end;
            search_from = record_end;
        }

        self.tail.drain(..record_start);

        if self.tail.len() > MAX_RECORD_BYTES {
            // keep enough for a terminator split across the next chunk
            let excess = self.tail.len() - (RECORD_END.len() - 1);
            self.tail.drain(..excess);
            self.discarded += excess;
        }
    }

    /// Forget everything from the previous response.
    pub fn clear(&mut self) {
        self.tail.clear();
        self.departures.clear();
        self.records_seen = 0;
        self.skipped = 0;
        self.discarded = 0;
    }

    /// Records completed so far, in response order.
    pub fn departures(&self) -> &[DepartureRecord] {
        &self.departures
    }

    /// Move the completed records out, leaving the list empty.
    pub fn take_departures(&mut self) -> Vec<DepartureRecord> {
        std::mem::take(&mut self.departures)
    }

    /// Number of record terminators found since the last [`clear`](Self::clear).
    pub fn records_seen(&self) -> usize {
        self.records_seen
    }

    /// Number of records dropped because a field was missing or malformed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Bytes thrown away because no terminator showed up within
    /// [`MAX_RECORD_BYTES`].
    pub fn discarded_bytes(&self) -> usize {
        self.discarded
    }

    /// Bytes held back waiting for the rest of a record.
    pub fn pending_bytes(&self) -> usize {
        self.tail.len()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// String value following `label`, searching from `from`.
///
/// Returns the value and the offset just past its line.
fn field<'a>(record: &'a [u8], from: usize, label: &[u8]) -> Option<(&'a str, usize)> {
    let start = from + find(&record[from..], label)? + label.len();
    let line_end = start + find(&record[start..], b"\n")?;
    let line = &record[start..line_end];
    let line = line.strip_suffix(b",").unwrap_or(line);
    let value = line.strip_suffix(b"\"")?;
    Some((std::str::from_utf8(value).ok()?, line_end))
}

fn extract_record(record: &[u8]) -> Option<DepartureRecord> {
    let (when, next) = field(record, 0, WHEN)?;
    let (direction, next) = field(record, next, DIRECTION)?;
    let line_block = next + find(&record[next..], LINE)? + LINE.len();
    let (line, next) = field(record, line_block, LINE_NAME)?;
    let (product, _) = field(record, next, LINE_PRODUCT)?;

    let scheduled_at = DateTime::parse_from_rfc3339(when).ok()?.timestamp();

    Some(DepartureRecord {
        line: line.to_string(),
        product: Product::from_api(product),
        direction: direction.to_string(),
        scheduled_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(when: &str, direction: &str, line: &str, product: &str) -> String {
        format!(
            "\t\t{{\n\
             \t\t\t\"tripId\": \"1|2345|6|86|4012026\",\n\
             \t\t\t\"stop\": {{\n\
             \t\t\t\t\"type\": \"stop\",\n\
             \t\t\t\t\"name\": \"S+U Alexanderplatz\"\n\
             \t\t\t}},\n\
             \t\t\t\"when\": {when},\n\
             \t\t\t\"plannedWhen\": \"2026-01-04T04:45:00+01:00\",\n\
             \t\t\t\"delay\": 60,\n\
             \t\t\t\"direction\": \"{direction}\",\n\
             \t\t\t\"line\": {{\n\
             \t\t\t\t\"type\": \"line\",\n\
             \t\t\t\t\"id\": \"{id}\",\n\
             \t\t\t\t\"name\": \"{line}\",\n\
             \t\t\t\t\"public\": true,\n\
             \t\t\t\t\"product\": \"{product}\",\n\
             \t\t\t\t\"operator\": {{\n\
             \t\t\t\t\t\"name\": \"Berliner Verkehrsbetriebe\"\n\
             \t\t\t\t}}\n\
             \t\t\t}},\n\
             \t\t\t\"remarks\": []\n\
             \t\t}}",
            id = line.to_lowercase(),
        )
    }

    fn body(records: &[String]) -> String {
        format!(
            "{{\n\t\"departures\": [\n{}\n\t],\n\t\"realtimeDataUpdatedAt\": 1767498360\n}}\n",
            records.join(",\n")
        )
    }

    fn sample_body() -> String {
        body(&[
            record(
                "\"2026-01-04T04:46:00+01:00\"",
                "S+U Hauptbahnhof",
                "U5",
                "subway",
            ),
            record("\"2026-01-04T04:48:30+01:00\"", "Hönow", "M10", "tram"),
            record("\"2026-01-04T04:51:00Z\"", "Flughafen BER", "FEX", "regional"),
        ])
    }

    #[test]
    fn extracts_records_in_order() {
        let mut parser = DepartureStreamParser::new();
        parser.feed(sample_body().as_bytes());

        let departures = parser.departures();
        assert_eq!(departures.len(), 3);
        assert_eq!(
            departures[0],
            DepartureRecord {
                line: "U5".to_string(),
                product: Product::Subway,
                direction: "S+U Hauptbahnhof".to_string(),
                scheduled_at: 1_767_498_360,
            }
        );
        assert_eq!(departures[1].line, "M10");
        assert_eq!(departures[1].direction, "Hönow");
        assert_eq!(departures[1].scheduled_at, 1_767_498_510);
        assert_eq!(departures[2].product, Product::Regional);
        assert_eq!(departures[2].scheduled_at, 1_767_502_260);
        assert_eq!(parser.records_seen(), 3);
        assert_eq!(parser.skipped(), 0);
    }

    #[test]
    fn chunk_boundaries_do_not_matter() {
        let body = sample_body();
        let mut whole = DepartureStreamParser::new();
        whole.feed(body.as_bytes());

        for chunk_size in [1, 2, 3, 4, 5, 7, 13, 64, 1024] {
            let mut parser = DepartureStreamParser::new();
            for chunk in body.as_bytes().chunks(chunk_size) {
                parser.feed(chunk);
            }
            assert_eq!(parser.departures(), whole.departures(), "chunk size {chunk_size}");
        }
    }

    #[test]
    fn tail_stays_bounded_by_one_record() {
        let one = record("\"2026-01-04T04:46:00+01:00\"", "Pankow", "U2", "subway");
        let body = body(&vec![one.clone(); 50]);

        let mut parser = DepartureStreamParser::new();
        let mut high_water = 0;
        for chunk in body.as_bytes().chunks(100) {
            parser.feed(chunk);
            high_water = high_water.max(parser.pending_bytes());
        }
        assert_eq!(parser.departures().len(), 50);
        assert!(high_water < one.len() + 200, "held {high_water} bytes");
    }

    #[test]
    fn cancelled_trip_is_skipped() {
        let body = body(&[
            record("null", "Ruhleben", "U2", "subway"),
            record("\"2026-01-04T04:46:00+01:00\"", "Pankow", "U2", "subway"),
        ]);
        let mut parser = DepartureStreamParser::new();
        parser.feed(body.as_bytes());

        assert_eq!(parser.departures().len(), 1);
        assert_eq!(parser.departures()[0].direction, "Pankow");
        assert_eq!(parser.records_seen(), 2);
        assert_eq!(parser.skipped(), 1);
    }

    #[test]
    fn bad_timestamp_is_skipped() {
        let body = body(&[record("\"soon\"", "Pankow", "U2", "subway")]);
        let mut parser = DepartureStreamParser::new();
        parser.feed(body.as_bytes());
        assert!(parser.departures().is_empty());
        assert_eq!(parser.skipped(), 1);
    }

    #[test]
    fn unknown_product_maps_to_other() {
        let body = body(&[record(
            "\"2026-01-04T04:46:00+01:00\"",
            "Wannsee",
            "F10",
            "cablecar",
        )]);
        let mut parser = DepartureStreamParser::new();
        parser.feed(body.as_bytes());
        assert_eq!(parser.departures()[0].product, Product::Other);
    }

    #[test]
    fn truncated_response_keeps_partial_tail() {
        let body = sample_body();
        let cut = body.find("\"direction\": \"S+U").unwrap();
        let mut parser = DepartureStreamParser::new();
        parser.feed(&body.as_bytes()[..cut]);

        assert!(parser.departures().is_empty());
        assert_eq!(parser.records_seen(), 0);
        assert_eq!(parser.pending_bytes(), cut);
    }

    #[test]
    fn clear_prevents_leakage_between_responses() {
        let mut parser = DepartureStreamParser::new();
        parser.feed(sample_body().as_bytes());
        // half a record left dangling from an aborted response
        parser.feed(b"\t\t{\n\t\t\t\"when\": \"2026-01-04T05:00:00+01:00\",\n");
        parser.clear();

        assert!(parser.departures().is_empty());
        assert_eq!(parser.pending_bytes(), 0);

        let second = body(&[record(
            "\"2026-01-04T05:10:00+01:00\"",
            "Spandau",
            "U7",
            "subway",
        )]);
        parser.feed(second.as_bytes());
        let lines: Vec<_> = parser.departures().iter().map(|d| d.line.as_str()).collect();
        assert_eq!(lines, ["U7"]);
    }

    #[test]
    fn compact_json_yields_nothing() {
        let mut parser = DepartureStreamParser::new();
        parser.feed(br#"{"departures":[{"when":"2026-01-04T04:46:00+01:00","direction":"X","line":{"name":"U5","product":"subway"}}]}"#);
        assert!(parser.departures().is_empty());
        assert_eq!(parser.records_seen(), 0);
    }

    #[test]
    fn unterminated_body_does_not_accumulate() {
        let compact = r#"{"when":"2026-01-04T04:46:00+01:00","direction":"Pankow","line":{"name":"U2","product":"subway"}}"#;
        let body = format!("{{\"departures\":[{}]}}", vec![compact; 2000].join(","));
        assert!(body.len() > 10 * MAX_RECORD_BYTES);

        let mut parser = DepartureStreamParser::new();
        let mut high_water = 0;
        for chunk in body.as_bytes().chunks(1024) {
            parser.feed(chunk);
            high_water = high_water.max(parser.pending_bytes());
        }

        assert!(high_water <= MAX_RECORD_BYTES, "held {high_water} bytes");
        assert!(parser.discarded_bytes() > body.len() - MAX_RECORD_BYTES - 1024);
        assert_eq!(parser.records_seen(), 0);
        assert!(parser.departures().is_empty());

        parser.clear();
        assert_eq!(parser.discarded_bytes(), 0);
    }

    #[test]
    fn pretty_records_after_a_discard_still_parse() {
        let mut parser = DepartureStreamParser::new();
        parser.feed(&vec![b'x'; MAX_RECORD_BYTES + 1]);
        assert_eq!(parser.pending_bytes(), RECORD_END.len() - 1);

        parser.feed(sample_body().as_bytes());
        // the first record absorbs the leftover garbage and still parses
        assert_eq!(parser.departures().len(), 3);
        assert_eq!(parser.discarded_bytes(), MAX_RECORD_BYTES + 1 - (RECORD_END.len() - 1));
    }

    #[test]
    fn take_departures_empties_the_list() {
        let mut parser = DepartureStreamParser::new();
        parser.feed(sample_body().as_bytes());
        assert_eq!(parser.take_departures().len(), 3);
        assert!(parser.departures().is_empty());
    }
}
