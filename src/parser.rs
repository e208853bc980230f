//! This module provides a parser for the *XGPS* sentence that flight
//! simulators broadcast over UDP.
//!
//! A sentence looks like `XGPS<id>,<lon>,<lat>,<alt>,<bearing>,<speed>` and
//! arrives as the whole payload of one datagram. Numeric fields are read
//! leniently: a field that is not a number becomes `0.0` instead of rejecting
//! the sentence. Coordinates are not range checked.

use crate::err::ParseError;
use crate::lexer::{self, Tokenizer};

/// A decoded XGPS sentence together with the time it arrived.
/// Created by [parse](fn.parse.html).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixMeasurement {
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
    /// Bearing in degrees.
    pub bearing: f32,
    /// Ground speed in meters per second.
    pub speed: f32,
    /// Arrival time in milliseconds.
    pub timestamp_ms: i64,
}

/// Parse one datagram payload that arrived at `timestamp_ms`.
///
/// Returns `ParseError::MalformedSentence` if the payload does not start with
/// `XGPS` and `ParseError::InsufficientFields` if fewer than five fields follow
/// the first comma. Fields after the fifth are ignored.
pub fn parse(input: &[u8], timestamp_ms: i64) -> Result<FixMeasurement, ParseError> {
    // Bytes that are not UTF-8 become U+FFFD and zero only their own field.
    let text = String::from_utf8_lossy(input);
    let text = text.trim();
    if !text.starts_with(lexer::TAG) {
        return Err(ParseError::MalformedSentence);
    }

    // Anything between the tag and the first comma is a sub-identifier.
    let body = match text.find(',') {
        Some(i) => &text[i + 1..],
        None => return Err(ParseError::InsufficientFields(0)),
    };

    let fields = Tokenizer::new(body).fields();
    if fields.len() < lexer::FIELD_COUNT {
        return Err(ParseError::InsufficientFields(fields.len()));
    }

    Ok(FixMeasurement {
        longitude: fields[0],
        latitude: fields[1],
        altitude: fields[2],
        bearing: fields[3] as f32,
        speed: fields[4] as f32,
        timestamp_ms,
    })
}
