//! CSV wire format for a single reading.
//!
//! A payload is seven comma-separated decimals with two fractional digits, in
//! the order accel x/y/z, gyro x/y/z, temperature. There is no terminator; the
//! server closes the connection after the last byte.

use core::fmt::Write;
use core::str::FromStr;

use thiserror_no_std::Error;

use crate::sensors::{READING_FIELDS, SensorReading};

/// The request a client sends to ask for the latest reading.
pub const REQUEST_COMMAND: &[u8] = b"DATA";

/// Upper bound on an encoded reading, shared by both ends.
pub const MAX_PAYLOAD_LEN: usize = 128;

pub type Payload = heapless::String<MAX_PAYLOAD_LEN>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("payload is empty")]
    Empty,
    #[error("payload of {len} bytes exceeds {max} bytes")]
    TooLong { len: usize, max: usize },
    #[error("payload is not valid UTF-8")]
    NotUtf8,
    #[error("expected 7 fields, found {found}")]
    FieldCount { found: usize },
    #[error("field {index} is not a number")]
    InvalidField { index: usize },
    #[error("encoded reading does not fit the payload buffer")]
    Overflow,
}

pub fn encode(reading: &SensorReading) -> Result<Payload, CodecError> {
    let mut payload = Payload::new();

    for (index, value) in reading.to_wire_array().iter().enumerate() {
        if index > 0 {
            payload.push(',').map_err(|_| CodecError::Overflow)?;
        }
        write!(payload, "{:.2}", value).map_err(|_| CodecError::Overflow)?;
    }

    Ok(payload)
}

pub fn decode(payload: &[u8]) -> Result<SensorReading, CodecError> {
    if payload.is_empty() {
        return Err(CodecError::Empty);
    }
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::TooLong {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }

    let text = core::str::from_utf8(payload).map_err(|_| CodecError::NotUtf8)?;

    let found = text.split(',').count();
    if found != READING_FIELDS {
        return Err(CodecError::FieldCount { found });
    }

    let mut values = [0.0f32; READING_FIELDS];
    for (index, field) in text.split(',').enumerate() {
        values[index] =
            f32::from_str(field.trim()).map_err(|_| CodecError::InvalidField { index })?;
    }

    Ok(SensorReading::from_wire_array(values))
}
