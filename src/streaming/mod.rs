//! AWS Event Stream framing (`application/vnd.amazon.eventstream`).
//!
//! Each frame is a 12-byte prelude (total length, headers length, prelude
//! CRC), typed headers, a payload, and a trailing CRC over everything before
//! it. Both CRCs are CRC-32 (IEEE).

use crate::error::{InferenceError, StreamError};
use bytes::{BufMut, BytesMut};
use std::collections::HashMap;

const PRELUDE_SIZE: usize = 12;

/// Minimum message size (prelude + message CRC).
const MIN_MESSAGE_SIZE: usize = PRELUDE_SIZE + 4;

/// Largest frame accepted before the buffer is considered corrupt.
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// A decoded event stream message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStreamMessage {
    /// Message headers.
    pub headers: HashMap<String, HeaderValue>,
    /// Message payload.
    pub payload: Vec<u8>,
}

impl EventStreamMessage {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: HeaderValue) -> Self {
        self.headers.insert(name.into(), value);
        self
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Get a header value as a string.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(HeaderValue::as_str)
    }

    /// `:event-type` header.
    pub fn event_type(&self) -> Option<&str> {
        self.header_str(":event-type")
    }

    /// `:message-type` header (`event` or `exception`).
    pub fn message_type(&self) -> Option<&str> {
        self.header_str(":message-type")
    }

    /// `:exception-type` header on exception frames.
    pub fn exception_type(&self) -> Option<&str> {
        self.header_str(":exception-type")
    }

    /// `:content-type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(":content-type")
    }

    /// Check if this is an exception message.
    pub fn is_exception(&self) -> bool {
        self.message_type() == Some("exception")
    }

    /// Get the payload as UTF-8 string.
    pub fn payload_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.payload)
    }

    /// Parse the payload as JSON.
    pub fn payload_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Encode into a wire frame.
    pub fn encode(&self) -> Vec<u8> {
        let mut headers = BytesMut::new();
        let mut names: Vec<&String> = self.headers.keys().collect();
        names.sort();
        for name in names {
            headers.put_u8(name.len() as u8);
            headers.put_slice(name.as_bytes());
            self.headers[name].encode_into(&mut headers);
        }

        let total_len = PRELUDE_SIZE + headers.len() + self.payload.len() + 4;
        let mut frame = BytesMut::with_capacity(total_len);
        frame.put_u32(total_len as u32);
        frame.put_u32(headers.len() as u32);
        let prelude_crc = crc32fast::hash(&frame[..8]);
        frame.put_u32(prelude_crc);
        frame.put_slice(&headers);
        frame.put_slice(&self.payload);
        let message_crc = crc32fast::hash(&frame);
        frame.put_u32(message_crc);
        frame.to_vec()
    }
}

/// Header value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    /// Boolean true.
    BoolTrue,
    /// Boolean false.
    BoolFalse,
    /// Byte value.
    Byte(i8),
    /// Short value.
    Short(i16),
    /// Integer value.
    Int(i32),
    /// Long value.
    Long(i64),
    /// Bytes value.
    Bytes(Vec<u8>),
    /// String value.
    String(String),
    /// Timestamp value (milliseconds since epoch).
    Timestamp(i64),
    /// UUID value.
    Uuid([u8; 16]),
}

impl HeaderValue {
    /// Get as string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn encode_into(&self, out: &mut BytesMut) {
        match self {
            HeaderValue::BoolTrue => out.put_u8(0),
            HeaderValue::BoolFalse => out.put_u8(1),
            HeaderValue::Byte(v) => {
                out.put_u8(2);
                out.put_i8(*v);
            }
            HeaderValue::Short(v) => {
                out.put_u8(3);
                out.put_i16(*v);
            }
            HeaderValue::Int(v) => {
                out.put_u8(4);
                out.put_i32(*v);
            }
            HeaderValue::Long(v) => {
                out.put_u8(5);
                out.put_i64(*v);
            }
            HeaderValue::Bytes(v) => {
                out.put_u8(6);
                out.put_u16(v.len() as u16);
                out.put_slice(v);
            }
            HeaderValue::String(v) => {
                out.put_u8(7);
                out.put_u16(v.len() as u16);
                out.put_slice(v.as_bytes());
            }
            HeaderValue::Timestamp(v) => {
                out.put_u8(8);
                out.put_i64(*v);
            }
            HeaderValue::Uuid(v) => {
                out.put_u8(9);
                out.put_slice(v);
            }
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::String(value.to_string())
    }
}

/// Incremental event stream decoder.
///
/// Network chunks are fed in as they arrive; complete frames are pulled out
/// with [`next_message`](Self::next_message). A frame split across chunks
/// stays buffered until the rest arrives.
pub struct EventStreamParser {
    buffer: BytesMut,
}

impl EventStreamParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
        }
    }

    /// Feed bytes into the parser.
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes buffered but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Try to parse the next message from the buffer.
    pub fn next_message(&mut self) -> Result<Option<EventStreamMessage>, InferenceError> {
        if self.buffer.len() < PRELUDE_SIZE {
            return Ok(None);
        }

        let total_len = read_u32(&self.buffer, 0) as usize;

        if !(MIN_MESSAGE_SIZE..=MAX_MESSAGE_SIZE).contains(&total_len) {
            return Err(parse_error(format!("Invalid message length: {}", total_len)));
        }

        let prelude_crc = read_u32(&self.buffer, 8);
        if prelude_crc != crc32fast::hash(&self.buffer[..8]) {
            return Err(InferenceError::Stream(StreamError::CrcMismatch));
        }

        if self.buffer.len() < total_len {
            return Ok(None);
        }

        let frame = self.buffer.split_to(total_len);
        decode_frame(&frame).map(Some)
    }

    /// Drain all available messages. Stops after the first error.
    pub fn drain(&mut self) -> Vec<Result<EventStreamMessage, InferenceError>> {
        let mut messages = Vec::new();
        loop {
            match self.next_message() {
                Ok(Some(msg)) => messages.push(Ok(msg)),
                Ok(None) => break,
                Err(e) => {
                    messages.push(Err(e));
                    break;
                }
            }
        }
        messages
    }
}

impl Default for EventStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_error(message: impl Into<String>) -> InferenceError {
    InferenceError::Stream(StreamError::ParseError {
        message: message.into(),
    })
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn decode_frame(data: &[u8]) -> Result<EventStreamMessage, InferenceError> {
    let total_len = data.len();
    let headers_len = read_u32(data, 4) as usize;

    let message_crc = read_u32(data, total_len - 4);
    if message_crc != crc32fast::hash(&data[..total_len - 4]) {
        return Err(InferenceError::Stream(StreamError::CrcMismatch));
    }

    let headers_end = PRELUDE_SIZE + headers_len;
    if headers_end > total_len - 4 {
        return Err(parse_error(format!(
            "Headers length {} exceeds frame length {}",
            headers_len, total_len
        )));
    }

    let headers = decode_headers(&data[PRELUDE_SIZE..headers_end])?;
    let payload = data[headers_end..total_len - 4].to_vec();

    Ok(EventStreamMessage { headers, payload })
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], InferenceError> {
        if self.pos + len > self.data.len() {
            return Err(parse_error(format!("{} overflow", what)));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], InferenceError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn take_u16_prefixed(&mut self, what: &str) -> Result<&'a [u8], InferenceError> {
        let len = u16::from_be_bytes(self.take_array::<2>(what)?) as usize;
        self.take(len, what)
    }
}

fn decode_headers(data: &[u8]) -> Result<HashMap<String, HeaderValue>, InferenceError> {
    let mut headers = HashMap::new();
    let mut cursor = Cursor { data, pos: 0 };

    while cursor.pos < data.len() {
        let name_len = cursor.take(1, "Header name length")?[0] as usize;
        let name = String::from_utf8_lossy(cursor.take(name_len, "Header name")?).into_owned();
        let value_type = cursor.take(1, "Header value type")?[0];

        let value = match value_type {
            0 => HeaderValue::BoolTrue,
            1 => HeaderValue::BoolFalse,
            2 => HeaderValue::Byte(i8::from_be_bytes(cursor.take_array("Byte value")?)),
            3 => HeaderValue::Short(i16::from_be_bytes(cursor.take_array("Short value")?)),
            4 => HeaderValue::Int(i32::from_be_bytes(cursor.take_array("Int value")?)),
            5 => HeaderValue::Long(i64::from_be_bytes(cursor.take_array("Long value")?)),
            6 => HeaderValue::Bytes(cursor.take_u16_prefixed("Bytes value")?.to_vec()),
            7 => HeaderValue::String(
                String::from_utf8_lossy(cursor.take_u16_prefixed("String value")?).into_owned(),
            ),
            8 => HeaderValue::Timestamp(i64::from_be_bytes(cursor.take_array("Timestamp value")?)),
            9 => HeaderValue::Uuid(cursor.take_array("UUID value")?),
            other => return Err(parse_error(format!("Unknown header value type: {}", other))),
        };

        headers.insert(name, value);
    }

    Ok(headers)
}
