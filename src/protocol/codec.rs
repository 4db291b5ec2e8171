//! Line codec for the wicket wire protocol.
//!
//! Messages travel as newline-delimited JSON. Decoding is strict: a
//! malformed, empty, or oversized line is an error, and the connection that
//! produced it is torn down by the caller.

use crate::{Result, WicketError};

use super::reply::Reply;
use super::request::Request;

/// Upper bound on a single request line, in bytes (newline included).
pub const MAX_LINE_BYTES: usize = 4096;

/// Decode one request line.
///
/// Trailing `\r\n` and surrounding whitespace are stripped before parsing.
pub fn decode_request(line: &str) -> Result<Request> {
    if line.len() > MAX_LINE_BYTES {
        return Err(WicketError::Protocol(format!(
            "request line exceeds {MAX_LINE_BYTES} bytes"
        )));
    }

    let line = line.trim();
    if line.is_empty() {
        return Err(WicketError::Protocol("empty request line".to_string()));
    }

    serde_json::from_str(line).map_err(|e| WicketError::Protocol(format!("malformed request: {e}")))
}

/// Encode a request as a JSON line (without the trailing newline).
pub fn encode_request(request: &Request) -> Result<String> {
    serde_json::to_string(request)
        .map_err(|e| WicketError::Protocol(format!("failed to encode request: {e}")))
}

/// Decode one reply line.
pub fn decode_reply(line: &str) -> Result<Reply> {
    let line = line.trim();
    if line.is_empty() {
        return Err(WicketError::Protocol("empty reply line".to_string()));
    }

    serde_json::from_str(line).map_err(|e| WicketError::Protocol(format!("malformed reply: {e}")))
}

/// Encode a reply as a JSON line (without the trailing newline).
pub fn encode_reply(reply: &Reply) -> Result<String> {
    serde_json::to_string(reply)
        .map_err(|e| WicketError::Protocol(format!("failed to encode reply: {e}")))
}
