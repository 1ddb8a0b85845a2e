//! Circuit document codec and the compressed share format.
//!
//! Share strings are `"c1:" + base64url(zlib(JSON(circuit)))`. Strings without
//! the prefix are treated as the legacy format: plain base64 of the JSON.

use crate::circuit::{CIRCUIT_VERSION, Circuit};
use crate::error::{CoreError, CoreResult};
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use serde_json::Value;
use std::io::{Read, Write};

/// Prefix marking the compressed share format
pub const SHARE_PREFIX: &str = "c1:";

/// Serialize a circuit document to JSON
///
/// # Errors
///
/// Returns error if serialization fails
pub fn encode_circuit(circuit: &Circuit) -> CoreResult<String> {
    Ok(serde_json::to_string(circuit)?)
}

/// Parse and validate a circuit document
///
/// # Errors
///
/// Returns error on invalid JSON, a non-object payload, a version other than 1,
/// malformed nodes/connections or duplicate node ids
pub fn decode_circuit(text: &str) -> CoreResult<Circuit> {
    let value: Value = serde_json::from_str(text).map_err(|e| CoreError::ParseError {
        message: format!("circuit is not valid JSON: {}", e),
    })?;
    circuit_from_value(value)
}

fn circuit_from_value(value: Value) -> CoreResult<Circuit> {
    let Value::Object(ref map) = value else {
        return Err(CoreError::validation("circuit", "expected a JSON object"));
    };
    match map.get("version") {
        Some(Value::Number(n)) if n.as_u64() == Some(u64::from(CIRCUIT_VERSION)) => {}
        Some(other) => {
            return Err(CoreError::UnsupportedVersion {
                kind: "circuit".to_string(),
                found: other.to_string(),
            });
        }
        None => return Err(CoreError::validation("circuit.version", "missing")),
    }
    let circuit: Circuit = serde_json::from_value(value).map_err(|e| CoreError::ParseError {
        message: format!("invalid circuit document: {}", e),
    })?;
    circuit.validate()?;
    Ok(circuit)
}

/// Encode a circuit as a compressed share string
///
/// # Errors
///
/// Returns error if serialization or compression fails
pub fn encode_share(circuit: &Circuit) -> CoreResult<String> {
    let json = encode_circuit(circuit)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(json.as_bytes())
        .and_then(|()| encoder.finish())
        .map(|bytes| format!("{}{}", SHARE_PREFIX, URL_SAFE_NO_PAD.encode(bytes)))
        .map_err(|e| CoreError::Encoding {
            message: format!("compression failed: {}", e),
        })
}

/// Decode a share string in either the compressed or the legacy format
///
/// # Errors
///
/// Returns error if the payload is not valid base64, cannot be inflated, or
/// does not hold a valid circuit document
pub fn decode_share(share: &str) -> CoreResult<Circuit> {
    let share = share.trim();
    let json = match share.strip_prefix(SHARE_PREFIX) {
        Some(payload) => {
            let bytes = URL_SAFE_NO_PAD
                .decode(payload.trim_end_matches('='))
                .map_err(|e| CoreError::ParseError {
                    message: format!("share payload is not base64url: {}", e),
                })?;
            inflate(&bytes)?
        }
        None => {
            let bytes = STANDARD
                .decode(share)
                .or_else(|_| STANDARD_NO_PAD.decode(share))
                .map_err(|e| CoreError::ParseError {
                    message: format!("legacy share is not base64: {}", e),
                })?;
            String::from_utf8(bytes).map_err(|e| CoreError::ParseError {
                message: format!("legacy share is not UTF-8: {}", e),
            })?
        }
    };
    decode_circuit(&json)
}

fn inflate(bytes: &[u8]) -> CoreResult<String> {
    let mut text = String::new();
    if ZlibDecoder::new(bytes).read_to_string(&mut text).is_ok() {
        return Ok(text);
    }
    // Some writers emit a raw deflate stream without the zlib wrapper.
    text.clear();
    DeflateDecoder::new(bytes)
        .read_to_string(&mut text)
        .map_err(|e| CoreError::ParseError {
            message: format!("share payload could not be inflated: {}", e),
        })?;
    Ok(text)
}
