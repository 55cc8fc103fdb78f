//! Payload encoding helpers shared by the import, export, resolver and
//! document paths.
//!
//! A stored payload is either base64 of the original bytes or, for JSON
//! records, the raw JSON text. Two older layouts of JSON documents also exist
//! in the wild: base64 of UTF-8 text, and base64 produced by a byte-per-char
//! encoder. [`decode_json_text`] walks all three in a fixed order.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::assets::errors::AssetError;
use crate::assets::mime;

/// Accepts padded or unpadded input; whitespace is stripped by the caller.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(payload: &str) -> Result<Vec<u8>, AssetError> {
    Ok(STANDARD.decode(payload.trim())?)
}

/// Structural sniff: does the text look like a raw JSON object or array?
pub fn looks_like_json(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('{') | Some('['))
}

/// True when `payload` should be written out as text rather than decoded bytes.
pub fn is_raw_json(content_type: &str, payload: &str) -> bool {
    mime::is_json_like(content_type) && looks_like_json(payload)
}

/// Choose the stored payload form for freshly read file bytes: raw text for
/// JSON files that are valid UTF-8 and sniff as JSON, base64 otherwise.
pub fn payload_for(content_type: &str, bytes: &[u8]) -> String {
    if mime::is_json_like(content_type) {
        if let Ok(text) = std::str::from_utf8(bytes) {
            if looks_like_json(text) {
                return text.to_string();
            }
        }
    }
    encode(bytes)
}

/// Original bytes of a stored payload.
pub fn payload_bytes(content_type: &str, payload: &str) -> Result<Vec<u8>, AssetError> {
    if is_raw_json(content_type, payload) {
        Ok(payload.as_bytes().to_vec())
    } else {
        decode(payload)
    }
}

/// `data:` URL for a stored payload.
pub fn data_url(content_type: &str, payload: &str) -> String {
    if is_raw_json(content_type, payload) {
        format!("data:{};base64,{}", content_type, encode(payload.as_bytes()))
    } else {
        format!("data:{};base64,{}", content_type, payload.trim())
    }
}

/// Which stored layout a JSON document was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEncoding {
    RawText,
    Utf8Base64,
    Latin1Base64,
}

/// Recover JSON text from any of the three document layouts. Each candidate
/// must also parse as JSON before it is accepted, so a raw document that
/// happens to be valid base64 is never misread.
pub fn decode_json_text(payload: &str) -> Option<(String, DocumentEncoding)> {
    if looks_like_json(payload) && parses(payload) {
        return Some((payload.to_string(), DocumentEncoding::RawText));
    }

    // Both legacy layouts share one decode; they differ only in how the
    // bytes become text.
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = LENIENT.decode(compact.as_bytes()).ok()?;

    if let Ok(text) = std::str::from_utf8(&bytes) {
        if parses(text) {
            return Some((text.to_string(), DocumentEncoding::Utf8Base64));
        }
    }

    let text: String = bytes.iter().map(|&b| b as char).collect();
    if parses(&text) {
        return Some((text, DocumentEncoding::Latin1Base64));
    }

    None
}

fn parses(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text).is_ok()
}
