//! File extension to content-type mapping.

use std::path::Path;

pub const JSON: &str = "application/json";
pub const PDF: &str = "application/pdf";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Map a file name to a content-type tag based on its extension.
pub fn classify(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("pdf") => PDF,
        Some("json") => JSON,
        _ => OCTET_STREAM,
    }
}

/// True for content types whose payload may be stored as raw JSON text.
pub fn is_json_like(content_type: &str) -> bool {
    let base = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    base == JSON || base == "text/json" || base.ends_with("+json")
}

/// Document payloads are materialized as blobs rather than data URLs.
pub fn is_document(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".pdf")
}
