//! Body rendering by declared content type.
//!
//! # Design Decisions
//! - Content types are matched on their semicolon-delimited essence,
//!   case-insensitively
//! - Form bodies decode to ordered key/value pairs; JSON bodies go through
//!   the structured-text rule; small HTML is echoed; everything else is
//!   summarized as a byte count
//! - Response bodies are inspected through the capture buffer with the
//!   stream position restored afterwards

use crate::config::RenderConfig;
use crate::exchange::ResponseChannel;

use super::value::{format_value, pairs_block};

/// Render a buffered body according to its declared content type.
pub fn format_body(content_type: Option<&str>, body: &[u8], limits: &RenderConfig) -> String {
    if body.is_empty() {
        return String::new();
    }
    let declared = content_type.unwrap_or("");
    match media_essence(declared).as_str() {
        "application/x-www-form-urlencoded" => {
            let pairs: Vec<(String, String)> =
                url::form_urlencoded::parse(body).into_owned().collect();
            format!("=== {declared} ===\n{}", pairs_block(&pairs, limits))
        }
        "application/json" => format_value(&String::from_utf8_lossy(body), limits),
        "text/html" if body.len() < limits.html_echo_limit => {
            String::from_utf8_lossy(body).into_owned()
        }
        _ => format!("=== {declared} ===\n{} bytes", body.len()),
    }
}

/// Render the response body as currently buffered, leaving the stream's
/// read position unchanged. Falls back to a byte count once the body is
/// streaming straight to the transport.
pub fn render_response_body(response: &ResponseChannel, limits: &RenderConfig) -> String {
    match response.body().peek() {
        Some(bytes) => format_body(response.content_type(), &bytes, limits),
        None => format!("{} bytes", response.body_len()),
    }
}

fn media_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}
