//! HTTP/1.1 response parsing.
//!
//! The transport reads until the peer closes, so the input is the complete
//! reply. The body is everything after the first blank line, taken as-is:
//! no Content-Length check, no chunked decoding.

use tracing::warn;

use crate::error::WireError;
use crate::http::HttpResponse;

const HEADER_END: &[u8] = b"\r\n\r\n";

/// Parse a complete reply into status, headers, and body.
pub fn parse_response(data: &[u8]) -> Result<HttpResponse, WireError> {
    if data.is_empty() {
        return Err(WireError::ConnectionClosed);
    }

    let header_end =
        find_header_end(data).ok_or(WireError::Malformed("missing header delimiter"))?;
    let header_block = std::str::from_utf8(&data[..header_end])
        .map_err(|_| WireError::Malformed("header block is not valid UTF-8"))?;

    let (status_line, rest) = header_block.split_once("\r\n").unwrap_or((header_block, ""));
    let status = parse_status_line(status_line)?;

    let mut headers = Vec::new();
    for line in rest.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.to_string(), value.trim_matches(' ').to_string()));
        }
    }

    Ok(HttpResponse {
        status,
        headers,
        body: data[header_end + HEADER_END.len()..].to_vec(),
    })
}

impl HttpResponse {
    /// Parse `data`, collapsing any failure into [`HttpResponse::invalid`].
    pub fn parse_or_invalid(data: &[u8]) -> HttpResponse {
        parse_response(data).unwrap_or_else(|e| {
            warn!(error = %e, "discarding unusable response");
            HttpResponse::invalid()
        })
    }
}

/// Position of the first `\r\n\r\n`.
fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(HEADER_END.len()).position(|w| w == HEADER_END)
}

/// `HTTP/1.1 200 OK` → 200.
///
/// Protocol, code, and the reason field must all be present; the reason
/// itself may be empty.
fn parse_status_line(line: &str) -> Result<i32, WireError> {
    let mut parts = line.splitn(3, ' ');
    let protocol = parts.next().unwrap_or("");
    let code = parts.next();
    let reason = parts.next();

    if !protocol.starts_with("HTTP/") {
        return Err(WireError::Malformed("status line has no protocol token"));
    }
    let (Some(code), Some(_)) = (code, reason) else {
        return Err(WireError::Malformed("status line is too short"));
    };
    if code.is_empty() || code.len() > 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WireError::Malformed("status code is not numeric"));
    }
    code.parse().map_err(|_| WireError::Malformed("status code is not numeric"))
}
