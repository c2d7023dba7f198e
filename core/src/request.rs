//! HTTP/1.1 request serialization.

use crate::http::HttpRequest;

/// Headers the serializer writes itself; caller-supplied copies are dropped.
const MANAGED_HEADERS: [&str; 4] = ["host", "connection", "content-type", "content-length"];

/// Render `request` as HTTP/1.1 bytes.
///
/// `Host` and `Connection: close` are always present. `Content-Type` and
/// `Content-Length` are only written when the body is non-empty and the
/// request names a non-empty content type. CR and LF are dropped from the
/// path and from header names and values so no caller text can end a line.
pub fn serialize_request(host: &str, request: &HttpRequest) -> Vec<u8> {
    let mut out = Vec::with_capacity(256 + request.body.len());
    out.extend_from_slice(request.method.as_str().as_bytes());
    out.push(b' ');
    push_field(&mut out, &request.path);
    out.extend_from_slice(b" HTTP/1.1\r\n");

    push_header(&mut out, "Host", host);
    push_header(&mut out, "Connection", "close");

    for (name, value) in &request.headers {
        if MANAGED_HEADERS.iter().any(|m| name.eq_ignore_ascii_case(m)) {
            continue;
        }
        push_header(&mut out, name, value);
    }

    let content_type = request.content_type().unwrap_or("");
    if !request.body.is_empty() && !content_type.is_empty() {
        push_header(&mut out, "Content-Type", content_type);
        push_header(&mut out, "Content-Length", &request.body.len().to_string());
    }

    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&request.body);
    out
}

fn push_header(out: &mut Vec<u8>, name: &str, value: &str) {
    push_field(out, name);
    out.extend_from_slice(b": ");
    push_field(out, value);
    out.extend_from_slice(b"\r\n");
}

fn push_field(out: &mut Vec<u8>, text: &str) {
    out.extend(text.bytes().filter(|b| !matches!(b, b'\r' | b'\n')));
}
