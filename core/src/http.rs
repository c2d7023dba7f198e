//! HTTP request and response values.
//!
//! # Design
//! These types describe one HTTP exchange as plain data. The Ollama layer
//! builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network; `HttpClient` is the only thing that turns one into
//! the other over a socket.
//!
//! Headers are `(name, value)` pairs in arrival order. Duplicates are kept as
//! separate entries.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An outgoing HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Append a header, keeping any existing entry with the same name.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// The first `Content-Type` value, if any.
    pub fn content_type(&self) -> Option<&str> {
        find_header(&self.headers, "content-type")
    }
}

/// A parsed HTTP response.
///
/// `status == INVALID_STATUS` marks a response that was never populated. Such
/// a value always has empty headers and body; see [`HttpResponse::invalid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: i32,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub const INVALID_STATUS: i32 = -1;

    pub fn invalid() -> Self {
        Self {
            status: Self::INVALID_STATUS,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status != Self::INVALID_STATUS
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the first header value matching `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Every value recorded for `name`, in arrival order.
    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
