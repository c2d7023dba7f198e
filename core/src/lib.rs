//! Plaintext HTTP/1.1 client and Ollama API bindings.
//!
//! # Overview
//! The wire client resolves a host, opens one TCP connection per request,
//! writes the request with `Connection: close`, reads until the server hangs
//! up, and parses the reply. It depends on no HTTP library.
//!
//! # Design
//! - `HttpClient` is stateless apart from its `Endpoint` and `ClientConfig`.
//!   Every call owns its `Connection`, which is closed on every exit path.
//! - Failures are `WireError` values; `*_or_invalid` helpers collapse them to
//!   a response with status -1 where a sentinel is more convenient.
//! - `OllamaClient` builds requests and parses responses without I/O;
//!   `Ollama` pairs it with an `HttpClient`.
//! - No TLS, keep-alive, chunked decoding, redirects, compression, or proxies.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod ollama;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

pub use client::HttpClient;
pub use config::ClientConfig;
pub use endpoint::Endpoint;
pub use error::{ApiError, ErrorKind, WireError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use ollama::{Ollama, OllamaClient};
pub use request::serialize_request;
pub use response::parse_response;
pub use transport::Connection;
pub use types::{ChatResponse, GenerateResponse, Message, Messages, ModelInfo, ModelList, Options};
