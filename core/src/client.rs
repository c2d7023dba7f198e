//! Blocking HTTP/1.1 client.
//!
//! # Design
//! `HttpClient` holds only an `Endpoint` and a `ClientConfig`. Every call
//! opens its own `Connection`, sends one request with `Connection: close`,
//! reads until the server hangs up, and parses what arrived. Nothing is
//! shared between calls, so a client can be cloned onto other threads freely.
//!
//! Failures come back as `WireError`. The `*_or_invalid` variants collapse
//! them into a response with status -1 for callers that only care whether a
//! usable reply exists.

use tracing::{debug_span, info, trace, warn};

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::WireError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::serialize_request;
use crate::response::parse_response;
use crate::transport::Connection;

#[derive(Debug, Clone)]
pub struct HttpClient {
    endpoint: Endpoint,
    config: ClientConfig,
}

impl HttpClient {
    /// `specifier` is `host` or `host:port`; a port set in `config` wins.
    pub fn new(specifier: &str, config: ClientConfig) -> Self {
        Self {
            endpoint: Endpoint::parse(specifier, config.port),
            config,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get(&self, path: &str) -> Result<HttpResponse, WireError> {
        self.send(HttpRequest::new(HttpMethod::Get, path))
    }

    pub fn post(
        &self,
        path: &str,
        body: impl Into<Vec<u8>>,
        content_type: &str,
    ) -> Result<HttpResponse, WireError> {
        self.send(
            HttpRequest::new(HttpMethod::Post, path)
                .header("Content-Type", content_type)
                .body(body),
        )
    }

    /// Run one full exchange on a fresh connection.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse, WireError> {
        let span = debug_span!("http", method = request.method.as_str(), path = %request.path);
        let _enter = span.enter();

        if self.config.log_requests {
            info!(
                endpoint = %self.endpoint,
                method = %request.method.as_str(),
                path = %request.path,
                body = %String::from_utf8_lossy(&request.body),
                "sending request"
            );
        }

        trace!("connecting");
        let mut conn = Connection::connect(&self.endpoint, self.config.read_timeout)?;

        trace!("sending");
        let bytes = serialize_request(&self.endpoint.host_header(), &request);
        conn.send_all(&bytes)?;

        trace!("receiving");
        let raw = conn.read_until_closed(self.config.max_response_size)?;
        conn.close();

        trace!(bytes = raw.len(), "parsing");
        let response = parse_response(&raw)?;

        if self.config.log_replies {
            info!(status = response.status, body = %response.text(), "received reply");
        }
        Ok(response)
    }

    /// Like [`HttpClient::get`], reporting failure as status -1.
    pub fn get_or_invalid(&self, path: &str) -> HttpResponse {
        collapse(self.get(path))
    }

    /// Like [`HttpClient::post`], reporting failure as status -1.
    pub fn post_or_invalid(
        &self,
        path: &str,
        body: impl Into<Vec<u8>>,
        content_type: &str,
    ) -> HttpResponse {
        collapse(self.post(path, body, content_type))
    }

    /// GET `path` and compare the body against `expected_body`.
    pub fn is_running(&self, path: &str, expected_body: &str) -> bool {
        match self.get(path) {
            Ok(res) => res.body == expected_body.as_bytes(),
            Err(e) => {
                trace!(error = %e, "liveness check failed");
                false
            }
        }
    }
}

fn collapse(result: Result<HttpResponse, WireError>) -> HttpResponse {
    result.unwrap_or_else(|e| {
        warn!(error = %e, kind = ?e.kind(), "request failed");
        HttpResponse::invalid()
    })
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::error::ErrorKind;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Accept one connection, capture the request head, reply with `reply`.
    fn one_shot_server(reply: &'static [u8]) -> (String, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            stream.write_all(reply).unwrap();
            received
        });
        (addr, handle)
    }

    fn config() -> ClientConfig {
        ClientConfig::default().read_timeout(Duration::from_secs(5))
    }

    #[test]
    fn get_round_trip() {
        let (addr, server) =
            one_shot_server(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello");
        let client = HttpClient::new(&addr, config());
        let res = client.get("/status").unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(res.header("content-type"), Some("text/plain"));
        assert_eq!(res.body, b"hello");

        let head = String::from_utf8(server.join().unwrap()).unwrap();
        assert!(head.starts_with("GET /status HTTP/1.1\r\n"));
        assert!(head.contains(&format!("Host: {addr}\r\n")));
        assert!(head.contains("Connection: close\r\n"));
    }

    #[test]
    fn silent_open_peer_times_out_as_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        // Hold each connection open without replying until the client hangs up.
        let server = thread::spawn(move || {
            for _ in 0..2 {
                let (mut stream, _) = listener.accept().unwrap();
                let mut buf = [0u8; 1024];
                while matches!(stream.read(&mut buf), Ok(n) if n > 0) {}
            }
        });

        let client = HttpClient::new(
            &addr,
            ClientConfig::default().read_timeout(Duration::from_millis(200)),
        );
        assert_eq!(client.get("/").unwrap_err().kind(), ErrorKind::ConnectionClosed);
        assert_eq!(client.get_or_invalid("/"), HttpResponse::invalid());
        server.join().unwrap();
    }

    #[test]
    fn request_log_names_method_and_path() {
        let (addr, server) = one_shot_server(b"HTTP/1.1 204 No Content\r\n\r\n");
        let client = HttpClient::new(&addr, config().log_requests(true));
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();

        let res = tracing::subscriber::with_default(subscriber, || {
            client.post("/api/chat", "{}", "application/json")
        });
        assert_eq!(res.unwrap().status, 204);
        server.join().unwrap();

        let logs = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        let line = logs.lines().find(|l| l.contains("sending request")).unwrap();
        let fields = line.split("sending request").nth(1).unwrap();
        assert!(fields.contains("method=POST"), "{line}");
        assert!(fields.contains("path=/api/chat"), "{line}");
        assert!(fields.contains("body={}"), "{line}");
    }

    #[test]
    fn malformed_reply_is_reported() {
        let (addr, server) = one_shot_server(b"not http at all");
        let client = HttpClient::new(&addr, config());
        let err = client.get("/").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        server.join().unwrap();
    }

    #[test]
    fn sentinel_on_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = HttpClient::new(&addr, config());
        let res = client.get_or_invalid("/");
        assert_eq!(res, HttpResponse::invalid());
        assert!(!client.is_running("/", "Ollama is running"));
    }

    #[test]
    fn is_running_compares_body() {
        let (addr, server) = one_shot_server(b"HTTP/1.1 200 OK\r\n\r\nOllama is running");
        let client = HttpClient::new(&addr, config());
        assert!(client.is_running("/", "Ollama is running"));
        server.join().unwrap();
    }

    #[test]
    fn explicit_port_overrides_specifier() {
        let client = HttpClient::new("localhost:1", ClientConfig::default().port(11434));
        assert_eq!(client.endpoint().host(), "localhost");
        assert_eq!(client.endpoint().port(), 11434);
    }
}
