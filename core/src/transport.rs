//! One TCP connection per exchange.
//!
//! `Connection` owns its socket exclusively. Dropping it releases the
//! descriptor, so every early return in the caller closes the socket without
//! extra bookkeeping. `close` exists to make the normal path explicit.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use tracing::{debug, trace};

use crate::endpoint::Endpoint;
use crate::error::WireError;

const READ_CHUNK: usize = 4096;

#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
}

impl Connection {
    /// Resolve `endpoint` and connect to the first address that accepts.
    ///
    /// `read_timeout` is installed before any read; zero means no timeout.
    pub fn connect(endpoint: &Endpoint, read_timeout: Duration) -> Result<Self, WireError> {
        let addrs = endpoint.resolve()?;

        let mut last_err = None;
        let mut stream = None;
        for addr in &addrs {
            match TcpStream::connect(addr) {
                Ok(s) => {
                    debug!(%addr, "connected");
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    trace!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        let Some(stream) = stream else {
            return Err(WireError::Connection {
                endpoint: endpoint.to_string(),
                attempts: addrs.len(),
                source: last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotConnected)),
            });
        };

        let timeout = (!read_timeout.is_zero()).then_some(read_timeout);
        // The stream drops (and closes) here if the option cannot be set.
        stream.set_read_timeout(timeout).map_err(|e| WireError::Connection {
            endpoint: endpoint.to_string(),
            attempts: addrs.len(),
            source: e,
        })?;

        Ok(Self { stream })
    }

    /// Write the whole buffer or fail.
    pub fn send_all(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        self.stream.write_all(bytes).map_err(WireError::Write)?;
        self.stream.flush().map_err(WireError::Write)
    }

    /// Read until the peer closes or the receive timeout fires.
    ///
    /// A timeout is not an error here: whatever arrived so far is returned,
    /// which may be nothing at all.
    pub fn read_until_closed(&mut self, max_size: usize) -> Result<Vec<u8>, WireError> {
        let mut acc = Vec::new();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if acc.len() + n > max_size {
                        return Err(WireError::TooLarge { limit: max_size });
                    }
                    acc.extend_from_slice(&buf[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
                {
                    debug!(received = acc.len(), "read timed out");
                    break;
                }
                Err(e) => return Err(WireError::Read(e)),
            }
        }
        trace!(received = acc.len(), "read complete");
        Ok(acc)
    }

    /// Shut the socket down and release it.
    pub fn close(self) {
        // The peer may already be gone; the descriptor is released by drop either way.
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        trace!("connection closed");
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::error::ErrorKind;

    fn endpoint_for(listener: &TcpListener) -> Endpoint {
        let addr = listener.local_addr().unwrap();
        Endpoint::parse(&addr.ip().to_string(), Some(addr.port()))
    }

    #[test]
    fn send_and_read_until_peer_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = endpoint_for(&listener);
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(b"pong:").unwrap();
            stream.write_all(&buf).unwrap();
        });

        let mut conn = Connection::connect(&endpoint, Duration::from_secs(5)).unwrap();
        conn.send_all(b"hello").unwrap();
        let data = conn.read_until_closed(1024).unwrap();
        conn.close();
        server.join().unwrap();
        assert_eq!(data, b"pong:hello");
    }

    #[test]
    fn refused_connect_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = endpoint_for(&listener);
        drop(listener);

        let err = Connection::connect(&endpoint, Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[test]
    fn oversized_reply_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = endpoint_for(&listener);
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let _ = stream.write_all(&[b'x'; 8192]);
        });

        let mut conn = Connection::connect(&endpoint, Duration::from_secs(5)).unwrap();
        let err = conn.read_until_closed(1000).unwrap_err();
        assert!(matches!(err, WireError::TooLarge { limit: 1000 }));
        drop(conn);
        server.join().unwrap();
    }

    #[test]
    fn timeout_returns_partial_data() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = endpoint_for(&listener);
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"partial").unwrap();
            // Hold the connection open until the client has given up.
            let _ = done_rx.recv();
        });

        let mut conn = Connection::connect(&endpoint, Duration::from_millis(200)).unwrap();
        let data = conn.read_until_closed(1024).unwrap();
        assert_eq!(data, b"partial");
        conn.close();
        done_tx.send(()).unwrap();
        server.join().unwrap();
    }
}
