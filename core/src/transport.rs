//! The I/O seam between the router and the network.
//!
//! # Design
//! A `Transport` executes one `HttpRequest` against one absolute URL and
//! reports either a response (any status) or a `TransportError`. Status codes
//! are never turned into errors here; classifying a response as success or
//! application failure is the router's job.

use std::io;
use std::time::Duration;

use ureq::typestate::{WithBody, WithoutBody};
use ureq::RequestBuilder;

use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes requests against absolute URLs.
///
/// Implementations must be shareable across threads: the router hands the
/// transport to detached mirror threads.
pub trait Transport: Send + Sync {
    fn execute(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// `None` leaves requests without a global deadline.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match request.method {
            HttpMethod::Get => send_without_body(self.agent.get(url), request),
            HttpMethod::Delete => send_without_body(self.agent.delete(url), request),
            HttpMethod::Post => send_with_body(self.agent.post(url), request),
            HttpMethod::Put => send_with_body(self.agent.put(url), request),
            HttpMethod::Patch => send_with_body(self.agent.patch(url), request),
        };
        let mut response = result.map_err(|e| classify(url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // The status line has arrived, so only a broken connection while
        // reading counts as a transport failure. Bodies are opaque: no size
        // cap, and bytes that are not UTF-8 are replaced rather than rejected.
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| classify(url, e))?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

type UreqResult = Result<ureq::http::Response<ureq::Body>, ureq::Error>;

fn send_without_body(mut builder: RequestBuilder<WithoutBody>, request: &HttpRequest) -> UreqResult {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match &request.body {
        Some(body) => builder.force_send_body().send(body.as_bytes()),
        None => builder.call(),
    }
}

fn send_with_body(mut builder: RequestBuilder<WithBody>, request: &HttpRequest) -> UreqResult {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match &request.body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn classify(url: &str, error: ureq::Error) -> TransportError {
    let kind = match &error {
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::HostNotFound => TransportErrorKind::Dns,
        ureq::Error::ConnectionFailed => TransportErrorKind::Connect,
        ureq::Error::Io(e) => io_kind(e),
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, url, error.to_string())
}

fn io_kind(error: &io::Error) -> TransportErrorKind {
    match error.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected => TransportErrorKind::Connect,
        io::ErrorKind::TimedOut => TransportErrorKind::Timeout,
        _ => TransportErrorKind::Io,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_connection_is_a_connect_failure() {
        let err = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(io_kind(&err), TransportErrorKind::Connect);
    }

    #[test]
    fn timed_out_io_is_a_timeout() {
        let err = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(io_kind(&err), TransportErrorKind::Timeout);
    }

    #[test]
    fn classify_keeps_url() {
        let err = classify("http://127.0.0.1:1/tasks", ureq::Error::HostNotFound);
        assert_eq!(err.kind, TransportErrorKind::Dns);
        assert_eq!(err.url, "http://127.0.0.1:1/tasks");
    }

    /// Serve one canned raw HTTP response on a random port.
    fn serve_raw_once(head: &'static str, body: &'static [u8]) -> std::net::SocketAddr {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
        });
        addr
    }

    #[test]
    fn non_utf8_error_body_is_still_a_response() {
        let addr = serve_raw_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 2\r\nConnection: close\r\n\r\n",
            &[0xff, 0xfe],
        );
        let transport = UreqTransport::with_timeout(Some(Duration::from_secs(5)));

        let response = transport
            .execute(&format!("http://{addr}/tasks"), &HttpRequest::new(HttpMethod::Get, "/tasks"))
            .unwrap();

        assert_eq!(response.status, 500);
        assert_eq!(response.body, "\u{fffd}\u{fffd}");
    }

    #[test]
    fn unreachable_port_yields_transport_error() {
        // Bind then drop so the port is known to be closed.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let transport = UreqTransport::with_timeout(Some(Duration::from_secs(5)));
        let request = HttpRequest::new(HttpMethod::Get, "/tasks");

        let err = transport
            .execute(&format!("http://{addr}/tasks"), &request)
            .unwrap_err();
        assert!(err.url.ends_with("/tasks"));
    }
}
