//! HTTP response rendering.
//!
//! # Responsibilities
//! - Hold status, ordered headers and body produced by a handler
//! - Render raw HTTP/1.1 bytes for the socket binding (the proxy forwards them verbatim)
//! - Provide the status line and header list the gateway binding reports
//!
//! # Design Decisions
//! - Header order is preserved as the handler wrote it
//! - `Content-Length` is added on render when the handler did not set one

use bytes::{BufMut, Bytes, BytesMut};

/// A complete HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub status_msg: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status_code: u16, status_msg: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status_code,
            status_msg: status_msg.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// `200 OK` with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, "OK", body)
    }

    /// Append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// `"<code> <message>"`, as the gateway protocol expects it.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.status_code, self.status_msg)
    }

    /// Render the full response as it goes on the wire.
    pub fn render(&self) -> Bytes {
        let mut head = format!("HTTP/1.1 {}\r\n", self.status_line());
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        let has_length = self
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-length"));
        if !has_length {
            head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        head.push_str("\r\n");

        let mut buf = BytesMut::with_capacity(head.len() + self.body.len());
        buf.put_slice(head.as_bytes());
        buf.put_slice(&self.body);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_status_headers_and_body() {
        let resp = HttpResponse::ok("hello").with_header("Content-Type", "text/plain");
        assert_eq!(
            resp.render(),
            Bytes::from_static(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello")
        );
    }

    #[test]
    fn explicit_content_length_is_kept() {
        let resp = HttpResponse::new(101, "Switching Protocols", "").with_header("content-length", "0");
        let rendered = resp.render();
        let text = std::str::from_utf8(&rendered).unwrap();
        assert_eq!(text.matches("ength").count(), 1);
        assert!(text.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
    }

    #[test]
    fn status_line_format() {
        assert_eq!(HttpResponse::new(404, "Not Found", "").status_line(), "404 Not Found");
    }
}
