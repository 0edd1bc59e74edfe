//! Request model shared by both bindings.
//!
//! # Responsibilities
//! - Parse raw proxy messages into a `Request`
//! - Convert gateway (HTTP) requests into the same shape
//! - Recognize proxy disconnect notifications
//!
//! # Wire Format
//! ```text
//! <sender> <conn_id> <path> <len>:<headers json>,<len>:<body>,
//! ```
//! Header values arrive as JSON; non-string values are kept in their JSON text form.

use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Fields `from_gateway` fills in itself; client headers with these names are dropped.
const GATEWAY_FIELDS: &[&str] = &["METHOD", "PATH", "URI", "QUERY"];

/// A malformed inbound message or gateway request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A space-delimited prefix field is missing.
    #[error("missing {0} field")]
    MissingField(&'static str),

    /// A prefix field is not valid UTF-8.
    #[error("{0} field is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// A netstring is malformed.
    #[error("bad netstring: {0}")]
    Netstring(&'static str),

    /// The header block is not a JSON object.
    #[error("invalid header block: {0}")]
    Headers(String),

    /// A gateway header value is not valid UTF-8.
    #[error("header '{0}' is not valid UTF-8")]
    InvalidHeader(String),
}

/// A normalized inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Request {
    /// Identity of the proxy that delivered the request.
    pub sender: String,
    /// Downstream client connection id (space-joined for bulk messages).
    pub conn_id: String,
    /// Request path.
    pub path: String,
    /// Method (`GET`, `JSON`, `WEBSOCKET`, ...).
    pub method: String,
    /// Header map as delivered by the transport.
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Bytes,
}

impl Request {
    /// Parse a raw message read from the inbound socket.
    pub fn parse_msg(raw: &[u8]) -> Result<Self, ParseError> {
        let (sender, rest) = split_token(raw, "sender")?;
        let (conn_id, rest) = split_token(rest, "connection id")?;
        let (path, rest) = split_token(rest, "path")?;
        let (header_block, rest) = parse_netstring(rest)?;
        let (body, _) = parse_netstring(rest)?;

        let headers = parse_headers(header_block)?;
        let method = headers.get("METHOD").cloned().unwrap_or_default();

        Ok(Self {
            sender,
            conn_id,
            path,
            method,
            headers,
            body: Bytes::copy_from_slice(body),
        })
    }

    /// Convert a gateway request.
    ///
    /// Sender and connection id are empty: the gateway answers inline and never routes
    /// replies through a proxy. `METHOD`, `PATH`, `URI` and `QUERY` are filled in the way
    /// the proxy would fill them.
    pub fn from_gateway(environ: axum::http::Request<Bytes>) -> Result<Self, ParseError> {
        let (parts, body) = environ.into_parts();

        let mut headers = HashMap::with_capacity(parts.headers.len() + 4);
        for (name, value) in parts.headers.iter() {
            if GATEWAY_FIELDS
                .iter()
                .any(|field| field.eq_ignore_ascii_case(name.as_str()))
            {
                tracing::debug!(header = %name, "Dropping client header shadowing a request field");
                continue;
            }
            let value = value
                .to_str()
                .map_err(|_| ParseError::InvalidHeader(name.as_str().to_string()))?;
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let method = parts.method.as_str().to_string();
        let path = parts.uri.path().to_string();
        headers.insert("METHOD".into(), method.clone());
        headers.insert("PATH".into(), path.clone());
        headers.insert("URI".into(), parts.uri.to_string());
        if let Some(query) = parts.uri.query() {
            headers.insert("QUERY".into(), query.to_string());
        }

        Ok(Self {
            sender: String::new(),
            conn_id: String::new(),
            path,
            method,
            headers,
            body,
        })
    }

    /// True for the proxy's notification that a client went away.
    pub fn is_disconnect(&self) -> bool {
        if self.method != "JSON" {
            return false;
        }
        serde_json::from_slice::<Value>(&self.body)
            .ok()
            .and_then(|v| v.get("type").and_then(Value::as_str).map(|t| t == "disconnect"))
            .unwrap_or(false)
    }

    /// Header lookup. An exact-case match wins; otherwise the case-insensitive match with the
    /// lowest key is returned, so the result never depends on map order.
    pub fn header(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.headers.get(name) {
            return Some(value.as_str());
        }
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, v)| v.as_str())
    }

    /// Client address as forwarded by the proxy.
    pub fn remote_addr(&self) -> Option<&str> {
        self.header("x-forwarded-for")
    }
}

fn split_token<'a>(input: &'a [u8], field: &'static str) -> Result<(String, &'a [u8]), ParseError> {
    let pos = input
        .iter()
        .position(|&b| b == b' ')
        .ok_or(ParseError::MissingField(field))?;
    let token = std::str::from_utf8(&input[..pos]).map_err(|_| ParseError::InvalidUtf8(field))?;
    Ok((token.to_string(), &input[pos + 1..]))
}

fn parse_netstring(input: &[u8]) -> Result<(&[u8], &[u8]), ParseError> {
    let colon = input
        .iter()
        .position(|&b| b == b':')
        .ok_or(ParseError::Netstring("missing length separator"))?;
    let len: usize = std::str::from_utf8(&input[..colon])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(ParseError::Netstring("invalid length"))?;

    let start = colon + 1;
    let end = start
        .checked_add(len)
        .filter(|&end| end < input.len())
        .ok_or(ParseError::Netstring("truncated payload"))?;
    if input[end] != b',' {
        return Err(ParseError::Netstring("missing terminator"));
    }
    Ok((&input[start..end], &input[end + 1..]))
}

fn parse_headers(block: &[u8]) -> Result<HashMap<String, String>, ParseError> {
    let map: serde_json::Map<String, Value> =
        serde_json::from_slice(block).map_err(|e| ParseError::Headers(e.to_string()))?;
    Ok(map
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect())
}
