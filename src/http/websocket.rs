//! WebSocket framing for upgraded connections.
//!
//! # Responsibilities
//! - Encode outbound frames (header + unmasked payload)
//! - Decode the frame flags the proxy reports for inbound frames
//! - Answer the upgrade handshake
//! - Echo handler used by the demo binary
//!
//! # Data Flow
//! ```text
//! Client ──frames──▶ Proxy ──WEBSOCKET msg (FLAGS header + payload)──▶ EchoHandler
//! Client ◀─frames─── Proxy ◀──envelope(encode_frame(..))────────────── EchoHandler
//! ```
//!
//! # Frame Header
//! ```text
//! byte 0: 1 rrr oooo   (bit 7 always set, rsvd bits 4-6, opcode bits 0-3)
//! byte 1: length       (<126 literal, 126 = 16-bit follows, 127 = 64-bit follows)
//! ```
//!
//! # Design Decisions
//! - Bit 7 of byte 0 is set on every encoded frame; fragmentation is not modelled
//! - Extended lengths are big-endian
//! - Unknown opcodes are a value (`CodecError::UnsupportedOpcode`), never a panic

use bytes::{BufMut, Bytes, BytesMut};
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::connection::{Handler, HandlerResult, Reply};
use crate::http::{HttpResponse, Request};

/// Frame opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl Opcode {
    /// Wire value of this opcode.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Opcode::Continuation),
            0x1 => Ok(Opcode::Text),
            0x2 => Ok(Opcode::Binary),
            0x8 => Ok(Opcode::Close),
            0x9 => Ok(Opcode::Ping),
            0xA => Ok(Opcode::Pong),
            other => Err(CodecError::UnsupportedOpcode(other)),
        }
    }
}

/// Frame codec failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The opcode has no defined meaning.
    #[error("unsupported opcode {0:#x}")]
    UnsupportedOpcode(u8),

    /// The proxy's FLAGS header is not a hex byte.
    #[error("invalid frame flags '{0}'")]
    InvalidFlags(String),

    /// Not enough bytes for the frame header.
    #[error("frame header truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
}

/// Decoded first header byte of an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub fin: bool,
    /// Reserved bits, left in place (`byte & 0x70`).
    pub rsvd: u8,
    pub opcode: Opcode,
}

impl FrameHeader {
    /// Decode the first header byte.
    pub fn from_byte(byte: u8) -> Result<Self, CodecError> {
        Ok(Self {
            fin: byte & 0x80 == 0x80,
            rsvd: byte & 0x70,
            opcode: Opcode::try_from(byte & 0x0f)?,
        })
    }

    /// Decode the hex `FLAGS` header the proxy attaches to WebSocket messages
    /// (`"0x81"` or `"81"`).
    pub fn from_flags(flags: &str) -> Result<Self, CodecError> {
        let trimmed = flags.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let byte = u8::from_str_radix(digits, 16)
            .map_err(|_| CodecError::InvalidFlags(flags.to_string()))?;
        Self::from_byte(byte)
    }
}

/// Encode `payload` as a single frame.
pub fn encode_frame(payload: &[u8], opcode: Opcode, rsvd: u8) -> Bytes {
    let real_length = payload.len() as u64;
    let mut buf = BytesMut::with_capacity(payload.len() + 10);

    buf.put_u8(0x80 | opcode.as_u8() | ((rsvd & 0x07) << 4));

    let length_byte: u8 = if real_length < 126 {
        real_length as u8
    } else if real_length < (1 << 16) {
        126
    } else {
        127
    };
    buf.put_u8(length_byte);

    if length_byte == 127 {
        for shift in [56u32, 48, 40, 32, 24, 16] {
            buf.put_u8((real_length >> shift & 0xff) as u8);
        }
    }
    if length_byte == 126 || length_byte == 127 {
        buf.put_u8((real_length >> 8 & 0xff) as u8);
        buf.put_u8((real_length & 0xff) as u8);
    }

    buf.put_slice(payload);
    buf.freeze()
}

/// Read the payload length of an encoded frame.
///
/// Returns the length and the size of the header that precedes the payload.
pub fn decode_length(frame: &[u8]) -> Result<(u64, usize), CodecError> {
    let truncated = |needed: usize| CodecError::Truncated {
        needed,
        available: frame.len(),
    };
    if frame.len() < 2 {
        return Err(truncated(2));
    }
    match frame[1] & 0x7f {
        126 => {
            let ext = frame.get(2..4).ok_or_else(|| truncated(4))?;
            Ok((u16::from_be_bytes([ext[0], ext[1]]) as u64, 4))
        }
        127 => {
            let ext = frame.get(2..10).ok_or_else(|| truncated(10))?;
            let mut be = [0u8; 8];
            be.copy_from_slice(ext);
            Ok((u64::from_be_bytes(be), 10))
        }
        len => Ok((len as u64, 2)),
    }
}

/// Response completing the upgrade handshake.
///
/// The proxy has already computed the accept key and passes it as the request body.
pub fn handshake(request: &Request) -> HttpResponse {
    HttpResponse::new(101, "Switching Protocols", "")
        .with_header("Content-Type", "text/plain")
        .with_header("Upgrade", "websocket")
        .with_header("Connection", "Upgrade")
        .with_header(
            "Sec-WebSocket-Accept",
            String::from_utf8_lossy(&request.body).into_owned(),
        )
}

/// Echo server over upgraded connections; plain requests get their body back.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl EchoHandler {
    /// Produce the reply for one request; `None` sends nothing.
    pub fn respond(&self, request: &Request) -> Option<Reply> {
        match request.method.as_str() {
            "WEBSOCKET_HANDSHAKE" => {
                tracing::info!(
                    status = 101,
                    method = %request.method,
                    path = %request.path,
                    remote_addr = request.remote_addr().unwrap_or("-"),
                    "WebSocket handshake"
                );
                Some(Reply::Http(handshake(request)))
            }
            "WEBSOCKET" => self.frame_reply(request),
            _ => Some(Reply::Http(
                HttpResponse::ok(request.body.clone()).with_header("Content-Type", "text/plain"),
            )),
        }
    }

    fn frame_reply(&self, request: &Request) -> Option<Reply> {
        let flags = request.header("FLAGS").unwrap_or("");
        let header = match FrameHeader::from_flags(flags) {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!(conn_id = %request.conn_id, error = %e, "Closing WebSocket connection");
                return Some(Reply::Raw(Bytes::new()));
            }
        };

        tracing::debug!(
            opcode = header.opcode.as_u8(),
            fin = header.fin,
            path = %request.path,
            "WebSocket frame"
        );

        match header.opcode {
            Opcode::Close => Some(Reply::Raw(encode_frame(b"", Opcode::Close, 0))),
            Opcode::Ping => Some(Reply::Raw(encode_frame(&request.body, Opcode::Pong, 0))),
            Opcode::Text => match std::str::from_utf8(&request.body) {
                Ok(text) => Some(Reply::Raw(encode_frame(text.as_bytes(), Opcode::Text, 0))),
                Err(_) => {
                    tracing::warn!(conn_id = %request.conn_id, "Text frame is not UTF-8, closing");
                    Some(Reply::Raw(encode_frame(b"", Opcode::Close, 0)))
                }
            },
            Opcode::Binary => Some(Reply::Raw(encode_frame(&request.body, Opcode::Binary, 0))),
            Opcode::Pong => None,
            Opcode::Continuation => {
                tracing::warn!(conn_id = %request.conn_id, "Fragmented frames not supported, closing");
                Some(Reply::Raw(Bytes::new()))
            }
        }
    }
}

impl Handler for EchoHandler {
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerResult> {
        let reply = self.respond(&request);
        Box::pin(async move { Ok(reply) })
    }
}
