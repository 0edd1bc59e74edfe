//! Request, response and framing models.
//!
//! # Data Flow
//! ```text
//! raw proxy message / gateway request
//!     → request.rs (normalize into Request)
//!     → [Application routes to a Handler]
//!     → response.rs (HttpResponse rendered for the originating transport)
//!     → websocket.rs (frames for upgraded connections)
//! ```

pub mod request;
pub mod response;
pub mod websocket;

pub use request::{ParseError, Request};
pub use response::HttpResponse;
pub use websocket::{encode_frame, CodecError, EchoHandler, FrameHeader, Opcode};
