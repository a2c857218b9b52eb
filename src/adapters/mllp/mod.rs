//! Minimal Lower Layer Protocol transport
//!
//! Inbound HL7 arrives over TCP wrapped in MLLP blocks. Each block is
//! answered with a framed acknowledgment on the same connection.

pub mod codec;
pub mod listener;

pub use codec::{encode_frame, FrameDecoder};
pub use listener::{respond, MllpListener};
