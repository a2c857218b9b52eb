//! HL7 v2 message handling
//!
//! - [`message`] - message tree and ER7 parser
//! - [`navigator`] - position-addressed field lookup
//! - [`ack`] - acknowledgment builder

pub mod ack;
pub mod message;
pub mod navigator;

pub use ack::{AckCode, Acknowledgment};
pub use message::{Component, Delimiters, Field, Message, Repetition, Segment};
pub use navigator::FieldPath;
