//! HL7 acknowledgment messages
//!
//! Every accepted inbound message is answered with an `ACK`, including
//! messages the pipeline halts early. The acknowledgment swaps sending and
//! receiving application/facility and echoes the inbound control id in MSA-2.

use super::message::{Component, Delimiters, Field, Message, Repetition, Segment};
use super::navigator::{self, FieldPath};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const DEFAULT_PROCESSING_ID: &str = "P";
const DEFAULT_VERSION: &str = "2.6";
const CONTROL_ID_LEN: usize = 20;

/// MSA-1 acknowledgment code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckCode {
    /// AA
    Accept,
    /// AE
    Error,
    /// AR
    Reject,
}

impl AckCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AckCode::Accept => "AA",
            AckCode::Error => "AE",
            AckCode::Reject => "AR",
        }
    }
}

impl fmt::Display for AckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A built acknowledgment message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    code: AckCode,
    acknowledged_control_id: String,
    message: Message,
}

impl Acknowledgment {
    /// `AA` for a message that was received, whatever happened afterwards
    pub fn accept(inbound: &Message) -> Self {
        Self::build(inbound, AckCode::Accept, None)
    }

    /// `AE` for a message that failed while being routed
    pub fn error(inbound: &Message, text: &str) -> Self {
        Self::build(inbound, AckCode::Error, Some(text))
    }

    /// `AR` for input that could not be parsed at all
    ///
    /// Nothing is known about the sender, so MSH-3..6 and MSA-2 are empty.
    pub fn reject_unparsable(text: &str) -> Self {
        let delimiters = Delimiters::default();
        let header = header_fields(
            &delimiters,
            [Field::default(), Field::default(), Field::default(), Field::default()],
            composite(&["ACK"]),
            Field::primitive(DEFAULT_PROCESSING_ID),
            Field::primitive(DEFAULT_VERSION),
        );

        Self {
            code: AckCode::Reject,
            acknowledged_control_id: String::new(),
            message: Message::from_segments(
                vec![header, msa(&delimiters, AckCode::Reject, "", Some(text))],
                delimiters,
            ),
        }
    }

    fn build(inbound: &Message, code: AckCode, text: Option<&str>) -> Self {
        let delimiters = *inbound.delimiters();
        let msh = inbound.segments_named("MSH").next();
        let field = |index: usize| {
            msh.and_then(|s| s.field(index))
                .cloned()
                .unwrap_or_default()
        };
        let value = |path: FieldPath| navigator::get(inbound, &path).ok().flatten();

        let control_id = value(FieldPath::new("MSH", 10)).unwrap_or_default();
        let event = value(FieldPath::new("MSH", 9).component(2)).unwrap_or_default();
        let processing_id = value(FieldPath::new("MSH", 11))
            .map(Field::primitive)
            .unwrap_or_else(|| Field::primitive(DEFAULT_PROCESSING_ID));
        let version = value(FieldPath::new("MSH", 12))
            .map(Field::primitive)
            .unwrap_or_else(|| Field::primitive(DEFAULT_VERSION));

        let message_type = if event.is_empty() {
            composite(&["ACK"])
        } else {
            composite(&["ACK", &event])
        };

        // Receiver becomes sender
        let header = header_fields(
            &delimiters,
            [field(5), field(6), field(3), field(4)],
            message_type,
            processing_id,
            version,
        );

        Self {
            code,
            message: Message::from_segments(
                vec![header, msa(&delimiters, code, &control_id, text)],
                delimiters,
            ),
            acknowledged_control_id: control_id,
        }
    }

    pub fn code(&self) -> AckCode {
        self.code
    }

    /// The inbound MSH-10 echoed in MSA-2
    pub fn acknowledged_control_id(&self) -> &str {
        &self.acknowledged_control_id
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// ER7 encoding of the acknowledgment
    pub fn encode(&self) -> String {
        self.message.encode()
    }
}

fn header_fields(
    d: &Delimiters,
    routing: [Field; 4],
    message_type: Field,
    processing_id: Field,
    version: Field,
) -> Segment {
    let [sending_app, sending_facility, receiving_app, receiving_facility] = routing;
    let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();

    Segment {
        name: "MSH".to_string(),
        fields: vec![
            Field::primitive(d.field.to_string()),
            Field::primitive(d.encoding_characters()),
            sending_app,
            sending_facility,
            receiving_app,
            receiving_facility,
            Field::primitive(timestamp),
            Field::default(),
            message_type,
            Field::primitive(new_control_id()),
            processing_id,
            version,
        ],
    }
}

fn msa(d: &Delimiters, code: AckCode, control_id: &str, text: Option<&str>) -> Segment {
    let mut fields = vec![Field::primitive(code.as_str()), Field::primitive(control_id)];
    if let Some(text) = text {
        fields.push(Field::primitive(escape(text, d)));
    }
    Segment {
        name: "MSA".to_string(),
        fields,
    }
}

fn composite(components: &[&str]) -> Field {
    Field {
        repetitions: vec![Repetition {
            components: components.iter().map(|c| Component::primitive(*c)).collect(),
        }],
    }
}

fn new_control_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(CONTROL_ID_LEN);
    id
}

/// Applies HL7 escape sequences to free text
fn escape(text: &str, d: &Delimiters) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            c if c == d.escape => out.push_str(&format!("{0}E{0}", d.escape)),
            c if c == d.field => out.push_str(&format!("{0}F{0}", d.escape)),
            c if c == d.component => out.push_str(&format!("{0}S{0}", d.escape)),
            c if c == d.repetition => out.push_str(&format!("{0}R{0}", d.escape)),
            c if c == d.subcomponent => out.push_str(&format!("{0}T{0}", d.escape)),
            '\r' | '\n' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}
