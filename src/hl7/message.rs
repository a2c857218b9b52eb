//! HL7 v2 message tree and ER7 parser
//!
//! A message is modeled as an explicit tree of variants:
//! segment → field → repetition → component → subcomponent. Every level is
//! stored positionally so that 1-based HL7 addresses map directly onto
//! vector indices.

use crate::domain::MessageError;
use serde::{Deserialize, Serialize};

/// Encoding characters declared in MSH-1 and MSH-2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

impl Delimiters {
    /// The MSH-2 encoding characters string, e.g. `^~\&`
    pub fn encoding_characters(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }
}

/// A component and its subcomponents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub subcomponents: Vec<String>,
}

impl Component {
    /// A component holding a single primitive value
    pub fn primitive(value: impl Into<String>) -> Self {
        Self {
            subcomponents: vec![value.into()],
        }
    }
}

/// One occurrence of a (possibly repeating) field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repetition {
    pub components: Vec<Component>,
}

/// A field with all of its repetitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub repetitions: Vec<Repetition>,
}

impl Field {
    /// A field with one repetition holding one primitive value
    pub fn primitive(value: impl Into<String>) -> Self {
        Self {
            repetitions: vec![Repetition {
                components: vec![Component::primitive(value)],
            }],
        }
    }

    /// Whether every subcomponent of every repetition is empty
    pub fn is_empty(&self) -> bool {
        self.repetitions.iter().all(|rep| {
            rep.components
                .iter()
                .all(|c| c.subcomponents.iter().all(String::is_empty))
        })
    }
}

/// A named segment; `fields[0]` is field 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Segment {
    /// Field by 1-based index
    pub fn field(&self, index: usize) -> Option<&Field> {
        index.checked_sub(1).and_then(|i| self.fields.get(i))
    }
}

/// A parsed HL7 v2 message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    segments: Vec<Segment>,
    delimiters: Delimiters,
}

impl Message {
    /// Builds a message from already-constructed segments
    pub fn from_segments(segments: Vec<Segment>, delimiters: Delimiters) -> Self {
        Self {
            segments,
            delimiters,
        }
    }

    /// Parses ER7 (pipe-delimited) text
    ///
    /// Segments may be separated by `\r`, `\n` or `\r\n`. The first segment
    /// must be `MSH`; its encoding characters drive the rest of the parse.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Parse`] if the text is empty, does not start
    /// with an MSH segment, or contains a segment with an invalid name.
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        let text = text.trim_start_matches('\u{feff}').trim();
        let mut lines = text
            .split(['\r', '\n'])
            .map(str::trim_end)
            .filter(|line| !line.is_empty());

        let header = lines
            .next()
            .ok_or_else(|| MessageError::Parse("Empty message".to_string()))?;
        let (delimiters, msh) = parse_msh(header)?;

        let mut segments = vec![msh];
        for line in lines {
            segments.push(parse_segment(line, &delimiters)?);
        }

        Ok(Self {
            segments,
            delimiters,
        })
    }

    /// All segments in message order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments with the given name, in message order
    pub fn segments_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments.iter().filter(move |s| s.name == name)
    }

    /// The delimiters declared by this message
    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Re-encodes the tree as ER7 with `\r` segment terminators
    pub fn encode(&self) -> String {
        let d = &self.delimiters;
        let mut out = String::new();
        for segment in &self.segments {
            out.push_str(&segment.name);
            let is_msh = segment.name == "MSH";
            for (i, field) in segment.fields.iter().enumerate() {
                // MSH-1 is the separator itself
                if is_msh && i == 0 {
                    out.push(d.field);
                    continue;
                }
                if !(is_msh && i == 1) {
                    out.push(d.field);
                }
                out.push_str(&encode_field(field, d));
            }
            out.push('\r');
        }
        out
    }
}

fn encode_field(field: &Field, d: &Delimiters) -> String {
    field
        .repetitions
        .iter()
        .map(|rep| {
            rep.components
                .iter()
                .map(|c| c.subcomponents.join(&d.subcomponent.to_string()))
                .collect::<Vec<_>>()
                .join(&d.component.to_string())
        })
        .collect::<Vec<_>>()
        .join(&d.repetition.to_string())
}

fn parse_msh(line: &str) -> Result<(Delimiters, Segment), MessageError> {
    if !line.starts_with("MSH") {
        return Err(MessageError::Parse(
            "First segment must be MSH".to_string(),
        ));
    }

    let mut chars = line.chars().skip(3);
    let field_sep = chars
        .next()
        .ok_or_else(|| MessageError::Parse("MSH segment has no field separator".to_string()))?;

    let encoding: String = chars.take_while(|c| *c != field_sep).collect();
    if encoding.is_empty() {
        return Err(MessageError::Parse(
            "MSH-2 encoding characters are missing".to_string(),
        ));
    }

    let defaults = Delimiters::default();
    let mut enc = encoding.chars();
    let delimiters = Delimiters {
        field: field_sep,
        component: enc.next().unwrap_or(defaults.component),
        repetition: enc.next().unwrap_or(defaults.repetition),
        escape: enc.next().unwrap_or(defaults.escape),
        subcomponent: enc.next().unwrap_or(defaults.subcomponent),
    };

    let mut fields = vec![
        Field::primitive(field_sep.to_string()),
        Field::primitive(encoding.clone()),
    ];

    // Skip "MSH", the separator, the encoding characters and the next separator
    let header_len = 3 + field_sep.len_utf8() + encoding.len();
    let rest = &line[header_len..];
    if let Some(rest) = rest.strip_prefix(field_sep) {
        fields.extend(rest.split(field_sep).map(|raw| parse_field(raw, &delimiters)));
    }

    Ok((
        delimiters,
        Segment {
            name: "MSH".to_string(),
            fields,
        },
    ))
}

fn parse_segment(line: &str, d: &Delimiters) -> Result<Segment, MessageError> {
    let mut parts = line.split(d.field);
    let name = parts.next().unwrap_or_default();
    if !is_valid_segment_name(name) {
        return Err(MessageError::Parse(format!(
            "Invalid segment name '{name}'"
        )));
    }

    Ok(Segment {
        name: name.to_string(),
        fields: parts.map(|raw| parse_field(raw, d)).collect(),
    })
}

fn parse_field(raw: &str, d: &Delimiters) -> Field {
    Field {
        repetitions: raw
            .split(d.repetition)
            .map(|rep| Repetition {
                components: rep
                    .split(d.component)
                    .map(|comp| Component {
                        subcomponents: comp.split(d.subcomponent).map(str::to_string).collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Three upper-case ASCII letters or digits
pub(crate) fn is_valid_segment_name(name: &str) -> bool {
    name.len() == 3
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
