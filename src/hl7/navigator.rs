//! Position-addressed field navigation
//!
//! HL7 addresses are written `SEG-field[repetition].component.subcomponent`.
//! Fields, components and subcomponents are 1-based; repetitions are 0-based.
//! Anything that is simply not present navigates to `None`.

use super::message::{is_valid_segment_name, Message};
use crate::domain::MessageError;
use std::fmt;

/// Address of a primitive value inside a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segment: String,
    field: usize,
    repetition: usize,
    component: usize,
    subcomponent: usize,
}

impl FieldPath {
    /// Addresses `segment-field[0].1.1`
    pub fn new(segment: impl Into<String>, field: usize) -> Self {
        Self {
            segment: segment.into(),
            field,
            repetition: 0,
            component: 1,
            subcomponent: 1,
        }
    }

    /// Sets the 0-based repetition index
    pub fn repetition(mut self, repetition: usize) -> Self {
        self.repetition = repetition;
        self
    }

    /// Sets the 1-based component index
    pub fn component(mut self, component: usize) -> Self {
        self.component = component;
        self
    }

    /// Sets the 1-based subcomponent index
    pub fn subcomponent(mut self, subcomponent: usize) -> Self {
        self.subcomponent = subcomponent;
        self
    }

    fn validate(&self) -> Result<(), MessageError> {
        if !is_valid_segment_name(&self.segment) {
            return Err(MessageError::Malformed(format!(
                "'{}' is not a segment name",
                self.segment
            )));
        }
        if self.field == 0 || self.component == 0 || self.subcomponent == 0 {
            return Err(MessageError::Malformed(format!(
                "{self} uses a zero field, component or subcomponent index"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}[{}].{}.{}",
            self.segment, self.field, self.repetition, self.component, self.subcomponent
        )
    }
}

/// Reads the primitive at `path`
///
/// Segment occurrences are scanned in message order and the first non-empty
/// value wins.
///
/// # Errors
///
/// Returns [`MessageError::Malformed`] if the path itself cannot address a
/// message (bad segment name, zero index).
///
/// # Examples
///
/// ```
/// use triage::hl7::{navigator, FieldPath, Message};
///
/// let message = Message::parse("MSH|^~\\&|APP|MDA|||||ADT^A01|1|P|2.6").unwrap();
/// let facility = navigator::get(&message, &FieldPath::new("MSH", 4)).unwrap();
/// assert_eq!(facility.as_deref(), Some("MDA"));
/// ```
pub fn get(message: &Message, path: &FieldPath) -> Result<Option<String>, MessageError> {
    path.validate()?;

    let value = message
        .segments_named(&path.segment)
        .filter_map(|segment| {
            segment
                .field(path.field)?
                .repetitions
                .get(path.repetition)?
                .components
                .get(path.component - 1)?
                .subcomponents
                .get(path.subcomponent - 1)
        })
        .find(|value| !value.is_empty())
        .cloned();

    Ok(value)
}

/// Number of repetitions of `segment-field` in the first segment occurrence
/// that carries a non-empty value for it
///
/// # Errors
///
/// Returns [`MessageError::Malformed`] for an invalid segment name or a zero
/// field index.
pub fn repetition_count(
    message: &Message,
    segment: &str,
    field: usize,
) -> Result<usize, MessageError> {
    FieldPath::new(segment, field).validate()?;

    Ok(message
        .segments_named(segment)
        .filter_map(|s| s.field(field))
        .find(|f| !f.is_empty())
        .map(|f| f.repetitions.len())
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIT: &str = "MSH|^~\\&|EPIC|MDA|TRIAGE|RONIN|20210708120000||ADT^A01|MSG00001|P|2.6\r\
PID|1|P100^^^MDA^PI|MRN123^^^MDA^MR~A77&X^^^MDA^AN||DOE^JANE\r\
PID|2|||||";

    fn message() -> Message {
        Message::parse(ADMIT).unwrap()
    }

    #[test]
    fn test_get_component() {
        let m = message();
        let value = get(&m, &FieldPath::new("MSH", 9).component(2)).unwrap();
        assert_eq!(value.as_deref(), Some("A01"));
    }

    #[test]
    fn test_get_repetition_and_subcomponent() {
        let m = message();
        let path = FieldPath::new("PID", 3).repetition(1).subcomponent(2);
        assert_eq!(get(&m, &path).unwrap().as_deref(), Some("X"));
    }

    #[test]
    fn test_absent_positions_are_none() {
        let m = message();
        assert_eq!(get(&m, &FieldPath::new("NK1", 2)).unwrap(), None);
        assert_eq!(get(&m, &FieldPath::new("PID", 40)).unwrap(), None);
        assert_eq!(get(&m, &FieldPath::new("PID", 3).repetition(5)).unwrap(), None);
        assert_eq!(get(&m, &FieldPath::new("PID", 3).component(9)).unwrap(), None);
        // empty primitive
        assert_eq!(get(&m, &FieldPath::new("MSH", 8)).unwrap(), None);
    }

    #[test]
    fn test_first_non_empty_occurrence_wins() {
        let text = "MSH|^~\\&|A|B\rPID|1||\rPID|2||SECOND^^^X^MR";
        let m = Message::parse(text).unwrap();
        let value = get(&m, &FieldPath::new("PID", 3)).unwrap();
        assert_eq!(value.as_deref(), Some("SECOND"));
    }

    #[test]
    fn test_malformed_paths() {
        let m = message();
        assert!(matches!(
            get(&m, &FieldPath::new("PID", 0)),
            Err(MessageError::Malformed(_))
        ));
        assert!(matches!(
            get(&m, &FieldPath::new("PID", 3).component(0)),
            Err(MessageError::Malformed(_))
        ));
        assert!(matches!(
            get(&m, &FieldPath::new("pid", 3)),
            Err(MessageError::Malformed(_))
        ));
    }

    #[test]
    fn test_repetition_count() {
        let m = message();
        assert_eq!(repetition_count(&m, "PID", 3).unwrap(), 2);
        assert_eq!(repetition_count(&m, "PID", 4).unwrap(), 0);
        assert_eq!(repetition_count(&m, "ZZZ", 1).unwrap(), 0);
    }

    #[test]
    fn test_path_display() {
        let path = FieldPath::new("PID", 3).repetition(1).component(5);
        assert_eq!(path.to_string(), "PID-3[1].5.1");
    }

    #[test]
    fn test_get_is_pure() {
        let m = message();
        let path = FieldPath::new("MSH", 4);
        assert_eq!(get(&m, &path).unwrap(), get(&m, &path).unwrap());
    }
}
