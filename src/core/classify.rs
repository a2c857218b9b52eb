//! Message type classification

use crate::domain::MessageError;
use crate::hl7::{navigator, FieldPath, Message};

/// Derives the `category^event` key from MSH-9
///
/// # Examples
///
/// ```
/// use triage::core::classify::MessageClassifier;
/// use triage::hl7::Message;
///
/// let message = Message::parse("MSH|^~\\&|A|MDA|||||ADT^A01|1|P|2.6").unwrap();
/// assert_eq!(MessageClassifier::classify(&message).unwrap(), "ADT^A01");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageClassifier;

impl MessageClassifier {
    /// Reads MSH-9[0].1 and MSH-9[0].2
    ///
    /// Missing components become empty slots, so a message without MSH-9
    /// classifies as `"^"`.
    pub fn classify(message: &Message) -> Result<String, MessageError> {
        let category = navigator::get(message, &FieldPath::new("MSH", 9).component(1))?;
        let event = navigator::get(message, &FieldPath::new("MSH", 9).component(2))?;

        Ok(format!(
            "{}^{}",
            category.unwrap_or_default(),
            event.unwrap_or_default()
        ))
    }
}
