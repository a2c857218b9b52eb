//! Result type alias for Triage

use super::errors::TriageError;

/// Result type alias for Triage operations
///
/// # Examples
///
/// ```
/// use triage::domain::result::Result;
/// use triage::domain::errors::TriageError;
///
/// fn failing_function() -> Result<()> {
///     Err(TriageError::Pipeline("queue closed".to_string()))
/// }
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, TriageError>;
