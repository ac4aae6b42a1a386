//! Internal helpers for input normalization and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

/// Trim and NFC-normalize a required text field.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidArgument(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.nfc().collect())
}

/// Trim recipients and drop blank entries, keeping order and duplicates.
///
/// Deduplication is deliberately NOT performed: the funded prefix must match
/// the list exactly as the caller submitted it.
pub(crate) fn normalize_recipients(recipients: &[String]) -> ResultEngine<Vec<String>> {
    let cleaned: Vec<String> = recipients
        .iter()
        .map(|number| number.trim())
        .filter(|number| !number.is_empty())
        .map(ToString::to_string)
        .collect();

    if cleaned.is_empty() {
        return Err(EngineError::InvalidArgument(
            "at least one recipient required".to_string(),
        ));
    }
    Ok(cleaned)
}
