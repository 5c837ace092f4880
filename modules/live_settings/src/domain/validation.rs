//! Key and stored-value validation

use crate::contract::SettingsError;

/// Maximum length of a group or value key
pub const MAX_KEY_LENGTH: usize = 100;

/// Separator used by the settings editor between group and value keys
pub const FIELD_SEPARATOR: &str = "__";

/// Validate a group or value key
///
/// Accepts non-empty keys up to [`MAX_KEY_LENGTH`] characters, made of alphanumerics,
/// `_`, `-` and `.`, that do not contain the editor field separator `__`.
pub fn validate_key(kind: &str, key: &str) -> Result<(), SettingsError> {
    if key.is_empty() {
        return Err(SettingsError::Validation {
            message: format!("{} key cannot be empty", kind),
        });
    }

    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(SettingsError::Validation {
            message: format!(
                "{} key '{}' is longer than {} characters",
                kind, key, MAX_KEY_LENGTH
            ),
        });
    }

    let is_valid = key
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.');
    if !is_valid {
        return Err(SettingsError::Validation {
            message: format!(
                "{} key '{}' contains invalid characters. Only alphanumeric, '_', '-', and '.' are allowed",
                kind, key
            ),
        });
    }

    if key.contains(FIELD_SEPARATOR) {
        return Err(SettingsError::Validation {
            message: format!("{} key '{}' must not contain '{}'", kind, key, FIELD_SEPARATOR),
        });
    }

    Ok(())
}

/// Validate that a stored value fits the bounded table
pub fn validate_bounded_length(
    identity: &str,
    stored: &str,
    max_len: usize,
) -> Result<(), SettingsError> {
    let len = stored.chars().count();
    if len > max_len {
        return Err(SettingsError::Validation {
            message: format!(
                "value of {} is {} characters long, the maximum is {}; use a long value kind",
                identity, len, max_len
            ),
        });
    }
    Ok(())
}

/// Upper-case a language tag with spaces and dashes replaced by underscores (`en-us` -> `EN_US`)
pub fn format_setting_name(token: &str) -> String {
    token
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}
