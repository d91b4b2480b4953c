//! Object name validation.
//!
//! Valid object names:
//! - Must be non-empty and not only whitespace
//! - Must not contain `/` (the path separator), `\`, or control characters
//! - Must not be `.` or `..`
//! - Must not exceed the configured maximum length (in characters)

use crate::error::{StoreError, StoreResult};

/// Characters that are forbidden anywhere in an object name.
const FORBIDDEN_CHARS: &[char] = &['/', '\\'];

/// Validate an object name, returning `Ok(())` if valid.
///
/// ```
/// use cmis_store::names::validate_name;
///
/// assert!(validate_name("report.pdf", 255).is_ok());
/// assert!(validate_name("a/b", 255).is_err());
/// assert!(validate_name("", 255).is_err());
/// ```
pub fn validate_name(name: &str, max_len: usize) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(name, &format!("contains forbidden character: {ch:?}")));
        }
    }

    if name.chars().any(char::is_control) {
        return Err(invalid(name, "contains a control character"));
    }

    if name == "." || name == ".." {
        return Err(invalid(name, "must not be '.' or '..'"));
    }

    if name.chars().count() > max_len {
        return Err(invalid(name, &format!("longer than {max_len} characters")));
    }

    Ok(())
}

fn invalid(name: &str, reason: &str) -> StoreError {
    StoreError::InvalidArgument(format!("invalid object name '{name}': {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_ordinary_names() {
        for name in ["A", "report.pdf", "My Folder", "ünïcödé", "a.b.c", "x..y"] {
            assert!(validate_name(name, 255).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(validate_name("", 255).is_err());
        assert!(validate_name("   ", 255).is_err());
    }

    #[test]
    fn rejects_separators() {
        assert!(validate_name("a/b", 255).is_err());
        assert!(validate_name("a\\b", 255).is_err());
    }

    #[test]
    fn rejects_control_chars_and_dots() {
        assert!(validate_name("a\nb", 255).is_err());
        assert!(validate_name(".", 255).is_err());
        assert!(validate_name("..", 255).is_err());
    }

    #[test]
    fn enforces_length_in_chars() {
        assert!(validate_name("abcd", 4).is_ok());
        assert!(validate_name("abcde", 4).is_err());
        assert!(validate_name("äöüß", 4).is_ok());
    }

    #[test]
    fn error_is_invalid_argument() {
        let err = validate_name("a/b", 255).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert!(err.to_string().contains("a/b"));
    }

    proptest! {
        #[test]
        fn alphanumeric_names_are_valid(name in "[A-Za-z0-9][A-Za-z0-9 _.-]{0,40}") {
            prop_assume!(name != "." && name != "..");
            prop_assert!(validate_name(&name, 255).is_ok());
        }
    }
}
