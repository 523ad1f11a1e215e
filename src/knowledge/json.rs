//! JSON payload validation.


/// Outcome of validating a payload as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonValidation {
    /// Whether the payload parsed.
    pub valid: bool,
    /// Parser error message when invalid.
    pub error: Option<String>,
}

impl JsonValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Check that `content` parses as JSON.
#[must_use]
pub fn validate_json(content: &str) -> JsonValidation {
    match serde_json::from_str::<serde::de::IgnoredAny>(content) {
        Ok(_) => JsonValidation::ok(),
        Err(e) => JsonValidation::invalid(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_object() {
        let result = validate_json(r#"{"a":1}"#);
        assert!(result.valid);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_invalid_object() {
        let result = validate_json("{bad");
        assert!(!result.valid);
        assert!(!result.error.unwrap().is_empty());
    }

    #[test]
    fn test_empty_is_invalid() {
        assert!(!validate_json("").valid);
    }

    #[test]
    fn test_trailing_garbage_is_invalid() {
        assert!(!validate_json(r#"{"a":1} x"#).valid);
    }

    #[test]
    fn test_scalars_are_valid() {
        assert!(validate_json("42").valid);
        assert!(validate_json("[1, 2]").valid);
    }
}
