//! Response types for the HTTP endpoints.

use serde::{Deserialize, Serialize};

/// A block of text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    /// Always `"text"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The text payload.
    pub text: String,
}

impl TextContent {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Response for resource endpoints (specifications, documentation).
///
/// Missing documents are reported as text, never as an HTTP error status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    /// Content blocks.
    pub content: Vec<TextContent>,
    /// Whether the request itself was invalid.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ContentResponse {
    /// A single text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent::new(text)],
            is_error: false,
        }
    }

    /// A single text block flagged as an error.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent::new(text)],
            is_error: true,
        }
    }

    /// Text of the first content block.
    #[must_use]
    pub fn first_text(&self) -> &str {
        self.content.first().map_or("", |c| c.text.as_str())
    }
}

/// Response for GET /api/versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionsResponse {
    /// All known protocol versions.
    pub versions: Vec<String>,
    /// The designated latest version.
    pub latest_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response_omits_is_error() {
        let json = serde_json::to_value(ContentResponse::text("hello")).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "hello");
        assert!(json.get("isError").is_none());
    }

    #[test]
    fn test_error_response_sets_is_error() {
        let json = serde_json::to_value(ContentResponse::error("bad")).unwrap();
        assert_eq!(json["isError"], true);
    }

    #[test]
    fn test_versions_response_camel_case() {
        let response = VersionsResponse {
            versions: vec!["v1".to_string()],
            latest_version: "v1".to_string(),
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["latestVersion"], "v1");
    }
}
