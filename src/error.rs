//! Structured error types for the pageplan library.
//!
//! Two variants cover the real error sources: JSON parsing of a plan
//! request, and image preset lookups. The solver itself never fails — bad
//! geometry and capacity exhaustion are expressed in the outcome, not as
//! errors.

use thiserror::Error;

/// The unified error type returned by the public pageplan API.
#[derive(Debug, Error)]
pub enum PlanError {
    /// JSON input failed to parse as a valid plan request.
    #[error("failed to parse plan request: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// An image preset name was requested that the capacity model does not know.
    #[error("unknown image preset '{0}'")]
    UnknownImagePreset(String),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the plan request schema. Check field names and types."
                    .to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input — is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PlanError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_hint() {
        let err: PlanError = serde_json::from_str::<crate::model::PlanRequest>("{")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.contains("failed to parse plan request"));
        assert!(msg.contains("Hint:"), "EOF errors should carry a hint: {}", msg);
    }

    #[test]
    fn unknown_preset_names_the_preset() {
        let err = PlanError::UnknownImagePreset("panorama".to_string());
        assert_eq!(err.to_string(), "unknown image preset 'panorama'");
    }
}
