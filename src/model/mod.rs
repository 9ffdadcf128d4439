//! # Input Model
//!
//! The input representation for the placement planner. A plan request pairs
//! the page's column geometry with the notes competing for it, plus the
//! typographic and image configuration used to build the capacity model.
//!
//! Everything here is designed to be easily produced by the surrounding
//! pipeline (slot detection, DOCX extraction) or by direct JSON
//! construction — those producers are external collaborators; this crate
//! only sees their measurements.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::solver::PlanSettings;
use crate::style::{ImagePreset, TextStyle};

/// Usable column area of one page.
///
/// `columns` may be zero (a page with no usable grid); the solver treats
/// that as degenerate geometry and drops every note rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Number of columns in the grid.
    #[serde(default)]
    pub columns: usize,
    /// Usable vertical space per column, in millimeters.
    #[serde(default)]
    pub column_height_mm: f64,
}

/// One content unit: a title, a body, and optionally images.
///
/// Notes carry measurements only — character counts, not text. The optional
/// fields replace runtime attribute probing with explicit defaults: a
/// missing `title_level` resolves to `PlanSettings::default_title_level`,
/// and a missing `image_mode` resolves through `image_count` and
/// `default_image_preset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Identifier used to match assignments and variant catalogs back to
    /// the source note.
    pub id: String,
    /// Character count of the title.
    #[serde(default)]
    pub chars_title: u32,
    /// Character count of the body text.
    #[serde(default)]
    pub chars_body: u32,
    /// Number of images supplied with the note.
    #[serde(default)]
    pub image_count: u32,
    /// Explicit title level; when absent the settings default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_level: Option<u8>,
    /// Explicit image preset name; when absent the image is resolved from
    /// `image_count` and the settings default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_mode: Option<String>,
}

impl Note {
    /// Resolve the effective title level for this note.
    pub fn resolved_title_level(&self, default: Option<u8>) -> Option<u8> {
        self.title_level.or(default)
    }
}

/// The complete JSON input envelope for `plan_json` and the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanRequest {
    /// Column geometry of the page being planned.
    pub page: PageGeometry,
    /// Notes to place, in the order they should be considered.
    #[serde(default)]
    pub notes: Vec<Note>,
    /// Typographic density model. Defaults match the house style.
    #[serde(default = "TextStyle::defaults")]
    pub typography: TextStyle,
    /// Named image footprints. Defaults to the standard vertical/horizontal pair.
    #[serde(default = "ImagePreset::default_presets")]
    pub image_presets: BTreeMap<String, ImagePreset>,
    /// Search hyperparameters.
    #[serde(default)]
    pub settings: PlanSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_defaults_to_settings_title_level() {
        let note = Note {
            id: "n1".to_string(),
            chars_title: 30,
            chars_body: 400,
            image_count: 0,
            title_level: None,
            image_mode: None,
        };
        assert_eq!(note.resolved_title_level(Some(2)), Some(2));
        assert_eq!(note.resolved_title_level(None), None);

        let explicit = Note {
            title_level: Some(3),
            ..note
        };
        assert_eq!(explicit.resolved_title_level(Some(1)), Some(3));
    }

    #[test]
    fn request_parses_with_minimal_fields() {
        let json = r#"{
            "page": { "columns": 4, "column_height_mm": 310.0 },
            "notes": [ { "id": "p7#1", "chars_body": 1200 } ]
        }"#;
        let request: PlanRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.page.columns, 4);
        assert_eq!(request.notes.len(), 1);
        assert_eq!(request.notes[0].chars_body, 1200);
        assert_eq!(request.notes[0].image_count, 0);
        // Defaults kick in for the omitted sections.
        assert!(request.image_presets.contains_key("vertical"));
        assert!(request.settings.beam_width >= 1);
    }
}
