//! # Typographic Capacity Model
//!
//! How much text fits in a given stretch of column? This module owns the
//! answer. [`TextStyle`] captures average characters per line, line density
//! per millimeter, and the vertical cost of titles by level. [`ImagePreset`]
//! is a named image footprint (column span + nominal height) that scales
//! linearly to other spans. [`CapacityModel`] composes the two and answers
//! the questions the variant generator and the solver ask: capacity for a
//! height, cost of reserving a title or an image.
//!
//! All three are built once per run from configuration and are read-only
//! afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PlanError;

/// Typographic density model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStyle {
    /// Average characters that fit on one column line.
    pub chars_per_line: u32,
    /// Line density: how many lines fit in one millimeter.
    pub lines_per_mm: f64,
    /// Vertical cost of a title, in millimeters, keyed by title level.
    #[serde(default)]
    pub title_heights_mm: BTreeMap<u8, f64>,
}

impl TextStyle {
    /// House defaults used when the configuration omits typography.
    pub fn defaults() -> Self {
        Self {
            chars_per_line: 32,
            lines_per_mm: 0.38,
            title_heights_mm: BTreeMap::from([(1, 16.0), (2, 12.0), (3, 8.0)]),
        }
    }

    /// Character capacity of `height_mm` of a single column.
    ///
    /// Partial lines don't hold text: the line count is floored before
    /// multiplying by the per-line character budget.
    pub fn capacity_for_height(&self, height_mm: f64) -> u32 {
        let effective_height = height_mm.max(0.0);
        let lines = (effective_height * self.lines_per_mm).floor();
        lines as u32 * self.chars_per_line
    }

    /// Height in millimeters reserved by a title of `level` spanning `span`
    /// columns. Zero when the level is absent or unknown.
    pub fn title_cost(&self, level: Option<u8>, span: usize) -> f64 {
        let Some(level) = level else { return 0.0 };
        match self.title_heights_mm.get(&level) {
            Some(base) => base * span.max(1) as f64,
            None => 0.0,
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::defaults()
    }
}

/// A named image footprint: the column span it was designed for and its
/// nominal height at that span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePreset {
    pub name: String,
    /// Columns the preset was measured at.
    pub span: usize,
    /// Height at the nominal span, in millimeters.
    pub height_mm: f64,
}

impl ImagePreset {
    /// Vertical cost when placed across `requested_span` columns.
    ///
    /// Scales linearly from the nominal span, keeping the approximate
    /// aspect ratio of the footprint.
    pub fn cost(&self, requested_span: Option<usize>) -> f64 {
        match requested_span {
            None => self.height_mm,
            Some(span) if span == self.span => self.height_mm,
            Some(span) => {
                let base_span = self.span.max(1) as f64;
                let requested = span.max(1) as f64;
                self.height_mm * requested / base_span
            }
        }
    }

    /// The presets used habitually in the production flow.
    pub fn default_presets() -> BTreeMap<String, ImagePreset> {
        BTreeMap::from([
            (
                "horizontal".to_string(),
                ImagePreset {
                    name: "horizontal".to_string(),
                    span: 2,
                    height_mm: 43.0,
                },
            ),
            (
                "vertical".to_string(),
                ImagePreset {
                    name: "vertical".to_string(),
                    span: 1,
                    height_mm: 60.0,
                },
            ),
        ])
    }
}

/// Aggregated capacity and reservation rules for one run.
///
/// Preset names are unique by construction (map keys). The map is ordered
/// so that fallback preset selection is deterministic.
#[derive(Debug, Clone)]
pub struct CapacityModel {
    pub text_style: TextStyle,
    pub image_presets: BTreeMap<String, ImagePreset>,
}

impl CapacityModel {
    pub fn new(text_style: TextStyle, image_presets: BTreeMap<String, ImagePreset>) -> Self {
        Self {
            text_style,
            image_presets,
        }
    }

    /// Character capacity of a column block `column_height_mm` tall and
    /// `span` columns wide, after reserving a title and optionally an image.
    ///
    /// An unknown preset name is a configuration problem, not a fatal one:
    /// the reservation is skipped with a warning and capacity is computed as
    /// if no image were reserved.
    pub fn capacity_per_column(
        &self,
        column_height_mm: f64,
        span: usize,
        title_level: Option<u8>,
        image_preset: Option<&str>,
    ) -> u32 {
        let mut reserved_height = self.text_style.title_cost(title_level, span);

        if let Some(name) = image_preset {
            match self.image_cost(name, Some(span)) {
                Ok(cost) => reserved_height += cost,
                Err(_) => {
                    log::warn!("image preset '{}' not found; skipping reservation", name);
                }
            }
        }

        let available_height = (column_height_mm - reserved_height).max(0.0);
        let per_column = self.text_style.capacity_for_height(available_height);
        per_column * span.max(1) as u32
    }

    /// Direct interface for the title reservation cost.
    pub fn title_cost(&self, level: Option<u8>, span: usize) -> f64 {
        self.text_style.title_cost(level, span)
    }

    /// Vertical cost of the named preset, scaled to `span`.
    pub fn image_cost(&self, name: &str, span: Option<usize>) -> Result<f64, PlanError> {
        let preset = self
            .image_presets
            .get(name)
            .ok_or_else(|| PlanError::UnknownImagePreset(name.to_string()))?;
        Ok(preset.cost(span))
    }
}
