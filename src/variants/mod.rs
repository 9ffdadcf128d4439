//! # Note Variants
//!
//! For each note the planner considers several candidate layouts — the
//! cartesian product of allowed title spans and image choices. Each variant
//! precomputes its per-column height footprint and a set of penalty hints
//! (overflow, unused capacity, stranded last line, missing image) that the
//! solver turns into score deltas.
//!
//! Variants are plain values derived per page and discarded after solving.

use std::collections::BTreeMap;

use crate::model::Note;
use crate::solver::PlanSettings;
use crate::style::{CapacityModel, ImagePreset};

/// Penalty tags attached to variant footprints.
///
/// The solver recognizes these and applies configured weights; any other
/// tag is subtracted from the score at face value.
pub mod penalty {
    /// Body characters that don't fit at the variant's own height.
    pub const OVERFLOW_CHARS: &str = "overflow_chars";
    /// Capacity left over at the variant's own height.
    pub const UNUSED_CAPACITY: &str = "unused_capacity";
    /// A visually stranded last line (orphan/widow style defect).
    pub const MORDIDA: &str = "mordida";
    /// No image chosen for the variant.
    pub const MISSING_IMAGE: &str = "missing_image";
}

/// A body whose last estimated line holds less than this fraction of a full
/// line is flagged as a mordida.
const MORDIDA_LINE_FRACTION: f64 = 0.25;

/// Per-variant vertical cost, one height per spanned column.
#[derive(Debug, Clone)]
pub struct ColumnFootprint {
    /// Columns this footprint occupies.
    pub span: usize,
    /// Height contribution per column; length equals `span`.
    pub column_heights_mm: Vec<f64>,
    /// Penalty hints by tag.
    pub penalties: BTreeMap<String, f64>,
    /// Preference for richer image placement: 0 none, 1 vertical, 2 wide.
    pub image_priority: u32,
    /// The preset backing `image_priority`, if any.
    pub image_preset: Option<String>,
}

/// One candidate layout for a note: title span × image choice, with the
/// resulting footprint.
#[derive(Debug, Clone)]
pub struct NoteVariant {
    pub note_id: String,
    /// Columns the title stretches across.
    pub title_span: usize,
    /// Columns the whole variant occupies.
    pub span: usize,
    pub image_preset: Option<String>,
    /// Tallest column of the footprint.
    pub total_height_mm: f64,
    /// Uniform body-text height shared by every spanned column.
    pub text_height_mm: f64,
    pub footprint: ColumnFootprint,
}

impl NoteVariant {
    /// Default ordering key: narrower titles first, then richer images
    /// (vertical before wide before none), then shorter variants.
    ///
    /// Purely a deterministic presentation order — the solver explores all
    /// variants regardless.
    fn preference_key(&self) -> (usize, u8) {
        (self.title_span, image_order_index(self.image_preset.as_deref()))
    }

    /// Single-column stand-in built when no precomputed variant exists for
    /// a note. Same type and footprint rules as the generated variants; the
    /// title level and image are resolved from the note's own fields and
    /// the settings defaults.
    pub fn fallback(note: &Note, model: &CapacityModel, settings: &PlanSettings) -> NoteVariant {
        let title_level = note.resolved_title_level(settings.default_title_level);
        let image = resolve_image_preset(note, model, settings);
        build_variant(note, model, 1, title_level, image)
    }
}

fn image_order_index(image: Option<&str>) -> u8 {
    match image {
        Some(name) if name.eq_ignore_ascii_case("vertical") => 0,
        Some(_) => 1,
        None => 2,
    }
}

fn image_priority(image: Option<&str>) -> u32 {
    match image {
        None => 0,
        Some(name) if name.eq_ignore_ascii_case("vertical") => 1,
        Some(_) => 2,
    }
}

/// Height needed to hold the note's body across `span` columns.
pub fn estimate_text_height_mm(note: &Note, model: &CapacityModel, span: usize) -> f64 {
    let chars_per_column = model.text_style.chars_per_line as f64 * span.max(1) as f64;
    if chars_per_column <= 0.0 || model.text_style.lines_per_mm <= 0.0 {
        return 0.0;
    }
    let estimated_lines = note.chars_body as f64 / chars_per_column;
    estimated_lines / model.text_style.lines_per_mm
}

/// Resolve the image preset for a note outside the generator's enumeration:
/// an explicit known `image_mode` wins; otherwise a note with images takes
/// the configured default preset, or the first preset in name order.
fn resolve_image_preset<'a>(
    note: &Note,
    model: &'a CapacityModel,
    settings: &PlanSettings,
) -> Option<&'a ImagePreset> {
    if let Some(mode) = note.image_mode.as_deref() {
        if let Some(preset) = model.image_presets.get(mode) {
            return Some(preset);
        }
        log::warn!(
            "note '{}' requests unknown image preset '{}'; resolving by image count",
            note.id,
            mode
        );
    }
    if note.image_count == 0 {
        return None;
    }
    if let Some(default) = settings.default_image_preset.as_deref() {
        if let Some(preset) = model.image_presets.get(default) {
            return Some(preset);
        }
    }
    model.image_presets.values().next()
}

/// Build one variant for a concrete (title span, image) choice.
fn build_variant(
    note: &Note,
    model: &CapacityModel,
    title_span: usize,
    title_level: Option<u8>,
    image: Option<&ImagePreset>,
) -> NoteVariant {
    let title_span = title_span.max(1);
    let image_span = image.map(|preset| preset.span).unwrap_or(0);
    let span = title_span.max(image_span).max(1);

    let text_height = estimate_text_height_mm(note, model, span);

    let title_height_total = model.title_cost(title_level, title_span);
    let title_height_per_column = title_height_total / title_span as f64;

    let image_height_total = image.map(|preset| preset.cost(Some(span))).unwrap_or(0.0);
    let image_height_per_column = if image_span > 0 {
        image_height_total / image_span as f64
    } else {
        0.0
    };

    let mut column_heights = Vec::with_capacity(span);
    for col in 0..span {
        let mut height = text_height;
        if col < title_span {
            height += title_height_per_column;
        }
        if col < image_span {
            height += image_height_per_column;
        }
        column_heights.push(height);
    }

    let total_height = column_heights.iter().cloned().fold(0.0_f64, f64::max);
    let image_name = image.map(|preset| preset.name.as_str());
    let capacity = model.capacity_per_column(total_height, span, title_level, image_name);
    let overflow = note.chars_body.saturating_sub(capacity);
    let slack = capacity.saturating_sub(note.chars_body);

    let mut penalties = BTreeMap::new();
    if overflow > 0 {
        penalties.insert(penalty::OVERFLOW_CHARS.to_string(), overflow as f64);
    }
    if slack > 0 {
        penalties.insert(penalty::UNUSED_CAPACITY.to_string(), slack as f64);
    }
    if has_stranded_last_line(note.chars_body, model, span) {
        penalties.insert(penalty::MORDIDA.to_string(), 1.0);
    }
    if image.is_none() {
        penalties.insert(penalty::MISSING_IMAGE.to_string(), 1.0);
    }

    let footprint = ColumnFootprint {
        span,
        column_heights_mm: column_heights,
        penalties,
        image_priority: image_priority(image_name),
        image_preset: image_name.map(str::to_string),
    };

    NoteVariant {
        note_id: note.id.clone(),
        title_span,
        span,
        image_preset: image_name.map(str::to_string),
        total_height_mm: total_height,
        text_height_mm: text_height,
        footprint,
    }
}

/// Does the body's last estimated line hold too few characters to look
/// intentional?
fn has_stranded_last_line(chars_body: u32, model: &CapacityModel, span: usize) -> bool {
    let chars_per_column = model.text_style.chars_per_line as f64 * span.max(1) as f64;
    if chars_body == 0 || chars_per_column <= 0.0 {
        return false;
    }
    let remainder = (chars_body as f64 / chars_per_column).fract();
    remainder > 0.0 && remainder < MORDIDA_LINE_FRACTION
}

/// Enumerate candidate layouts for one note.
///
/// For every allowed title span, the note is tried without an image and
/// with each compatible preset: `vertical` and `horizontal` when present;
/// when there is no `horizontal`, the first multi-column preset stands in
/// as the wide choice.
pub fn generate_note_variants(
    note: &Note,
    model: &CapacityModel,
    title_spans: &[usize],
    title_level: Option<u8>,
) -> Vec<NoteVariant> {
    let mut image_options: Vec<Option<&ImagePreset>> = vec![None];
    if let Some(preset) = model.image_presets.get("vertical") {
        image_options.push(Some(preset));
    }
    if let Some(preset) = model.image_presets.get("horizontal") {
        image_options.push(Some(preset));
    } else if let Some(preset) = model.image_presets.values().find(|preset| preset.span >= 2) {
        image_options.push(Some(preset));
    }

    let mut variants = Vec::new();
    for &title_span in title_spans {
        if title_span == 0 {
            continue;
        }
        for image in &image_options {
            variants.push(build_variant(note, model, title_span, title_level, *image));
        }
    }

    variants.sort_by(|a, b| {
        a.preference_key()
            .cmp(&b.preference_key())
            .then_with(|| {
                a.total_height_mm
                    .partial_cmp(&b.total_height_mm)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
    variants
}

/// Variant catalogs for a whole note list, keyed by note id.
///
/// Each note's title level is resolved against `default_title_level` before
/// generation, so explicit note levels survive into the catalog.
pub fn generate_catalog(
    notes: &[Note],
    model: &CapacityModel,
    title_spans: &[usize],
    default_title_level: Option<u8>,
) -> BTreeMap<String, Vec<NoteVariant>> {
    let mut catalog = BTreeMap::new();
    for note in notes {
        let level = note.resolved_title_level(default_title_level);
        catalog.insert(
            note.id.clone(),
            generate_note_variants(note, model, title_spans, level),
        );
    }
    catalog
}

/// The title spans tried when the caller doesn't restrict them.
pub const DEFAULT_TITLE_SPANS: [usize; 2] = [1, 2];
