//! # Beam-Search Placement Solver
//!
//! A bounded-width search over note placements. The solver walks the note
//! list once; for every partial state it tries each candidate variant at
//! each feasible starting column, always keeps a drop option, and prunes
//! the candidate pool to the best `beam_width` states before moving on.
//! There is no backtracking — pruning is by score, not by undo.
//!
//! Spanned placements are top-aligned: a variant cannot start before every
//! one of its columns is clear of previously placed content. After the last
//! note, final selection charges each surviving state for its leftover gaps
//! (total and imbalance) and returns the best.
//!
//! The search is deterministic: candidate generation order is fixed and the
//! pruning sort is stable, so ties preserve insertion order. This is also a
//! heuristic — weights are empirically chosen, and the note order of the
//! input list is part of the contract.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Note, PageGeometry};
use crate::style::CapacityModel;
use crate::variants::{penalty, NoteVariant};

/// Tolerance for floating-point height comparisons.
const EPSILON_MM: f64 = 1e-6;

/// Bonus weight per unit of a variant's image priority.
const IMAGE_PRIORITY_BONUS: f64 = 0.05;

/// Hyperparameters that shape the beam-search exploration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    /// Max states retained per round.
    pub beam_width: usize,
    /// Reward for a note placed with zero overflow.
    pub fit_bonus: f64,
    /// Cost per body character that doesn't fit.
    pub overflow_penalty_per_char: f64,
    /// Legacy knob kept for configuration compatibility. Placements that
    /// exceed the column are rejected outright, so this is never applied.
    pub overfill_penalty_per_mm: f64,
    /// Cost for imbalance between column gaps at final selection.
    pub gap_penalty_per_mm: f64,
    /// Cost per millimeter of total unused height at final selection.
    pub final_gap_penalty_per_mm: f64,
    /// Cost of abandoning a note entirely.
    pub drop_penalty: f64,
    /// Title level assumed when a note doesn't specify one.
    pub default_title_level: Option<u8>,
    /// Image preset assumed when a note has images but no explicit mode.
    pub default_image_preset: Option<String>,
    /// Weight for the `unused_capacity` penalty hint.
    pub unused_capacity_penalty_per_char: f64,
    /// Weight for the `mordida` (stranded last line) penalty hint.
    pub mordida_penalty_per_line: f64,
    /// Weight for the `missing_image` penalty hint.
    pub missing_image_penalty: f64,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            beam_width: 8,
            fit_bonus: 8.0,
            overflow_penalty_per_char: 0.12,
            overfill_penalty_per_mm: 0.65,
            gap_penalty_per_mm: 0.18,
            final_gap_penalty_per_mm: 0.25,
            drop_penalty: 10.0,
            default_title_level: Some(1),
            default_image_preset: None,
            unused_capacity_penalty_per_char: 0.01,
            mordida_penalty_per_line: 0.5,
            missing_image_penalty: 1.5,
        }
    }
}

/// Decision taken by the solver for one note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub note: Note,
    /// First column the placement occupies.
    pub column_index: usize,
    /// Columns occupied, starting at `column_index`.
    pub span: usize,
    /// Vertical offset where the placement starts, shared by all spanned
    /// columns (top alignment).
    pub start_mm: f64,
    /// Tallest per-column height of the placement.
    pub used_height_mm: f64,
    /// Height contribution per spanned column (title + image + text).
    pub column_heights_mm: Vec<f64>,
    /// Uniform body-text height within the placement.
    pub text_height_mm: f64,
    /// Body characters that fit at the placed height.
    pub body_chars_fit: u32,
    /// Body characters that don't.
    pub body_chars_overflow: u32,
    /// Image preset used, or `"none"`.
    pub img_mode: String,
    /// True when the whole body fits.
    pub fit: bool,
    /// Smallest leftover height among the spanned columns.
    pub remaining_mm: f64,
}

/// Final result of running the solver over a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverOutcome {
    pub assignments: Vec<Assignment>,
    pub dropped_notes: Vec<Note>,
    pub column_usage_mm: Vec<f64>,
    pub column_gaps_mm: Vec<f64>,
    /// Advisory trace lines, one per decision plus a final gap summary.
    pub logs: Vec<String>,
    pub score: f64,
}

/// A partial exploration state. Expanding a state never mutates it; every
/// branch gets its own copy, so states stay independent across branches.
#[derive(Debug, Clone)]
struct BeamState {
    score: f64,
    columns_used_mm: Vec<f64>,
    assignments: Vec<Assignment>,
    dropped: Vec<Note>,
    logs: Vec<String>,
}

impl BeamState {
    fn initial(columns: usize) -> Self {
        Self {
            score: 0.0,
            columns_used_mm: vec![0.0; columns],
            assignments: Vec::new(),
            dropped: Vec::new(),
            logs: Vec::new(),
        }
    }

    fn with_assignment(&self, assignment: Assignment, score_delta: f64) -> BeamState {
        let mut next = self.clone();
        for (offset, height) in assignment.column_heights_mm.iter().enumerate() {
            next.columns_used_mm[assignment.column_index + offset] = assignment.start_mm + height;
        }
        next.logs.push(format!(
            "cols {}-{}: note {} span={} fit={} rem={:.1}mm overflow={}",
            assignment.column_index + 1,
            assignment.column_index + assignment.span,
            assignment.note.id,
            assignment.span,
            if assignment.fit { "yes" } else { "no" },
            assignment.remaining_mm,
            assignment.body_chars_overflow,
        ));
        next.score += score_delta;
        next.assignments.push(assignment);
        next
    }

    fn with_drop(&self, note: &Note, penalty: f64) -> BeamState {
        let mut next = self.clone();
        next.score -= penalty;
        next.logs.push(format!("drop note {} (no viable slot)", note.id));
        next.dropped.push(note.clone());
        next
    }
}

/// Score delta for placing `variant`, from its penalty hints.
///
/// Recognized hints are weighted by the settings; anything else is
/// subtracted at face value as a pass-through safety net.
fn placement_delta(variant: &NoteVariant, settings: &PlanSettings) -> f64 {
    let penalties = &variant.footprint.penalties;
    let overflow = penalties
        .get(penalty::OVERFLOW_CHARS)
        .copied()
        .unwrap_or(0.0);

    let mut delta = if overflow == 0.0 {
        settings.fit_bonus
    } else {
        -settings.overflow_penalty_per_char * overflow
    };

    for (tag, magnitude) in penalties {
        delta -= match tag.as_str() {
            penalty::OVERFLOW_CHARS => continue,
            penalty::UNUSED_CAPACITY => settings.unused_capacity_penalty_per_char * magnitude,
            penalty::MORDIDA => settings.mordida_penalty_per_line * magnitude,
            penalty::MISSING_IMAGE => settings.missing_image_penalty * magnitude,
            _ => *magnitude,
        };
    }

    delta + IMAGE_PRIORITY_BONUS * variant.footprint.image_priority as f64
}

/// Build the assignment for placing `variant` at `column_index`/`start_mm`,
/// or `None` when the variant's own per-column heights don't fit there.
fn try_placement(
    note: &Note,
    variant: &NoteVariant,
    column_index: usize,
    start_mm: f64,
    column_height_mm: f64,
) -> Option<Assignment> {
    let heights = &variant.footprint.column_heights_mm;

    let mut remaining_mm = f64::INFINITY;
    for height in heights {
        let leftover = column_height_mm - (start_mm + height);
        if leftover < -EPSILON_MM {
            return None;
        }
        remaining_mm = remaining_mm.min(leftover);
    }

    let overflow = variant
        .footprint
        .penalties
        .get(penalty::OVERFLOW_CHARS)
        .copied()
        .unwrap_or(0.0) as u32;

    Some(Assignment {
        note: note.clone(),
        column_index,
        span: variant.span,
        start_mm,
        used_height_mm: variant.total_height_mm,
        column_heights_mm: heights.clone(),
        text_height_mm: variant.text_height_mm,
        body_chars_fit: note.chars_body.saturating_sub(overflow),
        body_chars_overflow: overflow,
        img_mode: variant
            .image_preset
            .clone()
            .unwrap_or_else(|| "none".to_string()),
        fit: overflow == 0,
        remaining_mm: remaining_mm.max(0.0),
    })
}

/// Plan the layout of a page with a beam search over note placements.
///
/// `variants_by_note` is an optional precomputed catalog; notes without an
/// entry get a single on-the-fly fallback variant. The solver never fails:
/// degenerate geometry drops the whole batch with a diagnostic line, and
/// capacity exhaustion shows up as overflow on the best placement.
pub fn solve(
    page: &PageGeometry,
    notes: &[Note],
    capacity_model: &CapacityModel,
    settings: &PlanSettings,
    variants_by_note: Option<&BTreeMap<String, Vec<NoteVariant>>>,
) -> SolverOutcome {
    let columns = page.columns;
    let column_height = page.column_height_mm;

    if columns == 0 || column_height <= 0.0 {
        return SolverOutcome {
            assignments: Vec::new(),
            dropped_notes: notes.to_vec(),
            column_usage_mm: vec![0.0; columns],
            column_gaps_mm: vec![column_height.max(0.0); columns],
            logs: vec!["no usable columns; all notes dropped".to_string()],
            score: -settings.drop_penalty * notes.len() as f64,
        };
    }

    let beam_width = settings.beam_width.max(1);
    let mut beam = vec![BeamState::initial(columns)];

    for note in notes {
        let fallback;
        let candidates: &[NoteVariant] = match variants_by_note
            .and_then(|catalog| catalog.get(&note.id))
            .filter(|variants| !variants.is_empty())
        {
            Some(variants) => variants,
            None => {
                fallback = [NoteVariant::fallback(note, capacity_model, settings)];
                &fallback
            }
        };

        let mut next_states: Vec<BeamState> = Vec::new();
        for state in &beam {
            for variant in candidates {
                let span = variant.span.max(1);
                if span > columns {
                    continue;
                }
                let delta = placement_delta(variant, settings);
                for column_index in 0..=(columns - span) {
                    let start_mm = state.columns_used_mm[column_index..column_index + span]
                        .iter()
                        .cloned()
                        .fold(0.0_f64, f64::max);
                    if let Some(assignment) =
                        try_placement(note, variant, column_index, start_mm, column_height)
                    {
                        next_states.push(state.with_assignment(assignment, delta));
                    }
                }
            }
            next_states.push(state.with_drop(note, settings.drop_penalty));
        }

        next_states.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        next_states.truncate(beam_width);
        beam = next_states;
    }

    let mut best: Option<(f64, &BeamState)> = None;
    for state in &beam {
        let gaps = state
            .columns_used_mm
            .iter()
            .map(|used| (column_height - used).max(0.0));
        let total_gap: f64 = gaps.clone().sum();
        let max_gap = gaps.clone().fold(0.0_f64, f64::max);
        let min_gap = gaps.fold(f64::INFINITY, f64::min);
        let adjusted = state.score
            - settings.final_gap_penalty_per_mm * total_gap
            - settings.gap_penalty_per_mm * (max_gap - min_gap);
        if best.map_or(true, |(best_score, _)| adjusted > best_score) {
            best = Some((adjusted, state));
        }
    }

    // The beam is never empty: every round produces at least the drop option.
    let (score, state) = best.expect("beam search retains at least one state");

    let column_gaps: Vec<f64> = state
        .columns_used_mm
        .iter()
        .map(|used| (column_height - used).max(0.0))
        .collect();

    let mut logs = state.logs.clone();
    logs.push(format!(
        "final gaps: {}",
        column_gaps
            .iter()
            .enumerate()
            .map(|(idx, gap)| format!("col {} → {:.1}mm", idx + 1, gap))
            .collect::<Vec<_>>()
            .join(", ")
    ));

    SolverOutcome {
        assignments: state.assignments.clone(),
        dropped_notes: state.dropped.clone(),
        column_usage_mm: state.columns_used_mm.clone(),
        column_gaps_mm: column_gaps,
        logs,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextStyle;
    use crate::variants::{generate_catalog, ColumnFootprint, DEFAULT_TITLE_SPANS};
    use std::collections::BTreeMap;

    fn note(id: &str, chars_body: u32) -> Note {
        Note {
            id: id.to_string(),
            chars_title: 0,
            chars_body,
            image_count: 0,
            title_level: None,
            image_mode: None,
        }
    }

    fn flat_model() -> CapacityModel {
        CapacityModel::new(
            TextStyle {
                chars_per_line: 20,
                lines_per_mm: 0.5,
                title_heights_mm: BTreeMap::new(),
            },
            BTreeMap::new(),
        )
    }

    fn settings() -> PlanSettings {
        PlanSettings {
            default_title_level: None,
            ..PlanSettings::default()
        }
    }

    fn hand_variant(
        note_id: &str,
        span: usize,
        heights: Vec<f64>,
        penalties: BTreeMap<String, f64>,
    ) -> NoteVariant {
        let total = heights.iter().cloned().fold(0.0_f64, f64::max);
        NoteVariant {
            note_id: note_id.to_string(),
            title_span: 1,
            span,
            image_preset: None,
            total_height_mm: total,
            text_height_mm: total,
            footprint: ColumnFootprint {
                span,
                column_heights_mm: heights,
                penalties,
                image_priority: 0,
                image_preset: None,
            },
        }
    }

    #[test]
    fn greedy_reduction_keeps_one_state_per_round() {
        let page = PageGeometry {
            columns: 3,
            column_height_mm: 100.0,
        };
        let notes: Vec<Note> = (0..5).map(|i| note(&format!("n{}", i), 200)).collect();
        let mut cfg = settings();
        cfg.beam_width = 1;
        let outcome = solve(&page, &notes, &flat_model(), &cfg, None);
        assert_eq!(outcome.assignments.len() + outcome.dropped_notes.len(), 5);
    }

    #[test]
    fn beam_width_zero_is_clamped() {
        let page = PageGeometry {
            columns: 1,
            column_height_mm: 50.0,
        };
        let mut cfg = settings();
        cfg.beam_width = 0;
        let outcome = solve(&page, &[note("n1", 100)], &flat_model(), &cfg, None);
        assert_eq!(outcome.assignments.len() + outcome.dropped_notes.len(), 1);
    }

    #[test]
    fn spanned_placement_top_aligns_across_columns() {
        let page = PageGeometry {
            columns: 2,
            column_height_mm: 100.0,
        };
        // n1 occupies 40mm of column 1 only; n2 spans both columns and must
        // start below n1's content.
        let mut catalog = BTreeMap::new();
        catalog.insert(
            "n1".to_string(),
            vec![hand_variant("n1", 1, vec![40.0], BTreeMap::new())],
        );
        catalog.insert(
            "n2".to_string(),
            vec![hand_variant("n2", 2, vec![30.0, 30.0], BTreeMap::new())],
        );
        let notes = [note("n1", 0), note("n2", 0)];
        let outcome = solve(&page, &notes, &flat_model(), &settings(), Some(&catalog));

        assert_eq!(outcome.assignments.len(), 2);
        let spanned = outcome
            .assignments
            .iter()
            .find(|a| a.note.id == "n2")
            .unwrap();
        assert_eq!(spanned.span, 2);
        assert!((spanned.start_mm - 40.0).abs() < 1e-9);
        assert!((outcome.column_usage_mm[0] - 70.0).abs() < 1e-9);
        assert!((outcome.column_usage_mm[1] - 70.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_variant_is_never_placed() {
        let page = PageGeometry {
            columns: 1,
            column_height_mm: 100.0,
        };
        let mut catalog = BTreeMap::new();
        catalog.insert(
            "n1".to_string(),
            vec![hand_variant("n1", 2, vec![10.0, 10.0], BTreeMap::new())],
        );
        let outcome = solve(
            &page,
            &[note("n1", 0)],
            &flat_model(),
            &settings(),
            Some(&catalog),
        );
        assert!(outcome.assignments.is_empty());
        assert_eq!(outcome.dropped_notes.len(), 1);
    }

    #[test]
    fn variant_taller_than_column_is_rejected() {
        let page = PageGeometry {
            columns: 1,
            column_height_mm: 50.0,
        };
        let mut catalog = BTreeMap::new();
        catalog.insert(
            "n1".to_string(),
            vec![hand_variant("n1", 1, vec![80.0], BTreeMap::new())],
        );
        let outcome = solve(
            &page,
            &[note("n1", 0)],
            &flat_model(),
            &settings(),
            Some(&catalog),
        );
        assert!(outcome.assignments.is_empty());
        assert_eq!(outcome.dropped_notes.len(), 1);
        // Drop penalty plus the final charge for the untouched column.
        let expected = -settings().drop_penalty - settings().final_gap_penalty_per_mm * 50.0;
        assert!((outcome.score - expected).abs() < 1e-9);
    }

    #[test]
    fn unknown_penalty_tags_pass_through_at_face_value() {
        let cfg = settings();
        let mut penalties = BTreeMap::new();
        penalties.insert("exotic".to_string(), 3.25);
        let variant = hand_variant("n1", 1, vec![10.0], penalties);
        let delta = placement_delta(&variant, &cfg);
        // fit bonus minus the raw magnitude of the unrecognized tag.
        assert!((delta - (cfg.fit_bonus - 3.25)).abs() < 1e-9);
    }

    #[test]
    fn weighted_penalty_tags_use_configured_weights() {
        let cfg = settings();
        let mut penalties = BTreeMap::new();
        penalties.insert(penalty::OVERFLOW_CHARS.to_string(), 40.0);
        penalties.insert(penalty::UNUSED_CAPACITY.to_string(), 10.0);
        penalties.insert(penalty::MORDIDA.to_string(), 1.0);
        penalties.insert(penalty::MISSING_IMAGE.to_string(), 1.0);
        let variant = hand_variant("n1", 1, vec![10.0], penalties);
        let delta = placement_delta(&variant, &cfg);
        let expected = -cfg.overflow_penalty_per_char * 40.0
            - cfg.unused_capacity_penalty_per_char * 10.0
            - cfg.mordida_penalty_per_line
            - cfg.missing_image_penalty;
        assert!((delta - expected).abs() < 1e-9);
    }

    #[test]
    fn image_priority_earns_a_small_bonus() {
        let cfg = settings();
        let mut rich = hand_variant("n1", 1, vec![10.0], BTreeMap::new());
        rich.footprint.image_priority = 2;
        let poor = hand_variant("n1", 1, vec![10.0], BTreeMap::new());
        assert!(placement_delta(&rich, &cfg) > placement_delta(&poor, &cfg));
    }

    #[test]
    fn catalog_and_fallback_agree_on_partition() {
        let page = PageGeometry {
            columns: 2,
            column_height_mm: 200.0,
        };
        let model = flat_model();
        let notes: Vec<Note> = (0..4).map(|i| note(&format!("n{}", i), 300)).collect();
        let catalog = generate_catalog(&notes, &model, &DEFAULT_TITLE_SPANS, None);
        let cfg = settings();

        for outcome in [
            solve(&page, &notes, &model, &cfg, Some(&catalog)),
            solve(&page, &notes, &model, &cfg, None),
        ] {
            assert_eq!(
                outcome.assignments.len() + outcome.dropped_notes.len(),
                notes.len()
            );
        }
    }
}
