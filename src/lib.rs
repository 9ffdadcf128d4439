//! # Pageplan
//!
//! A placement planner for print-publication layouts.
//!
//! Given a page's column geometry and a set of measured notes (title +
//! body + optional image), pageplan decides how to place each note into
//! the column grid so vertical space is used efficiently and overflow or
//! omission is minimized. The planner is a bounded-width beam search over
//! note placements — a heuristic, not an exact solver.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    — Page geometry, notes, plan request
//!       ↓
//!   [style]    — Typographic density, image presets, capacity model
//!       ↓
//!   [variants] — Candidate layouts per note, with footprints + penalties
//!       ↓
//!   [solver]   — Beam search: scored assignment of notes to columns
//!       ↓
//!   [report]   — Human-readable outcome summary
//! ```
//!
//! Parsing the page description, extracting note text, and writing block
//! files are external collaborators — this crate only sees measurements
//! and only produces placement decisions.

pub mod error;
pub mod model;
pub mod report;
pub mod solver;
pub mod style;
pub mod variants;

use std::collections::BTreeMap;

use error::PlanError;
use model::{Note, PageGeometry, PlanRequest};
use solver::{PlanSettings, SolverOutcome};
use style::CapacityModel;
use variants::NoteVariant;

/// Plan the placement of `notes` on one page.
///
/// This is the primary entry point. `variants_by_note` is an optional
/// precomputed catalog; notes without an entry fall back to a single
/// on-the-fly variant.
pub fn plan(
    page: &PageGeometry,
    notes: &[Note],
    capacity_model: &CapacityModel,
    settings: &PlanSettings,
    variants_by_note: Option<&BTreeMap<String, Vec<NoteVariant>>>,
) -> SolverOutcome {
    solver::solve(page, notes, capacity_model, settings, variants_by_note)
}

/// Plan a page described as JSON, returning the outcome as JSON.
///
/// Builds the capacity model from the request's typography and presets,
/// generates the full variant catalog, and solves.
pub fn plan_json(json: &str) -> Result<String, PlanError> {
    let request: PlanRequest = serde_json::from_str(json)?;
    let capacity_model = CapacityModel::new(request.typography, request.image_presets);
    let catalog = variants::generate_catalog(
        &request.notes,
        &capacity_model,
        &variants::DEFAULT_TITLE_SPANS,
        request.settings.default_title_level,
    );
    let outcome = plan(
        &request.page,
        &request.notes,
        &capacity_model,
        &request.settings,
        Some(&catalog),
    );
    Ok(serde_json::to_string_pretty(&outcome)?)
}
