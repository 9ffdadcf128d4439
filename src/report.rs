//! Outcome summary formatting. Pure text, no side effects.

use crate::solver::SolverOutcome;

/// One-line human-readable summary: placed count, dropped count, and the
/// per-column gap list.
pub fn summarize(outcome: &SolverOutcome) -> String {
    let gaps = outcome
        .column_gaps_mm
        .iter()
        .map(|gap| format!("{:.1}mm", gap))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} placed · {} dropped · gaps: [{}]",
        outcome.assignments.len(),
        outcome.dropped_notes.len(),
        gaps
    )
}
