//! Plain-text reports.
//!
//! Output is deterministic for a given input so reports can be diffed and
//! snapshot in tests. Colour, when wanted, is added by [`crate::output`].

use std::fmt::Write;

use crate::core::{Diagnostic, Dim};
use crate::engine::{Diagnosis, EngineResult};
use crate::score::{CompositeScore, QualityVector};

/// The diagnose report: diagnostics grouped by dimension in priority order,
/// then the quality vector and composite score.
pub fn diagnosis_text(diagnosis: &Diagnosis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Diagnosis for {}: {} diagnostic(s), cost {:.2}",
        diagnosis.name,
        diagnosis.diagnostics.len(),
        diagnosis.cost()
    );

    if diagnosis.diagnostics.is_empty() {
        out.push_str("\nNo issues found.\n");
    }
    for (dim, group) in group_by_dim(&diagnosis.diagnostics) {
        let _ = writeln!(out, "\n{} ({})", dim.label(), group.len());
        for d in group {
            let tag = if d.kind.is_blocking() {
                "blocking"
            } else if d.fixable {
                "fixable"
            } else {
                "manual"
            };
            let _ = writeln!(out, "  line {}: {} [{tag}]", d.line, d.message);
            if let Some(fix) = &d.suggested_fix {
                let _ = writeln!(out, "      suggestion: {}", fix.trim_end());
            }
        }
    }

    out.push('\n');
    let _ = writeln!(out, "Quality: {}", vector_line(&diagnosis.quality));
    let _ = writeln!(out, "Score:   {}", score_line(&diagnosis.score));
    out
}

/// Diagnostics per dimension, highest priority first, empty groups omitted.
/// Within a group, document order.
pub fn group_by_dim(diagnostics: &[Diagnostic]) -> Vec<(Dim, Vec<&Diagnostic>)> {
    let mut dims = Dim::ALL.to_vec();
    dims.sort_by_key(|d| d.priority());
    dims.into_iter()
        .map(|dim| {
            let group: Vec<&Diagnostic> =
                diagnostics.iter().filter(|d| d.dimension == dim).collect();
            (dim, group)
        })
        .filter(|(_, group)| !group.is_empty())
        .collect()
}

/// Short outcome of a heal run.
pub fn heal_summary(result: &EngineResult) -> String {
    let mut out = String::new();
    let status = if result.source_changed {
        "healed"
    } else {
        "unchanged"
    };
    let _ = writeln!(
        out,
        "{}: {status} after {} iteration(s) ({})",
        result.name, result.total_iterations, result.stop_reason
    );
    let _ = writeln!(
        out,
        "  gaps: {} found, {} healed, {} remaining",
        result.total_gaps_found,
        result.total_gaps_healed,
        result.remaining.len()
    );
    let _ = writeln!(
        out,
        "  harmony: {:.3} -> {:.3} ({:+.3}), phase {} -> {}",
        result.initial_score.harmony,
        result.final_score.harmony,
        result.improvement(),
        result.initial_score.phase,
        result.final_score.phase
    );
    let _ = writeln!(
        out,
        "  gap to ideal: {:.3} -> {:.3} ({:.0}% closed), cost {:.2} -> {:.2}",
        result.initial_score.gap,
        result.final_score.gap,
        result.gap_reduction() * 100.0,
        result.initial_cost,
        result.final_cost
    );
    if !result.convergence_achieved {
        out.push_str("  not converged\n");
        for d in &result.remaining {
            let _ = writeln!(out, "    line {}: {}", d.line, d.message);
        }
    }
    out
}

/// One line per iteration, then the final vector.
pub fn iteration_history(result: &EngineResult) -> String {
    let mut out = String::new();
    for it in &result.history {
        if it.converged {
            let _ = writeln!(
                out,
                "  #{:<2} converged with cost {:.3}",
                it.index, it.cost_before
            );
            continue;
        }
        let _ = write!(
            out,
            "  #{:<2} cost {:.3} -> {:.3}, diagnostics {} -> {}, {}/{} fix(es), efficiency {:.2}",
            it.index,
            it.cost_before,
            it.cost_after,
            it.diagnostics_before,
            it.diagnostics_after,
            it.successful_actions(),
            it.actions.len(),
            it.efficiency()
        );
        if it.rolled_back {
            out.push_str(" [rolled back]");
        }
        if it.parse_restored {
            out.push_str(" [parse restored]");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "  final: {}", vector_line(&result.final_quality));
    out
}

pub fn vector_line(v: &QualityVector) -> String {
    Dim::ALL
        .iter()
        .map(|dim| format!("{dim} {:.2}", v.get(*dim)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn score_line(s: &CompositeScore) -> String {
    format!(
        "harmony {:.3}, integration {:.3}, gap {:.3}, phase {}",
        s.harmony, s.integration, s.gap, s.phase
    )
}
