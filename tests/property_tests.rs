use proptest::prelude::*;

use mend::config::Config;
use mend::core::{Diagnostic, DiagnosticKind, StyleRule};
use mend::score::{prioritize, ScoringModel};
use mend::Engine;

fn engine(max_iterations: usize) -> Engine {
    let mut config = Config::default();
    config.controller.max_iterations = max_iterations;
    Engine::new(config).expect("valid config")
}

/// Python fragments mixing clean code with every repairable defect.
fn fragment() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("x = 1\n"),
        Just("y = 2   \n"),
        Just("import os\n"),
        Just("import sys, json\nprint(json)\n"),
        Just("def foo()\n    pass\n"),
        Just("def bar():\n    return 1\n"),
        Just("def getValue():\n    \"\"\"Doc.\"\"\"\n    return 2\n"),
        Just("class thing:\n    pass\n"),
        Just("try:\n    pass\nexcept:\n    pass\n"),
        Just("if x:\n\t    pass\n"),
        Just("print(undefined_name)\n"),
        Just("values = [\"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\"]\n"),
    ]
}

fn kind() -> impl Strategy<Value = DiagnosticKind> {
    prop_oneof![
        Just(DiagnosticKind::ParseError),
        Just(DiagnosticKind::NamingViolation),
        Just(DiagnosticKind::BareExcept),
        Just(DiagnosticKind::MissingDocstring),
        Just(DiagnosticKind::HighComplexity),
        Just(DiagnosticKind::LongLine),
        Just(DiagnosticKind::Style(StyleRule::TrailingWhitespace)),
        Just(DiagnosticKind::Style(StyleRule::MixedIndentation)),
        Just(DiagnosticKind::UndefinedName),
        Just(DiagnosticKind::UnusedImport),
    ]
}

fn diagnostics() -> impl Strategy<Value = Vec<Diagnostic>> {
    prop::collection::vec((kind(), 1usize..200, 0.0f64..=1.0), 0..40).prop_map(|items| {
        items
            .into_iter()
            .map(|(kind, line, severity)| {
                let mut d = Diagnostic::new(kind, line, kind.as_str());
                d.severity = severity;
                d
            })
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Scoring properties
// ---------------------------------------------------------------------------

proptest! {
    /// Every dimension stays within [floor, 1] and the gap within [0, 2].
    #[test]
    fn quality_vector_is_bounded(diags in diagnostics()) {
        let model = ScoringModel::default();
        let (v, score) = model.evaluate(&diags);
        for value in v.as_array() {
            prop_assert!((0.2..=1.0).contains(&value), "dimension out of range: {value}");
        }
        prop_assert!((0.0..=2.0).contains(&score.gap));
        prop_assert!(score.harmony > 0.0);
    }

    /// Removing a diagnostic never lowers any dimension.
    #[test]
    fn fewer_diagnostics_never_score_lower(diags in diagnostics(), drop in 0usize..40) {
        prop_assume!(!diags.is_empty());
        let model = ScoringModel::default();
        let mut fewer = diags.clone();
        fewer.remove(drop % diags.len());
        let full = model.score(&diags).as_array();
        let reduced = model.score(&fewer).as_array();
        for (a, b) in full.iter().zip(reduced.iter()) {
            prop_assert!(b >= a);
        }
    }

    /// Priority order is a permutation sorted by dimension rank.
    #[test]
    fn prioritize_is_sorted_permutation(diags in diagnostics()) {
        let sorted = prioritize(&diags);
        prop_assert_eq!(sorted.len(), diags.len());
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].dimension.priority() <= pair[1].dimension.priority());
        }
    }
}

// ---------------------------------------------------------------------------
// Heal properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// found >= healed, and the difference is what remains.
    #[test]
    fn gaps_found_cover_gaps_healed(parts in prop::collection::vec(fragment(), 0..6)) {
        let source = parts.concat();
        let result = engine(20).heal(&source, "prop.py").unwrap();
        prop_assert!(result.total_gaps_found >= result.total_gaps_healed);
        prop_assert_eq!(
            result.total_gaps_found - result.total_gaps_healed,
            result.remaining.len()
        );
    }

    /// Cost after each iteration never exceeds the previous one, except on
    /// the iteration that makes a broken buffer parse again.
    #[test]
    fn cost_is_monotonic(parts in prop::collection::vec(fragment(), 0..6)) {
        let source = parts.concat();
        let result = engine(20).heal(&source, "prop.py").unwrap();
        for it in result.history.iter().filter(|it| !it.parse_restored) {
            prop_assert!(it.cost_after <= it.cost_before + 1e-12);
        }
        for pair in result.history.windows(2).filter(|p| !p[1].parse_restored) {
            prop_assert!(pair[1].cost_after <= pair[0].cost_after + 1e-12);
        }
        prop_assert!(result.history.iter().filter(|it| it.parse_restored).count() <= 1);
    }

    /// A run never exceeds its iteration ceiling.
    #[test]
    fn heal_terminates_within_ceiling(
        parts in prop::collection::vec(fragment(), 0..6),
        ceiling in 1usize..6,
    ) {
        let source = parts.concat();
        let result = engine(ceiling).heal(&source, "prop.py").unwrap();
        prop_assert!(result.total_iterations >= 1);
        prop_assert!(result.total_iterations <= ceiling);
        prop_assert_eq!(result.history.len(), result.total_iterations);
    }

    /// Healing a converged result changes nothing.
    #[test]
    fn heal_is_idempotent_when_converged(parts in prop::collection::vec(fragment(), 0..6)) {
        let source = parts.concat();
        let engine = engine(20);
        let first = engine.heal(&source, "prop.py").unwrap();
        prop_assume!(first.convergence_achieved);
        let second = engine.heal(&first.healed_source, "prop.py").unwrap();
        prop_assert_eq!(second.healed_source, first.healed_source);
    }

    /// Every quality vector in the history is bounded.
    #[test]
    fn history_vectors_are_bounded(parts in prop::collection::vec(fragment(), 0..6)) {
        let source = parts.concat();
        let result = engine(20).heal(&source, "prop.py").unwrap();
        for it in &result.history {
            for value in it.quality_before.as_array().into_iter().chain(it.quality_after.as_array()) {
                prop_assert!((0.2..=1.0).contains(&value));
            }
        }
    }
}
