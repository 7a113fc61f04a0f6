//! End-to-end heal scenarios through the public engine.

use mend::config::Config;
use mend::controller::StopReason;
use mend::core::{DiagnosticKind, StyleRule};
use mend::Engine;

fn engine() -> Engine {
    Engine::new(Config::default()).expect("default config is valid")
}

#[test]
fn missing_colon_is_fixed_and_converges() {
    let result = engine().heal("def foo()\n    pass", "foo.py").unwrap();
    assert_eq!(result.healed_source.lines().next(), Some("def foo():"));
    assert!(result.convergence_achieved);
    assert_eq!(result.stop_reason, StopReason::Converged);
    assert!(result.total_iterations <= 3);
}

#[test]
fn bare_except_gets_explicit_type() {
    let source = "\"\"\"Module.\"\"\"\n\ntry:\n    risky()\nexcept:\n    pass\n";
    let result = engine().heal(source, "except.py").unwrap();
    assert!(result.healed_source.contains("except Exception:"));
    assert!(!result.healed_source.contains("except:"));
}

#[test]
fn trailing_whitespace_removed_in_one_iteration() {
    let result = engine().heal("x = 1   \n", "ws.py").unwrap();
    assert_eq!(result.healed_source, "x = 1\n");

    let first = &result.history[0];
    assert_eq!(first.diagnostics_before, 1);
    assert_eq!(first.diagnostics_after, 0);
    assert_eq!(
        first.actions[0].diagnostic.kind,
        DiagnosticKind::Style(StyleRule::TrailingWhitespace)
    );
    assert!(result.remaining.is_empty());
}

#[test]
fn missing_docstring_inserts_exactly_one_line() {
    let source = "def add(a, b):\n    return a + b\n";
    let result = engine().heal(source, "doc.py").unwrap();

    let before: Vec<&str> = source.lines().collect();
    let after: Vec<&str> = result.healed_source.lines().collect();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1].trim(), "\"\"\"Add documentation.\"\"\"");
    assert_eq!(&after[2..], &before[1..]);
}

#[test]
fn clean_input_is_untouched() {
    let source = "\"\"\"Module.\"\"\"\n\n\ndef add(a, b):\n    \"\"\"Add.\"\"\"\n    return a + b\n";
    let result = engine().heal(source, "clean.py").unwrap();
    assert!(!result.source_changed);
    assert_eq!(result.healed_source, source);
    assert_eq!(result.total_gaps_found, 0);
    assert_eq!(result.total_iterations, 1);
    assert!(result.history[0].converged);
    assert!(result.convergence_achieved);
}

#[test]
fn unfixable_complexity_is_not_reported_as_converged() {
    let mut source = String::from("def route(x):\n    \"\"\"Dispatch.\"\"\"\n");
    for i in 0..12 {
        source.push_str(&format!("    if x == {i}:\n        return {i}\n"));
    }
    source.push_str("    return None\n");

    let result = engine().heal(&source, "complex.py").unwrap();
    assert!(result
        .remaining
        .iter()
        .any(|d| d.kind == DiagnosticKind::HighComplexity));
    assert!(!result.convergence_achieved);
    assert_eq!(result.stop_reason, StopReason::Stagnated);
    assert!(!result.history.iter().any(|it| it.converged));
}

#[test]
fn unrecoverable_syntax_stays_reported() {
    let source = "x = = 1\n";
    let result = engine().heal(source, "bad.py").unwrap();
    assert_eq!(result.healed_source, source);
    assert_eq!(result.remaining.len(), 1);
    assert_eq!(result.remaining[0].kind, DiagnosticKind::ParseError);
    assert!(!result.convergence_achieved);
}

#[test]
fn referenced_bad_name_is_left_alone() {
    let source = "def getValue():\n    \"\"\"Doc.\"\"\"\n    return 1\n\n\nprint(getValue())\n";
    let result = engine().heal(source, "names.py").unwrap();
    assert!(result.healed_source.contains("def getValue():"));
    let naming: Vec<_> = result
        .remaining
        .iter()
        .filter(|d| d.kind == DiagnosticKind::NamingViolation)
        .collect();
    assert_eq!(naming.len(), 1);
    assert!(!naming[0].fixable);
    assert!(result.history.iter().all(|it| it.actions.is_empty()));
    assert_eq!(result.stop_reason, StopReason::Stagnated);
}

#[test]
fn restored_parse_is_kept_when_hidden_defects_surface() {
    let source = "import os\nimport sys\n\n\ndef foo()\n    return 1\n\n\ndef bar():\n    return 2\n\n\ndef baz():\n    return 3\n";
    let result = engine().heal(source, "hidden.py").unwrap();

    let first = &result.history[0];
    assert!(first.parse_restored);
    assert!(!first.rolled_back);
    assert!(first.cost_after > first.cost_before);
    assert_eq!(result.healed_source.lines().nth(4), Some("def foo():"));
    assert!(result
        .remaining
        .iter()
        .all(|d| d.kind != DiagnosticKind::ParseError));
    assert!(result.convergence_achieved, "{:?}", result.remaining);
    assert_eq!(result.stop_reason, StopReason::Converged);
}

#[test]
fn unbreakable_lines_do_not_starve_later_repairs() {
    let mut source = String::from("\"\"\"Module.\"\"\"\n\n\ndef run():\n    \"\"\"Run.\"\"\"\n");
    for i in 0..12 {
        source.push_str(&format!("    v{i} = 1{}\n", "0".repeat(110)));
    }
    source.push_str("    try:\n        return v0\n    except:\n        return None\n");

    let result = engine().heal(&source, "wide.py").unwrap();
    assert!(result.healed_source.contains("    except Exception:"));
    assert!(result
        .remaining
        .iter()
        .all(|d| d.kind == DiagnosticKind::LongLine));
    assert_eq!(result.remaining.len(), 12);
    assert_eq!(result.stop_reason, StopReason::Stagnated);

    let long_line_attempts = result
        .history
        .iter()
        .flat_map(|it| &it.actions)
        .filter(|a| a.diagnostic.kind == DiagnosticKind::LongLine)
        .count();
    assert_eq!(long_line_attempts, 12);
}

#[test]
fn last_allowed_iteration_that_cleans_reports_converged() {
    let config = Config {
        controller: mend::config::ControllerConfig {
            max_iterations: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let result = Engine::new(config).unwrap().heal("x = 1   \n", "ws.py").unwrap();
    assert_eq!(result.total_iterations, 1);
    assert!(result.convergence_achieved);
    assert_eq!(result.stop_reason, StopReason::Converged);
}

#[test]
fn mixed_defects_heal_to_parseable_source() {
    let source = "import os\nimport sys, json\n\n\ndef loadConfig(path):\n    try:\n        handle = open(path)   \n    except:\n        return None\n    return json.load(handle)\n";
    let result = engine().heal(source, "mixed.py").unwrap();
    assert!(result.convergence_achieved, "{:?}", result.remaining);
    assert!(result.healed_source.contains("def load_config(path):"));
    assert!(result.healed_source.contains("except Exception:"));
    assert!(result.healed_source.contains("import json"));
    assert!(!result.healed_source.contains("sys"));
    assert!(result.final_score.harmony > result.initial_score.harmony);
    assert_eq!(
        result.total_gaps_found - result.total_gaps_healed,
        result.remaining.len()
    );
}

#[test]
fn heal_is_idempotent_after_convergence() {
    let engine = engine();
    let first = engine.heal("def foo()\n    pass", "foo.py").unwrap();
    let second = engine.heal(&first.healed_source, "foo.py").unwrap();
    assert_eq!(second.healed_source, first.healed_source);
    assert!(!second.source_changed);
}
