//! Source repair.
//!
//! [`RepairEngine::repair`] applies one strategy per fixable diagnostic,
//! bottom line first so that line numbers of pending diagnostics stay valid,
//! then runs a bounded syntax post-pass over the result. Every attempt is
//! recorded as a [`RepairAction`], including the ones that failed.

pub mod buffer;
pub mod strategies;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, RepairConfig};
use crate::core::{Diagnostic, DiagnosticKind, Result, StyleRule};
use crate::parser::{recovery, Parser};
use buffer::Buffer;

/// Why a strategy left the buffer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("line {0} is out of range")]
    LineOutOfRange(usize),

    #[error("fix would not change the line")]
    NoChange,

    #[error("no break point keeps every line within {0} characters")]
    NoBreakPoint(usize),

    #[error("'{0}' is referenced elsewhere")]
    NameReferenced(String),

    #[error("'{0}' is already in use")]
    NameCollision(String),

    #[error("definition has no block body")]
    NoBlockHeader,

    #[error("import statement form is not supported")]
    UnsupportedImport,

    #[error("diagnostic carries no symbol or replacement")]
    MissingSymbol,

    #[error("no syntax recovery heuristic applies")]
    NoParseFix,
}

/// A successful strategy's change to the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// First line written.
    pub line: usize,
    pub original: String,
    pub healed: String,
    pub description: String,
}

/// One attempted fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairAction {
    pub diagnostic: Diagnostic,
    pub original_span: String,
    pub healed_span: String,
    pub line: usize,
    /// Severity times the kind's cost factor; zero for failed attempts.
    pub cost: f64,
    pub success: bool,
    pub description: String,
}

impl RepairAction {
    fn applied(diagnostic: Diagnostic, edit: Edit) -> Self {
        let cost = diagnostic.severity * cost_factor(diagnostic.kind);
        Self {
            diagnostic,
            original_span: edit.original,
            healed_span: edit.healed,
            line: edit.line,
            cost,
            success: true,
            description: edit.description,
        }
    }

    fn failed(diagnostic: Diagnostic, reason: &FailureReason) -> Self {
        Self {
            line: diagnostic.line,
            diagnostic,
            original_span: String::new(),
            healed_span: String::new(),
            cost: 0.0,
            success: false,
            description: reason.to_string(),
        }
    }
}

/// Relative effort of fixing one diagnostic of `kind`.
pub fn cost_factor(kind: DiagnosticKind) -> f64 {
    match kind {
        DiagnosticKind::ParseError => 0.8,
        DiagnosticKind::NamingViolation => 0.6,
        DiagnosticKind::BareExcept => 0.5,
        DiagnosticKind::MissingDocstring | DiagnosticKind::LongLine => 0.4,
        DiagnosticKind::Style(StyleRule::MixedIndentation) | DiagnosticKind::UnusedImport => 0.3,
        DiagnosticKind::Style(StyleRule::TrailingWhitespace) => 0.2,
        DiagnosticKind::HighComplexity | DiagnosticKind::UndefinedName => 0.0,
    }
}

/// Settings a strategy may consult.
pub struct RepairContext<'a> {
    pub config: &'a RepairConfig,
    pub max_line_length: usize,
}

pub type Strategy =
    fn(&mut Buffer, &Diagnostic, &RepairContext<'_>) -> std::result::Result<Edit, FailureReason>;

/// The strategy for `kind`, if it is repairable at all.
pub fn strategy_for(kind: DiagnosticKind) -> Option<Strategy> {
    let strategy: Strategy = match kind {
        DiagnosticKind::ParseError => strategies::parse_error,
        DiagnosticKind::NamingViolation => strategies::rename_definition,
        DiagnosticKind::BareExcept => strategies::bare_except,
        DiagnosticKind::MissingDocstring => strategies::insert_docstring,
        DiagnosticKind::LongLine => strategies::long_line,
        DiagnosticKind::Style(StyleRule::TrailingWhitespace) => strategies::trailing_whitespace,
        DiagnosticKind::Style(StyleRule::MixedIndentation) => strategies::mixed_indentation,
        DiagnosticKind::UnusedImport => strategies::unused_import,
        DiagnosticKind::HighComplexity | DiagnosticKind::UndefinedName => return None,
    };
    Some(strategy)
}

/// True when the engine will attempt to fix `diagnostic`.
pub fn is_repairable(diagnostic: &Diagnostic) -> bool {
    diagnostic.fixable && strategy_for(diagnostic.kind).is_some()
}

/// Applies fix strategies to a source buffer.
pub struct RepairEngine {
    parser: Parser,
    config: RepairConfig,
    max_line_length: usize,
}

impl RepairEngine {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            parser: Parser::new()?,
            config: config.repair.clone(),
            max_line_length: config.analyzer.max_line_length,
        })
    }

    /// Repair `source` for the given diagnostics.
    ///
    /// Diagnostics that are not fixable, or have no strategy, are skipped
    /// without an action. The returned text is unchanged when nothing applied.
    pub fn repair(&self, source: &str, diagnostics: &[Diagnostic]) -> (String, Vec<RepairAction>) {
        let ctx = RepairContext {
            config: &self.config,
            max_line_length: self.max_line_length,
        };
        let mut pending: Vec<&Diagnostic> =
            diagnostics.iter().filter(|d| is_repairable(d)).collect();
        pending.sort_by(|a, b| b.line.cmp(&a.line));

        let mut buf = Buffer::new(source);
        let mut actions = Vec::with_capacity(pending.len() + 1);
        for diagnostic in pending {
            let Some(strategy) = strategy_for(diagnostic.kind) else {
                continue;
            };
            match strategy(&mut buf, diagnostic, &ctx) {
                Ok(edit) => {
                    debug!(
                        line = edit.line,
                        kind = diagnostic.kind.as_str(),
                        "{}",
                        edit.description
                    );
                    actions.push(RepairAction::applied(diagnostic.clone(), edit));
                }
                Err(reason) => {
                    warn!(
                        line = diagnostic.line,
                        kind = diagnostic.kind.as_str(),
                        "repair skipped: {reason}"
                    );
                    actions.push(RepairAction::failed(diagnostic.clone(), &reason));
                }
            }
        }

        self.syntax_post_pass(&mut buf, &mut actions);
        (buf.text(), actions)
    }

    /// Re-parse the repaired text and apply recovery heuristics until it
    /// parses, a pass changes nothing, or the pass limit is reached.
    fn syntax_post_pass(&self, buf: &mut Buffer, actions: &mut Vec<RepairAction>) {
        for _ in 0..self.config.max_syntax_passes {
            let text = buf.text();
            let Err(err) = self.parser.parse(&text) else {
                return;
            };
            let Some(fix) = recovery::suggest(buf.lines(), &err, self.config.indent_width) else {
                debug!(line = err.line, "no recovery for syntax error");
                return;
            };
            let diagnostic = Diagnostic::new(
                DiagnosticKind::ParseError,
                fix.line,
                format!("post-pass: {}", err.message),
            )
            .with_fix(fix.text.clone());
            let original = match buf.replace(fix.line, fix.text.clone()) {
                Ok(original) => original,
                Err(reason) => {
                    warn!(line = fix.line, "syntax post-pass failed: {reason}");
                    return;
                }
            };
            if original == fix.text {
                return;
            }
            debug!(line = fix.line, "post-pass: {}", fix.heuristic);
            let edit = Edit {
                line: fix.line,
                original,
                healed: fix.text,
                description: format!("post-pass: {}", fix.heuristic),
            };
            actions.push(RepairAction::applied(diagnostic, edit));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RepairEngine {
        RepairEngine::new(&Config::default()).unwrap()
    }

    fn trailing(line: usize) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::Style(StyleRule::TrailingWhitespace), line, "ws")
    }

    #[test]
    fn test_strategy_coverage() {
        assert!(strategy_for(DiagnosticKind::HighComplexity).is_none());
        assert!(strategy_for(DiagnosticKind::UndefinedName).is_none());
        assert!(strategy_for(DiagnosticKind::LongLine).is_some());
        assert!(strategy_for(DiagnosticKind::Style(StyleRule::MixedIndentation)).is_some());
    }

    #[test]
    fn test_cost_factor_scales_action_cost() {
        let (_, actions) = engine().repair("x = 1  \n", &[trailing(1)]);
        assert_eq!(actions.len(), 1);
        assert!(actions[0].success);
        assert!((actions[0].cost - 0.1 * 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_empty_diagnostics_is_identity() {
        let source = "def f():\n    return 1\n";
        let (healed, actions) = engine().repair(source, &[]);
        assert_eq!(healed, source);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_report_only_skipped_without_action() {
        let d = trailing(1).report_only();
        let (healed, actions) = engine().repair("x = 1  \n", &[d]);
        assert_eq!(healed, "x = 1  \n");
        assert!(actions.is_empty());
    }

    #[test]
    fn test_bottom_up_keeps_line_numbers() {
        let source = "def f():\n    return 1  \n\n\ndef g():\n    return 2  \n";
        let diagnostics = vec![
            Diagnostic::new(DiagnosticKind::MissingDocstring, 1, "doc").with_symbol("f"),
            trailing(2),
            Diagnostic::new(DiagnosticKind::MissingDocstring, 5, "doc").with_symbol("g"),
            trailing(6),
        ];
        let (healed, actions) = engine().repair(source, &diagnostics);
        assert!(actions.iter().all(|a| a.success));
        assert_eq!(
            healed,
            "def f():\n    \"\"\"Add documentation.\"\"\"\n    return 1\n\n\n\
             def g():\n    \"\"\"Add documentation.\"\"\"\n    return 2\n"
        );
    }

    #[test]
    fn test_failed_action_recorded() {
        let d = Diagnostic::new(DiagnosticKind::NamingViolation, 1, "name")
            .with_symbol("getValue")
            .with_fix("get_value");
        let source = "def getValue():\n    pass\ngetValue()\n";
        let (healed, actions) = engine().repair(source, &[d]);
        assert_eq!(healed, source);
        assert_eq!(actions.len(), 1);
        assert!(!actions[0].success);
        assert_eq!(actions[0].cost, 0.0);
        assert!(actions[0].description.contains("referenced"));
    }

    #[test]
    fn test_post_pass_fixes_remaining_syntax() {
        let source = "def foo()\n    pass\nif x\n    pass\n";
        let d = Diagnostic::new(DiagnosticKind::ParseError, 1, "syntax").with_fix("def foo():");
        let (healed, actions) = engine().repair(source, &[d]);
        assert_eq!(healed, "def foo():\n    pass\nif x:\n    pass\n");
        assert!(actions
            .iter()
            .any(|a| a.description.starts_with("post-pass")));
    }

    #[test]
    fn test_post_pass_gives_up_on_unrecoverable() {
        let source = "x = = 1\n";
        let (healed, actions) = engine().repair(source, &[]);
        assert_eq!(healed, source);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_crlf_preserved() {
        let source = "x = 1 \r\ny = 2\r\n";
        let (healed, _) = engine().repair(source, &[trailing(1)]);
        assert_eq!(healed, "x = 1\r\ny = 2\r\n");
    }
}
