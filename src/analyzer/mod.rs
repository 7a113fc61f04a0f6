//! Defect detection for Python source.
//!
//! [`Analyzer::analyze`] parses the buffer once. A parse failure yields a
//! single blocking diagnostic and nothing else. Otherwise the output is the
//! tree-walk findings, then the line scan, then the name cross reference,
//! each in document order.

pub mod lines;
pub mod names;
pub mod naming;
pub mod tree;

use tracing::debug;

use crate::config::{AnalyzerConfig, Config};
use crate::core::{Diagnostic, DiagnosticKind, Result};
use crate::parser::{recovery, Parser, SyntaxError};

/// Detects diagnostics in a source buffer.
pub struct Analyzer {
    parser: Parser,
    config: AnalyzerConfig,
    indent_width: usize,
}

impl Analyzer {
    /// Create an analyzer with its own parser.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            parser: Parser::new()?,
            config: config.analyzer.clone(),
            indent_width: config.repair.indent_width,
        })
    }

    /// Analyze `source`. `name` is only used in messages.
    pub fn analyze(&self, source: &str, name: &str) -> Vec<Diagnostic> {
        let parsed = match self.parser.parse(source) {
            Ok(parsed) => parsed,
            Err(err) => return vec![self.parse_error(source, name, &err)],
        };

        let findings = tree::walk(&parsed, &self.config);
        let mut diagnostics = findings.diagnostics;
        diagnostics.extend(lines::scan(source, &self.config, &findings.strings));
        diagnostics.extend(findings.names.into_diagnostics());

        debug!(file = name, count = diagnostics.len(), "analysis complete");
        diagnostics
    }

    fn parse_error(&self, source: &str, name: &str, err: &SyntaxError) -> Diagnostic {
        let lines: Vec<&str> = source.split('\n').collect();
        let message = format!("Syntax error in {name}: {}", err.message);
        let diag = Diagnostic::new(DiagnosticKind::ParseError, err.line, message)
            .with_column(err.column);
        match recovery::suggest(&lines, err, self.indent_width) {
            Some(fix) => {
                debug!(file = name, line = fix.line, heuristic = fix.heuristic, "parse fix proposed");
                Diagnostic {
                    line: fix.line,
                    column: 0,
                    ..diag.with_fix(fix.text)
                }
            }
            None => {
                debug!(file = name, line = err.line, "no parse fix found");
                diag
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Dim, StyleRule};

    fn analyze(source: &str) -> Vec<Diagnostic> {
        Analyzer::new(&Config::default())
            .unwrap()
            .analyze(source, "test.py")
    }

    fn kinds(diags: &[Diagnostic]) -> Vec<DiagnosticKind> {
        diags.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_clean_source() {
        let source = "\"\"\"Module.\"\"\"\n\n\ndef add(a, b):\n    \"\"\"Add two numbers.\"\"\"\n    return a + b\n";
        assert!(analyze(source).is_empty());
    }

    #[test]
    fn test_parse_error_is_single_and_blocking() {
        let diags = analyze("def foo()\n    pass   \n");
        assert_eq!(diags.len(), 1);
        let d = &diags[0];
        assert_eq!(d.kind, DiagnosticKind::ParseError);
        assert_eq!(d.severity, 1.0);
        assert_eq!(d.dimension, Dim::Validity);
        assert_eq!(d.line, 1);
        assert_eq!(d.suggested_fix.as_deref(), Some("def foo():"));
    }

    #[test]
    fn test_missing_docstring() {
        let diags = analyze("def add(a, b):\n    return a + b\n");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::MissingDocstring]);
        assert_eq!(diags[0].line, 1);
        assert_eq!(diags[0].symbol.as_deref(), Some("add"));
    }

    #[test]
    fn test_parenthesized_docstring_counts() {
        let source = "def f():\n    (\"Implicitly \"\n     \"joined.\")\n    return 1\n";
        assert!(analyze(source).is_empty());
    }

    #[test]
    fn test_class_docstring_and_naming() {
        let diags = analyze("class my_thing:\n    pass\n");
        assert_eq!(
            kinds(&diags),
            vec![DiagnosticKind::NamingViolation, DiagnosticKind::MissingDocstring]
        );
        assert_eq!(diags[0].suggested_fix.as_deref(), Some("MyThing"));
    }

    #[test]
    fn test_function_naming() {
        let diags = analyze("def getValue():\n    \"\"\"Doc.\"\"\"\n    return 1\n");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::NamingViolation]);
        assert_eq!(diags[0].suggested_fix.as_deref(), Some("get_value"));
        assert!(diags[0].fixable);
    }

    #[test]
    fn test_referenced_bad_name_is_report_only() {
        let diags = analyze("def getValue():\n    \"\"\"Doc.\"\"\"\n    return 1\n\n\nx = getValue()\n");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::NamingViolation]);
        assert!(!diags[0].fixable);
        assert_eq!(diags[0].suggested_fix, None);
    }

    #[test]
    fn test_private_names_skip_naming() {
        let diags = analyze("def _Helper():\n    \"\"\"Doc.\"\"\"\n    return 1\n");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_bare_except() {
        let diags = analyze("try:\n    value = 1\nexcept:\n    pass\n");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::BareExcept]);
        assert_eq!(diags[0].line, 3);
        assert_eq!(diags[0].suggested_fix.as_deref(), Some("except Exception:"));
    }

    #[test]
    fn test_typed_except_is_fine() {
        let diags = analyze("try:\n    value = 1\nexcept ValueError as err:\n    print(err)\n");
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_high_complexity() {
        let mut source = String::from("def branchy(x):\n    \"\"\"Doc.\"\"\"\n");
        for i in 0..11 {
            source.push_str(&format!("    if x == {i}:\n        return {i}\n"));
        }
        source.push_str("    return -1\n");
        let diags = analyze(&source);
        assert_eq!(kinds(&diags), vec![DiagnosticKind::HighComplexity]);
        assert!(!diags[0].fixable);
        assert!(diags[0].message.contains("12"));
    }

    #[test]
    fn test_complexity_at_threshold_is_fine() {
        let mut source = String::from("def branchy(x):\n    \"\"\"Doc.\"\"\"\n");
        for i in 0..9 {
            source.push_str(&format!("    if x == {i}:\n        return {i}\n"));
        }
        source.push_str("    return -1\n");
        assert!(analyze(&source).is_empty());
    }

    #[test]
    fn test_nested_function_counted_separately() {
        let mut source = String::from("def outer(x):\n    \"\"\"Doc.\"\"\"\n");
        source.push_str("    def inner(y):\n        \"\"\"Doc.\"\"\"\n");
        for i in 0..6 {
            source.push_str(&format!("        if y == {i}:\n            return {i}\n"));
        }
        source.push_str("        return 0\n");
        for i in 0..6 {
            source.push_str(&format!("    if x == {i}:\n        return {i}\n"));
        }
        source.push_str("    return inner(x)\n");
        assert!(analyze(&source).is_empty());
    }

    #[test]
    fn test_undefined_name() {
        let diags = analyze("\"\"\"Doc.\"\"\"\nprint(missing_value)\n");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::UndefinedName]);
        assert_eq!(diags[0].dimension, Dim::Correctness);
        assert!(!diags[0].fixable);
    }

    #[test]
    fn test_bindings_cover_common_forms() {
        let source = "\
import os.path
from typing import List as L
with open(os.path.join('a', 'b')) as handle:
    data = handle.read()
for index, item in enumerate(data):
    print(index, item)
squares = [n * n for n in range(3)]
if (size := len(squares)) > 2:
    print(size)
handler = lambda event, *rest, **extra: (event, rest, extra)
typed: L = []
print(typed, handler)
";
        let diags = analyze(source);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_parameters_are_bound() {
        let source = "def run(a, b=1, *args, c: int = 2, d: str, **kwargs):\n    \"\"\"Doc.\"\"\"\n    return (a, b, args, c, d, kwargs)\n";
        assert!(analyze(source).is_empty());
    }

    #[test]
    fn test_keyword_argument_names_are_not_loads() {
        let source = "\"\"\"Doc.\"\"\"\nprint('x', sep='')\n";
        assert!(analyze(source).is_empty());
    }

    #[test]
    fn test_unused_import() {
        let diags = analyze("import os\nimport sys\nprint(sys.argv)\n");
        assert_eq!(kinds(&diags), vec![DiagnosticKind::UnusedImport]);
        assert_eq!(diags[0].symbol.as_deref(), Some("os"));
        assert_eq!(diags[0].line, 1);
    }

    #[test]
    fn test_future_import_is_never_unused() {
        assert!(analyze("from __future__ import annotations\n").is_empty());
    }

    #[test]
    fn test_wildcard_import_suppresses_undefined() {
        assert!(analyze("from os.path import *\nprint(join('a'))\n").is_empty());
    }

    #[test]
    fn test_docstring_whitespace_not_flagged() {
        let source = "def f():\n    \"\"\"Line one.   \n    line two.\n    \"\"\"\n    return 1\n";
        assert!(analyze(source).is_empty());
    }

    #[test]
    fn test_order_tree_then_lines_then_names() {
        let source = "import os\ndef f():   \n    return 1\n";
        let diags = analyze(source);
        assert_eq!(
            kinds(&diags),
            vec![
                DiagnosticKind::MissingDocstring,
                DiagnosticKind::Style(StyleRule::TrailingWhitespace),
                DiagnosticKind::UnusedImport,
            ]
        );
    }

    #[test]
    fn test_deterministic() {
        let source = "import os\nclass bad:\n    def Worse(self):\n        try:\n            x = 1\n        except:\n            pass\n";
        assert_eq!(analyze(source), analyze(source));
    }
}
