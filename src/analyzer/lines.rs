//! Raw text checks that need no syntax tree.

use super::tree::StringRows;
use crate::config::AnalyzerConfig;
use crate::core::{Diagnostic, DiagnosticKind, StyleRule};

/// Scan every line for length, trailing whitespace and mixed indentation.
pub fn scan(source: &str, config: &AnalyzerConfig, strings: &StringRows) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (idx, raw) in source.split('\n').enumerate() {
        let line_no = idx + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        let length = line.chars().count();
        if length > config.max_line_length {
            let diag = Diagnostic::new(
                DiagnosticKind::LongLine,
                line_no,
                format!(
                    "Line is {length} characters (max {})",
                    config.max_line_length
                ),
            )
            .with_column(config.max_line_length);
            // Text inside a multi-line string or a comment has no break point.
            let in_string =
                strings.starts_inside.contains(&line_no) || strings.ends_inside.contains(&line_no);
            let comment_only = line.trim_start().starts_with('#');
            out.push(if in_string || comment_only {
                diag.report_only()
            } else {
                diag
            });
        }

        let trimmed = line.trim_end();
        if trimmed.len() != line.len()
            && !trimmed.is_empty()
            && !strings.ends_inside.contains(&line_no)
        {
            out.push(
                Diagnostic::new(
                    DiagnosticKind::Style(StyleRule::TrailingWhitespace),
                    line_no,
                    "Trailing whitespace",
                )
                .with_column(trimmed.chars().count()),
            );
        }

        let body = line.trim_start_matches([' ', '\t']);
        let leading = &line[..line.len() - body.len()];
        if leading.contains('\t')
            && leading.contains(' ')
            && !strings.starts_inside.contains(&line_no)
        {
            out.push(Diagnostic::new(
                DiagnosticKind::Style(StyleRule::MixedIndentation),
                line_no,
                "Indentation mixes tabs and spaces",
            ));
        }
    }
    out
}
