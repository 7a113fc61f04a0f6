//! Line-level heuristics for recovering from syntax errors.
//!
//! Tree-sitter reports where it gave up, which is often a line or two after
//! the real mistake. [`suggest`] tries each heuristic against the lines
//! around the reported error and returns the first single-line rewrite that
//! changes the text. The heuristic order is the priority order: a missing
//! block colon beats an unclosed bracket on the same candidate window.

use super::lexer::{self, SegmentKind};
use super::queries::BLOCK_KEYWORDS;
use super::SyntaxError;

/// A proposed replacement for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFix {
    /// 1-based line to replace.
    pub line: usize,
    /// Replacement text, without a line terminator.
    pub text: String,
    /// Which heuristic produced it.
    pub heuristic: &'static str,
}

type Heuristic = fn(&str, usize) -> Option<String>;

const HEURISTICS: &[(&str, Heuristic)] = &[
    ("add missing block colon", add_block_colon),
    ("close unterminated string", close_string),
    ("close unbalanced brackets", close_brackets),
    ("remove unmatched closing bracket", drop_stray_closer),
    ("expand tab indentation", expand_tabs),
];

/// Propose a fix for `error` in `lines`.
pub fn suggest<S: AsRef<str>>(
    lines: &[S],
    error: &SyntaxError,
    indent_width: usize,
) -> Option<LineFix> {
    let candidates = candidate_lines(lines.len(), error);
    for (name, heuristic) in HEURISTICS {
        for &line_no in &candidates {
            let original = lines[line_no - 1].as_ref();
            let line = original.strip_suffix('\r').unwrap_or(original);
            if let Some(mut text) = heuristic(line, indent_width) {
                if text == line {
                    continue;
                }
                if line.len() != original.len() {
                    text.push('\r');
                }
                return Some(LineFix {
                    line: line_no,
                    text,
                    heuristic: name,
                });
            }
        }
    }
    None
}

/// Lines worth trying, nearest the reported error first.
fn candidate_lines(total: usize, error: &SyntaxError) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    let first = error.line.clamp(1, total);
    let last = error.end_line.clamp(first, total).min(first + 2);
    let mut lines: Vec<usize> = (first..=last).collect();
    for back in 1..=2 {
        if first > back {
            lines.push(first - back);
        }
    }
    lines
}

fn leading_keyword(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    let word = &trimmed[..end];
    (!word.is_empty()).then_some(word)
}

fn code_end(line: &str) -> usize {
    let cut = lexer::comment_start(line).unwrap_or(line.len());
    line[..cut].trim_end().len()
}

fn add_block_colon(line: &str, _indent: usize) -> Option<String> {
    let word = leading_keyword(line)?;
    if !BLOCK_KEYWORDS.contains(&word) {
        return None;
    }
    let end = code_end(line);
    let code = line[..end].trim_start();
    if matches!(word, "else" | "try" | "finally") && code != word {
        return None;
    }
    if word == "async" {
        let rest = code["async".len()..].trim_start();
        if !(rest.starts_with("def ") || rest.starts_with("for ") || rest.starts_with("with ")) {
            return None;
        }
    }
    if code.ends_with('\\') || code.ends_with(':') {
        return None;
    }
    let segs = lexer::segments(line);
    if segs.iter().any(|s| s.kind == SegmentKind::Str && !s.terminated) {
        return None;
    }
    let scan = lexer::brackets(line);
    if scan.top_level_colon || !scan.open.is_empty() || scan.stray_closer.is_some() {
        return None;
    }
    Some(format!("{}:{}", &line[..end], &line[end..]))
}

fn close_string(line: &str, _indent: usize) -> Option<String> {
    let segs = lexer::segments(line);
    let last = segs.last()?;
    if last.kind != SegmentKind::Str || last.terminated || last.triple {
        return None;
    }
    let quote = line[last.start..].chars().find(|c| *c == '"' || *c == '\'')?;
    Some(format!("{line}{quote}"))
}

fn close_brackets(line: &str, _indent: usize) -> Option<String> {
    let segs = lexer::segments(line);
    if segs.iter().any(|s| s.kind == SegmentKind::Str && !s.terminated) {
        return None;
    }
    let scan = lexer::brackets(line);
    if scan.open.is_empty() {
        return None;
    }
    let end = code_end(line);
    let code = &line[..end];
    // A line ending in an opener is the start of a multi-line construct.
    if code.ends_with(['(', '[', '{']) {
        return None;
    }
    let closers: String = scan.open.iter().rev().map(|b| lexer::closer_for(*b)).collect();
    Some(format!("{code}{closers}{}", &line[end..]))
}

fn drop_stray_closer(line: &str, _indent: usize) -> Option<String> {
    let at = lexer::brackets(line).stray_closer?;
    let mut text = String::with_capacity(line.len());
    text.push_str(&line[..at]);
    text.push_str(&line[at + 1..]);
    Some(text)
}

/// Expand tabs in a line's indentation to `indent` spaces each.
pub fn expand_tabs(line: &str, indent: usize) -> Option<String> {
    let body = line.trim_start_matches([' ', '\t']);
    let leading = &line[..line.len() - body.len()];
    if !leading.contains('\t') {
        return None;
    }
    Some(format!("{}{body}", leading.replace('\t', &" ".repeat(indent))))
}
