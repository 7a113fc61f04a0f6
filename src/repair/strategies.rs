//! Fix strategies, one per repairable diagnostic kind.
//!
//! Each strategy re-reads the current text of the lines it touches, so
//! several edits on the same line compose. A strategy never panics on odd
//! input; it returns a [`FailureReason`] instead.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use super::buffer::{is_blank_or_comment, leading_ws, split_eol, Buffer};
use super::{Edit, FailureReason, RepairContext};
use crate::analyzer::naming;
use crate::core::Diagnostic;
use crate::parser::lexer::{self, Segment, SegmentKind};
use crate::parser::{recovery, SyntaxError};

static BARE_EXCEPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bexcept\s*:").expect("valid regex"));

/// Lines scanned below a definition looking for the end of its header.
const MAX_HEADER_LINES: usize = 20;

fn replace_line(
    buf: &mut Buffer,
    line: usize,
    text: String,
    description: impl Into<String>,
) -> Result<Edit, FailureReason> {
    if buf.line(line)? == text {
        return Err(FailureReason::NoChange);
    }
    let original = buf.replace(line, text.clone())?;
    Ok(Edit {
        line,
        original,
        healed: text,
        description: description.into(),
    })
}

fn width(s: &str) -> usize {
    s.chars().count()
}

/// Apply the suggested parse fix, or recompute one around the diagnostic.
pub fn parse_error(
    buf: &mut Buffer,
    d: &Diagnostic,
    ctx: &RepairContext<'_>,
) -> Result<Edit, FailureReason> {
    if let Some(fix) = &d.suggested_fix {
        return replace_line(buf, d.line, fix.clone(), "apply suggested syntax fix");
    }
    let err = SyntaxError {
        line: d.line,
        end_line: d.line,
        column: d.column,
        message: d.message.clone(),
    };
    let fix = recovery::suggest(buf.lines(), &err, ctx.config.indent_width)
        .ok_or(FailureReason::NoParseFix)?;
    replace_line(buf, fix.line, fix.text, fix.heuristic)
}

pub fn trailing_whitespace(
    buf: &mut Buffer,
    d: &Diagnostic,
    _ctx: &RepairContext<'_>,
) -> Result<Edit, FailureReason> {
    let (body, eol) = split_eol(buf.line(d.line)?);
    let text = format!("{}{eol}", body.trim_end());
    replace_line(buf, d.line, text, "strip trailing whitespace")
}

pub fn mixed_indentation(
    buf: &mut Buffer,
    d: &Diagnostic,
    ctx: &RepairContext<'_>,
) -> Result<Edit, FailureReason> {
    let (body, eol) = split_eol(buf.line(d.line)?);
    let expanded =
        recovery::expand_tabs(body, ctx.config.indent_width).ok_or(FailureReason::NoChange)?;
    let text = format!("{expanded}{eol}");
    replace_line(buf, d.line, text, "expand tabs in indentation")
}

pub fn bare_except(
    buf: &mut Buffer,
    d: &Diagnostic,
    _ctx: &RepairContext<'_>,
) -> Result<Edit, FailureReason> {
    let current = buf.line(d.line)?;
    if !BARE_EXCEPT.is_match(current) {
        return Err(FailureReason::NoChange);
    }
    let replacement = d.suggested_fix.as_deref().unwrap_or("except Exception:");
    let text = BARE_EXCEPT
        .replace(current, NoExpand(replacement))
        .into_owned();
    replace_line(buf, d.line, text, "name an explicit exception type")
}

fn word_pattern(word: &str) -> Result<Regex, FailureReason> {
    Regex::new(&format!(r"\b{}\b", regex::escape(word)))
        .map_err(|_| FailureReason::MissingSymbol)
}

/// Rename a definition, but only when nothing else mentions it.
pub fn rename_definition(
    buf: &mut Buffer,
    d: &Diagnostic,
    _ctx: &RepairContext<'_>,
) -> Result<Edit, FailureReason> {
    let symbol = d.symbol.as_deref().ok_or(FailureReason::MissingSymbol)?;
    let new_name = d
        .suggested_fix
        .as_deref()
        .ok_or(FailureReason::MissingSymbol)?;

    let source = buf.text();
    if naming::occurrences(&source, symbol) != 1 {
        return Err(FailureReason::NameReferenced(symbol.to_string()));
    }
    if naming::occurrences(&source, new_name) > 0 {
        return Err(FailureReason::NameCollision(new_name.to_string()));
    }

    let old = word_pattern(symbol)?;
    let current = buf.line(d.line)?;
    if !old.is_match(current) {
        return Err(FailureReason::NoChange);
    }
    let text = old.replacen(current, 1, NoExpand(new_name)).into_owned();
    replace_line(buf, d.line, text, format!("rename '{symbol}' to '{new_name}'"))
}

/// Last line of the `def`/`class` header starting at `start`.
fn header_end(buf: &Buffer, start: usize) -> Result<usize, FailureReason> {
    let last = (start + MAX_HEADER_LINES).min(buf.len());
    let mut depth = 0;
    for n in start..=last {
        let (body, _) = split_eol(buf.line(n)?);
        depth += lexer::bracket_delta(body);
        if depth > 0 {
            continue;
        }
        let code_end = lexer::comment_start(body).unwrap_or(body.len());
        if body[..code_end].trim_end().ends_with(':') {
            return Ok(n);
        }
        if n == start && lexer::brackets(body).top_level_colon {
            // `def f(): return 1` has no block to put a docstring in.
            return Err(FailureReason::NoBlockHeader);
        }
    }
    Err(FailureReason::NoBlockHeader)
}

/// Insert a placeholder docstring as the first statement of the body.
pub fn insert_docstring(
    buf: &mut Buffer,
    d: &Diagnostic,
    ctx: &RepairContext<'_>,
) -> Result<Edit, FailureReason> {
    let end = header_end(buf, d.line)?;
    let (def_line, eol) = split_eol(buf.line(d.line)?);
    let def_indent = leading_ws(def_line);

    let body_indent = buf
        .lines()
        .iter()
        .skip(end)
        .find(|l| !l.trim().is_empty())
        .map(|l| leading_ws(l))
        .filter(|ws| ws.len() > def_indent.len());
    let indent = match body_indent {
        Some(ws) => ws.to_string(),
        None => format!("{def_indent}{}", " ".repeat(ctx.config.indent_width)),
    };

    let text = format!(
        "{indent}\"\"\"{}\"\"\"{eol}",
        ctx.config.docstring_placeholder
    );
    buf.insert_after(end, text.clone())?;
    Ok(Edit {
        line: end + 1,
        original: String::new(),
        healed: text,
        description: format!(
            "insert docstring for '{}'",
            d.symbol.as_deref().unwrap_or("definition")
        ),
    })
}

fn bound_name(element: &str, from_import: bool) -> &str {
    if let Some((_, alias)) = element.split_once(" as ") {
        return alias.trim();
    }
    if from_import {
        element
    } else {
        element.split('.').next().unwrap_or(element)
    }
}

/// The statement on line `n` is the only one in its block.
fn is_sole_statement(buf: &Buffer, n: usize) -> bool {
    let lines = buf.lines();
    let indent = leading_ws(&lines[n - 1]).len();
    let opens_block = lines[..n - 1]
        .iter()
        .rev()
        .find(|l| !is_blank_or_comment(l))
        .is_some_and(|prev| {
            let (body, _) = split_eol(prev);
            let code_end = lexer::comment_start(body).unwrap_or(body.len());
            body[..code_end].trim_end().ends_with(':')
        });
    if !opens_block {
        return false;
    }
    lines[n..]
        .iter()
        .find(|l| !is_blank_or_comment(l))
        .is_none_or(|next| leading_ws(next).len() < indent)
}

/// Drop an unused name from an import, or comment the import out.
pub fn unused_import(
    buf: &mut Buffer,
    d: &Diagnostic,
    _ctx: &RepairContext<'_>,
) -> Result<Edit, FailureReason> {
    let symbol = d.symbol.as_deref().ok_or(FailureReason::MissingSymbol)?;
    let (body, eol) = split_eol(buf.line(d.line)?);
    let code_end = lexer::comment_start(body).unwrap_or(body.len());
    let code = body[..code_end].trim_end();
    let suffix = &body[code.len()..];
    let indent = leading_ws(code);
    let stmt = code.trim_start();
    if stmt.contains(';') || stmt.ends_with('\\') {
        return Err(FailureReason::UnsupportedImport);
    }

    let (head, list) = if let Some(rest) = stmt.strip_prefix("import ") {
        ("import ", rest)
    } else if stmt.starts_with("from ") {
        let at = stmt.find(" import ").ok_or(FailureReason::UnsupportedImport)?;
        stmt.split_at(at + " import ".len())
    } else {
        return Err(FailureReason::UnsupportedImport);
    };
    let from_import = head != "import ";

    let list = list.trim();
    let (open, inner, close) = match list.strip_prefix('(') {
        Some(rest) => (
            "(",
            rest.strip_suffix(')')
                .ok_or(FailureReason::UnsupportedImport)?,
            ")",
        ),
        None => ("", list, ""),
    };
    let elements: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .collect();
    let position = elements
        .iter()
        .position(|e| bound_name(e, from_import) == symbol)
        .ok_or(FailureReason::NoChange)?;

    let (text, description) = if elements.len() == 1 {
        let text = if is_sole_statement(buf, d.line) {
            format!("{indent}pass  # unused: {stmt}{eol}")
        } else {
            format!("{indent}# {stmt}{suffix}{eol}")
        };
        (text, format!("comment out unused import '{symbol}'"))
    } else {
        let kept: Vec<&str> = elements
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, e)| *e)
            .collect();
        (
            format!("{indent}{head}{open}{}{close}{suffix}{eol}", kept.join(", ")),
            format!("drop unused name '{symbol}' from import"),
        )
    };
    replace_line(buf, d.line, text, description)
}

/// Break an over-long line, splitting a long string literal first and
/// falling back to a separator near the middle of the line.
pub fn long_line(
    buf: &mut Buffer,
    d: &Diagnostic,
    ctx: &RepairContext<'_>,
) -> Result<Edit, FailureReason> {
    let max = ctx.max_line_length;
    let (body, eol) = split_eol(buf.line(d.line)?);
    if width(body) <= max {
        return Err(FailureReason::NoChange);
    }
    let (pieces, description) = split_string_literal(body, ctx)
        .map(|p| (p, "split long string literal"))
        .or_else(|| break_at_separator(body, ctx).map(|p| (p, "break line at separator")))
        .ok_or(FailureReason::NoBreakPoint(max))?;

    let texts: Vec<String> = pieces.into_iter().map(|p| format!("{p}{eol}")).collect();
    let healed = texts.join("\n");
    let original = buf.splice(d.line, texts)?;
    Ok(Edit {
        line: d.line,
        original,
        healed,
        description: description.to_string(),
    })
}

/// Chunks of at most `width` chars that never split an escape sequence.
fn chunk_content(content: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let mut end = (start + width).min(chars.len());
        if end < chars.len() {
            // Longest escape is `\U0001F600`; keep one that could cross `end` whole.
            let window = end.saturating_sub(10).max(start + 1);
            if let Some(mut b) = (window..end).rev().find(|&i| chars[i] == '\\') {
                while b > start + 1 && chars[b - 1] == '\\' {
                    b -= 1;
                }
                end = b;
            }
        }
        chunks.push(chars[start..end].iter().collect());
        start = end;
    }
    chunks
}

fn split_string_literal(body: &str, ctx: &RepairContext<'_>) -> Option<Vec<String>> {
    let chunk_width = ctx.config.string_chunk_width;
    let mut depth = 0;
    let mut best: Option<(Segment, i32, usize)> = None;
    for seg in lexer::segments(body) {
        match seg.kind {
            SegmentKind::Code => depth += lexer::bracket_delta(&body[seg.start..seg.end]),
            SegmentKind::Str if seg.terminated && !seg.triple => {
                let len = width(&body[seg.start..seg.end]);
                if len > chunk_width + 2 && best.is_none_or(|(_, _, l)| len > l) {
                    best = Some((seg, depth, len));
                }
            }
            _ => {}
        }
    }
    let (seg, depth, _) = best?;

    let literal = &body[seg.start..seg.end];
    let quote_at = literal.find(['"', '\''])?;
    let prefix = &literal[..quote_at];
    let quote = &literal[quote_at..=quote_at];
    let content = &literal[quote_at + 1..literal.len() - 1];
    if prefix.contains(['f', 'F']) && content.contains('{') {
        return None;
    }
    let chunks = chunk_content(content, chunk_width);
    if chunks.len() < 2 {
        return None;
    }

    let head = &body[..seg.start];
    let tail = &body[seg.end..];
    let wrap = depth <= 0;
    if wrap && head.trim_end().ends_with(['"', '\'']) {
        // Parenthesizing one part of an implicit concatenation turns it into a call.
        return None;
    }
    let pad = " ".repeat(width(head) + usize::from(wrap));
    let last = chunks.len() - 1;
    let lines: Vec<String> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let piece = format!("{prefix}{quote}{chunk}{quote}");
            let mut line = if i == 0 {
                format!("{head}{}{piece}", if wrap { "(" } else { "" })
            } else {
                format!("{pad}{piece}")
            };
            if i == last {
                if wrap {
                    line.push(')');
                }
                line.push_str(tail);
            }
            line
        })
        .collect();

    lines
        .iter()
        .all(|l| width(l) <= ctx.max_line_length)
        .then_some(lines)
}

fn break_at_separator(body: &str, ctx: &RepairContext<'_>) -> Option<Vec<String>> {
    let max = ctx.max_line_length;
    let cont = format!(
        "{}{}",
        leading_ws(body),
        " ".repeat(ctx.config.indent_width)
    );
    let mid = width(body) / 2;
    let bytes = body.as_bytes();

    let mut best: Option<(usize, Vec<String>)> = None;
    let mut consider = |pos: usize, depth: i32| {
        let first = body[..pos].trim_end();
        let rest = body[pos..].trim_start();
        if first.trim().is_empty() || rest.is_empty() || rest.starts_with('#') {
            return;
        }
        let first = if depth > 0 {
            first.to_string()
        } else {
            format!("{first} \\")
        };
        let second = format!("{cont}{rest}");
        if width(&first) > max || width(&second) > max {
            return;
        }
        let distance = width(&body[..pos]).abs_diff(mid);
        if best.as_ref().is_none_or(|(d, _)| distance < *d) {
            best = Some((distance, vec![first, second]));
        }
    };

    let mut depth = 0;
    for seg in lexer::segments(body) {
        if seg.kind != SegmentKind::Code {
            continue;
        }
        for i in seg.start..seg.end {
            match bytes[i] {
                b'(' | b'[' | b'{' => {
                    depth += 1;
                    if bytes[i] == b'(' && bytes.get(i + 1).is_some_and(|b| *b != b')') {
                        consider(i + 1, depth);
                    }
                }
                b')' | b']' | b'}' => depth -= 1,
                b',' if depth > 0 && bytes.get(i + 1) == Some(&b' ') => consider(i + 1, depth),
                b' ' if body[i..].starts_with(" and ") || body[i..].starts_with(" or ") => {
                    consider(i, depth)
                }
                _ => {}
            }
        }
    }
    best.map(|(_, lines)| lines)
}
