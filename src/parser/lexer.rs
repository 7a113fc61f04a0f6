//! Line-level lexing for text that may not parse.
//!
//! Repairs work on single lines of possibly broken source, where a syntax
//! tree is unavailable. This splits a line into code, string and comment
//! segments and tracks bracket nesting in the code parts.

/// What a segment of a line contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Code,
    Str,
    Comment,
}

/// A byte range of one line. String segments include their prefix letters
/// and quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: usize,
    pub end: usize,
    /// False for a string still open at end of line.
    pub terminated: bool,
    /// Triple-quoted string.
    pub triple: bool,
}

impl Segment {
    fn code(start: usize, end: usize) -> Self {
        Self {
            kind: SegmentKind::Code,
            start,
            end,
            terminated: true,
            triple: false,
        }
    }
}

/// Split `line` into code, string and comment segments.
pub fn segments(line: &str) -> Vec<Segment> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut code_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                if i > code_start {
                    out.push(Segment::code(code_start, i));
                }
                out.push(Segment {
                    kind: SegmentKind::Comment,
                    start: i,
                    end: bytes.len(),
                    terminated: true,
                    triple: false,
                });
                return out;
            }
            quote @ (b'\'' | b'"') => {
                let start = prefix_start(bytes, code_start, i);
                if start > code_start {
                    out.push(Segment::code(code_start, start));
                }
                let triple = bytes[i..].starts_with(&[quote, quote, quote]);
                let (end, terminated) = if triple {
                    close_triple(bytes, i + 3, quote)
                } else {
                    close_single(bytes, i + 1, quote)
                };
                out.push(Segment {
                    kind: SegmentKind::Str,
                    start,
                    end,
                    terminated,
                    triple,
                });
                i = end;
                code_start = end;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    if bytes.len() > code_start {
        out.push(Segment::code(code_start, bytes.len()));
    }
    out
}

fn prefix_start(bytes: &[u8], floor: usize, quote: usize) -> usize {
    let mut s = quote;
    while s > floor
        && quote - s < 2
        && matches!(bytes[s - 1], b'r' | b'R' | b'b' | b'B' | b'u' | b'U' | b'f' | b'F')
    {
        s -= 1;
    }
    if s > 0 && s < quote && (bytes[s - 1].is_ascii_alphanumeric() || bytes[s - 1] == b'_') {
        return quote;
    }
    s
}

fn close_single(bytes: &[u8], mut j: usize, quote: u8) -> (usize, bool) {
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b if b == quote => return (j + 1, true),
            _ => j += 1,
        }
    }
    (bytes.len(), false)
}

fn close_triple(bytes: &[u8], mut j: usize, quote: u8) -> (usize, bool) {
    while j < bytes.len() {
        if bytes[j] == b'\\' {
            j += 2;
        } else if bytes[j..].starts_with(&[quote, quote, quote]) {
            return (j + 3, true);
        } else {
            j += 1;
        }
    }
    (bytes.len(), false)
}

/// Bracket and colon summary of the code parts of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BracketScan {
    /// Openers left unclosed, innermost last.
    pub open: Vec<u8>,
    /// Byte offset of the first closer with no matching opener.
    pub stray_closer: Option<usize>,
    /// A `:` (not `:=`) appears outside any bracket.
    pub top_level_colon: bool,
}

/// Scan the code segments of `line` for brackets.
pub fn brackets(line: &str) -> BracketScan {
    let bytes = line.as_bytes();
    let mut scan = BracketScan::default();
    for seg in segments(line)
        .into_iter()
        .filter(|s| s.kind == SegmentKind::Code)
    {
        for i in seg.start..seg.end {
            match bytes[i] {
                b'(' | b'[' | b'{' => scan.open.push(bytes[i]),
                b')' | b']' | b'}' => {
                    if scan.open.pop().is_none() && scan.stray_closer.is_none() {
                        scan.stray_closer = Some(i);
                    }
                }
                b':' if scan.open.is_empty() && bytes.get(i + 1) != Some(&b'=') => {
                    scan.top_level_colon = true;
                }
                _ => {}
            }
        }
    }
    scan
}

/// Openers minus closers in the code segments of `line`.
pub fn bracket_delta(line: &str) -> i32 {
    let bytes = line.as_bytes();
    segments(line)
        .into_iter()
        .filter(|s| s.kind == SegmentKind::Code)
        .flat_map(|s| s.start..s.end)
        .map(|i| match bytes[i] {
            b'(' | b'[' | b'{' => 1,
            b')' | b']' | b'}' => -1,
            _ => 0,
        })
        .sum()
}

/// Closing bracket for an opener.
pub fn closer_for(open: u8) -> char {
    match open {
        b'(' => ')',
        b'[' => ']',
        _ => '}',
    }
}

/// Byte offset of a trailing comment, if any.
pub fn comment_start(line: &str) -> Option<usize> {
    segments(line)
        .into_iter()
        .find(|s| s.kind == SegmentKind::Comment)
        .map(|s| s.start)
}
