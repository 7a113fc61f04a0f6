//! Line-addressed text buffer used while repairing.

use super::FailureReason;

/// Source split on `\n`. Joining with `\n` restores the text exactly,
/// including a trailing newline and any `\r` line endings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    lines: Vec<String>,
}

impl Buffer {
    pub fn new(source: &str) -> Self {
        Self {
            lines: source.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// 1-based line access.
    pub fn line(&self, n: usize) -> Result<&str, FailureReason> {
        n.checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
            .ok_or(FailureReason::LineOutOfRange(n))
    }

    /// Replace line `n`, returning the old text.
    pub fn replace(&mut self, n: usize, text: String) -> Result<String, FailureReason> {
        self.line(n)?;
        Ok(std::mem::replace(&mut self.lines[n - 1], text))
    }

    /// Replace line `n` with several lines, returning the old text.
    pub fn splice(&mut self, n: usize, texts: Vec<String>) -> Result<String, FailureReason> {
        self.line(n)?;
        let old = self.lines.splice(n - 1..n, texts).collect::<Vec<_>>();
        Ok(old.concat())
    }

    /// Insert a new line directly below line `n`.
    pub fn insert_after(&mut self, n: usize, text: String) -> Result<(), FailureReason> {
        self.line(n)?;
        self.lines.insert(n, text);
        Ok(())
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Split a `\r` line ending off a line.
pub fn split_eol(line: &str) -> (&str, &str) {
    match line.strip_suffix('\r') {
        Some(body) => (body, "\r"),
        None => (line, ""),
    }
}

/// Leading spaces and tabs.
pub fn leading_ws(line: &str) -> &str {
    let body = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - body.len()]
}

/// Blank or comment-only.
pub fn is_blank_or_comment(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with('#')
}
