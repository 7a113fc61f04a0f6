//! Diagnostic value types shared by every stage of the pipeline.
//!
//! A [`Diagnostic`] is created by the analyzer, read by the scoring model and
//! the repair engine, and thrown away at the end of the pass. Nothing mutates
//! a diagnostic after construction; the builder methods consume `self`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four weighted quality dimensions.
///
/// Declaration order is remediation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dim {
    /// Does the file parse at all.
    Validity,
    /// Names resolve, errors are handled deliberately.
    Correctness,
    /// Layout, naming and structure.
    Readability,
    /// Docstrings and defensive handling.
    Documentation,
}

impl Dim {
    /// All dimensions in priority order.
    pub const ALL: [Dim; 4] = [
        Dim::Validity,
        Dim::Correctness,
        Dim::Readability,
        Dim::Documentation,
    ];

    /// Position in a [`QualityVector`](crate::score::QualityVector).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Remediation rank; lower is fixed first.
    pub fn priority(self) -> u8 {
        self as u8
    }

    /// Human-readable label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Dim::Validity => "Functional validity",
            Dim::Correctness => "Correctness",
            Dim::Readability => "Readability",
            Dim::Documentation => "Documentation",
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw-text style rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleRule {
    TrailingWhitespace,
    MixedIndentation,
}

/// Closed set of defect kinds the analyzer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    NamingViolation,
    BareExcept,
    MissingDocstring,
    HighComplexity,
    LongLine,
    Style(StyleRule),
    UndefinedName,
    UnusedImport,
}

impl DiagnosticKind {
    /// Stable identifier used in reports and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "parse_error",
            Self::NamingViolation => "naming_violation",
            Self::BareExcept => "bare_except",
            Self::MissingDocstring => "missing_docstring",
            Self::HighComplexity => "high_complexity",
            Self::LongLine => "long_line",
            Self::Style(_) => "style",
            Self::UndefinedName => "undefined_name",
            Self::UnusedImport => "unused_import",
        }
    }

    /// The dimension a diagnostic of this kind is charged to.
    pub fn primary_dim(self) -> Dim {
        match self {
            Self::ParseError => Dim::Validity,
            Self::UndefinedName => Dim::Correctness,
            Self::NamingViolation
            | Self::HighComplexity
            | Self::LongLine
            | Self::Style(_)
            | Self::UnusedImport => Dim::Readability,
            Self::BareExcept | Self::MissingDocstring => Dim::Documentation,
        }
    }

    /// Default severity in `[0, 1]`.
    pub fn default_severity(self) -> f64 {
        match self {
            Self::ParseError => 1.0,
            Self::BareExcept => 0.7,
            Self::UndefinedName => 0.6,
            Self::HighComplexity => 0.5,
            Self::MissingDocstring => 0.4,
            Self::Style(StyleRule::MixedIndentation) => 0.4,
            Self::NamingViolation | Self::UnusedImport => 0.3,
            Self::LongLine => 0.2,
            Self::Style(StyleRule::TrailingWhitespace) => 0.1,
        }
    }

    /// Whether a repair is attempted for this kind by default.
    ///
    /// Complexity needs restructuring and undefined names need scope
    /// resolution, so both are report-only.
    pub fn default_fixable(self) -> bool {
        !matches!(self, Self::HighComplexity | Self::UndefinedName)
    }

    /// A parse error stops all further analysis of the buffer.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::ParseError)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected defect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// 1-based line number.
    pub line: usize,
    /// 0-based column.
    pub column: usize,
    pub severity: f64,
    pub dimension: Dim,
    pub fixable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    /// Identifier the diagnostic is about, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the kind's default severity, dimension and
    /// fixability.
    pub fn new(kind: DiagnosticKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column: 0,
            severity: kind.default_severity(),
            dimension: kind.primary_dim(),
            fixable: kind.default_fixable(),
            suggested_fix: None,
            symbol: None,
        }
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Mark as report-only regardless of the kind's default.
    pub fn report_only(mut self) -> Self {
        self.fixable = false;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Outstanding cost of a diagnostic set: the sum of severities.
pub fn total_cost(diagnostics: &[Diagnostic]) -> f64 {
    diagnostics.iter().map(|d| d.severity).sum()
}
