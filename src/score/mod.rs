//! Quality vector and composite scoring.
//!
//! Every diagnostic contributes a fixed, kind-specific deficit to each
//! dimension, scaled by its severity. Deficits are capped so no dimension
//! falls below the configured floor.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::core::{Diagnostic, DiagnosticKind, Dim};

/// Per-dimension quality, each in `[floor, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityVector {
    pub validity: f64,
    pub correctness: f64,
    pub readability: f64,
    pub documentation: f64,
}

impl QualityVector {
    /// The defect-free vector `[1, 1, 1, 1]`.
    pub fn ideal() -> Self {
        Self::from_array([1.0; 4])
    }

    pub fn from_array(v: [f64; 4]) -> Self {
        Self {
            validity: v[0],
            correctness: v[1],
            readability: v[2],
            documentation: v[3],
        }
    }

    /// Values in [`Dim`] order.
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.validity,
            self.correctness,
            self.readability,
            self.documentation,
        ]
    }

    pub fn get(&self, dim: Dim) -> f64 {
        self.as_array()[dim.index()]
    }

    pub fn product(&self) -> f64 {
        self.as_array().iter().product()
    }

    /// Euclidean distance to [`QualityVector::ideal`].
    pub fn distance_to_ideal(&self) -> f64 {
        self.as_array()
            .iter()
            .map(|v| (1.0 - v).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// The weakest dimension; ties resolve to the higher-priority one.
    pub fn weakest(&self) -> Dim {
        Dim::ALL
            .into_iter()
            .min_by(|a, b| self.get(*a).total_cmp(&self.get(*b)))
            .unwrap_or(Dim::Validity)
    }
}

impl fmt::Display for QualityVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validity={:.3} correctness={:.3} readability={:.3} documentation={:.3}",
            self.validity, self.correctness, self.readability, self.documentation
        )
    }
}

/// Harmony bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Critical,
    Stable,
    Improving,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Critical => "critical",
            Phase::Stable => "stable",
            Phase::Improving => "improving",
        })
    }
}

/// Scalar metrics derived from a [`QualityVector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Product of dimensions over the baseline product.
    pub harmony: f64,
    /// Raw product times harmony squared.
    pub integration: f64,
    /// Distance to the ideal vector.
    pub gap: f64,
    pub phase: Phase,
}

/// Deficit contributed per unit severity, in [`Dim`] order.
pub fn deficit_weights(kind: DiagnosticKind) -> [f64; 4] {
    match kind {
        DiagnosticKind::ParseError => [0.30, 0.10, 0.0, 0.0],
        DiagnosticKind::UndefinedName => [0.10, 0.15, 0.0, 0.0],
        DiagnosticKind::BareExcept => [0.0, 0.05, 0.0, 0.15],
        DiagnosticKind::NamingViolation => [0.0, 0.02, 0.08, 0.0],
        DiagnosticKind::HighComplexity => [0.0, 0.0, 0.10, 0.05],
        DiagnosticKind::UnusedImport => [0.0, 0.0, 0.05, 0.02],
        DiagnosticKind::Style(_) => [0.0, 0.0, 0.05, 0.0],
        DiagnosticKind::LongLine => [0.0, 0.0, 0.03, 0.0],
        DiagnosticKind::MissingDocstring => [0.0, 0.0, 0.03, 0.10],
    }
}

/// Maps diagnostics to quality vectors and composite scores.
#[derive(Debug, Clone)]
pub struct ScoringModel {
    config: ScoringConfig,
}

impl ScoringModel {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Accumulate capped deficits into a quality vector.
    pub fn score(&self, diagnostics: &[Diagnostic]) -> QualityVector {
        let mut deficit = [0.0_f64; 4];
        for d in diagnostics {
            let severity = d.severity.clamp(0.0, 1.0);
            for (acc, w) in deficit.iter_mut().zip(deficit_weights(d.kind)) {
                *acc += w * severity;
            }
        }
        let floor = self.config.floor;
        let cap = self.config.max_deficit;
        QualityVector::from_array(deficit.map(|d| (1.0 - d.min(cap)).max(floor).min(1.0)))
    }

    pub fn composite(&self, v: &QualityVector) -> CompositeScore {
        let product = v.product();
        let baseline: f64 = self.config.baseline.as_array().iter().product();
        let harmony = product / baseline;
        CompositeScore {
            harmony,
            integration: product * harmony * harmony,
            gap: v.distance_to_ideal(),
            phase: self.phase(harmony),
        }
    }

    /// Step function over harmony.
    pub fn phase(&self, harmony: f64) -> Phase {
        if harmony < self.config.critical_below {
            Phase::Critical
        } else if harmony < self.config.stable_below {
            Phase::Stable
        } else {
            Phase::Improving
        }
    }

    /// Shorthand for `composite(&score(diagnostics))`.
    pub fn evaluate(&self, diagnostics: &[Diagnostic]) -> (QualityVector, CompositeScore) {
        let v = self.score(diagnostics);
        (v, self.composite(&v))
    }
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// Remediation order: dimension priority, then severity descending, then
/// line ascending. Stable for equal keys.
pub fn priority_order(a: &Diagnostic, b: &Diagnostic) -> Ordering {
    a.dimension
        .priority()
        .cmp(&b.dimension.priority())
        .then_with(|| b.severity.total_cmp(&a.severity))
        .then_with(|| a.line.cmp(&b.line))
}

/// Diagnostics sorted by [`priority_order`].
pub fn prioritize(diagnostics: &[Diagnostic]) -> Vec<Diagnostic> {
    let mut sorted = diagnostics.to_vec();
    sorted.sort_by(priority_order);
    sorted
}
