//! Public entry point.
//!
//! [`Engine::heal`] runs the full repair loop over one buffer and packages
//! the outcome as an [`EngineResult`]. [`Engine::diagnose`] only analyzes
//! and scores. Every call builds its own analyzer and repair engine, so one
//! `Engine` may be shared across threads.

use serde::Serialize;

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::controller::{Controller, IterationResult, StopReason};
use crate::core::{total_cost, Diagnostic, Result};
use crate::report;
use crate::score::{CompositeScore, QualityVector, ScoringModel};

/// Outcome of a heal run.
#[derive(Debug, Clone, Serialize)]
pub struct EngineResult {
    pub name: String,
    pub original_source: String,
    pub healed_source: String,
    pub source_changed: bool,
    pub initial_quality: QualityVector,
    pub final_quality: QualityVector,
    pub initial_score: CompositeScore,
    pub final_score: CompositeScore,
    pub initial_cost: f64,
    pub final_cost: f64,
    pub total_iterations: usize,
    pub total_gaps_found: usize,
    pub total_gaps_healed: usize,
    pub convergence_achieved: bool,
    pub stop_reason: StopReason,
    pub history: Vec<IterationResult>,
    /// Diagnostics left in the healed source.
    pub remaining: Vec<Diagnostic>,
}

impl EngineResult {
    /// Change in harmony.
    pub fn improvement(&self) -> f64 {
        self.final_score.harmony - self.initial_score.harmony
    }

    /// Relative reduction of distance to the ideal vector.
    pub fn gap_reduction(&self) -> f64 {
        if self.initial_score.gap > 0.0 {
            (self.initial_score.gap - self.final_score.gap) / self.initial_score.gap
        } else {
            0.0
        }
    }

    /// Fraction of the initial cost removed; 1.0 when there was none.
    pub fn progress(&self) -> f64 {
        if self.initial_cost > 0.0 {
            ((self.initial_cost - self.final_cost) / self.initial_cost).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Analysis without repair.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    pub name: String,
    pub diagnostics: Vec<Diagnostic>,
    pub quality: QualityVector,
    pub score: CompositeScore,
}

impl Diagnosis {
    pub fn cost(&self) -> f64 {
        total_cost(&self.diagnostics)
    }
}

pub struct Engine {
    config: Config,
    scoring: ScoringModel,
}

impl Engine {
    /// Validate `config` and build an engine around it.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let scoring = ScoringModel::new(config.scoring.clone());
        Ok(Self { config, scoring })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn heal(&self, source: &str, name: &str) -> Result<EngineResult> {
        self.heal_with_observer(source, name, |_| {})
    }

    /// Heal, calling `observer` after every iteration.
    pub fn heal_with_observer<F>(&self, source: &str, name: &str, observer: F) -> Result<EngineResult>
    where
        F: FnMut(&IterationResult),
    {
        let controller = Controller::new(&self.config)?;
        let outcome = controller.run_with_observer(source, name, observer);

        let (initial_quality, initial_score) = self.scoring.evaluate(&outcome.initial_diagnostics);
        let (final_quality, final_score) = self.scoring.evaluate(&outcome.final_diagnostics);
        Ok(EngineResult {
            name: name.to_string(),
            original_source: source.to_string(),
            source_changed: outcome.final_source != source,
            healed_source: outcome.final_source,
            initial_quality,
            final_quality,
            initial_score,
            final_score,
            initial_cost: total_cost(&outcome.initial_diagnostics),
            final_cost: total_cost(&outcome.final_diagnostics),
            total_iterations: outcome.history.len(),
            total_gaps_found: outcome.total_found,
            total_gaps_healed: outcome.total_healed,
            convergence_achieved: outcome.converged,
            stop_reason: outcome.stop_reason,
            history: outcome.history,
            remaining: outcome.final_diagnostics,
        })
    }

    /// Analyze and score without touching the source.
    pub fn diagnosis(&self, source: &str, name: &str) -> Result<Diagnosis> {
        let diagnostics = Analyzer::new(&self.config)?.analyze(source, name);
        let (quality, score) = self.scoring.evaluate(&diagnostics);
        Ok(Diagnosis {
            name: name.to_string(),
            diagnostics,
            quality,
            score,
        })
    }

    /// Human-readable diagnosis report.
    pub fn diagnose(&self, source: &str, name: &str) -> Result<String> {
        Ok(report::diagnosis_text(&self.diagnosis(source, name)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Phase;

    fn engine() -> Engine {
        Engine::new(Config::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.controller.max_iterations = 0;
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn test_heal_clean_source() {
        let source = "\"\"\"Module.\"\"\"\nx = 1\n";
        let result = engine().heal(source, "clean.py").unwrap();
        assert!(!result.source_changed);
        assert_eq!(result.healed_source, source);
        assert_eq!(result.total_gaps_found, 0);
        assert_eq!(result.total_iterations, 1);
        assert!(result.convergence_achieved);
        assert_eq!(result.improvement(), 0.0);
        assert_eq!(result.gap_reduction(), 0.0);
        assert_eq!(result.progress(), 1.0);
    }

    #[test]
    fn test_heal_improves_scores() {
        let result = engine().heal("def foo()\n    pass", "t.py").unwrap();
        assert!(result.source_changed);
        assert!(result.improvement() > 0.0);
        assert!(result.gap_reduction() > 0.99);
        assert_eq!(result.progress(), 1.0);
        assert_eq!(result.final_score.phase, Phase::Improving);
        assert!(result.remaining.is_empty());
    }

    #[test]
    fn test_diagnosis_does_not_mutate() {
        let source = "def f():\n    return 1   \n";
        let diagnosis = engine().diagnosis(source, "d.py").unwrap();
        assert_eq!(diagnosis.diagnostics.len(), 2);
        assert!(diagnosis.cost() > 0.0);
        assert!(diagnosis.quality.documentation < 1.0);
    }

    #[test]
    fn test_diagnose_report_mentions_file() {
        let text = engine().diagnose("def foo()\n    pass", "broken.py").unwrap();
        assert!(text.contains("broken.py"));
        assert!(text.contains("Functional validity"));
    }

    #[test]
    fn test_engine_is_reusable() {
        let engine = engine();
        let a = engine.heal("x = 1  \n", "a.py").unwrap();
        let b = engine.heal("x = 1  \n", "a.py").unwrap();
        assert_eq!(a.healed_source, b.healed_source);
        assert_eq!(a.history.len(), b.history.len());
    }
}
