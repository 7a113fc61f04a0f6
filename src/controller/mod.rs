//! Iteration controller.
//!
//! One run cycles SENSE → SELECT → REPAIR → MEASURE until the buffer
//! converges, an iteration makes too little progress, or the iteration
//! ceiling is reached. Stop conditions are only checked between
//! iterations.
//!
//! An iteration whose edits break the parse, or raise the outstanding cost
//! without restoring a broken parse, is rolled back. Diagnostics whose
//! repair failed or made no headway are not selected again; the run
//! stagnates once an idle iteration leaves nothing new to try.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyzer::Analyzer;
use crate::config::{Config, ControllerConfig};
use crate::core::{total_cost, Diagnostic, DiagnosticKind, Result};
use crate::repair::{is_repairable, RepairAction, RepairEngine};
use crate::score::{prioritize, QualityVector, ScoringModel};

/// Record of one controller cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationResult {
    /// 1-based.
    pub index: usize,
    pub diagnostics_before: usize,
    pub diagnostics_after: usize,
    pub quality_before: QualityVector,
    pub quality_after: QualityVector,
    pub cost_before: f64,
    pub cost_after: f64,
    /// Sum of the costs of successful actions.
    pub cost_consumed: f64,
    pub actions: Vec<RepairAction>,
    /// The edits raised the cost and were discarded.
    pub rolled_back: bool,
    /// The buffer had a parse error before this iteration and parses after it.
    /// Cost may rise here as diagnostics hidden by the parse error surface.
    pub parse_restored: bool,
    pub converged: bool,
}

impl IterationResult {
    /// Outstanding cost removed, floored at zero.
    pub fn cost_delta(&self) -> f64 {
        (self.cost_before - self.cost_after).max(0.0)
    }

    /// Cost removed per unit of repair cost spent; zero when nothing was spent.
    pub fn efficiency(&self) -> f64 {
        if self.cost_consumed > 0.0 {
            self.cost_delta() / self.cost_consumed
        } else {
            0.0
        }
    }

    pub fn successful_actions(&self) -> usize {
        self.actions.iter().filter(|a| a.success).count()
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Converged,
    Stagnated,
    IterationCeiling,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::Stagnated => write!(f, "stagnated"),
            Self::IterationCeiling => write!(f, "iteration ceiling reached"),
        }
    }
}

/// Diagnostics already tried without success in this run, keyed by kind,
/// line and symbol.
#[derive(Debug, Default)]
pub struct Attempted(HashSet<(DiagnosticKind, usize, Option<String>)>);

impl Attempted {
    pub fn record(&mut self, d: &Diagnostic) {
        self.0.insert((d.kind, d.line, d.symbol.clone()));
    }

    pub fn contains(&self, d: &Diagnostic) -> bool {
        self.0.contains(&(d.kind, d.line, d.symbol.clone()))
    }
}

fn has_parse_error(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.kind.is_blocking())
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub final_source: String,
    pub initial_diagnostics: Vec<Diagnostic>,
    pub final_diagnostics: Vec<Diagnostic>,
    pub history: Vec<IterationResult>,
    pub stop_reason: StopReason,
    /// Initial diagnostics plus any that surfaced during the run.
    pub total_found: usize,
    pub total_healed: usize,
    /// The final buffer satisfies the convergence test.
    pub converged: bool,
}

/// Drives one heal run. Not shared between runs.
pub struct Controller {
    analyzer: Analyzer,
    repairer: RepairEngine,
    scoring: ScoringModel,
    config: ControllerConfig,
}

impl Controller {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            analyzer: Analyzer::new(config)?,
            repairer: RepairEngine::new(config)?,
            scoring: ScoringModel::new(config.scoring.clone()),
            config: config.controller.clone(),
        })
    }

    pub fn run(&self, source: &str, name: &str) -> RunOutcome {
        self.run_with_observer(source, name, |_| {})
    }

    /// Run to completion, calling `observer` after every iteration.
    pub fn run_with_observer<F>(&self, source: &str, name: &str, mut observer: F) -> RunOutcome
    where
        F: FnMut(&IterationResult),
    {
        let mut buffer = source.to_string();
        let mut diagnostics = self.analyzer.analyze(&buffer, name);
        let initial_diagnostics = diagnostics.clone();
        let mut total_found = diagnostics.len();
        let mut total_healed = 0;
        let mut history = Vec::new();
        let mut attempted = Attempted::default();
        let mut stop_reason = StopReason::IterationCeiling;

        for index in 1..=self.config.max_iterations {
            let cost_before = total_cost(&diagnostics);
            let quality_before = self.scoring.score(&diagnostics);

            if self.is_converged(&diagnostics) {
                let record = IterationResult {
                    index,
                    diagnostics_before: diagnostics.len(),
                    diagnostics_after: diagnostics.len(),
                    quality_before,
                    quality_after: quality_before,
                    cost_before,
                    cost_after: cost_before,
                    cost_consumed: 0.0,
                    actions: Vec::new(),
                    rolled_back: false,
                    parse_restored: false,
                    converged: true,
                };
                observer(&record);
                history.push(record);
                stop_reason = StopReason::Converged;
                break;
            }

            let selected = self.select(&diagnostics, &attempted);
            debug!(
                file = name,
                iteration = index,
                selected = selected.len(),
                "selected diagnostics"
            );
            let (repaired, actions) = self.repairer.repair(&buffer, &selected);
            let mut after = self.analyzer.analyze(&repaired, name);
            let mut cost_after = total_cost(&after);

            // Parse status outranks cost: (broken, cost) must not increase.
            let blocked_before = has_parse_error(&diagnostics);
            let blocked_after = has_parse_error(&after);
            let parse_restored = blocked_before && !blocked_after;
            let rolled_back = (blocked_after, cost_after) > (blocked_before, cost_before);
            if rolled_back {
                warn!(
                    file = name,
                    iteration = index,
                    parse_error = blocked_after,
                    "edits moved cost from {cost_before:.3} to {cost_after:.3}; rolled back"
                );
                after = diagnostics.clone();
                cost_after = cost_before;
            } else {
                buffer = repaired;
            }

            total_healed += diagnostics.len().saturating_sub(after.len());
            total_found += after.len().saturating_sub(diagnostics.len());

            let cost_consumed = if rolled_back {
                0.0
            } else {
                actions.iter().filter(|a| a.success).map(|a| a.cost).sum()
            };
            let record = IterationResult {
                index,
                diagnostics_before: diagnostics.len(),
                diagnostics_after: after.len(),
                quality_before,
                quality_after: self.scoring.score(&after),
                cost_before,
                cost_after,
                cost_consumed,
                actions,
                rolled_back,
                parse_restored,
                converged: false,
            };
            info!(
                file = name,
                iteration = index,
                "cost {cost_before:.3} -> {cost_after:.3}, {}/{} action(s) applied",
                record.successful_actions(),
                record.actions.len()
            );
            let idle =
                rolled_back || (!parse_restored && record.cost_delta() < self.config.min_progress);
            if idle {
                selected.iter().for_each(|d| attempted.record(d));
            }
            for action in record.actions.iter().filter(|a| !a.success) {
                attempted.record(&action.diagnostic);
            }
            observer(&record);
            history.push(record);
            diagnostics = after;

            if idle && self.select(&diagnostics, &attempted).is_empty() {
                stop_reason = StopReason::Stagnated;
                break;
            }
        }

        let converged = self.is_converged(&diagnostics);
        if converged {
            stop_reason = StopReason::Converged;
        }
        info!(
            file = name,
            iterations = history.len(),
            remaining = diagnostics.len(),
            "run stopped: {stop_reason}"
        );
        RunOutcome {
            final_source: buffer,
            initial_diagnostics,
            final_diagnostics: diagnostics,
            history,
            stop_reason,
            total_found,
            total_healed,
            converged,
        }
    }

    /// Outstanding cost below epsilon, or nothing left.
    pub fn is_converged(&self, diagnostics: &[Diagnostic]) -> bool {
        diagnostics.is_empty() || total_cost(diagnostics) < self.config.convergence_epsilon
    }

    /// Highest-priority repairable diagnostics not yet `attempted` whose
    /// severities fit the iteration budget. The first candidate is always
    /// taken so a single diagnostic costlier than the budget cannot stall
    /// the run.
    pub fn select(&self, diagnostics: &[Diagnostic], attempted: &Attempted) -> Vec<Diagnostic> {
        let mut spent = 0.0;
        let mut selected = Vec::new();
        for d in prioritize(diagnostics)
            .into_iter()
            .filter(|d| is_repairable(d) && !attempted.contains(d))
        {
            if selected.len() >= self.config.max_fixes_per_iteration {
                break;
            }
            if !selected.is_empty() && spent + d.severity > self.config.iteration_budget {
                break;
            }
            spent += d.severity;
            selected.push(d);
        }
        selected
    }
}
