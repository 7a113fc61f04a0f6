//! Configuration loading and management.
//!
//! Every tunable constant of the engine lives here. A [`Config`] is built once,
//! validated, and handed to the engine; components copy the section they need
//! at construction and never read ambient state afterwards.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detection thresholds.
    pub analyzer: AnalyzerConfig,
    /// Quality vector and composite score constants.
    pub scoring: ScoringConfig,
    /// Iteration loop limits.
    pub controller: ControllerConfig,
    /// Repair strategy parameters.
    pub repair: RepairConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config` flags.
    /// Env vars with `MEND_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::extract(
            Figment::from(Serialized::defaults(Self::default()))
                .merge(Toml::file_exact(path))
                .merge(Env::prefixed("MEND_").split("__")),
        )
    }

    /// Load configuration from directory, looking for mend.toml or .mend/mend.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    /// Env vars with `MEND_` prefix override file/default values.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Self::extract(
            Figment::from(Serialized::defaults(Self::default()))
                .merge(Toml::file(dir.join("mend.toml")))
                .merge(Toml::file(dir.join(".mend/mend.toml")))
                .merge(Env::prefixed("MEND_").split("__")),
        )
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let c = &self.controller;
        if c.max_iterations == 0 {
            return Err(Error::config("controller.max_iterations must be at least 1"));
        }
        if c.iteration_budget <= 0.0 {
            return Err(Error::config("controller.iteration_budget must be positive"));
        }
        if c.max_fixes_per_iteration == 0 {
            return Err(Error::config(
                "controller.max_fixes_per_iteration must be at least 1",
            ));
        }
        if c.convergence_epsilon < 0.0 || c.min_progress < 0.0 {
            return Err(Error::config("controller thresholds must be non-negative"));
        }

        let s = &self.scoring;
        if !(s.floor > 0.0 && s.floor < 1.0) {
            return Err(Error::config("scoring.floor must be in (0, 1)"));
        }
        if !(s.max_deficit > 0.0 && s.max_deficit <= 1.0) {
            return Err(Error::config("scoring.max_deficit must be in (0, 1]"));
        }
        if s.critical_below > s.stable_below {
            return Err(Error::config(
                "scoring.critical_below must not exceed scoring.stable_below",
            ));
        }
        if s.baseline.as_array().iter().any(|b| *b <= 0.0) {
            return Err(Error::config("scoring.baseline values must be positive"));
        }

        if self.analyzer.max_line_length == 0 {
            return Err(Error::config("analyzer.max_line_length must be at least 1"));
        }
        if self.repair.indent_width == 0 || self.repair.string_chunk_width == 0 {
            return Err(Error::config("repair widths must be at least 1"));
        }
        let placeholder = &self.repair.docstring_placeholder;
        if placeholder.contains("\"\"\"")
            || placeholder.contains('\n')
            || placeholder.ends_with(['\\', '"'])
        {
            return Err(Error::config(
                "repair.docstring_placeholder must be a single line that cannot close a docstring",
            ));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Commented starter config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// Analyzer thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Longest allowed line, in characters.
    pub max_line_length: usize,
    /// Highest cyclomatic complexity allowed per function.
    pub max_complexity: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_line_length: 100,
            max_complexity: 10,
        }
    }
}

/// Per-dimension baseline constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Baseline {
    pub validity: f64,
    pub correctness: f64,
    pub readability: f64,
    pub documentation: f64,
}

impl Baseline {
    /// Values in [`Dim`](crate::core::Dim) order.
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.validity,
            self.correctness,
            self.readability,
            self.documentation,
        ]
    }
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            validity: 0.718,
            correctness: 0.414,
            readability: 0.618,
            documentation: 0.693,
        }
    }
}

/// Scoring model constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Lowest value any dimension can take.
    pub floor: f64,
    /// Cap on accumulated deficit per dimension.
    pub max_deficit: f64,
    /// Reference vector the harmony score is normalized against.
    pub baseline: Baseline,
    /// Harmony below this is "critical".
    pub critical_below: f64,
    /// Harmony below this (and not critical) is "stable".
    pub stable_below: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            floor: 0.2,
            max_deficit: 0.8,
            baseline: Baseline::default(),
            critical_below: 0.5,
            stable_below: 0.8,
        }
    }
}

/// Iteration controller limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Hard ceiling on iterations per heal run.
    pub max_iterations: usize,
    /// Outstanding cost below which the run has converged.
    pub convergence_epsilon: f64,
    /// Cost reduction below which an iteration counts as stagnation.
    pub min_progress: f64,
    /// Severity that may be spent in one iteration.
    pub iteration_budget: f64,
    /// Diagnostics selected per iteration regardless of budget.
    pub max_fixes_per_iteration: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            convergence_epsilon: 0.01,
            min_progress: 0.001,
            iteration_budget: 2.0,
            max_fixes_per_iteration: 10,
        }
    }
}

/// Repair strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Spaces per indentation level (tab expansion, inserted lines).
    pub indent_width: usize,
    /// Extra re-parse passes after a repair batch.
    pub max_syntax_passes: usize,
    /// Body of inserted placeholder docstrings.
    pub docstring_placeholder: String,
    /// Chunk width when splitting long string literals.
    pub string_chunk_width: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            max_syntax_passes: 5,
            docstring_placeholder: "Add documentation.".to_string(),
            string_chunk_width: 60,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format.
    pub format: OutputFormat,
    /// Color output.
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON format.
    Json,
    /// Markdown format.
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Markdown),
            _ => Err(format!("Unknown format: {s}. Use 'text', 'json', or 'md'")),
        }
    }
}
