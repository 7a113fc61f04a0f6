//! Output formatters for diagnoses and heal results.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::config::OutputFormat;
use crate::core::{Diagnostic, Result};
use crate::engine::{Diagnosis, EngineResult};
use crate::report;

/// Output format enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
    Markdown,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Format::Text,
            OutputFormat::Json => Format::Json,
            OutputFormat::Markdown => Format::Markdown,
        }
    }
}

impl Format {
    pub fn write_diagnosis<W: Write>(&self, diagnosis: &Diagnosis, writer: &mut W) -> Result<()> {
        match self {
            Format::Json => format_json(diagnosis, writer),
            Format::Markdown => diagnosis_markdown(diagnosis, writer),
            Format::Text => {
                let text = report::diagnosis_text(diagnosis);
                let (head, rest) = text.split_once('\n').unwrap_or((text.as_str(), ""));
                writeln!(writer, "{}", head.bold())?;
                write!(writer, "{rest}")?;
                Ok(())
            }
        }
    }

    /// Write a heal result. `history` adds the per-iteration lines.
    pub fn write_heal<W: Write>(
        &self,
        result: &EngineResult,
        history: bool,
        writer: &mut W,
    ) -> Result<()> {
        match self {
            Format::Json => format_json(result, writer),
            Format::Markdown => heal_markdown(result, history, writer),
            Format::Text => {
                let summary = report::heal_summary(result);
                let (head, rest) = summary.split_once('\n').unwrap_or((summary.as_str(), ""));
                let head = if result.convergence_achieved {
                    head.green().bold()
                } else {
                    head.yellow().bold()
                };
                writeln!(writer, "{head}")?;
                write!(writer, "{rest}")?;
                if history {
                    write!(writer, "{}", report::iteration_history(result))?;
                }
                Ok(())
            }
        }
    }
}

fn format_json<T: Serialize, W: Write>(value: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

fn diagnosis_markdown<W: Write>(diagnosis: &Diagnosis, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Diagnosis: {}\n", diagnosis.name)?;
    writeln!(
        writer,
        "**Diagnostics**: {}  \n**Cost**: {:.2}  \n**Phase**: {}\n",
        diagnosis.diagnostics.len(),
        diagnosis.cost(),
        diagnosis.score.phase
    )?;
    for (dim, group) in report::group_by_dim(&diagnosis.diagnostics) {
        writeln!(writer, "## {dim}\n")?;
        write_diagnostic_table(&group, writer)?;
    }
    if diagnosis.diagnostics.is_empty() {
        writeln!(writer, "_No items_\n")?;
    }
    writeln!(writer, "## Quality\n")?;
    format_as_table(
        &["Dimension", "Value"],
        &crate::core::Dim::ALL
            .iter()
            .map(|d| vec![d.to_string(), format!("{:.2}", diagnosis.quality.get(*d))])
            .collect::<Vec<_>>(),
        writer,
    )
}

fn heal_markdown<W: Write>(result: &EngineResult, history: bool, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Heal: {}\n", result.name)?;
    format_as_table(
        &["Metric", "Before", "After"],
        &[
            vec![
                "Harmony".to_string(),
                format!("{:.3}", result.initial_score.harmony),
                format!("{:.3}", result.final_score.harmony),
            ],
            vec![
                "Gap".to_string(),
                format!("{:.3}", result.initial_score.gap),
                format!("{:.3}", result.final_score.gap),
            ],
            vec![
                "Cost".to_string(),
                format!("{:.2}", result.initial_cost),
                format!("{:.2}", result.final_cost),
            ],
            vec![
                "Phase".to_string(),
                result.initial_score.phase.to_string(),
                result.final_score.phase.to_string(),
            ],
        ],
        writer,
    )?;
    writeln!(
        writer,
        "**Iterations**: {}  \n**Stop reason**: {}  \n**Changed**: {}  \n**Converged**: {}  \n**Gaps**: {} found, {} healed\n",
        result.total_iterations,
        result.stop_reason,
        yes_no(result.source_changed),
        yes_no(result.convergence_achieved),
        result.total_gaps_found,
        result.total_gaps_healed
    )?;

    if history {
        writeln!(writer, "## Iterations\n")?;
        let rows: Vec<Vec<String>> = result
            .history
            .iter()
            .map(|it| {
                vec![
                    it.index.to_string(),
                    format!("{:.3}", it.cost_before),
                    format!("{:.3}", it.cost_after),
                    format!("{}/{}", it.successful_actions(), it.actions.len()),
                    yes_no(it.rolled_back).to_string(),
                    yes_no(it.converged).to_string(),
                ]
            })
            .collect();
        format_as_table(
            &["#", "Cost before", "Cost after", "Fixes", "Rolled back", "Converged"],
            &rows,
            writer,
        )?;
    }

    if !result.remaining.is_empty() {
        writeln!(writer, "## Remaining\n")?;
        let remaining: Vec<&Diagnostic> = result.remaining.iter().collect();
        write_diagnostic_table(&remaining, writer)?;
    }
    Ok(())
}

fn write_diagnostic_table<W: Write>(diagnostics: &[&Diagnostic], writer: &mut W) -> Result<()> {
    let rows: Vec<Vec<String>> = diagnostics
        .iter()
        .map(|d| {
            vec![
                d.line.to_string(),
                d.kind.to_string(),
                format!("{:.2}", d.severity),
                escape_cell(&d.message),
                d.suggested_fix
                    .as_deref()
                    .map(|f| format!("`{}`", escape_cell(f.trim_end())))
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    format_as_table(&["Line", "Kind", "Severity", "Message", "Fix"], &rows, writer)
}

fn format_as_table<W: Write>(headers: &[&str], rows: &[Vec<String>], writer: &mut W) -> Result<()> {
    write!(writer, "|")?;
    for header in headers {
        write!(writer, " {header} |")?;
    }
    writeln!(writer)?;

    write!(writer, "|")?;
    for _ in headers {
        write!(writer, " --- |")?;
    }
    writeln!(writer)?;

    for row in rows {
        write!(writer, "|")?;
        for cell in row {
            write!(writer, " {cell} |")?;
        }
        writeln!(writer)?;
    }

    writeln!(writer)?;
    Ok(())
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "Yes"
    } else {
        "No"
    }
}
