//! Mend CLI - diagnose and repair Python source files.

use std::io::{stdout, Read, StdoutLock, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mend::cli::{Cli, Command, DiagnoseArgs, HealArgs, OutputFormat};
use mend::config::Config;
use mend::core::progress::{create_file_progress, HealProgress};
use mend::core::{Error, Result};
use mend::engine::{Diagnosis, Engine, EngineResult};
use mend::output::Format;

const STDIN_NAME: &str = "<stdin>";

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let default_filter = if cli.verbose { "mend=info" } else { "mend=warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(".")?,
    };
    if let Some(max) = cli.max_iterations {
        config.controller.max_iterations = max;
    }
    if !config.output.color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    let format = match cli.format {
        Some(OutputFormat::Json) => Format::Json,
        Some(OutputFormat::Markdown) => Format::Markdown,
        Some(OutputFormat::Text) => Format::Text,
        None => Format::from(config.output.format),
    };

    match cli.command {
        Command::Config(args) if args.default => print!("{}", Config::default_toml()),
        Command::Config(_) => {
            config.validate()?;
            print!("{}", config.to_toml()?);
        }
        Command::Diagnose(args) => {
            let engine = Engine::new(config)?;
            diagnose(&engine, &args, format)?;
        }
        Command::Heal(args) => {
            let engine = Engine::new(config)?;
            heal(&engine, &args, format, cli.verbose)?;
        }
    }

    Ok(())
}

fn diagnose(engine: &Engine, args: &DiagnoseArgs, format: Format) -> Result<()> {
    if args.stdin {
        let diagnosis = engine.diagnosis(&read_stdin()?, STDIN_NAME)?;
        return format.write_diagnosis(&diagnosis, &mut stdout().lock());
    }

    let progress = file_progress(args.files.len());
    let results: Vec<Result<Diagnosis>> = args
        .files
        .par_iter()
        .map(|path| {
            let result = read_source(path)
                .and_then(|source| engine.diagnosis(&source, &path.display().to_string()));
            progress.inc(1);
            result
        })
        .collect();
    progress.finish_and_clear();

    report_each(results, |diagnosis, out| format.write_diagnosis(diagnosis, out))
}

fn heal(engine: &Engine, args: &HealArgs, format: Format, verbose: bool) -> Result<()> {
    if args.stdin {
        let source = read_stdin()?;
        let result = engine.heal(&source, STDIN_NAME)?;
        let mut out = stdout().lock();
        out.write_all(result.healed_source.as_bytes())?;
        out.flush()?;
        if args.report {
            format.write_heal(&result, true, &mut std::io::stderr().lock())?;
        }
        return Ok(());
    }

    if args.output.is_some() && args.files.len() != 1 {
        return Err(Error::invalid_argument(
            "--output requires exactly one input file",
        ));
    }

    // Per-iteration spinners only make sense for a single file.
    let spin = verbose && args.files.len() == 1;
    let progress = file_progress(args.files.len());
    let results: Vec<Result<EngineResult>> = args
        .files
        .par_iter()
        .map(|path| {
            let result = heal_file(engine, path, args, spin);
            progress.inc(1);
            result
        })
        .collect();
    progress.finish_and_clear();

    report_each(results, |result, out| {
        format.write_heal(result, args.report, out)
    })
}

fn heal_file(engine: &Engine, path: &Path, args: &HealArgs, spin: bool) -> Result<EngineResult> {
    let source = read_source(path)?;
    let name = path.display().to_string();

    let spinner = HealProgress::new(&name, engine.config().controller.max_iterations, spin);
    let result = engine.heal_with_observer(&source, &name, |it| spinner.observe(it))?;
    spinner.finish(format!(
        "{} iteration(s), {}",
        result.total_iterations, result.stop_reason
    ));

    match &args.output {
        Some(out) => std::fs::write(out, &result.healed_source)?,
        None if result.source_changed => {
            if !args.no_backup {
                std::fs::write(backup_path(path, &args.backup_suffix), &source)?;
            }
            std::fs::write(path, &result.healed_source)?;
        }
        None => {}
    }
    Ok(result)
}

/// Write every successful result in argument order, then fail with the
/// first error if any file could not be processed. Later errors are only
/// logged to stderr.
fn report_each<T>(
    results: Vec<Result<T>>,
    mut write: impl FnMut(&T, &mut StdoutLock<'static>) -> Result<()>,
) -> Result<()> {
    let mut out = stdout().lock();
    let mut first_error = None;
    for result in results {
        match result {
            Ok(value) => write(&value, &mut out)?,
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn file_progress(total: usize) -> ProgressBar {
    if total > 1 {
        create_file_progress(total)
    } else {
        ProgressBar::hidden()
    }
}

fn read_source(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

fn read_stdin() -> Result<String> {
    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source)?;
    Ok(source)
}

fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
