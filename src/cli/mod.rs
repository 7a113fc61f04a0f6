//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Mend - iterative diagnose-and-repair for Python source files.
#[derive(Parser)]
#[command(name = "mend")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "MEND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Show per-iteration progress and info logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Maximum heal iterations per file
    #[arg(long, global = true)]
    pub max_iterations: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Repair files in place, to an output path, or from stdin
    Heal(HealArgs),

    /// Report diagnostics and scores without changing anything
    #[command(alias = "check")]
    Diagnose(DiagnoseArgs),

    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Print the commented starter mend.toml instead
    #[arg(long)]
    pub default: bool,
}

#[derive(Args)]
pub struct HealArgs {
    /// Files to heal
    #[arg(required_unless_present = "stdin", conflicts_with = "stdin")]
    pub files: Vec<PathBuf>,

    /// Write the healed source to this path instead of in place
    #[arg(short, long, conflicts_with = "stdin")]
    pub output: Option<PathBuf>,

    /// Read source from stdin and write the healed source to stdout
    #[arg(long)]
    pub stdin: bool,

    /// Suffix of the backup copy written before an in-place heal
    #[arg(long, default_value = ".bak")]
    pub backup_suffix: String,

    /// Do not write a backup copy
    #[arg(long)]
    pub no_backup: bool,

    /// Include the per-iteration history in the report
    #[arg(long)]
    pub report: bool,
}

#[derive(Args)]
pub struct DiagnoseArgs {
    /// Files to diagnose
    #[arg(required_unless_present = "stdin", conflicts_with = "stdin")]
    pub files: Vec<PathBuf>,

    /// Read source from stdin
    #[arg(long)]
    pub stdin: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_heal_files() {
        let cli = Cli::try_parse_from(["mend", "heal", "a.py", "b.py"]).unwrap();
        match cli.command {
            Command::Heal(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.backup_suffix, ".bak");
                assert!(!args.no_backup);
                assert!(!args.stdin);
            }
            _ => panic!("expected heal"),
        }
    }

    #[test]
    fn test_heal_requires_input() {
        assert!(Cli::try_parse_from(["mend", "heal"]).is_err());
    }

    #[test]
    fn test_heal_stdin_conflicts_with_files() {
        assert!(Cli::try_parse_from(["mend", "heal", "--stdin", "a.py"]).is_err());
        assert!(Cli::try_parse_from(["mend", "heal", "--stdin", "-o", "out.py"]).is_err());
    }

    #[test]
    fn test_heal_output_and_backup_options() {
        let cli = Cli::try_parse_from([
            "mend",
            "heal",
            "a.py",
            "-o",
            "out.py",
            "--backup-suffix",
            ".orig",
            "--report",
        ])
        .unwrap();
        match cli.command {
            Command::Heal(args) => {
                assert_eq!(args.output, Some(PathBuf::from("out.py")));
                assert_eq!(args.backup_suffix, ".orig");
                assert!(args.report);
            }
            _ => panic!("expected heal"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mend",
            "diagnose",
            "a.py",
            "--format",
            "json",
            "--max-iterations",
            "3",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.max_iterations, Some(3));
        assert!(cli.verbose);
    }

    #[test]
    fn test_diagnose_alias() {
        let cli = Cli::try_parse_from(["mend", "check", "--stdin"]).unwrap();
        assert!(matches!(cli.command, Command::Diagnose(ref a) if a.stdin));
    }

    #[test]
    fn test_config_command() {
        let cli = Cli::try_parse_from(["mend", "config"]).unwrap();
        assert!(matches!(cli.command, Command::Config(ref a) if !a.default));
        assert!(cli.format.is_none());
    }

    #[test]
    fn test_config_default_flag() {
        let cli = Cli::try_parse_from(["mend", "config", "--default"]).unwrap();
        assert!(matches!(cli.command, Command::Config(ref a) if a.default));
    }
}
