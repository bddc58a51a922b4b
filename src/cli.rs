// src/cli.rs

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::report::OutputMode;

/// Validate Pine sources through an optionally installed transpiler.
///
/// `pine-validate.yaml` is the primary source of truth.
/// CLI flags only override config values.
#[derive(Parser, Debug)]
#[command(name = "pine-validate", version, disable_help_subcommand = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command that talks to the engine.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Path to config file
    ///
    /// Defaults to ./pine-validate.yaml (optional when using the default)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override engine candidates (can be passed multiple times, in priority order)
    ///
    /// Example:
    /// --candidate @opusaether/pine-transpiler --candidate pine-transpiler
    #[arg(long = "candidate")]
    pub candidates: Vec<String>,

    /// Override the node binary
    #[arg(long)]
    pub node: Option<String>,

    /// Override the directory packages are resolved from
    #[arg(long)]
    pub resolve_from: Option<PathBuf>,

    /// Log filter (RUST_LOG takes precedence)
    #[arg(long)]
    pub log: Option<String>,
}

/// All supported CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate one source file (or stdin).
    ///
    /// Prints zero or one result. Nothing is printed as a finding when the
    /// engine is not installed.
    Validate {
        /// Source file; omit or pass `-` for stdin
        file: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,

        /// Override output format
        #[arg(long, value_enum)]
        format: Option<Format>,
    },

    /// Show which engine candidate resolves and why others were rejected.
    Probe {
        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Write a default pine-validate.yaml into the current directory.
    Init,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Pretty,
    Simple,
}

impl From<Format> for OutputMode {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => OutputMode::Json,
            Format::Pretty => OutputMode::Pretty,
            Format::Simple => OutputMode::Simple,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_validate_with_overrides() {
        let cli = Cli::try_parse_from([
            "pine-validate",
            "validate",
            "script.pine",
            "--candidate",
            "@acme/pine",
            "--candidate",
            "pine-transpiler",
            "--node",
            "/usr/bin/node",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Command::Validate {
                file,
                engine,
                format,
            } => {
                assert_eq!(file, Some(PathBuf::from("script.pine")));
                assert_eq!(engine.candidates, vec!["@acme/pine", "pine-transpiler"]);
                assert_eq!(engine.node.as_deref(), Some("/usr/bin/node"));
                assert_eq!(format, Some(Format::Json));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn validate_reads_stdin_by_default() {
        let cli = Cli::try_parse_from(["pine-validate", "validate"]).unwrap();
        assert!(matches!(cli.command, Command::Validate { file: None, .. }));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
