// src/runner.rs

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use crate::cli::{Cli, Command, EngineArgs};
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::engine::{resolve, AttemptFailure, Resolution, TranspileValidator};
use crate::logging::init_logging;
use crate::report::{render, OutputMode};
use crate::util::read_source;

/// Exit status of `probe` when no candidate resolves.
const EXIT_UNAVAILABLE: u8 = 2;

/// Entry point from `main.rs`.
pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Init => {
            init_logging(None);
            init_scaffold(Path::new(DEFAULT_CONFIG_FILE))?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Validate {
            file,
            engine,
            format,
        } => {
            let cfg = prepare(&engine)?;
            let mode = format.map(OutputMode::from).unwrap_or(cfg.output.mode);
            run_validate(&cfg, file.as_deref(), mode)
        }

        Command::Probe { engine } => {
            let cfg = prepare(&engine)?;
            run_probe(&cfg)
        }
    }
}

/// Load config, apply CLI overrides, start logging.
fn prepare(args: &EngineArgs) -> Result<Config> {
    let cfg = load_config(args.config.as_deref())?;
    let cfg = apply_overrides(cfg, args);
    init_logging(args.log.as_deref().or(cfg.log.filter.as_deref()));
    Ok(cfg)
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE)),
    }
}

pub fn apply_overrides(mut cfg: Config, args: &EngineArgs) -> Config {
    if !args.candidates.is_empty() {
        cfg.engine.candidates = args.candidates.clone();
    }
    if let Some(node) = &args.node {
        cfg.runtime.node = node.clone();
    }
    if let Some(dir) = &args.resolve_from {
        cfg.engine.resolve_from = dir.clone();
    }
    cfg
}

/* ---------------- validate ---------------- */

fn run_validate(cfg: &Config, file: Option<&Path>, mode: OutputMode) -> Result<ExitCode> {
    let source = read_source(file)?;

    let validator = TranspileValidator::from_config(cfg);
    let results = validator.validate(&source);

    println!("{}", render(&results, mode, should_use_color())?);

    // Only an explicit error report fails the run; no findings is not a failure
    if results.iter().any(|r| r.is_error()) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/* ---------------- probe ---------------- */

fn run_probe(cfg: &Config) -> Result<ExitCode> {
    let validator = TranspileValidator::from_config(cfg);

    println!(
        "node: {}  resolve_from: {}",
        validator.loader().node(),
        validator.loader().resolve_from().display()
    );

    let resolution = resolve(validator.candidates(), validator.loader());

    for attempt in resolution.attempts() {
        let reason = match &attempt.failure {
            AttemptFailure::LoadFailed(e) => format!("load failed: {}", e),
            AttemptFailure::MissingCapability => "no transpile() export".to_string(),
        };
        println!("  skipped  {}  ({})", attempt.module_id, reason);
    }

    match resolution {
        Resolution::Resolved { module_id, .. } => {
            println!("  resolved {}", module_id);
            Ok(ExitCode::SUCCESS)
        }
        Resolution::Unavailable { .. } => {
            println!("no transpiler engine available");
            Ok(ExitCode::from(EXIT_UNAVAILABLE))
        }
    }
}

fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

/* ---------------- init ---------------- */

fn init_scaffold(path: &Path) -> Result<()> {
    if path.exists() {
        eprintln!("{} already exists (skipping)", path.display());
        return Ok(());
    }

    std::fs::write(path, default_config_yaml())
        .with_context(|| format!("Failed to write {:?}", path))?;
    eprintln!("Created {}", path.display());
    Ok(())
}

fn default_config_yaml() -> &'static str {
    r#"
engine:
  # Tried in order; the first package exporting transpile() wins
  candidates:
    - "@opusaether/pine-transpiler"
    - pine-transpiler
  resolve_from: .

runtime:
  node: node

env: {}

output:
  mode: simple # simple | pretty | json

log:
  filter: warn
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn overrides_replace_config_values() {
        let args = EngineArgs {
            candidates: vec!["vendor/pine".to_string()],
            node: Some("/opt/node".to_string()),
            resolve_from: Some(PathBuf::from("/srv")),
            ..EngineArgs::default()
        };

        let cfg = apply_overrides(Config::default(), &args);

        assert_eq!(cfg.engine.candidates, vec!["vendor/pine"]);
        assert_eq!(cfg.runtime.node, "/opt/node");
        assert_eq!(cfg.engine.resolve_from, PathBuf::from("/srv"));
    }

    #[test]
    fn empty_overrides_keep_config() {
        let cfg = apply_overrides(Config::default(), &EngineArgs::default());
        assert_eq!(cfg.engine.candidates.len(), 2);
        assert_eq!(cfg.runtime.node, "node");
    }

    #[test]
    fn scaffold_parses_back_to_defaults() {
        let cfg = Config::parse(default_config_yaml()).unwrap();
        assert_eq!(
            cfg.engine.candidates,
            vec!["@opusaether/pine-transpiler", "pine-transpiler"]
        );
        assert_eq!(cfg.output.mode, OutputMode::Simple);
    }

    #[test]
    fn init_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "log:\n  filter: debug\n").unwrap();

        init_scaffold(&path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "log:\n  filter: debug\n"
        );
    }
}
