// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use crate::engine::default_candidates;
use crate::report::OutputMode;
use crate::util::resolve_dir_relative_to_config;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pine-validate.yaml";

/// Root configuration loaded from `pine-validate.yaml`.
///
/// This file controls:
/// - Which package names are tried for the transpiler engine
/// - Where (which project directory) they are resolved from
/// - Which Node binary to use and what environment it gets
/// - How results are printed and how noisy logging is
///
/// Every section is optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    /// Runtime binary (node)
    #[serde(default)]
    pub runtime: Runtime,

    /// Environment variables injected into the node process
    ///
    /// Example:
    /// NODE_PATH: /opt/engines/node_modules
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Engine lookup section.
///
/// Example in pine-validate.yaml:
///
/// engine:
///   candidates:
///     - "@opusaether/pine-transpiler"
///     - pine-transpiler
///   resolve_from: .
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Package identifiers, highest priority first.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,

    /// Directory packages are resolved from.
    /// Relative paths are resolved against the location of the config file.
    #[serde(default = "default_resolve_from")]
    pub resolve_from: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            resolve_from: default_resolve_from(),
        }
    }
}

fn default_resolve_from() -> PathBuf {
    PathBuf::from(".")
}

/// Runtime binary configuration.
///
/// Example:
///
/// runtime:
///   node: node
///   node_args: ["--no-warnings"]
#[derive(Debug, Clone, Deserialize)]
pub struct Runtime {
    #[serde(default = "default_node")]
    pub node: String,

    #[serde(default)]
    pub node_args: Vec<String>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            node: default_node(),
            node_args: Vec::new(),
        }
    }
}

fn default_node() -> String {
    "node".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: OutputMode,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogConfig {
    /// `tracing` filter directive, e.g. `debug` or `pine_validate=trace`.
    /// `RUST_LOG` wins when set.
    #[serde(default)]
    pub filter: Option<String>,
}

impl Config {
    /// Load and parse a config file from disk.
    ///
    /// This performs:
    /// - File read
    /// - YAML deserialization
    /// - Resolution of `engine.resolve_from` against the file's directory
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut cfg = Self::parse(&raw)?;

        if cfg.engine.resolve_from.is_relative() {
            cfg.engine.resolve_from =
                resolve_dir_relative_to_config(path, &cfg.engine.resolve_from)?;
        }

        Ok(cfg)
    }

    /// Like `load`, but a missing file means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a map
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).context("Failed to parse YAML config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = Config::parse("").unwrap();

        assert_eq!(
            cfg.engine.candidates,
            vec!["@opusaether/pine-transpiler", "pine-transpiler"]
        );
        assert_eq!(cfg.runtime.node, "node");
        assert_eq!(cfg.output.mode, OutputMode::Simple);
        assert!(cfg.log.filter.is_none());
    }

    #[test]
    fn parses_every_section() {
        let cfg = Config::parse(
            r#"
engine:
  candidates: ["@acme/pine", "pine-transpiler"]
  resolve_from: /srv/app
runtime:
  node: /usr/local/bin/node
  node_args: ["--no-warnings"]
env:
  NODE_PATH: /opt/engines
output:
  mode: pretty
log:
  filter: debug
"#,
        )
        .unwrap();

        assert_eq!(cfg.engine.candidates, vec!["@acme/pine", "pine-transpiler"]);
        assert_eq!(cfg.engine.resolve_from, PathBuf::from("/srv/app"));
        assert_eq!(cfg.runtime.node_args, vec!["--no-warnings"]);
        assert_eq!(cfg.env["NODE_PATH"], "/opt/engines");
        assert_eq!(cfg.output.mode, OutputMode::Pretty);
        assert_eq!(cfg.log.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn relative_resolve_from_follows_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "engine:\n  resolve_from: project\n").unwrap();

        let cfg = Config::load(&path).unwrap();

        assert_eq!(cfg.engine.resolve_from, dir.path().join("project"));
    }

    #[test]
    fn missing_file_is_only_fatal_when_loaded_explicitly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        assert!(Config::load(&path).is_err());
        assert_eq!(
            Config::load_or_default(&path).unwrap().engine.candidates.len(),
            2
        );
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let err = Config::parse("engine: [").unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }
}
