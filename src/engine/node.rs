// src/engine/node.rs

//! Locate transpiler packages inside a Node.js installation.
//!
//! Each load and each transpile spawns `node` with the shim from
//! `crate::shim`, synchronously, on the caller's thread. Nothing is cached:
//! installing the package while the process runs is picked up by the next
//! call.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use crate::config::Config;
use crate::engine::{LoadedModule, ModuleLoader, Transpile};
use crate::shim::{node_shim, NODE_SHIM_NAME};

/// Settings needed to reach Node, shared by the loader and every capability
/// it hands out.
#[derive(Debug, Clone)]
struct NodeRuntime {
    node: String,
    node_args: Vec<String>,
    resolve_from: PathBuf,
    env: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct NodeLoader {
    runtime: Arc<NodeRuntime>,
}

impl NodeLoader {
    /// `node` is the binary to spawn; candidates resolve from `resolve_from`.
    pub fn new(node: impl Into<String>, resolve_from: impl Into<PathBuf>) -> Self {
        Self {
            runtime: Arc::new(NodeRuntime {
                node: node.into(),
                node_args: Vec::new(),
                resolve_from: resolve_from.into(),
                env: BTreeMap::new(),
            }),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.runtime.node.clone(), cfg.engine.resolve_from.clone())
            .with_node_args(cfg.runtime.node_args.clone())
            .with_env(cfg.env.clone())
    }

    /// Extra arguments placed before the shim path, e.g. `--no-warnings`.
    pub fn with_node_args(mut self, args: Vec<String>) -> Self {
        Arc::make_mut(&mut self.runtime).node_args = args;
        self
    }

    /// Environment variables injected into every spawned `node`.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        Arc::make_mut(&mut self.runtime).env = env;
        self
    }

    pub fn node(&self) -> &str {
        &self.runtime.node
    }

    pub fn resolve_from(&self) -> &Path {
        &self.runtime.resolve_from
    }
}

#[derive(Debug, Deserialize)]
struct ShimError {
    message: String,
    #[serde(default)]
    stack: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeReply {
    loaded: bool,
    #[serde(default)]
    transpile: bool,
    #[serde(default)]
    error: Option<ShimError>,
}

#[derive(Debug, Deserialize)]
struct TranspileReply {
    ok: bool,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Option<ShimError>,
}

impl ModuleLoader for NodeLoader {
    fn load(&self, id: &str) -> Result<LoadedModule> {
        let workdir = ShimDir::create()?;
        let reply: ProbeReply = self
            .runtime
            .run_shim(&workdir, "probe", id, None)
            .with_context(|| format!("Failed to probe module '{}'", id))?;

        if !reply.loaded {
            let message = reply
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown load error".to_string());
            bail!("Cannot load module '{}': {}", id, message);
        }

        if !reply.transpile {
            return Ok(LoadedModule::without_capability(id));
        }

        Ok(LoadedModule::with_capability(
            id,
            Arc::new(NodeTranspile {
                runtime: self.runtime.clone(),
                module_id: id.to_string(),
            }),
        ))
    }
}

/// `transpile` exported by a Node package.
#[derive(Debug)]
struct NodeTranspile {
    runtime: Arc<NodeRuntime>,
    module_id: String,
}

impl Transpile for NodeTranspile {
    fn transpile(&self, source: &str) -> Result<Value> {
        let workdir = ShimDir::create()?;

        // Source goes through a file, never argv
        let source_path = workdir.path().join("source.pine");
        std::fs::write(&source_path, source).context("Failed to write source file")?;

        let reply: TranspileReply =
            self.runtime
                .run_shim(&workdir, "transpile", &self.module_id, Some(&source_path))?;

        if !reply.ok {
            let err = reply.error.unwrap_or(ShimError {
                message: "engine reported failure without details".to_string(),
                stack: None,
            });
            if let Some(stack) = &err.stack {
                tracing::trace!(module = %self.module_id, %stack, "engine stack");
            }
            bail!("{} threw: {}", self.module_id, err.message);
        }

        Ok(reply.output)
    }
}

/// Temporary directory holding the shim for one spawn.
struct ShimDir {
    dir: TempDir,
    shim: PathBuf,
}

impl ShimDir {
    fn create() -> Result<Self> {
        let dir = tempdir().context("Failed to create temp dir")?;
        let shim = dir.path().join(NODE_SHIM_NAME);
        std::fs::write(&shim, node_shim()).context("Failed to write engine shim")?;
        Ok(Self { dir, shim })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl NodeRuntime {
    fn run_shim<T>(
        &self,
        workdir: &ShimDir,
        mode: &str,
        module_id: &str,
        source: Option<&Path>,
    ) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut cmd = Command::new(&self.node);
        cmd.args(&self.node_args)
            .arg(&workdir.shim)
            .arg(mode)
            .arg(module_id)
            .arg(&self.resolve_from);

        if let Some(source) = source {
            cmd.arg(source);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to spawn runtime {:?}", self.node))?;

        forward_engine_stderr(module_id, &output.stderr);

        let stdout = String::from_utf8(output.stdout).context("stdout not valid UTF-8")?;
        let trimmed = stdout.trim();

        if trimmed.is_empty() {
            bail!("Shim produced no output (exit status {})", output.status);
        }

        serde_json::from_str(trimmed).context("Shim did not emit valid JSON")
    }
}

/// Replay the engine's console output through `tracing` instead of the
/// host's stderr.
fn forward_engine_stderr(module_id: &str, stderr: &[u8]) {
    for line in String::from_utf8_lossy(stderr).lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (stream, message) = split_engine_line(line);
        tracing::debug!(module = %module_id, stream, "{}", message);
    }
}

/// Split a shim stderr line into its stream marker and message.
fn split_engine_line(line: &str) -> (&'static str, &str) {
    if let Some(rest) = line.strip_prefix("__PINE_LOG__ ") {
        ("log", rest)
    } else if let Some(rest) = line.strip_prefix("__PINE_ERR__ ") {
        ("error", rest)
    } else {
        ("node", line)
    }
}
