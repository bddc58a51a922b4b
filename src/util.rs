// src/util.rs

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Resolve a directory path relative to the location of the config file.
///
/// Example:
/// config at `/project/pine-validate.yaml`
/// engine.resolve_from = "app"
/// → resolves to `/project/app`
pub fn resolve_dir_relative_to_config(config_path: &Path, rel_dir: &Path) -> Result<PathBuf> {
    let base = config_path
        .parent()
        .context("Config path has no parent directory")?;
    Ok(base.join(rel_dir))
}

/// Read a UTF-8 file into a String with a clear error message.
pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Read the source to validate: the given file, or stdin when absent or `-`.
pub fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => read_to_string(p),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read source from stdin")?;
            Ok(buf)
        }
    }
}
