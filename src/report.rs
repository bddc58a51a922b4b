// src/report.rs

//! Validation reports.
//!
//! A report is the only thing the engine ever hands back to a caller.
//! At most one is produced per call, always for the `transpiler` rule.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule name every report carries.
pub const RULE_TRANSPILER: &str = "transpiler";

pub const MESSAGE_PASS: &str = "Code parses successfully";
pub const MESSAGE_ERROR: &str = "Code contains syntax errors that prevent transpilation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pass,
    Error,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Pass => f.write_str("pass"),
            ValidationStatus::Error => f.write_str("error"),
        }
    }
}

/// Outcome of one rule check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub rule: String,
    pub status: ValidationStatus,
    pub message: String,
}

impl ValidationResult {
    pub fn pass(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            status: ValidationStatus::Pass,
            message: message.into(),
        }
    }

    pub fn error(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            status: ValidationStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ValidationStatus::Error
    }
}

/* ---------------- rendering ---------------- */

/// How results are printed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Compact JSON array on one line.
    Json,
    /// Indented JSON array.
    Pretty,
    /// One human-readable line per result.
    #[default]
    Simple,
}

pub fn render(results: &[ValidationResult], mode: OutputMode, use_color: bool) -> Result<String> {
    match mode {
        OutputMode::Json => {
            serde_json::to_string(results).context("Failed to serialize results")
        }
        OutputMode::Pretty => {
            serde_json::to_string_pretty(results).context("Failed to serialize results")
        }
        OutputMode::Simple => Ok(render_simple(results, use_color)),
    }
}

fn render_simple(results: &[ValidationResult], use_color: bool) -> String {
    if results.is_empty() {
        return paint("no findings (transpiler unavailable or silent)", "2", use_color);
    }

    results
        .iter()
        .map(|r| {
            let badge = match r.status {
                ValidationStatus::Pass => paint("PASS", "32", use_color),
                ValidationStatus::Error => paint("ERROR", "31", use_color),
            };
            format!("{} [{}] {}", badge, r.rule, r.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[{}m{}\x1b[0m", color, text)
    } else {
        text.to_string()
    }
}
