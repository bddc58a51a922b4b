// src/engine/normalize.rs

//! Classify what an engine returned into a report.

use anyhow::anyhow;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::engine::{panic_message, Transpile};
use crate::report::{ValidationResult, MESSAGE_ERROR, MESSAGE_PASS, RULE_TRANSPILER};

/// Result of invoking a resolved capability.
#[derive(Debug)]
pub enum Outcome {
    /// The engine returned; its value was classified.
    Reported(ValidationResult),
    /// The engine threw (or panicked). Callers see no findings.
    InvocationFailed(anyhow::Error),
}

impl Outcome {
    pub fn into_results(self) -> Vec<ValidationResult> {
        match self {
            Outcome::Reported(r) => vec![r],
            Outcome::InvocationFailed(_) => Vec::new(),
        }
    }
}

/// Only a non-empty string counts as a successful transpile.
pub fn classify(value: &Value) -> ValidationResult {
    match value {
        Value::String(s) if !s.is_empty() => ValidationResult::pass(RULE_TRANSPILER, MESSAGE_PASS),
        _ => ValidationResult::error(RULE_TRANSPILER, MESSAGE_ERROR),
    }
}

/// Call the capability exactly once with `source`.
///
/// A panicking engine is treated like one that returned an error.
pub fn invoke(capability: &dyn Transpile, source: &str) -> Outcome {
    match catch_unwind(AssertUnwindSafe(|| capability.transpile(source))) {
        Ok(Ok(value)) => Outcome::Reported(classify(&value)),
        Ok(Err(e)) => Outcome::InvocationFailed(e),
        Err(payload) => Outcome::InvocationFailed(anyhow!(
            "engine panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}
