//! Optional transpiler engine access.
//!
//! The engine is an external collaborator that may or may not be installed.
//! This module brokers access to it:
//! - `resolve` walks the candidate identifiers and picks the first module
//!   exposing a callable `transpile`
//! - `normalize` invokes that capability once and classifies what it returned
//!
//! Nothing here ever surfaces an error to the caller. An absent or broken
//! engine contributes no findings.

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::report::ValidationResult;

pub mod node;
pub mod normalize;
pub mod registry;
pub mod resolve;

pub use node::NodeLoader;
pub use normalize::{classify, invoke, Outcome};
pub use registry::RegistryLoader;
pub use resolve::{resolve, Attempt, AttemptFailure, Resolution};

/// Identifiers tried when nothing else is configured, highest priority first.
pub const DEFAULT_CANDIDATES: [&str; 2] = ["@opusaether/pine-transpiler", "pine-transpiler"];

pub fn default_candidates() -> Vec<String> {
    DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/* ---------------- capability ---------------- */

/// The single capability an engine must expose.
///
/// `Ok` carries whatever the engine returned, untyped. `Err` means the
/// engine threw while transpiling.
pub trait Transpile: Send + Sync {
    fn transpile(&self, source: &str) -> Result<Value>;
}

impl<F> Transpile for F
where
    F: Fn(&str) -> Result<Value> + Send + Sync,
{
    fn transpile(&self, source: &str) -> Result<Value> {
        self(source)
    }
}

/// A module that loaded successfully.
///
/// Loading and exposing the capability are separate checks: a module can
/// load fine and still not offer `transpile`.
pub struct LoadedModule {
    id: String,
    transpile: Option<Arc<dyn Transpile>>,
}

impl LoadedModule {
    pub fn with_capability(id: impl Into<String>, transpile: Arc<dyn Transpile>) -> Self {
        Self {
            id: id.into(),
            transpile: Some(transpile),
        }
    }

    pub fn without_capability(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transpile: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transpile_capability(&self) -> Option<Arc<dyn Transpile>> {
        self.transpile.clone()
    }
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("id", &self.id)
            .field("transpile", &self.transpile.is_some())
            .finish()
    }
}

/// Locates a module by identifier at call time.
///
/// `Err` is "could not load" (not installed, runtime missing, ...). The
/// resolver treats it as a rejected candidate.
pub trait ModuleLoader {
    fn load(&self, id: &str) -> Result<LoadedModule>;
}

impl<L: ModuleLoader + ?Sized> ModuleLoader for &L {
    fn load(&self, id: &str) -> Result<LoadedModule> {
        (**self).load(id)
    }
}

impl<L: ModuleLoader + ?Sized> ModuleLoader for Box<L> {
    fn load(&self, id: &str) -> Result<LoadedModule> {
        (**self).load(id)
    }
}

/* ---------------- validator ---------------- */

/// Full internal picture of one call, before it is collapsed for callers.
#[derive(Debug)]
pub enum Diagnosis {
    /// No candidate resolved.
    Unavailable { attempts: Vec<Attempt> },
    /// A candidate resolved and the capability was invoked.
    Invoked {
        module_id: String,
        attempts: Vec<Attempt>,
        outcome: Outcome,
    },
}

impl Diagnosis {
    /// Collapse to the public contract: zero or one result.
    pub fn into_results(self) -> Vec<ValidationResult> {
        match self {
            Diagnosis::Unavailable { .. } => Vec::new(),
            Diagnosis::Invoked { outcome, .. } => outcome.into_results(),
        }
    }
}

/// Validates sources against whichever engine the candidates resolve to.
///
/// Holds no engine state: every call resolves from scratch.
#[derive(Debug, Clone)]
pub struct TranspileValidator<L> {
    candidates: Vec<String>,
    loader: L,
}

impl<L: ModuleLoader> TranspileValidator<L> {
    pub fn new(loader: L) -> Self {
        Self {
            candidates: default_candidates(),
            loader,
        }
    }

    /// Replace the candidate list. Order is priority.
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Resolve, invoke and keep every intermediate distinction.
    pub fn diagnose(&self, source: &str) -> Diagnosis {
        match resolve(&self.candidates, &self.loader) {
            Resolution::Unavailable { attempts } => {
                tracing::debug!(
                    candidates = ?self.candidates,
                    "no transpiler engine available; skipping"
                );
                Diagnosis::Unavailable { attempts }
            }
            Resolution::Resolved {
                module_id,
                capability,
                attempts,
            } => {
                let outcome = invoke(capability.as_ref(), source);

                if let Outcome::InvocationFailed(e) = &outcome {
                    tracing::warn!(
                        module = %module_id,
                        error = %format!("{:#}", e),
                        "transpiler engine failed; contributing no findings"
                    );
                }

                Diagnosis::Invoked {
                    module_id,
                    attempts,
                    outcome,
                }
            }
        }
    }

    /// Zero results when the engine is unavailable or failed, otherwise one.
    pub fn validate(&self, source: &str) -> Vec<ValidationResult> {
        self.diagnose(source).into_results()
    }
}

impl TranspileValidator<NodeLoader> {
    /// Validator backed by Node.js, as described by `cfg`.
    pub fn from_config(cfg: &Config) -> Self {
        TranspileValidator::new(NodeLoader::from_config(cfg))
            .with_candidates(cfg.engine.candidates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ValidationStatus, MESSAGE_ERROR, MESSAGE_PASS, RULE_TRANSPILER};
    use anyhow::bail;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn compiled(source: &str) -> Result<Value> {
        Ok(Value::String(format!("compiled({})", source)))
    }

    #[test]
    fn no_engine_yields_no_results() {
        let validator = TranspileValidator::new(RegistryLoader::new());

        assert!(validator.validate("a=1").is_empty());
        assert!(validator.validate("").is_empty());
    }

    #[test]
    fn non_empty_string_passes() {
        let loader = RegistryLoader::new().register("pine-transpiler", compiled);
        let validator = TranspileValidator::new(loader);

        assert_eq!(
            validator.validate("a=1"),
            vec![ValidationResult::pass(RULE_TRANSPILER, MESSAGE_PASS)]
        );
    }

    #[test]
    fn empty_string_is_an_error_report() {
        let loader = RegistryLoader::new()
            .register("pine-transpiler", |_: &str| -> Result<Value> { Ok(json!("")) });
        let validator = TranspileValidator::new(loader);

        assert_eq!(
            validator.validate("a="),
            vec![ValidationResult::error(RULE_TRANSPILER, MESSAGE_ERROR)]
        );
    }

    #[test]
    fn non_string_outputs_are_error_reports() {
        for value in [json!(null), json!(42), json!(true), json!({"code": "x"}), json!(["x"])] {
            let loader = RegistryLoader::new().register(
                "@opusaether/pine-transpiler",
                move |_: &str| -> Result<Value> { Ok(value.clone()) },
            );
            let results = TranspileValidator::new(loader).validate("a=1");

            assert_eq!(results.len(), 1);
            assert_eq!(results[0].status, ValidationStatus::Error);
        }
    }

    #[test]
    fn throwing_engine_yields_no_results() {
        let loader = RegistryLoader::new().register(
            "pine-transpiler",
            |_: &str| -> Result<Value> { bail!("unexpected token") },
        );
        let validator = TranspileValidator::new(loader);

        assert!(validator.validate("a=").is_empty());

        match validator.diagnose("a=") {
            Diagnosis::Invoked {
                outcome: Outcome::InvocationFailed(e),
                module_id,
                ..
            } => {
                assert_eq!(module_id, "pine-transpiler");
                assert!(e.to_string().contains("unexpected token"));
            }
            other => panic!("unexpected diagnosis: {:?}", other),
        }
    }

    #[test]
    fn panicking_engine_yields_no_results() {
        let loader = RegistryLoader::new().register(
            "pine-transpiler",
            |_: &str| -> Result<Value> { panic!("engine bug") },
        );
        let validator = TranspileValidator::new(loader);

        assert!(validator.validate("a=1").is_empty());

        match validator.diagnose("a=1") {
            Diagnosis::Invoked {
                outcome: Outcome::InvocationFailed(e),
                ..
            } => assert!(e.to_string().contains("engine bug")),
            other => panic!("unexpected diagnosis: {:?}", other),
        }
    }

    #[test]
    fn primary_candidate_wins_over_fallback() {
        let loader = RegistryLoader::new()
            .register("@opusaether/pine-transpiler", |_: &str| -> Result<Value> {
                Ok(json!("primary"))
            })
            .register("pine-transpiler", |_: &str| -> Result<Value> { Ok(json!("")) });
        let validator = TranspileValidator::new(loader);

        let results = validator.validate("a=1");
        assert_eq!(results[0].status, ValidationStatus::Pass);

        match validator.diagnose("a=1") {
            Diagnosis::Invoked { module_id, attempts, .. } => {
                assert_eq!(module_id, "@opusaether/pine-transpiler");
                assert!(attempts.is_empty());
            }
            other => panic!("unexpected diagnosis: {:?}", other),
        }
    }

    #[test]
    fn capability_invoked_once_per_call_and_resolved_every_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let loader = RegistryLoader::new().register("pine-transpiler", move |s: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            compiled(s)
        });
        let validator = TranspileValidator::new(loader);

        let first = validator.validate("a=1");
        let second = validator.validate("a=1");

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(validator.loader().loads(), 4);
    }

    #[test]
    fn custom_candidates_replace_defaults() {
        let loader = RegistryLoader::new()
            .register("pine-transpiler", compiled)
            .register("vendor/pine", |_: &str| -> Result<Value> { Ok(json!("")) });
        let validator = TranspileValidator::new(loader).with_candidates(["vendor/pine"]);

        assert_eq!(validator.candidates(), ["vendor/pine".to_string()]);
        assert_eq!(validator.validate("a=1")[0].status, ValidationStatus::Error);
    }
}
