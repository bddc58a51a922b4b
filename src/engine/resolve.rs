// src/engine/resolve.rs

//! Candidate resolution.
//!
//! Candidates are tried strictly in order. A candidate is accepted when it
//! loads AND exposes a `transpile` capability. Every rejection is recorded
//! and logged, never returned as an error.

use anyhow::anyhow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::engine::{panic_message, ModuleLoader, Transpile};

/// Why a candidate was passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The loader could not load the module.
    LoadFailed(String),
    /// The module loaded but has no callable `transpile`.
    MissingCapability,
}

/// One rejected candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub module_id: String,
    pub failure: AttemptFailure,
}

pub enum Resolution {
    Resolved {
        module_id: String,
        capability: Arc<dyn Transpile>,
        /// Candidates rejected before this one.
        attempts: Vec<Attempt>,
    },
    Unavailable {
        attempts: Vec<Attempt>,
    },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Resolution::Resolved { attempts, .. } | Resolution::Unavailable { attempts } => {
                attempts
            }
        }
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Resolved {
                module_id,
                attempts,
                ..
            } => f
                .debug_struct("Resolved")
                .field("module_id", module_id)
                .field("attempts", attempts)
                .finish(),
            Resolution::Unavailable { attempts } => f
                .debug_struct("Unavailable")
                .field("attempts", attempts)
                .finish(),
        }
    }
}

/// Try each candidate in order and return the first usable capability.
pub fn resolve<L>(candidates: &[String], loader: &L) -> Resolution
where
    L: ModuleLoader + ?Sized,
{
    let mut attempts = Vec::new();

    for id in candidates {
        let loaded = catch_unwind(AssertUnwindSafe(|| loader.load(id)))
            .unwrap_or_else(|payload| {
                Err(anyhow!("loader panicked: {}", panic_message(payload.as_ref())))
            });

        let module = match loaded {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(module = %id, error = %format!("{:#}", e), "candidate failed to load");
                attempts.push(Attempt {
                    module_id: id.clone(),
                    failure: AttemptFailure::LoadFailed(format!("{:#}", e)),
                });
                continue;
            }
        };

        match module.transpile_capability() {
            Some(capability) => {
                tracing::debug!(module = %id, "resolved transpiler engine");
                return Resolution::Resolved {
                    module_id: id.clone(),
                    capability,
                    attempts,
                };
            }
            None => {
                tracing::debug!(module = %id, "candidate loaded without a transpile function");
                attempts.push(Attempt {
                    module_id: id.clone(),
                    failure: AttemptFailure::MissingCapability,
                });
            }
        }
    }

    Resolution::Unavailable { attempts }
}
