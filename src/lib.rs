// src/lib.rs

//! pine-validate
//!
//! Fail-open validation of Pine sources through an optionally installed
//! transpiler engine.
//!
//! The engine is looked up by package name at call time. When it is missing,
//! or when it blows up, validation simply yields no findings so that the
//! surrounding pipeline keeps working.
//!
//! ```no_run
//! let results = pine_validate::validate("a=1");
//! assert!(results.len() <= 1);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod logging;
pub mod report;
pub mod runner;
pub mod shim;
pub mod util;

pub use engine::{ModuleLoader, NodeLoader, RegistryLoader, Transpile, TranspileValidator};
pub use report::{ValidationResult, ValidationStatus};

/// Validate `source` with the default setup.
///
/// Tries the default package names through `node` on `PATH`, resolving from
/// the current directory. Returns zero or one result, never an error.
pub fn validate(source: &str) -> Vec<ValidationResult> {
    TranspileValidator::from_config(&config::Config::default()).validate(source)
}
