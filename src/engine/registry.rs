// src/engine/registry.rs

//! In-process module registry.
//!
//! Lets an embedding application offer native engines under the same
//! identifiers the Node locator would look up.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::engine::{LoadedModule, ModuleLoader, Transpile};

#[derive(Default)]
pub struct RegistryLoader {
    modules: BTreeMap<String, Option<Arc<dyn Transpile>>>,
    loads: AtomicUsize,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module exposing `transpile`.
    pub fn register<T>(mut self, id: impl Into<String>, transpile: T) -> Self
    where
        T: Transpile + 'static,
    {
        self.modules.insert(id.into(), Some(Arc::new(transpile)));
        self
    }

    /// Register a module that loads but offers no `transpile`.
    pub fn register_without_capability(mut self, id: impl Into<String>) -> Self {
        self.modules.insert(id.into(), None);
        self
    }

    /// Number of load attempts served so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

impl ModuleLoader for RegistryLoader {
    fn load(&self, id: &str) -> Result<LoadedModule> {
        self.loads.fetch_add(1, Ordering::Relaxed);

        match self.modules.get(id) {
            Some(Some(transpile)) => Ok(LoadedModule::with_capability(id, transpile.clone())),
            Some(None) => Ok(LoadedModule::without_capability(id)),
            None => Err(anyhow!("Cannot find module '{}'", id)),
        }
    }
}

impl std::fmt::Debug for RegistryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryLoader")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .field("loads", &self.loads())
            .finish()
    }
}
