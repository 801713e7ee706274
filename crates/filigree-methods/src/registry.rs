// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Method registry: name -> shared method instance.
//
// Reads vastly outnumber writes (writes happen at startup or in test
// setup), so the map sits behind an `RwLock`: lookups share the lock, and a
// register/unregister takes it exclusively, so no reader ever observes a
// half-updated map.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use filigree_core::error::FiligreeError;
use filigree_core::types::MethodInfo;
use tracing::{debug, info};

use crate::method::WatermarkingMethod;
use crate::methods::object_stream::ObjectStream;
use crate::methods::trailer::TrailerSeal;

/// Shared handle to a registered method.
pub type SharedMethod = Arc<dyn WatermarkingMethod>;

/// Registry of available watermarking methods.
///
/// Construct one per engine (or per test) and hand it to the workflow; there
/// is no process-wide instance.
#[derive(Default)]
pub struct MethodRegistry {
    methods: RwLock<HashMap<String, SharedMethod>>,
}

impl MethodRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in PDF methods.
    pub fn with_builtin_methods() -> Self {
        let registry = Self::new();
        registry.register_method(TrailerSeal);
        registry.register_method(ObjectStream);
        registry
    }

    /// Insert or overwrite the mapping for `name` (last write wins).
    ///
    /// Returns the instance previously registered under `name`, if any.
    pub fn register(
        &self,
        name: impl Into<String>,
        method: SharedMethod,
    ) -> Option<SharedMethod> {
        let name = name.into();
        let previous = self
            .methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), method);

        if previous.is_some() {
            info!(method = %name, "watermarking method replaced");
        } else {
            debug!(method = %name, "watermarking method registered");
        }
        previous
    }

    /// Register `method` under its own [`WatermarkingMethod::name`].
    pub fn register_method<M>(&self, method: M) -> Option<SharedMethod>
    where
        M: WatermarkingMethod + 'static,
    {
        let name = method.name().to_owned();
        self.register(name, Arc::new(method))
    }

    /// Remove the mapping for `name`. Absent names are not an error.
    pub fn unregister(&self, name: &str) -> Option<SharedMethod> {
        let removed = self
            .methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        if removed.is_some() {
            debug!(method = %name, "watermarking method unregistered");
        }
        removed
    }

    /// Look up a method by name.
    pub fn resolve(&self, name: &str) -> Result<SharedMethod, FiligreeError> {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| FiligreeError::UnknownMethod(name.to_owned()))
    }

    /// Name and usage of every registered method, sorted by name.
    pub fn list(&self) -> Vec<MethodInfo> {
        let mut infos: Vec<MethodInfo> = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, method)| MethodInfo {
                name: name.clone(),
                usage: method.usage().to_owned(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Whether a method is currently registered under `name`.
    ///
    /// A snapshot only: another thread may register or unregister the name
    /// right after this returns, so request paths use [`Self::resolve`].
    ///
    /// ```
    /// use filigree_methods::{MethodRegistry, TrailerSeal};
    ///
    /// let registry = MethodRegistry::new();
    /// assert!(!registry.contains("trailer-seal"));
    /// registry.register_method(TrailerSeal);
    /// assert!(registry.contains("trailer-seal"));
    /// assert_eq!(registry.len(), 1);
    /// ```
    pub fn contains(&self, name: &str) -> bool {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Number of registered names. Aliases registered through
    /// [`Self::register`] count separately even when they share an instance.
    pub fn len(&self) -> usize {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when no method is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.list())
            .finish()
    }
}
