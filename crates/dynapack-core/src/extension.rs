//! Extension types and the factory registry.
//!
//! A package's script makes extension types available by registering a
//! factory under the type's fully-qualified name. The registrar later looks
//! the factory up by the names a descriptor declares.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::host::HostApplication;

/// A unit of behavior wired into the host after its package loads.
pub trait Extension: Send + Sync {
    /// Initialization hook, run once the host has launched.
    fn init(&self, host: &HostApplication);
}

/// What a factory knows about the extension it is building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionContext {
    /// Registration key (last dotted segment of the type name).
    pub key: String,
    pub type_name: String,
    /// Package that declared the extension; `None` for startup extensions.
    pub package: Option<String>,
}

pub type ExtensionFactory = Arc<dyn Fn(&ExtensionContext) -> Arc<dyn Extension> + Send + Sync>;

/// Registration key for a fully-qualified type name.
///
/// `Acme.controller.Ledger` registers as `Ledger`.
pub fn extension_key(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

/// Registry of extension factories by type name.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone, Default)]
pub struct ExtensionTypes {
    factories: Arc<RwLock<HashMap<String, ExtensionFactory>>>,
}

impl ExtensionTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `type_name` available. Re-registering a name replaces its factory.
    pub fn register<F>(&self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&ExtensionContext) -> Arc<dyn Extension> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        tracing::debug!(type_name = %type_name, "Extension type registered");
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(type_name, Arc::new(factory));
    }

    pub fn get(&self, type_name: &str) -> Option<ExtensionFactory> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_name)
            .cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(type_name)
    }

    /// Registered type names (sorted).
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ExtensionTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionTypes")
            .field("names", &self.names())
            .finish()
    }
}
