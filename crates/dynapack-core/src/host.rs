//! The host application's live extension registry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::extension::{Extension, ExtensionContext, extension_key};

/// An extension registered with the host.
#[derive(Clone)]
pub struct RegisteredExtension {
    pub key: String,
    pub type_name: String,
    /// Declaring package; `None` for extensions present at startup.
    pub package: Option<String>,
    pub instance: Arc<dyn Extension>,
}

impl std::fmt::Debug for RegisteredExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredExtension")
            .field("key", &self.key)
            .field("type_name", &self.type_name)
            .field("package", &self.package)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct HostState {
    extensions: Vec<RegisteredExtension>,
    launched: bool,
}

impl HostState {
    fn type_name_of(&self, key: &str) -> Option<&str> {
        self.extensions
            .iter()
            .find(|ext| ext.key == key)
            .map(|ext| ext.type_name.as_str())
    }
}

/// The running application extensions are wired into.
///
/// Extensions registered before [`launch`](Self::launch) are initialized by
/// it; extensions registered afterwards are initialized on registration.
#[derive(Debug, Default)]
pub struct HostApplication {
    name: String,
    state: Mutex<HostState>,
}

impl HostApplication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an extension declared at startup.
    pub fn register_static(&self, type_name: &str, instance: Arc<dyn Extension>) -> Result<()> {
        let key = extension_key(type_name).to_string();
        let launched = self
            .try_insert_all(vec![RegisteredExtension {
                key,
                type_name: type_name.to_string(),
                package: None,
                instance: instance.clone(),
            }])
            .map_err(|(key, existing)| Error::ExtensionIdConflict {
                package: self.name.clone(),
                type_name: type_name.to_string(),
                key,
                existing,
            })?;
        if launched {
            instance.init(self);
        }
        Ok(())
    }

    /// Build and register a startup extension from its factory.
    pub fn register_static_with<F>(&self, type_name: &str, factory: F) -> Result<()>
    where
        F: FnOnce(&ExtensionContext) -> Arc<dyn Extension>,
    {
        let context = ExtensionContext {
            key: extension_key(type_name).to_string(),
            type_name: type_name.to_string(),
            package: None,
        };
        self.register_static(type_name, factory(&context))
    }

    /// Add a batch of extensions atomically.
    ///
    /// Either every extension is added or none is: on a key collision,
    /// returns `(key, existing type name)`. On success, returns whether the
    /// host had already launched, in which case the caller must initialize
    /// the new extensions.
    pub(crate) fn try_insert_all(
        &self,
        batch: Vec<RegisteredExtension>,
    ) -> std::result::Result<bool, (String, String)> {
        let mut state = self.state();
        for (index, ext) in batch.iter().enumerate() {
            let existing = state.type_name_of(&ext.key).map(str::to_string).or_else(|| {
                batch[..index]
                    .iter()
                    .find(|earlier| earlier.key == ext.key)
                    .map(|earlier| earlier.type_name.clone())
            });
            if let Some(existing) = existing {
                return Err((ext.key.clone(), existing));
            }
        }
        state.extensions.extend(batch);
        Ok(state.launched)
    }

    /// Run the startup sequence: initialize every registered extension once.
    ///
    /// Calling `launch` again is a no-op.
    pub fn launch(&self) {
        let pending: Vec<Arc<dyn Extension>> = {
            let mut state = self.state();
            if state.launched {
                return;
            }
            state.launched = true;
            state
                .extensions
                .iter()
                .map(|ext| ext.instance.clone())
                .collect()
        };
        tracing::info!(host = %self.name, extensions = pending.len(), "Host launched");
        for instance in pending {
            instance.init(self);
        }
    }

    pub fn is_launched(&self) -> bool {
        self.state().launched
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Extension>> {
        self.state()
            .extensions
            .iter()
            .find(|ext| ext.key == key)
            .map(|ext| ext.instance.clone())
    }

    /// Type name registered under `key`.
    pub fn type_name_of(&self, key: &str) -> Option<String> {
        self.state().type_name_of(key).map(str::to_string)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.state().type_name_of(key).is_some()
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> Vec<String> {
        self.state()
            .extensions
            .iter()
            .map(|ext| ext.key.clone())
            .collect()
    }

    pub fn extensions(&self) -> Vec<RegisteredExtension> {
        self.state().extensions.clone()
    }

    pub fn len(&self) -> usize {
        self.state().extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().extensions.is_empty()
    }
}
