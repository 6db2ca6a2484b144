//! Applying fetched assets to the host.
//!
//! Fetched bytes are handed to an [`AssetHost`]. Evaluating a script is what
//! makes a package's extension types available: the host registers their
//! factories into [`ExtensionTypes`] as a side effect.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::assets::Asset;
use crate::error::Result;
use crate::extension::ExtensionTypes;

/// Consumer of fetched package assets.
pub trait AssetHost: Send + Sync {
    fn apply_stylesheet(&self, package: &str, asset: &Asset) -> Result<()>;

    /// Evaluate a package script; extension types it provides must be
    /// registered into `types` before this returns.
    fn evaluate_script(&self, package: &str, asset: &Asset, types: &ExtensionTypes) -> Result<()>;
}

/// Bundle activation function, run when the bundle's script is evaluated.
pub type Activator = Arc<dyn Fn(&ExtensionTypes) + Send + Sync>;

/// Asset host for bundles compiled into the application.
///
/// Each bundle registers an activator under its package id. Evaluating the
/// package's script runs the activator; stylesheets and scripts that were
/// applied are recorded in load order.
#[derive(Default)]
pub struct BundleCatalog {
    activators: RwLock<HashMap<String, Activator>>,
    stylesheets: Mutex<Vec<String>>,
    scripts: Mutex<Vec<String>>,
}

impl BundleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_bundle<F>(&self, package: impl Into<String>, activator: F)
    where
        F: Fn(&ExtensionTypes) + Send + Sync + 'static,
    {
        self.activators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(package.into(), Arc::new(activator));
    }

    pub fn with_bundle<F>(self, package: impl Into<String>, activator: F) -> Self
    where
        F: Fn(&ExtensionTypes) + Send + Sync + 'static,
    {
        self.register_bundle(package, activator);
        self
    }

    /// URLs of applied stylesheets, in application order.
    pub fn stylesheets(&self) -> Vec<String> {
        self.stylesheets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// URLs of evaluated scripts, in evaluation order.
    pub fn scripts(&self) -> Vec<String> {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AssetHost for BundleCatalog {
    fn apply_stylesheet(&self, package: &str, asset: &Asset) -> Result<()> {
        tracing::debug!(package = %package, url = %asset.url, "Stylesheet applied");
        self.stylesheets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(asset.url.clone());
        Ok(())
    }

    fn evaluate_script(&self, package: &str, asset: &Asset, types: &ExtensionTypes) -> Result<()> {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(asset.url.clone());

        let activator = self
            .activators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(package)
            .cloned();
        match activator {
            Some(activate) => {
                tracing::debug!(package = %package, url = %asset.url, "Activating bundle");
                activate(types);
            }
            None => {
                tracing::debug!(package = %package, "No activator registered; script provides no extension types");
            }
        }
        Ok(())
    }
}
