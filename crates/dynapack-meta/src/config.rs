//! Loader configuration
//!
//! The configuration surface handed to the loader at startup. It can be
//! built in code with the `with_*` setters or loaded from a TOML file:
//!
//! ```toml
//! package_root = "https://cdn.example.com/packages/{0}/"
//! enable_debug = false
//! enable_rtl = false
//! disable_caching = true
//! strict = true
//! preloaded = ["core-ui"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical filename for a loader configuration file.
pub const CONFIG_FILENAME: &str = "dynapack.toml";

/// Runtime configuration for the package loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Package root template; `{0}` is replaced with the package id.
    pub package_root: String,
    /// Descriptor filename relative to the package root.
    pub descriptor_file: String,
    /// Fetch `-debug` builds of assets.
    pub enable_debug: bool,
    /// Fetch the right-to-left stylesheet variant.
    pub enable_rtl: bool,
    /// Append a cache-defeating query parameter to asset URLs.
    pub disable_caching: bool,
    /// Require a descriptor before any asset is fetched.
    pub strict: bool,
    /// Packages statically bundled with the host; never fetched.
    pub preloaded: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            package_root: "../packages/{0}/build/".to_string(),
            descriptor_file: "descriptor.json".to_string(),
            enable_debug: false,
            enable_rtl: false,
            disable_caching: false,
            strict: true,
            preloaded: Vec::new(),
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!(path = ?path, "Loading loader configuration");
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&content).map_err(|e| Error::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::InvalidConfig {
            path: CONFIG_FILENAME.into(),
            message: e.to_string(),
        })
    }

    pub fn with_package_root(mut self, template: impl Into<String>) -> Self {
        self.package_root = template.into();
        self
    }

    pub fn with_descriptor_file(mut self, file: impl Into<String>) -> Self {
        self.descriptor_file = file.into();
        self
    }

    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.enable_debug = enabled;
        self
    }

    pub fn with_rtl(mut self, enabled: bool) -> Self {
        self.enable_rtl = enabled;
        self
    }

    pub fn with_caching_disabled(mut self, disabled: bool) -> Self {
        self.disable_caching = disabled;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Declare a package as statically present.
    pub fn with_preloaded(mut self, package: impl Into<String>) -> Self {
        let package = package.into();
        if !self.preloaded.contains(&package) {
            self.preloaded.push(package);
        }
        self
    }

    pub fn is_preloaded(&self, package: &str) -> bool {
        self.preloaded.iter().any(|p| p == package)
    }

    /// Resolve the package path for `package` from the root template.
    ///
    /// Every `{0}` is replaced with the id. An empty template yields the id
    /// itself; a template without a placeholder is used as-is.
    pub fn package_path(&self, package: &str) -> String {
        if self.package_root.is_empty() {
            return package.to_string();
        }
        self.package_root.replace(crate::ID_PLACEHOLDER, package)
    }

    /// URL of the descriptor for `package`.
    pub fn descriptor_url(&self, package: &str) -> String {
        format!("{}{}", self.package_path(package), self.descriptor_file)
    }
}
