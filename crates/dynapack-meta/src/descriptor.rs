//! Package descriptor parsing.
//!
//! A descriptor is the JSON manifest published next to a package's build
//! output. It names the package, lists the packages it requires (in load
//! order), flags which assets to skip, and declares the extension types the
//! package's script makes available.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "name": "ledger",
//!   "requires": ["ledger-lib"],
//!   "skipResources": false,
//!   "skipJS": false,
//!   "extensions": ["Acme.controller.Ledger"],
//!   "primaryViewClass": "Acme.view.Ledger"
//! }
//! ```
//!
//! Unknown fields such as `primaryViewClass` are kept in [`Descriptor::extra`]
//! and handed back to the caller untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Parsed package manifest.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Descriptor {
    /// Canonical package name; the requested id when the manifest omits it.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Packages that must be loaded, in order, before this one.
    #[serde(default, deserialize_with = "one_or_many")]
    pub requires: Vec<String>,
    /// Omit the stylesheet fetch.
    #[serde(default, rename = "skipResources")]
    pub skip_resources: bool,
    /// Omit the script fetch and extension registration.
    #[serde(default, rename = "skipJS")]
    pub skip_js: bool,
    /// Fully-qualified extension type names to instantiate after load.
    #[serde(default, alias = "controllers", deserialize_with = "one_or_many")]
    pub extensions: Vec<String>,
    /// Caller-defined fields, passed through unmodified.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Descriptor {
    /// Parse a descriptor fetched for `package`.
    ///
    /// An absent, null, or empty `name` falls back to `package`.
    pub fn from_json(package: &str, body: &[u8]) -> Result<Self> {
        let mut descriptor: Descriptor =
            serde_json::from_slice(body).map_err(|e| Error::DescriptorParse {
                package: package.to_string(),
                message: e.to_string(),
            })?;
        if descriptor.name.is_empty() {
            descriptor.name = package.to_string();
        }
        Ok(descriptor)
    }

    /// Descriptor used when no manifest is available: both assets are
    /// expected and nothing is required.
    pub fn fallback(package: &str) -> Self {
        Self {
            name: package.to_string(),
            ..Self::default()
        }
    }

    pub fn wants_stylesheet(&self) -> bool {
        !self.skip_resources
    }

    pub fn wants_script(&self) -> bool {
        !self.skip_js
    }

    /// Look up a pass-through field.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept `"a"`, `["a", "b"]`, or `null`.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
