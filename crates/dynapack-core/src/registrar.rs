//! Extension registration for freshly loaded packages.

use dynapack_meta::Descriptor;

use crate::error::{Error, Result};
use crate::extension::{ExtensionContext, ExtensionFactory, ExtensionTypes, extension_key};
use crate::host::{HostApplication, RegisteredExtension};

/// Instantiate and register the extensions `descriptor` declares.
///
/// Every declared type is checked before anything is instantiated: an unknown
/// type, a type whose key would be empty (`"Foo."`), or a key collision fails
/// the whole package and leaves the host's registry untouched. Returns the
/// registered keys in declaration order.
pub fn register_extensions(
    package: &str,
    descriptor: &Descriptor,
    types: &ExtensionTypes,
    host: &HostApplication,
) -> Result<Vec<String>> {
    if descriptor.skip_js || descriptor.extensions.is_empty() {
        return Ok(Vec::new());
    }

    let mut pending: Vec<(String, &str, ExtensionFactory)> = Vec::new();
    for type_name in descriptor.extensions.iter().filter(|name| !name.is_empty()) {
        let key = extension_key(type_name);
        let factory = if key.is_empty() {
            None
        } else {
            types.get(type_name)
        };
        let Some(factory) = factory else {
            tracing::error!(
                package = %package,
                type_name = %type_name,
                "Package contains an extension reference to an unknown type"
            );
            return Err(Error::UnknownExtensionType {
                package: package.to_string(),
                type_name: type_name.clone(),
            });
        };

        let key = key.to_string();
        let existing = host.type_name_of(&key).or_else(|| {
            pending
                .iter()
                .find(|(pending_key, _, _)| *pending_key == key)
                .map(|(_, pending_type, _)| pending_type.to_string())
        });
        if let Some(existing) = existing {
            return Err(conflict(package, type_name, key, existing));
        }
        pending.push((key, type_name.as_str(), factory));
    }

    let batch: Vec<RegisteredExtension> = pending
        .into_iter()
        .map(|(key, type_name, factory)| {
            let context = ExtensionContext {
                key: key.clone(),
                type_name: type_name.to_string(),
                package: Some(package.to_string()),
            };
            RegisteredExtension {
                instance: factory(&context),
                key,
                type_name: type_name.to_string(),
                package: Some(package.to_string()),
            }
        })
        .collect();

    let keys: Vec<String> = batch.iter().map(|ext| ext.key.clone()).collect();
    let instances: Vec<_> = batch
        .iter()
        .map(|ext| (ext.type_name.clone(), ext.instance.clone()))
        .collect();

    let launched = host.try_insert_all(batch).map_err(|(key, existing)| {
        let type_name = instances
            .iter()
            .map(|(type_name, _)| type_name.as_str())
            .find(|type_name| extension_key(type_name) == key)
            .unwrap_or_default();
        conflict(package, type_name, key, existing)
    })?;

    if launched {
        for (type_name, instance) in instances {
            instance.init(host);
            tracing::info!(package = %package, type_name = %type_name, "Extension was initialized");
        }
    }
    tracing::debug!(package = %package, keys = ?keys, "Extensions registered");
    Ok(keys)
}

fn conflict(package: &str, type_name: &str, key: String, existing: String) -> Error {
    tracing::error!(
        package = %package,
        type_name = %type_name,
        key = %key,
        existing = %existing,
        "Extension key conflicts with an existing extension"
    );
    Error::ExtensionIdConflict {
        package: package.to_string(),
        type_name: type_name.to_string(),
        key,
        existing,
    }
}
