//! Runtime package loader for Dynapack.
//!
//! This crate fetches package descriptors, resolves their dependencies in
//! order, loads their stylesheet and script, and wires the extensions they
//! declare into a running [`HostApplication`]. Concurrent requests for the
//! same package share one load and all receive its outcome.

pub mod assets;
pub mod bundle;
pub mod descriptor;
pub mod error;
pub mod extension;
pub mod host;
pub mod loader;
pub mod registrar;
pub mod registry;
mod resolver;
pub mod transport;

pub use assets::{Asset, AssetKind, AssetPlan, FetchedAssets};
pub use bundle::{Activator, AssetHost, BundleCatalog};
pub use error::{Error, FailureKind, LoadFailure, Result};
pub use extension::{Extension, ExtensionContext, ExtensionFactory, ExtensionTypes, extension_key};
pub use host::{HostApplication, RegisteredExtension};
pub use loader::{LoaderBuilder, PackageLoader, Payload};
pub use registry::{Outcome, PackageState};
pub use transport::{FileTransport, HttpTransport, Transport};

pub use dynapack_meta::{Descriptor, LoaderConfig};
