//! Error types for dynapack-core
//!
//! [`Error`] carries the full cause of a failed step and is what the pipeline
//! logs. Waiters receive the collapsed [`LoadFailure`], which names the
//! package that broke and the kind of failure.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Category of a package load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The descriptor could not be fetched or parsed.
    DescriptorUnavailable,
    /// A script or stylesheet failed to load, or nothing was configured to load.
    AssetLoadFailure,
    /// A declared extension type was not provided by the loaded script.
    UnknownExtensionType,
    /// A declared extension's key is already registered with the host.
    ExtensionIdConflict,
    /// The `requires` lists form a cycle.
    DependencyCycle,
    /// A request named no packages.
    EmptyRequest,
    /// The pipeline ended without delivering an outcome.
    Interrupted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::DescriptorUnavailable => "descriptor unavailable",
            FailureKind::AssetLoadFailure => "asset load failure",
            FailureKind::UnknownExtensionType => "unknown extension type",
            FailureKind::ExtensionIdConflict => "extension id conflict",
            FailureKind::DependencyCycle => "dependency cycle",
            FailureKind::EmptyRequest => "empty request",
            FailureKind::Interrupted => "interrupted",
        };
        f.write_str(label)
    }
}

/// Outcome delivered to every waiter of a failed package.
///
/// `package` is the failing identifier: for a broken dependency chain it
/// names the dependency that failed, not the package that required it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("package '{package}' failed: {kind}")]
pub struct LoadFailure {
    pub package: String,
    pub kind: FailureKind,
}

impl LoadFailure {
    pub fn new(package: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            package: package.into(),
            kind,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Descriptor for package '{package}' could not be located: {reason}")]
    DescriptorUnavailable { package: String, reason: String },

    #[error("Dependent package '{dependency}' for package '{package}' could not be loaded", dependency = .failure.package)]
    DependencyFailure {
        package: String,
        failure: LoadFailure,
    },

    #[error("Package '{package}' failed to load assets: {reason}")]
    AssetLoadFailure { package: String, reason: String },

    #[error("Package '{package}' contains an extension reference to an unknown type: {type_name}")]
    UnknownExtensionType { package: String, type_name: String },

    #[error(
        "Package '{package}' contains extension '{type_name}' whose key '{key}' conflicts with existing extension '{existing}'"
    )]
    ExtensionIdConflict {
        package: String,
        type_name: String,
        key: String,
        existing: String,
    },

    #[error("Package '{package}' has a circular dependency through '{dependency}'")]
    DependencyCycle { package: String, dependency: String },

    #[error("No packages were requested")]
    EmptyRequest,

    #[error("Failed to fetch {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Metadata error: {0}")]
    Meta(#[from] dynapack_meta::Error),
}

impl Error {
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Collapse this error into the outcome delivered to waiters of `package`.
    pub fn failure(&self, package: &str) -> LoadFailure {
        match self {
            Error::DescriptorUnavailable { package, .. } => {
                LoadFailure::new(package.as_str(), FailureKind::DescriptorUnavailable)
            }
            Error::DependencyFailure { failure, .. } => failure.clone(),
            Error::AssetLoadFailure { package, .. } => {
                LoadFailure::new(package.as_str(), FailureKind::AssetLoadFailure)
            }
            Error::UnknownExtensionType { package, .. } => {
                LoadFailure::new(package.as_str(), FailureKind::UnknownExtensionType)
            }
            Error::ExtensionIdConflict { package, .. } => {
                LoadFailure::new(package.as_str(), FailureKind::ExtensionIdConflict)
            }
            Error::DependencyCycle { dependency, .. } => {
                LoadFailure::new(dependency.as_str(), FailureKind::DependencyCycle)
            }
            Error::EmptyRequest => LoadFailure::new(package, FailureKind::EmptyRequest),
            Error::Transport { .. } => LoadFailure::new(package, FailureKind::AssetLoadFailure),
            Error::Meta(_) => LoadFailure::new(package, FailureKind::DescriptorUnavailable),
        }
    }
}
