//! The package loader and its request multiplexer.
//!
//! Every request for a package id goes through [`PackageLoader::request_one`]:
//! the first request for an id claims the pipeline and spawns it as its own
//! task; every other request, concurrent or later, just queues a waiter.
//! When the pipeline reaches a terminal state the queued waiters are drained
//! in FIFO order, each receiving the same [`Outcome`].
//!
//! ```text
//! request_one(id)
//!   terminal?  -> yield, return cached outcome
//!   otherwise  -> enqueue waiter
//!                 first?  -> spawn pipeline(id)
//!                 await waiter
//!
//! pipeline(id)
//!   descriptor -> requires (sequential) -> assets -> extensions -> drain
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dynapack_meta::{Descriptor, LoaderConfig};
use futures::future::{BoxFuture, FutureExt, join_all};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::assets::{self, AssetPlan};
use crate::bundle::{AssetHost, BundleCatalog};
use crate::descriptor::fetch_descriptor;
use crate::error::{Error, FailureKind, LoadFailure, Result};
use crate::extension::ExtensionTypes;
use crate::host::HostApplication;
use crate::registrar::register_extensions;
use crate::registry::{Outcome, PackageState, Registry};
use crate::resolver::resolve_sequential;
use crate::transport::{self, Transport};

/// What a [`require_package`](PackageLoader::require_package) callback receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Descriptors of the requested packages, in request order.
    Descriptors(Vec<Arc<Descriptor>>),
    /// Id of the package that failed.
    Failed(String),
}

struct LoaderInner {
    config: LoaderConfig,
    registry: Mutex<Registry>,
    transport: Arc<dyn Transport>,
    assets: Arc<dyn AssetHost>,
    types: ExtensionTypes,
    host: Arc<HostApplication>,
}

/// Runtime package loader.
///
/// Cloning is cheap; clones share the same registry and collaborators.
#[derive(Clone)]
pub struct PackageLoader {
    inner: Arc<LoaderInner>,
}

impl std::fmt::Debug for PackageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageLoader")
            .field("config", &self.inner.config)
            .field("host", &self.inner.host.name())
            .finish_non_exhaustive()
    }
}

/// Builder for [`PackageLoader`].
///
/// Collaborators left unset get defaults: a transport chosen from the
/// package root, an empty [`BundleCatalog`], and a fresh host.
pub struct LoaderBuilder {
    config: LoaderConfig,
    transport: Option<Arc<dyn Transport>>,
    assets: Option<Arc<dyn AssetHost>>,
    types: Option<ExtensionTypes>,
    host: Option<Arc<HostApplication>>,
}

impl LoaderBuilder {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            transport: None,
            assets: None,
            types: None,
            host: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn asset_host(mut self, assets: Arc<dyn AssetHost>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn types(mut self, types: ExtensionTypes) -> Self {
        self.types = Some(types);
        self
    }

    pub fn host(mut self, host: Arc<HostApplication>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn build(self) -> PackageLoader {
        let transport = self
            .transport
            .unwrap_or_else(|| transport::for_root(&self.config.package_root));
        let registry = Registry::with_preloaded(self.config.preloaded.iter().cloned());
        PackageLoader {
            inner: Arc::new(LoaderInner {
                registry: Mutex::new(registry),
                transport,
                assets: self
                    .assets
                    .unwrap_or_else(|| Arc::new(BundleCatalog::new())),
                types: self.types.unwrap_or_default(),
                host: self
                    .host
                    .unwrap_or_else(|| Arc::new(HostApplication::new("dynapack"))),
                config: self.config,
            }),
        }
    }
}

/// Outcome of admitting a request into the registry.
enum Admission {
    Ready(Outcome),
    Wait {
        receiver: oneshot::Receiver<Outcome>,
        start: bool,
    },
}

impl PackageLoader {
    pub fn new(config: LoaderConfig) -> Self {
        LoaderBuilder::new(config).build()
    }

    pub fn builder(config: LoaderConfig) -> LoaderBuilder {
        LoaderBuilder::new(config)
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Load `ids` strictly in order.
    ///
    /// Returns the descriptors in request order, or the failure of the first
    /// package that could not be loaded. An empty list is an
    /// [`EmptyRequest`](FailureKind::EmptyRequest) failure.
    pub async fn request<I, S>(&self, ids: I) -> std::result::Result<Vec<Arc<Descriptor>>, LoadFailure>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        tracing::debug!(packages = ?ids, "Package request");
        resolve_sequential(self, None, &ids).await
    }

    /// Load `ids` concurrently.
    ///
    /// Returns the descriptors in request order, or the first failure in
    /// list order.
    pub async fn request_concurrent<I, S>(
        &self,
        ids: I,
    ) -> std::result::Result<Vec<Arc<Descriptor>>, LoadFailure>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(LoadFailure::new("", FailureKind::EmptyRequest));
        }
        join_all(ids.iter().map(|id| self.request_one(id)))
            .await
            .into_iter()
            .collect()
    }

    /// Request a single package, sharing any pipeline already in flight.
    pub async fn request_one(&self, id: &str) -> Outcome {
        let admission = {
            let mut registry = self.registry();
            match registry.get_or_create(id).outcome() {
                Some(outcome) => Admission::Ready(outcome),
                None => {
                    let (sender, receiver) = oneshot::channel();
                    registry.enqueue_waiter(id, sender);
                    let start = registry.begin_pipeline(id);
                    Admission::Wait { receiver, start }
                }
            }
        };

        match admission {
            Admission::Ready(outcome) => {
                // Terminal outcomes are still delivered asynchronously.
                tokio::task::yield_now().await;
                outcome
            }
            Admission::Wait { receiver, start } => {
                if start {
                    tracing::debug!(package = %id, "Starting package pipeline");
                    tokio::spawn(self.clone().run_pipeline(id.to_string()));
                }
                receiver
                    .await
                    .unwrap_or_else(|_| Err(LoadFailure::new(id, FailureKind::Interrupted)))
            }
        }
    }

    /// Request `dependency` on behalf of `package`'s pipeline.
    pub(crate) async fn request_dependency(&self, package: &str, dependency: &str) -> Outcome {
        if !self.registry().begin_await(package, dependency) {
            tracing::error!(
                package = %package,
                dependency = %dependency,
                "Circular package dependency"
            );
            return Err(LoadFailure::new(dependency, FailureKind::DependencyCycle));
        }
        let outcome = self.request_one(dependency).await;
        self.registry().end_await(package);
        outcome
    }

    /// Callback-style request for UI glue.
    ///
    /// `callback` runs on a spawned task once the request settles, never
    /// synchronously inside this call.
    pub fn require_package<I, S, F>(&self, ids: I, callback: F) -> JoinHandle<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(bool, Payload) + Send + 'static,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let loader = self.clone();
        tokio::spawn(async move {
            match loader.request(ids).await {
                Ok(descriptors) => callback(true, Payload::Descriptors(descriptors)),
                Err(failure) => callback(false, Payload::Failed(failure.package)),
            }
        })
    }

    /// Descriptor of `id`, fetched at most once and cached.
    ///
    /// A call made while another fetch of `id` is in flight waits for that
    /// fetch instead of issuing its own. A failed fetch is not cached.
    pub async fn descriptor(&self, id: &str) -> Result<Arc<Descriptor>> {
        let cell = self.registry().get_or_create(id).descriptor_cell();
        let descriptor = cell
            .get_or_try_init(|| async {
                fetch_descriptor(self.inner.transport.as_ref(), &self.inner.config, id)
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(descriptor.clone())
    }

    /// Asset URLs a load of `id` would fetch.
    pub async fn asset_plan(&self, id: &str) -> Result<AssetPlan> {
        let descriptor = self.descriptor(id).await?;
        Ok(AssetPlan::new(&self.inner.config, id, &descriptor))
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.registry().is_loaded(id)
    }

    pub fn state(&self, id: &str) -> PackageState {
        self.registry().state(id)
    }

    /// Loaded package ids, including preloaded ones (sorted).
    pub fn loaded_packages(&self) -> Vec<String> {
        self.registry().loaded_packages()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    pub fn host(&self) -> &Arc<HostApplication> {
        &self.inner.host
    }

    pub fn types(&self) -> &ExtensionTypes {
        &self.inner.types
    }

    fn run_pipeline(self, id: String) -> BoxFuture<'static, ()> {
        async move {
            let guard = PipelineGuard::new(self.clone(), id.clone());
            let outcome = match self.load_package(&id).await {
                Ok(descriptor) => {
                    tracing::info!(package = %id, "Package was retrieved");
                    Ok(descriptor)
                }
                Err(err) => {
                    tracing::error!(package = %id, error = %err, "Package failed to load");
                    Err(err.failure(&id))
                }
            };
            guard.disarm();
            let notified = self.registry().drain_waiters(&id, outcome);
            tracing::debug!(package = %id, waiters = notified, "Package waiters notified");
        }
        .boxed()
    }

    async fn load_package(&self, id: &str) -> Result<Arc<Descriptor>> {
        let descriptor = match self.descriptor(id).await {
            Ok(descriptor) => descriptor,
            Err(err) if !self.inner.config.strict => {
                tracing::warn!(
                    package = %id,
                    error = %err,
                    "Descriptor unavailable; loading package with defaults"
                );
                self.registry()
                    .cache_descriptor(id, Arc::new(Descriptor::fallback(id)))
            }
            Err(err) => return Err(err),
        };

        if !descriptor.requires.is_empty() {
            tracing::debug!(package = %id, requires = ?descriptor.requires, "Resolving dependencies");
            resolve_sequential(self, Some(id), &descriptor.requires)
                .await
                .map_err(|failure| dependency_error(id, failure))?;
        }

        let fetched =
            assets::load_assets(self.inner.transport.as_ref(), &self.inner.config, id, &descriptor)
                .await?;
        if let Some(stylesheet) = &fetched.stylesheet {
            self.inner.assets.apply_stylesheet(id, stylesheet)?;
        }
        if let Some(script) = &fetched.script {
            self.inner
                .assets
                .evaluate_script(id, script, &self.inner.types)?;
        }

        register_extensions(id, &descriptor, &self.inner.types, &self.inner.host)?;
        Ok(descriptor)
    }
}

fn dependency_error(package: &str, failure: LoadFailure) -> Error {
    if failure.kind == FailureKind::DependencyCycle {
        return Error::DependencyCycle {
            package: package.to_string(),
            dependency: failure.package,
        };
    }
    tracing::error!(
        package = %package,
        dependency = %failure.package,
        kind = %failure.kind,
        "Dependent package could not be loaded"
    );
    Error::DependencyFailure {
        package: package.to_string(),
        failure,
    }
}

/// Delivers an `Interrupted` outcome if a pipeline ends without settling,
/// e.g. when it panics or its task is dropped at runtime shutdown.
struct PipelineGuard {
    loader: PackageLoader,
    id: String,
    armed: bool,
}

impl PipelineGuard {
    fn new(loader: PackageLoader, id: String) -> Self {
        Self {
            loader,
            id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PipelineGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::error!(package = %self.id, "Package pipeline ended without an outcome");
            let failure = LoadFailure::new(self.id.as_str(), FailureKind::Interrupted);
            self.loader.registry().drain_waiters(&self.id, Err(failure));
        }
    }
}
