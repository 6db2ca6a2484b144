//! Package registry: the single source of truth for package state.
//!
//! The registry is a plain data structure with no I/O and no locking of its
//! own. The loader keeps it behind one mutex and never holds that mutex
//! across an await point, so every mutation of a [`PackageEntry`] is
//! serialized.
//!
//! ```text
//! Unregistered --request--> Loading --descriptor+deps+assets ok--> Loaded
//!                           Loading --any failure-----------------> Failed
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dynapack_meta::Descriptor;
use tokio::sync::{OnceCell, oneshot};

use crate::error::LoadFailure;

/// Result delivered to a waiter: the descriptor, or the failure.
pub type Outcome = std::result::Result<Arc<Descriptor>, LoadFailure>;

/// Per-entry descriptor slot. Concurrent fetches of one id join the first.
pub type DescriptorCell = Arc<OnceCell<Arc<Descriptor>>>;

/// Load state of a package.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PackageState {
    #[default]
    Unregistered,
    Loading,
    Loaded,
    Failed(LoadFailure),
}

impl PackageState {
    /// `Loaded` and `Failed` never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PackageState::Loaded | PackageState::Failed(_))
    }
}

/// Registry record for one package id.
#[derive(Debug)]
pub struct PackageEntry {
    pub id: String,
    pub state: PackageState,
    descriptor: DescriptorCell,
    /// Set while a pipeline drives this id.
    pub in_flight: bool,
    /// Dependency this entry's pipeline is currently blocked on.
    pub awaiting: Option<String>,
    waiters: Vec<oneshot::Sender<Outcome>>,
}

impl PackageEntry {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state: PackageState::Unregistered,
            descriptor: Arc::new(OnceCell::new()),
            in_flight: false,
            awaiting: None,
            waiters: Vec::new(),
        }
    }

    fn preloaded(id: &str) -> Self {
        Self {
            state: PackageState::Loaded,
            descriptor: Arc::new(OnceCell::new_with(Some(Arc::new(Descriptor::fallback(id))))),
            ..Self::new(id)
        }
    }

    /// Cached outcome, if the entry is terminal.
    pub fn outcome(&self) -> Option<Outcome> {
        match &self.state {
            PackageState::Loaded => Some(Ok(self
                .descriptor()
                .unwrap_or_else(|| Arc::new(Descriptor::fallback(&self.id))))),
            PackageState::Failed(failure) => Some(Err(failure.clone())),
            PackageState::Unregistered | PackageState::Loading => None,
        }
    }

    /// Descriptor, set once on the first successful fetch.
    pub fn descriptor(&self) -> Option<Arc<Descriptor>> {
        self.descriptor.get().cloned()
    }

    /// Shared slot used to single-flight the descriptor fetch.
    pub fn descriptor_cell(&self) -> DescriptorCell {
        self.descriptor.clone()
    }

    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }
}

/// In-memory map from package id to its [`PackageEntry`].
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, PackageEntry>,
    preloaded: HashSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that treats `preloaded` ids as already loaded.
    pub fn with_preloaded<I, S>(preloaded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: HashMap::new(),
            preloaded: preloaded.into_iter().map(Into::into).collect(),
        }
    }

    /// Get the entry for `id`, creating it on first reference.
    pub fn get_or_create(&mut self, id: &str) -> &mut PackageEntry {
        let preloaded = self.preloaded.contains(id);
        self.entries.entry(id.to_string()).or_insert_with(|| {
            if preloaded {
                PackageEntry::preloaded(id)
            } else {
                PackageEntry::new(id)
            }
        })
    }

    pub fn get(&self, id: &str) -> Option<&PackageEntry> {
        self.entries.get(id)
    }

    pub fn state(&self, id: &str) -> PackageState {
        match self.entries.get(id) {
            Some(entry) => entry.state.clone(),
            None if self.preloaded.contains(id) => PackageState::Loaded,
            None => PackageState::Unregistered,
        }
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.state(id) == PackageState::Loaded
    }

    pub fn set_state(&mut self, id: &str, state: PackageState) {
        self.get_or_create(id).state = state;
    }

    /// Cache a fetched descriptor. The first cached descriptor wins.
    pub fn cache_descriptor(&mut self, id: &str, descriptor: Arc<Descriptor>) -> Arc<Descriptor> {
        let cell = &self.get_or_create(id).descriptor;
        match cell.set(descriptor.clone()) {
            Ok(()) => descriptor,
            Err(_) => cell.get().cloned().unwrap_or(descriptor),
        }
    }

    pub fn cached_descriptor(&self, id: &str) -> Option<Arc<Descriptor>> {
        self.entries.get(id).and_then(PackageEntry::descriptor)
    }

    pub fn enqueue_waiter(&mut self, id: &str, waiter: oneshot::Sender<Outcome>) {
        self.get_or_create(id).waiters.push(waiter);
    }

    /// Claim the pipeline for `id`.
    ///
    /// Returns `true` when the caller must start the pipeline, `false` when
    /// one is already running or the entry is terminal.
    pub fn begin_pipeline(&mut self, id: &str) -> bool {
        let entry = self.get_or_create(id);
        if entry.in_flight || entry.state.is_terminal() {
            return false;
        }
        entry.in_flight = true;
        entry.state = PackageState::Loading;
        true
    }

    /// Record that `package`'s pipeline is about to wait on `dependency`.
    ///
    /// Returns `false`, without recording anything, if waiting would close a
    /// cycle of pipelines each blocked on the next.
    pub fn begin_await(&mut self, package: &str, dependency: &str) -> bool {
        if self.would_cycle(package, dependency) {
            return false;
        }
        self.get_or_create(package).awaiting = Some(dependency.to_string());
        true
    }

    pub fn end_await(&mut self, package: &str) {
        if let Some(entry) = self.entries.get_mut(package) {
            entry.awaiting = None;
        }
    }

    fn would_cycle(&self, package: &str, dependency: &str) -> bool {
        if package == dependency {
            return true;
        }
        let mut seen = HashSet::new();
        let mut current = dependency;
        while let Some(next) = self
            .entries
            .get(current)
            .and_then(|entry| entry.awaiting.as_deref())
        {
            if next == package {
                return true;
            }
            if !seen.insert(next) {
                break;
            }
            current = next;
        }
        false
    }

    /// Move `id` to its terminal state and notify every queued waiter.
    ///
    /// Waiters are notified in the order they were queued. A waiter whose
    /// receiver was dropped is skipped. Returns the number of waiters drained.
    pub fn drain_waiters(&mut self, id: &str, outcome: Outcome) -> usize {
        let entry = self.get_or_create(id);
        match &outcome {
            Ok(descriptor) => {
                let _ = entry.descriptor.set(descriptor.clone());
                entry.state = PackageState::Loaded;
            }
            Err(failure) => entry.state = PackageState::Failed(failure.clone()),
        }
        entry.in_flight = false;
        entry.awaiting = None;

        let waiters = std::mem::take(&mut entry.waiters);
        let count = waiters.len();
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        count
    }

    /// Ids currently loaded, including preloaded ones (sorted).
    pub fn loaded_packages(&self) -> Vec<String> {
        let mut loaded: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.state == PackageState::Loaded)
            .map(|entry| entry.id.clone())
            .chain(
                self.preloaded
                    .iter()
                    .filter(|id| !self.entries.contains_key(id.as_str()))
                    .cloned(),
            )
            .collect();
        loaded.sort();
        loaded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
