//! Extensions that record when they are initialized.

use std::sync::{Arc, Mutex};

use dynapack_core::{Extension, ExtensionContext, ExtensionTypes, HostApplication};

/// Shared, ordered log of initialized extension type names.
#[derive(Debug, Clone, Default)]
pub struct InitLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl InitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, type_name: &str) {
        self.entries.lock().unwrap().push(type_name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, type_name: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| *entry == type_name)
            .count()
    }
}

/// Extension that writes its type name to an [`InitLog`] on `init`.
#[derive(Debug)]
pub struct RecordingExtension {
    pub context: ExtensionContext,
    log: InitLog,
}

impl RecordingExtension {
    pub fn new(context: &ExtensionContext, log: &InitLog) -> Self {
        Self {
            context: context.clone(),
            log: log.clone(),
        }
    }

    /// Register a recording factory for each of `type_names`.
    pub fn register_all(types: &ExtensionTypes, type_names: &[&str], log: &InitLog) {
        for type_name in type_names {
            let log = log.clone();
            types.register(*type_name, move |context| {
                Arc::new(RecordingExtension::new(context, &log)) as Arc<dyn Extension>
            });
        }
    }
}

impl Extension for RecordingExtension {
    fn init(&self, _host: &HostApplication) {
        self.log.record(&self.context.type_name);
    }
}
