//! [`TestPackages`] builder for on-disk package trees.

use std::fs;
use std::path::Path;

use dynapack_core::{AssetPlan, Descriptor, FileTransport, LoaderConfig};
use tempfile::TempDir;

/// Package root template used by [`TestPackages::config`].
pub const TEST_PACKAGE_ROOT: &str = "packages/{0}/build/";

/// A temporary directory laid out as a package root.
///
/// # Example
///
/// ```rust,no_run
/// use dynapack_test_utils::TestPackages;
///
/// let packages = TestPackages::new();
/// packages.add_package("ledger", r#"{"requires": ["ledger-lib"]}"#);
/// packages.assert_file_exists("packages/ledger/build/ledger.js");
/// ```
pub struct TestPackages {
    temp_dir: TempDir,
}

impl Default for TestPackages {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPackages {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Configuration pointing at this tree, relative to [`root`](Self::root).
    pub fn config(&self) -> LoaderConfig {
        LoaderConfig::new().with_package_root(TEST_PACKAGE_ROOT)
    }

    pub fn transport(&self) -> FileTransport {
        FileTransport::new(self.root())
    }

    /// Write a package: its descriptor and every asset it plans.
    pub fn add_package(&self, id: &str, descriptor_json: &str) {
        let config = self.config();
        self.write(&config.descriptor_url(id), descriptor_json);

        let descriptor = Descriptor::from_json(id, descriptor_json.as_bytes())
            .unwrap_or_else(|e| panic!("invalid test descriptor for {id}: {e}"));
        let plan = AssetPlan::new(&config, id, &descriptor);
        for url in plan.urls() {
            self.write(url, &format!("/* {id} */"));
        }
    }

    /// Write `content` to `path`, relative to the root.
    pub fn write(&self, path: &str, content: &str) {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full_path, content).unwrap();
    }

    /// Remove `path`, relative to the root.
    pub fn remove(&self, path: &str) {
        fs::remove_file(self.root().join(path)).unwrap();
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }
}
