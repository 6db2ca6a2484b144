//! End-to-end integration test for the vertical slice
//!
//! This test exercises the complete flow: config loading -> package fetch
//! from disk -> bundle activation -> extension registration -> host launch.

use std::sync::Arc;

use dynapack_core::{
    BundleCatalog, ExtensionTypes, FileTransport, HostApplication, PackageLoader, PackageState,
};
use dynapack_meta::LoaderConfig;
use dynapack_test_utils::{InitLog, RecordingExtension, TestPackages};
use pretty_assertions::assert_eq;

/// Set up a package tree with a valid dynapack.toml
fn setup_packages() -> TestPackages {
    let packages = TestPackages::new();
    packages.write(
        "dynapack.toml",
        r#"
package_root = "packages/{0}/build/"
descriptor_file = "descriptor.json"
preloaded = ["core-ui"]
"#,
    );
    packages.add_package(
        "ledger",
        r#"{
            "requires": ["core-ui", "ledger-lib"],
            "extensions": ["Acme.controller.Ledger"],
            "primaryViewClass": "Acme.view.Ledger"
        }"#,
    );
    packages.add_package(
        "ledger-lib",
        r#"{"skipResources": true, "controllers": "Acme.controller.Journal"}"#,
    );
    packages
}

fn catalog(log: &InitLog) -> BundleCatalog {
    let lib_log = log.clone();
    let ledger_log = log.clone();
    BundleCatalog::new()
        .with_bundle("ledger-lib", move |types: &ExtensionTypes| {
            RecordingExtension::register_all(types, &["Acme.controller.Journal"], &lib_log);
        })
        .with_bundle("ledger", move |types: &ExtensionTypes| {
            RecordingExtension::register_all(types, &["Acme.controller.Ledger"], &ledger_log);
        })
}

#[tokio::test]
async fn test_full_vertical_slice() {
    let packages = setup_packages();
    let config = LoaderConfig::load(&packages.root().join("dynapack.toml")).unwrap();
    let log = InitLog::new();
    let catalog = Arc::new(catalog(&log));
    let host = Arc::new(HostApplication::new("acme"));

    let loader = PackageLoader::builder(config)
        .transport(Arc::new(FileTransport::new(packages.root())))
        .asset_host(catalog.clone())
        .host(host.clone())
        .build();

    // Step 1: load the package and its dependencies
    let descriptors = loader.request(["ledger"]).await.unwrap();
    let ledger = &descriptors[0];
    assert_eq!(ledger.extra_str("primaryViewClass"), Some("Acme.view.Ledger"));
    assert_eq!(
        loader.loaded_packages(),
        vec!["core-ui", "ledger", "ledger-lib"]
    );

    // Step 2: assets were applied in dependency order
    assert_eq!(
        catalog.scripts(),
        vec![
            "packages/ledger-lib/build/ledger-lib.js",
            "packages/ledger/build/ledger.js",
        ]
    );
    assert_eq!(
        catalog.stylesheets(),
        vec!["packages/ledger/build/resources/ledger-all.css"]
    );

    // Step 3: extensions registered, initialized only at launch
    assert_eq!(host.keys(), vec!["Journal", "Ledger"]);
    assert!(log.entries().is_empty());
    host.launch();
    assert_eq!(
        log.entries(),
        vec!["Acme.controller.Journal", "Acme.controller.Ledger"]
    );

    // Step 4: later requests are served from the registry
    packages.remove("packages/ledger/build/descriptor.json");
    let again = loader.request_one("ledger").await.unwrap();
    assert!(Arc::ptr_eq(&again, ledger));
}

#[tokio::test]
async fn test_missing_script_fails_only_that_package() {
    let packages = setup_packages();
    packages.remove("packages/ledger-lib/build/ledger-lib.js");
    packages.add_package("reports", "{}");
    let config = LoaderConfig::load(&packages.root().join("dynapack.toml")).unwrap();
    let loader = PackageLoader::builder(config)
        .transport(Arc::new(FileTransport::new(packages.root())))
        .asset_host(Arc::new(catalog(&InitLog::new())))
        .build();

    let failure = loader.request(["ledger"]).await.unwrap_err();
    assert_eq!(failure.package, "ledger-lib");

    loader.request(["reports"]).await.unwrap();
    assert!(matches!(loader.state("ledger"), PackageState::Failed(_)));
    assert_eq!(loader.state("reports"), PackageState::Loaded);
    assert!(loader.host().is_empty());
}
