//! Scenario tests
//!
//! Multi-package scenarios driven through an in-memory transport, so fetch
//! order and fetch counts can be asserted exactly.

use std::sync::Arc;
use std::time::Duration;

use dynapack_core::{
    BundleCatalog, ExtensionTypes, FailureKind, HostApplication, LoadFailure, PackageLoader,
    Payload,
};
use dynapack_meta::LoaderConfig;
use dynapack_test_utils::{InitLog, MockTransport, RecordingExtension};
use futures::future::join_all;
use pretty_assertions::assert_eq;

fn config() -> LoaderConfig {
    LoaderConfig::new().with_package_root("https://cdn.example.com/packages/{0}/")
}

fn url(path: &str) -> String {
    format!("https://cdn.example.com/packages/{path}")
}

struct Scenario {
    loader: PackageLoader,
    transport: Arc<MockTransport>,
    host: Arc<HostApplication>,
    log: InitLog,
}

fn ledger_scenario(transport: MockTransport) -> Scenario {
    let log = InitLog::new();
    let lib_log = log.clone();
    let ledger_log = log.clone();
    let catalog = BundleCatalog::new()
        .with_bundle("ledger-lib", move |types: &ExtensionTypes| {
            RecordingExtension::register_all(types, &["Acme.controller.LedgerLib"], &lib_log);
        })
        .with_bundle("ledger", move |types: &ExtensionTypes| {
            RecordingExtension::register_all(types, &["Acme.controller.Ledger"], &ledger_log);
        });

    let transport = Arc::new(
        transport
            .with_package(
                &config(),
                "ledger",
                r#"{"requires": ["ledger-lib"], "extensions": ["Acme.controller.Ledger"]}"#,
            )
            .with_package(
                &config(),
                "ledger-lib",
                r#"{"extensions": ["Acme.controller.LedgerLib"]}"#,
            ),
    );
    let host = Arc::new(HostApplication::new("acme"));
    host.launch();
    let loader = PackageLoader::builder(config())
        .transport(transport.clone())
        .asset_host(Arc::new(catalog))
        .host(host.clone())
        .build();

    Scenario {
        loader,
        transport,
        host,
        log,
    }
}

/// Requesting `ledger` fetches its descriptor, loads `ledger-lib` to
/// completion, then fetches `ledger`'s assets and registers its extension.
#[tokio::test]
async fn test_ledger_scenario() {
    let s = ledger_scenario(MockTransport::new());

    let descriptors = s.loader.request(["ledger"]).await.unwrap();

    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].name, "ledger");

    let fetches = s.transport.fetch_log();
    assert_eq!(fetches.len(), 6);
    assert_eq!(fetches[0], url("ledger/descriptor.json"));
    assert_eq!(fetches[1], url("ledger-lib/descriptor.json"));
    let mut lib_assets = fetches[2..4].to_vec();
    lib_assets.sort();
    assert_eq!(
        lib_assets,
        vec![
            url("ledger-lib/ledger-lib.js"),
            url("ledger-lib/resources/ledger-lib-all.css"),
        ]
    );
    let mut ledger_assets = fetches[4..6].to_vec();
    ledger_assets.sort();
    assert_eq!(
        ledger_assets,
        vec![
            url("ledger/ledger.js"),
            url("ledger/resources/ledger-all.css"),
        ]
    );

    assert_eq!(s.host.keys(), vec!["LedgerLib", "Ledger"]);
    assert_eq!(
        s.log.entries(),
        vec!["Acme.controller.LedgerLib", "Acme.controller.Ledger"]
    );
}

/// Several UI callers ask for overlapping packages while the first load is
/// still in flight; everything is fetched once and every caller hears back.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_callers_share_loads() {
    let s = ledger_scenario(MockTransport::new().with_default_delay(Duration::from_millis(15)));

    let mut receivers = Vec::new();
    for ids in [vec!["ledger"], vec!["ledger-lib"], vec!["ledger-lib", "ledger"]] {
        let (tx, rx) = tokio::sync::oneshot::channel();
        s.loader.require_package(ids, move |ok, payload| {
            let _ = tx.send((ok, payload));
        });
        receivers.push(rx);
    }
    let results = join_all(receivers).await;

    for result in results {
        let (ok, payload) = result.unwrap();
        assert!(ok, "caller failed: {payload:?}");
    }
    assert_eq!(s.transport.fetch_count(&url("ledger/descriptor.json")), 1);
    assert_eq!(s.transport.fetch_count(&url("ledger-lib/ledger-lib.js")), 1);
    assert_eq!(s.log.count("Acme.controller.Ledger"), 1);
    assert_eq!(s.log.count("Acme.controller.LedgerLib"), 1);
}

/// A broken dependency is reported by its own id to every caller, and the
/// failure is remembered.
#[tokio::test]
async fn test_broken_dependency_reported_to_all_callers() {
    let s = ledger_scenario(
        MockTransport::new().with_failure(url("ledger-lib/ledger-lib.js")),
    );

    let outcomes = join_all([
        s.loader.request_one("ledger"),
        s.loader.request_one("ledger"),
    ])
    .await;

    let expected = LoadFailure::new("ledger-lib", FailureKind::AssetLoadFailure);
    for outcome in outcomes {
        assert_eq!(outcome.unwrap_err(), expected);
    }

    let (tx, rx) = tokio::sync::oneshot::channel();
    s.loader.require_package(["ledger"], move |ok, payload| {
        let _ = tx.send((ok, payload));
    });
    assert_eq!(rx.await.unwrap(), (false, Payload::Failed("ledger-lib".to_string())));
    assert_eq!(s.transport.fetch_count(&url("ledger/descriptor.json")), 1);
    assert!(s.host.is_empty());
}
