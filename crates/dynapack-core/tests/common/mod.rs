#![allow(dead_code)]

use std::sync::Arc;

use dynapack_core::{BundleCatalog, HostApplication, LoaderConfig, PackageLoader};
use dynapack_test_utils::MockTransport;

pub fn config() -> LoaderConfig {
    LoaderConfig::new().with_package_root("pkgs/{0}/")
}

pub fn descriptor_url(id: &str) -> String {
    format!("pkgs/{id}/descriptor.json")
}

pub fn script_url(id: &str) -> String {
    format!("pkgs/{id}/{id}.js")
}

pub fn stylesheet_url(id: &str) -> String {
    format!("pkgs/{id}/resources/{id}-all.css")
}

pub struct Harness {
    pub loader: PackageLoader,
    pub transport: Arc<MockTransport>,
    pub catalog: Arc<BundleCatalog>,
    pub host: Arc<HostApplication>,
}

pub fn harness(config: LoaderConfig, transport: MockTransport, catalog: BundleCatalog) -> Harness {
    let transport = Arc::new(transport);
    let catalog = Arc::new(catalog);
    let host = Arc::new(HostApplication::new("test-app"));
    let loader = PackageLoader::builder(config)
        .transport(transport.clone())
        .asset_host(catalog.clone())
        .host(host.clone())
        .build();
    Harness {
        loader,
        transport,
        catalog,
        host,
    }
}
