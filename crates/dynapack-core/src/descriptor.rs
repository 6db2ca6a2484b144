//! Descriptor fetching.

use dynapack_meta::{Descriptor, LoaderConfig};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Fetch and parse the descriptor of `package`.
///
/// Performs exactly one transport read. Any failure, in transport or in
/// parsing, is reported as [`Error::DescriptorUnavailable`].
pub async fn fetch_descriptor(
    transport: &dyn Transport,
    config: &LoaderConfig,
    package: &str,
) -> Result<Descriptor> {
    let url = config.descriptor_url(package);
    tracing::debug!(package = %package, url = %url, "Fetching descriptor");

    let unavailable = |reason: String| Error::DescriptorUnavailable {
        package: package.to_string(),
        reason,
    };
    let body = transport
        .fetch(&url)
        .await
        .map_err(|e| unavailable(e.to_string()))?;
    Descriptor::from_json(package, &body).map_err(|e| unavailable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FileTransport;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup(body: Option<&str>) -> (TempDir, FileTransport, LoaderConfig) {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("pkgs/ledger")).unwrap();
        if let Some(body) = body {
            std::fs::write(temp.path().join("pkgs/ledger/descriptor.json"), body).unwrap();
        }
        let transport = FileTransport::new(temp.path());
        let config = LoaderConfig::new().with_package_root("pkgs/{0}/");
        (temp, transport, config)
    }

    #[tokio::test]
    async fn test_fetch_parses_descriptor() {
        let (_temp, transport, config) =
            setup(Some(r#"{"requires": "ledger-lib", "controllers": ["Acme.controller.Ledger"]}"#));

        let descriptor = fetch_descriptor(&transport, &config, "ledger").await.unwrap();

        assert_eq!(descriptor.name, "ledger");
        assert_eq!(descriptor.requires, vec!["ledger-lib"]);
        assert_eq!(descriptor.extensions, vec!["Acme.controller.Ledger"]);
    }

    #[tokio::test]
    async fn test_missing_descriptor_is_unavailable() {
        let (_temp, transport, config) = setup(None);

        let err = fetch_descriptor(&transport, &config, "ledger").await.unwrap_err();

        assert!(matches!(err, Error::DescriptorUnavailable { ref package, .. } if package == "ledger"));
    }

    #[tokio::test]
    async fn test_malformed_descriptor_is_unavailable() {
        let (_temp, transport, config) = setup(Some("{ not json"));

        let err = fetch_descriptor(&transport, &config, "ledger").await.unwrap_err();

        assert!(matches!(err, Error::DescriptorUnavailable { .. }));
    }
}
