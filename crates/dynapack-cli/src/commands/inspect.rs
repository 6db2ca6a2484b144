//! Inspect command

use dynapack_core::PackageLoader;

use crate::error::Result;

/// Run the inspect command: print the descriptor of `id` as JSON.
pub async fn run_inspect(loader: &PackageLoader, id: &str) -> Result<String> {
    let descriptor = loader.descriptor(id).await?;
    let json = serde_json::to_string_pretty(descriptor.as_ref())?;
    println!("{json}");
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynapack_test_utils::TestPackages;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_inspect_prints_descriptor_with_extra_fields() {
        let packages = TestPackages::new();
        packages.add_package(
            "ledger",
            r#"{"controllers": ["Acme.controller.Ledger"], "primaryViewClass": "Acme.view.Ledger"}"#,
        );
        let loader = PackageLoader::builder(packages.config())
            .transport(Arc::new(packages.transport()))
            .build();

        let json = run_inspect(&loader, "ledger").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "ledger");
        assert_eq!(value["extensions"][0], "Acme.controller.Ledger");
        assert_eq!(value["primaryViewClass"], "Acme.view.Ledger");
        assert!(!loader.is_loaded("ledger"));
    }

    #[tokio::test]
    async fn test_inspect_missing_descriptor_fails() {
        let packages = TestPackages::new();
        let loader = PackageLoader::builder(packages.config())
            .transport(Arc::new(packages.transport()))
            .build();

        assert!(run_inspect(&loader, "ghost").await.is_err());
    }
}
