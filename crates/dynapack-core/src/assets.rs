//! Asset loading.
//!
//! Once a package's dependencies are satisfied, its stylesheet and script are
//! fetched concurrently. The URLs follow the build layout:
//!
//! ```text
//! {package path}resources/{name}-all[-rtl][-debug].css
//! {package path}{name}[-debug].js
//! ```

use std::borrow::Cow;

use dynapack_meta::{Descriptor, LoaderConfig};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Query parameter appended to asset URLs when caching is disabled.
pub const CACHE_BUSTER_PARAM: &str = "_dc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Stylesheet,
    Script,
}

/// A fetched asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub kind: AssetKind,
    pub url: String,
    pub body: Vec<u8>,
}

impl Asset {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// URLs a package load will fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPlan {
    pub stylesheet: Option<String>,
    pub script: Option<String>,
}

impl AssetPlan {
    /// Plan the assets of `package` as described by `descriptor`.
    ///
    /// The path comes from the package id; filenames come from the
    /// descriptor's `name`.
    pub fn new(config: &LoaderConfig, package: &str, descriptor: &Descriptor) -> Self {
        let stamp = config
            .disable_caching
            .then(|| chrono::Utc::now().timestamp_millis());
        let finish = |url: String| match stamp {
            Some(stamp) => cache_bust(&url, stamp),
            None => url,
        };

        Self {
            stylesheet: descriptor
                .wants_stylesheet()
                .then(|| finish(stylesheet_url(config, package, &descriptor.name))),
            script: descriptor
                .wants_script()
                .then(|| finish(script_url(config, package, &descriptor.name))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stylesheet.is_none() && self.script.is_none()
    }

    pub fn len(&self) -> usize {
        self.urls().count()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.stylesheet
            .as_deref()
            .into_iter()
            .chain(self.script.as_deref())
    }
}

pub fn stylesheet_url(config: &LoaderConfig, package: &str, name: &str) -> String {
    format!(
        "{}resources/{}{}{}",
        config.package_path(package),
        name,
        if config.enable_rtl { "-all-rtl" } else { "-all" },
        if config.enable_debug { "-debug.css" } else { ".css" }
    )
}

pub fn script_url(config: &LoaderConfig, package: &str, name: &str) -> String {
    format!(
        "{}{}{}",
        config.package_path(package),
        name,
        if config.enable_debug { "-debug.js" } else { ".js" }
    )
}

fn cache_bust(url: &str, stamp: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{CACHE_BUSTER_PARAM}={stamp}")
}

/// Assets fetched for one package.
#[derive(Debug, Clone, Default)]
pub struct FetchedAssets {
    pub stylesheet: Option<Asset>,
    pub script: Option<Asset>,
}

/// Fetch the planned assets of `package` concurrently.
///
/// Every planned asset must succeed. A plan with nothing to fetch is a
/// configuration failure, not a no-op.
pub async fn load_assets(
    transport: &dyn Transport,
    config: &LoaderConfig,
    package: &str,
    descriptor: &Descriptor,
) -> Result<FetchedAssets> {
    let plan = AssetPlan::new(config, package, descriptor);
    if plan.is_empty() {
        tracing::warn!(package = %package, "Package is not configured to load anything");
        return Err(Error::AssetLoadFailure {
            package: package.to_string(),
            reason: "package is not configured to load anything".to_string(),
        });
    }

    tracing::debug!(package = %package, assets = plan.len(), "Fetching package assets");
    let (stylesheet, script) = tokio::join!(
        fetch_planned(transport, AssetKind::Stylesheet, plan.stylesheet.as_deref()),
        fetch_planned(transport, AssetKind::Script, plan.script.as_deref()),
    );

    let into_failure = |err: Error| {
        tracing::error!(package = %package, error = %err, "Package asset load failed");
        Error::AssetLoadFailure {
            package: package.to_string(),
            reason: err.to_string(),
        }
    };
    Ok(FetchedAssets {
        stylesheet: stylesheet.map_err(into_failure)?,
        script: script.map_err(into_failure)?,
    })
}

async fn fetch_planned(
    transport: &dyn Transport,
    kind: AssetKind,
    url: Option<&str>,
) -> Result<Option<Asset>> {
    let Some(url) = url else {
        return Ok(None);
    };
    let body = transport.fetch(url).await?;
    Ok(Some(Asset {
        kind,
        url: url.to_string(),
        body,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn descriptor(name: &str, skip_resources: bool, skip_js: bool) -> Descriptor {
        Descriptor {
            skip_resources,
            skip_js,
            ..Descriptor::fallback(name)
        }
    }

    #[rstest]
    #[case(false, false, "pkgs/gl/resources/gl-all.css", "pkgs/gl/gl.js")]
    #[case(true, false, "pkgs/gl/resources/gl-all-debug.css", "pkgs/gl/gl-debug.js")]
    #[case(false, true, "pkgs/gl/resources/gl-all-rtl.css", "pkgs/gl/gl.js")]
    #[case(true, true, "pkgs/gl/resources/gl-all-rtl-debug.css", "pkgs/gl/gl-debug.js")]
    fn test_asset_urls(
        #[case] debug: bool,
        #[case] rtl: bool,
        #[case] css: &str,
        #[case] js: &str,
    ) {
        let config = LoaderConfig::new()
            .with_package_root("pkgs/{0}/")
            .with_debug(debug)
            .with_rtl(rtl);
        let plan = AssetPlan::new(&config, "gl", &descriptor("gl", false, false));

        assert_eq!(plan.stylesheet.as_deref(), Some(css));
        assert_eq!(plan.script.as_deref(), Some(js));
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_filename_uses_descriptor_name() {
        let config = LoaderConfig::new().with_package_root("pkgs/{0}/");
        let plan = AssetPlan::new(&config, "gl-fr", &descriptor("general-ledger-fr", true, false));

        assert_eq!(plan.stylesheet, None);
        assert_eq!(plan.script.as_deref(), Some("pkgs/gl-fr/general-ledger-fr.js"));
    }

    #[rstest]
    #[case(true, false, 1)]
    #[case(false, true, 1)]
    #[case(true, true, 0)]
    fn test_skip_flags(#[case] skip_resources: bool, #[case] skip_js: bool, #[case] count: usize) {
        let config = LoaderConfig::new();
        let plan = AssetPlan::new(&config, "p", &descriptor("p", skip_resources, skip_js));
        assert_eq!(plan.len(), count);
        assert_eq!(plan.is_empty(), count == 0);
    }

    #[test]
    fn test_cache_busting() {
        let config = LoaderConfig::new()
            .with_package_root("pkgs/{0}/")
            .with_caching_disabled(true);
        let plan = AssetPlan::new(&config, "gl", &descriptor("gl", false, false));

        for url in plan.urls() {
            assert!(url.contains("?_dc="), "missing cache buster in {url}");
        }
    }

    #[test]
    fn test_cache_bust_appends_to_existing_query() {
        assert_eq!(cache_bust("a.js?v=2", 7), "a.js?v=2&_dc=7");
        assert_eq!(cache_bust("a.js", 7), "a.js?_dc=7");
    }
}
