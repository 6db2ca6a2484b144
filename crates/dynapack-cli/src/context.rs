//! Loader setup from command-line options
//!
//! The configuration is read from `--config`, or from `dynapack.toml` in the
//! working directory when present, then overridden by the global flags.

use std::path::Path;

use dynapack_meta::LoaderConfig;
use dynapack_meta::config::CONFIG_FILENAME;

use crate::cli::Cli;
use crate::error::Result;

/// Resolve the effective loader configuration.
pub fn resolve_config(cli: &Cli, cwd: &Path) -> Result<LoaderConfig> {
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::load(path)?,
        None => {
            let default_path = cwd.join(CONFIG_FILENAME);
            if default_path.is_file() {
                LoaderConfig::load(&default_path)?
            } else {
                LoaderConfig::default()
            }
        }
    };

    if let Some(root) = &cli.root {
        config = config.with_package_root(root.as_str());
    }
    if cli.debug {
        config = config.with_debug(true);
    }
    if cli.rtl {
        config = config.with_rtl(true);
    }
    if cli.no_cache {
        config = config.with_caching_disabled(true);
    }
    if cli.lenient {
        config = config.with_strict(false);
    }
    for id in &cli.preloaded {
        config = config.with_preloaded(id.as_str());
    }

    tracing::debug!(root = %config.package_root, strict = config.strict, "Loader configuration resolved");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["dynapack"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["urls", "x"]);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_config_file() {
        let temp = TempDir::new().unwrap();

        let config = resolve_config(&parse(&[]), temp.path()).unwrap();

        assert_eq!(config, LoaderConfig::default());
    }

    #[test]
    fn test_reads_config_from_working_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILENAME),
            "package_root = \"pkgs/{0}/\"\nstrict = false\n",
        )
        .unwrap();

        let config = resolve_config(&parse(&[]), temp.path()).unwrap();

        assert_eq!(config.package_root, "pkgs/{0}/");
        assert!(!config.strict);
    }

    #[test]
    fn test_flags_override_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "package_root = \"pkgs/{0}/\"\npreloaded = [\"base\"]\n").unwrap();
        let path = path.to_string_lossy().into_owned();

        let cli = parse(&[
            "--config",
            &path,
            "--root",
            "other/{0}/",
            "--no-cache",
            "--preloaded",
            "theme",
        ]);
        let config = resolve_config(&cli, temp.path()).unwrap();

        assert_eq!(config.package_root, "other/{0}/");
        assert!(config.disable_caching);
        assert_eq!(config.preloaded, vec!["base", "theme"]);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        let path = path.to_string_lossy().into_owned();

        assert!(resolve_config(&parse(&["--config", &path]), temp.path()).is_err());
    }
}
