//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Dynapack - Load runtime packages and inspect their descriptors
#[derive(Parser, Debug)]
#[command(name = "dynapack")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Loader configuration file (defaults to ./dynapack.toml if present)
    #[arg(short, long, global = true, env = "DYNAPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Package root template; `{0}` is replaced with the package id
    #[arg(long, global = true)]
    pub root: Option<String>,

    /// Fetch `-debug` asset builds
    #[arg(long, global = true)]
    pub debug: bool,

    /// Fetch right-to-left stylesheets
    #[arg(long, global = true)]
    pub rtl: bool,

    /// Append a cache buster to asset URLs
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Load packages with defaults when their descriptor is missing
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Treat a package as already loaded (repeatable)
    #[arg(long = "preloaded", global = true, value_name = "ID")]
    pub preloaded: Vec<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Load packages and their dependencies
    ///
    /// Examples:
    ///   dynapack load ledger               # Load one package
    ///   dynapack load core-ui ledger       # Load in order
    ///   dynapack load a b --concurrent     # Load side by side
    Load {
        /// Package ids to load
        #[arg(required = true)]
        ids: Vec<String>,

        /// Request the packages concurrently instead of in order
        #[arg(long)]
        concurrent: bool,
    },

    /// Fetch a package descriptor and print it as JSON
    Inspect {
        /// Package id
        id: String,
    },

    /// Print the URLs a load of the package would fetch
    Urls {
        /// Package id
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_load_with_overrides() {
        let cli = Cli::try_parse_from([
            "dynapack",
            "load",
            "core-ui",
            "ledger",
            "--concurrent",
            "--root",
            "https://cdn.example.com/{0}/",
            "--preloaded",
            "base",
            "--preloaded",
            "theme",
            "--lenient",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Some(Commands::Load {
                ids: vec!["core-ui".to_string(), "ledger".to_string()],
                concurrent: true,
            })
        );
        assert_eq!(cli.root.as_deref(), Some("https://cdn.example.com/{0}/"));
        assert_eq!(cli.preloaded, vec!["base", "theme"]);
        assert!(cli.lenient);
    }

    #[test]
    fn test_about_comes_from_doc_comment() {
        use clap::CommandFactory;

        let about = Cli::command().get_about().map(ToString::to_string);
        assert_eq!(
            about.as_deref(),
            Some("Dynapack - Load runtime packages and inspect their descriptors")
        );
    }

    #[test]
    fn test_load_requires_ids() {
        assert!(Cli::try_parse_from(["dynapack", "load"]).is_err());
    }

    #[test]
    fn test_parse_urls_flags() {
        let cli = Cli::try_parse_from(["dynapack", "--debug", "--rtl", "urls", "ledger"]).unwrap();

        assert!(cli.debug);
        assert!(cli.rtl);
        assert_eq!(
            cli.command,
            Some(Commands::Urls {
                id: "ledger".to_string()
            })
        );
    }
}
