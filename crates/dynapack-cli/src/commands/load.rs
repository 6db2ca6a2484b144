//! Load command

use std::sync::Arc;

use colored::Colorize;
use dynapack_core::{Descriptor, PackageLoader};

use crate::error::Result;

/// Run the load command, returning the loaded descriptors.
pub async fn run_load(
    loader: &PackageLoader,
    ids: &[String],
    concurrent: bool,
) -> Result<Vec<Arc<Descriptor>>> {
    let result = if concurrent {
        loader.request_concurrent(ids.iter().cloned()).await
    } else {
        loader.request(ids.iter().cloned()).await
    };

    let descriptors = match result {
        Ok(descriptors) => descriptors,
        Err(failure) => {
            eprintln!(
                "{} {} ({})",
                "failed:".red().bold(),
                failure.package.yellow(),
                failure.kind
            );
            return Err(failure.into());
        }
    };

    for (id, descriptor) in ids.iter().zip(&descriptors) {
        println!("{} {}", "loaded".green().bold(), id);
        if !descriptor.requires.is_empty() {
            println!("  {} {}", "requires:".dimmed(), descriptor.requires.join(", "));
        }
        if !descriptor.extensions.is_empty() {
            println!(
                "  {} {}",
                "extensions:".dimmed(),
                descriptor.extensions.join(", ")
            );
        }
    }

    let loaded = loader.loaded_packages();
    println!();
    println!(
        "{} {} package(s) loaded: {}",
        "Total:".dimmed(),
        loaded.len(),
        loaded.join(", ").cyan()
    );
    Ok(descriptors)
}
