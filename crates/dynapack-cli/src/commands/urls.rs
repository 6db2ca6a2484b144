//! Urls command

use colored::Colorize;
use dynapack_core::PackageLoader;

use crate::error::Result;

/// Run the urls command: print the descriptor URL and the asset URLs a load
/// of `id` would fetch.
pub async fn run_urls(loader: &PackageLoader, id: &str) -> Result<Vec<String>> {
    let descriptor_url = loader.config().descriptor_url(id);
    let plan = loader.asset_plan(id).await?;

    let mut urls = vec![descriptor_url];
    urls.extend(plan.urls().map(str::to_string));

    println!("{:<12} {}", "descriptor".cyan(), urls[0]);
    if let Some(stylesheet) = &plan.stylesheet {
        println!("{:<12} {}", "stylesheet".cyan(), stylesheet);
    }
    if let Some(script) = &plan.script {
        println!("{:<12} {}", "script".cyan(), script);
    }
    if plan.is_empty() {
        eprintln!(
            "{} package '{}' is not configured to load anything",
            "warning:".yellow().bold(),
            id
        );
    }
    Ok(urls)
}
