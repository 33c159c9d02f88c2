use crate::common::{load_config, load_store};
use crate::GlobalOpts;
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::fs;
use std::path::Path;

#[derive(Subcommand, Debug, Clone)]
pub enum CacheAction {
    /// Print the cache folder
    Path,
    /// Summarize one cached host version, or list the cached versions
    Show {
        #[arg(long)]
        host_version: Option<String>,
    },
    /// Delete every cached metadata blob
    Clean,
}

pub fn handle_cache(action: CacheAction, opts: &GlobalOpts) -> Result<()> {
    let config = load_config()?;
    match action {
        CacheAction::Path => {
            println!("{}", config.get_cache_path()?.display());
        }
        CacheAction::Show { host_version } => match host_version {
            Some(version) => show_version(&config, &version)?,
            None => list_versions(&config.get_cache_path()?, opts)?,
        },
        CacheAction::Clean => clean_cache(&config.get_cache_path()?)?,
    }
    Ok(())
}

fn show_version(config: &hostbind_config::Config, version: &str) -> Result<()> {
    let store = load_store(config, version)?;
    println!("{} {}", "Host version:".bold().green(), store.version);
    println!("  {}: {}", "generated".cyan(), store.generated_at);
    println!("  {}: {}", "commands".cyan(), store.commands.len());
    println!("  {}: {}", "node commands".cyan(), store.node_commands.len());
    println!("  {}: {}", "API classes".cyan(), store.api_classes.len());
    println!("  {}: {}", "entity types".cyan(), store.hierarchy.len());
    if !store.categories.is_empty() {
        println!("  {}: {}", "categories".cyan(), store.categories.len());
    }
    Ok(())
}

/// Versions are read back from the `metadata-<version>.json` file names
fn list_versions(cache_dir: &Path, opts: &GlobalOpts) -> Result<()> {
    let versions = cached_versions(cache_dir)?;
    println!("{}", "Cached host versions:".bold().green());
    if versions.is_empty() && opts.verbosity_level() > 0 {
        println!("  {}", "(none)".yellow());
    }
    for version in versions {
        println!("  {}", version);
    }
    Ok(())
}

fn cached_versions(cache_dir: &Path) -> Result<Vec<String>> {
    if !cache_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut versions: Vec<String> = fs::read_dir(cache_dir)
        .with_context(|| format!("Failed to read {}", cache_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.strip_prefix("metadata-")?
                .strip_suffix(".json")
                .map(ToString::to_string)
        })
        .collect();
    versions.sort();
    Ok(versions)
}

/// Only metadata blobs are removed; the folder itself may be shared
fn clean_cache(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        hostbind_logger::debug("Cache folder already clean");
        return Ok(());
    }
    let mut removed = 0;
    for version in cached_versions(cache_dir)? {
        let path = cache_dir.join(format!("metadata-{}.json", version));
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        removed += 1;
    }
    hostbind_logger::success(&format!("Removed {} cached metadata files", removed));
    Ok(())
}
