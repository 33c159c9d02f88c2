use crate::common::load_config;
use crate::GlobalOpts;
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use hostbind_config::Config;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    Show,
    Set {
        key: String,
        value: String,
    },
    /// Print the path of the configuration file
    Path,
}

pub fn handle_config(action: Option<ConfigAction>, opts: &GlobalOpts) -> Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let config = load_config()?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
            } else {
                for (key, value) in config.values_iter() {
                    println!("  {}: {}", key.cyan(), value);
                }
                for (entity_type, command) in &config.node_commands {
                    println!("  {}.{}: {}", "node-commands".cyan(), entity_type, command);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let path = Config::path()?;
            let mut config = load_config()?;
            config.set(&key, value.clone())?;
            config
                .save_to(&path)
                .with_context(|| format!("Failed to save {}", path.display()))?;
            hostbind_logger::success(&format!("Set {} = {}", key, value));
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}
