use crate::common::{load_config, load_store};
use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use hostbind_bridge::ConversionRegistry;
use hostbind_factory::Analyzer;
use hostbind_meta::{ApiClassInfo, CommandInfo, FlagInfo, MetadataStore, MethodInfo};

#[derive(Subcommand, Debug, Clone)]
pub enum InspectAction {
    /// Show the flag table of a cached command
    Command {
        name: String,
        #[arg(long)]
        host_version: String,
    },
    /// Show an API class (or an entity type's class) with wrappability verdicts
    Class {
        name: String,
        #[arg(long)]
        host_version: String,
    },
}

pub fn handle_inspect(action: InspectAction) -> Result<()> {
    let config = load_config()?;
    match action {
        InspectAction::Command { name, host_version } => {
            let store = load_store(&config, &host_version)?;
            let info = store.get_command_info(&name)?;
            let conversions = conversions_for(&store, &config.api_prefixes());
            let analyzer = Analyzer::new(&store, &conversions);
            print_command(&store, info, &analyzer);
        }
        InspectAction::Class { name, host_version } => {
            let store = load_store(&config, &host_version)?;
            let Some(class) = resolve_class(&store, &name) else {
                bail!("No API class named or bound to '{}' in the cache", name);
            };
            let conversions = conversions_for(&store, &config.api_prefixes());
            let analyzer = Analyzer::new(&store, &conversions);
            print_class(class, &analyzer);
        }
    }
    Ok(())
}

/// Offline there is no host to ask, so the cached API classes stand in for
/// the types it exposes
fn conversions_for(store: &MetadataStore, prefixes: &[String]) -> ConversionRegistry {
    ConversionRegistry::with_defaults(prefixes, &|name: &str| {
        store.api_classes.contains_key(name)
    })
}

/// Accept an API class name or an entity type bound to one
fn resolve_class<'s>(store: &'s MetadataStore, name: &str) -> Option<&'s ApiClassInfo> {
    store.get_api_class_info(name).ok().or_else(|| {
        let api_class = store.api_class_for(name)?;
        store.get_api_class_info(api_class).ok()
    })
}

fn print_command(store: &MetadataStore, info: &CommandInfo, analyzer: &Analyzer<'_>) {
    println!("{} {}", "Command:".bold().green(), info.name);
    if let Some(category) = &info.category {
        println!("  {}: {}", "category".cyan(), category);
    }
    if store.node_commands.iter().any(|c| *c == info.name) {
        println!("  {}: {}", "creates".cyan(), info.name);
    }
    if let Some(line) = info.description.lines().next() {
        println!("  {}", line);
    }
    for flag in info.flags.values() {
        println!("  {}", flag_line(flag, analyzer));
    }
}

fn flag_line(flag: &FlagInfo, analyzer: &Analyzer<'_>) -> String {
    let modes: Vec<String> = flag.modes.iter().map(ToString::to_string).collect();
    let mut line = format!(
        "-{} (-{})  {}  [{}]",
        flag.long_name,
        flag.short_name,
        flag.arg_type,
        modes.join(", ")
    );
    if flag.multi_use {
        line.push_str("  multi-use");
    }
    match analyzer.can_wrap_flag(flag) {
        Ok(()) => line,
        Err(reason) => format!("{}  {}", line.dimmed(), reason.to_string().yellow()),
    }
}

fn print_class(class: &ApiClassInfo, analyzer: &Analyzer<'_>) {
    println!("{} {}", "API class:".bold().green(), class.name);
    for (name, values) in &class.enums {
        let display: Vec<&str> = values.display.iter().map(AsRef::as_ref).collect();
        println!("  {} {}: {}", "enum".cyan(), name, display.join(", "));
    }
    for (method, overloads) in &class.methods {
        for (idx, info) in overloads.iter().enumerate() {
            println!("  {}", overload_line(&class.name, method, idx, info, analyzer));
        }
    }
}

fn overload_line(
    class: &str,
    method: &str,
    idx: usize,
    info: &MethodInfo,
    analyzer: &Analyzer<'_>,
) -> String {
    let args: Vec<String> = info
        .args
        .iter()
        .map(|arg| format!("{}: {}", arg.name, arg.ty))
        .collect();
    let mut line = format!("{}[{}]({})", method, idx, args.join(", "));
    if let Some(ret) = &info.return_type {
        line.push_str(&format!(" -> {}", ret));
    }
    if let Some(inverse) = &info.inverse {
        line.push_str(&format!("  undo via {}", inverse.method));
    }
    match analyzer.can_wrap_method(info, Some(class)) {
        Ok(()) => format!("{} {}", "ok".green(), line),
        Err(reason) => format!("{} {}  {}", "--".red(), line.dimmed(), reason),
    }
}
