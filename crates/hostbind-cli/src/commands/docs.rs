use crate::common::load_config;
use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use hostbind_config::DocsLayout;
use hostbind_docs::{read_command_doc, read_hierarchy, CommandDoc};
use hostbind_meta::EntityHierarchy;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Subcommand, Debug, Clone)]
pub enum DocsAction {
    /// Parse the documentation page of one command
    Command {
        name: String,
        /// Documentation root (defaults to the configured docs-root)
        #[arg(long)]
        docs_root: Option<PathBuf>,
    },
    /// Print the entity-type tree from the hierarchy page
    Hierarchy {
        #[arg(long)]
        docs_root: Option<PathBuf>,
    },
}

pub fn handle_docs(action: DocsAction) -> Result<()> {
    match action {
        DocsAction::Command { name, docs_root } => {
            let page = layout(docs_root)?.resolve_command_page(&name)?;
            hostbind_logger::debug(&format!("Parsing {}", page.display()));
            let doc = read_command_doc(&page)?;
            print_command_doc(&name, &doc);
        }
        DocsAction::Hierarchy { docs_root } => {
            let page = layout(docs_root)?.resolve_hierarchy_page()?;
            let hierarchy = read_hierarchy(&page)?;
            for line in tree_lines(&hierarchy) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn layout(docs_root: Option<PathBuf>) -> Result<DocsLayout> {
    match docs_root {
        Some(root) => Ok(DocsLayout::new(root)),
        None => Ok(DocsLayout::from_config(&load_config()?)?),
    }
}

fn print_command_doc(name: &str, doc: &CommandDoc) {
    println!("{} {}", "Command:".bold().green(), name);
    if let Some(category) = &doc.category {
        println!("  {}: {}", "category".cyan(), category);
    }
    if !doc.description.is_empty() {
        println!("  {}", doc.description);
    }
    for flag in doc.flags.values() {
        let modes: Vec<String> = flag.modes.iter().map(ToString::to_string).collect();
        println!(
            "  -{} (-{})  {}  [{}]",
            flag.long_name.cyan(),
            flag.short_name,
            flag.doc_type.as_deref().unwrap_or("-"),
            modes.join(", ")
        );
    }
}

/// Depth-first rendering, two spaces per level, siblings sorted
fn tree_lines(hierarchy: &EntityHierarchy) -> Vec<String> {
    let mut roots: Vec<Arc<str>> = hierarchy
        .iter()
        .filter(|(_, parent)| parent.is_none())
        .map(|(name, _)| name.clone())
        .collect();
    roots.sort();

    let mut lines = Vec::with_capacity(hierarchy.len());
    let mut stack: Vec<(Arc<str>, usize)> = roots.into_iter().rev().map(|r| (r, 0)).collect();
    while let Some((name, depth)) = stack.pop() {
        if lines.len() > hierarchy.len() {
            break;
        }
        lines.push(format!("{}{}", "  ".repeat(depth), name));
        let mut children = hierarchy.children_of(&name);
        children.sort();
        stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_is_depth_first_and_sorted() {
        let mut hierarchy = EntityHierarchy::new();
        hierarchy.insert("dependNode", None);
        hierarchy.insert("dagNode", Some("dependNode"));
        hierarchy.insert("transform", Some("dagNode"));
        hierarchy.insert("shape", Some("dagNode"));
        hierarchy.insert("time", Some("dependNode"));
        assert_eq!(
            tree_lines(&hierarchy),
            vec![
                "dependNode",
                "  dagNode",
                "    shape",
                "    transform",
                "  time",
            ]
        );
    }
}
