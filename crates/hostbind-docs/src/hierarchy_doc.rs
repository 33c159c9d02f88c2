//! Entity-type hierarchy page
//!
//! The page is an indented tree, one type per line, children indented deeper
//! than their parent (indentation in spaces or `&nbsp;`).

use crate::command_doc::strip_markup;
use crate::errors::DocsError;
use hostbind_meta::EntityHierarchy;
use std::path::Path;
use tracing::debug;

fn indent_of(line: &str) -> usize {
    let mut rest = line;
    let mut indent = 0;
    loop {
        if let Some(stripped) = rest.strip_prefix("&nbsp;") {
            indent += 1;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix(' ') {
            indent += 1;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('\t') {
            indent += 4;
            rest = stripped;
        } else if rest.starts_with('<') && !rest.starts_with("<a") {
            // Formatting tags before the entry do not count as indentation
            match rest.find('>') {
                Some(end) => rest = &rest[end + 1..],
                None => break,
            }
        } else {
            break;
        }
    }
    indent
}

fn is_type_name(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn parse_hierarchy(text: &str) -> EntityHierarchy {
    let mut hierarchy = EntityHierarchy::new();
    let mut stack: Vec<(usize, String)> = Vec::new();

    for line in text.lines() {
        // In markup form, entries are links; headings and prose are not
        if line.contains('<') && !line.contains("<a ") {
            continue;
        }
        let name = strip_markup(line);
        if !is_type_name(&name) {
            continue;
        }
        let indent = indent_of(line);
        while stack.last().is_some_and(|(level, _)| *level >= indent) {
            stack.pop();
        }
        let parent = stack.last().map(|(_, parent)| parent.as_str());
        hierarchy.insert(&name, parent);
        stack.push((indent, name));
    }

    debug!("Parsed {} entity types from hierarchy page", hierarchy.len());
    hierarchy
}

pub fn read_hierarchy(path: &Path) -> Result<EntityHierarchy, DocsError> {
    if !path.is_file() {
        return Err(DocsError::MissingPage(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    Ok(parse_hierarchy(&text))
}
