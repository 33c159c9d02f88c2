//! Command documentation pages
//!
//! Each page lists the command's flags as anchored table rows:
//!
//! ```html
//! <a name="flagradius"></a><b>radius</b>(<b>r</b>) <i>linear</i>
//! <img src="../gfx/create.gif"><img src="../gfx/query.gif"><img src="../gfx/edit.gif">
//! <tr><td>The radius of the object</td></tr>
//! ```
//!
//! Parsing is regex based and tolerant: anything unrecognised is skipped.
//! The parsed page only ever *adds* to baseline metadata (docstrings, modes,
//! documented types); arity and primitive type stay as the host reported them.

use crate::errors::DocsError;
use hostbind_meta::{CommandInfo, Mode};
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

struct Patterns {
    flag_anchor: Regex,
    flag_names: Regex,
    flag_type: Regex,
    mode_gif: Regex,
    category: Regex,
    section: Regex,
    pre_block: Regex,
    tag: Regex,
    secondary: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            flag_anchor: Regex::new(r#"<a\s+name="flag(\w+)"\s*>"#)?,
            flag_names: Regex::new(r"<b>\s*(\w+)\s*</b>\s*\(\s*<b>\s*(\w*)\s*</b>\s*\)")?,
            flag_type: Regex::new(r"<i>\s*([^<]+?)\s*</i>")?,
            mode_gif: Regex::new(r"(create|query|edit|multiuse)\.gif")?,
            category: Regex::new(r"cat_(\w+)\.html")?,
            section: Regex::new(r#"<a\s+name="h(\w+)"\s*>"#)?,
            pre_block: Regex::new(r"(?s)<pre[^>]*>(.*?)</pre>")?,
            tag: Regex::new(r"(?s)<[^>]*>")?,
            secondary: Regex::new(
                r#"(?i)(?:only\s+be\s+used|used\s+only)\s+(?:with|in\s+conjunction\s+with)\s+(?:the\s+)?["']?-(\w+)["']?"#,
            )?,
        })
    }
}

static PATTERNS: Lazy<Option<Patterns>> = Lazy::new(|| match Patterns::compile() {
    Ok(patterns) => Some(patterns),
    Err(e) => {
        warn!("Documentation patterns failed to compile: {}", e);
        None
    }
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagDoc {
    pub long_name: String,
    pub short_name: String,
    pub doc_type: Option<String>,
    pub modes: SmallVec<[Mode; 3]>,
    pub multi_use: bool,
    pub docstring: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandDoc {
    pub description: String,
    pub example: String,
    pub category: Option<String>,
    pub flags: BTreeMap<String, FlagDoc>,
}

/// Remove tags, decode the common entities and collapse whitespace
pub fn strip_markup(html: &str) -> String {
    let text = match PATTERNS.as_ref() {
        Some(p) => p.tag.replace_all(html, " ").into_owned(),
        None => html.to_string(),
    };
    let text = decode_entities(&text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Slice of the page between a section anchor and the next one
fn section<'a>(p: &Patterns, html: &'a str, name: &str) -> Option<&'a str> {
    let mut anchors = p.section.captures_iter(html).filter_map(|c| {
        let whole = c.get(0)?;
        let label = c.get(1)?;
        Some((label.as_str(), whole.start(), whole.end()))
    });
    let (_, _, start) = anchors.by_ref().find(|(label, _, _)| *label == name)?;
    let end = anchors.next().map_or(html.len(), |(_, pos, _)| pos);
    html.get(start..end)
}

pub fn parse_command_doc(html: &str) -> CommandDoc {
    let Some(p) = PATTERNS.as_ref() else {
        return CommandDoc::default();
    };
    let mut doc = CommandDoc {
        category: p
            .category
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        ..Default::default()
    };

    if let Some(description) = section(p, html, "Description") {
        doc.description = strip_markup(description);
    }
    if let Some(examples) = section(p, html, "Examples") {
        doc.example = p
            .pre_block
            .captures_iter(examples)
            .filter_map(|c| c.get(1))
            .map(|m| decode_entities(p.tag.replace_all(m.as_str(), "").trim()))
            .collect::<Vec<_>>()
            .join("\n\n");
    }

    // (anchor start, anchor end, flag name)
    let anchors: Vec<(usize, usize, String)> = p
        .flag_anchor
        .captures_iter(html)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some((whole.start(), whole.end(), c.get(1)?.as_str().to_string()))
        })
        .collect();
    for (idx, (_, start, anchor)) in anchors.iter().enumerate() {
        let end = anchors
            .get(idx + 1)
            .map_or(html.len(), |(next, _, _)| *next);
        let Some(chunk) = html.get(*start..end) else {
            continue;
        };
        // A trailing section heading belongs to the next part of the page
        let chunk = p
            .section
            .find(chunk)
            .map_or(chunk, |m| chunk.get(..m.start()).unwrap_or(chunk));
        if let Some(flag) = parse_flag_chunk(p, anchor, chunk) {
            doc.flags.insert(flag.long_name.clone(), flag);
        }
    }

    doc
}

fn parse_flag_chunk(p: &Patterns, anchor: &str, chunk: &str) -> Option<FlagDoc> {
    let names = p.flag_names.captures(chunk);
    let long_name = names
        .as_ref()
        .and_then(|c| c.get(1))
        .map_or_else(|| anchor.to_string(), |m| m.as_str().to_string());
    if long_name.is_empty() {
        return None;
    }
    let short_name = names
        .as_ref()
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let mut flag = FlagDoc {
        long_name,
        short_name,
        doc_type: p
            .flag_type
            .captures(chunk)
            .and_then(|c| c.get(1))
            .map(|m| decode_entities(m.as_str())),
        ..Default::default()
    };

    let mut body_start = names
        .as_ref()
        .and_then(|c| c.get(0))
        .map_or(0, |m| m.end());
    if let Some(ty) = p.flag_type.find(chunk) {
        body_start = body_start.max(ty.end());
    }
    for gif in p.mode_gif.captures_iter(chunk) {
        let (Some(whole), Some(kind)) = (gif.get(0), gif.get(1)) else {
            continue;
        };
        match kind.as_str() {
            "create" => push_mode(&mut flag.modes, Mode::Create),
            "query" => push_mode(&mut flag.modes, Mode::Query),
            "edit" => push_mode(&mut flag.modes, Mode::Edit),
            _ => flag.multi_use = true,
        }
        body_start = body_start.max(whole.end());
    }

    // The docstring is whatever text follows the header markup
    let body = chunk.get(body_start..).unwrap_or_default();
    let body = body.find('>').map_or(body, |pos| {
        if body[..pos].contains('<') {
            body
        } else {
            &body[pos + 1..]
        }
    });
    flag.docstring = strip_markup(body);
    Some(flag)
}

fn push_mode(modes: &mut SmallVec<[Mode; 3]>, mode: Mode) {
    if !modes.contains(&mode) {
        modes.push(mode);
        modes.sort();
    }
}

pub fn read_command_doc(path: &Path) -> Result<CommandDoc, DocsError> {
    if !path.is_file() {
        return Err(DocsError::MissingPage(path.to_path_buf()));
    }
    let html = std::fs::read_to_string(path)?;
    let doc = parse_command_doc(&html);
    if doc.flags.is_empty() && doc.description.is_empty() {
        return Err(DocsError::Malformed {
            page: path.display().to_string(),
            reason: "no flags or description found".to_string(),
        });
    }
    Ok(doc)
}

/// Flags a docstring says can only be combined with another flag
pub fn secondary_of(docstring: &str) -> Option<String> {
    PATTERNS
        .as_ref()?
        .secondary
        .captures(docstring)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Layer documentation over baseline metadata
///
/// Adds docstrings, declared modes and documented types. Flags the host did
/// not report are ignored and argument arity/type is never touched.
pub fn enrich(info: &mut CommandInfo, doc: &CommandDoc) -> usize {
    if !doc.description.is_empty() {
        info.description = doc.description.clone();
    }
    if !doc.example.is_empty() {
        info.example = doc.example.clone();
    }
    if info.category.is_none() {
        info.category = doc.category.as_deref().map(Arc::from);
    }

    let command = info.name.clone();
    let mut enriched = 0;
    for flag_doc in doc.flags.values() {
        let Some(flag) = resolve_mut(info, flag_doc) else {
            debug!(
                "{}: documented flag {} not reported by host, ignoring",
                command, flag_doc.long_name
            );
            continue;
        };
        if !flag_doc.docstring.is_empty() {
            flag.docstring = flag_doc.docstring.clone();
        }
        for mode in &flag_doc.modes {
            flag.add_mode(*mode);
        }
        flag.multi_use |= flag_doc.multi_use;
        if flag_doc.doc_type.is_some() {
            flag.doc_type = flag_doc.doc_type.clone();
        }
        enriched += 1;
    }

    link_secondary_flags(info);
    enriched
}

fn resolve_mut<'a>(
    info: &'a mut CommandInfo,
    flag_doc: &FlagDoc,
) -> Option<&'a mut hostbind_meta::FlagInfo> {
    let key = if info.flag(&flag_doc.long_name).is_some() {
        flag_doc.long_name.as_str()
    } else if !flag_doc.short_name.is_empty() && info.flag(&flag_doc.short_name).is_some() {
        flag_doc.short_name.as_str()
    } else {
        return None;
    };
    info.flag_mut(key)
}

/// Derive `secondary_flags`/`modifies` from docstrings
pub fn link_secondary_flags(info: &mut CommandInfo) {
    let links: Vec<(Arc<str>, Arc<str>)> = info
        .flags
        .values()
        .filter_map(|flag| {
            let primary = secondary_of(&flag.docstring)?;
            let primary = info.long_name_of(&primary)?;
            (primary != flag.long_name).then(|| (primary, flag.long_name.clone()))
        })
        .collect();

    for (primary, secondary) in links {
        if let Some(flag) = info.flags.get_mut(&primary) {
            if !flag.secondary_flags.contains(&secondary) {
                flag.secondary_flags.push(secondary.clone());
            }
        }
        if let Some(flag) = info.flags.get_mut(&secondary) {
            if !flag.modifies.contains(&primary) {
                flag.modifies.push(primary.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synopsis::parse_synopsis;
    use hostbind_meta::{ArgType, Primitive};

    const PAGE: &str = r#"<html><head><title>sphere command</title></head><body>
<a href="cat_Modeling.html">Modeling</a>
<a name="hDescription"></a><h2>Description</h2>
<p>The sphere command creates a new sphere &amp; returns its name.</p>
<a name="hFlags"></a><h2>Flags</h2>
<table>
<tr><td><a name="flagradius"></a><code><b>radius</b>(<b>r</b>)</code></td>
<td><i>linear</i></td><td><img src="../gfx/create.gif"><img src="../gfx/query.gif"><img src="../gfx/edit.gif"></td></tr>
<tr><td colspan=3>The radius of the object</td></tr>
<tr><td><a name="flagpivot"></a><code><b>pivot</b>(<b>p</b>)</code></td>
<td><i>[linear, linear, linear]</i></td><td><img src="../gfx/create.gif"><img src="../gfx/multiuse.gif"></td></tr>
<tr><td colspan=3>Pivot point. This flag can only be used with the -radius flag.</td></tr>
<tr><td><a name="flagghost"></a><code><b>ghost</b>(<b>gh</b>)</code></td>
<td><i>boolean</i></td><td><img src="../gfx/create.gif"></td></tr>
<tr><td colspan=3>Not reported by the host.</td></tr>
</table>
<a name="hExamples"></a><h2>Python examples</h2>
<pre>import host.cmds as cmds
cmds.sphere( r=10 )</pre>
</body></html>"#;

    #[test]
    fn test_parse_page() {
        let doc = parse_command_doc(PAGE);
        assert_eq!(doc.category.as_deref(), Some("Modeling"));
        assert!(doc.description.contains("creates a new sphere & returns"));
        assert!(doc.example.contains("cmds.sphere( r=10 )"));

        let radius = doc.flags.get("radius");
        assert!(radius.is_some_and(|f| f.short_name == "r"
            && f.doc_type.as_deref() == Some("linear")
            && f.modes.as_slice() == [Mode::Create, Mode::Query, Mode::Edit]
            && f.docstring == "The radius of the object"));

        let pivot = doc.flags.get("pivot");
        assert!(pivot.is_some_and(|f| f.multi_use && f.modes.as_slice() == [Mode::Create]));
    }

    #[test]
    fn test_enrich_never_changes_arity() {
        let synopsis = "Flags:\n -r -radius Length\n -p -pivot Length Length Length\n";
        let mut info = parse_synopsis("sphere", synopsis, &[] as &[&str]);
        let enriched = enrich(&mut info, &parse_command_doc(PAGE));

        assert_eq!(enriched, 2);
        assert!(info.flag("ghost").is_none());
        assert_eq!(info.category.as_deref(), Some("Modeling"));
        assert!(info.flag("radius").is_some_and(|f| f.arg_type
            == ArgType::Single(Primitive::Length)
            && f.has_mode(Mode::Query)
            && f.doc_type.as_deref() == Some("linear")));
    }

    #[test]
    fn test_secondary_flags_linked() {
        let synopsis = "Flags:\n -r -radius Length\n -p -pivot Length Length Length\n";
        let mut info = parse_synopsis("sphere", synopsis, &[] as &[&str]);
        enrich(&mut info, &parse_command_doc(PAGE));

        assert!(info
            .flag("radius")
            .is_some_and(|f| f.secondary_flags.iter().any(|s| s.as_ref() == "pivot")));
        assert!(info
            .flag("pivot")
            .is_some_and(|f| f.modifies.iter().any(|s| s.as_ref() == "radius")));
    }

    #[test]
    fn test_secondary_phrases() {
        assert_eq!(
            secondary_of("It can only be used in conjunction with the \"-edit\" flag").as_deref(),
            Some("edit")
        );
        assert_eq!(secondary_of("Sets the radius."), None);
    }

    #[test]
    fn test_read_missing_page() {
        assert!(matches!(
            read_command_doc(Path::new("/nonexistent/hostbind/sphere.html")),
            Err(DocsError::MissingPage(_))
        ));
    }
}
