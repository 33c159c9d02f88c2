//! Parser for the host's authoritative flag synopsis
//!
//! The host answers `help <command>` with a block like:
//!
//! ```text
//! Synopsis: sphere [flags] [String...]
//! Flags:
//!    -e -edit
//!    -q -query
//!  -ax -axis          Length Length Length
//!   -n -name          String (Query Arg Optional)
//!  -os -objectSpace   (multi-use)
//! ```
//!
//! This is the ground truth for flag arity and primitive type.

use hostbind_meta::{ArgType, CommandInfo, FlagInfo, Primitive};
use std::sync::Arc;
use tracing::debug;

const MULTI_USE: &str = "(multi-use)";
const QUERY_ARG_MARKERS: &[&str] = &["(Query Arg Mandatory)", "(Query Arg Optional)"];

/// Flags that select a mode rather than describe data
const MODE_FLAGS: &[&str] = &["edit", "query"];

/// Parse one synopsis block into baseline command metadata
pub fn parse_synopsis<S: AsRef<str>>(command: &str, text: &str, reserved: &[S]) -> CommandInfo {
    let mut info = CommandInfo::new(command);
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("Synopsis:") {
            info.description = line.to_string();
            continue;
        }
        if !line.starts_with('-') {
            continue;
        }
        if let Some(flag) = parse_flag_line(line) {
            add_flag(&mut info, flag, reserved);
        }
    }

    debug!("Synopsis for {}: {} flags", command, info.flags.len());
    info
}

fn parse_flag_line(line: &str) -> Option<FlagInfo> {
    let mut line = line.to_string();
    let multi_use = line.contains(MULTI_USE);
    line = line.replace(MULTI_USE, "");
    for marker in QUERY_ARG_MARKERS {
        line = line.replace(marker, "");
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let names: Vec<&str> = tokens
        .iter()
        .take_while(|t| t.starts_with('-'))
        .map(|t| t.trim_start_matches('-'))
        .take(2)
        .collect();
    let (short, long) = match names.as_slice() {
        [] => return None,
        [only] => (*only, *only),
        [short, long, ..] => (*short, if long.is_empty() { *short } else { *long }),
    };
    if long.is_empty() {
        return None;
    }

    let type_tokens: Vec<Primitive> = tokens
        .iter()
        .skip(names.len())
        .map(|t| Primitive::from_token(&t.to_lowercase()))
        .collect();

    let mut flag = FlagInfo::new(long, short, ArgType::from_tokens(&type_tokens));
    flag.multi_use = multi_use;
    Some(flag)
}

fn add_flag<S: AsRef<str>>(info: &mut CommandInfo, mut flag: FlagInfo, reserved: &[S]) {
    if MODE_FLAGS.contains(&flag.long_name.as_ref()) {
        return;
    }

    let is_reserved = |name: &str| reserved.iter().any(|r| r.as_ref() == name);
    if is_reserved(&flag.long_name) && !is_reserved(&flag.short_name) {
        let original = flag.long_name.clone();
        flag.long_name = flag.short_name.clone();
        info.removed_flags.insert(original, flag.long_name.clone());
    } else if is_reserved(&flag.short_name) && !is_reserved(&flag.long_name) {
        let original = flag.short_name.clone();
        flag.short_name = flag.long_name.clone();
        info.removed_flags.insert(original, flag.long_name.clone());
    }

    if flag.short_name.as_ref() == flag.long_name.as_ref() {
        flag.short_name = Arc::from("");
    }
    info.add_flag(flag);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPHERE: &str = "
Synopsis: sphere [flags] [String...]
Flags:
   -e -edit
   -q -query
 -ax -axis                  Length Length Length
   -n -name                 String (Query Arg Optional)
  -os -objectSpace          (multi-use)
   -r -radius               Length
  -in -in                   on|off
 -cnt -count                UnsignedInt
";

    #[test]
    fn test_parse_flags_and_types() {
        let info = parse_synopsis("sphere", SPHERE, &["in"]);
        assert_eq!(info.description, "Synopsis: sphere [flags] [String...]");
        assert!(info.flag("edit").is_none());

        let axis = info.flag("ax");
        assert!(axis.is_some_and(|f| f.arg_count() == 3
            && f.arg_type
                == ArgType::Multi(smallvec::smallvec![
                    Primitive::Length,
                    Primitive::Length,
                    Primitive::Length
                ])));
        assert!(info
            .flag("name")
            .is_some_and(|f| f.arg_type == ArgType::Single(Primitive::Str)));
        assert!(info
            .flag("objectSpace")
            .is_some_and(|f| f.multi_use && f.arg_type == ArgType::Toggle));
        assert!(info
            .flag("count")
            .is_some_and(|f| f.arg_type == ArgType::Single(Primitive::Int)));
    }

    #[test]
    fn test_reserved_word_is_renamed() {
        let info = parse_synopsis("sphere", SPHERE, &["in"]);
        // both names are reserved: nothing to rename to, so the flag keeps its name
        assert!(info.flag("in").is_some());

        let text = "Synopsis: loop\nFlags:\n -l -lambda  Float\n";
        let info = parse_synopsis("loop", text, &["lambda"]);
        assert!(info.flag("lambda").is_none());
        assert!(info.flag("l").is_some_and(|f| f.arg_count() == 1));
        assert_eq!(
            info.removed_flags.get("lambda").map(|s| s.as_ref()),
            Some("l")
        );
    }

    #[test]
    fn test_empty_long_name_falls_back_to_short() {
        let info = parse_synopsis("cmd", "Flags:\n -x  Int\n", &[] as &[&str]);
        assert!(info.flag("x").is_some_and(|f| f.arg_count() == 1));
    }

    #[test]
    fn test_boolean_toggle_without_tokens() {
        let info = parse_synopsis("foo", "Flags:\n -b -bar\n", &[] as &[&str]);
        assert!(info
            .flag("b")
            .is_some_and(|f| f.arg_type == ArgType::Toggle && f.arg_count() == 0));
    }
}
