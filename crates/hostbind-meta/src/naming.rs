//! Naming utilities shared by metadata inference and wrapper generation
//!
//! Host names are camelCase (`dagNode`, `setTranslation`); wrapper classes are
//! CamelCase (`DagNode`) and flag accessors are prefixed (`getRadius`).

/// Upper-case the first character: `dagNode` -> `DagNode`
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case the first character: `Translation` -> `translation`
pub fn uncapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Accessor name for a flag: `("get", "radius")` -> `getRadius`
pub fn prefixed(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, capitalize(name))
}

/// Strip the first matching API prefix: `MFnMesh` -> `Mesh`
///
/// A prefix only matches when an upper-case letter follows it, so `Matrix`
/// keeps its `M`.
pub fn strip_api_prefix<'a, S: AsRef<str>>(name: &'a str, prefixes: &[S]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| {
        let rest = name.strip_prefix(prefix.as_ref())?;
        rest.chars()
            .next()
            .filter(char::is_ascii_uppercase)
            .map(|_| rest)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_roundtrip() {
        assert_eq!(capitalize("dagNode"), "DagNode");
        assert_eq!(uncapitalize("Translation"), "translation");
        assert_eq!(capitalize(""), "");
        assert_eq!(prefixed("set", "radius"), "setRadius");
    }

    #[test]
    fn test_strip_api_prefix() {
        let prefixes = ["MFn", "MIt", "M"];
        assert_eq!(strip_api_prefix("MFnMesh", &prefixes), Some("Mesh"));
        assert_eq!(strip_api_prefix("MItDag", &prefixes), Some("Dag"));
        assert_eq!(strip_api_prefix("MVector", &prefixes), Some("Vector"));
        assert_eq!(strip_api_prefix("Matrix", &prefixes), None);
        assert_eq!(strip_api_prefix("transform", &prefixes), None);
    }
}
