//! Getter/setter pairing for API methods
//!
//! Documentation declares some pairs explicitly. The rest are inferred by
//! name: `setX` pairs with the first of `x`, `getX`, `isX` whose inputs are a
//! subset of the setter's inputs.

use crate::naming;
use crate::types::{ApiClassInfo, Inverse};
use std::sync::Arc;
use tracing::debug;

fn getter_candidates(setter: &str) -> Option<[String; 3]> {
    let base = setter.strip_prefix("set")?;
    if !base.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return None;
    }
    Some([
        naming::uncapitalize(base),
        format!("get{}", base),
        format!("is{}", base),
    ])
}

/// Infer missing inverses on every setter of `class`; returns the number of pairs added
pub fn infer_inverses(class: &mut ApiClassInfo) -> usize {
    let setters: Vec<Arc<str>> = class
        .methods
        .keys()
        .filter(|name| name.starts_with("set"))
        .cloned()
        .collect();

    let mut added = 0;
    for setter in setters {
        let Some(candidates) = getter_candidates(&setter) else {
            continue;
        };

        let setter_inputs: Vec<Arc<str>> = class
            .overloads(&setter)
            .iter()
            .flat_map(|m| m.in_arg_names())
            .collect();
        if class
            .overloads(&setter)
            .iter()
            .all(|m| m.inverse.is_some())
        {
            continue;
        }

        let getter = candidates.into_iter().find(|candidate| {
            class.overloads(candidate).iter().any(|m| {
                m.in_arg_names()
                    .iter()
                    .all(|name| setter_inputs.contains(name))
            })
        });
        let Some(getter) = getter else {
            continue;
        };

        let getter_name: Arc<str> = Arc::from(getter.as_str());
        if let Some(overloads) = class.methods.get_mut(&setter) {
            for overload in overloads.iter_mut().filter(|m| m.inverse.is_none()) {
                overload.inverse = Some(Inverse {
                    method: getter_name.clone(),
                    is_getter: false,
                });
            }
        }
        if let Some(overloads) = class.methods.get_mut(&getter_name) {
            for overload in overloads.iter_mut().filter(|m| m.inverse.is_none()) {
                overload.inverse = Some(Inverse {
                    method: setter.clone(),
                    is_getter: true,
                });
            }
        }
        debug!("{}: paired {} with getter {}", class.name, setter, getter_name);
        added += 1;
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArgInfo, MethodInfo, TypeRef};

    fn translation_class() -> ApiClassInfo {
        let mut class = ApiClassInfo::new("MFnTransform");
        class.add_enum("Space", &["kInvalid", "kTransform", "kWorld"]);
        let space = TypeRef::enumeration("MFnTransform", "Space");
        class.add_overload(
            "setTranslation",
            MethodInfo {
                args: vec![
                    ArgInfo::input("vector", TypeRef::named("MVector")),
                    ArgInfo::input("space", space.clone()),
                ],
                ..Default::default()
            },
        );
        class.add_overload(
            "translation",
            MethodInfo {
                args: vec![ArgInfo::input("space", space)],
                return_type: Some(TypeRef::named("MVector")),
                ..Default::default()
            },
        );
        class
    }

    #[test]
    fn test_setter_pairs_with_plain_getter() {
        let mut class = translation_class();
        assert_eq!(infer_inverses(&mut class), 1);

        let setter = &class.overloads("setTranslation")[0];
        assert_eq!(
            setter.inverse,
            Some(Inverse {
                method: Arc::from("translation"),
                is_getter: false
            })
        );
        assert!(setter.is_setter());
        let getter = &class.overloads("translation")[0];
        assert!(getter.inverse.as_ref().is_some_and(|inv| inv.is_getter));
    }

    #[test]
    fn test_getter_needing_extra_inputs_is_rejected() {
        let mut class = ApiClassInfo::new("MFnThing");
        class.add_overload(
            "setValue",
            MethodInfo {
                args: vec![ArgInfo::input("value", TypeRef::named("double"))],
                ..Default::default()
            },
        );
        class.add_overload(
            "getValue",
            MethodInfo {
                args: vec![ArgInfo::input("index", TypeRef::named("int"))],
                return_type: Some(TypeRef::named("double")),
                ..Default::default()
            },
        );
        assert_eq!(infer_inverses(&mut class), 0);
        assert!(class.overloads("setValue")[0].inverse.is_none());
    }

    #[test]
    fn test_is_prefix_and_non_setter_names() {
        let mut class = ApiClassInfo::new("MFnDagNode");
        class.add_overload(
            "setIntermediateObject",
            MethodInfo {
                args: vec![ArgInfo::input("isIntermediate", TypeRef::named("bool"))],
                ..Default::default()
            },
        );
        class.add_overload(
            "isIntermediateObject",
            MethodInfo {
                return_type: Some(TypeRef::named("bool")),
                ..Default::default()
            },
        );
        class.add_overload("settle", MethodInfo::default());
        assert_eq!(infer_inverses(&mut class), 1);
        assert!(class.overloads("settle")[0].inverse.is_none());
    }
}
