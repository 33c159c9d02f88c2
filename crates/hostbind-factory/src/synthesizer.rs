//! Callable Synthesizer
//!
//! Turns one accepted flag or method overload into a [`Callable`] with an
//! explicit parameter list taken from the metadata, so keyword calls and
//! signature inspection see the real inputs.

use hostbind_bridge::{
    Callable, CallableKind, CommandBinding, FlagBinding, MethodBinding, Param, UndoBinding, Value,
};
use hostbind_meta::{
    ApiClassInfo, ApiEnum, ArgInfo, ArgType, CommandInfo, Direction, FlagInfo, MetadataStore,
    MethodInfo, Mode, TypeRef,
};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// Plain command function taking positional arguments and keyword flags
pub fn command_function(info: &CommandInfo) -> Callable {
    Callable::new(
        &info.name,
        Vec::new(),
        command_doc(info),
        CallableKind::Command(CommandBinding {
            info: Rc::new(info.clone()),
        }),
    )
}

fn command_doc(info: &CommandInfo) -> String {
    let mut doc = info.description.clone();
    if !info.flags.is_empty() {
        doc.push_str("\n\nFlags:\n");
    }
    for flag in info.flags.values() {
        let modes: Vec<String> = flag.modes.iter().map(ToString::to_string).collect();
        doc.push_str(&format!(
            "  -{} ({}) {} [{}]",
            flag.long_name,
            flag.short_name,
            flag.arg_type,
            modes.join(", ")
        ));
        if !flag.docstring.is_empty() {
            doc.push_str(&format!(": {}", flag.docstring));
        }
        doc.push('\n');
    }
    doc
}

fn flag_binding(command: &str, flag: &FlagInfo) -> FlagBinding {
    FlagBinding {
        command: Arc::from(command),
        flag: flag.clone(),
    }
}

fn flag_doc(command: &str, flag: &FlagInfo, mode: Mode) -> String {
    let mut doc = format!("{} -{} -{} ({})", command, mode, flag.long_name, flag.arg_type);
    if !flag.docstring.is_empty() {
        doc.push_str("\n\n");
        doc.push_str(&flag.docstring);
    }
    doc
}

/// Getter: runs the command in query mode on the instance
pub fn flag_query(command: &str, flag: &FlagInfo, name: &str) -> Callable {
    Callable::new(
        name,
        Vec::new(),
        flag_doc(command, flag, Mode::Query),
        CallableKind::FlagQuery(flag_binding(command, flag)),
    )
}

/// Setter: runs the command in edit mode with the value unmodified
pub fn flag_edit(command: &str, flag: &FlagInfo, name: &str) -> Callable {
    Callable::new(
        name,
        vec![Param::required("val")],
        flag_doc(command, flag, Mode::Edit),
        CallableKind::FlagEdit(flag_binding(command, flag)),
    )
}

/// Create-mode flag; a toggle defaults to on, multi-argument flags take
/// one parameter per element
pub fn flag_create(command: &str, flag: &FlagInfo, name: &str) -> Callable {
    let params = match &flag.arg_type {
        ArgType::Toggle => vec![Param::optional("val", Value::Bool(true))],
        ArgType::Single(_) => vec![Param::required("val")],
        ArgType::Multi(items) => (1..=items.len())
            .map(|idx| Param::required(&format!("val{}", idx)))
            .collect(),
    };
    Callable::new(
        name,
        params,
        flag_doc(command, flag, Mode::Create),
        CallableKind::FlagCreate(flag_binding(command, flag)),
    )
}

/// One method overload selected for wrapping
#[derive(Debug, Clone, Copy)]
pub struct MethodSpec<'a> {
    pub class: &'a ApiClassInfo,
    pub method: &'a str,
    pub overload: usize,
    /// Name the wrapper exposes
    pub display: &'a str,
    pub self_type: Option<&'a str>,
    pub proxy: bool,
}

impl MethodSpec<'_> {
    pub fn info(&self) -> Option<&MethodInfo> {
        self.class.overloads(self.method).get(self.overload)
    }
}

/// Wrap one API method overload. `None` when the overload index is out of range.
pub fn api_method(
    store: &MetadataStore,
    spec: MethodSpec<'_>,
    undo: Option<UndoBinding>,
) -> Option<Callable> {
    let info = spec.info()?;
    let enums = enum_tables(store, info);
    let params = info
        .args
        .iter()
        .filter(|arg| arg.direction == Direction::In)
        .map(|arg| Param {
            name: arg.name.clone(),
            default: info
                .defaults
                .get(&arg.name)
                .map(|value| display_default(arg, value, &enums)),
        })
        .collect();
    let doc = method_doc(spec, info);

    Some(Callable::new(
        spec.display,
        params,
        doc,
        CallableKind::ApiMethod(MethodBinding {
            api_class: spec.class.name.clone(),
            method: Arc::from(spec.method),
            overload: spec.overload,
            info: info.clone(),
            self_type: spec.self_type.map(Arc::from),
            enums,
            proxy: spec.proxy,
            undo,
        }),
    ))
}

/// Enum tables referenced anywhere in the signature
fn enum_tables(
    store: &MetadataStore,
    info: &MethodInfo,
) -> BTreeMap<(Arc<str>, Arc<str>), ApiEnum> {
    info.referenced_types()
        .filter_map(|ty| match ty {
            TypeRef::Enum { class, name } => {
                let table = store.get_api_class_info(class).ok()?.enumeration(name)?;
                Some(((class.clone(), name.clone()), table.clone()))
            }
            TypeRef::Named(_) => None,
        })
        .collect()
}

/// Enum defaults are documented by internal name; show the display name
fn display_default(
    arg: &ArgInfo,
    value: &Value,
    enums: &BTreeMap<(Arc<str>, Arc<str>), ApiEnum>,
) -> Value {
    let TypeRef::Enum { class, name } = &arg.ty else {
        return value.clone();
    };
    let display = enums
        .get(&(class.clone(), name.clone()))
        .and_then(|table| {
            let idx = table.resolve(value)?;
            let internal = table.values.get(idx)?;
            table.display_of(internal)
        });
    match display {
        Some(display) => Value::Str(display),
        None => value.clone(),
    }
}

fn method_doc(spec: MethodSpec<'_>, info: &MethodInfo) -> String {
    let mut doc = format!("{}.{}", spec.class.name, spec.method);
    if !info.doc.is_empty() {
        doc.push_str("\n\n");
        doc.push_str(&info.doc);
    }
    if !info.args.is_empty() {
        doc.push_str("\n\n");
    }
    for arg in &info.args {
        let direction = match arg.direction {
            Direction::In => "in",
            Direction::Out => "out",
        };
        doc.push_str(&format!("  {} : {} ({})\n", arg.name, arg.ty, direction));
    }
    if let Some(ret) = &info.return_type {
        doc.push_str(&format!("  returns : {}\n", ret));
    }
    doc
}

/// Positions in the setter's inputs of each getter input, in getter order.
/// `None` when the getter needs an input the setter does not have.
pub fn shared_inputs(setter: &MethodInfo, getter: &MethodInfo) -> Option<Vec<usize>> {
    let setter_inputs = setter.in_arg_names();
    getter
        .in_arg_names()
        .iter()
        .map(|name| setter_inputs.iter().position(|s| s == name))
        .collect()
}

/// Undo wiring for a setter: the getter reads the shared inputs and its
/// result restores the inputs only the setter has
pub fn undo_binding(
    setter: &MethodInfo,
    getter: Rc<Callable>,
    getter_info: &MethodInfo,
) -> Option<UndoBinding> {
    let shared = shared_inputs(setter, getter_info)?;
    let restored: Vec<usize> = (0..setter.in_args().len())
        .filter(|idx| !shared.contains(idx))
        .collect();
    if restored.is_empty() {
        return None;
    }
    Some(UndoBinding {
        getter,
        shared,
        restored,
    })
}
