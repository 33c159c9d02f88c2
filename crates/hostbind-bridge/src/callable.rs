//! Synthesized callables
//!
//! A callable is plain data: a name, an inspectable parameter list, a doc
//! string and a [`CallableKind`] saying how an invocation reaches the host.
//! Invocation runs against a [`CallContext`] that lends the host, the
//! conversion registry and the undo coordinator for the duration of the call.

use crate::conversion::ConversionRegistry;
use crate::errors::CallError;
use crate::host::{ApiCall, Host};
use crate::undo::{UndoCoordinator, UndoItem};
use crate::units::UnitSettings;
use crate::Value;
use hostbind_meta::{
    ApiEnum, ArgInfo, ArgType, CommandInfo, Direction, FlagInfo, MethodInfo, Primitive, TypeRef,
    UnitType,
};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// Keywords that select a command mode rather than name a flag
const MODE_KEYWORDS: &[(&str, &str)] = &[
    ("query", "query"),
    ("q", "query"),
    ("edit", "edit"),
    ("e", "edit"),
];

/// Borrowed session state a call runs against
pub struct CallContext<'a> {
    pub host: &'a mut dyn Host,
    pub conversions: &'a ConversionRegistry,
    pub undo: &'a mut UndoCoordinator,
}

impl<'a> CallContext<'a> {
    pub fn new(
        host: &'a mut dyn Host,
        conversions: &'a ConversionRegistry,
        undo: &'a mut UndoCoordinator,
    ) -> Self {
        Self {
            host,
            conversions,
            undo,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Arc<str>,
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            default: None,
        }
    }

    pub fn optional(name: &str, default: Value) -> Self {
        Self {
            name: Arc::from(name),
            default: Some(default),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(default) => write!(f, "{}={}", self.name, default),
            None => write!(f, "{}", self.name),
        }
    }
}

pub type NativeFn =
    Rc<dyn Fn(&mut CallContext<'_>, Option<&Value>, &[Value]) -> Result<Value, CallError>>;

/// A plain command function
#[derive(Debug, Clone)]
pub struct CommandBinding {
    pub info: Rc<CommandInfo>,
}

impl CommandBinding {
    /// Translate keyword arguments into host flags, validating every name
    pub fn flags_from_keywords(
        &self,
        kwargs: &[(&str, Value)],
    ) -> Result<Vec<(Arc<str>, Value)>, CallError> {
        kwargs
            .iter()
            .map(|(name, value)| {
                if let Some((_, mode)) = MODE_KEYWORDS.iter().find(|(kw, _)| kw == name) {
                    return Ok((Arc::from(*mode), value.clone()));
                }
                self.info
                    .long_name_of(name)
                    .map(|long| (long, value.clone()))
                    .ok_or_else(|| CallError::UnknownFlag {
                        command: self.info.name.to_string(),
                        flag: (*name).to_string(),
                    })
            })
            .collect()
    }
}

/// One flag of a command, bound to a wrapper method
#[derive(Debug, Clone)]
pub struct FlagBinding {
    pub command: Arc<str>,
    pub flag: FlagInfo,
}

/// Getter half used to capture undo state before a setter runs
#[derive(Debug, Clone)]
pub struct UndoBinding {
    pub getter: Rc<Callable>,
    /// Setter input position feeding each getter parameter, in getter order
    pub shared: Vec<usize>,
    /// Setter input positions only the setter has; the getter's result restores them
    pub restored: Vec<usize>,
}

/// One API method overload
#[derive(Debug, Clone)]
pub struct MethodBinding {
    pub api_class: Arc<str>,
    pub method: Arc<str>,
    pub overload: usize,
    pub info: MethodInfo,
    /// The enclosing class's own API type; values of it pass through unconverted
    pub self_type: Option<Arc<str>>,
    /// Enum tables referenced by the signature, keyed by (class, enum)
    pub enums: BTreeMap<(Arc<str>, Arc<str>), ApiEnum>,
    /// Dispatch to the API delegate of the instance instead of the instance
    pub proxy: bool,
    pub undo: Option<UndoBinding>,
}

impl MethodBinding {
    fn enum_table(&self, class: &str, name: &str) -> Option<&ApiEnum> {
        self.enums
            .iter()
            .find(|((c, n), _)| c.as_ref() == class && n.as_ref() == name)
            .map(|(_, table)| table)
    }

    fn is_self_type(&self, ty: &str) -> bool {
        self.self_type.as_deref() == Some(ty)
    }

    fn cast_in(
        &self,
        conversions: &ConversionRegistry,
        units: &UnitSettings,
        arg: &ArgInfo,
        value: &Value,
    ) -> Result<Value, CallError> {
        let value = match arg.unit {
            Some(unit) => units.to_internal(unit, value)?,
            None => value.clone(),
        };
        match &arg.ty {
            TypeRef::Enum { class, name } => {
                let invalid = || CallError::InvalidEnum {
                    class: class.to_string(),
                    name: name.to_string(),
                    value: value.to_string(),
                };
                let table = self.enum_table(class, name).ok_or_else(invalid)?;
                table
                    .resolve(&value)
                    .map(|idx| Value::Int(idx as i64))
                    .ok_or_else(invalid)
            }
            TypeRef::Named(ty) if self.is_self_type(ty) => Ok(value),
            // Unconvertible types are only wrappable when they carry a default
            TypeRef::Named(ty)
                if !conversions.contains(ty) && self.info.defaults.contains_key(&arg.name) =>
            {
                Ok(value)
            }
            TypeRef::Named(ty) => Ok(conversions.in_cast(ty, &value)?),
        }
    }

    fn placeholder(&self, conversions: &ConversionRegistry, arg: &ArgInfo) -> Result<Value, CallError> {
        match &arg.ty {
            TypeRef::Enum { .. } => Ok(Value::Int(0)),
            TypeRef::Named(ty) if self.is_self_type(ty) => Ok(Value::Null),
            TypeRef::Named(ty) => Ok(conversions.ref_init(ty)?),
        }
    }

    fn cast_out(
        &self,
        conversions: &ConversionRegistry,
        units: &UnitSettings,
        ty: &TypeRef,
        unit: Option<UnitType>,
        value: &Value,
        by_ref: bool,
    ) -> Result<Value, CallError> {
        let value = match ty {
            TypeRef::Enum { class, name } => self.enum_display(class, name, value),
            TypeRef::Named(ty) if self.is_self_type(ty) => value.clone(),
            TypeRef::Named(ty) if by_ref => conversions.ref_cast(ty, value)?,
            TypeRef::Named(ty) => conversions.out_cast(ty, value)?,
        };
        match unit {
            Some(unit) => Ok(units.to_ui(unit, &value)?),
            None => Ok(value),
        }
    }

    /// Enum index reported by the host to its display name
    fn enum_display(&self, class: &str, name: &str, value: &Value) -> Value {
        let display = self.enum_table(class, name).and_then(|table| {
            let idx = usize::try_from(value.as_i64()?).ok()?;
            let internal = table.values.get(idx)?;
            table.display_of(internal)
        });
        match display {
            Some(name) => Value::Str(name),
            None => value.clone(),
        }
    }
}

#[derive(Clone)]
pub enum CallableKind {
    Command(CommandBinding),
    FlagQuery(FlagBinding),
    FlagEdit(FlagBinding),
    FlagCreate(FlagBinding),
    ApiMethod(MethodBinding),
    /// Hand-written method
    Native(NativeFn),
}

impl CallableKind {
    pub fn label(&self) -> &'static str {
        match self {
            CallableKind::Command(_) => "command",
            CallableKind::FlagQuery(_) => "query",
            CallableKind::FlagEdit(_) => "edit",
            CallableKind::FlagCreate(_) => "create",
            CallableKind::ApiMethod(_) => "api",
            CallableKind::Native(_) => "native",
        }
    }
}

impl fmt::Debug for CallableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallableKind::Command(b) => f.debug_tuple("Command").field(&b.info.name).finish(),
            CallableKind::FlagQuery(b) => f.debug_tuple("FlagQuery").field(&b.flag.long_name).finish(),
            CallableKind::FlagEdit(b) => f.debug_tuple("FlagEdit").field(&b.flag.long_name).finish(),
            CallableKind::FlagCreate(b) => {
                f.debug_tuple("FlagCreate").field(&b.flag.long_name).finish()
            }
            CallableKind::ApiMethod(b) => f
                .debug_tuple("ApiMethod")
                .field(&b.api_class)
                .field(&b.method)
                .field(&b.overload)
                .finish(),
            CallableKind::Native(_) => f.write_str("Native"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Callable {
    pub name: Arc<str>,
    pub params: Vec<Param>,
    pub doc: String,
    pub kind: CallableKind,
}

impl Callable {
    pub fn new(name: &str, params: Vec<Param>, doc: impl Into<String>, kind: CallableKind) -> Self {
        Self {
            name: Arc::from(name),
            params,
            doc: doc.into(),
            kind,
        }
    }

    pub fn native<F>(name: &str, params: Vec<Param>, doc: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut CallContext<'_>, Option<&Value>, &[Value]) -> Result<Value, CallError> + 'static,
    {
        Self::new(name, params, doc, CallableKind::Native(Rc::new(f)))
    }

    /// `name(a, b=default)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        format!("{}({})", self.name, params.join(", "))
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_ref()).collect()
    }

    fn check_arity(&self, given: usize) -> Result<(), CallError> {
        if given == self.params.len() {
            Ok(())
        } else {
            Err(CallError::arity(&self.name, self.params.len(), given))
        }
    }

    fn instance<'v>(&self, this: Option<&'v Value>) -> Result<&'v Value, CallError> {
        this.ok_or_else(|| CallError::MissingInstance {
            callable: self.name.to_string(),
        })
    }

    /// Invoke with positional arguments only
    pub fn invoke(
        &self,
        cx: &mut CallContext<'_>,
        this: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, CallError> {
        match &self.kind {
            CallableKind::Command(binding) => self.run_command(binding, cx, this, args, Vec::new()),
            CallableKind::FlagQuery(binding) => {
                self.check_arity(args.len())?;
                let target = self.instance(this)?.clone();
                let flags = vec![
                    (binding.flag.long_name.clone(), Value::Bool(true)),
                    (Arc::from("query"), Value::Bool(true)),
                ];
                let result = self.dispatch(cx, &binding.command, &[target], &flags)?;
                Ok(correct_query_result(&binding.flag, result))
            }
            CallableKind::FlagEdit(binding) => {
                self.check_arity(args.len())?;
                let target = self.instance(this)?.clone();
                let value = match args {
                    [single] => single.clone(),
                    many => Value::List(many.to_vec()),
                };
                let flags = vec![
                    (binding.flag.long_name.clone(), value),
                    (Arc::from("edit"), Value::Bool(true)),
                ];
                self.dispatch(cx, &binding.command, &[target], &flags)
            }
            CallableKind::FlagCreate(binding) => {
                // A multi-argument flag takes every element or none at all
                let partial = matches!(binding.flag.arg_type, ArgType::Multi(_))
                    && !args.is_empty()
                    && args.len() != self.params.len();
                if args.len() > self.params.len() || partial {
                    return Err(CallError::arity(&self.name, self.params.len(), args.len()));
                }
                let value = match args {
                    [] => Value::Bool(true),
                    [single] => single.clone(),
                    many => Value::List(many.to_vec()),
                };
                let positional: Vec<Value> = this.cloned().into_iter().collect();
                let flags = vec![(binding.flag.long_name.clone(), value)];
                self.dispatch(cx, &binding.command, &positional, &flags)
            }
            CallableKind::ApiMethod(binding) => self.invoke_method(binding, cx, this, args),
            CallableKind::Native(f) => {
                self.check_arity(args.len())?;
                (**f)(cx, this, args)
            }
        }
    }

    /// Invoke with keyword arguments: commands take them as flags, everything
    /// else binds them to parameters and fills defaults
    pub fn call_kw(
        &self,
        cx: &mut CallContext<'_>,
        this: Option<&Value>,
        args: &[Value],
        kwargs: &[(&str, Value)],
    ) -> Result<Value, CallError> {
        if let CallableKind::Command(binding) = &self.kind {
            let flags = binding.flags_from_keywords(kwargs)?;
            return self.run_command(binding, cx, this, args, flags);
        }
        let bound = self.bind(args, kwargs)?;
        self.invoke(cx, this, &bound)
    }

    fn bind(&self, args: &[Value], kwargs: &[(&str, Value)]) -> Result<Vec<Value>, CallError> {
        if args.len() > self.params.len() {
            return Err(CallError::arity(&self.name, self.params.len(), args.len()));
        }
        let mut bound: Vec<Option<Value>> = args.iter().cloned().map(Some).collect();
        bound.resize(self.params.len(), None);

        for (key, value) in kwargs {
            let slot = self
                .params
                .iter()
                .position(|p| p.name.as_ref() == *key)
                .and_then(|pos| bound.get_mut(pos))
                .ok_or_else(|| CallError::UnexpectedKeyword {
                    callable: self.name.to_string(),
                    param: (*key).to_string(),
                })?;
            if slot.is_some() {
                return Err(CallError::MultipleValues {
                    callable: self.name.to_string(),
                    param: (*key).to_string(),
                });
            }
            *slot = Some(value.clone());
        }

        self.params
            .iter()
            .zip(bound)
            .map(|(param, value)| {
                value
                    .or_else(|| param.default.clone())
                    .ok_or_else(|| CallError::MissingArgument {
                        callable: self.name.to_string(),
                        param: param.name.to_string(),
                    })
            })
            .collect()
    }

    fn run_command(
        &self,
        binding: &CommandBinding,
        cx: &mut CallContext<'_>,
        this: Option<&Value>,
        args: &[Value],
        flags: Vec<(Arc<str>, Value)>,
    ) -> Result<Value, CallError> {
        let positional: Vec<Value> = this.into_iter().chain(args).cloned().collect();
        self.dispatch(cx, &binding.info.name, &positional, &flags)
    }

    fn dispatch(
        &self,
        cx: &mut CallContext<'_>,
        command: &str,
        args: &[Value],
        flags: &[(Arc<str>, Value)],
    ) -> Result<Value, CallError> {
        cx.host.call_command(command, args, flags).map_err(|e| {
            debug!("{} failed: {}", command_signature(command, args, flags), e);
            CallError::from(e)
        })
    }

    fn invoke_method(
        &self,
        binding: &MethodBinding,
        cx: &mut CallContext<'_>,
        this: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, CallError> {
        let info = &binding.info;
        let inputs = info.in_args();
        if args.len() != inputs.len() {
            return Err(CallError::arity(&self.name, inputs.len(), args.len()));
        }
        if !info.is_static && this.is_none() {
            return Err(CallError::MissingInstance {
                callable: self.name.to_string(),
            });
        }
        let units = cx.host.unit_settings();

        let mut slots = Vec::with_capacity(info.args.len());
        let mut supplied = args.iter();
        for arg in &info.args {
            match (arg.direction, supplied.as_slice().first()) {
                (Direction::In, Some(value)) => {
                    slots.push(binding.cast_in(cx.conversions, &units, arg, value)?);
                    supplied.next();
                }
                (Direction::In, None) => {
                    return Err(CallError::arity(&self.name, inputs.len(), args.len()));
                }
                (Direction::Out, _) => slots.push(binding.placeholder(cx.conversions, arg)?),
            }
        }

        if let Some(undo) = &binding.undo {
            if cx.undo.is_recording(&*cx.host) {
                self.record_undo(undo, cx, this, args)?;
            }
        }

        let target = match (this, binding.proxy) {
            (Some(this), true) => Some(cx.host.api_delegate(this, &binding.api_class)?),
            (this, _) => this.cloned(),
        };
        let signature = method_signature(binding, &slots);
        let returned = cx
            .host
            .call_method(ApiCall {
                class: &binding.api_class,
                method: &binding.method,
                overload: binding.overload,
                target: target.as_ref(),
                args: &mut slots,
            })
            .map_err(|e| {
                debug!("{} failed: {}", signature, e);
                CallError::from(e)
            })?;

        let mut outputs = Vec::new();
        if let Some(ty) = &info.return_type {
            outputs.push(binding.cast_out(cx.conversions, &units, ty, info.return_unit, &returned, false)?);
        }
        for idx in info.out_args() {
            if let (Some(arg), Some(slot)) = (info.args.get(idx), slots.get(idx)) {
                outputs.push(binding.cast_out(cx.conversions, &units, &arg.ty, arg.unit, slot, true)?);
            }
        }

        Ok(match outputs.len() {
            0 => Value::Null,
            1 => outputs.pop().unwrap_or_default(),
            _ => Value::List(outputs),
        })
    }

    /// Capture the current state through the getter and push an undo item,
    /// before the setter touches the host
    fn record_undo(
        &self,
        undo: &UndoBinding,
        cx: &mut CallContext<'_>,
        this: Option<&Value>,
        args: &[Value],
    ) -> Result<(), CallError> {
        let getter_args: Vec<Value> = undo
            .shared
            .iter()
            .filter_map(|&idx| args.get(idx).cloned())
            .collect();
        let old = undo.getter.invoke(cx, this, &getter_args)?;

        let mut undo_args = args.to_vec();
        match undo.restored.as_slice() {
            [single] => {
                if let Some(slot) = undo_args.get_mut(*single) {
                    *slot = old;
                }
            }
            many => {
                let values = old.as_list().map(<[Value]>::to_vec).unwrap_or_default();
                for (&idx, value) in many.iter().zip(values) {
                    if let Some(slot) = undo_args.get_mut(idx) {
                        *slot = value;
                    }
                }
            }
        }

        let item = UndoItem::new(Rc::new(self.clone()), this.cloned(), args.to_vec(), undo_args);
        cx.undo.append(cx.host, item)?;
        Ok(())
    }
}

/// Apply the result corrections recorded by probing
fn correct_query_result(flag: &FlagInfo, mut result: Value) -> Value {
    if flag.result_needs_unpacking {
        if let Value::List(items) = &result {
            if let [single] = items.as_slice() {
                result = single.clone();
            }
        }
    }
    if flag.result_needs_casting {
        let cast = match &flag.arg_type {
            ArgType::Toggle | ArgType::Single(Primitive::Bool) => result.as_bool().map(Value::Bool),
            ArgType::Single(Primitive::Int) => result.as_i64().map(Value::Int),
            ArgType::Single(p) if p.is_numeric() => result.as_f64().map(Value::Float),
            _ => None,
        };
        if let Some(cast) = cast {
            result = cast;
        }
    }
    result
}

fn command_signature(command: &str, args: &[Value], flags: &[(Arc<str>, Value)]) -> String {
    let parts: Vec<String> = args
        .iter()
        .map(ToString::to_string)
        .chain(flags.iter().map(|(name, value)| format!("{}={}", name, value)))
        .collect();
    format!("{}({})", command, parts.join(", "))
}

fn method_signature(binding: &MethodBinding, slots: &[Value]) -> String {
    let parts: Vec<String> = slots.iter().map(ToString::to_string).collect();
    format!("{}.{}({})", binding.api_class, binding.method, parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCommand, MockFlag, MockHost};
    use hostbind_meta::{ApiClassInfo, Mode};

    fn conversions() -> ConversionRegistry {
        ConversionRegistry::with_defaults(&["M"], &|_: &str| false)
    }

    fn radius_flag() -> FlagInfo {
        FlagInfo::new("radius", "r", ArgType::Single(Primitive::Length))
    }

    fn host_with_sphere() -> (MockHost, String) {
        let mut host = MockHost::new("2026");
        host.add_entity_type("sphere", None);
        host.add_command(
            "sphere",
            MockCommand::creating("sphere").with_flag(
                MockFlag::new("radius", "r", "Length")
                    .with_modes(&[Mode::Create, Mode::Query, Mode::Edit])
                    .with_default(Value::Float(1.0))
                    .query_as_list(),
            ),
        );
        let node = host.create_node("sphere");
        (host, node)
    }

    fn flag_binding(flag: FlagInfo) -> FlagBinding {
        FlagBinding {
            command: Arc::from("sphere"),
            flag,
        }
    }

    #[test]
    fn test_query_applies_corrections() {
        let (mut host, node) = host_with_sphere();
        let conversions = conversions();
        let mut undo = UndoCoordinator::new();
        let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
        let this = Value::str(&node);

        let raw = Callable::new("getRadius", vec![], "", CallableKind::FlagQuery(flag_binding(radius_flag())));
        assert_eq!(
            raw.invoke(&mut cx, Some(&this), &[]).ok(),
            Some(Value::List(vec![Value::Float(1.0)]))
        );

        let mut flag = radius_flag();
        flag.result_needs_unpacking = true;
        let fixed = Callable::new("getRadius", vec![], "", CallableKind::FlagQuery(flag_binding(flag)));
        assert_eq!(fixed.invoke(&mut cx, Some(&this), &[]).ok(), Some(Value::Float(1.0)));

        assert!(matches!(
            fixed.invoke(&mut cx, Some(&this), &[Value::Int(1)]),
            Err(CallError::Arity { expected: 0, given: 1, .. })
        ));
        assert!(matches!(
            fixed.invoke(&mut cx, None, &[]),
            Err(CallError::MissingInstance { .. })
        ));
    }

    #[test]
    fn test_edit_then_query() {
        let (mut host, node) = host_with_sphere();
        let conversions = conversions();
        let mut undo = UndoCoordinator::new();
        let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
        let this = Value::str(&node);

        let set = Callable::new(
            "setRadius",
            vec![Param::required("val")],
            "",
            CallableKind::FlagEdit(flag_binding(radius_flag())),
        );
        assert!(set.invoke(&mut cx, Some(&this), &[Value::Float(2.5)]).is_ok());
        assert!(set
            .call_kw(&mut cx, Some(&this), &[], &[("val", Value::Float(3.0))])
            .is_ok());
        assert!(matches!(
            set.call_kw(&mut cx, Some(&this), &[], &[("value", Value::Float(3.0))]),
            Err(CallError::UnexpectedKeyword { .. })
        ));
        assert!(matches!(
            set.call_kw(&mut cx, Some(&this), &[Value::Int(1)], &[("val", Value::Float(3.0))]),
            Err(CallError::MultipleValues { .. })
        ));
        assert_eq!(host.node_attr(&node, "radius"), Some(&Value::Float(3.0)));
    }

    #[test]
    fn test_create_flag_arity_shapes() {
        let (mut host, _) = host_with_sphere();
        let conversions = conversions();
        let mut undo = UndoCoordinator::new();
        let mut cx = CallContext::new(&mut host, &conversions, &mut undo);

        let create = Callable::new(
            "radius",
            vec![Param::required("val")],
            "",
            CallableKind::FlagCreate(flag_binding(radius_flag())),
        );
        let created = create.invoke(&mut cx, None, &[Value::Float(4.0)]);
        assert!(matches!(created, Ok(Value::Str(_))));
        let Ok(Value::Str(name)) = created else {
            return;
        };
        assert!(matches!(
            create.invoke(&mut cx, None, &[Value::Float(1.0), Value::Float(2.0)]),
            Err(CallError::Arity { .. })
        ));
        assert_eq!(host.node_attr(&name, "radius"), Some(&Value::Float(4.0)));
    }

    #[test]
    fn test_multi_create_flag_needs_every_element() {
        let (mut host, _) = host_with_sphere();
        let conversions = conversions();
        let mut undo = UndoCoordinator::new();
        let pivot = FlagInfo::new(
            "pivot",
            "p",
            ArgType::from_tokens(&[Primitive::Length, Primitive::Length, Primitive::Length]),
        );
        let create = Callable::new(
            "pivot",
            vec![Param::required("val1"), Param::required("val2"), Param::required("val3")],
            "",
            CallableKind::FlagCreate(flag_binding(pivot)),
        );

        let calls = host.calls.len();
        let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
        for args in [vec![Value::Float(1.0)], vec![Value::Float(1.0), Value::Float(2.0)]] {
            assert!(matches!(
                create.invoke(&mut cx, None, &args),
                Err(CallError::Arity { expected: 3, .. })
            ));
        }
        assert_eq!(host.calls.len(), calls);
    }

    #[test]
    fn test_command_keywords_are_validated() {
        let (mut host, _) = host_with_sphere();
        let conversions = conversions();
        let mut undo = UndoCoordinator::new();

        let mut info = CommandInfo::new("sphere");
        info.add_flag(radius_flag());
        let sphere = Callable::new(
            "sphere",
            vec![],
            "",
            CallableKind::Command(CommandBinding { info: Rc::new(info) }),
        );

        let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
        let created = sphere.call_kw(&mut cx, None, &[], &[("r", Value::Float(2.0))]);
        assert!(matches!(created, Ok(Value::Str(_))));

        let err = sphere.call_kw(&mut cx, None, &[], &[("height", Value::Float(2.0))]);
        assert!(matches!(
            err,
            Err(CallError::UnknownFlag { ref flag, .. }) if flag == "height"
        ));
        assert!(host.calls.iter().all(|call| !call.contains("height")));
    }

    fn transform_host() -> (MockHost, String) {
        let mut host = MockHost::new("2026");
        host.add_entity_type("transform", None);
        let mut class = ApiClassInfo::new("MFnTransform");
        class.add_enum("Space", &["kInvalid", "kTransform", "kWorld"]);
        class.add_overload(
            "rotateOrder",
            MethodInfo {
                args: vec![ArgInfo::output("order", TypeRef::enumeration("MFnTransform", "Space"))],
                ..Default::default()
            },
        );
        host.add_api_class(class);
        host.add_method("MFnTransform", "rotateOrder", |_, args| {
            if let Some(slot) = args.first_mut() {
                *slot = Value::Int(2);
            }
            Ok(Value::Null)
        });
        host.add_method("MFnTransform", "scaleBy", |attrs, args| {
            let factor = args.first().and_then(Value::as_f64).unwrap_or(1.0);
            attrs.insert("scale".to_string(), Value::Float(factor));
            Ok(Value::Float(factor * 2.0))
        });
        let node = host.create_node("transform");
        (host, node)
    }

    fn method(name: &str, info: MethodInfo, enums: BTreeMap<(Arc<str>, Arc<str>), ApiEnum>) -> Callable {
        let params = info.in_arg_names().iter().map(|n| Param::required(n)).collect();
        Callable::new(
            name,
            params,
            "",
            CallableKind::ApiMethod(MethodBinding {
                api_class: Arc::from("MFnTransform"),
                method: Arc::from(name),
                overload: 0,
                info,
                self_type: None,
                enums,
                proxy: false,
                undo: None,
            }),
        )
    }

    #[test]
    fn test_method_arity_and_outputs() {
        let (mut host, node) = transform_host();
        let conversions = conversions();
        let mut undo = UndoCoordinator::new();
        let this = Value::str(&node);

        let scale = method(
            "scaleBy",
            MethodInfo {
                args: vec![ArgInfo::input("factor", TypeRef::named("double"))],
                return_type: Some(TypeRef::named("double")),
                ..Default::default()
            },
            BTreeMap::new(),
        );
        {
            let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
            assert_eq!(scale.invoke(&mut cx, Some(&this), &[Value::Int(3)]).ok(), Some(Value::Float(6.0)));
            assert!(matches!(
                scale.invoke(&mut cx, Some(&this), &[]),
                Err(CallError::Arity { expected: 1, given: 0, .. })
            ));
            assert!(matches!(
                scale.invoke(&mut cx, Some(&this), &[Value::Int(1), Value::Int(2)]),
                Err(CallError::Arity { expected: 1, given: 2, .. })
            ));
        }
        assert_eq!(host.node_attr(&node, "scale"), Some(&Value::Float(3.0)));
        assert_eq!(host.calls.len(), 1);
    }

    #[test]
    fn test_enum_output_uses_display_name() {
        let (mut host, node) = transform_host();
        let conversions = conversions();
        let mut undo = UndoCoordinator::new();
        let mut enums = BTreeMap::new();
        enums.insert(
            (Arc::from("MFnTransform"), Arc::from("Space")),
            ApiEnum::from_values(&["kInvalid", "kTransform", "kWorld"]),
        );
        let info = MethodInfo {
            args: vec![ArgInfo::output("order", TypeRef::enumeration("MFnTransform", "Space"))],
            ..Default::default()
        };
        let order = method("rotateOrder", info, enums);
        let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
        assert_eq!(
            order.invoke(&mut cx, Some(&Value::str(&node)), &[]).ok(),
            Some(Value::str("world"))
        );
    }

    #[test]
    fn test_invalid_enum_input() {
        let (mut host, node) = transform_host();
        let conversions = conversions();
        let mut undo = UndoCoordinator::new();
        let mut enums = BTreeMap::new();
        enums.insert(
            (Arc::from("MFnTransform"), Arc::from("Space")),
            ApiEnum::from_values(&["kInvalid", "kTransform", "kWorld"]),
        );
        let info = MethodInfo {
            args: vec![ArgInfo::input("space", TypeRef::enumeration("MFnTransform", "Space"))],
            ..Default::default()
        };
        let call = method("scaleBy", info, enums);
        let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
        let this = Value::str(&node);
        assert!(matches!(
            call.invoke(&mut cx, Some(&this), &[Value::str("kObject")]),
            Err(CallError::InvalidEnum { .. })
        ));
        assert!(matches!(
            call.invoke(&mut cx, Some(&this), &[Value::Int(7)]),
            Err(CallError::InvalidEnum { .. })
        ));
        assert!(call.invoke(&mut cx, Some(&this), &[Value::str("world")]).is_ok());
        assert!(call.invoke(&mut cx, Some(&this), &[Value::str("kTransform")]).is_ok());
    }

    #[test]
    fn test_signature_lists_defaults() {
        let callable = Callable::native(
            "lookAt",
            vec![Param::required("target"), Param::optional("up", Value::floats(&[0.0, 1.0, 0.0]))],
            "",
            |_, _, args| Ok(Value::Int(args.len() as i64)),
        );
        assert_eq!(callable.signature(), "lookAt(target, up=[0, 1, 0])");
        assert_eq!(callable.param_names(), vec!["target", "up"]);
    }
}
