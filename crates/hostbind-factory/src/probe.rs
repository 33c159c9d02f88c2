//! Live probing of flag modes
//!
//! Flags whose modes no documentation declared are exercised against a
//! throwaway entity: query first, compare the answer's shape with the
//! declared argument shape, then edit with the observed (or a synthesized)
//! value. Everything the probe creates is deleted again and the host's
//! selection and undo flag are restored on every exit path.
//!
//! Probing never fails as a whole. Each problem is recorded as a
//! [`ProbeFailure`] and leaves that flag's metadata incomplete.

use hostbind_bridge::{Host, HostError, Value};
use hostbind_meta::{ArgType, FlagInfo, MetadataStore, Mode, Primitive};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::slice;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeFailure {
    UnknownCommand(String),
    NoEntity { entity_type: String, reason: String },
    Query { command: String, flag: String, reason: String },
    Edit { command: String, flag: String, reason: String },
    /// The query answer matched no recognized correction and was discarded
    Shape { command: String, flag: String, found: &'static str },
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::UnknownCommand(name) => write!(f, "unknown command {}", name),
            ProbeFailure::NoEntity {
                entity_type,
                reason,
            } => write!(f, "could not create a {}: {}", entity_type, reason),
            ProbeFailure::Query {
                command,
                flag,
                reason,
            } => write!(f, "{} -query -{} failed: {}", command, flag, reason),
            ProbeFailure::Edit {
                command,
                flag,
                reason,
            } => write!(f, "{} -edit -{} failed: {}", command, flag, reason),
            ProbeFailure::Shape {
                command,
                flag,
                found,
            } => write!(f, "{} -query -{} returned an unexpected {}", command, flag, found),
        }
    }
}

#[derive(Debug, Default)]
pub struct ProbeReport {
    pub commands: usize,
    pub flags: usize,
    pub queryable: usize,
    pub editable: usize,
    pub invalid: usize,
    pub failures: Vec<ProbeFailure>,
}

impl ProbeReport {
    fn fail(&mut self, failure: ProbeFailure) {
        debug!("Probe: {}", failure);
        self.failures.push(failure);
    }

    fn absorb(&mut self, other: ProbeReport) {
        self.commands += other.commands;
        self.flags += other.flags;
        self.queryable += other.queryable;
        self.editable += other.editable;
        self.invalid += other.invalid;
        self.failures.extend(other.failures);
    }
}

/// Side effects allowed while probing. Dropping the scope deletes entities
/// created since [`ProbeScope::enter`] and restores selection and undo state.
pub struct ProbeScope<'h> {
    host: &'h mut dyn Host,
    selection: Vec<Value>,
    undo_enabled: bool,
    existing: BTreeSet<String>,
}

impl<'h> ProbeScope<'h> {
    pub fn enter(host: &'h mut dyn Host) -> Self {
        let selection = host.selection();
        let undo_enabled = host.undo_enabled();
        let existing = host.list_entities().iter().map(ToString::to_string).collect();
        host.set_undo_enabled(false);
        Self {
            host,
            selection,
            undo_enabled,
            existing,
        }
    }

    pub fn host(&mut self) -> &mut dyn Host {
        &mut *self.host
    }
}

impl Drop for ProbeScope<'_> {
    fn drop(&mut self) {
        let created: Vec<Value> = self
            .host
            .list_entities()
            .into_iter()
            .filter(|entity| !self.existing.contains(&entity.to_string()))
            .collect();
        if !created.is_empty() {
            if let Err(e) = self.host.delete_entities(&created) {
                debug!("Probe cleanup could not delete {} entities: {}", created.len(), e);
            }
        }
        if let Err(e) = self.host.set_selection(&self.selection) {
            debug!("Probe cleanup could not restore the selection: {}", e);
        }
        self.host.set_undo_enabled(self.undo_enabled);
    }
}

/// Probe every node-creating command, plus the exception table's
/// (entity type -> command) pairs
pub fn probe_store(
    host: &mut dyn Host,
    store: &mut MetadataStore,
    exceptions: &BTreeMap<String, String>,
) -> ProbeReport {
    let mut targets: Vec<(String, String)> = store
        .node_commands
        .iter()
        .map(|name| (name.to_string(), name.to_string()))
        .collect();
    for (entity_type, command) in exceptions {
        if store.has_command(command) && store.hierarchy.contains(entity_type) {
            targets.push((command.clone(), entity_type.clone()));
        }
    }

    let mut report = ProbeReport::default();
    for (command, entity_type) in targets {
        report.absorb(probe_command(host, store, &command, &entity_type));
    }
    info!(
        "Probed {} flags on {} commands: {} queryable, {} editable, {} invalid, {} problems",
        report.flags,
        report.commands,
        report.queryable,
        report.editable,
        report.invalid,
        report.failures.len()
    );
    report
}

/// Probe the flags of `command` that have no known modes, against a fresh
/// entity of `entity_type`
pub fn probe_command(
    host: &mut dyn Host,
    store: &mut MetadataStore,
    command: &str,
    entity_type: &str,
) -> ProbeReport {
    let mut report = ProbeReport::default();
    let pending: Vec<FlagInfo> = match store.get_command_info(command) {
        Ok(info) => info
            .flags
            .values()
            .filter(|flag| !flag.has_documented_modes() && !flag.invalid)
            .cloned()
            .collect(),
        Err(_) => {
            report.fail(ProbeFailure::UnknownCommand(command.to_string()));
            return report;
        }
    };
    if pending.is_empty() {
        return report;
    }

    let mut scope = ProbeScope::enter(host);
    let target = match scope.host().create_entity_quiet(entity_type) {
        Ok(target) => target,
        Err(e) => {
            report.fail(ProbeFailure::NoEntity {
                entity_type: entity_type.to_string(),
                reason: e.to_string(),
            });
            return report;
        }
    };

    report.commands += 1;
    for mut flag in pending {
        probe_flag(scope.host(), command, &target, &mut flag, &mut report);
        if let Ok(info) = store.get_command_info_mut(command) {
            if let Some(slot) = info.flag_mut(&flag.long_name) {
                *slot = flag;
            }
        }
    }
    report
}

fn probe_flag(
    host: &mut dyn Host,
    command: &str,
    target: &Value,
    flag: &mut FlagInfo,
    report: &mut ProbeReport,
) {
    report.flags += 1;
    let name = flag.long_name.clone();

    let query = [
        (name.clone(), Value::Bool(true)),
        (Arc::from("query"), Value::Bool(true)),
    ];
    let observed = match host.call_command(command, slice::from_ref(target), &query) {
        Ok(value) => {
            flag.add_mode(Mode::Query);
            report.queryable += 1;
            let found = value.kind();
            let corrected = correct_shape(flag, value);
            if corrected.is_none() {
                report.fail(ProbeFailure::Shape {
                    command: command.to_string(),
                    flag: name.to_string(),
                    found,
                });
            }
            corrected
        }
        Err(HostError::InvalidFlag { .. }) => {
            flag.invalid = true;
            report.invalid += 1;
            return;
        }
        Err(e) => {
            report.fail(ProbeFailure::Query {
                command: command.to_string(),
                flag: name.to_string(),
                reason: e.to_string(),
            });
            None
        }
    };

    let value = observed.unwrap_or_else(|| default_value(&flag.arg_type));
    let edit = [(name.clone(), value), (Arc::from("edit"), Value::Bool(true))];
    match host.call_command(command, slice::from_ref(target), &edit) {
        Ok(_) => {
            flag.add_mode(Mode::Edit);
            report.editable += 1;
        }
        Err(e) => report.fail(ProbeFailure::Edit {
            command: command.to_string(),
            flag: name.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Match a query answer against the declared shape, recording the
/// correction that makes it fit. `None` when no recognized correction does.
fn correct_shape(flag: &mut FlagInfo, value: Value) -> Option<Value> {
    if shape_matches(&flag.arg_type, &value) {
        return Some(value);
    }

    let mut value = value;
    let mut unpack = false;
    if !matches!(flag.arg_type, ArgType::Multi(_)) {
        if let Value::List(items) = &value {
            if let [single] = items.as_slice() {
                value = single.clone();
                unpack = true;
            }
        }
    }

    let mut cast = false;
    if !shape_matches(&flag.arg_type, &value) {
        let wants_bool = matches!(
            flag.arg_type,
            ArgType::Toggle | ArgType::Single(Primitive::Bool)
        );
        match value.as_bool() {
            Some(b) if wants_bool && value.is_numeric() => {
                value = Value::Bool(b);
                cast = true;
            }
            _ => return None,
        }
    }

    flag.result_needs_unpacking |= unpack;
    flag.result_needs_casting |= cast;
    Some(value)
}

fn shape_matches(arg_type: &ArgType, value: &Value) -> bool {
    match arg_type {
        ArgType::Toggle => matches!(value, Value::Bool(_)),
        ArgType::Single(p) => primitive_matches(p, value),
        ArgType::Multi(items) => value.as_list().is_some_and(|list| {
            list.len() == items.len() && items.iter().zip(list).all(|(p, v)| primitive_matches(p, v))
        }),
    }
}

fn primitive_matches(primitive: &Primitive, value: &Value) -> bool {
    match primitive {
        Primitive::Bool => matches!(value, Value::Bool(_)),
        Primitive::Int => matches!(value, Value::Int(_)),
        Primitive::Float | Primitive::Length | Primitive::Angle | Primitive::Time => {
            matches!(value, Value::Int(_) | Value::Float(_))
        }
        Primitive::Str | Primitive::Script | Primitive::Node => matches!(value, Value::Str(_)),
        Primitive::Other(_) => !value.is_null(),
    }
}

fn default_value(arg_type: &ArgType) -> Value {
    match arg_type {
        ArgType::Toggle => Value::Bool(false),
        ArgType::Single(p) => primitive_default(p),
        ArgType::Multi(items) => Value::List(items.iter().map(primitive_default).collect()),
    }
}

fn primitive_default(primitive: &Primitive) -> Value {
    match primitive {
        Primitive::Bool => Value::Bool(false),
        Primitive::Int => Value::Int(0),
        // Zero sizes are commonly rejected by geometry commands
        Primitive::Float | Primitive::Length | Primitive::Angle | Primitive::Time => {
            Value::Float(1.0)
        }
        Primitive::Str | Primitive::Script | Primitive::Node => Value::str(""),
        Primitive::Other(_) => Value::Null,
    }
}
