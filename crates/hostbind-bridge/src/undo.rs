//! Undo Coordinator
//!
//! API setters are invisible to the host's undo queue. Each recorded setter
//! call bumps an integer attribute on a tracking node; that attribute write
//! is what the host's queue records. When the user undoes or redoes, the host
//! reports the attribute moving down or up and the coordinator replays the
//! matching item through the setter.

use crate::callable::{CallContext, Callable};
use crate::conversion::ConversionRegistry;
use crate::errors::{CallError, HostError};
use crate::host::Host;
use crate::Value;
use std::rc::Rc;
use tracing::{debug, warn};

pub const TRACKING_NODE: &str = "__hostbindUndoTracker";
pub const TRACKING_ATTRIBUTE: &str = "cmdCount";

/// One recorded setter call
#[derive(Debug, Clone)]
pub struct UndoItem {
    pub setter: Rc<Callable>,
    pub this: Option<Value>,
    pub redo_args: Vec<Value>,
    pub undo_args: Vec<Value>,
}

impl UndoItem {
    pub fn new(
        setter: Rc<Callable>,
        this: Option<Value>,
        redo_args: Vec<Value>,
        undo_args: Vec<Value>,
    ) -> Self {
        Self {
            setter,
            this,
            redo_args,
            undo_args,
        }
    }

    pub fn undo_it(&self, cx: &mut CallContext<'_>) -> Result<Value, CallError> {
        self.setter.invoke(cx, self.this.as_ref(), &self.undo_args)
    }

    pub fn redo_it(&self, cx: &mut CallContext<'_>) -> Result<Value, CallError> {
        self.setter.invoke(cx, self.this.as_ref(), &self.redo_args)
    }
}

#[derive(Debug)]
pub struct UndoCoordinator {
    undo_stack: Vec<UndoItem>,
    redo_stack: Vec<UndoItem>,
    /// Off while an item replays, so the setter does not record itself
    cb_enabled: bool,
    count: i64,
}

impl Default for UndoCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoCoordinator {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            cb_enabled: true,
            count: 0,
        }
    }

    /// Setters record undo items only while this holds
    pub fn is_recording(&self, host: &dyn Host) -> bool {
        self.cb_enabled && host.undo_enabled()
    }

    pub fn undo_items(&self) -> &[UndoItem] {
        &self.undo_stack
    }

    pub fn redo_items(&self) -> &[UndoItem] {
        &self.redo_stack
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    /// Push an item, clear the redo stack and bump the tracking attribute
    pub fn append(&mut self, host: &mut dyn Host, item: UndoItem) -> Result<(), HostError> {
        self.ensure_tracking_node(host)?;
        self.count += 1;
        host.set_int_attr(TRACKING_NODE, TRACKING_ATTRIBUTE, self.count)?;
        self.undo_stack.push(item);
        self.redo_stack.clear();
        Ok(())
    }

    /// Recreate the tracking node when it went missing, and resynchronize
    /// when its value was changed behind our back
    fn ensure_tracking_node(&mut self, host: &mut dyn Host) -> Result<(), HostError> {
        if !host.node_exists(TRACKING_NODE) {
            debug!("Creating undo tracking node {}", TRACKING_NODE);
            host.create_tracking_node(TRACKING_NODE, TRACKING_ATTRIBUTE)?;
            self.reset(host.get_int_attr(TRACKING_NODE, TRACKING_ATTRIBUTE).unwrap_or(0));
            return Ok(());
        }
        match host.get_int_attr(TRACKING_NODE, TRACKING_ATTRIBUTE) {
            Ok(value) if value == self.count => {}
            Ok(value) => {
                warn!(
                    "Undo tracking attribute moved outside the undo queue ({} != {}), resetting",
                    value, self.count
                );
                self.reset(value);
            }
            Err(e) => {
                warn!("Undo tracking node is unusable ({}), recreating", e);
                host.delete_entities(&[Value::str(TRACKING_NODE)])?;
                host.create_tracking_node(TRACKING_NODE, TRACKING_ATTRIBUTE)?;
                self.reset(0);
            }
        }
        Ok(())
    }

    fn reset(&mut self, count: i64) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.count = count;
    }

    /// Clear both stacks (new scene, file open)
    pub fn flush(&mut self) {
        debug!(
            "Flushing {} undo and {} redo items",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// The tracking attribute changed to `value`; replay one item per step
    /// moved. Returns the number of items replayed. A failed replay still
    /// moves its item and the remaining steps run; the first failure is
    /// returned at the end.
    pub fn handle_change(
        &mut self,
        host: &mut dyn Host,
        conversions: &ConversionRegistry,
        value: i64,
    ) -> Result<usize, CallError> {
        if !self.cb_enabled {
            return Ok(0);
        }
        let mut replayed = 0;
        let mut failure = None;
        while self.count != value {
            let undoing = value < self.count;
            let item = if undoing {
                self.count -= 1;
                self.undo_stack.pop()
            } else {
                self.count += 1;
                self.redo_stack.pop()
            };
            let Some(item) = item else {
                debug!("No undo item for tracking value {}", self.count);
                continue;
            };

            self.cb_enabled = false;
            let result = {
                let mut cx = CallContext::new(host, conversions, self);
                if undoing {
                    item.undo_it(&mut cx)
                } else {
                    item.redo_it(&mut cx)
                }
            };
            self.cb_enabled = true;

            if undoing {
                self.redo_stack.push(item);
            } else {
                self.undo_stack.push(item);
            }
            match result {
                Ok(_) => replayed += 1,
                Err(e) => {
                    warn!("Replay at tracking value {} failed: {}", self.count, e);
                    failure.get_or_insert(e);
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(replayed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Param;
    use crate::host::ApiCall;
    use crate::testing::MockHost;

    /// Setter that writes its argument through an API method, which the
    /// host's own undo queue does not see
    fn setter() -> Rc<Callable> {
        Rc::new(Callable::native(
            "setValue",
            vec![Param::required("value")],
            "",
            |cx, this, args| {
                let node = this.and_then(Value::as_str).unwrap_or_default();
                if cx.undo.is_recording(&*cx.host) {
                    let old = cx.host.get_int_attr(node, "value").unwrap_or_default();
                    let item = UndoItem::new(setter(), this.cloned(), args.to_vec(), vec![Value::Int(old)]);
                    cx.undo.append(cx.host, item)?;
                }
                let mut slots = args.to_vec();
                cx.host.call_method(ApiCall {
                    class: "MFnTest",
                    method: "setValue",
                    overload: 0,
                    target: this,
                    args: &mut slots,
                })?;
                Ok(Value::Null)
            },
        ))
    }

    fn host() -> (MockHost, Value) {
        let mut host = MockHost::new("2026");
        host.add_method("MFnTest", "setValue", |attrs, args| {
            if let Some(value) = args.first() {
                attrs.insert("value".to_string(), value.clone());
            }
            Ok(Value::Null)
        });
        let node = host.create_node("transform");
        (host, Value::str(&node))
    }

    fn node(this: &Value) -> &str {
        this.as_str().unwrap_or_default()
    }

    fn drain(host: &mut MockHost, undo: &mut UndoCoordinator, conversions: &ConversionRegistry) {
        for event in host.drain_events() {
            if let crate::host::HostEvent::AttributeChanged { node, value, .. } = event {
                if node == TRACKING_NODE {
                    assert!(undo.handle_change(host, conversions, value).is_ok());
                }
            }
        }
    }

    #[test]
    fn test_append_creates_tracker_and_clears_redo() {
        let (mut host, this) = host();
        let conversions = ConversionRegistry::default();
        let mut undo = UndoCoordinator::new();

        {
            let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
            assert!(setter().invoke(&mut cx, Some(&this), &[Value::Int(5)]).is_ok());
        }
        assert!(host.node_exists(TRACKING_NODE));
        assert_eq!(undo.undo_items().len(), 1);
        assert_eq!(undo.count(), 1);
        assert_eq!(host.get_int_attr(TRACKING_NODE, TRACKING_ATTRIBUTE), Ok(1));
    }

    #[test]
    fn test_undo_redo_replay_through_setter() {
        let (mut host, this) = host();
        let conversions = ConversionRegistry::default();
        let mut undo = UndoCoordinator::new();

        for value in [3, 8] {
            let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
            assert!(setter().invoke(&mut cx, Some(&this), &[Value::Int(value)]).is_ok());
        }
        drain(&mut host, &mut undo, &conversions);
        assert_eq!(host.get_int_attr(node(&this), "value"), Ok(8));

        assert!(host.undo());
        drain(&mut host, &mut undo, &conversions);
        assert_eq!(host.get_int_attr(node(&this), "value"), Ok(3));
        assert_eq!(undo.redo_items().len(), 1);

        assert!(host.redo());
        drain(&mut host, &mut undo, &conversions);
        assert_eq!(host.get_int_attr(node(&this), "value"), Ok(8));
        assert_eq!(undo.undo_items().len(), 2);
        assert!(undo.redo_items().is_empty());
    }

    #[test]
    fn test_replay_does_not_record() {
        let (mut host, this) = host();
        let conversions = ConversionRegistry::default();
        let mut undo = UndoCoordinator::new();
        {
            let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
            assert!(setter().invoke(&mut cx, Some(&this), &[Value::Int(1)]).is_ok());
        }
        assert!(host.undo());
        drain(&mut host, &mut undo, &conversions);
        assert!(undo.undo_items().is_empty());
        assert_eq!(undo.redo_items().len(), 1);
        assert_eq!(undo.count(), 0);
    }

    #[test]
    fn test_deleted_tracker_is_recreated() {
        let (mut host, this) = host();
        let conversions = ConversionRegistry::default();
        let mut undo = UndoCoordinator::new();
        {
            let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
            assert!(setter().invoke(&mut cx, Some(&this), &[Value::Int(1)]).is_ok());
        }
        assert!(host.delete_entities(&[Value::str(TRACKING_NODE)]).is_ok());
        {
            let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
            assert!(setter().invoke(&mut cx, Some(&this), &[Value::Int(2)]).is_ok());
        }
        assert!(host.node_exists(TRACKING_NODE));
        assert_eq!(undo.undo_items().len(), 1);
        assert_eq!(host.get_int_attr(node(&this), "value"), Ok(2));
    }

    #[test]
    fn test_flush_and_disabled_undo() {
        let (mut host, this) = host();
        let conversions = ConversionRegistry::default();
        let mut undo = UndoCoordinator::new();
        {
            let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
            assert!(setter().invoke(&mut cx, Some(&this), &[Value::Int(1)]).is_ok());
        }
        undo.flush();
        assert!(undo.undo_items().is_empty());

        host.set_undo_enabled(false);
        {
            let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
            assert!(setter().invoke(&mut cx, Some(&this), &[Value::Int(2)]).is_ok());
        }
        assert!(undo.undo_items().is_empty());
    }

    #[test]
    fn test_failed_replay_keeps_stacks_in_step() {
        let (mut host, this) = host();
        let doomed = Value::str(&host.create_node("transform"));
        let conversions = ConversionRegistry::default();
        let mut undo = UndoCoordinator::new();
        for (target, value) in [(&this, 4), (&doomed, 9)] {
            let mut cx = CallContext::new(&mut host, &conversions, &mut undo);
            assert!(setter().invoke(&mut cx, Some(target), &[Value::Int(value)]).is_ok());
        }
        assert!(host.delete_entities(&[doomed.clone()]).is_ok());

        // The newest item fails, the older one still replays
        assert!(undo.handle_change(&mut host, &conversions, 0).is_err());
        assert_eq!(undo.count(), 0);
        assert!(undo.undo_items().is_empty());
        assert_eq!(undo.redo_items().len(), 2);
        assert_eq!(host.get_int_attr(node(&this), "value"), Ok(0));
    }
}
