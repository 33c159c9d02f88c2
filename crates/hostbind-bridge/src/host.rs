//! Interface to the live host application
//!
//! Everything the wrapper layer needs from the host goes through [`Host`]:
//! command and API-method dispatch, entity bookkeeping for live probing, the
//! integer attribute that ties the undo coordinator to the host's own undo
//! queue, and plugin introspection. Host callbacks are not invoked directly;
//! the host queues [`HostEvent`]s and the driver drains them.

use crate::errors::HostError;
use crate::units::UnitSettings;
use crate::Value;
use hostbind_meta::MetadataSource;
use std::sync::Arc;

/// One API method dispatch
#[derive(Debug)]
pub struct ApiCall<'a> {
    pub class: &'a str,
    pub method: &'a str,
    /// Index of the overload within the class metadata
    pub overload: usize,
    /// Instance the method runs on, `None` for static methods
    pub target: Option<&'a Value>,
    /// One slot per declared argument; output slots hold placeholders that
    /// the host overwrites
    pub args: &'a mut [Value],
}

/// Notifications the host queues for the wrapper layer
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// An integer attribute changed outside the wrapper layer (undo/redo)
    AttributeChanged {
        node: String,
        attribute: String,
        value: i64,
    },
    PluginLoaded(String),
    PluginUnloaded(String),
    /// New scene or file open
    SceneReset,
}

pub trait Host: MetadataSource {
    /// Run a command; mode flags travel as `("query", true)` / `("edit", true)`
    fn call_command(
        &mut self,
        name: &str,
        args: &[Value],
        flags: &[(Arc<str>, Value)],
    ) -> Result<Value, HostError>;

    fn call_method(&mut self, call: ApiCall<'_>) -> Result<Value, HostError>;

    /// API object a proxy-mode wrapper delegates to
    fn api_delegate(&mut self, this: &Value, api_class: &str) -> Result<Value, HostError>;

    fn unit_settings(&self) -> UnitSettings;

    /// Create an entity without recording undo or changing the selection
    fn create_entity_quiet(&mut self, entity_type: &str) -> Result<Value, HostError>;

    fn delete_entities(&mut self, entities: &[Value]) -> Result<(), HostError>;

    fn list_entities(&self) -> Vec<Value>;

    fn selection(&self) -> Vec<Value>;

    fn set_selection(&mut self, selection: &[Value]) -> Result<(), HostError>;

    fn undo_enabled(&self) -> bool;

    fn set_undo_enabled(&mut self, enabled: bool);

    fn node_exists(&self, name: &str) -> bool;

    /// Create a node carrying one integer attribute, outside the undo queue
    fn create_tracking_node(&mut self, name: &str, attribute: &str) -> Result<(), HostError>;

    fn get_int_attr(&self, node: &str, attribute: &str) -> Result<i64, HostError>;

    /// Set an integer attribute; recorded on the host's undo queue when
    /// undo is enabled
    fn set_int_attr(&mut self, node: &str, attribute: &str, value: i64) -> Result<(), HostError>;

    /// Commands registered by a loaded plugin
    fn plugin_commands(&self, plugin: &str) -> Vec<String>;

    /// Entity types registered by a loaded plugin
    fn plugin_entity_types(&self, plugin: &str) -> Vec<String>;

    fn drain_events(&mut self) -> Vec<HostEvent>;
}
