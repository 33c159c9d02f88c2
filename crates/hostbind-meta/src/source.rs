use crate::types::ApiClassInfo;

/// Authoritative, introspectable view of the live host
///
/// Everything a metadata rebuild needs from the host itself. Documentation is
/// a separate, optional source layered on top of this one.
pub trait MetadataSource {
    /// Version string the metadata cache is keyed by
    fn host_version(&self) -> String;

    fn command_names(&self) -> Vec<String>;

    /// Line-oriented flag synopsis for one command, `None` if the host does not know it
    fn command_synopsis(&self, name: &str) -> Option<String>;

    fn api_class_names(&self) -> Vec<String>;

    fn api_class_info(&self, name: &str) -> Option<ApiClassInfo>;

    fn entity_types(&self) -> Vec<String>;

    /// Inheritance chain of an entity type, root first and including the type itself
    fn inherited_types(&self, entity_type: &str) -> Vec<String>;

    fn ui_types(&self) -> Vec<String> {
        Vec::new()
    }

    /// API class that operates on an entity type
    fn entity_api_class(&self, _entity_type: &str) -> Option<String> {
        None
    }
}
