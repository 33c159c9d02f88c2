//! Incremental command updates
//!
//! Plugin loads and partial rebuilds hand over a batch of freshly parsed
//! commands. Pre-computed content hashes let the store skip entries that did
//! not change.

use crate::store::MetadataStore;
use crate::types::CommandInfo;
use std::sync::Arc;

// =============================================================================
// SYNC RESULT
// =============================================================================

/// Result of a merge operation
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub inserted: Vec<Arc<str>>,
    pub updated: Vec<Arc<str>>,
    pub unchanged: usize,
}

impl SyncResult {
    pub fn changed(&self) -> usize {
        self.inserted.len() + self.updated.len()
    }
}

// =============================================================================
// CHANGE TRACKING
// =============================================================================

#[derive(Debug)]
enum Change {
    Insert(CommandInfo),
    Update(CommandInfo),
}

fn compute_changes(store: &MetadataStore, new: Vec<CommandInfo>) -> (Vec<Change>, usize) {
    let mut unchanged = 0;
    let changes = new
        .into_iter()
        .filter_map(|mut cmd| {
            cmd.compute_hash();
            match store.commands.get(&cmd.name) {
                Some(old) if old.content_hash == cmd.content_hash => {
                    unchanged += 1;
                    None
                }
                Some(_) => Some(Change::Update(cmd)),
                None => Some(Change::Insert(cmd)),
            }
        })
        .collect();
    (changes, unchanged)
}

/// Merge a batch of commands into the store
pub fn merge_commands(store: &mut MetadataStore, commands: Vec<CommandInfo>) -> SyncResult {
    let (changes, unchanged) = compute_changes(store, commands);
    let mut result = SyncResult {
        unchanged,
        ..Default::default()
    };

    for change in changes {
        match change {
            Change::Insert(cmd) => {
                result.inserted.push(cmd.name.clone());
                store.insert_command(cmd);
            }
            Change::Update(cmd) => {
                result.updated.push(cmd.name.clone());
                store.insert_command(cmd);
            }
        }
    }

    if result.changed() > 0 {
        store.refresh_node_commands();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArgType, FlagInfo, Primitive};

    fn command(name: &str, flag: &str) -> CommandInfo {
        let mut cmd = CommandInfo::new(name);
        cmd.add_flag(FlagInfo::new(flag, "", ArgType::Toggle));
        cmd
    }

    #[test]
    fn test_merge_counts() {
        let mut store = MetadataStore::new("2026");
        let first = merge_commands(&mut store, vec![command("a", "x"), command("b", "y")]);
        assert_eq!(first.inserted.len(), 2);
        assert_eq!(first.unchanged, 0);

        let mut changed = command("b", "y");
        changed.add_flag(FlagInfo::new("z", "z", ArgType::Single(Primitive::Int)));
        let second = merge_commands(&mut store, vec![command("a", "x"), changed]);
        assert_eq!(second.unchanged, 1);
        assert_eq!(second.updated, vec![Arc::<str>::from("b")]);
        assert!(second.inserted.is_empty());
        assert!(store
            .get_command_info("b")
            .is_ok_and(|c| c.flag("z").is_some()));
    }

    #[test]
    fn test_merge_refreshes_node_commands() {
        let mut store = MetadataStore::new("2026");
        store.hierarchy.insert_chain(&["node", "spreadSheetNode"]);
        merge_commands(&mut store, vec![command("spreadSheetNode", "name")]);
        assert_eq!(store.node_commands.len(), 1);
    }
}
