//! Source id to node id memo for one run.

use std::collections::HashMap;

use graphport_core::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    Unseen,
    /// Node created, relationships still being written.
    Importing,
    Imported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoEntry {
    pub node_id: NodeId,
    pub state: VisitState,
}

/// Every instance imported so far. Entries are never removed, so an
/// instance gets exactly one node per run.
#[derive(Debug, Default)]
pub struct ImportMemo {
    entries: HashMap<i64, MemoEntry>,
}

impl ImportMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, db_id: i64) -> VisitState {
        self.entries
            .get(&db_id)
            .map_or(VisitState::Unseen, |entry| entry.state)
    }

    pub fn node_id(&self, db_id: i64) -> Option<NodeId> {
        self.entries.get(&db_id).map(|entry| entry.node_id)
    }

    /// Remember the node for `db_id` before its relationships are followed.
    pub fn begin(&mut self, db_id: i64, node_id: NodeId) {
        debug_assert!(!self.entries.contains_key(&db_id), "instance {} imported twice", db_id);
        self.entries.insert(
            db_id,
            MemoEntry {
                node_id,
                state: VisitState::Importing,
            },
        );
    }

    pub fn complete(&mut self, db_id: i64) {
        if let Some(entry) = self.entries.get_mut(&db_id) {
            entry.state = VisitState::Imported;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Instances whose relationships are still being written.
    pub fn in_progress(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state == VisitState::Importing)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let mut memo = ImportMemo::new();
        assert_eq!(memo.state(7), VisitState::Unseen);
        assert_eq!(memo.node_id(7), None);

        memo.begin(7, 0);
        assert_eq!(memo.state(7), VisitState::Importing);
        assert_eq!(memo.node_id(7), Some(0));
        assert_eq!(memo.in_progress(), 1);

        memo.complete(7);
        assert_eq!(memo.state(7), VisitState::Imported);
        assert_eq!(memo.in_progress(), 0);
        assert_eq!(memo.len(), 1);
    }
}
