//! Collapse repeated relationship targets into counted entries.
//!
//! The same input of a reaction can be listed several times. Instead of
//! writing one edge per occurrence, occurrences are grouped by source id
//! and the count is stored on a single edge.

use std::collections::HashMap;

use crate::SourceInstance;

/// A distinct relationship target and how often it occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct Stoichiometry {
    /// First-seen handle for the target id.
    pub target: SourceInstance,
    pub count: usize,
}

impl Stoichiometry {
    pub fn db_id(&self) -> i64 {
        self.target.db_id
    }
}

/// Group raw targets by identity, in order of first occurrence.
pub fn aggregate(targets: Vec<SourceInstance>) -> Vec<Stoichiometry> {
    let mut positions: HashMap<i64, usize> = HashMap::with_capacity(targets.len());
    let mut grouped: Vec<Stoichiometry> = Vec::new();

    for target in targets {
        match positions.get(&target.db_id) {
            Some(&index) => grouped[index].count += 1,
            None => {
                positions.insert(target.db_id, grouped.len());
                grouped.push(Stoichiometry { target, count: 1 });
            }
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(db_id: i64, name: &str) -> SourceInstance {
        SourceInstance::new(db_id, "SimpleEntity", Some(name.to_string()))
    }

    #[test]
    fn test_repeated_targets_counted() {
        let grouped = aggregate(vec![inst(1, "X"), inst(1, "X"), inst(2, "Y"), inst(1, "X")]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].db_id(), 1);
        assert_eq!(grouped[0].count, 3);
        assert_eq!(grouped[1].db_id(), 2);
        assert_eq!(grouped[1].count, 1);
    }

    #[test]
    fn test_first_seen_handle_retained() {
        let grouped = aggregate(vec![inst(5, "first"), inst(5, "second")]);
        assert_eq!(grouped[0].target.display_name.as_deref(), Some("first"));
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::new()).is_empty());
    }
}
