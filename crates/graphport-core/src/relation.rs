//! Relationships that the runtime schema does not store directly.
//!
//! When a relationship attribute is not valid for the runtime class, a few
//! names are still materialized from another attribute. Everything else is
//! skipped as a schema mismatch.

/// The relationship name the source schema historically lacks on purpose.
/// Its absence is expected and is not reported as a mismatch.
pub const LEGACY_SILENT_RELATION: &str = "regulatedBy";

/// Whether a missing `attribute` should be reported as a schema mismatch.
pub fn reports_mismatch(attribute: &str) -> bool {
    attribute != LEGACY_SILENT_RELATION
}

/// Where to read an invalid relationship's targets from instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationStrategy {
    /// Instances referring to this one through `attribute`, emitted under `edge_name`.
    ///
    /// Only one side of a bidirectional relation is stored in the source, so
    /// all aliases share a single edge name and are emitted once per instance.
    InverseOf {
        attribute: &'static str,
        edge_name: &'static str,
    },
    /// Values of `attribute`, materialized only when there is more than one.
    /// A single target has its own canonical meaning captured elsewhere.
    WhenPlural { attribute: &'static str },
}

const STRATEGIES: &[(&str, RelationStrategy)] = &[
    (
        "regulatedBy",
        RelationStrategy::InverseOf {
            attribute: "regulatedEntity",
            edge_name: "regulatedBy",
        },
    ),
    (
        "positivelyRegulatedBy",
        RelationStrategy::InverseOf {
            attribute: "regulatedEntity",
            edge_name: "regulatedBy",
        },
    ),
    (
        "inferredTo",
        RelationStrategy::WhenPlural {
            attribute: "orthologousEvent",
        },
    ),
];

impl RelationStrategy {
    pub fn for_attribute(attribute: &str) -> Option<Self> {
        STRATEGIES
            .iter()
            .find(|(name, _)| *name == attribute)
            .map(|(_, strategy)| *strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regulation_aliases_share_edge() {
        let a = RelationStrategy::for_attribute("regulatedBy").unwrap();
        let b = RelationStrategy::for_attribute("positivelyRegulatedBy").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_only_legacy_name_is_silent() {
        assert!(!reports_mismatch("regulatedBy"));
        assert!(reports_mismatch("positivelyRegulatedBy"));
        assert!(reports_mismatch("inferredTo"));
    }

    #[test]
    fn test_plain_names_have_no_strategy() {
        assert_eq!(RelationStrategy::for_attribute("hasEvent"), None);
    }
}
