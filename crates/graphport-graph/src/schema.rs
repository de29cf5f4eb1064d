//! Deferred constraints and indexes, created once all data is loaded.

use graphport_core::{GraphSink, ImportWarning, SinkError, WarningCounts};
use tracing::info;

/// Labels whose nodes are unique by `dbId` and by `stableIdentifier`.
pub const CONSTRAINED_LABELS: &[&str] = &[
    "Event",
    "Pathway",
    "ReactionLikeEvent",
    "Reaction",
    "PhysicalEntity",
    "Complex",
    "EntitySet",
    "GenomeEncodedEntity",
    "EntityWithAccessionedSequence",
    "ReferenceEntity",
    "ReferenceSequence",
];

pub const UNIQUE_PROPERTIES: &[&str] = &["dbId", "stableIdentifier"];

/// (label, property) pairs that get a lookup index.
pub const INDEXED: &[(&str, &str)] = &[
    ("ReferenceEntity", "identifier"),
    ("ReferenceSequence", "identifier"),
];

/// How much of the deferred schema was established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaOutcome {
    pub constraints_created: usize,
    pub indexes_created: usize,
}

/// Create every deferred constraint and index.
///
/// Best-effort: a statement the sink refuses is recorded as a
/// constraint conflict and the rest are still attempted.
pub async fn create_deferred_schema<S: GraphSink + ?Sized>(sink: &mut S, warnings: &mut WarningCounts) -> SchemaOutcome {
    let mut outcome = SchemaOutcome::default();

    for label in CONSTRAINED_LABELS {
        for property in UNIQUE_PROPERTIES {
            match sink.create_uniqueness_constraint(label, property).await {
                Ok(()) => outcome.constraints_created += 1,
                Err(e) => warnings.record(conflict(label, property, e)),
            }
        }
    }

    for (label, property) in INDEXED {
        match sink.create_index(label, property).await {
            Ok(()) => outcome.indexes_created += 1,
            Err(e) => warnings.record(conflict(label, property, e)),
        }
    }

    info!(
        constraints = outcome.constraints_created,
        indexes = outcome.indexes_created,
        "Deferred schema created"
    );
    outcome
}

fn conflict(label: &str, property: &str, err: SinkError) -> ImportWarning {
    ImportWarning::ConstraintConflict {
        label: label.to_string(),
        property: property.to_string(),
        reason: err.to_string(),
    }
}
