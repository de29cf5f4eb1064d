//! Non-fatal conditions recorded during an import run.
//!
//! Every warning is logged where it happens and counted by kind, so a run
//! that completes with any of them is reported as "succeeded with warnings".

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, error, warn};

/// Category of a non-fatal import condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    SchemaMismatch,
    MissingRequiredField,
    DerivationFailure,
    RelationFailure,
    ConstraintConflict,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaMismatch => "schema_mismatch",
            Self::MissingRequiredField => "missing_required_field",
            Self::DerivationFailure => "derivation_failure",
            Self::RelationFailure => "relation_failure",
            Self::ConstraintConflict => "constraint_conflict",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single non-fatal condition with enough context to find the instance.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportWarning {
    SchemaMismatch {
        class: String,
        attribute: String,
    },
    MissingRequiredField {
        db_id: i64,
        field: String,
    },
    DerivationFailure {
        db_id: i64,
        attribute: String,
        reason: String,
        /// The related instance simply does not exist (as opposed to a read failure).
        absent: bool,
    },
    RelationFailure {
        db_id: i64,
        display_name: String,
        attribute: String,
        reason: String,
    },
    ConstraintConflict {
        label: String,
        property: String,
        reason: String,
    },
}

impl ImportWarning {
    pub fn kind(&self) -> WarningKind {
        match self {
            Self::SchemaMismatch { .. } => WarningKind::SchemaMismatch,
            Self::MissingRequiredField { .. } => WarningKind::MissingRequiredField,
            Self::DerivationFailure { .. } => WarningKind::DerivationFailure,
            Self::RelationFailure { .. } => WarningKind::RelationFailure,
            Self::ConstraintConflict { .. } => WarningKind::ConstraintConflict,
        }
    }

    /// Emit the warning at the level its category calls for.
    pub fn log(&self) {
        match self {
            Self::SchemaMismatch { class, attribute } => {
                warn!(%class, %attribute, "{} is not a valid attribute for instance {}", attribute, class);
            }
            Self::MissingRequiredField { db_id, field } => {
                error!(db_id, %field, "Found an entry without {}", field);
            }
            Self::DerivationFailure { db_id, attribute, reason, absent: true } => {
                debug!(db_id, %attribute, %reason, "Derived property omitted");
            }
            Self::DerivationFailure { db_id, attribute, reason, absent: false } => {
                warn!(db_id, %attribute, %reason, "Could not derive property");
            }
            Self::RelationFailure { db_id, display_name, attribute, reason } => {
                error!(
                    db_id,
                    %attribute,
                    "A problem occurred when trying to retrieve data from instance {} {} with attribute name {}: {}",
                    db_id, display_name, attribute, reason
                );
            }
            Self::ConstraintConflict { label, property, reason } => {
                warn!(%label, %property, %reason, "Could not create constraint on {} {}", label, property);
            }
        }
    }
}

/// Per-kind warning tally for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WarningCounts {
    counts: BTreeMap<WarningKind, usize>,
}

impl WarningCounts {
    /// Log the warning and count it.
    pub fn record(&mut self, warning: ImportWarning) {
        warning.log();
        *self.counts.entry(warning.kind()).or_insert(0) += 1;
    }

    pub fn get(&self, kind: WarningKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (WarningKind, usize)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }
}
