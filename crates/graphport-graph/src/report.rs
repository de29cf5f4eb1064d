//! Outcome of an import run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use graphport_core::WarningCounts;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    SucceededWithWarnings,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::SucceededWithWarnings => "succeeded with warnings",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    pub expected_total: u64,
    pub roots_imported: usize,
    pub nodes_created: usize,
    pub relationships_created: usize,
    pub constraints_created: usize,
    pub indexes_created: usize,
    pub warnings: WarningCounts,
}

impl ImportReport {
    pub fn status(&self) -> RunStatus {
        if self.warnings.is_empty() {
            RunStatus::Succeeded
        } else {
            RunStatus::SucceededWithWarnings
        }
    }
}

/// Format as "M min S sec MS ms".
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    format!(
        "{} min {} sec {} ms",
        millis / 60_000,
        (millis / 1_000) % 60,
        millis % 1_000
    )
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}
