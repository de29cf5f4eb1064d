//! Source instance handles.

use std::fmt;

/// Handle to one curated object in the source knowledge base.
///
/// The handle itself is cheap: it carries only the identity, the runtime
/// class and the display name. Attribute values are read through the
/// [`SourceAdapter`](crate::SourceAdapter), which may cache them until the
/// instance is released.
#[derive(Debug, Clone)]
pub struct SourceInstance {
    pub db_id: i64,
    pub class_name: String,
    pub display_name: Option<String>,
}

impl SourceInstance {
    pub fn new(db_id: i64, class_name: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            db_id,
            class_name: class_name.into(),
            display_name,
        }
    }

    /// Display name, or an empty string for log lines.
    pub fn name_or_empty(&self) -> &str {
        self.display_name.as_deref().unwrap_or("")
    }
}

/// Handles sharing a source id denote the same object.
impl PartialEq for SourceInstance {
    fn eq(&self, other: &Self) -> bool {
        self.db_id == other.db_id
    }
}

impl Eq for SourceInstance {}

impl fmt::Display for SourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.class_name, self.db_id, self.name_or_empty())
    }
}
