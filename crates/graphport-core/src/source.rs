//! Read-side contract over the relational knowledge base.

use crate::{AttributeValue, SourceInstance, SourceResult};

/// Access to the source knowledge base.
///
/// Implementations are used from a single thread for the whole run. Any
/// method may fail with [`SourceError::Unavailable`](crate::SourceError),
/// which the import treats as fatal.
pub trait SourceAdapter {
    /// Top-level objects seeding the traversal.
    fn fetch_root_set(&self) -> SourceResult<Vec<SourceInstance>>;

    /// Number of instances of `class` and all of its subclasses.
    fn count_instances(&self, class: &str) -> SourceResult<u64>;

    /// First value of a single-valued attribute, `None` when unset.
    fn get_scalar(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<Option<AttributeValue>>;

    /// All values of a multi-valued attribute, in rank order.
    fn get_scalar_list(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<Vec<AttributeValue>>;

    /// Instance-valued entries of an attribute, in rank order, duplicates kept.
    fn get_relation_targets(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<Vec<SourceInstance>>;

    /// Instances whose `attribute` refers to `instance`.
    fn get_inverse_relation_targets(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<Vec<SourceInstance>>;

    /// Whether the runtime schema defines `attribute` for the instance's class.
    fn is_attribute_valid(&self, instance: &SourceInstance, attribute: &str) -> SourceResult<bool>;

    /// Drop any cached attribute data for `instance`.
    fn release(&self, instance: &SourceInstance);
}
