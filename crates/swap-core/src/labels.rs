//! Well-known label keys.

/// Selector/label key that carries the variant tag (`blue` or `green`).
pub const VERSION_LABEL: &str = "version";

/// Service label naming the replica group a rollback returns to.
///
/// Present only between a deploy and the rollback that consumes it.
pub const PREVIOUS_REPLICA_GROUP_LABEL: &str = "previous-replica-group";
