/// Group stamped onto every worker who logs a contact attempt.
pub const RECRUITERS_GROUP: &str = "recruiters";

/// Group a worker must belong to before receiving queue assignments.
pub const ASSIGNABLE_GROUP: &str = "follow_assignable";

/// Errors raised by the identity/role store.
///
/// `GroupMissing` is a configuration invariant violation: authorization
/// groups are provisioned out of band and are never auto-created here.
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("required group '{0}' does not exist")]
    GroupMissing(String),
    #[error("worker '{0}' does not exist")]
    UnknownWorker(String),
    #[error("role directory unavailable: {0}")]
    Unavailable(String),
}

/// Identity-store collaborator holding workers and authorization groups.
pub trait RoleDirectory: Send + Sync {
    /// Idempotently add `worker` to `group`. Adding an existing member is a
    /// no-op; a missing group or unknown worker is fatal and propagates.
    fn ensure_group_membership(&self, worker: &str, group: &str) -> Result<(), MembershipError>;
}
