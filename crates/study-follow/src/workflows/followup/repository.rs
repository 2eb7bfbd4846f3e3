use super::domain::{Booking, ContactRecord, SubjectId, WorkItem};

/// Error enumeration for store failures.
///
/// Missing rows are reported as `Ok(None)` by the lookup methods, never as an
/// error; failed writes surface here and are not retried.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for the follow-up queue, the contact log, and
/// bookings, so the engine and services can be exercised in isolation.
pub trait FollowStore: Send + Sync {
    fn work_item(&self, subject: &SubjectId) -> Result<Option<WorkItem>, StoreError>;

    /// Upsert a work item by subject identifier.
    fn put_work_item(&self, item: WorkItem) -> Result<(), StoreError>;

    fn work_items(&self) -> Result<Vec<WorkItem>, StoreError>;

    /// Append a contact record. The log is append-only: records are never
    /// updated or deleted once stored.
    fn insert_contact(&self, record: ContactRecord) -> Result<(), StoreError>;

    /// All contact records for one subject, in insertion order.
    fn contacts_for(&self, subject: &SubjectId) -> Result<Vec<ContactRecord>, StoreError>;

    fn contacts(&self) -> Result<Vec<ContactRecord>, StoreError>;

    fn booking(&self, subject: &SubjectId) -> Result<Option<Booking>, StoreError>;

    /// Create or update the single booking row for the subject.
    fn upsert_booking(&self, booking: Booking) -> Result<(), StoreError>;

    fn bookings(&self) -> Result<Vec<Booking>, StoreError>;
}
