//! Follow-up work queue: contact logging, outcome decisions, assignment,
//! reporting, and export.
//!
//! The decision rules are pure functions in `engine`; the service composes
//! them with the store, locator directory, and identity store collaborators,
//! and the router exposes the whole workflow over HTTP.

pub mod assignment;
pub mod domain;
pub(crate) mod engine;
pub mod export;
pub mod identity;
pub mod locator;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;

pub use assignment::{AssignmentOutcome, AssignmentRequest, ResetScope};
pub use domain::{
    Answer, AppointmentType, Booking, ContactChannel, ContactOutcome, ContactRecord, Deliberation,
    EligibilityAnswers, EligibilityStatus, HomeVisitDisposition, LocatorInfo, SubjectId, WorkItem,
};
pub use engine::{
    apply_contact_outcome, contact_side_effects, eligibility_status, home_visit_required,
    untried_channels, SideEffect,
};
pub use export::{contacts_csv, work_items_csv, ExportError};
pub use identity::{MembershipError, RoleDirectory, ASSIGNABLE_GROUP, RECRUITERS_GROUP};
pub use locator::{available_channels, DirectoryError, LocatorDirectory};
pub use report::{FollowUpReport, FollowUpReportSummary};
pub use repository::{FollowStore, StoreError};
pub use router::followup_router;
pub use service::{
    ChannelOptionView, ContactAcknowledgement, FollowServiceError, FollowUpService,
    SubjectStatusView,
};
