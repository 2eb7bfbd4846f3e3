use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::domain::{ContactChannel, ContactRecord, EligibilityStatus, SubjectId, WorkItem};
use super::engine::{
    apply_contact_outcome, contact_side_effects, eligibility_status, home_visit_required,
    untried_channels, SideEffect,
};
use super::export::{contacts_csv, work_items_csv, ExportError};
use super::identity::{MembershipError, RoleDirectory};
use super::locator::{DirectoryError, LocatorDirectory};
use super::report::{FollowUpReport, FollowUpReportSummary};
use super::repository::{FollowStore, StoreError};

/// Service composing the persistent store, the locator directory, and the
/// identity store around the contact-outcome decision rules.
pub struct FollowUpService<S, L, R> {
    store: Arc<S>,
    directory: Arc<L>,
    roles: Arc<R>,
}

/// Error raised by the follow-up service.
#[derive(Debug, thiserror::Error)]
pub enum FollowServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Membership(#[from] MembershipError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// A locator channel offered to the caller as "try this next".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelOptionView {
    pub channel: ContactChannel,
    pub channel_label: &'static str,
    pub value: String,
}

fn channel_views(channels: Vec<(ContactChannel, String)>) -> Vec<ChannelOptionView> {
    channels
        .into_iter()
        .map(|(channel, value)| ChannelOptionView {
            channel,
            channel_label: channel.label(),
            value,
        })
        .collect()
}

/// Returned to the boundary layer after a contact attempt is logged.
#[derive(Debug, Clone, Serialize)]
pub struct ContactAcknowledgement {
    pub subject_id: SubjectId,
    /// False when the subject had no work queue entry; the attempt is still
    /// logged and its side effects still ran.
    pub work_item_updated: bool,
    pub booking_upserted: bool,
    pub eligibility: EligibilityStatus,
    pub eligibility_label: &'static str,
    pub home_visit_required: bool,
    pub untried_channels: Vec<ChannelOptionView>,
}

/// Queue snapshot plus derived decisions for one subject.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectStatusView {
    pub subject_id: SubjectId,
    pub cohort: String,
    pub assigned: Option<String>,
    pub date_assigned: Option<NaiveDate>,
    pub is_called: bool,
    pub called_at: Option<DateTime<Utc>>,
    pub visited: bool,
    pub consented: bool,
    pub eligibility: EligibilityStatus,
    pub eligibility_label: &'static str,
    pub home_visit_required: bool,
    pub untried_channels: Vec<ChannelOptionView>,
}

impl<S, L, R> FollowUpService<S, L, R>
where
    S: FollowStore + 'static,
    L: LocatorDirectory + 'static,
    R: RoleDirectory + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<L>, roles: Arc<R>) -> Self {
        Self {
            store,
            directory,
            roles,
        }
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn roles(&self) -> &R {
        &self.roles
    }

    /// Log one contact attempt and run the decision rules over it.
    ///
    /// The record is appended first; a subject without a queue entry is
    /// tolerated (flags are skipped, side effects still run). Membership
    /// failures propagate — a missing recruiters group is a provisioning
    /// fault, never papered over here.
    pub fn log_contact(
        &self,
        record: ContactRecord,
    ) -> Result<ContactAcknowledgement, FollowServiceError> {
        let subject = record.subject_id.clone();
        self.store.insert_contact(record.clone())?;

        let locator = self.directory.latest_locator(&subject)?;
        let current = self.store.work_item(&subject)?;

        let (work_item_updated, effects) = match current {
            Some(item) => {
                let (updated, effects) = apply_contact_outcome(&item, &record, locator.as_ref());
                self.store.put_work_item(updated)?;
                (true, effects)
            }
            None => {
                debug!(subject = %subject.0, "no work item for subject; queue flags skipped");
                (false, contact_side_effects(&record, locator.as_ref()))
            }
        };

        let booking_upserted = self.apply_side_effects(effects)?;

        let history = self.store.contacts_for(&subject)?;
        let eligibility = eligibility_status(&history);
        let visit_required = home_visit_required(&history, locator.as_ref());
        let untried = locator
            .as_ref()
            .map(|loc| untried_channels(&history, loc))
            .unwrap_or_default();

        info!(
            subject = %subject.0,
            outcome = ?record.outcome,
            eligibility = eligibility.label(),
            home_visit_required = visit_required,
            "contact attempt logged"
        );

        Ok(ContactAcknowledgement {
            subject_id: subject,
            work_item_updated,
            booking_upserted,
            eligibility,
            eligibility_label: eligibility.label(),
            home_visit_required: visit_required,
            untried_channels: channel_views(untried),
        })
    }

    /// Queue snapshot for one subject; `Ok(None)` when the subject is not in
    /// the follow-up pool.
    pub fn subject_status(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<SubjectStatusView>, FollowServiceError> {
        let Some(item) = self.store.work_item(subject)? else {
            return Ok(None);
        };

        let locator = self.directory.latest_locator(subject)?;
        let history = self.store.contacts_for(subject)?;
        let eligibility = eligibility_status(&history);
        let untried = locator
            .as_ref()
            .map(|loc| untried_channels(&history, loc))
            .unwrap_or_default();

        Ok(Some(SubjectStatusView {
            subject_id: item.subject_id.clone(),
            cohort: item.cohort.clone(),
            assigned: item.assigned.clone(),
            date_assigned: item.date_assigned,
            is_called: item.is_called,
            called_at: item.called_at,
            visited: item.visited,
            consented: item.consented,
            eligibility,
            eligibility_label: eligibility.label(),
            home_visit_required: home_visit_required(&history, locator.as_ref()),
            untried_channels: channel_views(untried),
        }))
    }

    /// Seed a participant into the follow-up pool. Upsert by subject.
    pub fn enter_pool(&self, item: WorkItem) -> Result<(), FollowServiceError> {
        self.store.put_work_item(item)?;
        Ok(())
    }

    /// Read-side report over everything currently stored.
    pub fn report(&self, today: NaiveDate) -> Result<FollowUpReportSummary, FollowServiceError> {
        let items = self.store.work_items()?;
        let contacts = self.store.contacts()?;
        Ok(FollowUpReport::build(&items, &contacts, today).summary())
    }

    /// CSV export of the work queue merged with each subject's latest attempt.
    pub fn export_work_items(&self) -> Result<String, FollowServiceError> {
        let items = self.store.work_items()?;
        let contacts = self.store.contacts()?;
        let csv = work_items_csv(&items, &contacts, self.directory.as_ref())?;
        Ok(csv)
    }

    /// CSV export of the raw contact log.
    pub fn export_contacts(&self) -> Result<String, FollowServiceError> {
        let contacts = self.store.contacts()?;
        Ok(contacts_csv(&contacts)?)
    }

    fn apply_side_effects(&self, effects: Vec<SideEffect>) -> Result<bool, FollowServiceError> {
        let mut booking_upserted = false;
        for effect in effects {
            match effect {
                SideEffect::UpsertBooking(booking) => {
                    self.store.upsert_booking(booking)?;
                    booking_upserted = true;
                }
                SideEffect::EnsureMembership { worker, group } => {
                    self.roles.ensure_group_membership(&worker, group)?;
                }
            }
        }
        Ok(booking_upserted)
    }
}
