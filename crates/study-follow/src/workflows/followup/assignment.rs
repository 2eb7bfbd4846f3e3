use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::SubjectId;
use super::identity::{RoleDirectory, ASSIGNABLE_GROUP};
use super::locator::LocatorDirectory;
use super::repository::FollowStore;
use super::service::{FollowServiceError, FollowUpService};

/// Randomized assignment of the unworked queue to one worker.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentRequest {
    pub worker: String,
    /// Requested number of participants.
    pub count: usize,
    /// Optional scaling factor: the effective sample size becomes
    /// `round(count * ratio)`.
    #[serde(default)]
    pub ratio: Option<f64>,
    /// Restrict the pool to one prior-study cohort.
    #[serde(default)]
    pub cohort: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcome {
    pub worker: String,
    pub requested: usize,
    pub assigned: Vec<SubjectId>,
}

/// Which assignments a reset clears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    Worker(String),
    All,
}

pub(crate) fn sample_size(count: usize, ratio: Option<f64>) -> usize {
    match ratio {
        Some(ratio) => (count as f64 * ratio).round() as usize,
        None => count,
    }
}

/// Uniform sample without replacement; a pool smaller than the request is
/// returned whole.
pub(crate) fn plan_assignment<R: Rng + ?Sized>(
    pool: Vec<SubjectId>,
    requested: usize,
    rng: &mut R,
) -> Vec<SubjectId> {
    if pool.len() <= requested {
        return pool;
    }
    pool.choose_multiple(rng, requested).cloned().collect()
}

impl<S, L, R> FollowUpService<S, L, R>
where
    S: FollowStore + 'static,
    L: LocatorDirectory + 'static,
    R: RoleDirectory + 'static,
{
    /// Assign a random sample of the available pool to a worker, stamping
    /// `on` as the assignment date. The worker must already belong to the
    /// assignable group; a missing group propagates as a provisioning fault.
    pub fn assign(
        &self,
        request: AssignmentRequest,
        on: NaiveDate,
    ) -> Result<AssignmentOutcome, FollowServiceError> {
        self.roles()
            .ensure_group_membership(&request.worker, ASSIGNABLE_GROUP)?;

        let pool: Vec<SubjectId> = self
            .store()
            .work_items()?
            .into_iter()
            .filter(|item| item.is_assignable())
            .filter(|item| {
                request
                    .cohort
                    .as_deref()
                    .map_or(true, |cohort| item.cohort == cohort)
            })
            .map(|item| item.subject_id)
            .collect();

        let requested = sample_size(request.count, request.ratio);
        let selected = plan_assignment(pool, requested, &mut rand::thread_rng());

        for subject in &selected {
            if let Some(mut item) = self.store().work_item(subject)? {
                item.assigned = Some(request.worker.clone());
                item.date_assigned = Some(on);
                self.store().put_work_item(item)?;
            }
        }

        info!(
            worker = %request.worker,
            requested,
            assigned = selected.len(),
            cohort = request.cohort.as_deref().unwrap_or("any"),
            "work queue assignment"
        );

        Ok(AssignmentOutcome {
            worker: request.worker,
            requested,
            assigned: selected,
        })
    }

    /// Clear assignment and date together for the scoped items. Returns the
    /// number of items touched.
    pub fn reset_assignments(&self, scope: ResetScope) -> Result<usize, FollowServiceError> {
        let mut cleared = 0;
        for mut item in self.store().work_items()? {
            let matches = item.date_assigned.is_some()
                && match &scope {
                    ResetScope::All => item.assigned.is_some(),
                    ResetScope::Worker(worker) => item.assigned.as_deref() == Some(worker),
                };
            if matches {
                item.assigned = None;
                item.date_assigned = None;
                self.store().put_work_item(item)?;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    /// Move one worker's assigned, unconsented items to another worker,
    /// re-stamping the assignment date. Returns the number moved.
    pub fn reassign(
        &self,
        from: &str,
        to: &str,
        on: NaiveDate,
    ) -> Result<usize, FollowServiceError> {
        self.roles().ensure_group_membership(to, ASSIGNABLE_GROUP)?;

        let mut moved = 0;
        for mut item in self.store().work_items()? {
            if item.assigned.as_deref() == Some(from) && !item.consented {
                item.assigned = Some(to.to_string());
                item.date_assigned = Some(on);
                self.store().put_work_item(item)?;
                moved += 1;
            }
        }
        info!(from, to, moved, "work queue reassignment");
        Ok(moved)
    }
}
