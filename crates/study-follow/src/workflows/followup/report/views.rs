use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::super::domain::{AppointmentType, ContactOutcome, SubjectId};

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeCountEntry {
    pub outcome: ContactOutcome,
    pub outcome_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactAttemptsSummary {
    pub total_attempts: usize,
    pub successful_attempts: usize,
    pub failure_reasons: Vec<OutcomeCountEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingAppointmentEntry {
    pub subject_id: SubjectId,
    pub appointment_date: NaiveDate,
    pub appointment_type: AppointmentType,
    pub appointment_type_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSchedulingSummary {
    pub willing_to_schedule: usize,
    pub unwilling_to_schedule: usize,
    pub still_deciding: usize,
    pub upcoming: Vec<UpcomingAppointmentEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CohortCountEntry {
    pub cohort: String,
    pub total: usize,
    pub called: usize,
    pub consented: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerLoadEntry {
    pub worker: String,
    pub total: usize,
    pub called: usize,
    pub visited: usize,
    pub consented: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyActivityEntry {
    pub date: NaiveDate,
    pub total: usize,
    pub called: usize,
    pub visited: usize,
    pub consented: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectStatusEntry {
    pub subject_id: SubjectId,
    pub cohort: String,
    pub is_called: bool,
    pub last_called_at: Option<DateTime<Utc>>,
    pub visited: bool,
    pub consented: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerPerformanceEntry {
    pub worker: String,
    /// Mean hours between assignment and first successful call.
    pub average_hours_to_first_call: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverdueAssignmentEntry {
    pub subject_id: SubjectId,
    pub worker: String,
    pub date_assigned: NaiveDate,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityFunnel {
    pub eligible_with_child: usize,
    pub ineligible_no_child: usize,
    pub willing_to_schedule: usize,
    pub not_willing_to_schedule: usize,
    pub still_deciding: usize,
    pub consenting_appointments: usize,
    pub screening_appointments: usize,
    pub recall_appointments: usize,
    pub other_appointments: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalContactSummary {
    pub final_contact_made: usize,
    pub available_for_contact: usize,
}

/// Named report sections consumed by the presentation layer.
///
/// Each section is an independent read-only projection; none depends on the
/// order the others were computed in.
#[derive(Debug, Clone, Serialize)]
pub struct FollowUpReportSummary {
    pub contact_attempts: ContactAttemptsSummary,
    pub appointments: AppointmentSchedulingSummary,
    pub cohorts: Vec<CohortCountEntry>,
    pub worker_load: Vec<WorkerLoadEntry>,
    pub activity: Vec<DailyActivityEntry>,
    pub subject_status: Vec<SubjectStatusEntry>,
    pub worker_performance: Vec<WorkerPerformanceEntry>,
    pub overdue: Vec<OverdueAssignmentEntry>,
    pub eligibility: EligibilityFunnel,
    pub final_contact: FinalContactSummary,
}
