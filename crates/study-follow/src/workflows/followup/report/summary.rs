use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use super::super::domain::{
    Answer, AppointmentType, ContactOutcome, ContactRecord, Deliberation, SubjectId, WorkItem,
};
use super::views::{
    AppointmentSchedulingSummary, CohortCountEntry, ContactAttemptsSummary, DailyActivityEntry,
    EligibilityFunnel, FinalContactSummary, FollowUpReportSummary, OutcomeCountEntry,
    OverdueAssignmentEntry, SubjectStatusEntry, UpcomingAppointmentEntry, WorkerLoadEntry,
    WorkerPerformanceEntry,
};

/// Assignments older than this without a visit count as overdue.
const OVERDUE_AFTER_DAYS: i64 = 30;

#[derive(Debug, Default)]
struct Tally {
    total: usize,
    called: usize,
    visited: usize,
    consented: usize,
}

impl Tally {
    fn add(&mut self, item: &WorkItem) {
        self.total += 1;
        if item.is_called {
            self.called += 1;
        }
        if item.visited {
            self.visited += 1;
        }
        if item.consented {
            self.consented += 1;
        }
    }
}

/// Read-side aggregation over the work queue and the contact log.
#[derive(Debug)]
pub struct FollowUpReport {
    summary: FollowUpReportSummary,
}

impl FollowUpReport {
    pub fn build(items: &[WorkItem], contacts: &[ContactRecord], today: NaiveDate) -> Self {
        Self {
            summary: FollowUpReportSummary {
                contact_attempts: contact_attempts(contacts),
                appointments: appointments(contacts, today),
                cohorts: cohorts(items),
                worker_load: worker_load(items),
                activity: activity(items),
                subject_status: subject_status(items),
                worker_performance: worker_performance(items),
                overdue: overdue(items, today),
                eligibility: eligibility_funnel(contacts),
                final_contact: final_contact(contacts),
            },
        }
    }

    pub fn summary(self) -> FollowUpReportSummary {
        self.summary
    }
}

fn contact_attempts(contacts: &[ContactRecord]) -> ContactAttemptsSummary {
    let total_attempts = contacts.len();
    let successful_attempts = contacts
        .iter()
        .filter(|record| record.outcome == ContactOutcome::Success)
        .count();

    let failure_reasons = ContactOutcome::ALL
        .iter()
        .filter(|outcome| **outcome != ContactOutcome::Success)
        .map(|outcome| OutcomeCountEntry {
            outcome: *outcome,
            outcome_label: outcome.label(),
            count: contacts
                .iter()
                .filter(|record| record.outcome == *outcome)
                .count(),
        })
        .filter(|entry| entry.count > 0)
        .collect();

    ContactAttemptsSummary {
        total_attempts,
        successful_attempts,
        failure_reasons,
    }
}

fn appointments(contacts: &[ContactRecord], today: NaiveDate) -> AppointmentSchedulingSummary {
    let willing_to_schedule = contacts
        .iter()
        .filter(|record| record.appointment == Some(Deliberation::Yes))
        .count();
    let unwilling_to_schedule = contacts
        .iter()
        .filter(|record| record.appointment == Some(Deliberation::No))
        .count();
    let still_deciding = contacts
        .iter()
        .filter(|record| record.appointment == Some(Deliberation::StillThinking))
        .count();

    let mut upcoming: Vec<UpcomingAppointmentEntry> = contacts
        .iter()
        .filter(|record| record.appointment_accepted())
        .filter_map(|record| {
            let date = record.appointment_date.filter(|date| *date >= today)?;
            let kind = record.appointment_type?;
            Some(UpcomingAppointmentEntry {
                subject_id: record.subject_id.clone(),
                appointment_date: date,
                appointment_type: kind,
                appointment_type_label: kind.label(),
            })
        })
        .collect();
    upcoming.sort_by_key(|entry| entry.appointment_date);

    AppointmentSchedulingSummary {
        willing_to_schedule,
        unwilling_to_schedule,
        still_deciding,
        upcoming,
    }
}

fn cohorts(items: &[WorkItem]) -> Vec<CohortCountEntry> {
    let mut per_cohort: BTreeMap<&str, Tally> = BTreeMap::new();
    for item in items {
        per_cohort.entry(item.cohort.as_str()).or_default().add(item);
    }
    per_cohort
        .into_iter()
        .map(|(cohort, tally)| CohortCountEntry {
            cohort: cohort.to_string(),
            total: tally.total,
            called: tally.called,
            consented: tally.consented,
        })
        .collect()
}

fn worker_load(items: &[WorkItem]) -> Vec<WorkerLoadEntry> {
    let mut per_worker: BTreeMap<&str, Tally> = BTreeMap::new();
    for item in items {
        if let Some(worker) = item.assigned.as_deref() {
            per_worker.entry(worker).or_default().add(item);
        }
    }
    per_worker
        .into_iter()
        .map(|(worker, tally)| WorkerLoadEntry {
            worker: worker.to_string(),
            total: tally.total,
            called: tally.called,
            visited: tally.visited,
            consented: tally.consented,
        })
        .collect()
}

fn activity(items: &[WorkItem]) -> Vec<DailyActivityEntry> {
    let mut per_day: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
    for item in items {
        per_day
            .entry(item.entered_pool_at.date_naive())
            .or_default()
            .add(item);
    }
    per_day
        .into_iter()
        .map(|(date, tally)| DailyActivityEntry {
            date,
            total: tally.total,
            called: tally.called,
            visited: tally.visited,
            consented: tally.consented,
        })
        .collect()
}

fn subject_status(items: &[WorkItem]) -> Vec<SubjectStatusEntry> {
    let mut per_subject: BTreeMap<&SubjectId, &WorkItem> = BTreeMap::new();
    for item in items {
        per_subject.insert(&item.subject_id, item);
    }
    per_subject
        .into_values()
        .map(|item| SubjectStatusEntry {
            subject_id: item.subject_id.clone(),
            cohort: item.cohort.clone(),
            is_called: item.is_called,
            last_called_at: item.called_at,
            visited: item.visited,
            consented: item.consented,
        })
        .collect()
}

fn worker_performance(items: &[WorkItem]) -> Vec<WorkerPerformanceEntry> {
    let mut per_worker: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for item in items {
        let (Some(worker), Some(assigned), Some(called_at)) =
            (item.assigned.as_deref(), item.date_assigned, item.called_at)
        else {
            continue;
        };
        let start = assigned.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        if let Some(start) = start {
            let hours = (called_at - start).num_minutes() as f64 / 60.0;
            per_worker.entry(worker).or_default().push(hours);
        }
    }
    per_worker
        .into_iter()
        .map(|(worker, samples)| WorkerPerformanceEntry {
            worker: worker.to_string(),
            average_hours_to_first_call: samples.iter().sum::<f64>() / samples.len() as f64,
        })
        .collect()
}

fn overdue(items: &[WorkItem], today: NaiveDate) -> Vec<OverdueAssignmentEntry> {
    let threshold = today - Duration::days(OVERDUE_AFTER_DAYS);
    let mut entries: Vec<OverdueAssignmentEntry> = items
        .iter()
        .filter(|item| !item.visited)
        .filter_map(|item| {
            let worker = item.assigned.as_deref()?;
            let assigned = item.date_assigned.filter(|date| *date <= threshold)?;
            Some(OverdueAssignmentEntry {
                subject_id: item.subject_id.clone(),
                worker: worker.to_string(),
                date_assigned: assigned,
                days_overdue: (today - assigned).num_days(),
            })
        })
        .collect();
    entries.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
    entries
}

fn eligibility_funnel(contacts: &[ContactRecord]) -> EligibilityFunnel {
    let answered = |predicate: fn(&ContactRecord) -> bool| contacts.iter().filter(|r| predicate(r)).count();

    let appointment_count = |kind: AppointmentType| {
        contacts
            .iter()
            .filter(|record| record.appointment_type == Some(kind))
            .count()
    };

    EligibilityFunnel {
        eligible_with_child: answered(|r| r.eligibility.has_child == Some(Answer::Yes)),
        ineligible_no_child: answered(|r| r.eligibility.has_child == Some(Answer::No)),
        willing_to_schedule: answered(|r| r.appointment == Some(Deliberation::Yes)),
        not_willing_to_schedule: answered(|r| r.appointment == Some(Deliberation::No)),
        still_deciding: answered(|r| r.appointment == Some(Deliberation::StillThinking)),
        consenting_appointments: appointment_count(AppointmentType::Consenting),
        screening_appointments: appointment_count(AppointmentType::Screening),
        recall_appointments: appointment_count(AppointmentType::ReCall),
        other_appointments: appointment_count(AppointmentType::Other),
    }
}

fn final_contact(contacts: &[ContactRecord]) -> FinalContactSummary {
    FinalContactSummary {
        final_contact_made: contacts
            .iter()
            .filter(|record| record.final_contact == Some(Answer::Yes))
            .count(),
        available_for_contact: contacts
            .iter()
            .filter(|record| record.final_contact == Some(Answer::No))
            .count(),
    }
}
