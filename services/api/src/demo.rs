use crate::infra::{InMemoryFollowStore, InMemoryLocatorDirectory, InMemoryRoleDirectory};
use chrono::{Duration, Local, NaiveDate, Utc};
use clap::Args;
use std::sync::Arc;
use study_follow::error::AppError;
use study_follow::workflows::followup::{
    Answer, AppointmentType, AssignmentRequest, ContactAcknowledgement, ContactChannel,
    ContactOutcome, ContactRecord, Deliberation, EligibilityAnswers, FollowServiceError,
    FollowStore, FollowUpReportSummary, FollowUpService, HomeVisitDisposition, LocatorInfo,
    SubjectId, WorkItem, ASSIGNABLE_GROUP, RECRUITERS_GROUP,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the reporting date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Override the reporting date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

type DemoService =
    FollowUpService<InMemoryFollowStore, InMemoryLocatorDirectory, InMemoryRoleDirectory>;

fn build_demo_service() -> (
    DemoService,
    Arc<InMemoryFollowStore>,
    Arc<InMemoryRoleDirectory>,
) {
    let store = Arc::new(InMemoryFollowStore::default());
    let directory = Arc::new(InMemoryLocatorDirectory::default());
    let roles = Arc::new(InMemoryRoleDirectory::strict(
        [RECRUITERS_GROUP, ASSIGNABLE_GROUP],
        ["thabo", "naledi"],
    ));

    directory.add(LocatorInfo {
        subject_id: SubjectId::new("066-1"),
        first_name: Some("Naledi".to_string()),
        last_name: Some("Kgosi".to_string()),
        cell: Some("71234567".to_string()),
        tel: Some("3904455".to_string()),
        may_call: true,
        may_visit_home: true,
        report_timestamp: Utc::now(),
        ..LocatorInfo::default()
    });
    directory.add(LocatorInfo {
        subject_id: SubjectId::new("066-2"),
        first_name: Some("Boitumelo".to_string()),
        last_name: Some("Seleka".to_string()),
        cell: Some("72001122".to_string()),
        may_call: true,
        may_visit_home: true,
        report_timestamp: Utc::now(),
        ..LocatorInfo::default()
    });
    // 066-3 deliberately has no locator record at all.

    let service = FollowUpService::new(store.clone(), directory, roles.clone());
    (service, store, roles)
}

fn attempt(subject: &str, channel: ContactChannel, outcome: ContactOutcome) -> ContactRecord {
    ContactRecord {
        subject_id: SubjectId::new(subject),
        worker: "thabo".to_string(),
        channel,
        attempted_at: Utc::now(),
        outcome,
        appointment: None,
        appointment_date: None,
        appointment_type: None,
        eligibility: EligibilityAnswers::default(),
        home_visit: HomeVisitDisposition::NotApplicable,
        final_contact: None,
        note: None,
    }
}

/// Walk the seeded queue through assignment and three contact attempts,
/// returning the acknowledgements in submission order.
fn seed_queue(
    service: &DemoService,
    today: NaiveDate,
) -> Result<Vec<ContactAcknowledgement>, AppError> {
    let entered = Utc::now() - Duration::days(40);
    for (subject, cohort) in [
        ("066-1", "prior-a"),
        ("066-2", "prior-a"),
        ("066-3", "prior-b"),
        ("066-4", "prior-b"),
    ] {
        service.enter_pool(WorkItem::new(SubjectId::new(subject), cohort, entered))?;
    }

    service.assign(
        AssignmentRequest {
            worker: "thabo".to_string(),
            count: 4,
            ratio: Some(0.5),
            cohort: None,
        },
        today - Duration::days(35),
    )?;

    // A successful call that accepts a consenting appointment.
    let mut accepted = attempt("066-1", ContactChannel::Cell, ContactOutcome::Success);
    accepted.appointment = Some(Deliberation::Yes);
    accepted.appointment_date = Some(today + Duration::days(7));
    accepted.appointment_type = Some(AppointmentType::Consenting);
    accepted.eligibility = EligibilityAnswers {
        has_child: Some(Answer::Yes),
        caregiver_age: Some(Answer::Yes),
        caregiver_has_id: Some(Answer::Yes),
        willing_consent: Some(Deliberation::Yes),
        willing_assent: Some(Answer::Yes),
        study_interest: Some(Answer::Yes),
    };

    let acks = vec![
        service.log_contact(accepted)?,
        // A dead number escalates straight to a home visit.
        service.log_contact(attempt(
            "066-2",
            ContactChannel::Cell,
            ContactOutcome::Disconnected,
        ))?,
        // No locator at all: the attempt is logged, a visit is required.
        service.log_contact(attempt(
            "066-3",
            ContactChannel::Cell,
            ContactOutcome::NoneOfTheAbove,
        ))?,
    ];
    Ok(acks)
}

fn render_report(report: &FollowUpReportSummary) {
    println!(
        "\nContact attempts: {} total, {} successful",
        report.contact_attempts.total_attempts, report.contact_attempts.successful_attempts
    );
    for entry in &report.contact_attempts.failure_reasons {
        println!("  - {}: {}", entry.outcome_label, entry.count);
    }
    println!(
        "Appointments: {} willing, {} unwilling, {} still deciding, {} upcoming",
        report.appointments.willing_to_schedule,
        report.appointments.unwilling_to_schedule,
        report.appointments.still_deciding,
        report.appointments.upcoming.len()
    );
    println!("Cohorts:");
    for cohort in &report.cohorts {
        println!(
            "  - {}: {} in pool, {} called, {} consented",
            cohort.cohort, cohort.total, cohort.called, cohort.consented
        );
    }
    println!("Worker load:");
    for load in &report.worker_load {
        println!(
            "  - {}: {} assigned, {} called, {} visited",
            load.worker, load.total, load.called, load.visited
        );
    }
    if report.overdue.is_empty() {
        println!("Overdue assignments: none");
    } else {
        println!("Overdue assignments:");
        for entry in &report.overdue {
            println!(
                "  - {} ({}), {} days overdue",
                entry.subject_id.0, entry.worker, entry.days_overdue
            );
        }
    }
    println!(
        "Eligibility funnel: {} with child, {} without, {} scheduled screenings",
        report.eligibility.eligible_with_child,
        report.eligibility.ineligible_no_child,
        report.eligibility.screening_appointments
    );
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let (service, _, _) = build_demo_service();
    seed_queue(&service, today)?;

    println!("Follow-up administrative report (evaluated {today})");
    let report = service.report(today)?;
    render_report(&report);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let (service, store, roles) = build_demo_service();

    println!("Follow-up workflow demo (evaluated {today})");
    let acks = seed_queue(&service, today)?;

    for ack in &acks {
        println!(
            "- {}: eligibility {} | home visit required: {} | booking upserted: {} | channels left: {}",
            ack.subject_id.0,
            ack.eligibility_label,
            ack.home_visit_required,
            ack.booking_upserted,
            ack.untried_channels.len()
        );
    }

    let report = service.report(today)?;
    render_report(&report);

    let bookings = store.bookings().map_err(FollowServiceError::from)?;
    println!("\nBookings on file: {}", bookings.len());
    for booking in &bookings {
        println!(
            "  - {} on {} ({})",
            booking.subject_id.0,
            booking.booking_date,
            booking.appointment_type.label()
        );
    }

    let csv = service.export_work_items()?;
    println!(
        "\nWork queue export: {} rows (including header)",
        csv.lines().count()
    );
    println!(
        "Recruiters group now holds: {}",
        roles.members(RECRUITERS_GROUP).join(", ")
    );

    Ok(())
}
