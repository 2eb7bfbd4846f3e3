//! Integration scenarios for queue assignment and the read-side reports,
//! driven through the public service facade.

mod common {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};

    use study_follow::workflows::followup::{
        Booking, ContactRecord, DirectoryError, FollowStore, FollowUpService, LocatorDirectory,
        LocatorInfo, MembershipError, RoleDirectory, StoreError, SubjectId, WorkItem,
        ASSIGNABLE_GROUP, RECRUITERS_GROUP,
    };

    #[derive(Default)]
    pub(super) struct MemoryStore {
        items: Mutex<HashMap<SubjectId, WorkItem>>,
        contacts: Mutex<Vec<ContactRecord>>,
        bookings: Mutex<HashMap<SubjectId, Booking>>,
    }

    impl FollowStore for MemoryStore {
        fn work_item(&self, subject: &SubjectId) -> Result<Option<WorkItem>, StoreError> {
            Ok(self.items.lock().expect("lock").get(subject).cloned())
        }

        fn put_work_item(&self, item: WorkItem) -> Result<(), StoreError> {
            self.items
                .lock()
                .expect("lock")
                .insert(item.subject_id.clone(), item);
            Ok(())
        }

        fn work_items(&self) -> Result<Vec<WorkItem>, StoreError> {
            let guard = self.items.lock().expect("lock");
            let mut items: Vec<WorkItem> = guard.values().cloned().collect();
            items.sort_by(|a, b| a.subject_id.cmp(&b.subject_id));
            Ok(items)
        }

        fn insert_contact(&self, record: ContactRecord) -> Result<(), StoreError> {
            self.contacts.lock().expect("lock").push(record);
            Ok(())
        }

        fn contacts_for(&self, subject: &SubjectId) -> Result<Vec<ContactRecord>, StoreError> {
            Ok(self
                .contacts
                .lock()
                .expect("lock")
                .iter()
                .filter(|record| record.subject_id == *subject)
                .cloned()
                .collect())
        }

        fn contacts(&self) -> Result<Vec<ContactRecord>, StoreError> {
            Ok(self.contacts.lock().expect("lock").clone())
        }

        fn booking(&self, subject: &SubjectId) -> Result<Option<Booking>, StoreError> {
            Ok(self.bookings.lock().expect("lock").get(subject).cloned())
        }

        fn upsert_booking(&self, booking: Booking) -> Result<(), StoreError> {
            self.bookings
                .lock()
                .expect("lock")
                .insert(booking.subject_id.clone(), booking);
            Ok(())
        }

        fn bookings(&self) -> Result<Vec<Booking>, StoreError> {
            Ok(self.bookings.lock().expect("lock").values().cloned().collect())
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryDirectory {
        records: Mutex<Vec<LocatorInfo>>,
    }

    impl MemoryDirectory {
        pub(super) fn add(&self, locator: LocatorInfo) {
            self.records.lock().expect("lock").push(locator);
        }
    }

    impl LocatorDirectory for MemoryDirectory {
        fn latest_locator(
            &self,
            subject: &SubjectId,
        ) -> Result<Option<LocatorInfo>, DirectoryError> {
            Ok(self
                .records
                .lock()
                .expect("lock")
                .iter()
                .filter(|locator| locator.subject_id == *subject)
                .max_by_key(|locator| locator.report_timestamp)
                .cloned())
        }
    }

    pub(super) struct OpenRoles {
        groups: Mutex<HashMap<String, HashSet<String>>>,
    }

    impl OpenRoles {
        pub(super) fn provisioned() -> Self {
            Self {
                groups: Mutex::new(
                    [RECRUITERS_GROUP, ASSIGNABLE_GROUP]
                        .into_iter()
                        .map(|name| (name.to_string(), HashSet::new()))
                        .collect(),
                ),
            }
        }
    }

    impl RoleDirectory for OpenRoles {
        fn ensure_group_membership(
            &self,
            worker: &str,
            group: &str,
        ) -> Result<(), MembershipError> {
            let mut guard = self.groups.lock().expect("lock");
            let members = guard
                .get_mut(group)
                .ok_or_else(|| MembershipError::GroupMissing(group.to_string()))?;
            members.insert(worker.to_string());
            Ok(())
        }
    }

    pub(super) type Service = FollowUpService<MemoryStore, MemoryDirectory, OpenRoles>;

    pub(super) fn build_service() -> (Service, Arc<MemoryStore>, Arc<MemoryDirectory>) {
        let store = Arc::new(MemoryStore::default());
        let directory = Arc::new(MemoryDirectory::default());
        let roles = Arc::new(OpenRoles::provisioned());
        let service = FollowUpService::new(store.clone(), directory.clone(), roles);
        (service, store, directory)
    }

    pub(super) fn seed_pool(service: &Service, count: usize, cohort: &str) -> Vec<SubjectId> {
        let entered = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        (0..count)
            .map(|n| {
                let subject = SubjectId::new(format!("{cohort}-{n:03}"));
                service
                    .enter_pool(WorkItem::new(subject.clone(), cohort, entered))
                    .expect("pool entry");
                subject
            })
            .collect()
    }
}

mod assignment {
    use super::common::*;
    use chrono::NaiveDate;
    use study_follow::workflows::followup::{
        AssignmentRequest, FollowStore, ResetScope, SubjectId, WorkItem,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid")
    }

    fn request(worker: &str, count: usize, ratio: Option<f64>) -> AssignmentRequest {
        AssignmentRequest {
            worker: worker.to_string(),
            count,
            ratio,
            cohort: None,
        }
    }

    fn assigned_items(store: &MemoryStore, worker: &str) -> Vec<WorkItem> {
        store
            .work_items()
            .expect("list")
            .into_iter()
            .filter(|item| item.assigned.as_deref() == Some(worker))
            .collect()
    }

    #[test]
    fn ratio_bounds_the_sample() {
        let (service, store, _) = build_service();
        seed_pool(&service, 20, "prior-a");

        let outcome = service
            .assign(request("thabo", 10, Some(0.5)), today())
            .expect("assignment");

        assert_eq!(outcome.requested, 5);
        assert_eq!(outcome.assigned.len(), 5);
        assert_eq!(assigned_items(&store, "thabo").len(), 5);
    }

    #[test]
    fn short_pool_is_assigned_whole_without_error() {
        let (service, store, _) = build_service();
        seed_pool(&service, 3, "prior-a");

        let outcome = service
            .assign(request("thabo", 10, None), today())
            .expect("assignment");

        assert_eq!(outcome.assigned.len(), 3);
        for item in assigned_items(&store, "thabo") {
            assert_eq!(item.date_assigned, Some(today()));
        }
    }

    #[test]
    fn cohort_filter_restricts_the_pool() {
        let (service, store, _) = build_service();
        seed_pool(&service, 5, "prior-a");
        seed_pool(&service, 5, "prior-b");

        let outcome = service
            .assign(
                AssignmentRequest {
                    worker: "thabo".to_string(),
                    count: 10,
                    ratio: None,
                    cohort: Some("prior-b".to_string()),
                },
                today(),
            )
            .expect("assignment");

        assert_eq!(outcome.assigned.len(), 5);
        for item in assigned_items(&store, "thabo") {
            assert_eq!(item.cohort, "prior-b");
        }
    }

    #[test]
    fn already_worked_items_stay_out_of_the_pool() {
        let (service, store, _) = build_service();
        let subjects = seed_pool(&service, 4, "prior-a");

        let mut called = store
            .work_item(&subjects[0])
            .expect("fetch")
            .expect("present");
        called.is_called = true;
        store.put_work_item(called).expect("store");

        let mut consented = store
            .work_item(&subjects[1])
            .expect("fetch")
            .expect("present");
        consented.consented = true;
        store.put_work_item(consented).expect("store");

        let outcome = service
            .assign(request("thabo", 10, None), today())
            .expect("assignment");

        assert_eq!(outcome.assigned.len(), 2);
        assert!(!outcome.assigned.contains(&subjects[0]));
        assert!(!outcome.assigned.contains(&subjects[1]));
    }

    #[test]
    fn reset_restores_exactly_the_touched_items() {
        let (service, store, _) = build_service();
        seed_pool(&service, 6, "prior-a");

        service
            .assign(request("thabo", 3, None), today())
            .expect("assignment");
        let touched: Vec<SubjectId> = assigned_items(&store, "thabo")
            .into_iter()
            .map(|item| item.subject_id)
            .collect();
        assert_eq!(touched.len(), 3);

        let cleared = service
            .reset_assignments(ResetScope::Worker("thabo".to_string()))
            .expect("reset");
        assert_eq!(cleared, 3);

        for item in store.work_items().expect("list") {
            assert_eq!(item.assigned, None);
            assert_eq!(item.date_assigned, None);
        }
    }

    #[test]
    fn reset_all_clears_every_worker() {
        let (service, store, _) = build_service();
        seed_pool(&service, 6, "prior-a");

        service
            .assign(request("thabo", 2, None), today())
            .expect("assignment");
        service
            .assign(request("naledi", 2, None), today())
            .expect("assignment");

        let cleared = service.reset_assignments(ResetScope::All).expect("reset");
        assert_eq!(cleared, 4);
        assert!(assigned_items(&store, "thabo").is_empty());
        assert!(assigned_items(&store, "naledi").is_empty());
    }

    #[test]
    fn reassign_moves_unconsented_items_and_restamps_the_date() {
        let (service, store, _) = build_service();
        let subjects = seed_pool(&service, 3, "prior-a");

        service
            .assign(request("thabo", 3, None), today())
            .expect("assignment");

        let mut consented = store
            .work_item(&subjects[0])
            .expect("fetch")
            .expect("present");
        consented.consented = true;
        store.put_work_item(consented).expect("store");

        let later = today() + chrono::Duration::days(5);
        let moved = service.reassign("thabo", "naledi", later).expect("reassign");
        assert_eq!(moved, 2);

        for item in assigned_items(&store, "naledi") {
            assert_eq!(item.date_assigned, Some(later));
            assert!(!item.consented);
        }
        // The consented item stays with the original worker.
        assert_eq!(assigned_items(&store, "thabo").len(), 1);
    }
}

mod reports {
    use super::common::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use study_follow::workflows::followup::{
        Answer, AppointmentType, AssignmentRequest, ContactChannel, ContactOutcome, ContactRecord,
        Deliberation, EligibilityAnswers, HomeVisitDisposition, LocatorInfo, SubjectId,
    };

    fn attempt(subject: &SubjectId, outcome: ContactOutcome) -> ContactRecord {
        ContactRecord {
            subject_id: subject.clone(),
            worker: "thabo".to_string(),
            channel: ContactChannel::Cell,
            attempted_at: Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap(),
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

    #[test]
    fn report_sections_reflect_the_stored_records() {
        let (service, _, directory) = build_service();
        let subjects = seed_pool(&service, 3, "prior-a");
        for subject in &subjects {
            directory.add(LocatorInfo {
                subject_id: subject.clone(),
                cell: Some("71234567".to_string()),
                may_call: true,
                may_visit_home: true,
                report_timestamp: Utc::now(),
                ..LocatorInfo::default()
            });
        }

        service
            .assign(
                AssignmentRequest {
                    worker: "thabo".to_string(),
                    count: 3,
                    ratio: None,
                    cohort: None,
                },
                NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid"),
            )
            .expect("assignment");

        let mut scheduled = attempt(&subjects[0], ContactOutcome::Success);
        scheduled.appointment = Some(Deliberation::Yes);
        scheduled.appointment_date = NaiveDate::from_ymd_opt(2026, 3, 1);
        scheduled.appointment_type = Some(AppointmentType::Screening);
        scheduled.eligibility.has_child = Some(Answer::Yes);
        service.log_contact(scheduled).expect("contact logged");

        let mut declined = attempt(&subjects[1], ContactOutcome::Success);
        declined.appointment = Some(Deliberation::No);
        declined.eligibility.has_child = Some(Answer::No);
        declined.final_contact = Some(Answer::Yes);
        service.log_contact(declined).expect("contact logged");

        service
            .log_contact(attempt(&subjects[2], ContactOutcome::NoResponse))
            .expect("contact logged");

        let today = NaiveDate::from_ymd_opt(2026, 2, 20).expect("valid");
        let report = service.report(today).expect("report builds");

        assert_eq!(report.contact_attempts.total_attempts, 3);
        assert_eq!(report.contact_attempts.successful_attempts, 2);
        assert_eq!(report.appointments.willing_to_schedule, 1);
        assert_eq!(report.appointments.unwilling_to_schedule, 1);
        assert_eq!(report.appointments.upcoming.len(), 1);
        assert_eq!(report.eligibility.eligible_with_child, 1);
        assert_eq!(report.eligibility.ineligible_no_child, 1);
        assert_eq!(report.eligibility.screening_appointments, 1);
        assert_eq!(report.final_contact.final_contact_made, 1);
        assert_eq!(report.final_contact.available_for_contact, 0);

        assert_eq!(report.worker_load.len(), 1);
        assert_eq!(report.worker_load[0].worker, "thabo");
        assert_eq!(report.worker_load[0].total, 3);
        assert_eq!(report.worker_load[0].called, 3);

        // Assigned 2026-01-05, not visited, evaluated 46 days later.
        assert_eq!(report.overdue.len(), 3);
        assert_eq!(report.overdue[0].days_overdue, 46);

        assert_eq!(report.cohorts.len(), 1);
        assert_eq!(report.cohorts[0].total, 3);
        assert_eq!(report.subject_status.len(), 3);
        assert_eq!(report.worker_performance.len(), 1);
    }

    #[test]
    fn export_merges_queue_rows_with_latest_attempt_and_phones() {
        let (service, _, directory) = build_service();
        let subjects = seed_pool(&service, 1, "prior-a");
        directory.add(LocatorInfo {
            subject_id: subjects[0].clone(),
            cell: Some("71234567".to_string()),
            tel: Some("3904455".to_string()),
            may_call: true,
            may_visit_home: true,
            report_timestamp: Utc::now(),
            ..LocatorInfo::default()
        });

        service
            .log_contact(attempt(&subjects[0], ContactOutcome::NoResponse))
            .expect("contact logged");

        let csv = service.export_work_items().expect("export builds");
        let mut lines = csv.lines();
        let header = lines.next().expect("header");
        assert!(header.contains("phone_numbers"));

        let row = lines.next().expect("one data row");
        assert!(row.contains("prior-a"));
        assert!(row.contains("No response"));
        assert!(row.contains("71234567 Cell"));
        assert_eq!(lines.next(), None);
    }
}
