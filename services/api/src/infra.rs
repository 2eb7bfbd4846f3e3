use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use study_follow::workflows::followup::{
    Booking, ContactRecord, DirectoryError, FollowStore, LocatorDirectory, LocatorInfo,
    MembershipError, RoleDirectory, StoreError, SubjectId, WorkItem, ASSIGNABLE_GROUP,
    RECRUITERS_GROUP,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryFollowStore {
    items: Mutex<HashMap<SubjectId, WorkItem>>,
    contacts: Mutex<Vec<ContactRecord>>,
    bookings: Mutex<HashMap<SubjectId, Booking>>,
}

impl FollowStore for InMemoryFollowStore {
    fn work_item(&self, subject: &SubjectId) -> Result<Option<WorkItem>, StoreError> {
        let guard = self.items.lock().expect("work item mutex poisoned");
        Ok(guard.get(subject).cloned())
    }

    fn put_work_item(&self, item: WorkItem) -> Result<(), StoreError> {
        let mut guard = self.items.lock().expect("work item mutex poisoned");
        guard.insert(item.subject_id.clone(), item);
        Ok(())
    }

    fn work_items(&self) -> Result<Vec<WorkItem>, StoreError> {
        let guard = self.items.lock().expect("work item mutex poisoned");
        let mut items: Vec<WorkItem> = guard.values().cloned().collect();
        items.sort_by(|a, b| a.subject_id.cmp(&b.subject_id));
        Ok(items)
    }

    fn insert_contact(&self, record: ContactRecord) -> Result<(), StoreError> {
        let mut guard = self.contacts.lock().expect("contact mutex poisoned");
        guard.push(record);
        Ok(())
    }

    fn contacts_for(&self, subject: &SubjectId) -> Result<Vec<ContactRecord>, StoreError> {
        let guard = self.contacts.lock().expect("contact mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| record.subject_id == *subject)
            .cloned()
            .collect())
    }

    fn contacts(&self) -> Result<Vec<ContactRecord>, StoreError> {
        let guard = self.contacts.lock().expect("contact mutex poisoned");
        Ok(guard.clone())
    }

    fn booking(&self, subject: &SubjectId) -> Result<Option<Booking>, StoreError> {
        let guard = self.bookings.lock().expect("booking mutex poisoned");
        Ok(guard.get(subject).cloned())
    }

    fn upsert_booking(&self, booking: Booking) -> Result<(), StoreError> {
        let mut guard = self.bookings.lock().expect("booking mutex poisoned");
        guard.insert(booking.subject_id.clone(), booking);
        Ok(())
    }

    fn bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let guard = self.bookings.lock().expect("booking mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryLocatorDirectory {
    records: Mutex<Vec<LocatorInfo>>,
}

impl InMemoryLocatorDirectory {
    pub(crate) fn add(&self, locator: LocatorInfo) {
        self.records
            .lock()
            .expect("locator mutex poisoned")
            .push(locator);
    }
}

impl LocatorDirectory for InMemoryLocatorDirectory {
    fn latest_locator(&self, subject: &SubjectId) -> Result<Option<LocatorInfo>, DirectoryError> {
        let guard = self.records.lock().expect("locator mutex poisoned");
        Ok(guard
            .iter()
            .filter(|locator| locator.subject_id == *subject)
            .max_by_key(|locator| locator.report_timestamp)
            .cloned())
    }
}

/// Identity-store standin.
///
/// The strict form enforces the provisioning invariants (missing group and
/// unknown worker are fatal); the permissive form backs `serve` where no
/// identity provider is wired up and auto-registers workers on first touch.
pub(crate) struct InMemoryRoleDirectory {
    groups: Mutex<HashMap<String, HashSet<String>>>,
    workers: Mutex<HashSet<String>>,
    auto_register: bool,
}

impl InMemoryRoleDirectory {
    pub(crate) fn strict(
        groups: impl IntoIterator<Item = &'static str>,
        workers: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        Self {
            groups: Mutex::new(
                groups
                    .into_iter()
                    .map(|name| (name.to_string(), HashSet::new()))
                    .collect(),
            ),
            workers: Mutex::new(workers.into_iter().map(str::to_string).collect()),
            auto_register: false,
        }
    }

    pub(crate) fn permissive() -> Self {
        Self {
            groups: Mutex::new(
                [RECRUITERS_GROUP, ASSIGNABLE_GROUP]
                    .into_iter()
                    .map(|name| (name.to_string(), HashSet::new()))
                    .collect(),
            ),
            workers: Mutex::new(HashSet::new()),
            auto_register: true,
        }
    }

    pub(crate) fn members(&self, group: &str) -> Vec<String> {
        let guard = self.groups.lock().expect("group mutex poisoned");
        let mut members: Vec<String> = guard
            .get(group)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }
}

impl RoleDirectory for InMemoryRoleDirectory {
    fn ensure_group_membership(&self, worker: &str, group: &str) -> Result<(), MembershipError> {
        {
            let mut workers = self.workers.lock().expect("worker mutex poisoned");
            if !workers.contains(worker) {
                if !self.auto_register {
                    return Err(MembershipError::UnknownWorker(worker.to_string()));
                }
                workers.insert(worker.to_string());
            }
        }

        let mut groups = self.groups.lock().expect("group mutex poisoned");
        let members = groups
            .get_mut(group)
            .ok_or_else(|| MembershipError::GroupMissing(group.to_string()))?;
        members.insert(worker.to_string());
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
