use std::collections::HashMap;

use super::domain::{ContactRecord, SubjectId, WorkItem};
use super::locator::{available_channels, DirectoryError, LocatorDirectory};

/// Error raised while producing a flat-record export.
///
/// No partial output is ever returned; a failed write surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finalize csv buffer: {0}")]
    Buffer(String),
    #[error("exported csv was not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn flag(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// One row per work item, merged with the subject's latest contact attempt.
///
/// Choice-coded columns are rendered to their display labels and the
/// subject's locator phone numbers are joined into a single cell.
pub fn work_items_csv<L: LocatorDirectory>(
    items: &[WorkItem],
    contacts: &[ContactRecord],
    directory: &L,
) -> Result<String, ExportError> {
    let mut latest: HashMap<&SubjectId, &ContactRecord> = HashMap::new();
    for record in contacts {
        latest
            .entry(&record.subject_id)
            .and_modify(|current| {
                if record.attempted_at > current.attempted_at {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "subject_id",
        "cohort",
        "assigned",
        "date_assigned",
        "is_called",
        "called_at",
        "visited",
        "consented",
        "last_attempted_at",
        "last_channel",
        "last_outcome",
        "appointment_type",
        "appointment_date",
        "phone_numbers",
    ])?;

    for item in items {
        let last = latest.get(&item.subject_id).copied();
        let phones = match directory.latest_locator(&item.subject_id)? {
            Some(locator) => available_channels(&locator)
                .into_iter()
                .map(|(channel, value)| format!("{value} {}", channel.label()))
                .collect::<Vec<_>>()
                .join(", "),
            None => String::new(),
        };

        writer.write_record([
            item.subject_id.0.clone(),
            item.cohort.clone(),
            opt(item.assigned.as_deref()),
            item.date_assigned.map(|d| d.to_string()).unwrap_or_default(),
            flag(item.is_called).to_string(),
            item.called_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            flag(item.visited).to_string(),
            flag(item.consented).to_string(),
            last.map(|r| r.attempted_at.to_rfc3339()).unwrap_or_default(),
            last.map(|r| r.channel.label().to_string()).unwrap_or_default(),
            last.map(|r| r.outcome.label().to_string()).unwrap_or_default(),
            last.and_then(|r| r.appointment_type)
                .map(|kind| kind.label().to_string())
                .unwrap_or_default(),
            last.and_then(|r| r.appointment_date)
                .map(|d| d.to_string())
                .unwrap_or_default(),
            phones,
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

/// One row per contact record with labeled enum columns.
pub fn contacts_csv(contacts: &[ContactRecord]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "subject_id",
        "worker",
        "channel",
        "attempted_at",
        "outcome",
        "appointment",
        "appointment_type",
        "appointment_date",
        "final_contact",
        "note",
    ])?;

    for record in contacts {
        writer.write_record([
            record.subject_id.0.clone(),
            record.worker.clone(),
            record.channel.label().to_string(),
            record.attempted_at.to_rfc3339(),
            record.outcome.label().to_string(),
            record
                .appointment
                .map(|a| format!("{a:?}"))
                .unwrap_or_default(),
            record
                .appointment_type
                .map(|kind| kind.label().to_string())
                .unwrap_or_default(),
            record
                .appointment_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            record
                .final_contact
                .map(|a| format!("{a:?}"))
                .unwrap_or_default(),
            opt(record.note.as_deref()),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::followup::domain::{
        ContactChannel, ContactOutcome, EligibilityAnswers, HomeVisitDisposition, LocatorInfo,
    };
    use chrono::{TimeZone, Utc};

    struct OneLocator(LocatorInfo);

    impl LocatorDirectory for OneLocator {
        fn latest_locator(
            &self,
            subject: &SubjectId,
        ) -> Result<Option<LocatorInfo>, DirectoryError> {
            Ok((self.0.subject_id == *subject).then(|| self.0.clone()))
        }
    }

    #[test]
    fn work_item_rows_join_phone_numbers_and_render_labels() {
        let subject = SubjectId::new("066-1");
        let item = WorkItem::new(
            subject.clone(),
            "prior-a",
            Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap(),
        );
        let record = ContactRecord {
            subject_id: subject.clone(),
            worker: "thabo".to_string(),
            channel: ContactChannel::AltCell,
            attempted_at: Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap(),
            outcome: ContactOutcome::NoResponse,
            appointment: None,
            appointment_date: None,
            appointment_type: None,
            eligibility: EligibilityAnswers::default(),
            home_visit: HomeVisitDisposition::NotApplicable,
            final_contact: None,
            note: None,
        };
        let directory = OneLocator(LocatorInfo {
            subject_id: subject,
            cell: Some("71234567".to_string()),
            tel: Some("3904455".to_string()),
            may_call: true,
            may_visit_home: false,
            report_timestamp: Utc::now(),
            ..LocatorInfo::default()
        });

        let csv = work_items_csv(&[item], &[record], &directory).expect("export succeeds");
        let mut lines = csv.lines();
        let header = lines.next().expect("header row");
        assert!(header.starts_with("subject_id,cohort,assigned"));

        let row = lines.next().expect("data row");
        assert!(row.contains("No response"));
        assert!(row.contains("\"71234567 Cell, 3904455 Telephone\""));
    }

    #[test]
    fn contact_rows_use_display_labels() {
        let record = ContactRecord {
            subject_id: SubjectId::new("066-2"),
            worker: "naledi".to_string(),
            channel: ContactChannel::CaretakerTel,
            attempted_at: Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap(),
            outcome: ContactOutcome::Disconnected,
            appointment: None,
            appointment_date: None,
            appointment_type: None,
            eligibility: EligibilityAnswers::default(),
            home_visit: HomeVisitDisposition::NotApplicable,
            final_contact: None,
            note: Some("number out of service".to_string()),
        };

        let csv = contacts_csv(&[record]).expect("export succeeds");
        assert!(csv.contains("Caretaker Telephone"));
        assert!(csv.contains("Number disconnected"));
    }
}
