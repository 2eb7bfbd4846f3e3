use super::super::domain::{
    Booking, ContactChannel, ContactOutcome, ContactRecord, HomeVisitDisposition, LocatorInfo,
    WorkItem,
};
use super::super::identity::RECRUITERS_GROUP;
use super::super::locator::available_channels;

/// Cross-entity mutation requested by the decision rules.
///
/// Effects are returned to the caller rather than applied in place, so the
/// coupling between a contact attempt and the rows it touches stays visible
/// and testable.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    UpsertBooking(Booking),
    EnsureMembership { worker: String, group: &'static str },
}

/// Apply one contact attempt to the participant's work item.
///
/// Returns the updated work item plus the side effects to run: a booking
/// upsert when an appointment was accepted, and the recruiters-group
/// membership stamp for the worker who logged the attempt.
pub fn apply_contact_outcome(
    work_item: &WorkItem,
    record: &ContactRecord,
    locator: Option<&LocatorInfo>,
) -> (WorkItem, Vec<SideEffect>) {
    let mut updated = work_item.clone();

    if record.counts_as_reached() {
        if record.channel.is_phone() {
            updated.is_called = true;
            updated.called_at = Some(record.attempted_at);
        } else {
            updated.visited = true;
        }
    }

    (updated, contact_side_effects(record, locator))
}

/// Side effects of a contact attempt, independent of any work item.
///
/// Used directly when the subject has no work queue entry: the attempt is
/// still logged, booked, and stamped even though no flags can be updated.
pub fn contact_side_effects(
    record: &ContactRecord,
    locator: Option<&LocatorInfo>,
) -> Vec<SideEffect> {
    let mut effects = Vec::new();

    if record.appointment_accepted() {
        // Booking rows carry the participant name, so no locator means no booking.
        if let Some(locator) = locator {
            if let (Some(date), Some(kind)) = (record.appointment_date, record.appointment_type) {
                effects.push(SideEffect::UpsertBooking(Booking {
                    subject_id: record.subject_id.clone(),
                    first_name: locator.first_name.clone(),
                    last_name: locator.last_name.clone(),
                    booking_date: date,
                    appointment_type: kind,
                }));
            }
        }
    }

    effects.push(SideEffect::EnsureMembership {
        worker: record.worker.clone(),
        group: RECRUITERS_GROUP,
    });

    effects
}

/// Decide whether follow-up must escalate to a home visit.
///
/// True when the locator has no usable phone channels, when a worker already
/// performed a visit, or when any qualifying attempt hit a disconnected
/// number. A disconnected number outranks co-occurring no-response entries:
/// the channel is dead, while no-response still leaves a phone path open.
pub fn home_visit_required(records: &[ContactRecord], locator: Option<&LocatorInfo>) -> bool {
    let channels = locator.map(available_channels).unwrap_or_default();
    if channels.is_empty() {
        return true;
    }

    if records
        .iter()
        .any(|record| record.home_visit == HomeVisitDisposition::Performed)
    {
        return true;
    }

    let reasons: Vec<ContactOutcome> = records
        .iter()
        .filter(|record| record.counts_as_reached())
        .map(|record| record.outcome)
        .collect();

    if reasons.contains(&ContactOutcome::Disconnected) {
        return true;
    }
    if reasons
        .iter()
        .any(|reason| matches!(reason, ContactOutcome::NoResponse | ContactOutcome::VoicemailNotLeft))
    {
        return false;
    }
    false
}

/// Locator channels not yet attempted for this subject, in dialing order.
pub fn untried_channels(
    records: &[ContactRecord],
    locator: &LocatorInfo,
) -> Vec<(ContactChannel, String)> {
    available_channels(locator)
        .into_iter()
        .filter(|(channel, _)| !records.iter().any(|record| record.channel == *channel))
        .collect()
}
