use super::super::domain::{ContactRecord, EligibilityStatus};

/// Derive a participant's eligibility standing from their contact log.
///
/// Pending until at least one record exists. The latest attempt is
/// authoritative: any closed question answered "no" disqualifies; all six
/// answered "yes" with an accepted appointment qualifies; anything in
/// between stays pending.
pub fn eligibility_status(records: &[ContactRecord]) -> EligibilityStatus {
    let Some(latest) = records.iter().max_by_key(|record| record.attempted_at) else {
        return EligibilityStatus::Pending;
    };

    if latest.eligibility.any_no() {
        return EligibilityStatus::Ineligible;
    }
    if latest.eligibility.all_yes() && latest.appointment_accepted() {
        return EligibilityStatus::Eligible;
    }
    EligibilityStatus::Pending
}
