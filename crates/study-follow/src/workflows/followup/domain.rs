use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for study participants in the follow-up pool.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self(String::new())
    }
}

/// One contact channel slot on a participant's locator record.
///
/// Phone kinds are listed in the fixed priority callers work through;
/// the last three are in-person visit locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactChannel {
    Cell,
    AltCell,
    Tel,
    AltTel,
    WorkPhone,
    IndirectCell,
    IndirectTel,
    CaretakerCell,
    CaretakerTel,
    PhysicalAddress,
    Workplace,
    IndirectAddress,
}

impl ContactChannel {
    /// Dialing order presented to callers.
    pub const PHONE_PRIORITY: [ContactChannel; 9] = [
        ContactChannel::Cell,
        ContactChannel::AltCell,
        ContactChannel::Tel,
        ContactChannel::AltTel,
        ContactChannel::WorkPhone,
        ContactChannel::IndirectCell,
        ContactChannel::IndirectTel,
        ContactChannel::CaretakerCell,
        ContactChannel::CaretakerTel,
    ];

    pub const fn is_phone(self) -> bool {
        !matches!(
            self,
            ContactChannel::PhysicalAddress
                | ContactChannel::Workplace
                | ContactChannel::IndirectAddress
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            ContactChannel::Cell => "Cell",
            ContactChannel::AltCell => "Alternative Cell",
            ContactChannel::Tel => "Telephone",
            ContactChannel::AltTel => "Alternative Telephone",
            ContactChannel::WorkPhone => "Work Phone",
            ContactChannel::IndirectCell => "Indirect Contact Cell",
            ContactChannel::IndirectTel => "Indirect Contact Telephone",
            ContactChannel::CaretakerCell => "Caretaker Cell",
            ContactChannel::CaretakerTel => "Caretaker Telephone",
            ContactChannel::PhysicalAddress => "Physical Address",
            ContactChannel::Workplace => "Workplace",
            ContactChannel::IndirectAddress => "Indirect Contact Address",
        }
    }
}

/// Outcome code for a single contact attempt.
///
/// `NoneOfTheAbove` means every listed channel was tried and failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactOutcome {
    Success,
    NoResponse,
    VoicemailNotLeft,
    Disconnected,
    NoneOfTheAbove,
    Other,
}

impl ContactOutcome {
    pub const ALL: [ContactOutcome; 6] = [
        ContactOutcome::Success,
        ContactOutcome::NoResponse,
        ContactOutcome::VoicemailNotLeft,
        ContactOutcome::Disconnected,
        ContactOutcome::NoneOfTheAbove,
        ContactOutcome::Other,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ContactOutcome::Success => "Reached participant",
            ContactOutcome::NoResponse => "No response",
            ContactOutcome::VoicemailNotLeft => "No response, voicemail not left",
            ContactOutcome::Disconnected => "Number disconnected",
            ContactOutcome::NoneOfTheAbove => "None of the above",
            ContactOutcome::Other => "Other",
        }
    }
}

/// Closed yes/no answer used by the eligibility questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
}

/// Answer that allows a participant to defer the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deliberation {
    Yes,
    No,
    StillThinking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Consenting,
    Screening,
    ReCall,
    Other,
}

impl AppointmentType {
    pub const fn label(self) -> &'static str {
        match self {
            AppointmentType::Consenting => "Consenting",
            AppointmentType::Screening => "Screening",
            AppointmentType::ReCall => "Re-call",
            AppointmentType::Other => "Other",
        }
    }
}

/// Closed eligibility questions asked during a call.
///
/// Any `no` disqualifies the participant; all six must be `yes` (with an
/// accepted appointment) before the participant counts as eligible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityAnswers {
    #[serde(default)]
    pub has_child: Option<Answer>,
    #[serde(default)]
    pub caregiver_age: Option<Answer>,
    #[serde(default)]
    pub caregiver_has_id: Option<Answer>,
    #[serde(default)]
    pub willing_consent: Option<Deliberation>,
    #[serde(default)]
    pub willing_assent: Option<Answer>,
    #[serde(default)]
    pub study_interest: Option<Answer>,
}

impl EligibilityAnswers {
    pub fn any_no(&self) -> bool {
        self.has_child == Some(Answer::No)
            || self.caregiver_age == Some(Answer::No)
            || self.caregiver_has_id == Some(Answer::No)
            || self.willing_consent == Some(Deliberation::No)
            || self.willing_assent == Some(Answer::No)
            || self.study_interest == Some(Answer::No)
    }

    pub fn all_yes(&self) -> bool {
        self.has_child == Some(Answer::Yes)
            && self.caregiver_age == Some(Answer::Yes)
            && self.caregiver_has_id == Some(Answer::Yes)
            && self.willing_consent == Some(Deliberation::Yes)
            && self.willing_assent == Some(Answer::Yes)
            && self.study_interest == Some(Answer::Yes)
    }
}

/// Whether the worker chose to escalate this attempt to a home visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeVisitDisposition {
    #[default]
    NotApplicable,
    Performed,
}

/// A single logged attempt to reach a participant, by phone or in person.
///
/// Records are append-only: once stored they are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub subject_id: SubjectId,
    /// Username of the worker who logged the attempt.
    pub worker: String,
    pub channel: ContactChannel,
    pub attempted_at: DateTime<Utc>,
    pub outcome: ContactOutcome,
    /// Willingness to schedule an appointment, when the question was reached.
    #[serde(default)]
    pub appointment: Option<Deliberation>,
    #[serde(default)]
    pub appointment_date: Option<NaiveDate>,
    #[serde(default)]
    pub appointment_type: Option<AppointmentType>,
    #[serde(default)]
    pub eligibility: EligibilityAnswers,
    #[serde(default)]
    pub home_visit: HomeVisitDisposition,
    /// Whether this was agreed to be the final contact with the participant.
    #[serde(default)]
    pub final_contact: Option<Answer>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ContactRecord {
    /// True when the attempt reached someone, i.e. the outcome is anything
    /// other than the every-channel-exhausted marker.
    pub fn counts_as_reached(&self) -> bool {
        self.outcome != ContactOutcome::NoneOfTheAbove
    }

    pub fn appointment_accepted(&self) -> bool {
        self.appointment == Some(Deliberation::Yes)
    }
}

/// A participant's entry in the follow-up work queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub subject_id: SubjectId,
    /// Prior-study tag the participant was recruited from.
    pub cohort: String,
    pub assigned: Option<String>,
    pub date_assigned: Option<NaiveDate>,
    pub is_called: bool,
    pub called_at: Option<DateTime<Utc>>,
    pub visited: bool,
    pub consented: bool,
    pub entered_pool_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(subject_id: SubjectId, cohort: impl Into<String>, entered_pool_at: DateTime<Utc>) -> Self {
        Self {
            subject_id,
            cohort: cohort.into(),
            assigned: None,
            date_assigned: None,
            is_called: false,
            called_at: None,
            visited: false,
            consented: false,
            entered_pool_at,
        }
    }

    /// Membership test for the randomized assignment pool.
    pub fn is_assignable(&self) -> bool {
        !self.is_called && !self.consented && self.assigned.is_none() && self.date_assigned.is_none()
    }
}

/// Directory snapshot of a participant's known contact channels.
///
/// Owned by an external directory service; read-only here. The latest record
/// per subject (by report timestamp) is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocatorInfo {
    pub subject_id: SubjectId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub cell: Option<String>,
    #[serde(default)]
    pub alt_cell: Option<String>,
    #[serde(default)]
    pub tel: Option<String>,
    #[serde(default)]
    pub alt_tel: Option<String>,
    #[serde(default)]
    pub work_phone: Option<String>,
    #[serde(default)]
    pub indirect_cell: Option<String>,
    #[serde(default)]
    pub indirect_tel: Option<String>,
    #[serde(default)]
    pub caretaker_cell: Option<String>,
    #[serde(default)]
    pub caretaker_tel: Option<String>,
    #[serde(default)]
    pub physical_address: Option<String>,
    #[serde(default)]
    pub workplace: Option<String>,
    #[serde(default)]
    pub indirect_address: Option<String>,
    pub may_call: bool,
    pub may_visit_home: bool,
    pub report_timestamp: DateTime<Utc>,
}

impl LocatorInfo {
    /// Value stored in the slot for `channel`, if any.
    pub fn channel_value(&self, channel: ContactChannel) -> Option<&str> {
        let slot = match channel {
            ContactChannel::Cell => &self.cell,
            ContactChannel::AltCell => &self.alt_cell,
            ContactChannel::Tel => &self.tel,
            ContactChannel::AltTel => &self.alt_tel,
            ContactChannel::WorkPhone => &self.work_phone,
            ContactChannel::IndirectCell => &self.indirect_cell,
            ContactChannel::IndirectTel => &self.indirect_tel,
            ContactChannel::CaretakerCell => &self.caretaker_cell,
            ContactChannel::CaretakerTel => &self.caretaker_tel,
            ContactChannel::PhysicalAddress => &self.physical_address,
            ContactChannel::Workplace => &self.workplace,
            ContactChannel::IndirectAddress => &self.indirect_address,
        };
        slot.as_deref().filter(|value| !value.trim().is_empty())
    }

    /// Participant name as stored on the locator, for booking rows.
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => String::new(),
        }
    }
}

/// A scheduled appointment derived from an accepted contact outcome.
///
/// One row per subject; a later acceptance updates the date and type in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub subject_id: SubjectId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub booking_date: NaiveDate,
    pub appointment_type: AppointmentType,
}

/// Derived eligibility standing for a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    Eligible,
    Ineligible,
    Pending,
}

impl EligibilityStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EligibilityStatus::Eligible => "Eligible",
            EligibilityStatus::Ineligible => "Ineligible",
            EligibilityStatus::Pending => "Pending",
        }
    }
}
