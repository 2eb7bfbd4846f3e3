use super::domain::{ContactChannel, LocatorInfo, SubjectId};

/// Error raised by the external directory service.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("locator directory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to the participant contact directory.
///
/// `Ok(None)` means "no channels known" for the subject, a normal outcome
/// callers must branch on. The implementation resolves ties between multiple
/// locator reports by returning the one with the latest report timestamp.
pub trait LocatorDirectory: Send + Sync {
    fn latest_locator(&self, subject: &SubjectId) -> Result<Option<LocatorInfo>, DirectoryError>;
}

/// Phone channels present on the locator, in the fixed dialing priority,
/// with empty slots filtered out.
pub fn available_channels(locator: &LocatorInfo) -> Vec<(ContactChannel, String)> {
    ContactChannel::PHONE_PRIORITY
        .iter()
        .filter_map(|channel| {
            locator
                .channel_value(*channel)
                .map(|value| (*channel, value.to_string()))
        })
        .collect()
}
