use crate::version::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    UpToDate,
    UpdateAvailable,
}

/// Decide whether the remote release must be installed.
///
/// No local install always needs an update. Otherwise any difference, including
/// a remote version that looks older, counts as an update: the manifest is the
/// single source of truth for what players should run.
#[must_use]
pub fn decide(local: Option<&Version>, remote: &Version) -> UpdateDecision {
    match local {
        Some(local) if local == remote => UpdateDecision::UpToDate,
        _ => UpdateDecision::UpdateAvailable,
    }
}
