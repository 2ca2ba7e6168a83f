use crate::engine::models::DownloadProgress;
use crate::util::progress_text;
use crate::version::Version;

const MAINTENANCE_NOTE: &str =
    "Note: the Coinfight servers are being updated. You may not be able to connect right now.";

// The central source of truth for the UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LauncherState {
    Idle,
    CheckingUpdate,
    UpdateAvailable {
        installed: Option<Version>,
        latest: Version,
        maintenance: bool,
    },
    Updating {
        version: Version,
        stage: UpdateStage,
        progress: DownloadProgress,
        maintenance: bool,
    },
    Playable {
        version: Version,
        reason: ReadyReason,
        maintenance: bool,
    },
    Launching {
        version: Version,
        maintenance: bool,
    },
    /// Terminal for this run: restart the launcher to check again.
    CheckError(String),
    UpdateError(String),
    LaunchError(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateStage {
    Downloading,
    Installing,
    /// The server sent no content length; body saved without progress.
    InstallingUnsized,
}

/// Why the launcher is ready to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyReason {
    UpToDate,
    Updated,
    /// The game just exited; the status line is cleared.
    Exited,
}

// Intents forwarded by the front-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserAction {
    CheckRequested,
    UpdateConfirmed,
    PlayRequested,
}

/// The single button shown next to the status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Update,
    Play,
}

impl ButtonAction {
    pub fn label(self) -> &'static str {
        match self {
            ButtonAction::Update => "Update",
            ButtonAction::Play => "Play",
        }
    }

    pub fn action(self) -> UserAction {
        match self {
            ButtonAction::Update => UserAction::UpdateConfirmed,
            ButtonAction::Play => UserAction::PlayRequested,
        }
    }
}

impl LauncherState {
    /// Enabled button for this state, if any.
    pub fn button(&self) -> Option<ButtonAction> {
        match self {
            LauncherState::UpdateAvailable { .. } => Some(ButtonAction::Update),
            LauncherState::Playable { .. } => Some(ButtonAction::Play),
            _ => None,
        }
    }

    /// Whether `action` drives a transition from this state.
    pub fn accepts(&self, action: UserAction) -> bool {
        match action {
            UserAction::CheckRequested => matches!(self, LauncherState::Idle),
            _ => self.button().map(ButtonAction::action) == Some(action),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            LauncherState::CheckError(_)
                | LauncherState::UpdateError(_)
                | LauncherState::LaunchError(_)
        )
    }

    pub fn progress(&self) -> Option<DownloadProgress> {
        match self {
            LauncherState::Updating {
                stage: UpdateStage::Downloading,
                progress,
                ..
            } => Some(*progress),
            _ => None,
        }
    }

    pub fn maintenance(&self) -> bool {
        match self {
            LauncherState::UpdateAvailable { maintenance, .. }
            | LauncherState::Updating { maintenance, .. }
            | LauncherState::Playable { maintenance, .. }
            | LauncherState::Launching { maintenance, .. } => *maintenance,
            _ => false,
        }
    }

    pub fn status_message(&self) -> String {
        let message = match self {
            LauncherState::Idle => String::new(),
            LauncherState::CheckingUpdate => "Checking for updates...".into(),
            LauncherState::UpdateAvailable {
                installed: None,
                latest,
                ..
            } => format!("Coinfight {} is available to install.", latest.tag()),
            LauncherState::UpdateAvailable {
                installed: Some(installed),
                latest,
                ..
            } => format!(
                "Update available: {} -> {}.",
                installed.tag(),
                latest.tag()
            ),
            LauncherState::Updating {
                version,
                stage,
                progress,
                ..
            } => match stage {
                UpdateStage::Downloading => format!(
                    "Downloading {}... {}",
                    version.tag(),
                    progress_text(progress.downloaded, progress.total)
                ),
                UpdateStage::Installing => "Download complete! Installing...".into(),
                UpdateStage::InstallingUnsized => {
                    "The server did not report a download size, which is unexpected. Installing anyway..."
                        .into()
                }
            },
            LauncherState::Playable {
                version, reason, ..
            } => match reason {
                ReadyReason::UpToDate => format!("Coinfight {} is up to date.", version.tag()),
                ReadyReason::Updated => {
                    format!("Coinfight {} installed. Ready to play!", version.tag())
                }
                ReadyReason::Exited => String::new(),
            },
            LauncherState::Launching { .. } => "Coinfight is running...".into(),
            LauncherState::CheckError(msg)
            | LauncherState::UpdateError(msg)
            | LauncherState::LaunchError(msg) => msg.clone(),
        };

        let show_note = self.maintenance()
            && !matches!(self, LauncherState::Launching { .. } | LauncherState::Updating { .. });
        match (show_note, message.is_empty()) {
            (false, _) => message,
            (true, true) => MAINTENANCE_NOTE.into(),
            (true, false) => format!("{message}\n{MAINTENANCE_NOTE}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn all_states() -> Vec<LauncherState> {
        vec![
            LauncherState::Idle,
            LauncherState::CheckingUpdate,
            LauncherState::UpdateAvailable {
                installed: None,
                latest: v("1"),
                maintenance: false,
            },
            LauncherState::Updating {
                version: v("1"),
                stage: UpdateStage::Downloading,
                progress: DownloadProgress::default(),
                maintenance: false,
            },
            LauncherState::Playable {
                version: v("1"),
                reason: ReadyReason::UpToDate,
                maintenance: false,
            },
            LauncherState::Launching {
                version: v("1"),
                maintenance: false,
            },
            LauncherState::CheckError("x".into()),
            LauncherState::UpdateError("x".into()),
            LauncherState::LaunchError("x".into()),
        ]
    }

    #[test]
    fn at_most_one_action_is_accepted_per_state() {
        let actions = [
            UserAction::CheckRequested,
            UserAction::UpdateConfirmed,
            UserAction::PlayRequested,
        ];
        for state in all_states() {
            let accepted = actions.iter().filter(|a| state.accepts(**a)).count();
            assert!(accepted <= 1, "{state:?} accepts {accepted} actions");
            if let Some(button) = state.button() {
                assert!(state.accepts(button.action()));
            }
        }
    }

    #[test]
    fn busy_and_error_states_accept_nothing() {
        for state in all_states() {
            if state.is_error()
                || matches!(
                    state,
                    LauncherState::CheckingUpdate
                        | LauncherState::Updating { .. }
                        | LauncherState::Launching { .. }
                )
            {
                assert!(state.button().is_none());
                assert!(!state.accepts(UserAction::CheckRequested));
                assert!(!state.accepts(UserAction::UpdateConfirmed));
                assert!(!state.accepts(UserAction::PlayRequested));
            }
        }
    }

    #[test]
    fn maintenance_note_is_attached_to_ready_messages() {
        let updated = LauncherState::Playable {
            version: v("0.3.5.0"),
            reason: ReadyReason::Updated,
            maintenance: true,
        };
        let message = updated.status_message();
        assert!(message.contains("v0.3.5.0"));
        assert!(message.contains(MAINTENANCE_NOTE));

        let available = LauncherState::UpdateAvailable {
            installed: Some(v("0.3.4")),
            latest: v("0.3.5.0"),
            maintenance: true,
        };
        assert!(available.status_message().contains(MAINTENANCE_NOTE));

        let calm = LauncherState::Playable {
            version: v("1"),
            reason: ReadyReason::UpToDate,
            maintenance: false,
        };
        assert!(!calm.status_message().contains(MAINTENANCE_NOTE));
    }

    #[test]
    fn exit_clears_status_line() {
        let exited = LauncherState::Playable {
            version: v("1"),
            reason: ReadyReason::Exited,
            maintenance: false,
        };
        assert_eq!(exited.status_message(), "");
        assert_eq!(exited.button(), Some(ButtonAction::Play));
    }

    #[test]
    fn download_progress_is_rendered() {
        let state = LauncherState::Updating {
            version: v("2.0"),
            stage: UpdateStage::Downloading,
            progress: DownloadProgress {
                downloaded: 512,
                total: Some(1_024),
            },
            maintenance: false,
        };
        assert_eq!(state.status_message(), "Downloading v2.0... 50% (512 B of 1.0 KB)");
        assert_eq!(state.progress().map(|p| p.downloaded), Some(512));
    }
}
