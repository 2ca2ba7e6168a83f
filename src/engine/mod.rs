use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::config::LauncherConfig;
use crate::engine::models::{DownloadOutcome, DownloadProgress, ReleaseAsset, RemoteManifest};
use crate::engine::state::{LauncherState, ReadyReason, UpdateStage, UserAction};
use crate::error::{LauncherError, Result};
use crate::installer::Installer;
use crate::networking::NetworkClient;
use crate::platform::InstallLayout;
use crate::process::ProcessLauncher;
use crate::storage::StorageManager;
use crate::updater::{UpdateDecision, decide};
use crate::version::Version;

pub mod models;
pub mod state;

/// Update/launch state machine. Owned by the composition root; front-ends
/// forward [`UserAction`]s and observe every transition on the `updates` channel.
pub struct LaunchController {
    state: LauncherState,
    config: LauncherConfig,
    layout: InstallLayout,
    networking: NetworkClient,
    storage: StorageManager,
    installer: Installer,
    process: ProcessLauncher,
    cancel_flag: Arc<AtomicBool>,
}

impl LaunchController {
    pub fn new(config: LauncherConfig, cancel_flag: Arc<AtomicBool>) -> Self {
        let layout = config.layout();
        let storage = StorageManager::new(&layout.data_dir);
        let installer = Installer::new(layout.clone(), storage.clone());
        let networking = NetworkClient::new(config.connect_timeout);
        Self {
            state: LauncherState::Idle,
            config,
            layout,
            networking,
            storage,
            installer,
            process: ProcessLauncher::new(),
            cancel_flag,
        }
    }

    pub fn state(&self) -> &LauncherState {
        &self.state
    }

    /// Apply one user intent. Intents the current state does not offer are ignored.
    pub async fn handle_action(
        &mut self,
        action: UserAction,
        updates: &mpsc::UnboundedSender<LauncherState>,
    ) {
        if !self.state.accepts(action) {
            debug!("action: ignoring {:?} in state {:?}", action, self.state);
            return;
        }
        info!("action: {:?}", action);
        match action {
            UserAction::CheckRequested => self.check_for_updates(updates).await,
            UserAction::UpdateConfirmed => self.update(updates).await,
            UserAction::PlayRequested => self.play(updates).await,
        }
    }

    async fn check_for_updates(&mut self, updates: &mpsc::UnboundedSender<LauncherState>) {
        self.set_state(LauncherState::CheckingUpdate, updates);
        match self.try_check().await {
            Ok(state) => self.set_state(state, updates),
            Err(err) => {
                error!("check: {err}");
                self.set_state(LauncherState::CheckError(err.user_message()), updates);
            }
        }
    }

    async fn try_check(&self) -> Result<LauncherState> {
        let installed = self.storage.read_local_version().await?;
        let RemoteManifest {
            version: latest,
            server_maintenance: maintenance,
        } = self.networking.fetch_manifest(&self.config.manifest_url).await?;
        if maintenance {
            warn!("check: servers report maintenance");
        }

        let decision = decide(installed.as_ref(), &latest);
        info!(
            "check: installed {:?}, latest {latest}, decision {:?}",
            installed.as_ref().map(Version::to_string),
            decision
        );
        let state = match decision {
            UpdateDecision::UpToDate if self.layout.is_installed() => LauncherState::Playable {
                version: latest,
                reason: ReadyReason::UpToDate,
                maintenance,
            },
            UpdateDecision::UpToDate => {
                warn!(
                    "check: marker is current but {} is missing; offering reinstall",
                    self.layout.executable_path().display()
                );
                LauncherState::UpdateAvailable {
                    installed,
                    latest,
                    maintenance,
                }
            }
            UpdateDecision::UpdateAvailable => LauncherState::UpdateAvailable {
                installed,
                latest,
                maintenance,
            },
        };
        Ok(state)
    }

    async fn update(&mut self, updates: &mpsc::UnboundedSender<LauncherState>) {
        let LauncherState::UpdateAvailable {
            latest,
            maintenance,
            ..
        } = self.state.clone()
        else {
            return;
        };

        self.cancel_flag.store(false, Ordering::SeqCst);
        self.set_state(
            LauncherState::Updating {
                version: latest.clone(),
                stage: UpdateStage::Downloading,
                progress: DownloadProgress::default(),
                maintenance,
            },
            updates,
        );

        match self.try_update(&latest, maintenance, updates).await {
            Ok(()) => self.set_state(
                LauncherState::Playable {
                    version: latest,
                    reason: ReadyReason::Updated,
                    maintenance,
                },
                updates,
            ),
            Err(err) => {
                error!("update: {err}");
                self.set_state(LauncherState::UpdateError(err.user_message()), updates);
            }
        }
    }

    async fn try_update(
        &self,
        version: &Version,
        maintenance: bool,
        updates: &mpsc::UnboundedSender<LauncherState>,
    ) -> Result<()> {
        let tag = version.tag();
        let asset = ReleaseAsset {
            url: self.config.archive_url(&tag),
            tag,
        };
        let archive = self.layout.archive_path();

        let outcome = self
            .networking
            .download_archive(&asset, &archive, Some(self.cancel_flag.as_ref()), |progress| {
                let _ = updates.send(LauncherState::Updating {
                    version: version.clone(),
                    stage: UpdateStage::Downloading,
                    progress,
                    maintenance,
                });
            })
            .await?;

        let stage = match outcome {
            DownloadOutcome::Complete { bytes } => {
                debug!("update: downloaded {bytes} bytes");
                UpdateStage::Installing
            }
            DownloadOutcome::Unsized { bytes } => {
                warn!("update: download had no content length ({bytes} bytes saved)");
                UpdateStage::InstallingUnsized
            }
        };
        let _ = updates.send(LauncherState::Updating {
            version: version.clone(),
            stage,
            progress: DownloadProgress::default(),
            maintenance,
        });

        self.installer.install(&archive, version).await
    }

    async fn play(&mut self, updates: &mpsc::UnboundedSender<LauncherState>) {
        let LauncherState::Playable {
            version,
            maintenance,
            ..
        } = self.state.clone()
        else {
            return;
        };

        self.set_state(
            LauncherState::Launching {
                version: version.clone(),
                maintenance,
            },
            updates,
        );

        match self.run_game().await {
            Ok(()) => self.set_state(
                LauncherState::Playable {
                    version,
                    reason: ReadyReason::Exited,
                    maintenance,
                },
                updates,
            ),
            Err(err) => {
                error!("launch: {err}");
                self.set_state(LauncherState::LaunchError(err.user_message()), updates);
            }
        }
    }

    async fn run_game(&self) -> Result<()> {
        let process = self.process.clone();
        let install_dir = self.layout.install_dir();
        let executable = self.layout.platform.executable_name();
        let status = tokio::task::spawn_blocking(move || process.run(&install_dir, executable))
            .await
            .map_err(|e| LauncherError::Launch(format!("launch task failed: {e}")))??;
        debug!("launch: exit status {status} (not inspected)");
        Ok(())
    }

    fn set_state(&mut self, state: LauncherState, updates: &mpsc::UnboundedSender<LauncherState>) {
        debug!("state: {:?} -> {:?}", self.state, state);
        self.state = state.clone();
        let _ = updates.send(state);
    }
}
