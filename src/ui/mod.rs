use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eframe::egui::{self, Color32, RichText};
use log::{error, info, warn};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::{Mutex, mpsc};

use crate::config::LauncherConfig;
use crate::engine::LaunchController;
use crate::engine::state::{LauncherState, UserAction};
use crate::util::progress_fraction;

const WINDOW_TITLE: &str = "Coinfight Launcher";

/// Open the launcher window and block until it is closed.
pub fn run(config: LauncherConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(egui::vec2(600.0, 400.0)),
        ..Default::default()
    };
    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(LauncherApp::new(config)))),
    )
}

fn build_runtime() -> Arc<Runtime> {
    match Runtime::new() {
        Ok(rt) => Arc::new(rt),
        Err(err) => {
            warn!(
                "ui: failed to create multithreaded runtime ({}); trying single-threaded runtime",
                err
            );
            match Builder::new_current_thread().enable_all().build() {
                Ok(rt) => Arc::new(rt),
                Err(fallback_err) => {
                    error!(
                        "ui: failed to create any Tokio runtime ({}); terminating launcher",
                        fallback_err
                    );
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Holds a window close back while an update runs, so a cancelled download
/// can remove its partial file before the runtime is dropped.
#[derive(Debug, Default)]
struct CloseGuard {
    deferred: bool,
}

impl CloseGuard {
    /// Returns `true` when the close must be cancelled for now.
    fn on_close_requested(&mut self, state: &LauncherState, cancel_flag: &AtomicBool) -> bool {
        if !matches!(state, LauncherState::Updating { .. }) {
            return false;
        }
        cancel_flag.store(true, Ordering::SeqCst);
        self.deferred = true;
        true
    }

    fn ready_to_close(&self, state: &LauncherState) -> bool {
        self.deferred && !matches!(state, LauncherState::Updating { .. })
    }
}

/// Thin window over [`LaunchController`]: one status line, one progress bar, one button.
pub struct LauncherApp {
    runtime: Arc<Runtime>,
    controller: Arc<Mutex<LaunchController>>,
    cancel_flag: Arc<AtomicBool>,
    updates_rx: mpsc::UnboundedReceiver<LauncherState>,
    updates_tx: mpsc::UnboundedSender<LauncherState>,
    state: LauncherState,
    /// An action was sent and its first transition has not arrived yet.
    pending: bool,
    close_guard: CloseGuard,
}

impl LauncherApp {
    pub fn new(config: LauncherConfig) -> Self {
        let runtime = build_runtime();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let controller = Arc::new(Mutex::new(LaunchController::new(
            config,
            cancel_flag.clone(),
        )));
        let (tx, rx) = mpsc::unbounded_channel();

        let app = Self {
            runtime,
            controller,
            cancel_flag,
            updates_rx: rx,
            updates_tx: tx,
            state: LauncherState::Idle,
            pending: false,
            close_guard: CloseGuard::default(),
        };
        app.trigger_action(UserAction::CheckRequested);
        app
    }

    fn trigger_action(&self, action: UserAction) {
        let controller = self.controller.clone();
        let tx = self.updates_tx.clone();
        self.runtime.spawn(async move {
            let mut locked = controller.lock().await;
            locked.handle_action(action, &tx).await;
        });
    }

    fn sync_state(&mut self) {
        while let Ok(state) = self.updates_rx.try_recv() {
            self.pending = false;
            self.state = state;
        }
    }

    fn render_status(&mut self, ui: &mut egui::Ui) {
        let message = self.state.status_message();
        let color = if self.state.is_error() {
            Color32::from_rgb(255, 110, 110)
        } else {
            Color32::WHITE
        };
        ui.label(RichText::new(message).size(20.0).color(color));

        if let Some(progress) = self.state.progress() {
            ui.add_space(12.0);
            ui.add(
                egui::ProgressBar::new(progress_fraction(progress.downloaded, progress.total))
                    .desired_width(400.0)
                    .show_percentage(),
            );
        }

        if let Some(button) = self.state.button() {
            ui.add_space(16.0);
            let label = RichText::new(button.label()).size(20.0).strong();
            let clicked = ui
                .add_enabled(
                    !self.pending,
                    egui::Button::new(label).min_size(egui::vec2(160.0, 44.0)),
                )
                .clicked();
            if clicked {
                self.pending = true;
                self.trigger_action(button.action());
            }
        }
    }
}

impl eframe::App for LauncherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync_state();

        if ctx.input(|i| i.viewport().close_requested())
            && self
                .close_guard
                .on_close_requested(&self.state, &self.cancel_flag)
        {
            info!("ui: window closed during update; cancelling download first");
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
        } else if self.close_guard.ready_to_close(&self.state) {
            info!("ui: update stopped; closing window");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(Color32::BLACK))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() * 0.3);
                    self.render_status(ui);
                });
            });

        // Transitions arrive from the runtime; keep polling the channel.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::DownloadProgress;
    use crate::engine::state::{ReadyReason, UpdateStage};

    fn updating() -> LauncherState {
        LauncherState::Updating {
            version: "0.3.5.0".parse().unwrap(),
            stage: UpdateStage::Downloading,
            progress: DownloadProgress::default(),
            maintenance: false,
        }
    }

    #[test]
    fn close_during_update_waits_for_cancellation() {
        let flag = AtomicBool::new(false);
        let mut guard = CloseGuard::default();

        assert!(guard.on_close_requested(&updating(), &flag));
        assert!(flag.load(Ordering::SeqCst));
        assert!(!guard.ready_to_close(&updating()));

        let cancelled = LauncherState::UpdateError("download cancelled".into());
        assert!(guard.ready_to_close(&cancelled));
    }

    #[test]
    fn close_outside_update_is_not_held() {
        let flag = AtomicBool::new(false);
        let mut guard = CloseGuard::default();
        let ready = LauncherState::Playable {
            version: "1".parse().unwrap(),
            reason: ReadyReason::UpToDate,
            maintenance: false,
        };

        assert!(!guard.on_close_requested(&ready, &flag));
        assert!(!flag.load(Ordering::SeqCst));
        assert!(!guard.ready_to_close(&ready));
    }
}
