use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use indicatif::{ProgressBar, ProgressStyle};
use log::error;
use tokio::sync::mpsc;

use crate::config::LauncherConfig;
use crate::engine::LaunchController;
use crate::engine::state::{LauncherState, UpdateStage, UserAction};
use crate::version::Version;

/// Check, update when needed and optionally play, reporting progress on the terminal.
pub fn run(config: LauncherConfig, play: bool) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            error!("headless: failed to create Tokio runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(drive(config, play))
}

async fn drive(config: LauncherConfig, play: bool) -> ExitCode {
    let mut controller = LaunchController::new(config, Arc::new(AtomicBool::new(false)));
    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(render(rx));

    controller.handle_action(UserAction::CheckRequested, &tx).await;
    if controller.state().accepts(UserAction::UpdateConfirmed) {
        controller.handle_action(UserAction::UpdateConfirmed, &tx).await;
    }
    if play && controller.state().accepts(UserAction::PlayRequested) {
        controller.handle_action(UserAction::PlayRequested, &tx).await;
    }

    let failed = controller.state().is_error();
    drop(tx);
    let _ = printer.await;
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn render(mut rx: mpsc::UnboundedReceiver<LauncherState>) {
    let mut bar: Option<ProgressBar> = None;
    while let Some(state) = rx.recv().await {
        if let LauncherState::Updating {
            version,
            stage: UpdateStage::Downloading,
            progress,
            ..
        } = &state
        {
            match progress.total {
                Some(total) => bar
                    .get_or_insert_with(|| download_bar(version, total))
                    .set_position(progress.downloaded),
                None if bar.is_none() => println!("Downloading {}...", version.tag()),
                None => {}
            }
            continue;
        }

        if let Some(done) = bar.take() {
            done.finish_and_clear();
        }
        let message = state.status_message();
        if !message.is_empty() {
            if state.is_error() {
                eprintln!("{message}");
            } else {
                println!("{message}");
            }
        }
    }
}

fn download_bar(version: &Version, total: u64) -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
    )
    .map(|style| style.progress_chars("=>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    let bar = ProgressBar::new(total).with_style(style);
    bar.set_message(format!("Downloading {}", version.tag()));
    bar
}
