use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::config::LauncherConfig;

mod config;
mod engine;
mod env;
mod error;
mod headless;
mod installer;
mod networking;
mod platform;
mod process;
mod storage;
mod ui;
mod updater;
mod util;
mod version;

#[cfg(test)]
mod test_support;

#[derive(Parser, Debug)]
#[command(
    name = "Coinfight Launcher",
    author,
    version,
    about = "Keeps Coinfight up to date and starts it"
)]
struct Cli {
    /// Print launcher version and exit without starting the UI.
    #[arg(long)]
    version_only: bool,

    /// Run in the terminal instead of opening a window; updates are applied automatically.
    #[arg(long)]
    headless: bool,

    /// Start the game once it is up to date (terminal mode only).
    #[arg(long, requires = "headless")]
    play: bool,

    /// Override the release manifest URL.
    #[arg(long, value_name = "URL")]
    manifest_url: Option<String>,

    /// Override the base URL release archives are downloaded from.
    #[arg(long, value_name = "URL")]
    release_url: Option<String>,

    /// Override the data directory (version marker and downloads).
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Override the install directory (Linux only).
    #[arg(long, value_name = "DIR")]
    install_dir: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, mut config: LauncherConfig) -> LauncherConfig {
        if let Some(url) = &self.manifest_url {
            config.manifest_url = url.clone();
        }
        if let Some(url) = &self.release_url {
            config.release_base_url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.install_dir {
            config.install_dir = dir.clone();
        }
        config
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.version_only {
        println!("Coinfight Launcher {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let config = cli.apply(LauncherConfig::from_env());
    info!(
        "launcher {} on {}: data {}, install {}",
        env!("CARGO_PKG_VERSION"),
        config.platform,
        config.data_dir.display(),
        config.layout().install_dir().display()
    );

    if cli.headless {
        return headless::run(config, cli.play);
    }
    match ui::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("ui: {err}");
            ExitCode::FAILURE
        }
    }
}
