use std::env;
use std::path::PathBuf;

use crate::platform::Platform;

const APP_DIR_NAME: &str = "coinfight";

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

/// Writable per-user directory holding the version marker and downloads.
pub fn default_data_dir(platform: Platform) -> PathBuf {
    let base = match platform {
        Platform::Windows => env::var_os("LOCALAPPDATA")
            .or_else(|| env::var_os("APPDATA"))
            .map(PathBuf::from),
        Platform::MacOs => home_dir().map(|home| home.join("Library").join("Application Support")),
        Platform::Linux => env::var_os("XDG_DATA_HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|home| home.join(".local").join("share"))),
    }
    .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_DIR_NAME)
}

/// Final location of the runnable program. Only Linux keeps it apart from the data dir.
pub fn default_install_dir(platform: Platform) -> PathBuf {
    match platform {
        Platform::Linux => home_dir()
            .map(|home| home.join(".local").join("lib"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME),
        Platform::Windows | Platform::MacOs => default_data_dir(platform),
    }
}
