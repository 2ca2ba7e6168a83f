use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, warn};
use tokio::fs;

use crate::error::{LauncherError, Result};
use crate::version::Version;

pub const VERSION_MARKER_FILE: &str = "version";

/// Reads and writes the installed-version marker in the data directory.
#[derive(Clone, Debug)]
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn marker_path(&self) -> PathBuf {
        self.base_dir.join(VERSION_MARKER_FILE)
    }

    /// `Ok(None)` when nothing is installed yet. A marker that exists but does not
    /// parse is reported as [`LauncherError::CorruptVersion`], never as absence.
    pub async fn read_local_version(&self) -> Result<Option<Version>> {
        let path = self.marker_path();
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("storage: no version marker at {}", path.display());
                return Ok(None);
            }
            Err(err) => {
                return Err(LauncherError::io(
                    format!("unable to read {}", path.display()),
                    err,
                ));
            }
        };

        let contents = String::from_utf8_lossy(&bytes).into_owned();
        match contents.parse::<Version>() {
            Ok(version) => {
                debug!("storage: installed version {version}");
                Ok(Some(version))
            }
            Err(err) => {
                warn!("storage: corrupt version marker {}: {err}", path.display());
                Err(LauncherError::CorruptVersion { path, contents })
            }
        }
    }

    pub async fn write_local_version(&self, version: &Version) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| LauncherError::io("unable to create data dir", e))?;
        let path = self.marker_path();
        fs::write(&path, version.to_string())
            .await
            .map_err(|e| LauncherError::io("unable to persist version", e))?;
        debug!("storage: wrote version {version} to {}", path.display());
        Ok(())
    }
}
