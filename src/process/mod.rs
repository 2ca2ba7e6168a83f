use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use log::{debug, info, warn};

use crate::error::{LauncherError, Result};

/// Switches the process working directory and restores it when dropped.
struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    fn enter(dir: &Path) -> Result<Self> {
        let previous = env::current_dir()
            .map_err(|e| LauncherError::Launch(format!("cannot read working directory: {e}")))?;
        env::set_current_dir(dir)
            .map_err(|e| LauncherError::Launch(format!("cannot enter {}: {e}", dir.display())))?;
        debug!("launch: working directory {}", dir.display());
        Ok(Self { previous })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.previous) {
            warn!(
                "launch: failed to restore working directory {}: {err}",
                self.previous.display()
            );
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self {
        Self
    }

    /// Run `executable` from inside `install_dir` and block until it exits.
    ///
    /// The exit status is returned as-is; only a failure to start is an error.
    /// The previous working directory is restored in every case.
    pub fn run(&self, install_dir: &Path, executable: &str) -> Result<ExitStatus> {
        // Resolved before the directory switch so relative install dirs still work.
        let client_path = std::path::absolute(install_dir.join(executable))
            .map_err(|e| LauncherError::Launch(format!("cannot resolve game path: {e}")))?;
        if !client_path.is_file() {
            warn!("launch: client not found at {}", client_path.display());
            return Err(LauncherError::Launch(format!(
                "game executable not found at {}",
                client_path.display()
            )));
        }

        let _cwd = WorkingDirGuard::enter(install_dir)?;
        info!("launch: starting {}", client_path.display());
        let status = Command::new(&client_path)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| LauncherError::Launch(format!("failed to start game process: {e}")))?;
        info!("launch: game exited with {status}");
        Ok(status)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use serial_test::serial;

    use super::*;

    fn write_script(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    #[serial]
    fn runs_inside_install_dir_and_restores_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let install_dir = dir.path().canonicalize().unwrap();
        write_script(&install_dir, "coinfight", "pwd > ran-in.txt\nexit 3");
        let before = env::current_dir().unwrap();

        let status = ProcessLauncher::new().run(&install_dir, "coinfight").unwrap();

        assert_eq!(status.code(), Some(3));
        assert_eq!(env::current_dir().unwrap(), before);
        let ran_in = fs::read_to_string(install_dir.join("ran-in.txt")).unwrap();
        assert_eq!(PathBuf::from(ran_in.trim()), install_dir);
    }

    #[test]
    #[serial]
    fn missing_executable_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let before = env::current_dir().unwrap();
        let err = ProcessLauncher::new()
            .run(dir.path(), "coinfight")
            .unwrap_err();
        assert!(matches!(err, LauncherError::Launch(_)));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn unstartable_executable_restores_cwd() {
        let dir = tempfile::tempdir().unwrap();
        // Present but not executable: spawn fails after the directory switch.
        fs::write(dir.path().join("coinfight"), b"not a program").unwrap();
        let before = env::current_dir().unwrap();

        let err = ProcessLauncher::new()
            .run(dir.path(), "coinfight")
            .unwrap_err();
        assert!(matches!(err, LauncherError::Launch(_)));
        assert_eq!(env::current_dir().unwrap(), before);
    }
}
