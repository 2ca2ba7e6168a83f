use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info, warn};
use zip::read::ZipArchive;

use crate::error::{LauncherError, Result};
use crate::platform::InstallLayout;
use crate::storage::StorageManager;
use crate::version::Version;

/// Turns a downloaded release archive into a runnable installation.
#[derive(Clone, Debug)]
pub struct Installer {
    layout: InstallLayout,
    storage: StorageManager,
}

impl Installer {
    pub fn new(layout: InstallLayout, storage: StorageManager) -> Self {
        Self { layout, storage }
    }

    /// Extract, fix permissions, move into place, then record `version`.
    ///
    /// The marker is written last so an interrupted install leaves no marker
    /// and the next run downloads again. The archive is removed whether or
    /// not extraction succeeds.
    pub async fn install(&self, archive: &Path, version: &Version) -> Result<()> {
        let layout = self.layout.clone();
        let archive = archive.to_path_buf();
        tokio::task::spawn_blocking(move || install_files(&layout, &archive))
            .await
            .map_err(|e| LauncherError::Install(format!("install task failed: {e}")))??;

        self.storage.write_local_version(version).await?;
        info!("installer: version {version} installed");
        Ok(())
    }
}

fn install_files(layout: &InstallLayout, archive: &Path) -> Result<()> {
    let platform = layout.platform;
    let extracted = extract_zip(archive, &layout.data_dir);
    match fs::remove_file(archive) {
        Ok(()) => debug!("installer: removed {}", archive.display()),
        Err(err) => warn!("installer: could not remove {}: {err}", archive.display()),
    }
    let entries = extracted?;
    info!(
        "installer: extracted {entries} entries into {}",
        layout.data_dir.display()
    );

    let staged = layout.extracted_dir();
    if platform.needs_exec_bit() {
        set_executable(&staged.join(platform.executable_name()))?;
    }
    if platform.uses_separate_install_dir() {
        swap_into_place(&staged, &layout.install_dir())?;
    }
    Ok(())
}

fn extract_zip(archive_path: &Path, target: &Path) -> Result<usize> {
    let file = fs::File::open(archive_path)
        .map_err(|e| LauncherError::Extraction(format!("zip open error: {e}")))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| LauncherError::Extraction(format!("zip parse error: {e}")))?;
    fs::create_dir_all(target)
        .map_err(|e| LauncherError::Extraction(format!("target dir error: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| LauncherError::Extraction(format!("zip entry error: {e}")))?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("installer: skipping unsafe entry {:?}", entry.name());
            continue;
        };
        let out_path = target.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| LauncherError::Extraction(format!("zip dir create error: {e}")))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LauncherError::Extraction(format!("zip parent dir error: {e}")))?;
        }
        let mut out_file = fs::File::create(&out_path)
            .map_err(|e| LauncherError::Extraction(format!("zip create file error: {e}")))?;
        io::copy(&mut entry, &mut out_file)
            .map_err(|e| LauncherError::Extraction(format!("zip write error: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o7777))
                    .map_err(|e| LauncherError::Extraction(format!("zip mode error: {e}")))?;
            }
        }
    }
    Ok(archive.len())
}

/// Add the owner-execute bit, keeping every other mode bit.
#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)
        .map_err(|e| LauncherError::Permission(format!("{}: {e}", path.display())))?
        .permissions()
        .mode();
    fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o100))
        .map_err(|e| LauncherError::Permission(format!("{}: {e}", path.display())))?;
    debug!("installer: {} mode {:o}", path.display(), mode | 0o100);
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(LauncherError::Permission(format!(
            "{} does not exist",
            path.display()
        )))
    }
}

/// Replace `target` with `staged`: remove the old install, then rename.
fn swap_into_place(staged: &Path, target: &Path) -> Result<()> {
    if target.is_dir() {
        fs::remove_dir_all(target).map_err(|e| {
            LauncherError::Install(format!("remove {} failed: {e}", target.display()))
        })?;
    } else if target.exists() {
        fs::remove_file(target).map_err(|e| {
            LauncherError::Install(format!("remove {} failed: {e}", target.display()))
        })?;
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| LauncherError::Install(format!("create install parent failed: {e}")))?;
    }

    match fs::rename(staged, target) {
        Ok(()) => {}
        Err(err) => {
            // Rename fails across filesystems; fall back to copy + delete.
            warn!(
                "installer: rename {} -> {} failed ({err}); copying instead",
                staged.display(),
                target.display()
            );
            copy_dir(staged, target)?;
            fs::remove_dir_all(staged).map_err(|e| {
                LauncherError::Install(format!("cleanup {} failed: {e}", staged.display()))
            })?;
        }
    }
    info!("installer: installed into {}", target.display());
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    let install_err = |e: io::Error| LauncherError::Install(format!("copy error: {e}"));
    fs::create_dir_all(to).map_err(install_err)?;
    for entry in fs::read_dir(from).map_err(install_err)? {
        let entry = entry.map_err(install_err)?;
        let src_path = entry.path();
        let dst_path = to.join(entry.file_name());
        if entry.file_type().map_err(install_err)?.is_dir() {
            copy_dir(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).map_err(install_err)?;
        }
    }
    Ok(())
}
