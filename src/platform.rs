use std::fmt;
use std::path::PathBuf;

/// Host operating system family the launcher installs the game for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    MacOs,
}

impl Platform {
    /// Platform of the running binary; fixed for the process lifetime.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
        }
    }

    /// Folder the release archive unpacks to, e.g. `coinfight-linux`.
    pub fn folder_name(self) -> String {
        format!("coinfight-{}", self.key())
    }

    pub fn archive_name(self) -> String {
        format!("{}.zip", self.folder_name())
    }

    pub const fn executable_name(self) -> &'static str {
        match self {
            Platform::Windows => "coinfight.exe",
            Platform::Linux | Platform::MacOs => "coinfight",
        }
    }

    /// Zip archives do not reliably carry unix modes, so the binary is fixed up.
    pub const fn needs_exec_bit(self) -> bool {
        matches!(self, Platform::Linux | Platform::MacOs)
    }

    /// Linux keeps downloads in the data dir and the program in its own install dir.
    pub const fn uses_separate_install_dir(self) -> bool {
        matches!(self, Platform::Linux)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Paths derived from the platform and configured directories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallLayout {
    pub platform: Platform,
    pub data_dir: PathBuf,
    install_root: PathBuf,
}

impl InstallLayout {
    pub fn new(
        platform: Platform,
        data_dir: impl Into<PathBuf>,
        install_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            platform,
            data_dir: data_dir.into(),
            install_root: install_root.into(),
        }
    }

    /// Temporary download target, removed once extraction has run.
    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join(self.platform.archive_name())
    }

    pub fn extracted_dir(&self) -> PathBuf {
        self.data_dir.join(self.platform.folder_name())
    }

    /// Directory the game runs from.
    pub fn install_dir(&self) -> PathBuf {
        if self.platform.uses_separate_install_dir() {
            self.install_root.clone()
        } else {
            self.extracted_dir()
        }
    }

    pub fn executable_path(&self) -> PathBuf {
        self.install_dir().join(self.platform.executable_name())
    }

    pub fn is_installed(&self) -> bool {
        self.executable_path().is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_platform() {
        assert_eq!(Platform::Linux.archive_name(), "coinfight-linux.zip");
        assert_eq!(Platform::Windows.folder_name(), "coinfight-windows");
        assert_eq!(Platform::Windows.executable_name(), "coinfight.exe");
        assert_eq!(Platform::MacOs.executable_name(), "coinfight");
    }

    #[test]
    fn post_extract_steps_are_platform_specific() {
        assert!(Platform::Linux.needs_exec_bit());
        assert!(Platform::MacOs.needs_exec_bit());
        assert!(!Platform::Windows.needs_exec_bit());
        assert!(Platform::Linux.uses_separate_install_dir());
        assert!(!Platform::MacOs.uses_separate_install_dir());
    }

    #[test]
    fn linux_installs_outside_data_dir() {
        let layout = InstallLayout::new(Platform::Linux, "/data", "/opt/coinfight");
        assert_eq!(layout.archive_path(), PathBuf::from("/data/coinfight-linux.zip"));
        assert_eq!(layout.extracted_dir(), PathBuf::from("/data/coinfight-linux"));
        assert_eq!(layout.install_dir(), PathBuf::from("/opt/coinfight"));
        assert_eq!(
            layout.executable_path(),
            PathBuf::from("/opt/coinfight/coinfight")
        );
    }

    #[test]
    fn other_platforms_install_in_place() {
        let layout = InstallLayout::new(Platform::Windows, "/data", "/ignored");
        assert_eq!(layout.install_dir(), PathBuf::from("/data/coinfight-windows"));
        assert_eq!(
            layout.executable_path(),
            PathBuf::from("/data/coinfight-windows/coinfight.exe")
        );
    }
}
