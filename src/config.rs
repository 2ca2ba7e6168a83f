use std::env as std_env;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::env;
use crate::platform::{InstallLayout, Platform};

pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/coinop-logan/coinfight/master/launcher/manifest.json";
pub const DEFAULT_RELEASE_BASE_URL: &str =
    "https://github.com/coinop-logan/coinfight/releases/download";

pub const MANIFEST_URL_ENV: &str = "COINFIGHT_MANIFEST_URL";
pub const RELEASE_URL_ENV: &str = "COINFIGHT_RELEASE_URL";
pub const DATA_DIR_ENV: &str = "COINFIGHT_DATA_DIR";
pub const INSTALL_DIR_ENV: &str = "COINFIGHT_INSTALL_DIR";

#[derive(Clone, Debug)]
pub struct LauncherConfig {
    pub platform: Platform,
    pub manifest_url: String,
    pub release_base_url: String,
    pub data_dir: PathBuf,
    pub install_dir: PathBuf,
    pub connect_timeout: Duration,
}

impl LauncherConfig {
    /// Compiled defaults for the given platform, ignoring the environment.
    pub fn defaults(platform: Platform) -> Self {
        Self {
            platform,
            manifest_url: DEFAULT_MANIFEST_URL.into(),
            release_base_url: DEFAULT_RELEASE_BASE_URL.into(),
            data_dir: env::default_data_dir(platform),
            install_dir: env::default_install_dir(platform),
            connect_timeout: Duration::from_secs(15),
        }
    }

    /// Defaults for the host platform with `COINFIGHT_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::defaults(Platform::current());
        if let Some(url) = non_empty_var(MANIFEST_URL_ENV) {
            config.manifest_url = url;
        }
        if let Some(url) = non_empty_var(RELEASE_URL_ENV) {
            config.release_base_url = url;
        }
        if let Some(dir) = non_empty_var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty_var(INSTALL_DIR_ENV) {
            config.install_dir = PathBuf::from(dir);
        }
        debug!("config: {:?}", config);
        config
    }

    pub fn layout(&self) -> InstallLayout {
        InstallLayout::new(
            self.platform,
            self.data_dir.clone(),
            self.install_dir.clone(),
        )
    }

    /// `{release_base_url}/{tag}/{archive}` for the given release tag.
    pub fn archive_url(&self, tag: &str) -> String {
        format!(
            "{}/{}/{}",
            self.release_base_url.trim_end_matches('/'),
            tag,
            self.platform.archive_name()
        )
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std_env::var(key).ok().filter(|value| !value.trim().is_empty())
}
