use serde::{Deserialize, Serialize};

use crate::version::Version;

/// Remote document advertising the latest release.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteManifest {
    pub version: Version,
    /// Servers are under maintenance; shown as a note, never blocks playing.
    #[serde(rename = "updating")]
    pub server_maintenance: bool,
}

/// A downloadable release archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub tag: String,
    pub url: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Streamed until the declared content length was reached.
    Complete { bytes: u64 },
    /// The server sent no content length; the body was saved in one write.
    Unsized { bytes: u64 },
}
