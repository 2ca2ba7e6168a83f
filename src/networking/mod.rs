use std::fmt::Display;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::engine::models::{DownloadOutcome, DownloadProgress, ReleaseAsset, RemoteManifest};
use crate::error::{LauncherError, Result};
use crate::util::is_cancelled;

/// Largest slice written (and reported) between two yield points.
const CHUNK_SIZE: usize = 64 * 1024;

const USER_AGENT: &str = concat!("coinfight-launcher/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct NetworkClient {
    client: Client,
}

impl NetworkClient {
    pub fn new(connect_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|err| {
                warn!("network client: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self { client }
    }

    /// Fetch the release manifest with a single GET.
    pub async fn fetch_manifest(&self, url: &str) -> Result<RemoteManifest> {
        debug!("fetch_manifest: GET {url}");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LauncherError::from_reqwest(&e))?;
        let status = resp.status();
        if !status.is_success() {
            warn!("fetch_manifest: {url} answered {status}");
            return Err(LauncherError::Http {
                status: status.as_u16(),
            });
        }
        let body = resp
            .text()
            .await
            .map_err(|e| LauncherError::Network(format!("manifest body error: {e}")))?;
        let manifest: RemoteManifest = serde_json::from_str(&body)
            .map_err(|e| LauncherError::Parse(format!("manifest: {e}")))?;
        info!(
            "fetch_manifest: latest {} (maintenance={})",
            manifest.version, manifest.server_maintenance
        );
        Ok(manifest)
    }

    /// Download a release archive to `dest`.
    ///
    /// With a declared content length the body is streamed in bounded chunks,
    /// `on_progress` runs after every chunk and the task yields to the runtime
    /// before reading the next one. Without one the body is saved in a single
    /// write and no progress is reported.
    pub async fn download_archive<F>(
        &self,
        asset: &ReleaseAsset,
        dest: &Path,
        cancel: Option<&AtomicBool>,
        on_progress: F,
    ) -> Result<DownloadOutcome>
    where
        F: FnMut(DownloadProgress),
    {
        remove_stale(dest).await?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io("failed to create download dir", e))?;
        }

        info!("download: GET {}", asset.url);
        let resp = self
            .client
            .get(&asset.url)
            .send()
            .await
            .map_err(|e| LauncherError::from_reqwest(&e))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            warn!("download: no release asset at {}", asset.url);
            return Err(LauncherError::AssetNotFound {
                tag: asset.tag.clone(),
            });
        }
        if !status.is_success() {
            warn!("download: {} answered {status}", asset.url);
            return Err(LauncherError::Http {
                status: status.as_u16(),
            });
        }

        let Some(total) = resp.content_length() else {
            warn!("download: server sent no content length; saving body directly");
            let body = resp
                .bytes()
                .await
                .map_err(|e| LauncherError::Network(format!("download read error: {e}")))?;
            fs::write(dest, &body)
                .await
                .map_err(|e| LauncherError::io("failed to write archive", e))?;
            return Ok(DownloadOutcome::Unsized {
                bytes: body.len() as u64,
            });
        };

        let bytes = write_stream(resp.bytes_stream(), total, dest, cancel, on_progress).await?;
        info!("download: saved {bytes} bytes to {}", dest.display());
        Ok(DownloadOutcome::Complete { bytes })
    }
}

/// Write `stream` to `dest` until exactly `total` bytes have arrived.
///
/// Data past the declared length is ignored, even inside the chunk that
/// crosses it. A stream that ends early is a network error; on any failure
/// the partial file is removed.
pub async fn write_stream<S, B, E, F>(
    stream: S,
    total: u64,
    dest: &Path,
    cancel: Option<&AtomicBool>,
    mut on_progress: F,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(DownloadProgress),
{
    let mut file = File::create(dest)
        .await
        .map_err(|e| LauncherError::io("failed to create archive file", e))?;
    let result = copy_exact(stream, total, &mut file, cancel, &mut on_progress).await;
    drop(file);
    if result.is_err() {
        let _ = fs::remove_file(dest).await;
    }
    result
}

async fn copy_exact<S, B, E, F>(
    stream: S,
    total: u64,
    file: &mut File,
    cancel: Option<&AtomicBool>,
    on_progress: &mut F,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(DownloadProgress),
{
    let mut stream = std::pin::pin!(stream);
    let mut downloaded: u64 = 0;

    while downloaded < total {
        if is_cancelled(cancel) {
            warn!("download: cancelled after {downloaded} bytes");
            return Err(LauncherError::Cancelled);
        }
        let Some(next) = stream.next().await else {
            return Err(LauncherError::Network(format!(
                "stream closed after {downloaded} of {total} bytes"
            )));
        };
        let chunk = next.map_err(|e| LauncherError::Network(format!("stream error: {e}")))?;

        let data = chunk.as_ref();
        let wanted = usize::try_from(total - downloaded).unwrap_or(usize::MAX);
        if data.len() > wanted {
            debug!(
                "download: ignoring {} bytes past the declared length",
                data.len() - wanted
            );
        }
        for piece in data[..data.len().min(wanted)].chunks(CHUNK_SIZE) {
            let len = piece.len() as u64;
            file.write_all(piece)
                .await
                .map_err(|e| LauncherError::io("failed to write archive", e))?;
            downloaded += len;
            on_progress(DownloadProgress {
                downloaded,
                total: Some(total),
            });
            tokio::task::yield_now().await;
        }
    }

    file.flush()
        .await
        .map_err(|e| LauncherError::io("failed to flush archive", e))?;
    Ok(downloaded)
}

async fn remove_stale(dest: &Path) -> Result<()> {
    match fs::remove_file(dest).await {
        Ok(()) => {
            debug!("download: removed stale {}", dest.display());
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(LauncherError::io("failed to remove stale archive", err)),
    }
}
