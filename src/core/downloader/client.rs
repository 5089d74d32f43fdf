use std::path::Path;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::{DevError, DevResult};

/// Streaming downloader shared by every fetch of one install attempt.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    /// Longest silence tolerated between two body chunks.
    idle_timeout: Duration,
}

impl Downloader {
    pub fn new(client: Client, idle_timeout: Duration) -> Self {
        Self {
            client,
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Sends the request and insists on a plain 200. Response headers must
    /// arrive within the idle timeout, like every later body chunk.
    pub async fn open(&self, url: &str) -> DevResult<Response> {
        info!("downloading: {}", url);
        let response = tokio::time::timeout(self.idle_timeout, self.client.get(url).send())
            .await
            .map_err(|_| stalled(url, self.idle_timeout))??;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DevError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    // ── Single file download ────────────────────────────

    /// Stream `url` into `dest` chunk by chunk. The parent directory must
    /// already exist.
    pub async fn download_file(&self, url: &str, dest: &Path) -> DevResult<u64> {
        let response = self.open(url).await?;
        let mut stream = Box::pin(response.bytes_stream());

        // Write inside a block so the handle is closed before we return.
        let written = {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|source| DevError::io(dest, source))?;
            let mut written = 0_u64;
            while let Some(chunk) = next_chunk(&mut stream, self.idle_timeout, url).await? {
                file.write_all(&chunk)
                    .await
                    .map_err(|source| DevError::io(dest, source))?;
                written += chunk.len() as u64;
            }
            file.flush()
                .await
                .map_err(|source| DevError::io(dest, source))?;
            written
        };

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(written)
    }
}

/// Next body chunk, or `None` at end of stream. Silence longer than `idle`
/// is reported as a stalled download instead of waiting forever.
pub async fn next_chunk<S, B>(stream: &mut S, idle: Duration, url: &str) -> DevResult<Option<B>>
where
    S: Stream<Item = reqwest::Result<B>> + Unpin,
{
    match tokio::time::timeout(idle, stream.next()).await {
        Err(_) => Err(stalled(url, idle)),
        Ok(None) => Ok(None),
        Ok(Some(chunk)) => Ok(Some(chunk?)),
    }
}

fn stalled(url: &str, idle: Duration) -> DevError {
    DevError::DownloadStalled {
        url: url.to_string(),
        idle_secs: idle.as_secs(),
    }
}
