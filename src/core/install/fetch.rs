// ─── Fetch Pipeline ───
// download (async) ──mpsc──▶ gunzip ──▶ untar + filter (blocking thread)
//
// The channel is bounded, so a slow disk throttles the socket. Whichever
// side fails first stops the other: a download error is pushed into the
// channel as an io error, and a dropped receiver ends the download loop.

use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use futures_util::Stream;
use tar::{Archive, EntryType};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::core::downloader::{next_chunk, Downloader};
use crate::core::error::{DevError, DevResult};
use crate::core::paths::{ensure_dir, InstallDirectory};

use super::filter::{EntryKind, ExtractionFilter};

const CHANNEL_DEPTH: usize = 16;

pub fn tarball_url(dist_url: &str, version: &str) -> String {
    format!("{dist_url}/v{version}/node-v{version}.tar.gz")
}

/// Downloads the source tarball and materialises the entries `filter`
/// accepts into `dir`. Returns the number of entries written.
#[instrument(skip(downloader, dir, filter), fields(dir = %dir.root().display()))]
pub async fn fetch_and_extract(
    downloader: &Downloader,
    url: &str,
    dir: &InstallDirectory,
    filter: ExtractionFilter,
) -> DevResult<usize> {
    if ensure_dir(dir.root()).await? {
        debug!("created: {:?}", dir.root());
    } else {
        debug!("directory already existed: {:?}", dir.root());
    }

    let response = downloader.open(url).await?;
    let stream = Box::pin(response.bytes_stream());
    let count = pump_and_extract(stream, downloader.idle_timeout(), url, dir.root(), filter).await?;

    if count == 0 {
        return Err(DevError::ExtractionFailed);
    }
    debug!("done parsing tarball, {} entries extracted", count);
    Ok(count)
}

/// Feeds `stream` into the blocking extractor and waits for both sides.
/// A download failure wins over whatever the extractor reports after it.
pub(crate) async fn pump_and_extract<S, B>(
    mut stream: S,
    idle: Duration,
    url: &str,
    root: &Path,
    filter: ExtractionFilter,
) -> DevResult<usize>
where
    S: Stream<Item = reqwest::Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    let (tx, rx) = mpsc::channel::<io::Result<Vec<u8>>>(CHANNEL_DEPTH);
    let root = root.to_path_buf();
    let extractor =
        tokio::task::spawn_blocking(move || extract_entries(ChannelReader::new(rx), &root, &filter));

    let mut download_result = Ok(());
    loop {
        match next_chunk(&mut stream, idle, url).await {
            Ok(Some(chunk)) => {
                if tx.send(Ok(chunk.as_ref().to_vec())).await.is_err() {
                    // Extractor already stopped; its result says why.
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                let _ = tx.send(Err(io::Error::other("download aborted"))).await;
                download_result = Err(err);
                break;
            }
        }
    }
    drop(tx);
    drop(stream);

    let extracted = extractor.await?;
    if let Err(err) = download_result {
        if let Err(secondary) = extracted {
            debug!("ignoring extraction error after failed download: {}", secondary);
        }
        return Err(err);
    }
    extracted
}

/// Blocking `Read` over the chunks sent by the download loop.
struct ChannelReader {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
    current: Vec<u8>,
    pos: usize,
}

impl ChannelReader {
    fn new(rx: mpsc::Receiver<io::Result<Vec<u8>>>) -> Self {
        Self {
            rx,
            current: Vec::new(),
            pos: 0,
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.current.len() {
            match self.rx.blocking_recv() {
                None => return Ok(0),
                Some(Ok(chunk)) => {
                    self.current = chunk;
                    self.pos = 0;
                }
                Some(Err(err)) => return Err(err),
            }
        }
        let remaining = &self.current[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

pub(crate) fn extract_entries<R: Read>(
    reader: R,
    root: &Path,
    filter: &ExtractionFilter,
) -> DevResult<usize> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut count = 0_usize;

    for entry in archive.entries().map_err(DevError::Archive)? {
        let mut entry = entry.map_err(DevError::Archive)?;
        let raw_path = entry.path().map_err(DevError::Archive)?.into_owned();
        let rel_path = strip_top_level(&raw_path)?;
        let kind = entry_kind(entry.header().entry_type());

        if !filter.accepts(&rel_path, kind) {
            continue;
        }
        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let out_path = root.join(&rel_path);
        match kind {
            EntryKind::Directory => {
                std::fs::create_dir_all(&out_path)
                    .map_err(|source| DevError::io(&out_path, source))?;
            }
            EntryKind::File => {
                if let Some(parent) = out_path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|source| DevError::io(parent, source))?;
                }
                entry
                    .unpack(&out_path)
                    .map_err(|source| DevError::io(&out_path, source))?;
            }
            EntryKind::Other => {
                debug!("skipping special tarball entry {}", rel_path.display());
                continue;
            }
        }
        debug!("extracted file from tarball {}", rel_path.display());
        count += 1;
    }

    Ok(count)
}

fn entry_kind(entry_type: EntryType) -> EntryKind {
    match entry_type {
        EntryType::Directory => EntryKind::Directory,
        EntryType::Regular | EntryType::Continuous => EntryKind::File,
        _ => EntryKind::Other,
    }
}

/// Drops the tarball's `node-vX.Y.Z/` prefix. Absolute paths and `..`
/// are refused.
fn strip_top_level(raw: &Path) -> DevResult<PathBuf> {
    let mut rel = PathBuf::new();
    let mut stripped = false;
    for component in raw.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(_) if !stripped => stripped = true,
            Component::Normal(part) => rel.push(part),
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(DevError::UnsafeEntryPath(raw.display().to_string()));
            }
        }
    }
    Ok(rel)
}
