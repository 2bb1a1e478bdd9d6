use std::path::Path;
use std::time::{Duration, Instant};

use fraktum_config::{DOWNLOAD_ATTEMPTS, DOWNLOAD_RETRY_DELAY_MS};
use fraktum_core::ErrorKind;
use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum DownloadEvent {
    Started { total_bytes: Option<u64> },
    Progress { bytes_delta: u64 },
    Completed { success: bool },
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("transfer failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DownloadError::Status(_) | DownloadError::Transport(_) => ErrorKind::NetworkFailure,
            DownloadError::Io(_) => ErrorKind::IoFailure,
        }
    }
}

/// Streams `url` into `dest` through a sibling `.part` file and renames it on success.
///
/// Transport failures are retried; a non-success HTTP status is returned immediately.
/// Returns the number of bytes written.
pub async fn download_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    tx: Option<Sender<DownloadEvent>>,
) -> Result<u64, DownloadError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = dest.with_extension(part_extension(dest));

    let mut last_err = None;
    for attempt in 1..=DOWNLOAD_ATTEMPTS {
        match download_once(client, url, &tmp_path, tx.as_ref()).await {
            Ok(written) => {
                tokio::fs::rename(&tmp_path, dest).await?;
                info!("Downloaded {url} to {} ({written} bytes)", dest.display());
                emit(tx.as_ref(), DownloadEvent::Completed { success: true }).await;
                return Ok(written);
            }
            Err(DownloadError::Transport(e)) => {
                warn!("Download attempt {attempt}/{DOWNLOAD_ATTEMPTS} for {url} failed: {e}");
                last_err = Some(DownloadError::Transport(e));
                if attempt < DOWNLOAD_ATTEMPTS {
                    tokio::time::sleep(Duration::from_millis(DOWNLOAD_RETRY_DELAY_MS)).await;
                }
            }
            Err(e) => {
                last_err = Some(e);
                break;
            }
        }
    }

    let _ = tokio::fs::remove_file(&tmp_path).await;
    emit(tx.as_ref(), DownloadEvent::Completed { success: false }).await;
    Err(last_err.unwrap_or(DownloadError::Status(0)))
}

async fn download_once(
    client: &Client,
    url: &str,
    tmp_path: &Path,
    tx: Option<&Sender<DownloadEvent>>,
) -> Result<u64, DownloadError> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DownloadError::Status(status.as_u16()));
    }

    emit(
        tx,
        DownloadEvent::Started {
            total_bytes: resp.content_length(),
        },
    )
    .await;

    let mut file = File::create(tmp_path).await?;
    let mut stream = resp.bytes_stream();
    let mut total_written = 0u64;
    let mut accumulated = 0u64;
    let mut last_emit = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        let len = chunk.len() as u64;
        total_written += len;
        accumulated += len;

        if accumulated > 1_000_000 || last_emit.elapsed().as_millis() > 100 {
            emit(
                tx,
                DownloadEvent::Progress {
                    bytes_delta: accumulated,
                },
            )
            .await;
            accumulated = 0;
            last_emit = Instant::now();
        }
    }

    if accumulated > 0 {
        emit(
            tx,
            DownloadEvent::Progress {
                bytes_delta: accumulated,
            },
        )
        .await;
    }

    file.flush().await?;
    file.sync_all().await?;
    debug!("Wrote {total_written} bytes to {}", tmp_path.display());
    Ok(total_written)
}

fn part_extension(dest: &Path) -> String {
    match dest.extension() {
        Some(ext) => format!("{}.part", ext.to_string_lossy()),
        None => "part".to_owned(),
    }
}

async fn emit(tx: Option<&Sender<DownloadEvent>>, event: DownloadEvent) {
    if let Some(t) = tx {
        let _ = t.send(event).await;
    }
}
