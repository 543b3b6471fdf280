//! Product download with a polling progress monitor.
//!
//! The transfer streams the response body to the destination file while a
//! second task polls the partially-written file's size on a fixed interval
//! and pushes percentage ticks over a channel. Both terminate together when
//! the transfer finishes. There is no resume: an interrupted download
//! restarts from zero on the next run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch};

use crate::client::HubClient;
use crate::store::ProductRecord;
use crate::Result;

pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A local file with the exact remote size already exists; nothing done.
    AlreadyDownloaded,
    /// Bytes written to the destination.
    Completed(u64),
}

/// Size of the (possibly partial) file on disk. A file that does not exist
/// yet counts as zero bytes written, not an error.
pub fn written_bytes(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Whole percentage of `written` against `total`; zero when the target size
/// is unknown.
pub fn percent(written: u64, total: u64) -> u64 {
    if total == 0 {
        0
    } else {
        written * 100 / total
    }
}

/// Destination file for a product archive.
pub fn destination(dir: &Path, record: &ProductRecord) -> PathBuf {
    dir.join(format!("{}.zip", record.title))
}

/// Downloads the product archive to `dest`, pushing progress percentages
/// into `progress` while the transfer runs.
///
/// Skips with [`DownloadOutcome::AlreadyDownloaded`] when the local file
/// size matches the known remote size exactly. Any other local size,
/// including a larger one, silently proceeds to a fresh download.
pub async fn download_product(
    client: &HubClient,
    record: &ProductRecord,
    dest: &Path,
    progress: mpsc::Sender<u64>,
) -> Result<DownloadOutcome> {
    let total = record.file_size.unwrap_or(0) as u64;

    if total > 0 && dest.exists() && written_bytes(dest) == total {
        return Ok(DownloadOutcome::AlreadyDownloaded);
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let response = client.open_product_stream(&record.product_id).await?;

    let (done_tx, done_rx) = watch::channel(false);
    let monitor = tokio::spawn(monitor_file(dest.to_path_buf(), total, done_rx, progress));

    let result = stream_to_file(response, dest).await;

    let _ = done_tx.send(true);
    let _ = monitor.await;

    result.map(DownloadOutcome::Completed)
}

async fn stream_to_file(response: reqwest::Response, dest: &Path) -> Result<u64> {
    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    tracing::debug!(written, path = %dest.display(), "transfer complete");
    Ok(written)
}

/// Polls the file size until told the transfer is done, emitting one final
/// tick before exiting so the receiver always sees the end state.
async fn monitor_file(
    path: PathBuf,
    total: u64,
    mut done: watch::Receiver<bool>,
    progress: mpsc::Sender<u64>,
) {
    let mut interval = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if progress.send(percent(written_bytes(&path), total)).await.is_err() {
                    return;
                }
            }
            _ = done.changed() => {
                let _ = progress.send(percent(written_bytes(&path), total)).await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_counts_as_zero_bytes() {
        assert_eq!(written_bytes(Path::new("/nonexistent/product.zip")), 0);
        assert_eq!(percent(0, 1_000_000), 0);
    }

    #[test]
    fn test_percent_with_unknown_total_is_zero() {
        assert_eq!(percent(12345, 0), 0);
    }

    #[test]
    fn test_percent_rounds_down() {
        assert_eq!(percent(50, 100), 50);
        assert_eq!(percent(999, 1000), 99);
        assert_eq!(percent(1000, 1000), 100);
    }

    #[test]
    fn test_written_bytes_of_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 512]).unwrap();
        file.flush().unwrap();
        assert_eq!(written_bytes(file.path()), 512);
    }

    #[tokio::test]
    async fn test_exact_size_match_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = ProductRecord::found(
            "id-1",
            "S1A_IW_GRDH_1",
            "",
            crate::hub::Hub::Copernicus,
        );
        record.file_size = Some(1024);

        let dest = destination(dir.path(), &record);
        std::fs::write(&dest, [0u8; 1024]).unwrap();

        // The skip decision is purely local; nothing is sent to the hub.
        let client = HubClient::new(
            crate::hub::Hub::Copernicus,
            crate::auth::Credentials {
                user: "user".to_string(),
                password: "password".to_string(),
            },
        )
        .unwrap();
        let (progress_tx, _progress_rx) = mpsc::channel(16);

        let outcome = download_product(&client, &record, &dest, progress_tx)
            .await
            .unwrap();
        assert_eq!(outcome, DownloadOutcome::AlreadyDownloaded);
        assert_eq!(written_bytes(&dest), 1024);
    }

    #[tokio::test]
    async fn test_monitor_reports_zero_for_missing_file_and_stops() {
        let (progress_tx, mut progress_rx) = mpsc::channel(16);
        let (done_tx, done_rx) = watch::channel(false);

        let handle = tokio::spawn(monitor_file(
            PathBuf::from("/nonexistent/product.zip"),
            1_000_000,
            done_rx,
            progress_tx,
        ));

        // First tick fires immediately.
        assert_eq!(progress_rx.recv().await, Some(0));

        done_tx.send(true).unwrap();
        handle.await.unwrap();
        // Final tick on shutdown, then the channel closes.
        assert_eq!(progress_rx.recv().await, Some(0));
        assert_eq!(progress_rx.recv().await, None);
    }
}
