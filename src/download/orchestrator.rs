//! Concurrent, idempotent download of one batch of media items.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::api::PhotosApi;
use crate::download::state::BatchReport;
use crate::error::{Error, Result};
use crate::fs::target_path;
use crate::media::MediaItem;
use crate::output::create_item_bar;

/// One item paired with the file it will be written to.
struct DownloadTask<'a> {
    item: &'a MediaItem,
    path: PathBuf,
}

/// Downloads a batch of items into a directory.
///
/// Existing files are never overwritten. Tasks run concurrently and a failed
/// task never cancels its siblings.
pub struct DownloadOrchestrator {
    api: Arc<PhotosApi>,
    concurrency: Option<usize>,
    show_progress: bool,
}

impl DownloadOrchestrator {
    pub fn new(api: Arc<PhotosApi>) -> Self {
        Self {
            api,
            concurrency: None,
            show_progress: false,
        }
    }

    /// Cap simultaneous downloads. `None` starts every task at once.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: Option<usize>) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Download every item missing from `destination` and wait for all of
    /// them. Per-item failures are logged and reported, never returned.
    pub async fn download_all(&self, items: &[MediaItem], destination: &Path) -> BatchReport {
        let mut report = BatchReport::new(destination.display().to_string());
        report.found = items.len() as u64;

        let mut tasks = Vec::new();
        let mut claimed = HashSet::new();
        for item in items {
            let path = match target_path(destination, &item.filename) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("Skipping item {}: {}", item.id, e);
                    report.record_failure(&item.filename, e.to_string());
                    continue;
                }
            };

            if path.exists() {
                tracing::warn!("{} already exists", item.filename);
                report.increment_skipped();
            } else if !claimed.insert(path.clone()) {
                // Another item of this batch already writes this file
                tracing::warn!(
                    "{} ({}) maps to a file already scheduled, skipping",
                    item.filename,
                    item.id
                );
                report.increment_skipped();
            } else {
                tasks.push(DownloadTask { item, path });
            }
        }

        if tasks.is_empty() {
            return report;
        }

        let limit = effective_limit(self.concurrency, tasks.len());
        tracing::debug!(
            "Downloading {} items into {} ({} at a time)",
            tasks.len(),
            destination.display(),
            limit
        );

        let progress = if self.show_progress {
            create_item_bar(tasks.len() as u64, "Downloading")
        } else {
            ProgressBar::hidden()
        };

        let outcomes: Vec<_> = stream::iter(tasks)
            .map(|task| {
                let progress = progress.clone();
                async move {
                    let result = self.download_one(&task).await;
                    progress.inc(1);
                    (task, result)
                }
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        progress.finish_and_clear();

        for (task, result) in outcomes {
            match result {
                Ok(bytes) => {
                    tracing::info!("{} successfully downloaded", task.item.filename);
                    report.record_download(task.path, task.item.media_type(), bytes);
                }
                Err(e) => {
                    tracing::warn!("There was a problem downloading {}: {}", task.item.filename, e);
                    report.record_failure(&task.item.filename, e.to_string());
                }
            }
        }

        report
    }

    /// Fetch, stream to disk and verify. The file is created exclusively,
    /// and a failed attempt removes only a file it created itself so the
    /// next run retries it.
    async fn download_one(&self, task: &DownloadTask<'_>) -> Result<u64> {
        let url = task.item.download_url();
        tracing::trace!("Starting download {}", url);

        let response = self.api.fetch_content(&url).await?;

        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&task.path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::Download(format!(
                    "{} appeared while downloading, leaving it untouched",
                    task.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let result = write_content(file, response, &task.path).await;

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&task.path).await {
                tracing::warn!("Could not remove {}: {}", task.path.display(), e);
            }
        }

        result
    }
}

async fn write_content(
    mut file: tokio::fs::File,
    response: reqwest::Response,
    path: &Path,
) -> Result<u64> {
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", e)))?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    drop(file);

    let written = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.len(),
        Err(_) => 0,
    };

    if written == 0 {
        return Err(Error::Download(format!(
            "{} is empty after download",
            path.display()
        )));
    }

    tracing::debug!("{} written ({} bytes)", path.display(), written);
    Ok(written)
}

/// Simultaneous downloads for a batch of `tasks` items.
fn effective_limit(concurrency: Option<usize>, tasks: usize) -> usize {
    concurrency.unwrap_or(tasks).clamp(1, tasks.max(1))
}
