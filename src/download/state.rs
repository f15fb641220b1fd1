//! Download statistics.

use std::path::PathBuf;

use crate::media::MediaType;

/// A download that did not produce a usable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    pub filename: String,
    pub reason: String,
}

/// Outcome of one year-batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub label: String,

    /// Items returned by the index for this batch.
    pub found: u64,

    // Statistics
    pub pic_count: u64,
    pub vid_count: u64,
    pub skipped_count: u64,
    pub bytes_written: u64,

    pub downloaded: Vec<PathBuf>,
    pub failures: Vec<DownloadFailure>,
}

impl BatchReport {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Record a file that was written and verified.
    pub fn record_download(&mut self, path: PathBuf, media_type: MediaType, bytes: u64) {
        match media_type {
            MediaType::Image => self.pic_count += 1,
            MediaType::Video => self.vid_count += 1,
        }
        self.bytes_written += bytes;
        self.downloaded.push(path);
    }

    /// Record an item whose target file already existed.
    pub fn increment_skipped(&mut self) {
        self.skipped_count += 1;
    }

    pub fn record_failure(&mut self, filename: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(DownloadFailure {
            filename: filename.into(),
            reason: reason.into(),
        });
    }

    /// Get total downloaded count.
    pub fn total_downloaded(&self) -> u64 {
        self.pic_count + self.vid_count
    }

    pub fn failed_count(&self) -> u64 {
        self.failures.len() as u64
    }
}

/// Statistics across all years of a run.
#[derive(Debug, Default)]
pub struct GlobalState {
    pub pic_count: u64,
    pub vid_count: u64,
    pub skipped_count: u64,
    pub failed_count: u64,
    pub bytes_written: u64,
    pub years_processed: u64,
    pub years_failed: u64,
}

impl GlobalState {
    /// Add statistics from a finished batch.
    pub fn add_batch_stats(&mut self, report: &BatchReport) {
        self.pic_count += report.pic_count;
        self.vid_count += report.vid_count;
        self.skipped_count += report.skipped_count;
        self.failed_count += report.failed_count();
        self.bytes_written += report.bytes_written;
        self.years_processed += 1;
    }

    /// Mark a year whose index could not be fetched.
    pub fn mark_year_failed(&mut self) {
        self.years_failed += 1;
    }

    /// Get total downloaded count.
    pub fn total_downloaded(&self) -> u64 {
        self.pic_count + self.vid_count
    }
}
