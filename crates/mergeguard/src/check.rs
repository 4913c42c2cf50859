//! Concurrent scanning of many files.
//!
//! This is the content-integrity check proper: discover files, read them
//! concurrently, scan each for conflict markers and collect a report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::scan::{ConflictScanner, Finding};
use crate::walk::FileWalker;

/// Number of leading bytes inspected for NUL when sniffing binary files.
const BINARY_SNIFF_LEN: usize = 8192;

/// Findings for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// Path of the scanned file.
    pub path: PathBuf,

    /// BLAKE3 hash of the file content at scan time.
    pub content_hash: String,

    /// Findings in line order.
    pub findings: Vec<Finding>,
}

impl FileReport {
    /// Number of complete conflict blocks.
    #[must_use]
    pub fn conflict_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_conflict()).count()
    }

    /// Number of stray markers.
    #[must_use]
    pub fn stray_count(&self) -> usize {
        self.findings.len() - self.conflict_count()
    }
}

/// Why a file was not scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Larger than the configured `max_file_size`.
    TooLarge {
        /// File size in bytes.
        size: u64,
    },
    /// Contains NUL bytes.
    Binary,
    /// Not valid UTF-8.
    NotUtf8,
    /// Could not be read.
    Unreadable {
        /// The I/O error message.
        message: String,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLarge { size } => write!(f, "too large ({size} bytes)"),
            Self::Binary => write!(f, "binary"),
            Self::NotUtf8 => write!(f, "not UTF-8"),
            Self::Unreadable { message } => write!(f, "unreadable: {message}"),
        }
    }
}

/// A file that was discovered but not scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// Path of the file.
    pub path: PathBuf,

    /// Why it was skipped.
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// The result of checking a set of paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// When the scan finished.
    pub scanned_at: DateTime<Utc>,

    /// Number of files actually scanned.
    pub files_scanned: usize,

    /// Files with at least one finding, sorted by path.
    pub files: Vec<FileReport>,

    /// Files that were skipped, sorted by path.
    pub skipped: Vec<SkippedFile>,
}

impl ScanReport {
    /// True when no conflict or stray marker was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.files.iter().all(|f| f.findings.is_empty())
    }

    /// Total conflict blocks across all files.
    #[must_use]
    pub fn conflict_count(&self) -> usize {
        self.files.iter().map(FileReport::conflict_count).sum()
    }

    /// Total stray markers across all files.
    #[must_use]
    pub fn stray_count(&self) -> usize {
        self.files.iter().map(FileReport::stray_count).sum()
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Scanned; carries a report when there were findings.
    Scanned(Option<FileReport>),
    /// Not scanned.
    Skipped(SkippedFile),
}

/// Scan file content that has already been read.
#[must_use]
pub fn scan_bytes(path: &Path, bytes: &[u8], scanner: &ConflictScanner) -> FileOutcome {
    let skipped = |reason| {
        FileOutcome::Skipped(SkippedFile {
            path: path.to_path_buf(),
            reason,
        })
    };

    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    if sniff.contains(&0) {
        return skipped(SkipReason::Binary);
    }

    let Ok(text) = std::str::from_utf8(bytes) else {
        return skipped(SkipReason::NotUtf8);
    };

    let findings = scanner.scan_text(text);
    if findings.is_empty() {
        return FileOutcome::Scanned(None);
    }

    FileOutcome::Scanned(Some(FileReport {
        path: path.to_path_buf(),
        content_hash: blake3::hash(bytes).to_hex().to_string(),
        findings,
    }))
}

/// Read and scan a single file.
pub async fn scan_file(path: PathBuf, scanner: &ConflictScanner, max_file_size: u64) -> FileOutcome {
    let unreadable = |path: PathBuf, err: std::io::Error| {
        FileOutcome::Skipped(SkippedFile {
            path,
            reason: SkipReason::Unreadable {
                message: err.to_string(),
            },
        })
    };

    let size = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta.len(),
        Err(err) => return unreadable(path, err),
    };
    if size > max_file_size {
        return FileOutcome::Skipped(SkippedFile {
            path,
            reason: SkipReason::TooLarge { size },
        });
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => scan_bytes(&path, &bytes, scanner),
        Err(err) => unreadable(path, err),
    }
}

/// Check every file under `paths` for unresolved conflicts.
///
/// Up to `config.scan.jobs` files are read at once.
///
/// # Errors
///
/// Returns an error for invalid configuration, a missing input path or an
/// unreadable input directory. Problems with individual files are recorded
/// in [`ScanReport::skipped`] instead.
pub async fn scan_paths(paths: &[PathBuf], config: &Config) -> Result<ScanReport> {
    config.validate()?;
    let walker = FileWalker::new(&config.scan)?;
    let files = walker.collect(paths)?;
    info!(count = files.len(), "scanning files");

    let scanner = Arc::new(ConflictScanner::new(config.scan_options())?);
    let semaphore = Arc::new(Semaphore::new(config.scan.jobs));
    let max_file_size = config.scan.max_file_size;

    let mut tasks = JoinSet::new();
    for path in files {
        let scanner = Arc::clone(&scanner);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| Error::internal(format!("scan semaphore closed: {e}")))?;
            Ok::<_, Error>(scan_file(path, &scanner, max_file_size).await)
        });
    }

    let mut files_scanned = 0;
    let mut reports = Vec::new();
    let mut skipped = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(|e| Error::internal(format!("scan task failed: {e}")))??;
        match outcome {
            FileOutcome::Scanned(report) => {
                files_scanned += 1;
                if let Some(report) = report {
                    debug!(
                        path = %report.path.display(),
                        findings = report.findings.len(),
                        "conflict markers found"
                    );
                    reports.push(report);
                }
            }
            FileOutcome::Skipped(file) => {
                debug!(path = %file.path.display(), reason = %file.reason, "file skipped");
                skipped.push(file);
            }
        }
    }

    reports.sort_by(|a, b| a.path.cmp(&b.path));
    skipped.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(ScanReport {
        scanned_at: Utc::now(),
        files_scanned,
        files: reports,
        skipped,
    })
}
