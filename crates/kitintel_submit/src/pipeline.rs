//! Sequential submission of a batch of candidate paths.

use kitintel_protocol::defaults::{DEFAULT_DEDUP_DELAY_MS, DEFAULT_MAX_UPLOAD_ATTEMPTS};
use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::archive::{ArchiveFormat, ValidationError, ZIP};
use crate::cancel::CancellationToken;
use crate::candidate::{expand_directory, SubmissionCandidate};
use crate::digest::{ContentDigest, HashComputer, Sha256Hasher};
use crate::outcome::{DedupStatus, SubmissionOutcome, SubmissionReport};
use crate::progress::{ProgressReader, SubmissionObserver};
use crate::remote::{RemoteError, RemoteIndexClient, RemoteSubmissionClient, UploadPayload};

/// Pipeline tuning.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    /// Total upload attempts per archive, including the first.
    pub max_upload_attempts: u32,
    /// Pause before every duplicate lookup to smooth bursts against the index.
    pub dedup_delay: Duration,
    pub format: ArchiveFormat,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            max_upload_attempts: DEFAULT_MAX_UPLOAD_ATTEMPTS,
            dedup_delay: Duration::from_millis(DEFAULT_DEDUP_DELAY_MS),
            format: ZIP,
        }
    }
}

#[derive(Error, Debug)]
enum UploadError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("unable to open archive for upload: {0}")]
    Io(#[from] io::Error),
}

enum DedupDecision {
    Proceed(DedupStatus),
    Duplicate(u64),
}

/// Runs hash → validate → dedup → upload for each candidate in turn.
pub struct SubmissionPipeline<I, S, H = Sha256Hasher> {
    index: I,
    submitter: S,
    hasher: H,
    config: SubmitConfig,
    cancel: CancellationToken,
    observer: Option<Arc<dyn SubmissionObserver>>,
}

impl<I, S> SubmissionPipeline<I, S, Sha256Hasher>
where
    I: RemoteIndexClient,
    S: RemoteSubmissionClient,
{
    pub fn new(index: I, submitter: S, config: SubmitConfig) -> Self {
        Self {
            index,
            submitter,
            hasher: Sha256Hasher::default(),
            config,
            cancel: CancellationToken::new(),
            observer: None,
        }
    }
}

impl<I, S, H> SubmissionPipeline<I, S, H>
where
    I: RemoteIndexClient,
    S: RemoteSubmissionClient,
    H: HashComputer,
{
    pub fn with_hasher<H2: HashComputer>(self, hasher: H2) -> SubmissionPipeline<I, S, H2> {
        SubmissionPipeline {
            index: self.index,
            submitter: self.submitter,
            hasher,
            config: self.config,
            cancel: self.cancel,
            observer: self.observer,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SubmissionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn config(&self) -> &SubmitConfig {
        &self.config
    }

    /// Submit every archive reachable from `paths`.
    ///
    /// Directories are replaced in the worklist by the archives they contain
    /// (`recursive` controls depth) and are never hashed themselves. Returns
    /// one report per processed file, in processing order. Once the
    /// cancellation token is raised no further candidate is started.
    pub fn submit(&self, paths: &[PathBuf], recursive: bool) -> Vec<SubmissionReport> {
        let mut queue: VecDeque<SubmissionCandidate> = paths
            .iter()
            .map(|p| SubmissionCandidate::from_path(p))
            .collect();
        let mut reports = Vec::new();

        while let Some(candidate) = queue.pop_front() {
            if self.cancel.is_cancelled() {
                info!(
                    remaining = queue.len() + 1,
                    "Submission cancelled, not starting remaining candidates"
                );
                break;
            }

            if candidate.is_dir {
                match expand_directory(&candidate.path, &self.config.format, recursive) {
                    Ok(children) => {
                        debug!(
                            dir = %candidate.path.display(),
                            count = children.len(),
                            recursive,
                            "Expanded directory"
                        );
                        for child in children.into_iter().rev() {
                            queue.push_front(child);
                        }
                    }
                    Err(err) => {
                        warn!(dir = %candidate.path.display(), error = %err, "Cannot expand directory");
                        let report = SubmissionReport::new(
                            &candidate.path,
                            SubmissionOutcome::Failed {
                                error: err.to_string(),
                            },
                        );
                        self.notify_finished(&report);
                        reports.push(report);
                    }
                }
                continue;
            }

            let report = self.process_file(&candidate.path);
            self.notify_finished(&report);
            reports.push(report);
        }

        reports
    }

    /// Resolve one archive file.
    pub fn process_file(&self, path: &Path) -> SubmissionReport {
        debug!(path = %path.display(), "Processing candidate");

        if let Err(err) = self.config.format.check_extension(path) {
            warn!(path = %path.display(), "{}", err);
            return SubmissionReport::new(
                path,
                SubmissionOutcome::ValidationRejected {
                    reason: err.to_string(),
                },
            );
        }

        let digest = match self.hasher.digest_file(path) {
            Ok(digest) => digest,
            Err(err) => {
                error!(path = %path.display(), error = %err, "Unable to generate hash");
                return SubmissionReport::new(
                    path,
                    SubmissionOutcome::Failed {
                        error: err.to_string(),
                    },
                );
            }
        };

        let (dedup, outcome) = match self.config.format.check_magic(path) {
            Err(err @ ValidationError::Unreadable { .. }) => {
                error!(path = %path.display(), error = %err, "Unable to read archive header");
                (
                    DedupStatus::NotChecked,
                    SubmissionOutcome::Failed {
                        error: err.to_string(),
                    },
                )
            }
            Err(err) => {
                warn!(path = %path.display(), "{}", err);
                (
                    DedupStatus::NotChecked,
                    SubmissionOutcome::ValidationRejected {
                        reason: err.to_string(),
                    },
                )
            }
            Ok(()) => match self.check_duplicate(path, &digest) {
                DedupDecision::Duplicate(matches) => {
                    info!(
                        sha256 = %digest,
                        path = %path.display(),
                        "Kit already present in KIT Intel"
                    );
                    (
                        DedupStatus::Known { matches },
                        SubmissionOutcome::Duplicate { matches },
                    )
                }
                DedupDecision::Proceed(status) => (status, self.upload_with_retry(path, &digest)),
            },
        };

        SubmissionReport {
            path: path.to_path_buf(),
            digest: Some(digest),
            dedup,
            outcome,
        }
    }

    /// Ask the index for existing copies.
    ///
    /// The lookup only saves quota: any failure lets the upload go ahead.
    fn check_duplicate(&self, path: &Path, digest: &ContentDigest) -> DedupDecision {
        if !self.config.dedup_delay.is_zero() {
            std::thread::sleep(self.config.dedup_delay);
        }

        match self.index.count_matches(digest) {
            Ok(0) => DedupDecision::Proceed(DedupStatus::Clear),
            Ok(matches) => DedupDecision::Duplicate(matches),
            Err(RemoteError::PermissionDenied) => {
                warn!(
                    path = %path.display(),
                    "Uploader-only restrictions apply, skipping duplicate check"
                );
                DedupDecision::Proceed(DedupStatus::PermissionRestricted)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Duplicate check failed, uploading anyway"
                );
                DedupDecision::Proceed(DedupStatus::Unverified {
                    error: err.to_string(),
                })
            }
        }
    }

    fn upload_with_retry(&self, path: &Path, digest: &ContentDigest) -> SubmissionOutcome {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let max_attempts = self.config.max_upload_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.upload_once(path, &file_name) {
                Ok(()) => {
                    info!(sha256 = %digest, kit = %file_name, attempt, "Kit submitted");
                    return SubmissionOutcome::Submitted { attempts: attempt };
                }
                Err(err) => {
                    warn!(
                        kit = %file_name,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Upload failed"
                    );
                    last_error = err.to_string();
                }
            }
        }

        error!(
            kit = %file_name,
            attempts = max_attempts,
            "Upload failed on every attempt"
        );
        SubmissionOutcome::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        }
    }

    fn upload_once(&self, path: &Path, file_name: &str) -> Result<(), UploadError> {
        let slot = self.submitter.request_upload_slot(file_name)?;

        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let reader: Box<dyn io::Read + Send> = match &self.observer {
            Some(observer) => {
                observer.upload_started(path, len);
                Box::new(ProgressReader::new(file, len, Arc::clone(observer)))
            }
            None => Box::new(file),
        };

        let result = self.submitter.stream_upload(
            &slot,
            UploadPayload {
                file_name: file_name.to_string(),
                len,
                reader,
            },
        );
        if let Some(observer) = &self.observer {
            observer.upload_finished(path);
        }
        result.map_err(UploadError::from)
    }

    fn notify_finished(&self, report: &SubmissionReport) {
        if let Some(observer) = &self.observer {
            observer.candidate_finished(report);
        }
    }
}
