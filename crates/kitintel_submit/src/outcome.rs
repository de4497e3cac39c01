//! Per-candidate results.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::digest::ContentDigest;

/// What the duplicate lookup established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DedupStatus {
    /// The pipeline stopped before the lookup.
    NotChecked,
    /// The index has no copy.
    Clear,
    /// The index has at least one copy.
    Known { matches: u64 },
    /// The API refused the lookup; upload went ahead without verification.
    PermissionRestricted,
    /// The lookup failed; upload went ahead without verification.
    Unverified { error: String },
}

/// Terminal state of one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Submitted { attempts: u32 },
    ValidationRejected { reason: String },
    Duplicate { matches: u64 },
    RetriesExhausted { attempts: u32, last_error: String },
    Failed { error: String },
}

/// Structured result for one file (or for a directory that could not be listed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReport {
    pub path: PathBuf,
    pub digest: Option<ContentDigest>,
    pub dedup: DedupStatus,
    pub outcome: SubmissionOutcome,
}

impl SubmissionReport {
    pub(crate) fn new(path: &Path, outcome: SubmissionOutcome) -> Self {
        Self {
            path: path.to_path_buf(),
            digest: None,
            dedup: DedupStatus::NotChecked,
            outcome,
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.outcome, SubmissionOutcome::Submitted { .. })
    }

    /// Archive name without extension, as the service labels kits.
    pub fn kit_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
