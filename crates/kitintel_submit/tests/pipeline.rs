//! End-to-end tests for the submission pipeline
//!
//! The remote service is replaced by in-memory fakes that count every call,
//! so each test can assert exactly which network operations happened.

use kitintel_protocol::defaults::EMPTY_SHA256_HEX;
use kitintel_submit::{
    CancellationToken, ContentDigest, DedupStatus, RemoteError, RemoteIndexClient,
    RemoteSubmissionClient, SubmissionObserver, SubmissionOutcome, SubmissionPipeline,
    SubmissionReport, SubmitConfig, UploadPayload, UploadSlot,
};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const ZIP_HEADER: &[u8] = b"PK\x03\x04";

// ============================================================================
// Fakes
// ============================================================================

#[derive(Clone)]
enum IndexBehaviour {
    Count(u64),
    Fail(RemoteError),
}

struct FakeIndex {
    behaviour: IndexBehaviour,
    queries: Mutex<Vec<String>>,
}

impl FakeIndex {
    fn returning(count: u64) -> Self {
        Self::with(IndexBehaviour::Count(count))
    }

    fn failing(err: RemoteError) -> Self {
        Self::with(IndexBehaviour::Fail(err))
    }

    fn with(behaviour: IndexBehaviour) -> Self {
        Self {
            behaviour,
            queries: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl RemoteIndexClient for FakeIndex {
    fn count_matches(&self, digest: &ContentDigest) -> Result<u64, RemoteError> {
        self.queries.lock().unwrap().push(digest.to_hex());
        match &self.behaviour {
            IndexBehaviour::Count(n) => Ok(*n),
            IndexBehaviour::Fail(err) => Err(err.clone()),
        }
    }
}

#[derive(Default)]
struct FakeSubmitter {
    /// File name -> number of uploads that fail before one succeeds.
    /// `u32::MAX` means never succeed.
    failures_before_success: HashMap<String, u32>,
    slot_requests: Mutex<Vec<String>>,
    upload_attempts: AtomicUsize,
    uploaded: Mutex<Vec<(String, Vec<u8>)>>,
}

impl FakeSubmitter {
    fn failing(file_name: &str, times: u32) -> Self {
        let mut failures = HashMap::new();
        failures.insert(file_name.to_string(), times);
        Self {
            failures_before_success: failures,
            ..Self::default()
        }
    }

    fn slot_calls(&self) -> usize {
        self.slot_requests.lock().unwrap().len()
    }

    fn slot_calls_for(&self, file_name: &str) -> usize {
        self.slot_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|name| name.as_str() == file_name)
            .count()
    }

    fn uploaded_names(&self) -> Vec<String> {
        self.uploaded
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl RemoteSubmissionClient for FakeSubmitter {
    fn request_upload_slot(&self, file_name: &str) -> Result<UploadSlot, RemoteError> {
        self.slot_requests
            .lock()
            .unwrap()
            .push(file_name.to_string());
        Ok(UploadSlot {
            url: format!("https://upload.test/{}", file_name),
        })
    }

    fn stream_upload(
        &self,
        slot: &UploadSlot,
        mut payload: UploadPayload,
    ) -> Result<(), RemoteError> {
        self.upload_attempts.fetch_add(1, Ordering::SeqCst);
        assert!(slot.url.ends_with(&payload.file_name));

        let mut bytes = Vec::new();
        payload
            .reader
            .read_to_end(&mut bytes)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        assert_eq!(bytes.len() as u64, payload.len);

        let previous_attempts = self.slot_calls_for(&payload.file_name) as u32 - 1;
        let allowed_failures = self
            .failures_before_success
            .get(&payload.file_name)
            .copied()
            .unwrap_or(0);
        if previous_attempts < allowed_failures {
            return Err(RemoteError::UnexpectedStatus {
                status: 500,
                body: "upload failed".to_string(),
            });
        }

        self.uploaded
            .lock()
            .unwrap()
            .push((payload.file_name.clone(), bytes));
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

struct TestEnv {
    _temp: TempDir,
    pub root: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path().join("kits");
        fs::create_dir_all(&root).expect("Failed to create kits dir");
        Self { _temp: temp, root }
    }

    fn write(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    fn write_zip(&self, name: &str) -> PathBuf {
        let mut content = ZIP_HEADER.to_vec();
        content.extend_from_slice(name.as_bytes());
        self.write(name, &content)
    }
}

fn fast_config() -> SubmitConfig {
    SubmitConfig {
        max_upload_attempts: 10,
        dedup_delay: Duration::ZERO,
        ..SubmitConfig::default()
    }
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_bad_magic_rejected_before_any_network_call() {
    let env = TestEnv::new();
    let path = env.write("fake.zip", b"MZ\x90\x00not a zip");
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::default();

    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());
    let reports = pipeline.submit(&[path], false);

    assert_eq!(reports.len(), 1);
    assert!(matches!(
        reports[0].outcome,
        SubmissionOutcome::ValidationRejected { .. }
    ));
    assert_eq!(reports[0].dedup, DedupStatus::NotChecked);
    assert_eq!(index.calls(), 0);
    assert_eq!(submitter.slot_calls(), 0);
}

#[test]
fn test_wrong_extension_rejected_without_hashing() {
    let env = TestEnv::new();
    let path = env.write("kit.rar", ZIP_HEADER);
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::default();

    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());
    let reports = pipeline.submit(&[path], false);

    assert!(matches!(
        reports[0].outcome,
        SubmissionOutcome::ValidationRejected { .. }
    ));
    assert!(reports[0].digest.is_none());
    assert_eq!(index.calls(), 0);
    assert_eq!(submitter.slot_calls(), 0);
}

#[test]
fn test_zero_byte_archive_hashes_to_empty_digest() {
    let env = TestEnv::new();
    let path = env.write("empty.zip", b"");
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::default();

    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());
    let reports = pipeline.submit(&[path], false);

    let digest = reports[0].digest.expect("zero-byte file must hash");
    assert_eq!(digest.to_hex(), EMPTY_SHA256_HEX);
    assert!(matches!(
        reports[0].outcome,
        SubmissionOutcome::ValidationRejected { .. }
    ));
    assert_eq!(index.calls(), 0);
}

// ============================================================================
// Duplicate check
// ============================================================================

#[test]
fn test_duplicate_never_requests_upload_slot() {
    let env = TestEnv::new();
    let path = env.write_zip("known.zip");
    let index = FakeIndex::returning(2);
    let submitter = FakeSubmitter::default();

    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());
    let reports = pipeline.submit(&[path.clone()], false);

    assert_eq!(
        reports[0].outcome,
        SubmissionOutcome::Duplicate { matches: 2 }
    );
    assert_eq!(reports[0].dedup, DedupStatus::Known { matches: 2 });
    assert_eq!(index.calls(), 1);
    assert_eq!(submitter.slot_calls(), 0);

    let expected = kitintel_submit::hash_file(&path).unwrap();
    assert_eq!(index.queries.lock().unwrap()[0], expected.to_hex());
}

#[test]
fn test_failed_lookup_fails_open() {
    let env = TestEnv::new();
    let path = env.write_zip("new.zip");
    let index = FakeIndex::failing(RemoteError::Transport("connection reset".to_string()));
    let submitter = FakeSubmitter::default();

    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());
    let reports = pipeline.submit(&[path], false);

    assert_eq!(
        reports[0].outcome,
        SubmissionOutcome::Submitted { attempts: 1 }
    );
    assert!(matches!(reports[0].dedup, DedupStatus::Unverified { .. }));
    assert_eq!(submitter.uploaded_names(), vec!["new.zip".to_string()]);
}

#[test]
fn test_permission_denied_lookup_still_uploads() {
    let env = TestEnv::new();
    let path = env.write_zip("restricted.zip");
    let index = FakeIndex::failing(RemoteError::PermissionDenied);
    let submitter = FakeSubmitter::default();

    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());
    let reports = pipeline.submit(&[path], false);

    assert!(reports[0].is_submitted());
    assert_eq!(reports[0].dedup, DedupStatus::PermissionRestricted);
}

#[test]
fn test_dedup_lookups_are_paced() {
    let env = TestEnv::new();
    let a = env.write_zip("a.zip");
    let b = env.write_zip("b.zip");
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::default();
    let delay = Duration::from_millis(40);
    let config = SubmitConfig {
        dedup_delay: delay,
        ..fast_config()
    };

    let pipeline = SubmissionPipeline::new(&index, &submitter, config);
    let started = Instant::now();
    let reports = pipeline.submit(&[a, b], false);
    let elapsed = started.elapsed();

    assert!(reports.iter().all(SubmissionReport::is_submitted));
    assert_eq!(index.calls(), 2);
    assert!(
        elapsed >= delay * 2,
        "two lookups took {:?}, expected at least {:?}",
        elapsed,
        delay * 2
    );
}

#[test]
fn test_locally_rejected_files_skip_the_dedup_pause() {
    let env = TestEnv::new();
    let wrong_ext = env.write("kit.rar", ZIP_HEADER);
    let bad_magic = env.write("fake.zip", b"MZ\x90\x00");
    let empty = env.write("empty.zip", b"");
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::default();
    let delay = Duration::from_secs(2);
    let config = SubmitConfig {
        dedup_delay: delay,
        ..fast_config()
    };

    let pipeline = SubmissionPipeline::new(&index, &submitter, config);
    let started = Instant::now();
    let reports = pipeline.submit(&[wrong_ext, bad_magic, empty], false);
    let elapsed = started.elapsed();

    assert_eq!(reports.len(), 3);
    assert!(reports
        .iter()
        .all(|r| matches!(r.outcome, SubmissionOutcome::ValidationRejected { .. })));
    assert_eq!(index.calls(), 0);
    assert!(elapsed < delay, "rejections waited {:?}", elapsed);
}

// ============================================================================
// Upload and retry
// ============================================================================

#[test]
fn test_uploaded_bytes_match_file() {
    let env = TestEnv::new();
    let path = env.write_zip("office365.zip");
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::default();

    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());
    let reports = pipeline.submit(&[path.clone()], false);

    assert_eq!(reports[0].dedup, DedupStatus::Clear);
    assert_eq!(
        submitter.slot_requests.lock().unwrap().as_slice(),
        &["office365.zip".to_string()]
    );
    let uploaded = submitter.uploaded.lock().unwrap();
    assert_eq!(uploaded[0].1, fs::read(&path).unwrap());
}

#[test]
fn test_flaky_upload_recovers_within_cap() {
    let env = TestEnv::new();
    let path = env.write_zip("flaky.zip");
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::failing("flaky.zip", 2);

    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());
    let reports = pipeline.submit(&[path], false);

    assert_eq!(
        reports[0].outcome,
        SubmissionOutcome::Submitted { attempts: 3 }
    );
    assert_eq!(submitter.slot_calls(), 3);
    assert_eq!(index.calls(), 1);
}

#[test]
fn test_retry_exhaustion_does_not_stop_batch() {
    let env = TestEnv::new();
    let broken = env.write_zip("a_broken.zip");
    let healthy = env.write_zip("b_healthy.zip");
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::failing("a_broken.zip", u32::MAX);

    let config = SubmitConfig {
        max_upload_attempts: 4,
        ..fast_config()
    };
    let pipeline = SubmissionPipeline::new(&index, &submitter, config);
    let reports = pipeline.submit(&[broken, healthy], false);

    assert_eq!(reports.len(), 2);
    match &reports[0].outcome {
        SubmissionOutcome::RetriesExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(*attempts, 4);
            assert!(last_error.contains("500"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(submitter.slot_calls_for("a_broken.zip"), 4);
    assert!(reports[1].is_submitted());
    assert_eq!(submitter.uploaded_names(), vec!["b_healthy.zip".to_string()]);
}

// ============================================================================
// Batches and directories
// ============================================================================

#[test]
fn test_directory_expansion_counts() {
    let env = TestEnv::new();
    for name in ["one.zip", "two.zip", "three.zip"] {
        env.write_zip(name);
    }
    env.write("readme.txt", b"not a kit");
    env.write_zip("nested/four.zip");
    env.write_zip("nested/deeper/five.zip");

    let index = FakeIndex::returning(1);
    let submitter = FakeSubmitter::default();
    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());

    let flat = pipeline.submit(&[env.root.clone()], false);
    assert_eq!(flat.len(), 3);

    let deep = pipeline.submit(&[env.root.clone()], true);
    assert_eq!(deep.len(), 5);
    assert!(deep
        .iter()
        .all(|r| matches!(r.outcome, SubmissionOutcome::Duplicate { .. })));
}

#[test]
fn test_directory_children_keep_input_position() {
    let env = TestEnv::new();
    let first = env.write_zip("first.zip");
    env.write_zip("dir/b.zip");
    env.write_zip("dir/a.zip");
    let last = env.write_zip("last.zip");

    let index = FakeIndex::returning(1);
    let submitter = FakeSubmitter::default();
    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());
    let reports = pipeline.submit(&[first, env.root.join("dir"), last], false);

    let names: Vec<String> = reports.iter().map(|r| r.kit_name()).collect();
    assert_eq!(names, vec!["first", "a", "b", "last"]);
}

#[test]
fn test_missing_path_is_isolated() {
    let env = TestEnv::new();
    let missing = env.root.join("missing.zip");
    let present = env.write_zip("present.zip");
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::default();

    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config());
    let reports = pipeline.submit(&[missing, present], false);

    assert!(matches!(reports[0].outcome, SubmissionOutcome::Failed { .. }));
    assert!(reports[1].is_submitted());
}

// ============================================================================
// Cancellation and observation
// ============================================================================

#[test]
fn test_cancelled_before_start_processes_nothing() {
    let env = TestEnv::new();
    let path = env.write_zip("kit.zip");
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::default();

    let token = CancellationToken::new();
    token.cancel();
    let pipeline =
        SubmissionPipeline::new(&index, &submitter, fast_config()).with_cancellation(token);
    let reports = pipeline.submit(&[path], false);

    assert!(reports.is_empty());
    assert_eq!(index.calls(), 0);
}

struct CancelAfterFirst {
    token: CancellationToken,
    finished: Mutex<Vec<PathBuf>>,
    last_progress: Mutex<Option<(u64, u64)>>,
}

impl SubmissionObserver for CancelAfterFirst {
    fn upload_progress(&self, sent: u64, total: u64) {
        *self.last_progress.lock().unwrap() = Some((sent, total));
    }

    fn candidate_finished(&self, report: &SubmissionReport) {
        self.finished.lock().unwrap().push(report.path.clone());
        self.token.cancel();
    }
}

#[test]
fn test_cancel_mid_batch_lets_current_finish() {
    let env = TestEnv::new();
    let a = env.write_zip("a.zip");
    let b = env.write_zip("b.zip");
    let index = FakeIndex::returning(0);
    let submitter = FakeSubmitter::default();

    let token = CancellationToken::new();
    let observer = Arc::new(CancelAfterFirst {
        token: token.clone(),
        finished: Mutex::new(Vec::new()),
        last_progress: Mutex::new(None),
    });
    let pipeline = SubmissionPipeline::new(&index, &submitter, fast_config())
        .with_cancellation(token)
        .with_observer(observer.clone());
    let reports = pipeline.submit(&[a.clone(), b], false);

    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_submitted());
    assert_eq!(submitter.uploaded_names(), vec!["a.zip".to_string()]);

    let size = fs::metadata(&a).unwrap().len();
    assert_eq!(*observer.last_progress.lock().unwrap(), Some((size, size)));
    assert_eq!(observer.finished.lock().unwrap().len(), 1);
    assert!(observer.finished.lock().unwrap()[0].ends_with(Path::new("a.zip")));
}
