//! Batch and upload progress notifications.

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use crate::outcome::SubmissionReport;

/// Receives pipeline events for interactive display.
///
/// Every method has a no-op default. Correctness never depends on an
/// observer being attached.
pub trait SubmissionObserver: Send + Sync {
    fn upload_started(&self, _path: &Path, _total_bytes: u64) {}

    fn upload_progress(&self, _sent_bytes: u64, _total_bytes: u64) {}

    fn upload_finished(&self, _path: &Path) {}

    fn candidate_finished(&self, _report: &SubmissionReport) {}
}

/// Reader adapter that reports cumulative bytes read.
pub struct ProgressReader<R> {
    inner: R,
    sent: u64,
    total: u64,
    observer: Arc<dyn SubmissionObserver>,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, total: u64, observer: Arc<dyn SubmissionObserver>) -> Self {
        Self {
            inner,
            sent: 0,
            total,
            observer,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.sent += n as u64;
            self.observer.upload_progress(self.sent, self.total);
        }
        Ok(n)
    }
}
