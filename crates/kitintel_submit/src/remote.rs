//! Collaborator contracts for the remote KIT service.

use std::io::Read;
use thiserror::Error;

use crate::digest::ContentDigest;

/// Failure talking to the remote service.
///
/// `PermissionDenied` is kept apart from the other variants because the
/// duplicate lookup treats it as "cannot verify" rather than as an outage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("access denied by the KIT API")]
    PermissionDenied,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("unable to decode response: {0}")]
    Decode(String),
}

/// Looks up whether an archive is already indexed.
pub trait RemoteIndexClient {
    /// Number of indexed kits whose archive hash equals `digest`.
    fn count_matches(&self, digest: &ContentDigest) -> Result<u64, RemoteError>;
}

/// One-time upload destination issued by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSlot {
    pub url: String,
}

/// Archive bytes to stream into an upload slot.
pub struct UploadPayload {
    pub file_name: String,
    /// Exact byte count `reader` will yield.
    pub len: u64,
    pub reader: Box<dyn Read + Send>,
}

impl std::fmt::Debug for UploadPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPayload")
            .field("file_name", &self.file_name)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Requests upload slots and streams archives into them.
pub trait RemoteSubmissionClient {
    /// Only the base name of the archive is sent.
    fn request_upload_slot(&self, file_name: &str) -> Result<UploadSlot, RemoteError>;

    fn stream_upload(&self, slot: &UploadSlot, payload: UploadPayload) -> Result<(), RemoteError>;
}

impl<T: RemoteIndexClient + ?Sized> RemoteIndexClient for &T {
    fn count_matches(&self, digest: &ContentDigest) -> Result<u64, RemoteError> {
        (**self).count_matches(digest)
    }
}

impl<T: RemoteSubmissionClient + ?Sized> RemoteSubmissionClient for &T {
    fn request_upload_slot(&self, file_name: &str) -> Result<UploadSlot, RemoteError> {
        (**self).request_upload_slot(file_name)
    }

    fn stream_upload(&self, slot: &UploadSlot, payload: UploadPayload) -> Result<(), RemoteError> {
        (**self).stream_upload(slot, payload)
    }
}
