//! Kit submission pipeline.
//!
//! Takes files and directories from the command line and, for every zip
//! archive found, runs:
//!
//! ```text
//! extension check -> SHA-256 -> magic bytes -> duplicate lookup -> upload (bounded retry)
//! ```
//!
//! Local checks run before any remote call so rejected files never consume
//! submission quota. Every candidate resolves to a [`SubmissionReport`]; one
//! bad file never stops the rest of the batch.
//!
//! The remote service is reached only through [`RemoteIndexClient`] and
//! [`RemoteSubmissionClient`], which the binary implements over HTTP and the
//! tests implement in memory.

pub mod archive;
pub mod cancel;
pub mod candidate;
pub mod digest;
pub mod outcome;
pub mod pipeline;
pub mod progress;
pub mod remote;

pub use archive::{ArchiveFormat, ValidationError, ZIP};
pub use cancel::CancellationToken;
pub use candidate::{expand_directory, ExpandError, SubmissionCandidate};
pub use digest::{hash_file, hash_reader, ContentDigest, DigestError, HashComputer, Sha256Hasher};
pub use outcome::{DedupStatus, SubmissionOutcome, SubmissionReport};
pub use pipeline::{SubmissionPipeline, SubmitConfig};
pub use progress::{ProgressReader, SubmissionObserver};
pub use remote::{RemoteError, RemoteIndexClient, RemoteSubmissionClient, UploadPayload, UploadSlot};
