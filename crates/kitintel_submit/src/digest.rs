//! SHA-256 content identity for submitted archives.
//!
//! Files are hashed through a fixed-size reusable buffer so memory use does
//! not depend on archive size.

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Read buffer size used when hashing files (128 KiB).
pub const HASH_CHUNK_SIZE: usize = 128 * 1024;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("unable to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("unable to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid SHA-256 hex digest '{0}'")]
    InvalidHex(String),
}

/// 256-bit SHA-256 digest of a file's full contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest of the empty input. Zero-length files hash to this.
    pub fn empty() -> Self {
        Self(Sha256::new().finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl FromStr for ContentDigest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| DigestError::InvalidHex(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Hash a byte stream incrementally using a `chunk_size` buffer.
pub fn hash_reader<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(ContentDigest(hasher.finalize().into()))
}

/// Hash a file with the default chunk size.
pub fn hash_file(path: &Path) -> Result<ContentDigest, DigestError> {
    Sha256Hasher::default().digest_file(path)
}

/// Computes the content digest of a candidate file.
pub trait HashComputer {
    fn digest_file(&self, path: &Path) -> Result<ContentDigest, DigestError>;
}

/// Streaming SHA-256 over the file on disk.
#[derive(Debug, Clone, Copy)]
pub struct Sha256Hasher {
    pub chunk_size: usize,
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self {
            chunk_size: HASH_CHUNK_SIZE,
        }
    }
}

impl HashComputer for Sha256Hasher {
    fn digest_file(&self, path: &Path) -> Result<ContentDigest, DigestError> {
        let file = File::open(path).map_err(|source| DigestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        hash_reader(file, self.chunk_size).map_err(|source| DigestError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<T: HashComputer + ?Sized> HashComputer for &T {
    fn digest_file(&self, path: &Path) -> Result<ContentDigest, DigestError> {
        (**self).digest_file(path)
    }
}
