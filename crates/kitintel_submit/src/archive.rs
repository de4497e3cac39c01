//! Local archive checks run before any network call.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("not a '.{expected}' file: {}", path.display())]
    BadExtension {
        path: PathBuf,
        expected: &'static str,
    },

    #[error("header bytes {found} do not match the archive signature: {}", path.display())]
    BadMagic { path: PathBuf, found: String },

    #[error("unable to read {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },
}

/// Extension plus local-file-header signature of an accepted archive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveFormat {
    /// Lowercase, without the leading dot.
    pub extension: &'static str,
    pub magic: [u8; 4],
}

/// PKZIP local file header `PK\x03\x04`.
pub const ZIP: ArchiveFormat = ArchiveFormat {
    extension: "zip",
    magic: *b"PK\x03\x04",
};

impl ArchiveFormat {
    /// Case-insensitive `.ext` suffix on the file name. Never touches the disk.
    pub fn matches_name(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| {
                let name = name.to_string_lossy().to_ascii_lowercase();
                name.len() > self.extension.len()
                    && name.ends_with(self.extension)
                    && name.as_bytes()[name.len() - self.extension.len() - 1] == b'.'
            })
            .unwrap_or(false)
    }

    pub fn check_extension(&self, path: &Path) -> Result<(), ValidationError> {
        if self.matches_name(path) {
            Ok(())
        } else {
            Err(ValidationError::BadExtension {
                path: path.to_path_buf(),
                expected: self.extension,
            })
        }
    }

    /// Compare the first four bytes with the signature. Shorter files fail.
    pub fn check_magic(&self, path: &Path) -> Result<(), ValidationError> {
        let unreadable = |source| ValidationError::Unreadable {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(unreadable)?;
        let mut head = Vec::with_capacity(self.magic.len());
        file.take(self.magic.len() as u64)
            .read_to_end(&mut head)
            .map_err(unreadable)?;

        if head == self.magic {
            Ok(())
        } else {
            Err(ValidationError::BadMagic {
                path: path.to_path_buf(),
                found: hex::encode(&head),
            })
        }
    }

    /// Extension first, then header bytes.
    pub fn validate(&self, path: &Path) -> Result<(), ValidationError> {
        self.check_extension(path)?;
        self.check_magic(path)
    }
}
