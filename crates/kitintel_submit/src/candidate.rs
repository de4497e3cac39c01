//! Input paths and directory expansion.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

use crate::archive::ArchiveFormat;

#[derive(Error, Debug)]
pub enum ExpandError {
    #[error("unable to list {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// One file or directory handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionCandidate {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl SubmissionCandidate {
    /// Resolve a user-supplied path. Relative paths are anchored at the
    /// current directory; the path does not have to exist.
    pub fn from_path(path: &Path) -> Self {
        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        });
        let is_dir = absolute.is_dir();
        Self {
            path: absolute,
            is_dir,
        }
    }

    fn file(path: PathBuf) -> Self {
        Self {
            path,
            is_dir: false,
        }
    }
}

/// List archive files under `dir`.
///
/// Non-recursive expansion only looks at immediate children. Results are
/// files only, sorted by path, so they are never expanded again. Symlinks
/// are followed and keep their link path. Unreadable entries and link loops
/// below `dir` are skipped; an unreadable `dir` is an error.
pub fn expand_directory(
    dir: &Path,
    format: &ArchiveFormat,
    recursive: bool,
) -> Result<Vec<SubmissionCandidate>, ExpandError> {
    let mut walker = WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut children = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(ExpandError::Walk {
                    path: dir.to_path_buf(),
                    source,
                })
            }
            Err(err) => {
                warn!(error = %err, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && format.matches_name(entry.path()) {
            children.push(SubmissionCandidate::file(entry.into_path()));
        }
    }
    children.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(children)
}
