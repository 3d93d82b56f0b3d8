use std::fs;
use std::path::{Path, PathBuf};
use std::vec;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Files to scan, one at a time, with the total known up front for
/// progress reporting.
pub trait FileSource: Iterator<Item = PathBuf> {
    fn total(&self) -> usize;
}

/// A fixed list of files.
#[derive(Debug, Clone)]
pub struct FileList {
    files: vec::IntoIter<PathBuf>,
    total: usize,
}

impl FileList {
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            total: paths.len(),
            files: paths.into_iter(),
        }
    }

    /// Enumerate every regular file under `root`, descending into
    /// subdirectories when `recursive` is set.
    ///
    /// Files are listed in path order within each directory. Any unreadable
    /// directory aborts the enumeration.
    pub fn discover(root: impl AsRef<Path>, recursive: bool) -> Result<Self, SourceError> {
        let mut paths = Vec::new();
        collect_files(root.as_ref(), recursive, &mut paths)?;
        debug!(root = ?root.as_ref(), files = paths.len(), "enumerated scan input");
        Ok(Self::from_paths(paths))
    }
}

fn collect_files(dir: &Path, recursive: bool, paths: &mut Vec<PathBuf>) -> Result<(), SourceError> {
    let io_error = |source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()
        .map_err(io_error)?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            if recursive {
                collect_files(&path, recursive, paths)?;
            }
        } else if path.is_file() {
            paths.push(path);
        }
    }
    Ok(())
}

impl Iterator for FileList {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        self.files.next()
    }
}

impl FileSource for FileList {
    fn total(&self) -> usize {
        self.total
    }
}
