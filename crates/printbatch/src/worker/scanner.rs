use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use walkdir::WalkDir;

use crate::error::ScanError;
use crate::worker::job::is_lock_file;

/// One directory of the source tree together with its direct files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBatch {
    pub directory: PathBuf,
    /// Regular files, lock files excluded, sorted by name.
    pub files: Vec<PathBuf>,
}

impl DirectoryBatch {
    /// Final path component, or the whole path for roots such as `/`.
    pub fn name(&self) -> String {
        self.directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.directory.display().to_string())
    }
}

pub struct DirectoryWalker {
    source_root: PathBuf,
}

impl DirectoryWalker {
    pub fn new<P: AsRef<Path>>(source_root: P) -> Self {
        Self {
            source_root: source_root.as_ref().to_path_buf(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Starts a post-order walk: every subdirectory is yielded before its
    /// parent and the source root comes last.
    ///
    /// File lists are read when a directory is reached, so files archived and
    /// directories pruned earlier in the walk are not reported again.
    pub fn walk(&self) -> Result<DirectoryWalk, ScanError> {
        if !self.source_root.is_dir() {
            return Err(ScanError::ReadDirectory {
                path: self.source_root.clone(),
                source: std::io::Error::new(ErrorKind::NotFound, "source root is not a directory"),
            });
        }

        let inner = WalkDir::new(&self.source_root)
            .contents_first(true)
            .sort_by_file_name()
            .into_iter();

        Ok(DirectoryWalk { inner })
    }
}

/// Lazy, single-use iterator over the directories of a source tree.
pub struct DirectoryWalk {
    inner: walkdir::IntoIter,
}

impl Iterator for DirectoryWalk {
    type Item = Result<DirectoryBatch, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    // Directories pruned earlier in the pass vanish under the walker.
                    if e.io_error().map(|io| io.kind()) == Some(ErrorKind::NotFound) {
                        trace!("Skipping vanished entry: {}", e);
                        continue;
                    }
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_default();
                    return Some(Err(ScanError::ScanFailed { path, source: e }));
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            match list_files(entry.path()) {
                Ok(Some(files)) => {
                    debug!(
                        "Visiting {} ({} files)",
                        entry.path().display(),
                        files.len()
                    );
                    return Some(Ok(DirectoryBatch {
                        directory: entry.into_path(),
                        files,
                    }));
                }
                Ok(None) => {
                    debug!("Directory already pruned: {}", entry.path().display());
                    continue;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Direct, non-lock files of `directory`, or `None` if it no longer exists.
fn list_files(directory: &Path) -> Result<Option<Vec<PathBuf>>, ScanError> {
    let read_dir = match std::fs::read_dir(directory) {
        Ok(rd) => rd,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ScanError::ReadDirectory {
                path: directory.to_path_buf(),
                source: e,
            })
        }
    };

    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| ScanError::ReadDirectory {
            path: directory.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if is_lock_file(&entry.file_name().to_string_lossy()) {
            trace!("Ignoring lock file: {}", path.display());
            continue;
        }

        files.push(path);
    }

    files.sort();
    Ok(Some(files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    fn collect(walker: &DirectoryWalker) -> Vec<DirectoryBatch> {
        walker
            .walk()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_walk_empty_directory() {
        let temp = TempDir::new().unwrap();
        let batches = collect(&DirectoryWalker::new(temp.path()));

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].directory, temp.path());
        assert!(batches[0].files.is_empty());
    }

    #[test]
    fn test_walk_is_post_order() {
        let temp = TempDir::new().unwrap();
        temp.child("a/b/deep.pdf").touch().unwrap();
        temp.child("a/mid.pdf").touch().unwrap();
        temp.child("c/other.xls").touch().unwrap();
        temp.child("top.pdf").touch().unwrap();

        let batches = collect(&DirectoryWalker::new(temp.path()));
        let dirs: Vec<PathBuf> = batches.iter().map(|b| b.directory.clone()).collect();

        assert_eq!(
            dirs,
            vec![
                temp.path().join("a/b"),
                temp.path().join("a"),
                temp.path().join("c"),
                temp.path().to_path_buf(),
            ]
        );
        assert_eq!(batches[3].files, vec![temp.path().join("top.pdf")]);
    }

    #[test]
    fn test_walk_excludes_lock_files() {
        let temp = TempDir::new().unwrap();
        temp.child("site/~$book.xlsx").touch().unwrap();
        temp.child("site/book.xlsx").touch().unwrap();

        let batches = collect(&DirectoryWalker::new(temp.path()));
        assert_eq!(batches[0].files, vec![temp.path().join("site/book.xlsx")]);
    }

    #[test]
    fn test_walk_lists_unrecognized_files() {
        let temp = TempDir::new().unwrap();
        temp.child("notes.txt").touch().unwrap();

        let batches = collect(&DirectoryWalker::new(temp.path()));
        assert_eq!(batches[0].files.len(), 1);
    }

    #[test]
    fn test_files_sorted_by_name() {
        let temp = TempDir::new().unwrap();
        temp.child("b.pdf").touch().unwrap();
        temp.child("a.pdf").touch().unwrap();
        temp.child("c.pdf").touch().unwrap();

        let batches = collect(&DirectoryWalker::new(temp.path()));
        let names: Vec<String> = batches[0]
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_pruned_directories_are_skipped() {
        let temp = TempDir::new().unwrap();
        temp.child("a/b/doc.pdf").touch().unwrap();

        let walker = DirectoryWalker::new(temp.path());
        let mut walk = walker.walk().unwrap();

        let first = walk.next().unwrap().unwrap();
        assert_eq!(first.directory, temp.path().join("a/b"));

        // Simulate archiving the only file and pruning both levels.
        std::fs::remove_file(temp.path().join("a/b/doc.pdf")).unwrap();
        std::fs::remove_dir(temp.path().join("a/b")).unwrap();
        std::fs::remove_dir(temp.path().join("a")).unwrap();

        let rest: Vec<DirectoryBatch> = walk.collect::<Result<_, _>>().unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].directory, temp.path());
    }

    #[test]
    fn test_missing_source_root() {
        let temp = TempDir::new().unwrap();
        let walker = DirectoryWalker::new(temp.path().join("missing"));
        assert!(matches!(
            walker.walk(),
            Err(ScanError::ReadDirectory { .. })
        ));
    }

    #[test]
    fn test_batch_name() {
        let batch = DirectoryBatch {
            directory: PathBuf::from("/srv/outbox/1042"),
            files: vec![],
        };
        assert_eq!(batch.name(), "1042");
    }
}
