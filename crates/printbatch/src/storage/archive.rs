use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::{Local, NaiveDate};
use log::{debug, warn};

use crate::error::StorageError;
use crate::worker::job::is_lock_file;

/// Appended to the source root's name, followed by `_<YYYY-MM-DD>`.
pub const ARCHIVE_SUFFIX: &str = "_print_archive";

/// Maps files under the source root to their place in the dated archive tree.
///
/// The archive root is always a sibling of the source root, so pruning the
/// source tree can never touch archived files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMapping {
    source_root: PathBuf,
    archive_root: PathBuf,
    date: NaiveDate,
}

impl ArchiveMapping {
    /// Relative roots such as `.` are made absolute first, since the archive
    /// root is named after the source directory itself.
    pub fn new<P: AsRef<Path>>(source_root: P, date: NaiveDate) -> Result<Self, StorageError> {
        let source_root = absolute_root(source_root.as_ref());
        let name = match source_root.components().next_back() {
            Some(Component::Normal(name)) => name.to_string_lossy().into_owned(),
            _ => return Err(StorageError::InvalidSourceRoot(source_root)),
        };
        let parent = source_root.parent().unwrap_or_else(|| Path::new(""));
        let archive_root = parent.join(format!(
            "{}{}_{}",
            name,
            ARCHIVE_SUFFIX,
            date.format("%Y-%m-%d")
        ));

        Ok(Self {
            source_root,
            archive_root,
            date,
        })
    }

    /// Mapping stamped with the local calendar date.
    pub fn for_today<P: AsRef<Path>>(source_root: P) -> Result<Self, StorageError> {
        Self::new(source_root, Local::now().date_naive())
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// `archive_root` joined with the file's path relative to `source_root`.
    pub fn destination_for(&self, file: &Path) -> Result<PathBuf, StorageError> {
        let relative = file
            .strip_prefix(&self.source_root)
            .map_err(|_| StorageError::OutsideSource {
                path: file.to_path_buf(),
                root: self.source_root.clone(),
            })?;

        if relative.as_os_str().is_empty() {
            return Err(StorageError::OutsideSource {
                path: file.to_path_buf(),
                root: self.source_root.clone(),
            });
        }

        Ok(self.archive_root.join(relative))
    }
}

fn absolute_root(path: &Path) -> PathBuf {
    let named = matches!(path.components().next_back(), Some(Component::Normal(_)));
    if path.is_absolute() && named {
        return path.to_path_buf();
    }
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Whether `path` lies inside any dated archive tree derived from `source_root`.
pub fn is_inside_archive_tree(source_root: &Path, path: &Path) -> bool {
    let Some(name) = source_root.file_name() else {
        return false;
    };
    let parent = source_root.parent().unwrap_or_else(|| Path::new(""));
    let prefix = format!("{}{}_", name.to_string_lossy(), ARCHIVE_SUFFIX);

    path.strip_prefix(parent)
        .ok()
        .and_then(|rest| rest.components().next())
        .map(|first| match first {
            Component::Normal(first) => first.to_string_lossy().starts_with(&prefix),
            _ => false,
        })
        .unwrap_or(false)
}

/// Move a file from `src` to `dst`. Uses `rename` first (atomic on the same
/// filesystem) and falls back to copy + delete across devices.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    let move_err = |e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    };
    std::fs::copy(src, dst).map_err(move_err)?;
    std::fs::remove_file(src).map_err(move_err)?;
    Ok(())
}

/// A directory that could not be pruned. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneFailure {
    pub directory: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReceipt {
    pub destination: PathBuf,
    /// Directories removed after the move, deepest first.
    pub pruned: Vec<PathBuf>,
    pub prune_failures: Vec<PruneFailure>,
}

pub struct ArchiveMover {
    mapping: ArchiveMapping,
}

impl ArchiveMover {
    pub fn new(mapping: ArchiveMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &ArchiveMapping {
        &self.mapping
    }

    /// Moves a printed file into the archive tree, then prunes the source
    /// directories the move left empty.
    pub fn archive(&self, file: &Path) -> Result<ArchiveReceipt, StorageError> {
        let destination = self.mapping.destination_for(file)?;

        if let Some(dir) = destination.parent() {
            ensure_directory(dir)?;
        }
        let destination = resolve_conflict(&destination)?;

        move_file(file, &destination)?;
        debug!("Archived {} -> {}", file.display(), destination.display());

        let (pruned, prune_failures) = match file.parent() {
            Some(dir) => self.prune_from(dir),
            None => (Vec::new(), Vec::new()),
        };

        Ok(ArchiveReceipt {
            destination,
            pruned,
            prune_failures,
        })
    }

    /// Walks upward from `directory`, deleting each ancestor that holds only
    /// lock files. Stops at the first non-empty or vanished directory and
    /// never removes the source root.
    pub fn prune_from(&self, directory: &Path) -> (Vec<PathBuf>, Vec<PruneFailure>) {
        let root = self.mapping.source_root();
        let mut pruned = Vec::new();
        let mut failures = Vec::new();
        let mut current = directory.to_path_buf();

        while current != root && current.starts_with(root) {
            match holds_only_lock_files(&current) {
                Ok(Some(true)) => {}
                Ok(Some(false)) | Ok(None) => break,
                Err(e) => {
                    warn!("Failed to inspect directory {}: {}", current.display(), e);
                    failures.push(PruneFailure {
                        directory: current.clone(),
                        error: e.to_string(),
                    });
                    break;
                }
            }

            if let Err(e) = remove_directory(&current) {
                warn!("Failed to remove empty directory {}: {}", current.display(), e);
                failures.push(PruneFailure {
                    directory: current.clone(),
                    error: e.to_string(),
                });
                break;
            }

            debug!("Pruned empty directory {}", current.display());
            pruned.push(current.clone());

            current = match current.parent() {
                Some(parent) => parent.to_path_buf(),
                None => break,
            };
        }

        (pruned, failures)
    }
}

/// `Some(true)` when every entry is a lock file, `None` when the directory is gone.
fn holds_only_lock_files(directory: &Path) -> std::io::Result<Option<bool>> {
    let read_dir = match std::fs::read_dir(directory) {
        Ok(rd) => rd,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    for entry in read_dir {
        let entry = entry?;
        let is_lock = is_lock_file(&entry.file_name().to_string_lossy())
            && entry.file_type()?.is_file();
        if !is_lock {
            return Ok(Some(false));
        }
    }
    Ok(Some(true))
}

/// Deletes the lock files in `directory`, then the directory itself.
/// Anything else that appeared in the meantime makes `remove_dir` fail.
fn remove_directory(directory: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if is_lock_file(&entry.file_name().to_string_lossy()) && entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
        }
    }
    std::fs::remove_dir(directory)
}

fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Returns `path` if free, otherwise the first free `name_N.ext` sibling.
/// Archived files from an earlier pass on the same day are never overwritten.
fn resolve_conflict(path: &Path) -> Result<PathBuf, StorageError> {
    if std::fs::symlink_metadata(path).is_err() {
        return Ok(path.to_path_buf());
    }

    let directory = path.parent().unwrap_or_else(|| Path::new(""));
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (base, ext) = match filename.rfind('.') {
        Some(dot_pos) if dot_pos > 0 => (&filename[..dot_pos], Some(&filename[dot_pos..])),
        _ => (filename.as_str(), None),
    };

    for counter in 2..=1000 {
        let candidate = match ext {
            Some(ext) => format!("{}_{}{}", base, counter, ext),
            None => format!("{}_{}", base, counter),
        };
        let candidate = directory.join(candidate);
        if std::fs::symlink_metadata(&candidate).is_err() {
            return Ok(candidate);
        }
    }

    Err(StorageError::FileExists(path.to_path_buf()))
}
