pub mod job;
pub mod scanner;

pub use job::{classify, is_lock_file, DocumentKind, Job, LOCK_FILE_PREFIX};
pub use scanner::{DirectoryBatch, DirectoryWalk, DirectoryWalker};
