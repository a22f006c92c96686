pub mod archive;

pub use archive::{
    is_inside_archive_tree, ArchiveMapping, ArchiveMover, ArchiveReceipt, PruneFailure,
    ARCHIVE_SUFFIX,
};
