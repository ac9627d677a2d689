//! Recording library adapters

mod fs_library;

pub use fs_library::FsRecordingLibrary;
