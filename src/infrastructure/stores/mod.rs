//! Whole-document JSON stores.

pub mod recovery_file;
pub mod run_archive;

pub use recovery_file::FileRecoveryStore;
pub use run_archive::RunArchive;
