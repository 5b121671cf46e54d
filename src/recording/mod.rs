//! Recording file lifecycle: naming, state transitions and integrity metadata

pub mod metadata;
pub mod naming;
pub mod store;

pub use metadata::{hash_file, read_metadata};
pub use naming::{file_name, sanitize_filename, FileType, RecordingPaths};
pub use store::RecordingStore;
