//! Local file system operations for asset sync.
//!
//! - [`hash_file`] - streamed content hashing with size and mtime capture
//! - [`FileStat`] / [`set_mtime_us`] - stat capture and mtime stamping
//! - [`collect_output_files`] - walk output directories of an asset root
//! - [`join_relative`] / [`to_posix_relative`] - manifest path conversion

pub mod error;
pub mod hash;
pub mod paths;
pub mod scan;
pub mod stat;

pub use error::FileSystemError;
pub use hash::{hash_file, FileHash, HASH_READ_CHUNK_SIZE};
pub use paths::{join_relative, to_posix_relative};
pub use scan::{collect_output_files, ScannedFile};
pub use stat::{set_mtime_us, system_time_to_micros, FileStat};
