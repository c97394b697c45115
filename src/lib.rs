//! A single-file-backed user-space filesystem, mounted through FUSE.
//!
//! The on-disk format is a fixed-size, block-addressed image: a
//! 256-entry inode table, a 256-entry free-space bitmap, and 256
//! 256-byte blocks, addressed throughout by a single byte (`param`).
//! `fs` implements that format bottom-up; `bridge` exposes it to the
//! kernel through `fuser`.

pub mod bridge;
pub mod device;
pub mod error;
pub mod fs;
pub mod param;

pub use error::{FsError, FsResult};
pub use fs::FileSystemCore;
