//! The core's error taxonomy.
//!
//! Every layer returns one of these kinds; none are retried, and none
//! are logged here — only the bridge (the FUSE-facing caller) logs and
//! translates them, matching the propagation policy of the on-disk
//! layers below it.

/// A result whose error is [`FsError`].
pub type FsResult<T> = Result<T, FsError>;

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Path resolution failed at some component, or an inode index is
    /// zero for a non-root lookup.
    #[error("no such file or directory")]
    NotFound,

    /// The parent directory already contains an entry with this name.
    #[error("entry already exists")]
    Exists,

    /// The parent directory's index vector and last data block are both full.
    #[error("directory is full")]
    DirFull,

    /// No free inode or no free data block remained.
    #[error("no space left on device")]
    NoSpace,

    /// A write offset lies beyond the current size, or a read/write
    /// offset lies beyond the addressable range of an inode.
    #[error("offset out of range")]
    BadOffset,

    /// The target inode is not of the type the operation expects
    /// (e.g. `create` on a path that already names a directory).
    #[error("not a directory")]
    NotDirectory,

    /// The target inode is a directory where a regular file was expected.
    #[error("is a directory")]
    IsDirectory,

    /// The underlying block device failed a read, write, seek or flush.
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invariant I3/I4/I5/I6 was violated while reading on-disk state.
    #[error("on-disk structure is corrupt: {0}")]
    Corrupt(&'static str),
}

impl FsError {
    /// Maps an error kind to the `errno` value the kernel bridge reports
    /// back to the VFS. The core itself never constructs an errno; this
    /// mapping lives here so the bridge has a single place to call.
    pub fn to_errno(&self) -> libc::c_int {
        match self {
            FsError::NotFound => libc::ENOENT,
            FsError::Exists => libc::EEXIST,
            FsError::DirFull => libc::ENOSPC,
            FsError::NoSpace => libc::ENOSPC,
            FsError::BadOffset => libc::EINVAL,
            FsError::NotDirectory => libc::ENOTDIR,
            FsError::IsDirectory => libc::EISDIR,
            FsError::Io(_) => libc::EIO,
            FsError::Corrupt(_) => libc::EIO,
        }
    }
}
