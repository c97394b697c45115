//! File system implementation. Layers, bottom to top:
//!   + device: raw block I/O against the backing file.
//!   + inode_table, free_map: the two superstructure blocks.
//!   + inode: per-file metadata and index vector.
//!   + datastream: byte-addressable read/write over an inode's blocks.
//!   + directory: directories as a special encoding of a data stream.
//!   + path: name resolution from the root.
//!   + ops: the operation surface the kernel bridge calls.
//!
//! This file wires the layers together: `Inner` holds everything a
//! layer needs (the open device plus the two in-memory tables), and
//! `FileSystemCore` is the single lock around it that every `ops::*`
//! call takes for its duration (§5: one critical section at a time,
//! no cancellation, no per-session state).

pub mod datastream;
pub mod directory;
pub mod free_map;
pub mod inode;
pub mod inode_table;
pub mod ops;
pub mod path;
pub mod stat;

use std::path::Path as FsPath;
use std::sync::{Mutex, MutexGuard};

use crate::device::BlockDevice;
use crate::error::FsResult;
use crate::fs::free_map::FreeMap;
use crate::fs::inode::Dinode;
use crate::fs::inode_table::InodeTable;
use crate::param::{FREE_MAP_BLOCK, INODE_TABLE_BLOCK, ROOT_INODE_BLOCK, ROOT_INODE_NUM};

/// Everything the layers above the device need, guarded together by
/// `FileSystemCore`'s lock so the device and its two in-memory mirrors
/// never drift out of sync with each other.
pub(crate) struct Inner {
    pub(crate) device: BlockDevice,
    pub(crate) inode_table: InodeTable,
    pub(crate) free_map: FreeMap,
}

/// The filesystem core. Opaque to its callers beyond `open`/`lock`;
/// every actual operation lives in `ops` and takes `&FileSystemCore`.
pub struct FileSystemCore {
    inner: Mutex<Inner>,
}

impl FileSystemCore {
    /// Opens (creating if absent, growing if undersized) the image at
    /// `path`, formatting it fresh if it has no root inode bound yet.
    pub fn open(path: &FsPath) -> FsResult<Self> {
        let mut device = BlockDevice::open(path)?;

        let mut inode_table = InodeTable::new();
        inode_table.load(&mut device)?;
        if inode_table.block_of(ROOT_INODE_NUM) == 0 {
            Self::install(&mut device)?;
            inode_table.load(&mut device)?;
        }

        let mut free_map = FreeMap::new();
        free_map.load(&mut device)?;

        Ok(Self {
            inner: Mutex::new(Inner { device, inode_table, free_map }),
        })
    }

    /// Zeroes `device` and installs the superstructures and root inode
    /// from scratch (§6): blocks 0-2 marked occupied in the free-space
    /// map, inode 0 bound to block 2, block 2 holding an empty
    /// directory `Dinode`.
    fn install(device: &mut BlockDevice) -> FsResult<()> {
        device.format()?;

        let mut free_map = FreeMap::new();
        free_map.mark(INODE_TABLE_BLOCK, true);
        free_map.mark(FREE_MAP_BLOCK, true);
        free_map.mark(ROOT_INODE_BLOCK, true);
        free_map.persist(device)?;

        let mut inode_table = InodeTable::new();
        inode_table.bind(ROOT_INODE_NUM, ROOT_INODE_BLOCK, device)?;

        let root = Dinode::empty(inode::MODE_DIR | 0o755);
        inode::write_inode(device, ROOT_INODE_BLOCK, &root)?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("filesystem lock poisoned")
    }

    #[cfg(test)]
    pub(crate) fn format_in_memory() -> Self {
        let mut device = tests::temp_device();
        Self::install(&mut device).expect("install on fresh temp device");
        let mut inode_table = InodeTable::new();
        inode_table.load(&mut device).expect("load inode table");
        let mut free_map = FreeMap::new();
        free_map.load(&mut device).expect("load free map");
        Self {
            inner: Mutex::new(Inner { device, inode_table, free_map }),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::device::BlockDevice;

    /// A freshly created, unformatted temp-file-backed device, shared
    /// by this module's and the lower layers' unit tests.
    pub fn temp_device() -> BlockDevice {
        let path = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        let device = BlockDevice::open(&path).unwrap();
        std::mem::forget(path); // keep the file alive for the device's lifetime
        device
    }
}
