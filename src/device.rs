//! Block device.
//!
//! The backing store is a single, fixed-size host file, addressed in
//! `BLOCK_SIZE`-byte blocks. This is the bottom layer of the stack:
//! every higher layer (the inode table, the free-space map, inodes,
//! directories) only ever reaches the device through `seek`/`read`/
//! `write`/`flush`, and treats the current position as shared mutable
//! state — re-seeking before every logical transfer, never assuming
//! the cursor was left where a previous call put it.
//!
//! Unlike a kernel buffer cache, there is exactly one reader/writer of
//! this device at a time (the caller holds the filesystem's single
//! lock for the duration of an operation; see `FileSystem`), so there
//! is no cache here beyond the host OS's own page cache, which the
//! spec takes as given.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::FsResult;
use crate::param::{BLOCK_SIZE, DEVICE_SIZE, MAX_BLOCKS};

/// A block number, `[0, MAX_BLOCKS)`.
pub type BlockNum = u8;

/// The host file backing the filesystem, seen as a numbered sequence
/// of equal-sized blocks.
pub struct BlockDevice {
    file: File,
}

impl BlockDevice {
    /// Opens (creating if absent) the backing file at `path`, growing
    /// it to `DEVICE_SIZE` bytes if it is smaller or newly created.
    pub fn open(path: &Path) -> FsResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let mut dev = Self { file };
        if dev.file.metadata()?.len() < DEVICE_SIZE {
            dev.file.set_len(DEVICE_SIZE)?;
        }
        Ok(dev)
    }

    /// Seeks to `block * BLOCK_SIZE + offset`. Fails if the position
    /// would lie outside the device.
    pub fn seek(&mut self, block: BlockNum, offset: u16) -> FsResult<()> {
        let pos = block as u64 * BLOCK_SIZE as u64 + offset as u64;
        if pos > DEVICE_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek position beyond device",
            )
            .into());
        }
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Reads `buf.len()` bytes starting at the current position,
    /// advancing it.
    pub fn read(&mut self, buf: &mut [u8]) -> FsResult<()> {
        self.file.read_exact(buf)?;
        Ok(())
    }

    /// Writes `buf` at the current position, advancing it.
    pub fn write(&mut self, buf: &[u8]) -> FsResult<()> {
        self.file.write_all(buf)?;
        Ok(())
    }

    /// Forces durability of prior writes.
    pub fn flush(&mut self) -> FsResult<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Zeroes the entire device. Does not install any superstructure;
    /// callers install the inode table, free-space map and root inode
    /// afterwards (see `FileSystem::format`).
    pub fn format(&mut self) -> FsResult<()> {
        self.seek(0, 0)?;
        let zeros = [0u8; BLOCK_SIZE];
        for _ in 0..MAX_BLOCKS {
            self.write(&zeros)?;
        }
        self.flush()
    }

    /// Reads one whole block into `buf`.
    pub fn read_block(&mut self, block: BlockNum, buf: &mut [u8; BLOCK_SIZE]) -> FsResult<()> {
        self.seek(block, 0)?;
        self.read(buf)
    }

    /// Writes one whole block from `buf`.
    pub fn write_block(&mut self, block: BlockNum, buf: &[u8; BLOCK_SIZE]) -> FsResult<()> {
        self.seek(block, 0)?;
        self.write(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_device() -> BlockDevice {
        let path = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        let device = BlockDevice::open(&path).unwrap();
        std::mem::forget(path); // keep the file alive for the device's lifetime
        device
    }

    #[test]
    fn format_zeroes_whole_device() {
        let mut dev = temp_device();
        dev.write_block(5, &[0xAB; BLOCK_SIZE]).unwrap();
        dev.format().unwrap();
        let mut buf = [0u8; BLOCK_SIZE];
        dev.read_block(5, &mut buf).unwrap();
        assert_eq!(buf, [0u8; BLOCK_SIZE]);
    }

    #[test]
    fn seek_past_device_fails() {
        let mut dev = temp_device();
        assert!(dev.seek(255, BLOCK_SIZE as u16 + 1).is_err());
    }

    #[test]
    fn write_then_read_block_round_trips() {
        let mut dev = temp_device();
        let mut content = [0u8; BLOCK_SIZE];
        for (i, b) in content.iter_mut().enumerate() {
            *b = i as u8;
        }
        dev.write_block(10, &content).unwrap();
        let mut out = [0u8; BLOCK_SIZE];
        dev.read_block(10, &mut out).unwrap();
        assert_eq!(content, out);
    }
}
