//! Data streams: byte-addressable read/write over an inode's index
//! vector. Both files and directories are data streams; directories
//! simply impose a record structure (see `directory`) on top.
//!
//! Writes are append-or-overwrite only: `offset` must not exceed the
//! inode's current size, so there are never holes in the index vector,
//! matching the source's "reach a new block only when the current one
//! is full" discipline. A write that lands on the boundary of the last
//! allocated block reaches for a fresh one via
//! `inode::allocate_data_block_for`, exactly in step with where a
//! byte-at-a-time writer would have crossed it; the implementation
//! below batches the actual `write_all` per block instead of emitting
//! one byte at a time, but touches the same (block, offset) pairs.

use crate::error::{FsError, FsResult};
use crate::fs::inode;
use crate::fs::Inner;
use crate::param::{BLOCK_SIZE, MAX_FILE_SIZE};

/// Appends/overwrites `data` at `offset`, growing the inode's size if
/// the write extends past its current end. `offset` must not exceed
/// the current size (no sparse writes).
pub fn write(inner: &mut Inner, table_block: u8, data: &[u8], offset: u64) -> FsResult<()> {
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    if offset > dinode.size {
        return Err(FsError::BadOffset);
    }
    if offset.saturating_add(data.len() as u64) > MAX_FILE_SIZE {
        return Err(FsError::NoSpace);
    }

    let mut pos = offset;
    let mut written = 0usize;
    while written < data.len() {
        let block_index = (pos / BLOCK_SIZE as u64) as usize;
        let block_offset = (pos % BLOCK_SIZE as u64) as u16;
        let block_num = block_for_index(inner, table_block, block_index)?;

        let space_in_block = BLOCK_SIZE - block_offset as usize;
        let chunk_len = space_in_block.min(data.len() - written);

        inner.device.seek(block_num, block_offset)?;
        inner.device.write(&data[written..written + chunk_len])?;

        written += chunk_len;
        pos += chunk_len as u64;
    }
    inner.device.flush()?;

    let new_size = offset + data.len() as u64;
    if new_size > dinode.size {
        inode::update_size(&mut inner.device, table_block, new_size)?;
    }
    Ok(())
}

/// Returns the data block holding byte-index `block_index` of the
/// inode's stream, allocating a fresh one via the free-space map if
/// this is the first write to reach it.
fn block_for_index(inner: &mut Inner, table_block: u8, block_index: usize) -> FsResult<u8> {
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    if block_index >= dinode.index.len() {
        return Err(FsError::NoSpace);
    }
    if dinode.index[block_index] != 0 {
        Ok(dinode.index[block_index])
    } else {
        inode::allocate_data_block_for(&mut inner.device, &mut inner.free_map, table_block)
    }
}

/// Reads up to `buf.len()` bytes starting at `offset`, clamped to
/// `min(buf.len(), inode.size - offset)` — a read past the end of the
/// stream returns `Ok(0)` rather than an error, and a read that starts
/// inside the stream but would run past its end is truncated instead
/// of reading garbage from an unallocated block.
pub fn read(inner: &mut Inner, table_block: u8, buf: &mut [u8], offset: u64) -> FsResult<usize> {
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    if offset >= dinode.size {
        return Ok(0);
    }
    let available = (dinode.size - offset) as usize;
    let to_read = buf.len().min(available);

    let mut pos = offset;
    let mut read_total = 0usize;
    while read_total < to_read {
        let block_index = (pos / BLOCK_SIZE as u64) as usize;
        let block_offset = (pos % BLOCK_SIZE as u64) as u16;
        let block_num = dinode.index[block_index];
        if block_num == 0 {
            return Err(FsError::Corrupt("index vector zero entry within inode size"));
        }

        let space_in_block = BLOCK_SIZE - block_offset as usize;
        let chunk_len = space_in_block.min(to_read - read_total);

        inner.device.seek(block_num, block_offset)?;
        inner.device.read(&mut buf[read_total..read_total + chunk_len])?;

        read_total += chunk_len;
        pos += chunk_len as u64;
    }
    Ok(read_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystemCore;
    use crate::param::ROOT_INODE_BLOCK;

    #[test]
    fn write_then_read_round_trips_within_one_block() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        write(&mut inner, ROOT_INODE_BLOCK, b"hello", 0).unwrap();
        let mut buf = [0u8; 5];
        let n = read(&mut inner, ROOT_INODE_BLOCK, &mut buf, 0).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn write_crossing_a_block_boundary_allocates_a_second_block() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        let data = vec![0x42u8; BLOCK_SIZE + 10];
        write(&mut inner, ROOT_INODE_BLOCK, &data, 0).unwrap();
        let mut buf = vec![0u8; data.len()];
        let n = read(&mut inner, ROOT_INODE_BLOCK, &mut buf, 0).unwrap();
        assert_eq!(n, data.len());
        assert_eq!(buf, data);

        let dinode = inode::read_inode(&mut inner.device, ROOT_INODE_BLOCK).unwrap();
        assert_eq!(dinode.block_count(), 2);
    }

    #[test]
    fn read_past_end_of_stream_returns_zero() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        write(&mut inner, ROOT_INODE_BLOCK, b"abc", 0).unwrap();
        let mut buf = [0u8; 4];
        let n = read(&mut inner, ROOT_INODE_BLOCK, &mut buf, 3).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn read_clamps_to_remaining_size_instead_of_requested_length() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        write(&mut inner, ROOT_INODE_BLOCK, b"abcdef", 0).unwrap();
        let mut buf = [0u8; 100];
        let n = read(&mut inner, ROOT_INODE_BLOCK, &mut buf, 2).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf[..4], b"cdef");
    }

    #[test]
    fn write_past_current_size_is_bad_offset() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        assert!(matches!(
            write(&mut inner, ROOT_INODE_BLOCK, b"x", 10),
            Err(FsError::BadOffset)
        ));
    }
}
