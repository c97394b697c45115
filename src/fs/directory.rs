//! Directories.
//!
//! A directory's content is the same byte stream as a file's, read
//! and written through `datastream`, but interpreted as a sequence of
//! variable-length records:
//!
//! ```text
//! inode_num: u8, name_len: u8, name: [u8; name_len]
//! ```
//!
//! Encoding is byte-stream, not block-aligned: if a record straddles a
//! block boundary its bytes continue in the next data block, and
//! readers cross blocks transparently through `datastream`. The first
//! entry whose `inode_num` is zero terminates the stream (invariant
//! I5) — a crash mid-append leaves at most one partial record, and
//! that zero-or-partial record reads back as the terminator.

use crate::error::{FsError, FsResult};
use crate::fs::datastream;
use crate::fs::inode;
use crate::fs::Inner;
use crate::param::{BLOCK_SIZE, MAX_DIR_ENTRIES, MAX_FILENAME};

/// A decoded directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub inode_num: u8,
    pub name: String,
}

/// Appends `(child_inum, name)` to `dir_inum`'s byte stream.
pub fn append_entry(
    inner: &mut Inner,
    dir_inum: u8,
    child_inum: u8,
    name: &str,
) -> FsResult<()> {
    let name_bytes = name.as_bytes();
    if name_bytes.is_empty() || name_bytes.len() > MAX_FILENAME {
        return Err(FsError::BadOffset);
    }
    let mut record = Vec::with_capacity(2 + name_bytes.len());
    record.push(child_inum);
    record.push(name_bytes.len() as u8);
    record.extend_from_slice(name_bytes);

    let table_block = inner.inode_table.block_of(dir_inum);
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    let offset = dinode.size;
    datastream::write(inner, table_block, &record, offset)
}

/// Walks `dir_inum`'s byte stream, decoding entries until a zero
/// `inode_num` or `MAX_DIR_ENTRIES` is hit.
pub fn enumerate(inner: &mut Inner, dir_inum: u8) -> FsResult<Vec<DirEntry>> {
    let table_block = inner.inode_table.block_of(dir_inum);
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    let mut entries = Vec::new();
    let mut offset = 0u64;

    while offset < dinode.size && entries.len() < MAX_DIR_ENTRIES {
        let mut header = [0u8; 2];
        let n = datastream::read(inner, table_block, &mut header, offset)?;
        if n < 2 {
            break;
        }
        let inode_num = header[0];
        if inode_num == 0 {
            break;
        }
        let name_len = header[1] as usize;
        let mut name_buf = vec![0u8; name_len];
        let n = datastream::read(inner, table_block, &mut name_buf, offset + 2)?;
        if n < name_len {
            return Err(FsError::Corrupt("directory entry name truncated"));
        }
        let name = String::from_utf8_lossy(&name_buf).into_owned();
        entries.push(DirEntry { inode_num, name });
        offset += 2 + name_len as u64;
    }
    Ok(entries)
}

/// Returns the first entry whose name equals `name`, by byte-exact compare.
pub fn lookup(inner: &mut Inner, dir_inum: u8, name: &str) -> FsResult<Option<u8>> {
    Ok(enumerate(inner, dir_inum)?
        .into_iter()
        .find(|e| e.name == name)
        .map(|e| e.inode_num))
}

/// A directory is full when its inode's index vector has no free slot
/// *and* its last data block has no free byte — matching the source's
/// `is_inode_full`, which tests both conditions rather than just the
/// index vector.
pub fn is_full(inner: &mut Inner, dir_inum: u8) -> FsResult<bool> {
    let table_block = inner.inode_table.block_of(dir_inum);
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    let block_count = dinode.block_count();
    if block_count < dinode.index.len() {
        return Ok(false);
    }
    let last_block_has_room = dinode.size == 0 || (dinode.size as usize % BLOCK_SIZE) != 0;
    Ok(!last_block_has_room)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystemCore;
    use crate::param::ROOT_INODE_NUM;

    #[test]
    fn append_then_enumerate_round_trips() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        append_entry(&mut inner, ROOT_INODE_NUM, 5, "a.txt").unwrap();
        append_entry(&mut inner, ROOT_INODE_NUM, 6, "b.txt").unwrap();
        let entries = enumerate(&mut inner, ROOT_INODE_NUM).unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry { inode_num: 5, name: "a.txt".into() },
                DirEntry { inode_num: 6, name: "b.txt".into() },
            ]
        );
    }

    #[test]
    fn lookup_misses_return_none() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        append_entry(&mut inner, ROOT_INODE_NUM, 5, "a.txt").unwrap();
        assert_eq!(lookup(&mut inner, ROOT_INODE_NUM, "missing").unwrap(), None);
        assert_eq!(lookup(&mut inner, ROOT_INODE_NUM, "a.txt").unwrap(), Some(5));
    }

    #[test]
    fn empty_directory_reports_not_full() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        assert!(!is_full(&mut inner, ROOT_INODE_NUM).unwrap());
    }
}
