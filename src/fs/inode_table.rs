//! Inode table: the map from inode number to the block holding that
//! inode's record.
//!
//! Mirrored in block 0 of the device. In-memory, it's just an array of
//! `MAX_INODES` block numbers; index `i` is inode number `i`, a zero
//! entry (other than index 0, the root) means "free".

use crate::device::{BlockDevice, BlockNum};
use crate::error::FsResult;
use crate::param::{INODE_TABLE_BLOCK, MAX_INODES, ROOT_INODE_NUM};

pub struct InodeTable {
    table: [BlockNum; MAX_INODES],
}

impl InodeTable {
    pub fn new() -> Self {
        Self {
            table: [0; MAX_INODES],
        }
    }

    /// Reads block 0 into memory.
    pub fn load(&mut self, dev: &mut BlockDevice) -> FsResult<()> {
        let mut buf = [0u8; crate::param::BLOCK_SIZE];
        dev.read_block(INODE_TABLE_BLOCK, &mut buf)?;
        self.table.copy_from_slice(&buf[..MAX_INODES]);
        Ok(())
    }

    /// Writes the in-memory array back to block 0 and flushes.
    pub fn persist(&self, dev: &mut BlockDevice) -> FsResult<()> {
        let mut buf = [0u8; crate::param::BLOCK_SIZE];
        buf[..MAX_INODES].copy_from_slice(&self.table);
        dev.write_block(INODE_TABLE_BLOCK, &buf)?;
        dev.flush()
    }

    /// Returns the block number holding inode `n`'s record, or `0` if
    /// `n` has no entry (free).
    pub fn block_of(&self, n: u8) -> BlockNum {
        self.table[n as usize]
    }

    /// Returns the smallest free inode number, or `None` if the table
    /// is full. Inode 0 (the root) is always bound, so it is never
    /// returned here.
    pub fn alloc(&self) -> Option<u8> {
        self.table
            .iter()
            .enumerate()
            .skip(1)
            .find(|&(_, &block)| block == 0)
            .map(|(i, _)| i as u8)
    }

    /// Binds inode `n` to `block` and persists the table.
    pub fn bind(&mut self, n: u8, block: BlockNum, dev: &mut BlockDevice) -> FsResult<()> {
        self.table[n as usize] = block;
        self.persist(dev)
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_skips_root_and_returns_lowest_free() {
        let mut t = InodeTable::new();
        t.table[0] = 2; // root, always bound
        t.table[1] = 7;
        assert_eq!(t.alloc(), Some(2));
        t.table[2] = 9;
        assert_eq!(t.alloc(), Some(3));
    }

    #[test]
    fn alloc_reports_none_when_full() {
        let mut t = InodeTable::new();
        for b in t.table.iter_mut() {
            *b = 1;
        }
        assert_eq!(t.alloc(), None);
    }
}
