//! Compile-time layout constants.
//!
//! Every size in this filesystem is fixed at compile time: block
//! numbers, inode numbers and the per-inode index vector all fit in a
//! single byte, which keeps the on-disk tables plain byte arrays
//! instead of dynamically sized containers.

/// Size of a single block, in bytes.
pub const BLOCK_SIZE: usize = 256;

/// Number of addressable blocks on the device. Block numbers are 8-bit.
pub const MAX_BLOCKS: usize = 256;

/// Number of inode slots in the inode table. Inode numbers are 8-bit.
pub const MAX_INODES: usize = 256;

/// Width in bytes of an on-disk inode's `mode` field.
pub const MODE_SIZE: usize = 4;

/// Width in bytes of an on-disk inode's `size` field.
pub const SIZE_SIZE: usize = 8;

/// Number of data-block indices an inode can hold.
///
/// `BLOCK_SIZE - MODE_SIZE - SIZE_SIZE`, so the inode record fits
/// exactly inside one block.
pub const MAX_BLOCKS_PER_INODE: usize = BLOCK_SIZE - MODE_SIZE - SIZE_SIZE;

/// Maximum size of a regular file addressable by one inode's index vector.
pub const MAX_FILE_SIZE: u64 = (MAX_BLOCKS_PER_INODE * BLOCK_SIZE) as u64;

/// Maximum length of a path component, in bytes. The name-length field
/// of a directory entry is one byte, so this is also its ceiling.
pub const MAX_FILENAME: usize = 255;

/// Upper bound on directory entries `enumerate` will return for a
/// single directory, guarding against a corrupt byte stream that never
/// hits a terminating zero `inode_num`.
pub const MAX_DIR_ENTRIES: usize = 4096;

/// Block 0 holds the inode table.
pub const INODE_TABLE_BLOCK: u8 = 0;

/// Block 1 holds the free-space map.
pub const FREE_MAP_BLOCK: u8 = 1;

/// Block 2 holds the root inode's record.
pub const ROOT_INODE_BLOCK: u8 = 2;

/// Inode number of the root directory.
pub const ROOT_INODE_NUM: u8 = 0;

/// Total size of the backing device: `MAX_BLOCKS * BLOCK_SIZE`.
pub const DEVICE_SIZE: u64 = (MAX_BLOCKS * BLOCK_SIZE) as u64;

/// Fixed filename of the backing device the CLI opens in its working directory.
pub const DEFAULT_IMAGE_NAME: &str = "FS";
