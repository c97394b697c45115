//! Operation surface: the only entry points into the core that the
//! kernel bridge (and, in tests, direct callers) use. Each function
//! takes `&FileSystemCore`, locks it for its own duration, and returns
//! `Result<_, FsError>` — matching rv6's `sysfile.c` layer, which is
//! the boundary between path-string syscalls and the inode-level
//! operations underneath.

use crate::error::{FsError, FsResult};
use crate::fs::directory::{self, DirEntry};
use crate::fs::inode::{self, Dinode, MODE_DIR, MODE_REG};
use crate::fs::path;
use crate::fs::stat::Stat;
use crate::fs::{FileSystemCore, Inner};
use crate::param::MAX_FILE_SIZE;

fn stat_of(inner: &mut Inner, inum: u8) -> FsResult<Stat> {
    let table_block = inner.inode_table.block_of(inum);
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    let nlink = if dinode.is_dir() { 2 } else { 1 };
    Ok(Stat { mode: dinode.mode, size: dinode.size, nlink })
}

/// Resolves `path` and returns its metadata.
pub fn getattr(core: &FileSystemCore, path_str: &str) -> FsResult<Stat> {
    let mut inner = core.lock();
    let inum = path::resolve(&mut inner, path_str)?;
    stat_of(&mut inner, inum)
}

/// Resolves `path`, confirms it is a directory, and lists its entries,
/// always prepending `.` (this directory) and `..` (its parent; the
/// root is its own parent) ahead of its own entries.
pub fn readdir(core: &FileSystemCore, path_str: &str) -> FsResult<Vec<DirEntry>> {
    let mut inner = core.lock();
    let inum = path::resolve(&mut inner, path_str)?;
    let table_block = inner.inode_table.block_of(inum);
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    if !dinode.is_dir() {
        return Err(FsError::NotDirectory);
    }

    let parent_inum = if path_str == "/" {
        inum
    } else {
        path::resolve_parent(&mut inner, path_str)?.0
    };

    let mut entries = vec![
        DirEntry { inode_num: inum, name: ".".to_string() },
        DirEntry { inode_num: parent_inum, name: "..".to_string() },
    ];
    entries.extend(directory::enumerate(&mut inner, inum)?);
    Ok(entries)
}

/// Resolves `path` and confirms it names a regular file, returning its
/// metadata. The core keeps no open-file-handle state; every `read`/
/// `write` call re-resolves the path, so `open` exists only to let
/// callers reject directories and missing paths up front.
pub fn open(core: &FileSystemCore, path_str: &str) -> FsResult<Stat> {
    let mut inner = core.lock();
    let inum = path::resolve(&mut inner, path_str)?;
    let stat = stat_of(&mut inner, inum)?;
    if stat.mode & MODE_DIR != 0 {
        return Err(FsError::IsDirectory);
    }
    Ok(stat)
}

/// Creates a new regular file at `path` with `mode`.
pub fn create(core: &FileSystemCore, path_str: &str, mode: u32) -> FsResult<Stat> {
    new_entry(core, path_str, (mode & !MODE_DIR) | MODE_REG)
}

/// Creates a new directory at `path` with `mode`.
pub fn mkdir(core: &FileSystemCore, path_str: &str, mode: u32) -> FsResult<Stat> {
    new_entry(core, path_str, (mode & !MODE_REG) | MODE_DIR)
}

fn new_entry(core: &FileSystemCore, path_str: &str, mode: u32) -> FsResult<Stat> {
    let mut inner = core.lock();
    let (parent, name) = path::resolve_parent(&mut inner, path_str)?;

    let parent_table = inner.inode_table.block_of(parent);
    let parent_dinode = inode::read_inode(&mut inner.device, parent_table)?;
    if !parent_dinode.is_dir() {
        return Err(FsError::NotDirectory);
    }
    if directory::lookup(&mut inner, parent, name)?.is_some() {
        return Err(FsError::Exists);
    }
    if directory::is_full(&mut inner, parent)? {
        return Err(FsError::DirFull);
    }

    let inum = inner.inode_table.alloc().ok_or(FsError::NoSpace)?;
    let block = inner
        .free_map
        .alloc_block(&mut inner.device)?
        .ok_or(FsError::NoSpace)?;

    let dinode = Dinode::empty(mode);
    inode::write_inode(&mut inner.device, block, &dinode)?;
    inner.inode_table.bind(inum, block, &mut inner.device)?;

    // Bind before linking into the parent: a crash between these two
    // steps leaves an allocated, unreachable inode (a leak, matching
    // the free-space map's own leak-not-corrupt failure mode) rather
    // than a directory entry pointing at an unbound inode.
    directory::append_entry(&mut inner, parent, inum, name)?;

    Ok(Stat { mode, size: 0, nlink: if dinode.is_dir() { 2 } else { 1 } })
}

/// Resolves `path`, confirms it is a regular file, and reads up to
/// `buf.len()` bytes starting at `offset` (clamped to the file's size;
/// see `datastream::read`).
pub fn read(core: &FileSystemCore, path_str: &str, buf: &mut [u8], offset: u64) -> FsResult<usize> {
    let mut inner = core.lock();
    let inum = path::resolve(&mut inner, path_str)?;
    let table_block = inner.inode_table.block_of(inum);
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    if dinode.is_dir() {
        return Err(FsError::IsDirectory);
    }
    crate::fs::datastream::read(&mut inner, table_block, buf, offset)
}

/// Resolves `path`, confirms it is a regular file, and writes `data`
/// at `offset` (which must not exceed the file's current size).
pub fn write(core: &FileSystemCore, path_str: &str, data: &[u8], offset: u64) -> FsResult<()> {
    let mut inner = core.lock();
    let inum = path::resolve(&mut inner, path_str)?;
    let table_block = inner.inode_table.block_of(inum);
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    if dinode.is_dir() {
        return Err(FsError::IsDirectory);
    }
    if offset.saturating_add(data.len() as u64) > MAX_FILE_SIZE {
        return Err(FsError::NoSpace);
    }
    crate::fs::datastream::write(&mut inner, table_block, data, offset)
}

/// Resolves `path` and rewrites its permission bits, preserving the
/// file-type bit.
pub fn chmod(core: &FileSystemCore, path_str: &str, permission_bits: u32) -> FsResult<()> {
    let mut inner = core.lock();
    let inum = path::resolve(&mut inner, path_str)?;
    let table_block = inner.inode_table.block_of(inum);
    let dinode = inode::read_inode(&mut inner.device, table_block)?;
    let type_bits = dinode.mode & (MODE_DIR | MODE_REG);
    inode::update_mode(&mut inner.device, table_block, type_bits | (permission_bits & 0o7777))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystemCore;

    #[test]
    fn create_then_getattr_reports_regular_file() {
        let core = FileSystemCore::format_in_memory();
        create(&core, "/a.txt", 0o644).unwrap();
        let stat = getattr(&core, "/a.txt").unwrap();
        assert_eq!(stat.mode & MODE_REG, MODE_REG);
        assert_eq!(stat.size, 0);
        assert_eq!(stat.nlink, 1);
    }

    #[test]
    fn create_duplicate_name_fails_with_exists() {
        let core = FileSystemCore::format_in_memory();
        create(&core, "/a.txt", 0o644).unwrap();
        assert!(matches!(create(&core, "/a.txt", 0o644), Err(FsError::Exists)));
    }

    #[test]
    fn mkdir_then_readdir_lists_children_after_dot_and_dotdot() {
        let core = FileSystemCore::format_in_memory();
        mkdir(&core, "/d", 0o755).unwrap();
        create(&core, "/d/a.txt", 0o644).unwrap();
        let entries = readdir(&core, "/d").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, ".");
        assert_eq!(entries[1].name, "..");
        assert_eq!(entries[1].inode_num, 0); // "/d"'s parent is the root
        assert_eq!(entries[2].name, "a.txt");
    }

    #[test]
    fn readdir_root_is_its_own_dotdot() {
        let core = FileSystemCore::format_in_memory();
        let entries = readdir(&core, "/").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], DirEntry { inode_num: 0, name: ".".to_string() });
        assert_eq!(entries[1], DirEntry { inode_num: 0, name: "..".to_string() });
    }

    #[test]
    fn write_then_read_round_trips_through_the_operation_surface() {
        let core = FileSystemCore::format_in_memory();
        create(&core, "/a.txt", 0o644).unwrap();
        write(&core, "/a.txt", b"hello world", 0).unwrap();
        let mut buf = [0u8; 11];
        let n = read(&core, "/a.txt", &mut buf, 0).unwrap();
        assert_eq!(n, 11);
        assert_eq!(&buf, b"hello world");
    }

    #[test]
    fn read_on_a_directory_is_rejected() {
        let core = FileSystemCore::format_in_memory();
        mkdir(&core, "/d", 0o755).unwrap();
        let mut buf = [0u8; 1];
        assert!(matches!(read(&core, "/d", &mut buf, 0), Err(FsError::IsDirectory)));
    }

    #[test]
    fn chmod_preserves_file_type_bit() {
        let core = FileSystemCore::format_in_memory();
        create(&core, "/a.txt", 0o644).unwrap();
        chmod(&core, "/a.txt", 0o600).unwrap();
        let stat = getattr(&core, "/a.txt").unwrap();
        assert_eq!(stat.mode, MODE_REG | 0o600);
    }

    #[test]
    fn create_missing_parent_is_not_found() {
        let core = FileSystemCore::format_in_memory();
        assert!(matches!(create(&core, "/no/such/dir/a.txt", 0o644), Err(FsError::NotFound)));
    }
}
