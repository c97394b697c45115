//! Kernel bridge: wires the operation surface (`fs::ops`) into
//! `fuser::Filesystem`, the crate the rest of this bridge is grounded
//! on (`other_examples`' `fuse-ufs` driver uses the same crate for the
//! same job, against a heavier on-disk format).
//!
//! `fuser` addresses inodes by `u64`; the core only ever hands out
//! `u8` inode numbers. The mapping is 1:1 and offset by one, since
//! FUSE reserves inode `1` for the mount root: `fuse_ino = core_inum +
//! 1`. The core itself is path-addressed, not inode-addressed (every
//! `ops::*` call re-resolves a path from the root), so this bridge
//! keeps a small cache from `fuse_ino` back to the path that produced
//! it, filled in on every `lookup`/`readdir`/`create`/`mkdir` and
//! consulted by every other callback. Since this filesystem has no
//! hard links, each inode has exactly one path, so the cache is never
//! ambiguous.
//!
//! This is also the only layer that logs: the core propagates errors
//! silently all the way up (see `error.rs`), and this is where every
//! `FsError` is finally translated to an errno, so it's where the
//! translation gets logged too.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory,
    ReplyEntry, ReplyOpen, ReplyWrite, Request,
};
use log::{error, warn};

use crate::error::FsError;
use crate::fs::inode::MODE_DIR;
use crate::fs::ops;
use crate::fs::stat::Stat;
use crate::fs::FileSystemCore;

/// How long the kernel may cache an attribute or directory entry
/// before re-asking us. Short, since nothing outside this process ever
/// mutates the backing file concurrently, but zero would make every
/// `ls -l` a fresh round trip for no benefit.
const ATTR_TTL: Duration = Duration::from_secs(1);

const ROOT_FUSE_INO: u64 = 1;

pub struct Fuse {
    core: FileSystemCore,
    paths: Mutex<HashMap<u64, String>>,
}

impl Fuse {
    pub fn new(core: FileSystemCore) -> Self {
        let mut paths = HashMap::new();
        paths.insert(ROOT_FUSE_INO, "/".to_string());
        Self { core, paths: Mutex::new(paths) }
    }

    fn path_of(&self, ino: u64) -> Option<String> {
        self.paths.lock().expect("path cache lock poisoned").get(&ino).cloned()
    }

    fn remember(&self, ino: u64, path: String) {
        self.paths.lock().expect("path cache lock poisoned").insert(ino, path);
    }

    fn child_path(parent_path: &str, name: &str) -> String {
        if parent_path == "/" {
            format!("/{name}")
        } else {
            format!("{parent_path}/{name}")
        }
    }

    fn inum_to_ino(inum: u8) -> u64 {
        inum as u64 + 1
    }

    /// Looks up `ino` in the path cache, logging and reporting `EINVAL`
    /// on a miss. A miss means `fuser` handed us an inode we never
    /// vended through `lookup`/`readdir`/`create`/`mkdir` — a bridge
    /// bug, not a filesystem error, so it doesn't go through
    /// `FsError`.
    fn require_path(&self, op: &str, ino: u64) -> Option<String> {
        let path = self.path_of(ino);
        if path.is_none() {
            error!("{op}: no cached path for inode {ino}");
        }
        path
    }

    /// Translates `e` to an errno, logging the translation — the one
    /// place in the whole crate this happens (`error.rs`'s `FsError`
    /// is otherwise silent).
    fn errno(op: &str, path: &str, e: FsError) -> i32 {
        warn!("{op} {path}: {e}");
        e.to_errno()
    }

    fn attr(ino: u64, stat: Stat) -> FileAttr {
        let kind = if stat.mode & MODE_DIR != 0 { FileType::Directory } else { FileType::RegularFile };
        let now = SystemTime::now();
        FileAttr {
            ino,
            size: stat.size,
            blocks: stat.size.div_ceil(crate::param::BLOCK_SIZE as u64),
            atime: now,
            mtime: now,
            ctime: now,
            crtime: now,
            kind,
            perm: (stat.mode & 0o7777) as u16,
            nlink: stat.nlink,
            uid: 0,
            gid: 0,
            rdev: 0,
            blksize: crate::param::BLOCK_SIZE as u32,
            flags: 0,
        }
    }
}

impl Filesystem for Fuse {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(parent_path) = self.require_path("lookup", parent) else {
            reply.error(libc::EINVAL);
            return;
        };
        let Some(name) = name.to_str() else {
            error!("lookup: non-UTF-8 name under {parent_path}");
            reply.error(libc::EINVAL);
            return;
        };
        let path = Self::child_path(&parent_path, name);
        match ops::getattr(&self.core, &path) {
            Ok(stat) => {
                // lookup needs the resolved inode number, not just its
                // attributes; recompute it the same way ops::getattr did,
                // paying one extra resolve for a u8 we otherwise discard.
                let inum = match crate::fs::path::resolve(&mut self.core.lock(), &path) {
                    Ok(inum) => inum,
                    Err(e) => {
                        reply.error(Self::errno("lookup", &path, e));
                        return;
                    }
                };
                let ino = Self::inum_to_ino(inum);
                self.remember(ino, path);
                reply.entry(&ATTR_TTL, &Self::attr(ino, stat), 0);
            }
            Err(e) => reply.error(Self::errno("lookup", &path, e)),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        let Some(path) = self.require_path("getattr", ino) else {
            reply.error(libc::EINVAL);
            return;
        };
        match ops::getattr(&self.core, &path) {
            Ok(stat) => reply.attr(&ATTR_TTL, &Self::attr(ino, stat)),
            Err(e) => reply.error(Self::errno("getattr", &path, e)),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<fuser::TimeOrNow>,
        _mtime: Option<fuser::TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let Some(path) = self.require_path("setattr", ino) else {
            reply.error(libc::EINVAL);
            return;
        };
        if let Some(mode) = mode {
            if let Err(e) = ops::chmod(&self.core, &path, mode) {
                reply.error(Self::errno("setattr(chmod)", &path, e));
                return;
            }
        }
        match ops::getattr(&self.core, &path) {
            Ok(stat) => reply.attr(&ATTR_TTL, &Self::attr(ino, stat)),
            Err(e) => reply.error(Self::errno("setattr", &path, e)),
        }
    }

    fn readdir(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
        let Some(path) = self.require_path("readdir", ino) else {
            reply.error(libc::EINVAL);
            return;
        };
        // ops::readdir already prepends "." and "..", so this only
        // ever maps the core's entries onto fuser's, never invents any.
        let entries = match ops::readdir(&self.core, &path) {
            Ok(entries) => entries,
            Err(e) => {
                reply.error(Self::errno("readdir", &path, e));
                return;
            }
        };

        for (i, entry) in entries.into_iter().enumerate().skip(offset as usize) {
            let child_ino = Self::inum_to_ino(entry.inode_num);
            let kind = if entry.name == "." || entry.name == ".." {
                FileType::Directory
            } else {
                let child_path = Self::child_path(&path, &entry.name);
                self.remember(child_ino, child_path.clone());
                match ops::getattr(&self.core, &child_path) {
                    Ok(stat) if stat.mode & MODE_DIR != 0 => FileType::Directory,
                    Ok(_) => FileType::RegularFile,
                    Err(e) => {
                        warn!("readdir {path}: getattr {child_path}: {e}");
                        FileType::RegularFile
                    }
                }
            };
            if reply.add(child_ino, (i + 1) as i64, kind, &entry.name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        let Some(path) = self.require_path("open", ino) else {
            reply.error(libc::EINVAL);
            return;
        };
        match ops::open(&self.core, &path) {
            Ok(_) => reply.opened(0, 0),
            Err(e) => reply.error(Self::errno("open", &path, e)),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(path) = self.require_path("read", ino) else {
            reply.error(libc::EINVAL);
            return;
        };
        if offset < 0 {
            warn!("read {path}: negative offset {offset}");
            reply.error(libc::EINVAL);
            return;
        }
        let mut buf = vec![0u8; size as usize];
        match ops::read(&self.core, &path, &mut buf, offset as u64) {
            Ok(n) => reply.data(&buf[..n]),
            Err(e) => reply.error(Self::errno("read", &path, e)),
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let Some(path) = self.require_path("write", ino) else {
            reply.error(libc::EINVAL);
            return;
        };
        if offset < 0 {
            warn!("write {path}: negative offset {offset}");
            reply.error(libc::EINVAL);
            return;
        }
        match ops::write(&self.core, &path, data, offset as u64) {
            Ok(()) => reply.written(data.len() as u32),
            Err(e) => reply.error(Self::errno("write", &path, e)),
        }
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        let Some(parent_path) = self.require_path("create", parent) else {
            reply.error(libc::EINVAL);
            return;
        };
        let Some(name) = name.to_str() else {
            error!("create: non-UTF-8 name under {parent_path}");
            reply.error(libc::EINVAL);
            return;
        };
        let path = Self::child_path(&parent_path, name);
        match ops::create(&self.core, &path, mode) {
            Ok(stat) => {
                let inum = match crate::fs::path::resolve(&mut self.core.lock(), &path) {
                    Ok(inum) => inum,
                    Err(e) => {
                        reply.error(Self::errno("create", &path, e));
                        return;
                    }
                };
                let ino = Self::inum_to_ino(inum);
                self.remember(ino, path);
                reply.created(&ATTR_TTL, &Self::attr(ino, stat), 0, 0, 0);
            }
            Err(e) => reply.error(Self::errno("create", &path, e)),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let Some(parent_path) = self.require_path("mkdir", parent) else {
            reply.error(libc::EINVAL);
            return;
        };
        let Some(name) = name.to_str() else {
            error!("mkdir: non-UTF-8 name under {parent_path}");
            reply.error(libc::EINVAL);
            return;
        };
        let path = Self::child_path(&parent_path, name);
        match ops::mkdir(&self.core, &path, mode) {
            Ok(stat) => {
                let inum = match crate::fs::path::resolve(&mut self.core.lock(), &path) {
                    Ok(inum) => inum,
                    Err(e) => {
                        reply.error(Self::errno("mkdir", &path, e));
                        return;
                    }
                };
                let ino = Self::inum_to_ino(inum);
                self.remember(ino, path);
                reply.entry(&ATTR_TTL, &Self::attr(ino, stat), 0);
            }
            Err(e) => reply.error(Self::errno("mkdir", &path, e)),
        }
    }
}
