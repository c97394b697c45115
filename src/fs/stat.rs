//! Filesystem metadata surfaced by `ops::getattr` and friends.

/// Minimal POSIX-ish metadata, enough for the kernel bridge to build a
/// `fuser::FileAttr`. Shaped after the teacher's own `stat::Stat`, with
/// `dev`/`ino` dropped: this core has only one backing device, and the
/// bridge already knows the inode number it resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Stat {
    pub mode: u32,
    pub size: u64,
    pub nlink: u32,
}
