//! Path resolution.
//!
//! A path is a slash-separated string: `/` alone names the root;
//! otherwise it is a non-empty sequence of components separated by
//! `/`, with repeated and trailing slashes ignored. `resolve` walks a
//! directory lookup from the root inode for each component;
//! `resolve_parent` stops one component early, for callers (`create`,
//! `mkdir`) that need the parent directory and the new entry's name
//! rather than an existing inode.
//!
//! Grounded on the component-splitting shape of rv6's
//! `fs/path.rs::Path::skipelem`, adapted from a zero-copy byte-slice
//! walk (appropriate for a `#![no_std]` kernel with no allocator) to
//! plain `str::split` (appropriate here, since paths arrive as owned
//! `String`s from the FUSE bridge anyway).

use crate::error::{FsError, FsResult};
use crate::fs::directory;
use crate::fs::Inner;
use crate::param::ROOT_INODE_NUM;

/// Splits `path` into its non-empty components, ignoring leading,
/// trailing, and repeated slashes.
fn components(path: &str) -> Vec<&str> {
    path.split('/').filter(|c| !c.is_empty()).collect()
}

/// Resolves `path` to an inode number.
///
/// Inode 0 is simultaneously "the root" and the allocator's "not
/// found" sentinel (invariant I7); this function breaks that
/// ambiguity for its caller by returning a proper `Result` instead of
/// overloading inode 0 on success.
pub fn resolve(inner: &mut Inner, path: &str) -> FsResult<u8> {
    if path == "/" {
        return Ok(ROOT_INODE_NUM);
    }
    let mut current = ROOT_INODE_NUM;
    for component in components(path) {
        match directory::lookup(inner, current, component)? {
            Some(next) => current = next,
            None => return Err(FsError::NotFound),
        }
    }
    Ok(current)
}

/// Resolves the parent directory of `path` and returns `(parent_inode,
/// last_component)`. A single-component path's parent is the root.
pub fn resolve_parent<'p>(inner: &mut Inner, path: &'p str) -> FsResult<(u8, &'p str)> {
    let comps = components(path);
    let (last, init) = comps.split_last().ok_or(FsError::NotFound)?;
    let mut current = ROOT_INODE_NUM;
    for component in init {
        match directory::lookup(inner, current, component)? {
            Some(next) => current = next,
            None => return Err(FsError::NotFound),
        }
    }
    Ok((current, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::inode::{MODE_DIR, MODE_REG};
    use crate::fs::{ops, FileSystemCore};

    #[test]
    fn root_resolves_to_inode_zero() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        assert_eq!(resolve(&mut inner, "/").unwrap(), 0);
    }

    #[test]
    fn resolve_walks_nested_directories() {
        let core = FileSystemCore::format_in_memory();
        ops::mkdir(&core, "/d", MODE_DIR | 0o755).unwrap();
        ops::create(&core, "/d/x", MODE_REG | 0o644).unwrap();

        let mut inner = core.lock();
        let d = resolve(&mut inner, "/d").unwrap();
        let x = resolve(&mut inner, "/d/x").unwrap();
        let (parent, name) = resolve_parent(&mut inner, "/d/x").unwrap();
        assert_eq!(parent, d);
        assert_eq!(name, "x");
        assert_ne!(x, d);
    }

    #[test]
    fn resolve_missing_component_is_not_found() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        assert!(matches!(resolve(&mut inner, "/nope"), Err(FsError::NotFound)));
    }

    #[test]
    fn resolve_parent_of_top_level_path_is_root() {
        let core = FileSystemCore::format_in_memory();
        let mut inner = core.lock();
        let (parent, name) = resolve_parent(&mut inner, "/a.txt").unwrap();
        assert_eq!(parent, 0);
        assert_eq!(name, "a.txt");
    }
}
