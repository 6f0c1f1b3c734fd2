//! Working tree mirroring
//!
//! Replaces the non-metadata content of one working tree with another's.
//! Entries named `.git` are never deleted from the destination and never
//! copied from the origin.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::{Error, Result};

/// Name of the version-control metadata entry
pub const METADATA_DIR: &str = ".git";

/// File synchronizer used by the branch pipeline
pub trait TreeSync: Send + Sync {
    /// Delete every entry under `dest` except version-control metadata
    fn clean_stale(&self, dest: &Path) -> Result<()>;

    /// Copy every file under `origin` into `dest`, skipping metadata
    fn mirror(&self, origin: &Path, dest: &Path) -> Result<()>;
}

/// Filesystem implementation of [`TreeSync`]
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeTreeSync;

impl NativeTreeSync {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(action: &str, path: &Path, e: io::Error) -> Error {
    Error::Mirror(format!("Failed to {} {}: {}", action, path.display(), e))
}

fn is_metadata(name: &std::ffi::OsStr) -> bool {
    name == METADATA_DIR
}

/// Remove whatever sits at `path`, without following symlinks
fn remove_entry(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_error("inspect", path, e)),
    };

    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(|e| io_error("remove", path, e))
    } else {
        fs::remove_file(path).map_err(|e| io_error("remove", path, e))
    }
}

#[cfg(unix)]
fn copy_symlink(source: &Path, target: &Path) -> Result<()> {
    let link = fs::read_link(source).map_err(|e| io_error("read link", source, e))?;
    remove_entry(target)?;
    std::os::unix::fs::symlink(&link, target).map_err(|e| io_error("create link", target, e))
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, target: &Path) -> Result<()> {
    // no portable symlinks; copy what the link points at
    remove_entry(target)?;
    fs::copy(source, target)
        .map(|_| ())
        .map_err(|e| io_error("copy", source, e))
}

impl TreeSync for NativeTreeSync {
    fn clean_stale(&self, dest: &Path) -> Result<()> {
        if !dest.exists() {
            return Ok(());
        }

        let entries = fs::read_dir(dest).map_err(|e| io_error("read", dest, e))?;
        let mut removed = 0usize;

        for entry in entries {
            let entry = entry.map_err(|e| io_error("read", dest, e))?;
            if is_metadata(&entry.file_name()) {
                continue;
            }
            remove_entry(&entry.path())?;
            removed += 1;
        }

        tracing::debug!(path = %dest.display(), removed, "Cleared working tree");
        Ok(())
    }

    fn mirror(&self, origin: &Path, dest: &Path) -> Result<()> {
        if !origin.is_dir() {
            return Err(Error::Mirror(format!(
                "Origin tree does not exist: {}",
                origin.display()
            )));
        }

        fs::create_dir_all(dest).map_err(|e| io_error("create", dest, e))?;

        let mut copied = 0usize;
        let walker = WalkDir::new(origin)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_metadata(entry.file_name()));

        for entry in walker {
            let entry = entry.map_err(|e| Error::Mirror(format!("Failed to walk origin tree: {}", e)))?;
            let relative = entry
                .path()
                .strip_prefix(origin)
                .map_err(|e| Error::Mirror(format!("Unexpected path outside origin: {}", e)))?;
            let target = dest.join(relative);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if target.is_file() || target.is_symlink() {
                    remove_entry(&target)?;
                }
                fs::create_dir_all(&target).map_err(|e| io_error("create", &target, e))?;
            } else if file_type.is_symlink() {
                copy_symlink(entry.path(), &target)?;
                copied += 1;
            } else {
                if target.is_dir() || target.is_symlink() {
                    remove_entry(&target)?;
                }
                fs::copy(entry.path(), &target).map_err(|e| io_error("copy", entry.path(), e))?;
                copied += 1;
            }
        }

        tracing::debug!(
            origin = %origin.display(),
            dest = %dest.display(),
            copied,
            "Mirrored working tree"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn read(root: &Path, relative: &str) -> String {
        fs::read_to_string(root.join(relative)).unwrap()
    }

    /// Relative paths of every non-metadata file under `root`
    fn files(root: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| !is_metadata(e.file_name()))
            .filter_map(|e| e.ok())
            .filter(|e| !e.file_type().is_dir())
            .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
            .collect();
        found.sort();
        found
    }

    fn sync(origin: &Path, dest: &Path) {
        let tree = NativeTreeSync::new();
        tree.clean_stale(dest).unwrap();
        tree.mirror(origin, dest).unwrap();
    }

    #[test]
    fn test_mirror_is_complete_and_removes_stale_files() {
        let origin = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        write(origin.path(), "README.md", "# widget\n");
        write(origin.path(), "src/lib.rs", "pub fn widget() {}\n");
        write(origin.path(), "src/nested/deep.txt", "deep\n");

        write(dest.path(), "README.md", "old readme\n");
        write(dest.path(), "obsolete.txt", "gone soon\n");
        write(dest.path(), "old_dir/file.txt", "gone soon\n");

        sync(origin.path(), dest.path());

        assert_eq!(files(origin.path()), files(dest.path()));
        assert_eq!(read(dest.path(), "README.md"), "# widget\n");
        assert_eq!(read(dest.path(), "src/nested/deep.txt"), "deep\n");
        assert!(!dest.path().join("obsolete.txt").exists());
        assert!(!dest.path().join("old_dir").exists());
    }

    #[test]
    fn test_destination_metadata_is_preserved() {
        let origin = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        write(origin.path(), "file.txt", "new\n");
        write(dest.path(), ".git/HEAD", "ref: refs/heads/main\n");
        write(dest.path(), ".git/objects/ab/cdef", "object\n");
        write(dest.path(), "file.txt", "old\n");

        sync(origin.path(), dest.path());

        assert_eq!(read(dest.path(), ".git/HEAD"), "ref: refs/heads/main\n");
        assert_eq!(read(dest.path(), ".git/objects/ab/cdef"), "object\n");
        assert_eq!(read(dest.path(), "file.txt"), "new\n");
    }

    #[test]
    fn test_origin_metadata_is_not_copied() {
        let origin = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        write(origin.path(), ".git/HEAD", "ref: refs/heads/feature-x\n");
        write(origin.path(), "vendor/lib/.git", "gitdir: ../../.git/modules/lib\n");
        write(origin.path(), "vendor/lib/code.c", "int x;\n");
        write(dest.path(), ".git/HEAD", "ref: refs/heads/main\n");

        sync(origin.path(), dest.path());

        assert_eq!(read(dest.path(), ".git/HEAD"), "ref: refs/heads/main\n");
        assert!(!dest.path().join("vendor/lib/.git").exists());
        assert_eq!(read(dest.path(), "vendor/lib/code.c"), "int x;\n");
    }

    #[test]
    fn test_clean_stale_on_missing_dest_is_noop() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        assert!(NativeTreeSync::new().clean_stale(&missing).is_ok());
        assert!(!missing.exists());
    }

    #[test]
    fn test_mirror_creates_missing_dest() {
        let origin = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("fresh");
        write(origin.path(), "a.txt", "a\n");

        NativeTreeSync::new().mirror(origin.path(), &dest).unwrap();
        assert_eq!(read(&dest, "a.txt"), "a\n");
    }

    #[test]
    fn test_mirror_missing_origin_fails() {
        let dir = TempDir::new().unwrap();
        let err = NativeTreeSync::new()
            .mirror(&dir.path().join("nope"), dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::Mirror(_)));
    }

    #[test]
    fn test_mirror_replaces_file_with_directory() {
        let origin = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(origin.path(), "docs/index.md", "index\n");
        write(dest.path(), "docs", "was a file\n");

        NativeTreeSync::new().mirror(origin.path(), dest.path()).unwrap();
        assert_eq!(read(dest.path(), "docs/index.md"), "index\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_recreated() {
        let origin = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(origin.path(), "real.txt", "real\n");
        std::os::unix::fs::symlink("real.txt", origin.path().join("alias.txt")).unwrap();

        sync(origin.path(), dest.path());

        let link = fs::read_link(dest.path().join("alias.txt")).unwrap();
        assert_eq!(link, PathBuf::from("real.txt"));
        assert_eq!(read(dest.path(), "alias.txt"), "real\n");
    }
}
