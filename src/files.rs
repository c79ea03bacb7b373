//! Filesystem helpers shared by the stages.
//!
//! Directory creation is always create-if-absent and happens before the
//! first write into a directory.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Write `contents` to `path`, creating parent directories first.
pub fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// Move a file or directory. An existing destination is replaced.
pub fn move_path(src: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    if dest.is_dir() {
        fs::remove_dir_all(dest)?;
    }
    fs::rename(src, dest)
}

/// Copy a file or directory tree byte-for-byte, overwriting existing files.
pub fn copy_path(src: &Path, dest: &Path) -> io::Result<()> {
    if src.is_file() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest)?;
        return Ok(());
    }
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Remove `dir` if it exists and is empty. Returns whether it was removed.
pub fn remove_if_empty(dir: &Path) -> io::Result<bool> {
    if !dir.is_dir() || fs::read_dir(dir)?.next().is_some() {
        return Ok(false);
    }
    fs::remove_dir(dir)?;
    Ok(true)
}

/// SHA-256 of a byte slice, as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of a file's contents, as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    Ok(hash_bytes(&fs::read(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_file_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a/b/c.md");
        write_file(&path, "hello").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
    }

    #[test]
    fn copy_path_copies_tree() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("static");
        write_file(&src.join("css/site.css"), "body{}").unwrap();
        write_file(&src.join("logo.svg"), "<svg/>").unwrap();

        let dest = tmp.path().join("out/static");
        copy_path(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("css/site.css")).unwrap(), "body{}");
        assert_eq!(fs::read_to_string(dest.join("logo.svg")).unwrap(), "<svg/>");
        assert!(src.join("logo.svg").exists());
    }

    #[test]
    fn move_path_replaces_existing_directory() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("js");
        write_file(&src.join("app.js"), "new").unwrap();
        let dest = tmp.path().join("assets/js");
        write_file(&dest.join("stale.js"), "old").unwrap();

        move_path(&src, &dest).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dest.join("app.js")).unwrap(), "new");
        assert!(!dest.join("stale.js").exists());
    }

    #[test]
    fn remove_if_empty_keeps_non_empty() {
        let tmp = TempDir::new().unwrap();
        let full = tmp.path().join("full");
        write_file(&full.join("x.html"), "").unwrap();
        let empty = tmp.path().join("empty");
        fs::create_dir(&empty).unwrap();

        assert!(!remove_if_empty(&full).unwrap());
        assert!(remove_if_empty(&empty).unwrap());
        assert!(!empty.exists());
        assert!(!remove_if_empty(&tmp.path().join("missing")).unwrap());
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = hash_bytes(b"abc");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_bytes(b"abc"));
        assert_ne!(h, hash_bytes(b"abd"));
    }
}
