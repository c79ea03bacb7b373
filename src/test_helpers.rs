//! Shared test utilities for the site-migrate test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let report = pages::migrate(tmp.path(), &config, &schema).unwrap();
//!
//! let header = read_header(&tmp.path().join("src/pages/about.html"));
//! assert_eq!(header.get_str("section"), Some("about"));
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::front_matter::FrontMatter;

/// Copy `fixtures/export/` to a temp directory and return it.
///
/// The page stage moves and deletes files in the export, so every test gets
/// its own copy.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/export");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Parse the header of an emitted file. Panics with the path on failure.
pub fn read_header(path: &Path) -> FrontMatter {
    let doc = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    FrontMatter::parse(&doc)
        .unwrap_or_else(|e| panic!("bad header in {}: {e}", path.display()))
        .0
}
