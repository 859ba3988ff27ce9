//! Shared test utilities for the mdbundle test suite.
//!
//! Builders for source documents, filesystem setup, and lookups over bundles.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let faq = tmp.path().join("views/faq");
//! Synchronizer::new(vec![SyncSource::Directory(faq.clone())], SyncOptions::default())
//!     .run()
//!     .unwrap();
//!
//! let page = find_page(&read_bundle(&faq), "Getting started");
//! assert_eq!(page.uri.as_deref(), Some("getting-started"));
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::store;
use crate::types::Page;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
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

/// Write `content` to `dir/relative`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

// =========================================================================
// Document builders
// =========================================================================

/// A minimal valid source document.
pub fn document(title: &str, author: &str, body: &str) -> String {
    format!("---\ntitle: {title}\nauthor: {author}\n---\n\n{body}\n")
}

// =========================================================================
// Bundle lookups
// =========================================================================

/// Load the bundle belonging to `dir`.
pub fn read_bundle(dir: &Path) -> Vec<Page> {
    store::load_bundle(&store::bundle_path(dir)).unwrap()
}

/// Find a page by title. Panics with the available titles if not found.
pub fn find_page<'a>(pages: &'a [Page], title: &str) -> &'a Page {
    pages.iter().find(|p| p.title == title).unwrap_or_else(|| {
        let available: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
        panic!("page '{title}' not found. Available: {available:?}")
    })
}

/// All titles in bundle order.
pub fn titles(pages: &[Page]) -> Vec<&str> {
    pages.iter().map(|p| p.title.as_str()).collect()
}
