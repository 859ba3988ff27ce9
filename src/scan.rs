//! Document discovery and loading for one content directory.
//!
//! Only the directory itself is scanned; subdirectories are separate bundles
//! and must be configured on their own.
//!
//! ```text
//! views/faq/
//! ├── .draft.md        # hidden, skipped
//! ├── billing.md       # document
//! ├── intro.MD         # document (extension match ignores case)
//! ├── faq.json         # the bundle, not a document
//! └── archive/         # subdirectory, skipped
//! ```
//!
//! Listing distinguishes two misconfigurations: a directory with no files at
//! all ([`SyncError::EmptyDirectory`]) and one with files but none carrying the
//! document extension ([`SyncError::NoMarkdownFiles`]).
//!
//! Documents are read and validated in parallel, but errors are reported in
//! file order so a run with several bad documents always names the same one.

use crate::frontmatter;
use crate::naming::document_name;
use crate::sync::SyncError;
use crate::types::Page;
use crate::validate::{self, ValidationRules};
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Sorted paths of every document in `dir` with the given extension.
pub fn list_documents(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SyncError> {
    let mut any_file = false;
    let mut documents = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| SyncError::Read {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: io::Error::from(e),
        })?;
        if !entry.file_type().is_file() || is_hidden(entry.path()) {
            continue;
        }
        any_file = true;
        if has_extension(entry.path(), extension) {
            documents.push(entry.into_path());
        }
    }

    if !any_file {
        return Err(SyncError::EmptyDirectory(dir.to_path_buf()));
    }
    if documents.is_empty() {
        return Err(SyncError::NoMarkdownFiles {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    documents.sort();
    Ok(documents)
}

/// Read, split and validate every document, preserving input order.
pub fn load_documents(files: &[PathBuf], rules: &ValidationRules) -> Result<Vec<Page>, SyncError> {
    let results: Vec<Result<Page, SyncError>> = files
        .par_iter()
        .map(|path| load_document(path, rules))
        .collect();
    results.into_iter().collect()
}

/// Read one document into a validated page.
pub fn load_document(path: &Path, rules: &ValidationRules) -> Result<Page, SyncError> {
    let text = std::fs::read_to_string(path).map_err(|source| SyncError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    frontmatter::parse(&text)
        .and_then(|fm| validate::validate(fm, &document_name(path), rules))
        .map_err(|source| SyncError::Document {
            file: path.to_path_buf(),
            source,
        })
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{document, write_file};
    use crate::validate::DocumentError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    // =========================================================================
    // Listing
    // =========================================================================

    #[test]
    fn lists_documents_sorted() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "b.md", "x");
        write_file(tmp.path(), "a.md", "x");
        write_file(tmp.path(), "c.MD", "x");

        let docs = list_documents(tmp.path(), "md").unwrap();
        assert_eq!(names(&docs), vec!["a.md", "b.md", "c.MD"]);
    }

    #[test]
    fn skips_hidden_other_extensions_and_subdirectories() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "page.md", "x");
        write_file(tmp.path(), ".hidden.md", "x");
        write_file(tmp.path(), "notes.txt", "x");
        write_file(tmp.path(), "sub/nested.md", "x");

        let docs = list_documents(tmp.path(), "md").unwrap();
        assert_eq!(names(&docs), vec!["page.md"]);
    }

    #[test]
    fn custom_extension() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "page.md", "x");
        write_file(tmp.path(), "page.markdown", "x");
        let docs = list_documents(tmp.path(), "markdown").unwrap();
        assert_eq!(names(&docs), vec!["page.markdown"]);
    }

    #[test]
    fn empty_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        let err = list_documents(tmp.path(), "md").unwrap_err();
        assert!(matches!(err, SyncError::EmptyDirectory(_)));
    }

    #[test]
    fn directory_without_documents() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "readme.txt", "x");
        let err = list_documents(tmp.path(), "md").unwrap_err();
        assert!(matches!(err, SyncError::NoMarkdownFiles { .. }));
        assert!(err.to_string().contains("No .md files found"));
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn loads_pages_in_file_order() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "b.md", &document("Second", "Ana", "two"));
        write_file(tmp.path(), "a.md", &document("First", "Ana", "one"));

        let files = list_documents(tmp.path(), "md").unwrap();
        let pages = load_documents(&files, &ValidationRules::default()).unwrap();

        let titles: Vec<_> = pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(pages[0].content, "one");
    }

    #[test]
    fn first_bad_document_in_order_is_reported() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.md", &document("ok", "Ana", "fine"));
        write_file(tmp.path(), "b.md", "---\nauthor: Ana\n---\nno title");
        write_file(tmp.path(), "c.md", "no front matter at all");

        let files = list_documents(tmp.path(), "md").unwrap();
        for _ in 0..5 {
            let err = load_documents(&files, &ValidationRules::default()).unwrap_err();
            match err {
                SyncError::Document { file, source } => {
                    assert!(file.ends_with("b.md"));
                    assert!(matches!(source, DocumentError::MissingTitle));
                }
                other => panic!("expected document error, got {other:?}"),
            }
        }
    }

    #[test]
    fn document_error_names_short_path() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("faq");
        write_file(&dir, "intro.md", "---\ntitle: t\n---\nbody");

        let err = load_document(&dir.join("intro.md"), &ValidationRules::default()).unwrap_err();
        assert_eq!(err.to_string(), "Missing author @ \"faq/intro.md\"");
    }

    #[test]
    fn title_must_match_file_name_when_required() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "intro.md", &document("Intro", "Ana", "x"));
        let rules = ValidationRules {
            title_matches_filename: true,
        };
        let err = load_document(&tmp.path().join("intro.md"), &rules).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Document {
                source: DocumentError::TitleMismatch { .. },
                ..
            }
        ));
    }
}
