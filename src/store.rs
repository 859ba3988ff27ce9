//! Bundle persistence.
//!
//! Each content directory owns one bundle, a JSON array of [`Page`] records
//! stored next to the documents and named after the directory:
//!
//! ```text
//! views/faq/
//! ├── intro.md
//! ├── billing.md
//! └── faq.json      ← bundle
//! ```
//!
//! A missing bundle means "first run" and loads as an empty list. A bundle that
//! exists but cannot be parsed is an error: silently treating it as empty would
//! re-stamp every dynamic date.

use crate::types::Page;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid bundle {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// `<dir>/<dir name>.json`.
pub fn bundle_path(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "bundle".to_string());
    dir.join(format!("{name}.json"))
}

/// Load a bundle, or an empty list if the file does not exist.
pub fn load_bundle(path: &Path) -> Result<Vec<Page>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a bundle as pretty-printed JSON, creating parent directories.
pub fn save_bundle(path: &Path, pages: &[Page]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(pages)?;
    json.push('\n');
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn bundle_is_named_after_directory() {
        assert_eq!(
            bundle_path(Path::new("/srv/views/faq")),
            PathBuf::from("/srv/views/faq/faq.json")
        );
    }

    #[test]
    fn missing_bundle_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let pages = load_bundle(&tmp.path().join("nope.json")).unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn empty_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("b.json");
        std::fs::write(&path, "\n").unwrap();
        assert!(load_bundle(&path).unwrap().is_empty());
    }

    #[test]
    fn save_and_load_preserve_pages() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/b.json");

        let mut page = Page::new("About", "Ana", "Hello")
            .with_date("2022-02-22T00:00:00.000Z")
            .with_id("about");
        page.extra.insert("order".into(), serde_json::Value::from(2));
        page.uri = Some("about".into());
        let pages = vec![page, Page::new("Second", "Bo", "x")];

        save_bundle(&path, &pages).unwrap();
        assert_eq!(load_bundle(&path).unwrap(), pages);
    }

    #[test]
    fn saved_bundle_is_pretty_json_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("b.json");
        save_bundle(&path, &[Page::new("a", "b", "c")]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"title\": \"a\""));
    }

    #[test]
    fn corrupt_bundle_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("b.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_bundle(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(err.to_string().contains("b.json"));
    }

    #[test]
    fn bundle_of_wrong_shape_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("b.json");
        std::fs::write(&path, r#"[{"title": "no author"}]"#).unwrap();
        assert!(matches!(
            load_bundle(&path),
            Err(StoreError::Parse { .. })
        ));
    }
}
