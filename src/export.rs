//! Write pages back out as source documents.
//!
//! The inverse of a sync: each page becomes `<out>/<title>.md` with its
//! metadata in front matter. Useful for seeding a content directory from an
//! existing bundle or from generated pages.

use crate::frontmatter::render_document;
use crate::naming::file_stem_for_title;
use crate::types::Page;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot serialize front matter for \"{title}\": {source}")]
    Yaml {
        title: String,
        source: serde_yaml::Error,
    },
    #[error("Pages \"{first}\" and \"{second}\" would both be written to {file}")]
    FileCollision {
        first: String,
        second: String,
        file: String,
    },
}

/// Write one document per page into `dir`, returning the written paths.
///
/// File names are derived from titles; two titles mapping to the same file
/// name are rejected before anything is written.
pub fn write_documents(dir: &Path, pages: &[Page], extension: &str) -> Result<Vec<PathBuf>, ExportError> {
    let mut planned: Vec<(PathBuf, String)> = Vec::with_capacity(pages.len());
    let mut claimed: HashMap<String, &str> = HashMap::with_capacity(pages.len());

    for page in pages {
        let file = format!("{}.{extension}", file_stem_for_title(&page.title));
        // Case-insensitive filesystems would merge `A.md` and `a.md`.
        if let Some(first) = claimed.insert(file.to_lowercase(), &page.title) {
            return Err(ExportError::FileCollision {
                first: first.to_string(),
                second: page.title.clone(),
                file,
            });
        }
        let text = render_document(page).map_err(|source| ExportError::Yaml {
            title: page.title.clone(),
            source,
        })?;
        planned.push((dir.join(file), text));
    }

    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(planned.len());
    for (path, text) in planned {
        std::fs::write(&path, text)?;
        written.push(path);
    }
    Ok(written)
}
