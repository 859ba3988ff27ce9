//! Naming helpers: page slugs, document names and short display paths.
//!
//! ## Slugs
//!
//! Every page gets a `uri` derived from its title by [`slugify`]:
//! lowercase, alphanumeric runs kept, everything else collapsed into a single
//! `-`, with no leading or trailing dash.
//!
//! - `"Page With Spaced Title"` → `page-with-spaced-title`
//! - `"PageWithNoSpacedTitle"` → `pagewithnospacedtitle`
//! - `"  FAQ: What's new?  "` → `faq-what-s-new`
//!
//! Slugging is idempotent: `slugify(slugify(x)) == slugify(x)`.
//!
//! ## Short paths
//!
//! Messages name files and directories by their last two path components
//! (`views/faq`, `faq/intro.md`) so batch failures are locatable without
//! printing long absolute paths.

use crate::types::Page;
use std::path::{Component, Path};

/// Derive a strict lowercase slug from a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Set `uri` on every page from its title.
pub fn assign_uris(pages: &mut [Page]) {
    for page in pages {
        page.uri = Some(slugify(&page.title));
    }
}

/// The name a document is known by: its file stem (`intro.md` → `intro`).
pub fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Last two components of a path, joined with `/`.
pub fn short_path(path: &Path) -> String {
    let mut parts: Vec<String> = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .rev()
        .take(2)
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    parts.reverse();
    parts.join("/")
}

/// A filesystem-safe file stem for a page title: path separators and other
/// characters invalid on common filesystems become `-`.
pub fn file_stem_for_title(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "untitled".to_string()
    } else {
        stem
    }
}
