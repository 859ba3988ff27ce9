//! Shared types used across all pipeline stages.
//!
//! [`Page`] is both the in-memory record produced by validation and the element
//! type of a persisted bundle, so it must round-trip through JSON unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A normalized document record.
///
/// Serialized key order is `title`, `author`, `date`, `id`, the extra
/// front-matter fields in document order, `content`, then `uri`. Absent
/// optional fields are omitted rather than written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub author: String,
    /// ISO-8601 timestamp. Either an author-supplied "created" date or the
    /// automatically maintained "last changed" stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Explicit identity key; wins over `title` when matching across runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PageId>,
    /// Every other front-matter key, carried through verbatim. Values are
    /// always scalars (string, number or boolean).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Document body: raw Markdown, or HTML in `html` mode.
    pub content: String,
    /// Slug derived from `title`. Never read from a document and never
    /// compared when diffing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Page {
    /// A page with only the required fields set.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            date: None,
            id: None,
            extra: Map::new(),
            content: content.into(),
            uri: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<PageId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The key this page is matched by across runs.
    pub fn identity(&self) -> Identity<'_> {
        match &self.id {
            Some(id) => Identity::Id(id),
            None => Identity::Title(&self.title),
        }
    }
}

/// Explicit page id from front matter: `id: 2` or `id: intro`.
///
/// Integers and strings never compare equal (`2` is not `"2"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageId {
    Number(i64),
    Text(String),
}

impl From<i64> for PageId {
    fn from(n: i64) -> Self {
        PageId::Number(n)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        PageId::Text(s.to_string())
    }
}

impl From<String> for PageId {
    fn from(s: String) -> Self {
        PageId::Text(s)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageId::Number(n) => write!(f, "{n}"),
            PageId::Text(s) => f.write_str(s),
        }
    }
}

/// Identity key of a page: its explicit id if present, otherwise its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity<'a> {
    Id(&'a PageId),
    Title(&'a str),
}

impl fmt::Display for Identity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Id(id) => write!(f, "id {id}"),
            Identity::Title(title) => write!(f, "title \"{title}\""),
        }
    }
}

/// Whether `content` in the persisted bundle is raw Markdown or rendered HTML.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Plain,
    Html,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Plain => f.write_str("plain"),
            RenderMode::Html => f.write_str("html"),
        }
    }
}
