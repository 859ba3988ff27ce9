//! Front-matter splitting and document serialization.
//!
//! A source document looks like this:
//!
//! ```text
//! ---
//! title: Getting started
//! author: Ana
//! date: 2/22/2022          # optional, static "created" date
//! id: 3                    # optional explicit identity
//! tag: intro               # anything else is carried through verbatim
//! ---
//!
//! Free-form **Markdown** body.
//! ```
//!
//! [`parse`] only splits and decodes; the rules about which keys are required
//! live in [`crate::validate`]. [`render_document`] goes the other way and is
//! lossless for everything [`parse`] + validation keep.

use crate::types::{Page, PageId};
use crate::validate::DocumentError;
use serde_yaml::{Mapping, Value};

const FENCE: &str = "---";
const CLOSING_ALT: &str = "...";

/// A document split into its decoded metadata block and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    /// Keys in document order.
    pub attributes: Mapping,
    /// Body with leading blank lines and trailing whitespace removed.
    pub body: String,
}

/// Split a raw document into attributes and body.
///
/// The document must open with a `---` line and the block ends at the next
/// `---` (or `...`) line. Anything else is [`DocumentError::MissingFrontMatter`];
/// a block that is not a YAML mapping is [`DocumentError::MalformedFrontMatter`].
pub fn parse(text: &str) -> Result<FrontMatter, DocumentError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let first = lines.next().ok_or(DocumentError::MissingFrontMatter)?;
    if first.trim_end() != FENCE {
        return Err(DocumentError::MissingFrontMatter);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        let marker = line.trim_end();
        if marker == FENCE || marker == CLOSING_ALT {
            let attributes = decode_attributes(&text[yaml_start..offset])?;
            let body = clean_body(&text[offset + line.len()..]);
            return Ok(FrontMatter { attributes, body });
        }
        offset += line.len();
    }

    Err(DocumentError::MissingFrontMatter)
}

fn decode_attributes(yaml: &str) -> Result<Mapping, DocumentError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(DocumentError::MalformedFrontMatter(
            "expected `key: value` pairs".to_string(),
        )),
        Err(e) => Err(DocumentError::MalformedFrontMatter(e.to_string())),
    }
}

fn clean_body(body: &str) -> String {
    let mut rest = body;
    while let Some(pos) = rest.find('\n') {
        if !rest[..pos].trim().is_empty() {
            break;
        }
        rest = &rest[pos + 1..];
    }
    rest.trim_end().to_string()
}

/// Serialize a page back into a source document.
///
/// Known fields come first (`title`, `author`, `date`, `id`), then extra fields
/// in their stored order. The derived `uri` is never written.
pub fn render_document(page: &Page) -> Result<String, serde_yaml::Error> {
    let mut mapping = Mapping::new();
    mapping.insert(key("title"), Value::String(page.title.clone()));
    mapping.insert(key("author"), Value::String(page.author.clone()));
    if let Some(date) = &page.date {
        mapping.insert(key("date"), Value::String(date.clone()));
    }
    if let Some(id) = &page.id {
        let value = match id {
            PageId::Number(n) => Value::Number((*n).into()),
            PageId::Text(s) => Value::String(s.clone()),
        };
        mapping.insert(key("id"), value);
    }
    for (name, value) in &page.extra {
        mapping.insert(key(name), serde_yaml::to_value(value)?);
    }

    let yaml = serde_yaml::to_string(&mapping)?;
    Ok(format!("{FENCE}\n{yaml}{FENCE}\n\n{}\n", page.content))
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}
