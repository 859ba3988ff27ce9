//! Page validation: decoded front matter + body → [`Page`].
//!
//! Rules are checked in a fixed order and the first failure wins:
//!
//! 1. `title` present and non-empty ([`DocumentError::MissingTitle`])
//! 2. `title` equals the document's file name, when
//!    [`ValidationRules::title_matches_filename`] is on ([`DocumentError::TitleMismatch`])
//! 3. `author` present and non-empty ([`DocumentError::MissingAuthor`])
//! 4. `date`, if present, is a calendar date ([`DocumentError::InvalidDate`])
//! 5. body is not blank ([`DocumentError::EmptyContent`])
//!
//! After the ordered rules, `id` and the extra fields are decoded. Extra values
//! must be scalars; `content` and `uri` are reserved because the pipeline owns them.
//!
//! Errors here do not name the file; the scanner wraps them with the
//! document's short path.

use crate::dates;
use crate::frontmatter::FrontMatter;
use crate::types::{Page, PageId};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Invalid or missing front matter")]
    MissingFrontMatter,
    #[error("Malformed front matter: {0}")]
    MalformedFrontMatter(String),
    #[error("File is missing a title")]
    MissingTitle,
    #[error("Title \"{title}\" does not match file name \"{expected}\"")]
    TitleMismatch { title: String, expected: String },
    #[error("Missing author")]
    MissingAuthor,
    #[error("Invalid date for page: \"{0}\"")]
    InvalidDate(String),
    #[error("Empty file content")]
    EmptyContent,
    #[error("Unsupported value for front matter field `{0}` (expected a string, number or boolean)")]
    UnsupportedField(String),
    #[error("Front matter field `{0}` is reserved")]
    ReservedField(String),
}

/// Optional rules layered on top of the required checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRules {
    /// Require `title` to equal the document's file stem.
    pub title_matches_filename: bool,
}

const KNOWN_FIELDS: &[&str] = &["title", "author", "date", "id"];
const RESERVED_FIELDS: &[&str] = &["content", "uri"];

/// Validate one decoded document.
///
/// `name` is the document's file-derived name, used only by the
/// title-matches-filename rule.
pub fn validate(
    front_matter: FrontMatter,
    name: &str,
    rules: &ValidationRules,
) -> Result<Page, DocumentError> {
    let FrontMatter { attributes, body } = front_matter;

    let title = text_field(&attributes, "title").ok_or(DocumentError::MissingTitle)?;
    if rules.title_matches_filename && title != name {
        return Err(DocumentError::TitleMismatch {
            title,
            expected: name.to_string(),
        });
    }

    let author = text_field(&attributes, "author").ok_or(DocumentError::MissingAuthor)?;

    let date = decode_date(attributes.get("date"))?;

    if body.trim().is_empty() {
        return Err(DocumentError::EmptyContent);
    }

    let id = decode_id(attributes.get("id"))?;
    let extra = decode_extra(&attributes)?;

    Ok(Page {
        title,
        author,
        date,
        id,
        extra,
        content: body,
        uri: None,
    })
}

/// Check a page that was built in code rather than parsed from a document.
///
/// Applies the same required rules as [`validate`] (title, author, date,
/// content) and normalizes an explicit date, so pre-built pages reach the
/// diff in the same shape as parsed ones.
pub fn check_page(mut page: Page) -> Result<Page, DocumentError> {
    if page.title.trim().is_empty() {
        return Err(DocumentError::MissingTitle);
    }
    if page.author.trim().is_empty() {
        return Err(DocumentError::MissingAuthor);
    }
    page.date = match page.date.take() {
        Some(raw) if raw.trim().is_empty() => None,
        Some(raw) => Some(dates::normalize(&raw).ok_or(DocumentError::InvalidDate(raw))?),
        None => None,
    };
    if page.content.trim().is_empty() {
        return Err(DocumentError::EmptyContent);
    }
    Ok(page)
}

/// `None` when absent, null or blank; any other non-date value is invalid.
fn decode_date(value: Option<&Value>) -> Result<Option<String>, DocumentError> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => match scalar_text(v) {
            Some(text) if text.trim().is_empty() => return Ok(None),
            Some(text) => text,
            None => return Err(DocumentError::InvalidDate(format!("{v:?}"))),
        },
    };
    match dates::normalize(&raw) {
        Some(iso) => Ok(Some(iso)),
        None => Err(DocumentError::InvalidDate(raw)),
    }
}

/// Text of a scalar attribute; `None` when absent, null or blank.
fn text_field(attributes: &serde_yaml::Mapping, name: &str) -> Option<String> {
    attributes
        .get(name)
        .and_then(scalar_text)
        .filter(|s| !s.trim().is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn decode_id(value: Option<&Value>) -> Result<Option<PageId>, DocumentError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(PageId::Text(s.clone()))),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(|n| Some(PageId::Number(n)))
            .ok_or_else(|| DocumentError::UnsupportedField("id".to_string())),
        Some(_) => Err(DocumentError::UnsupportedField("id".to_string())),
    }
}

fn decode_extra(attributes: &serde_yaml::Mapping) -> Result<Map<String, JsonValue>, DocumentError> {
    let mut extra = Map::new();
    for (key, value) in attributes {
        let name = scalar_text(key)
            .ok_or_else(|| DocumentError::UnsupportedField(format!("{key:?}")))?;
        if KNOWN_FIELDS.contains(&name.as_str()) {
            continue;
        }
        if RESERVED_FIELDS.contains(&name.as_str()) {
            return Err(DocumentError::ReservedField(name));
        }
        if let Some(json) = json_scalar(value, &name)? {
            extra.insert(name, json);
        }
    }
    Ok(extra)
}

/// Convert a YAML scalar to JSON. Nulls are dropped; collections are rejected.
fn json_scalar(value: &Value, name: &str) -> Result<Option<JsonValue>, DocumentError> {
    let unsupported = || DocumentError::UnsupportedField(name.to_string());
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(JsonValue::Bool(*b))),
        Value::String(s) => Ok(Some(JsonValue::String(s.clone()))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(JsonValue::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Some(JsonValue::from(u)))
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(|n| Some(JsonValue::Number(n)))
                    .ok_or_else(unsupported)
            }
        }
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => Err(unsupported()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::parse;
    use pretty_assertions::assert_eq;

    fn check(doc: &str) -> Result<Page, DocumentError> {
        validate(parse(doc).unwrap(), "doc", &ValidationRules::default())
    }

    #[test]
    fn minimal_valid_document() {
        let page = check("---\ntitle: page 1\nauthor: Ana\n---\nHello").unwrap();
        assert_eq!(page, Page::new("page 1", "Ana", "Hello"));
    }

    #[test]
    fn static_date_is_normalized() {
        let page = check("---\ntitle: t\nauthor: a\ndate: 2/22/2022\n---\nx").unwrap();
        assert_eq!(page.date.as_deref(), Some("2022-02-22T00:00:00.000Z"));
    }

    #[test]
    fn missing_title() {
        let err = check("---\nauthor: a\n---\nx").unwrap_err();
        assert!(matches!(err, DocumentError::MissingTitle));
        assert!(err.to_string().contains("missing a title"));
    }

    #[test]
    fn blank_title_counts_as_missing() {
        assert!(matches!(
            check("---\ntitle: \"  \"\nauthor: a\n---\nx"),
            Err(DocumentError::MissingTitle)
        ));
        assert!(matches!(
            check("---\ntitle:\nauthor: a\n---\nx"),
            Err(DocumentError::MissingTitle)
        ));
    }

    #[test]
    fn missing_author() {
        let err = check("---\ntitle: t\n---\nx").unwrap_err();
        assert!(matches!(err, DocumentError::MissingAuthor));
        assert!(err.to_string().contains("Missing author"));
    }

    #[test]
    fn invalid_date() {
        let err = check("---\ntitle: t\nauthor: a\ndate: someday\n---\nx").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidDate(ref d) if d == "someday"));
        assert!(err.to_string().contains("Invalid date"));
    }

    #[test]
    fn collection_date_is_invalid() {
        for doc in [
            "---\ntitle: t\nauthor: a\ndate: [2022]\n---\nx",
            "---\ntitle: t\nauthor: a\ndate: {y: 2022}\n---\nx",
        ] {
            let err = check(doc).unwrap_err();
            assert!(matches!(err, DocumentError::InvalidDate(_)), "{doc}: {err}");
        }
    }

    #[test]
    fn null_or_blank_date_is_absent() {
        for doc in [
            "---\ntitle: t\nauthor: a\ndate:\n---\nx",
            "---\ntitle: t\nauthor: a\ndate: \"  \"\n---\nx",
        ] {
            assert_eq!(check(doc).unwrap().date, None, "{doc}");
        }
    }

    #[test]
    fn empty_content() {
        let err = check("---\ntitle: t\nauthor: a\n---\n   \n\n").unwrap_err();
        assert!(matches!(err, DocumentError::EmptyContent));
        assert!(err.to_string().contains("Empty file content"));
    }

    #[test]
    fn rules_are_checked_in_order() {
        // Everything is wrong: the title rule wins.
        let err = check("---\ndate: nope\n---\n").unwrap_err();
        assert!(matches!(err, DocumentError::MissingTitle));
        // Title fine, author and date wrong: author wins.
        let err = check("---\ntitle: t\ndate: nope\n---\n").unwrap_err();
        assert!(matches!(err, DocumentError::MissingAuthor));
        // Date wrong and body empty: date wins.
        let err = check("---\ntitle: t\nauthor: a\ndate: nope\n---\n").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidDate(_)));
    }

    #[test]
    fn title_must_match_file_name_when_required() {
        let rules = ValidationRules {
            title_matches_filename: true,
        };
        let doc = "---\ntitle: Intro\nauthor: a\n---\nx";

        let ok = validate(parse(doc).unwrap(), "Intro", &rules);
        assert!(ok.is_ok());

        let err = validate(parse(doc).unwrap(), "intro-page", &rules).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::TitleMismatch { ref title, ref expected }
                if title == "Intro" && expected == "intro-page"
        ));
    }

    #[test]
    fn title_mismatch_is_checked_before_author() {
        let rules = ValidationRules {
            title_matches_filename: true,
        };
        let err = validate(parse("---\ntitle: a\n---\nx").unwrap(), "b", &rules).unwrap_err();
        assert!(matches!(err, DocumentError::TitleMismatch { .. }));
    }

    #[test]
    fn numeric_title_and_author_are_text() {
        let page = check("---\ntitle: 2022\nauthor: 7\n---\nx").unwrap();
        assert_eq!(page.title, "2022");
        assert_eq!(page.author, "7");
    }

    #[test]
    fn ids_decode_as_number_or_text() {
        let n = check("---\ntitle: t\nauthor: a\nid: 2\n---\nx").unwrap();
        assert_eq!(n.id, Some(PageId::Number(2)));
        let s = check("---\ntitle: t\nauthor: a\nid: intro\n---\nx").unwrap();
        assert_eq!(s.id, Some(PageId::Text("intro".into())));
        let blank = check("---\ntitle: t\nauthor: a\nid: ''\n---\nx").unwrap();
        assert_eq!(blank.id, None);
    }

    #[test]
    fn list_id_is_unsupported() {
        let err = check("---\ntitle: t\nauthor: a\nid: [1, 2]\n---\nx").unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedField(ref f) if f == "id"));
    }

    #[test]
    fn extras_are_carried_in_document_order() {
        let page = check(
            "---\ntitle: t\nsubtitle: more\nauthor: a\nweight: 3\nratio: 0.5\ndraft: true\nempty:\n---\nx",
        )
        .unwrap();
        let keys: Vec<&str> = page.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["subtitle", "weight", "ratio", "draft"]);
        assert_eq!(page.extra["subtitle"], JsonValue::from("more"));
        assert_eq!(page.extra["weight"], JsonValue::from(3));
        assert_eq!(page.extra["ratio"], JsonValue::from(0.5));
        assert_eq!(page.extra["draft"], JsonValue::from(true));
    }

    #[test]
    fn nested_extra_is_rejected() {
        let err = check("---\ntitle: t\nauthor: a\ntags:\n  - a\n---\nx").unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedField(ref f) if f == "tags"));
    }

    #[test]
    fn pipeline_owned_fields_are_reserved() {
        let err = check("---\ntitle: t\nauthor: a\nuri: custom\n---\nx").unwrap_err();
        assert!(matches!(err, DocumentError::ReservedField(ref f) if f == "uri"));
        let err = check("---\ntitle: t\nauthor: a\ncontent: hi\n---\nx").unwrap_err();
        assert!(matches!(err, DocumentError::ReservedField(ref f) if f == "content"));
    }

    // =========================================================================
    // Pre-built pages
    // =========================================================================

    #[test]
    fn built_page_date_is_normalized() {
        let page = check_page(Page::new("A", "Ana", "x").with_date("2/22/2022")).unwrap();
        assert_eq!(page.date.as_deref(), Some("2022-02-22T00:00:00.000Z"));
    }

    #[test]
    fn built_page_follows_document_rules() {
        let err = check_page(Page::new("", "", "   ").with_date("not a date")).unwrap_err();
        assert!(matches!(err, DocumentError::MissingTitle));
        let err = check_page(Page::new("A", " ", "x")).unwrap_err();
        assert!(matches!(err, DocumentError::MissingAuthor));
        let err = check_page(Page::new("A", "Ana", "   ").with_date("not a date")).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidDate(ref d) if d == "not a date"));
        let err = check_page(Page::new("A", "Ana", "\n\n")).unwrap_err();
        assert!(matches!(err, DocumentError::EmptyContent));
    }
}
