//! Page identity matching and change classification.
//!
//! Pages from the current documents ("new") are matched against the previous
//! bundle ("old") by [`Identity`]: the explicit `id` when a page has one,
//! otherwise the title. Each new page is then classified:
//!
//! | Old counterpart | Fields equal | Kind |
//! |-----------------|--------------|------|
//! | none            | -            | [`ChangeKind::Added`] |
//! | found           | no           | [`ChangeKind::Changed`] |
//! | found           | yes          | unchanged (counted, not listed) |
//!
//! and every old page without a new counterpart is [`ChangeKind::Deleted`].
//!
//! ## What counts as a change
//!
//! `title`, `author`, `id`, `content` and the whole extra-field map are
//! compared. `date` is compared only when the new page carries one: a page
//! without a static date inherits its previous stamp, so its absence is not a
//! change. `uri` is derived and never compared.
//!
//! Matching against the old bundle is first-match-wins. The new set is
//! expected to be unique (see [`find_duplicate`]); the orchestrator rejects
//! duplicates before diffing.

use crate::dates;
use crate::types::{Identity, Page};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// How a page differs between the previous bundle and the current documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Deleted,
}

impl ChangeKind {
    /// Three-letter tag used in log lines: `ADD`, `CHG`, `DEL`.
    pub fn tag(self) -> &'static str {
        match self {
            ChangeKind::Added => "ADD",
            ChangeKind::Changed => "CHG",
            ChangeKind::Deleted => "DEL",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One added, changed or deleted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageChange {
    pub title: String,
    pub kind: ChangeKind,
}

/// Result of diffing one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// Added and changed pages in new-set order, then deletions in old-set order.
    pub changes: Vec<PageChange>,
    pub unchanged: usize,
}

impl Diff {
    /// Any page added or changed.
    pub fn has_updates(&self) -> bool {
        self.changes
            .iter()
            .any(|c| matches!(c.kind, ChangeKind::Added | ChangeKind::Changed))
    }

    /// Any page deleted.
    pub fn has_deletions(&self) -> bool {
        self.changes.iter().any(|c| c.kind == ChangeKind::Deleted)
    }

    /// Whether the bundle needs to be rewritten.
    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

/// First page in `pages` with the same identity as `page`.
pub fn find_counterpart<'a>(page: &Page, pages: &'a [Page]) -> Option<&'a Page> {
    let identity = page.identity();
    pages.iter().find(|p| p.identity() == identity)
}

/// Whether `new` differs from its old counterpart in any compared field.
pub fn has_changed(new: &Page, old: &Page) -> bool {
    new.title != old.title
        || new.author != old.author
        || new.id != old.id
        || new.content != old.content
        || new.extra != old.extra
        || (new.date.is_some() && new.date != old.date)
}

/// Two pages in one set that share an identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    /// Display form of the shared key, e.g. `id 2` or `title "Intro"`.
    pub identity: String,
    pub first: usize,
    pub second: usize,
}

/// Find the first pair of pages sharing an identity key.
pub fn find_duplicate(pages: &[Page]) -> Option<Duplicate> {
    let mut seen: HashMap<Identity<'_>, usize> = HashMap::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        let identity = page.identity();
        if let Some(&first) = seen.get(&identity) {
            return Some(Duplicate {
                identity: identity.to_string(),
                first,
                second: index,
            });
        }
        seen.insert(identity, index);
    }
    None
}

/// Classify every page and apply the diff-time date rule.
///
/// Added and changed pages keep their explicit date or are stamped with
/// `now`; unchanged pages are left alone for [`dates::carry_forward`].
pub fn reconcile(new_pages: &mut [Page], old_pages: &[Page], now: DateTime<Utc>) -> Diff {
    let mut diff = Diff::default();

    for page in new_pages.iter_mut() {
        let kind = match find_counterpart(page, old_pages) {
            None => ChangeKind::Added,
            Some(old) if has_changed(page, old) => ChangeKind::Changed,
            Some(_) => {
                diff.unchanged += 1;
                continue;
            }
        };
        dates::stamp_if_missing(page, now);
        diff.changes.push(PageChange {
            title: page.title.clone(),
            kind,
        });
    }

    for old in old_pages {
        if find_counterpart(old, new_pages).is_none() {
            diff.changes.push(PageChange {
                title: old.title.clone(),
                kind: ChangeKind::Deleted,
            });
        }
    }

    diff
}
