//! Page date parsing and resolution.
//!
//! A page's `date` has two meanings that share one field:
//!
//! - **Static**: the author wrote `date:` in the front matter. It is normalized
//!   to ISO-8601 at validation time and is never overwritten.
//! - **Dynamic**: no `date:` in the document. The page is stamped with the run's
//!   "now" whenever it is added or changed, and the stamp is carried forward from
//!   the previous bundle on runs where the page is untouched.
//!
//! Resolution happens in two passes, in this order:
//!
//! 1. [`stamp_if_missing`] at diff time, only for Added and Changed pages.
//! 2. [`carry_forward`] at aggregation time, for every page still without a date.
//!
//! ## Accepted input formats
//!
//! ```text
//! 2022-02-22T10:30:00Z            RFC 3339 (any offset)
//! Tue, 22 Feb 2022 10:30:00 +0000 RFC 2822
//! 2022-02-22                      date only
//! 2022-02-22T10:30[:00[.123]]     no offset
//! 2022-02-22 10:30[:00]
//! 2/22/2022  [10:30[:00]]         month/day/year
//! 2022/2/22
//! February 22, 2022 | Feb 22, 2022 | 22 February 2022
//! ```
//!
//! Inputs without an offset are taken as UTC, so `2/22/2022` always becomes
//! `2022-02-22T00:00:00.000Z` regardless of the machine's timezone.

use crate::diff::find_counterpart;
use crate::types::Page;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse a calendar date in any of the accepted formats.
///
/// Returns `None` for anything that is not a real date (including
/// out-of-range values such as `2/30/2022`).
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(naive.and_utc());
        }
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(input, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}

/// Format a timestamp the way bundles store it: `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn to_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse and re-format a date string, or `None` if it is not a date.
pub fn normalize(input: &str) -> Option<String> {
    parse_date(input).map(to_iso)
}

/// Diff-time rule for an Added or Changed page.
///
/// An explicit date is authoritative and kept as-is (validation has already
/// normalized it); otherwise the page is stamped with `now`.
pub fn stamp_if_missing(page: &mut Page, now: DateTime<Utc>) {
    if page.date.is_none() {
        page.date = Some(to_iso(now));
    }
}

/// Aggregation-time rule: copy the previous run's date onto pages that still
/// have none.
pub fn carry_forward(new_pages: &mut [Page], old_pages: &[Page]) {
    for page in new_pages.iter_mut().filter(|p| p.date.is_none()) {
        if let Some(old) = find_counterpart(page, old_pages) {
            page.date = old.date.clone();
        }
    }
}
