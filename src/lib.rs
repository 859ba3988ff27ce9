//! # mdbundle
//!
//! Bundles directories of Markdown documents with YAML front matter into JSON
//! page data. Each directory gets one bundle stored next to its documents, so a
//! web front end can load ready-made pages without parsing Markdown at request
//! time.
//!
//! # Architecture: Load, Then Reconcile
//!
//! ```text
//! views/faq/*.md ──► scan ──► frontmatter ──► validate ──► Vec<Page> (new)
//!                                                             │
//! views/faq/faq.json ──► store::load_bundle ──► Vec<Page> (old)
//!                                                             │
//!                      [render] ──► diff ──► dates ──► naming ──► store::save_bundle
//!                                                                  (only if changed)
//! ```
//!
//! Every configured directory is loaded and validated before any bundle is
//! written, so a broken document stops the run without leaving half the
//! bundles updated.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sync`] | Orchestrator: two-phase run over all directories, events, report |
//! | [`scan`] | Lists a directory's documents and loads them in parallel |
//! | [`frontmatter`] | Splits a document into YAML attributes and body; writes documents back |
//! | [`validate`] | Ordered document rules, producing a [`types::Page`] |
//! | [`diff`] | Identity matching and Added/Changed/Deleted classification |
//! | [`dates`] | Date parsing, normalization, stamping and carry-forward |
//! | [`naming`] | URI slugs, document names, short display paths |
//! | [`render`] | Markdown → HTML for `html` mode |
//! | [`store`] | Bundle path, load and save |
//! | [`export`] | Pages → Markdown documents |
//! | [`config`] | `mdbundle.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Shared types (`Page`, `PageId`, `RenderMode`) |
//!
//! # Design Decisions
//!
//! ## Identity: id Before Title
//!
//! Pages are matched across runs by their explicit `id` when they have one,
//! otherwise by title. Renaming a page with an id is a change; renaming one
//! without is a delete plus an add.
//!
//! ## Two Kinds of Date
//!
//! A `date:` in front matter is the author's and is never touched. Without one,
//! the page's date is the time it was last added or changed, carried forward
//! from the previous bundle while the page stays the same. See [`dates`].
//!
//! ## Write Only on Change
//!
//! A run that finds nothing to add, change or delete leaves every bundle file
//! untouched (same bytes, same mtime), so file watchers and CI caches stay quiet.
//!
//! ## Render Before Diff
//!
//! In `html` mode content is rendered before diffing, so the comparison is
//! between what the bundle actually stores and repeated runs stay no-ops.

pub mod config;
pub mod dates;
pub mod diff;
pub mod export;
pub mod frontmatter;
pub mod naming;
pub mod output;
pub mod render;
pub mod scan;
pub mod store;
pub mod sync;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
