//! Directory synchronization: documents + previous bundle → new bundle.
//!
//! A [`Synchronizer`] is built from a list of [`SyncSource`]s and
//! [`SyncOptions`], then run. Construction does no I/O; everything happens in
//! [`Synchronizer::run`] in two phases:
//!
//! ```text
//! Phase 1 (load, all directories)       Phase 2 (reconcile, each directory)
//!
//!   sources empty? ── ConfigurationEmpty   [html] render content
//!   every directory exists? ─ NotFound     diff against old bundle
//!   list documents ── Empty / NoMarkdown     └─ stamp Added/Changed dates
//!   load every old bundle                  carry forward unchanged dates
//!   read + validate pages                  derive URIs
//!   reject duplicate identities            changed? ── save bundle
//! ```
//!
//! Because every directory is loaded before any is reconciled, a broken
//! document anywhere aborts the run before a single bundle is written. With
//! [`SyncOptions::continue_on_error`] load and save failures are isolated to
//! their directory instead and collected in [`SyncReport::failures`];
//! misconfiguration (empty list, missing or document-less directory) is always
//! fatal.
//!
//! ## Progress
//!
//! Progress is reported as [`SyncEvent`]s on an optional channel
//! ([`Synchronizer::with_events`]); the CLI formats them on a printer thread.
//! `quiet` suppresses events entirely. Library diagnostics go to `tracing`.
//!
//! ## Time
//!
//! "Now" is captured once per run ([`Synchronizer::run_at`] takes it
//! explicitly), so every page stamped in one run carries the same date.

use crate::config::SyncConfig;
use crate::dates;
use crate::diff::{self, ChangeKind, PageChange};
use crate::naming::{self, short_path};
use crate::render::{CmarkRenderer, MarkdownRenderer};
use crate::scan;
use crate::store::{self, StoreError};
use crate::types::{Page, RenderMode};
use crate::validate::{self, DocumentError, ValidationRules};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Path configuration is empty")]
    ConfigurationEmpty,
    #[error("One or more paths do not exist: {}", join_short(.0))]
    DirectoryNotFound(Vec<PathBuf>),
    #[error("No files found @ \"{}\"", short_path(.0))]
    EmptyDirectory(PathBuf),
    #[error("No .{extension} files found @ \"{}\"", short_path(.dir))]
    NoMarkdownFiles { dir: PathBuf, extension: String },
    #[error("{source} @ \"{}\"", short_path(.file))]
    Document {
        file: PathBuf,
        source: DocumentError,
    },
    #[error("Duplicate page {identity} in {first} and {second}")]
    DuplicatePage {
        identity: String,
        first: String,
        second: String,
    },
    #[error("Cannot read \"{}\": {source}", short_path(.path))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Bundle error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Misconfiguration that stops the run even with `continue_on_error`.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::ConfigurationEmpty
                | SyncError::DirectoryNotFound(_)
                | SyncError::EmptyDirectory(_)
                | SyncError::NoMarkdownFiles { .. }
        )
    }
}

fn join_short(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("\"{}\"", short_path(p)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One unit of work: a directory of documents, or pages supplied in memory.
#[derive(Debug, Clone)]
pub enum SyncSource {
    Directory(PathBuf),
    /// Pages built in code, persisted to `bundle_path`. They are checked
    /// with the same rules as documents.
    Pages {
        name: String,
        bundle_path: PathBuf,
        pages: Vec<Page>,
    },
}

impl SyncSource {
    /// Display name used in events and reports.
    pub fn name(&self) -> String {
        match self {
            SyncSource::Directory(dir) => short_path(dir),
            SyncSource::Pages { name, .. } => name.clone(),
        }
    }

    pub fn bundle_path(&self) -> PathBuf {
        match self {
            SyncSource::Directory(dir) => store::bundle_path(dir),
            SyncSource::Pages { bundle_path, .. } => bundle_path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub mode: RenderMode,
    pub quiet: bool,
    pub continue_on_error: bool,
    pub title_matches_filename: bool,
    /// Document extension without the dot.
    pub extension: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::Plain,
            quiet: false,
            continue_on_error: false,
            title_matches_filename: false,
            extension: "md".to_string(),
        }
    }
}

impl SyncOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            mode: config.mode,
            quiet: config.quiet,
            continue_on_error: config.continue_on_error,
            title_matches_filename: config.validation.title_matches_filename,
            extension: config.extension.clone(),
        }
    }

    fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            title_matches_filename: self.title_matches_filename,
        }
    }
}

/// Progress notifications, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    DirectoryStarted {
        directory: String,
    },
    PageChanged {
        directory: String,
        title: String,
        kind: ChangeKind,
    },
    BundleWritten {
        directory: String,
        path: PathBuf,
        pages: usize,
    },
    UpToDate {
        directory: String,
    },
    DirectoryFailed {
        directory: String,
        error: String,
    },
}

/// Outcome for one directory.
#[derive(Debug, Clone)]
pub struct DirectoryReport {
    pub name: String,
    pub bundle_path: PathBuf,
    pub changes: Vec<PageChange>,
    pub unchanged: usize,
    /// Whether the bundle was rewritten on this run.
    pub written: bool,
    /// Final pages with dates and URIs resolved.
    pub pages: Vec<Page>,
}

impl DirectoryReport {
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.changes.is_empty()
    }
}

/// A directory skipped under `continue_on_error`.
#[derive(Debug)]
pub struct DirectoryFailure {
    pub name: String,
    pub error: SyncError,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub directories: Vec<DirectoryReport>,
    pub failures: Vec<DirectoryFailure>,
}

impl SyncReport {
    pub fn total(&self, kind: ChangeKind) -> usize {
        self.directories.iter().map(|d| d.count(kind)).sum()
    }

    pub fn bundles_written(&self) -> usize {
        self.directories.iter().filter(|d| d.written).count()
    }

    /// No directory had changes and none failed.
    pub fn is_up_to_date(&self) -> bool {
        self.failures.is_empty() && self.directories.iter().all(DirectoryReport::is_up_to_date)
    }

    pub fn directory(&self, name: &str) -> Option<&DirectoryReport> {
        self.directories.iter().find(|d| d.name == name)
    }
}

/// Everything phase 1 produced for one source.
struct LoadedSource {
    name: String,
    bundle_path: PathBuf,
    old_pages: Vec<Page>,
    pages: Vec<Page>,
}

pub struct Synchronizer {
    sources: Vec<SyncSource>,
    options: SyncOptions,
    renderer: Box<dyn MarkdownRenderer + Send>,
    events: Option<Sender<SyncEvent>>,
}

impl Synchronizer {
    pub fn new(sources: Vec<SyncSource>, options: SyncOptions) -> Self {
        Self {
            sources,
            options,
            renderer: Box::new(CmarkRenderer::default()),
            events: None,
        }
    }

    /// Replace the renderer used in `html` mode.
    pub fn with_renderer(mut self, renderer: impl MarkdownRenderer + Send + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Send progress events to `tx`. Ignored when `quiet` is set.
    pub fn with_events(mut self, tx: Sender<SyncEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Synchronize every source, writing bundles that changed.
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        self.run_at(Utc::now())
    }

    /// [`run`](Self::run) with an explicit "now" for date stamping.
    pub fn run_at(&self, now: DateTime<Utc>) -> Result<SyncReport, SyncError> {
        self.execute(now, true)
    }

    /// Compute what a run would change without writing anything.
    pub fn check(&self) -> Result<SyncReport, SyncError> {
        self.execute(Utc::now(), false)
    }

    fn execute(&self, now: DateTime<Utc>, write: bool) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        let loaded = self.load_all(&mut report)?;

        for source in loaded {
            let name = source.name.clone();
            match self.reconcile(source, now, write) {
                Ok(directory) => report.directories.push(directory),
                Err(error) => self.isolate(&mut report, name, error)?,
            }
        }

        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Phase 1
    // ------------------------------------------------------------------------

    fn load_all(&self, report: &mut SyncReport) -> Result<Vec<LoadedSource>, SyncError> {
        if self.sources.is_empty() {
            return Err(SyncError::ConfigurationEmpty);
        }

        let missing: Vec<PathBuf> = self
            .sources
            .iter()
            .filter_map(|s| match s {
                SyncSource::Directory(dir) if !dir.is_dir() => Some(dir.clone()),
                _ => None,
            })
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::DirectoryNotFound(missing));
        }

        // List every directory before reading any document so misconfiguration
        // surfaces first.
        let mut listings = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let files = match source {
                SyncSource::Directory(dir) => scan::list_documents(dir, &self.options.extension)?,
                SyncSource::Pages { .. } => Vec::new(),
            };
            listings.push(files);
        }

        // Every old bundle is read before any document.
        let mut bundles = Vec::with_capacity(self.sources.len());
        for (source, files) in self.sources.iter().zip(listings) {
            let name = source.name();
            match store::load_bundle(&source.bundle_path()) {
                Ok(old_pages) => {
                    debug!(directory = %name, previous = old_pages.len(), "loaded bundle");
                    bundles.push((source, files, old_pages));
                }
                Err(error) => self.isolate(report, name, error.into())?,
            }
        }

        let mut loaded = Vec::with_capacity(bundles.len());
        for (source, files, old_pages) in bundles {
            match self.load_source(source, &files, old_pages) {
                Ok(l) => loaded.push(l),
                Err(error) => self.isolate(report, source.name(), error)?,
            }
        }
        Ok(loaded)
    }

    fn load_source(
        &self,
        source: &SyncSource,
        files: &[PathBuf],
        old_pages: Vec<Page>,
    ) -> Result<LoadedSource, SyncError> {
        let name = source.name();
        let (pages, origins) = match source {
            SyncSource::Directory(_) => {
                debug!(directory = %name, documents = files.len(), "loading directory");
                let pages = scan::load_documents(files, &self.options.validation_rules())?;
                let origins: Vec<String> = files.iter().map(|f| short_path(f)).collect();
                (pages, origins)
            }
            SyncSource::Pages { pages, .. } => {
                let origins: Vec<String> =
                    (1..=pages.len()).map(|i| format!("{name} page {i}")).collect();
                let pages = pages
                    .iter()
                    .zip(&origins)
                    .map(|(page, origin)| {
                        validate::check_page(page.clone()).map_err(|source| SyncError::Document {
                            file: PathBuf::from(origin),
                            source,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (pages, origins)
            }
        };

        check_unique(&pages, &origins)?;

        Ok(LoadedSource {
            name,
            bundle_path: source.bundle_path(),
            old_pages,
            pages,
        })
    }

    // ------------------------------------------------------------------------
    // Phase 2
    // ------------------------------------------------------------------------

    fn reconcile(
        &self,
        source: LoadedSource,
        now: DateTime<Utc>,
        write: bool,
    ) -> Result<DirectoryReport, SyncError> {
        let LoadedSource {
            name,
            bundle_path,
            old_pages,
            mut pages,
        } = source;

        self.emit(SyncEvent::DirectoryStarted {
            directory: name.clone(),
        });

        if self.options.mode == RenderMode::Html {
            render_pages(&mut pages, &*self.renderer);
        }

        let diff = diff::reconcile(&mut pages, &old_pages, now);
        for change in &diff.changes {
            self.emit(SyncEvent::PageChanged {
                directory: name.clone(),
                title: change.title.clone(),
                kind: change.kind,
            });
        }

        dates::carry_forward(&mut pages, &old_pages);
        naming::assign_uris(&mut pages);

        let written = if !diff.is_dirty() {
            self.emit(SyncEvent::UpToDate {
                directory: name.clone(),
            });
            false
        } else if write {
            store::save_bundle(&bundle_path, &pages)?;
            debug!(directory = %name, path = %bundle_path.display(), "bundle written");
            self.emit(SyncEvent::BundleWritten {
                directory: name.clone(),
                path: bundle_path.clone(),
                pages: pages.len(),
            });
            true
        } else {
            false
        };

        Ok(DirectoryReport {
            name,
            bundle_path,
            changes: diff.changes,
            unchanged: diff.unchanged,
            written,
            pages,
        })
    }

    /// Record a per-directory failure, or propagate it when it must stop the run.
    fn isolate(
        &self,
        report: &mut SyncReport,
        name: String,
        error: SyncError,
    ) -> Result<(), SyncError> {
        if !self.options.continue_on_error || error.is_configuration() {
            return Err(error);
        }
        warn!(directory = %name, %error, "skipping directory");
        self.emit(SyncEvent::DirectoryFailed {
            directory: name.clone(),
            error: error.to_string(),
        });
        report.failures.push(DirectoryFailure { name, error });
        Ok(())
    }

    fn emit(&self, event: SyncEvent) {
        if self.options.quiet {
            return;
        }
        if let Some(tx) = &self.events {
            // Receiver gone means nobody is listening; progress is best-effort.
            let _ = tx.send(event);
        }
    }
}

fn render_pages(pages: &mut [Page], renderer: &(dyn MarkdownRenderer + Send)) {
    pages
        .par_iter_mut()
        .for_each(|page| page.content = renderer.render(&page.content));
}

fn check_unique(pages: &[Page], origins: &[String]) -> Result<(), SyncError> {
    match diff::find_duplicate(pages) {
        None => Ok(()),
        Some(dup) => Err(SyncError::DuplicatePage {
            identity: dup.identity,
            first: origin(origins, dup.first),
            second: origin(origins, dup.second),
        }),
    }
}

fn origin(origins: &[String], index: usize) -> String {
    origins
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("#{}", index + 1))
}

/// Resolve configured directories against `base` (relative paths only).
pub fn resolve_directories(base: &Path, directories: &[PathBuf]) -> Vec<SyncSource> {
    directories
        .iter()
        .map(|d| SyncSource::Directory(if d.is_absolute() { d.clone() } else { base.join(d) }))
        .collect()
}
