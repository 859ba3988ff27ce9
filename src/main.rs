use clap::{Parser, Subcommand};
use mdbundle::sync::{SyncOptions, SyncReport, Synchronizer, resolve_directories};
use mdbundle::config::{self, SyncConfig};
use mdbundle::{export, output, render, store, types::RenderMode};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn version_string() -> &'static str {
    let on_tag = env!("MDBUNDLE_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("MDBUNDLE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

/// Flags shared by `sync` and `check`.
#[derive(clap::Args, Clone)]
struct SyncArgs {
    /// Directories to bundle (overrides `directories` in the config file)
    directories: Vec<PathBuf>,

    /// Store rendered HTML instead of raw Markdown
    #[arg(long, value_enum)]
    mode: Option<RenderMode>,

    /// Skip directories with broken documents instead of aborting
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(Parser)]
#[command(name = "mdbundle")]
#[command(about = "Bundle directories of front-matter Markdown into JSON page data")]
#[command(long_about = "\
Bundle directories of front-matter Markdown into JSON page data

Each configured directory is scanned for Markdown documents and reconciled
against a bundle stored next to them, named after the directory:

  views/faq/
  ├── intro.md                 # ---
  ├── billing.md               # title: Getting started
  └── faq.json                 # author: Ana
                               # date: 2/22/2022   (optional, kept as-is)
                               # id: 3             (optional identity)
                               # ---
                               # Markdown body

Pages are matched across runs by id, or by title when there is no id. Pages
without a date get the time they were last added or changed. The bundle is
only rewritten when a page was added, changed or deleted.

Run 'mdbundle gen-config' to generate a documented mdbundle.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./mdbundle.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only print errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile directories with their bundles, writing the ones that changed
    Sync(SyncArgs),
    /// Report what `sync` would change without writing anything
    Check(SyncArgs),
    /// Write the pages of a bundle out as Markdown documents
    Export {
        /// Bundle to read
        bundle: PathBuf,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Print a stock mdbundle.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match cli.command {
        Command::Sync(args) => {
            let (report, quiet) = run_sync(cli.config.as_deref(), cli.quiet, &args, false)?;
            if !quiet {
                output::print_report(&report, false);
            }
            if !report.failures.is_empty() {
                std::process::exit(1);
            }
        }
        Command::Check(args) => {
            let (report, quiet) = run_sync(cli.config.as_deref(), cli.quiet, &args, true)?;
            if !quiet {
                output::print_report(&report, true);
            }
            if !report.is_up_to_date() {
                std::process::exit(1);
            }
        }
        Command::Export { bundle, out } => {
            let config = config::load_config(cli.config.as_deref(), &std::env::current_dir()?)?;
            let pages = store::load_bundle(&bundle)?;
            let written = export::write_documents(&out, &pages, &config.extension)?;
            if !cli.quiet {
                for path in &written {
                    println!("{}", path.display());
                }
                println!("Exported {} documents", written.len());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run a sync or check. Also returns the effective `quiet` (CLI flag or config file).
fn run_sync(
    config_path: Option<&Path>,
    quiet: bool,
    args: &SyncArgs,
    check: bool,
) -> Result<(SyncReport, bool), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let mut config = config::load_config(config_path, &cwd)?;
    apply_overrides(&mut config, quiet, args);

    let sources = resolve_directories(&cwd, &config.directories);
    let renderer = render::CmarkRenderer::new((&config.render).into());

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_sync_event(&event);
        }
    });

    let result = {
        let synchronizer = Synchronizer::new(sources, SyncOptions::from_config(&config))
            .with_renderer(renderer)
            .with_events(tx);
        if check {
            synchronizer.check()
        } else {
            synchronizer.run()
        }
    };
    // The synchronizer (and its sender) is dropped above, so the printer drains and exits.
    printer.join().map_err(|_| "progress printer thread panicked")?;

    Ok((result?, config.quiet))
}

/// Command-line flags win over the config file; boolean flags can only turn
/// an option on.
fn apply_overrides(config: &mut SyncConfig, quiet: bool, args: &SyncArgs) {
    if !args.directories.is_empty() {
        config.directories = args.directories.clone();
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    config.quiet |= quiet;
    config.continue_on_error |= args.continue_on_error;
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the defaults.
fn init_tracing(quiet: bool) {
    let default = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(directories: &[&str]) -> SyncArgs {
        SyncArgs {
            directories: directories.iter().map(PathBuf::from).collect(),
            mode: None,
            continue_on_error: false,
        }
    }

    #[test]
    fn quiet_from_config_file_survives_without_flag() {
        let mut config = SyncConfig {
            quiet: true,
            ..SyncConfig::default()
        };
        apply_overrides(&mut config, false, &args(&[]));
        assert!(config.quiet);
    }

    #[test]
    fn quiet_flag_turns_quiet_on() {
        let mut config = SyncConfig::default();
        apply_overrides(&mut config, true, &args(&[]));
        assert!(config.quiet);
    }

    #[test]
    fn cli_directories_and_mode_replace_config() {
        let mut config = SyncConfig {
            directories: vec![PathBuf::from("views/old")],
            ..SyncConfig::default()
        };
        let mut cli = args(&["views/faq"]);
        cli.mode = Some(RenderMode::Html);
        apply_overrides(&mut config, false, &cli);
        assert_eq!(config.directories, vec![PathBuf::from("views/faq")]);
        assert_eq!(config.mode, RenderMode::Html);
    }
}
