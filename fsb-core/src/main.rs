//! src/main.rs
//! Command-line front end: list a folder, manifest or subtree, optionally
//! removing an entry or dumping the listing to a manifest.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use fsb_core::{
    config::Config,
    fs::{EntryFormat, ordering::cmp_ignore_case},
    init_logging_with_config,
    model::BrowseSession,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Browse folders, path manifests and directory trees", long_about = None)]
struct Cli {
    /// Folder or manifest file to list (defaults to the configured start
    /// directory, then the working directory)
    path: Option<PathBuf>,

    /// List every file below PATH instead of its direct entries
    #[arg(short, long)]
    walk: bool,

    /// Include dot-prefixed and attribute-hidden entries
    #[arg(short, long)]
    all: bool,

    /// Keep manifest lines whose path no longer exists
    #[arg(long)]
    dead: bool,

    /// Leave out the `..` entry
    #[arg(long)]
    no_parent: bool,

    /// Comma-separated extensions or a preset (audio, image, binary, internal)
    #[arg(short, long, value_delimiter = ',')]
    ext: Option<Vec<String>>,

    /// Write the listing to FILE in manifest form
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Delete the entry called NAME (recursively for folders) before listing
    #[arg(long, value_name = "NAME")]
    remove: Option<String>,

    /// Config file to use instead of the platform default
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the listing as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().context("Failed to load configuration")?,
    };

    let _guard = match init_logging_with_config(config.logging.clone()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("fsb: file logging disabled: {e}");
            None
        }
    };

    apply_overrides(&mut config, &cli);

    let mut session = config
        .browse
        .session()
        .context("Invalid browse configuration")?;

    let path = cli
        .path
        .clone()
        .or_else(|| config.browse.start_directory.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    session
        .open(&path, cli.walk)
        .with_context(|| format!("Cannot list {}", path.display()))?;

    if let Some(name) = &cli.remove {
        let index = session
            .find_index(name)
            .with_context(|| format!("No entry named {name}"))?;
        let removed = session
            .remove(index)
            .with_context(|| format!("Failed to remove {name}"))?;
        info!(marker = "CLI_REMOVE", name = %removed.display_name(), "Removed from listing");
        if let Some(stats) = session.last_walk_stats().filter(|_| removed.is_directory()) {
            eprintln!("removed {}: {stats}", removed.display_name());
        }
    }

    if let Some(dest) = &cli.dump {
        let lines = session
            .dump_to_text(dest)
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        eprintln!("wrote {lines} paths to {}", dest.display());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &session.list())?;
        writeln!(out)?;
    } else {
        print_listing(&mut out, &session, cli.walk)?;
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    let browse = &mut config.browse;
    browse.show_hidden |= cli.all;
    browse.list_dead |= cli.dead;
    browse.skip_parent |= cli.no_parent;

    if let Some(exts) = &cli.ext {
        let mut exts: Vec<String> = exts
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();
        // the set is searched with a binary search
        exts.sort_by(|a, b| cmp_ignore_case(a, b));
        exts.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        if exts.is_empty() {
            warn!(marker = "CLI_ARGS", "Empty extension list ignored");
        } else {
            browse.extensions = exts;
        }
    }
}

fn print_listing(out: &mut impl Write, session: &BrowseSession, walk: bool) -> io::Result<()> {
    // walk entries live all over the tree, so show where
    let format = if walk {
        EntryFormat::FULL
    } else {
        EntryFormat::NAME | EntryFormat::EXT | EntryFormat::SYMBOLS
    };

    for index in 0..session.entry_count() {
        let Some(entry) = session.entry_at(index) else {
            break;
        };
        let text = session
            .format_entry_path(entry, format)
            .unwrap_or_else(|_| entry.display_name());
        let mark = if entry.is_missing() { '!' } else { ' ' };
        writeln!(out, "{index:>5} {mark} {text}")?;
    }

    if let Some(list) = session.list() {
        writeln!(
            out,
            "{} directories, {} files",
            list.directory_count(),
            list.file_count()
        )?;
        if let Some(stats) = list.walk_stats() {
            writeln!(out, "{stats}")?;
        }
    }

    Ok(())
}
