// Telecast Catalog CLI binary

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::path::{Path, PathBuf};

use telecast_catalog::access;
use telecast_catalog::backup::{self, default_backup_file_name};
use telecast_catalog::constants::EXPORT_FILENAME;
use telecast_catalog::export::export_catalog_csv;
use telecast_catalog::identity::{display_name, is_absolute_local_path};
use telecast_catalog::metadata::MetadataForm;
use telecast_catalog::{
    discover_local_files, reconcile, search, Catalog, CatalogConfig, Combinator, FileRecord,
    SearchQuery, SqliteStore,
};

#[derive(Parser)]
#[command(name = "tcat")]
#[command(about = "Telecast Catalog - track broadcast files across archive disks", long_about = None)]
#[command(version)]
struct Cli {
    /// Catalog database (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage archive disks
    Disk {
        #[command(subcommand)]
        action: DiskAction,
    },

    /// Manage programmes
    Programme {
        #[command(subcommand)]
        action: ProgrammeAction,
    },

    /// Catalog every file under a folder as belonging to a disk
    Scan {
        /// Disk id
        disk: String,
        /// Folder (or single file) to scan
        dir: PathBuf,
    },

    /// List files that have no metadata yet
    Scanned {
        /// Only files on this disk
        #[arg(long)]
        disk: Option<String>,
    },

    /// List files that have metadata
    Archived,

    /// Set metadata on a cataloged file
    SetMeta(SetMetaArgs),

    /// Search the catalog
    Search(SearchArgs),

    /// Find where a cataloged file lives inside a folder
    Locate {
        /// Cataloged path
        path: String,
        /// Folder to look in
        dir: PathBuf,
    },

    /// Point a cataloged file at its location inside a folder
    Relink {
        /// Cataloged path
        path: String,
        /// Folder to look in
        dir: PathBuf,
    },

    /// Write a JSON snapshot of the whole catalog
    Backup {
        /// Output file (defaults to a timestamped name)
        out: Option<PathBuf>,
    },

    /// Replace the whole catalog with a JSON snapshot
    Restore {
        /// Snapshot file
        file: PathBuf,
        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },

    /// Export archived files as CSV
    ExportCsv {
        /// Output file
        out: Option<PathBuf>,
    },

    /// List disk ids referenced by cataloged files
    DiskIds,
}

#[derive(Subcommand)]
enum DiskAction {
    /// Register a disk
    Add { id: String },
    /// List disks
    List,
    /// Rename a disk
    Rename { old: String, new: String },
    /// Remove a disk
    Delete { id: String },
}

#[derive(Subcommand)]
enum ProgrammeAction {
    /// Register a programme
    Add { name: String },
    /// List programmes
    List,
    /// Rename a programme, keeping its id
    Rename { id: String, name: String },
    /// Remove a programme
    Delete { id: String },
}

#[derive(Args)]
struct SetMetaArgs {
    /// Cataloged path
    path: String,
    #[arg(long)]
    programme: Option<String>,
    #[arg(long)]
    episode: Option<u32>,
    /// Telecast date, e.g. 2021-03-15
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    details: Option<String>,
    /// Custom field as key=value (repeatable)
    #[arg(long = "field", value_parser = parse_pair)]
    fields: Vec<(String, String)>,
    /// Start from empty metadata instead of the current values
    #[arg(long)]
    clear: bool,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long)]
    disk: Option<String>,
    #[arg(long)]
    programme: Option<String>,
    #[arg(long)]
    episode: Option<u32>,
    #[arg(long)]
    date: Option<String>,
    /// Substring of any metadata pair
    #[arg(long)]
    text: Option<String>,
    /// Match any criterion instead of all
    #[arg(long)]
    or: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = CatalogConfig::load(cli.config.as_deref())?;
    let db_path = cli.db.clone().unwrap_or_else(|| config.resolve_database_path());
    log::debug!("Using catalog at {}", db_path.display());

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open catalog at {}", db_path.display()))?;
    let mut catalog = Catalog::with_labels(store, config.fields.clone());

    match cli.command {
        Commands::Disk { action } => cmd_disk(&mut catalog, action),
        Commands::Programme { action } => cmd_programme(&mut catalog, action),
        Commands::Scan { disk, dir } => cmd_scan(&mut catalog, &disk, &dir),
        Commands::Scanned { disk } => {
            let files = catalog.list_scanned_files(disk.as_deref())?;
            print_files(&files, "No files awaiting metadata.");
            Ok(())
        }
        Commands::Archived => {
            let files = catalog.list_archived_files()?;
            print_files(&files, "No archived files yet.");
            Ok(())
        }
        Commands::SetMeta(args) => cmd_set_meta(&mut catalog, args),
        Commands::Search(args) => cmd_search(&catalog, args),
        Commands::Locate { path, dir } => cmd_locate(&catalog, &path, &dir),
        Commands::Relink { path, dir } => {
            let available = discover_local_files(&dir)?;
            let record = catalog.relink_file(&path, &available)?;
            println!("Relinked to {}", record.canonical_path);
            Ok(())
        }
        Commands::Backup { out } => cmd_backup(&catalog, out),
        Commands::Restore { file, yes } => cmd_restore(&mut catalog, &file, yes),
        Commands::ExportCsv { out } => {
            let out = out.unwrap_or_else(|| PathBuf::from(EXPORT_FILENAME));
            let rows = export_catalog_csv(&catalog, &out)?;
            println!("Exported {} archived files to {}", rows, out.display());
            Ok(())
        }
        Commands::DiskIds => {
            for id in catalog.disk_ids_from_files()? {
                println!("{}", id);
            }
            Ok(())
        }
    }
}

type CliCatalog = Catalog<SqliteStore>;

fn cmd_disk(catalog: &mut CliCatalog, action: DiskAction) -> Result<()> {
    match action {
        DiskAction::Add { id } => {
            let disk = catalog.add_disk(&id)?;
            println!("Added disk {}", disk.id);
        }
        DiskAction::List => {
            let disks = catalog.list_disks()?;
            if disks.is_empty() {
                println!("No disks. Use 'tcat disk add <id>' to register one.");
            }
            for disk in disks {
                println!("{}", disk.id);
            }
        }
        DiskAction::Rename { old, new } => {
            let disk = catalog.rename_disk(&old, &new)?;
            println!("Renamed disk {} to {}", old, disk.id);
        }
        DiskAction::Delete { id } => {
            catalog.delete_disk(&id)?;
            println!("Deleted disk {}", id);
        }
    }
    Ok(())
}

fn cmd_programme(catalog: &mut CliCatalog, action: ProgrammeAction) -> Result<()> {
    match action {
        ProgrammeAction::Add { name } => {
            let programme = catalog.add_programme(&name)?;
            println!("Added programme '{}' ({})", programme.name, programme.id);
        }
        ProgrammeAction::List => {
            let programmes = catalog.list_programmes()?;
            if programmes.is_empty() {
                println!("No programmes.");
                return Ok(());
            }
            println!("{:<30}  {}", "ID", "Name");
            println!("{}", "-".repeat(60));
            for programme in programmes {
                println!("{:<30}  {}", programme.id, programme.name);
            }
        }
        ProgrammeAction::Rename { id, name } => {
            let programme = catalog.rename_programme(&id, &name)?;
            println!("Programme {} is now '{}'", programme.id, programme.name);
        }
        ProgrammeAction::Delete { id } => {
            catalog.delete_programme(&id)?;
            println!("Deleted programme {}", id);
        }
    }
    Ok(())
}

fn cmd_scan(catalog: &mut CliCatalog, disk: &str, dir: &Path) -> Result<()> {
    let entries = discover_local_files(dir)?;
    println!("Scanning {} into disk {}", dir.display(), disk);

    let report = reconcile(catalog, disk, &entries, &mut |progress| {
        eprint!("\r  {:>5.1}% ({}/{})", progress.percent, progress.current, progress.total);
        if progress.is_complete() {
            eprintln!();
        }
    })?;

    println!();
    println!("Scan complete:");
    println!("  Files:          {}", report.total_files);
    println!("  New:            {}", report.inserted);
    println!("  Already known:  {}", report.already_cataloged);
    println!("  Filtered out:   {}", report.filtered_out);
    Ok(())
}

fn cmd_set_meta(catalog: &mut CliCatalog, args: SetMetaArgs) -> Result<()> {
    let labels = catalog.labels().clone();
    let record = catalog
        .find_file(&args.path)?
        .ok_or_else(|| anyhow::anyhow!("File {} is not cataloged", args.path))?;

    let mut form = if args.clear {
        MetadataForm::default()
    } else {
        MetadataForm::from_metadata(&record.metadata, &labels)
    };
    if let Some(programme) = args.programme {
        form.programme = programme;
    }
    if args.episode.is_some() {
        form.episode_number = args.episode;
    }
    if let Some(date) = args.date {
        form.telecast_date = date;
    }
    if let Some(details) = args.details {
        form.episode_details = details;
    }
    for (key, value) in args.fields {
        match form.custom.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => form.custom.push((key, value)),
        }
    }

    let updated = catalog.set_file_metadata(&record.canonical_path, form.to_metadata(&labels))?;
    if updated.is_archived() {
        println!("Saved metadata for {}", updated.canonical_path);
        for (key, value) in &updated.metadata {
            println!("  {}: {}", key, value);
        }
    } else {
        println!("Cleared metadata for {}", updated.canonical_path);
    }
    Ok(())
}

fn cmd_search(catalog: &CliCatalog, args: SearchArgs) -> Result<()> {
    let query = SearchQuery {
        disk_id: args.disk,
        programme_name: args.programme,
        episode_number: args.episode,
        telecast_date: args.date,
        metadata_substring: args.text,
        combinator: if args.or { Combinator::Or } else { Combinator::And },
    };
    let hits = search(catalog, &query)?;

    if hits.is_empty() {
        println!("No matching files.");
        return Ok(());
    }

    println!("{:<8}  {:<20}  {:>7}  {:<10}  {}", "Disk", "Programme", "Episode", "Date", "Path");
    println!("{}", "-".repeat(80));
    for hit in &hits {
        println!(
            "{:<8}  {:<20}  {:>7}  {:<10}  {}",
            hit.disk_id,
            truncate(&hit.programme_name, 20),
            hit.episode_number,
            hit.telecast_date,
            hit.file_path
        );
    }
    println!();
    println!("{} files", hits.len());
    Ok(())
}

fn cmd_locate(catalog: &CliCatalog, path: &str, dir: &Path) -> Result<()> {
    if is_absolute_local_path(path) && Path::new(path).is_file() {
        println!("{}", path);
        return Ok(());
    }

    let record = catalog
        .find_file(path)?
        .ok_or_else(|| anyhow::anyhow!("File {} is not cataloged", path))?;
    let available = discover_local_files(dir)?;

    match access::resolve(&record.canonical_path, &available) {
        Some(file) => println!("{}", file.location.display()),
        None => anyhow::bail!(
            "{} (disk {}) is not under {}. Use 'tcat relink' if it moved.",
            display_name(&record.canonical_path),
            record.disk_id,
            dir.display()
        ),
    }
    Ok(())
}

fn cmd_backup(catalog: &CliCatalog, out: Option<PathBuf>) -> Result<()> {
    let out = out.unwrap_or_else(|| PathBuf::from(default_backup_file_name(&chrono::Local::now())));
    let snapshot = backup::backup(catalog)?;
    backup::write_snapshot_file(&out, &snapshot)?;

    println!("Backup written to {}", out.display());
    println!("  Files:       {}", snapshot.files.len());
    println!("  Programmes:  {}", snapshot.programmes.len());
    println!("  Disks:       {}", snapshot.disks.len());
    Ok(())
}

fn cmd_restore(catalog: &mut CliCatalog, file: &Path, yes: bool) -> Result<()> {
    let snapshot = backup::read_snapshot_file(file)
        .with_context(|| format!("Cannot restore from {}", file.display()))?;

    if !yes {
        anyhow::bail!(
            "Restoring replaces the whole catalog with {} files, {} programmes and {} disks. \
             Re-run with --yes to continue.",
            snapshot.files.len(),
            snapshot.programmes.len(),
            snapshot.disks.len()
        );
    }

    let report = backup::restore(catalog, &snapshot)?;
    println!("Restored from {}", file.display());
    println!("  Files:       {}", report.files);
    println!("  Programmes:  {}", report.programmes);
    println!("  Disks:       {}", report.disks);
    println!("  Replaced:    {} documents", report.removed);
    Ok(())
}

// --- Helper Functions ---

fn init_logger(verbose: bool) {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        return;
    }
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    Builder::new()
        .target(Target::Stderr)
        .filter_level(LevelFilter::Warn)
        .filter_module("telecast_catalog", level)
        .filter_module("tcat", level)
        .init();
}

fn parse_pair(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

fn print_files(files: &[FileRecord], empty_message: &str) {
    if files.is_empty() {
        println!("{}", empty_message);
        return;
    }
    println!("{:<8}  {}", "Disk", "Path");
    println!("{}", "-".repeat(70));
    for file in files {
        println!("{:<8}  {}", file.disk_id, file.canonical_path);
    }
    println!();
    println!("{} files", files.len());
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
