use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sqlforge_core::{ColumnValue, Verb};
use sqlforge_db::{ArtifactDrift, ArtifactManifest, ArtifactStore, MANIFEST_FILE, StoreConfig};
use sqlforge_sqlite::{BackupCoordinator, BackupOutcome, Connector, Migration, StatementRunner};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_CONFIG: &str = "sqlforge.yml";

#[derive(Debug, Parser)]
#[command(name = "sqlforge")]
#[command(about = "Compile table declarations to SQL artifacts and run them against SQLite")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./sqlforge.yml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Store file path, overriding the configuration.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile every declaration into the artifact store.
    Compile,
    /// Compile declarations and create every table.
    Init,
    /// Create every table from compiled artifacts.
    Up,
    /// Drop every table in reverse declaration order.
    Down,
    /// Recompile, drop, and recreate every table.
    Refresh,
    /// Show which tables exist and their row counts.
    Status,
    /// Check stored artifacts against the manifest checksums.
    Verify,
    /// Print one compiled artifact.
    Show(ShowArgs),
    /// Read a table as column-oriented JSON.
    Select(SelectArgs),
    /// Insert one row, values in column order.
    Insert(InsertArgs),
    /// Delete one row by primary key.
    Delete(DeleteArgs),
    /// Copy the store to the backup path.
    Backup(BackupArgs),
    /// Copy the store to a new timestamped archive.
    Archive,
    /// Copy a backup over the store.
    Restore(RestoreArgs),
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Table name.
    table: String,
    /// Statement verb (CREATE, DROP, INSERT, SELECT_ALL, SELECT_BY_PK, UPDATE, DELETE).
    verb: Verb,
}

#[derive(Debug, Args)]
struct SelectArgs {
    /// Table name.
    table: String,
    /// Primary-key value; selects every row when omitted.
    #[arg(long)]
    key: Option<String>,
}

#[derive(Debug, Args)]
struct InsertArgs {
    /// Table name.
    table: String,
    /// Values in column order. JSON literals (`3`, `true`, `0.5`) keep
    /// their type; anything else is text.
    #[arg(required = true)]
    values: Vec<String>,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Table name.
    table: String,
    /// Primary-key value.
    key: String,
}

#[derive(Debug, Args)]
struct BackupArgs {
    /// Destination, overriding the configured backup path.
    #[arg(long)]
    to: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RestoreArgs {
    /// Backup to restore, overriding the configured backup path.
    #[arg(long)]
    from: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = load_config(cli.config.as_deref(), cli.db).and_then(|config| match cli.command {
        Command::Compile => run_compile(&config),
        Command::Init => run_init(&config),
        Command::Up => run_up(&config),
        Command::Down => run_down(&config),
        Command::Refresh => run_refresh(&config),
        Command::Status => run_status(&config),
        Command::Verify => run_verify(&config),
        Command::Show(args) => run_show(&config, args),
        Command::Select(args) => run_select(&config, args),
        Command::Insert(args) => run_insert(&config, args),
        Command::Delete(args) => run_delete(&config, args),
        Command::Backup(args) => run_backup(&config, args),
        Command::Archive => run_archive(&config),
        Command::Restore(args) => run_restore(&config, args),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Loads the configuration file and applies the `--db` override.
///
/// Relative paths in a config file are resolved against the file's
/// directory. Without a config file, defaults resolve against the working
/// directory.
fn load_config(path: Option<&Path>, db: Option<PathBuf>) -> Result<StoreConfig, String> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => read_config(Path::new(DEFAULT_CONFIG))?,
        None => StoreConfig::default(),
    };
    if let Some(db) = db {
        config.database = db;
    }
    tracing::debug!(
        database = %config.database.display(),
        declarations = %config.declarations.display(),
        "configuration loaded"
    );
    Ok(config)
}

fn read_config(path: &Path) -> Result<StoreConfig, String> {
    let config = StoreConfig::load(path)
        .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(config.rebase(base))
}

fn migration(config: &StoreConfig) -> Result<Migration, String> {
    Migration::from_config(config).map_err(|e| {
        format!(
            "Failed to load declarations from '{}': {e}",
            config.declarations.display()
        )
    })
}

fn runner(config: &StoreConfig) -> StatementRunner {
    StatementRunner::new(
        Connector::new(&config.database),
        ArtifactStore::from_config(&config.artifacts),
    )
}

/// Parses a CLI value: JSON scalars keep their type, anything else is text.
fn parse_value(raw: &str) -> ColumnValue {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Bool(b)) => ColumnValue::Boolean(b),
        Ok(serde_json::Value::Number(n)) => match n.as_i64() {
            Some(i) => ColumnValue::Integer(i),
            None => ColumnValue::Float(n.as_f64().unwrap_or_default()),
        },
        _ => ColumnValue::text(raw),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}

// ---------------------------------------------------------------------------
// lifecycle commands
// ---------------------------------------------------------------------------

fn run_compile(config: &StoreConfig) -> Result<(), String> {
    let report = migration(config)?
        .compile()
        .map_err(|e| format!("Compile failed: {e}"))?;
    println!(
        "Compiled {} tables ({} artifacts) into '{}'.",
        report.tables.len(),
        report.artifacts_written,
        config.artifacts.root.display()
    );
    Ok(())
}

fn run_init(config: &StoreConfig) -> Result<(), String> {
    let migration = migration(config)?;
    let report = migration
        .compile()
        .map_err(|e| format!("Compile failed: {e}"))?;
    let batch = migration
        .up()
        .map_err(|e| format!("Migration up failed: {e}"))?;
    println!(
        "Initialized '{}': {} tables compiled, {} created.",
        config.database.display(),
        report.tables.len(),
        batch.len()
    );
    Ok(())
}

fn run_up(config: &StoreConfig) -> Result<(), String> {
    let batch = migration(config)?
        .up()
        .map_err(|e| format!("Migration up failed: {e}"))?;
    println!(
        "Migration up complete. {} tables created in '{}'.",
        batch.len(),
        config.database.display()
    );
    Ok(())
}

fn run_down(config: &StoreConfig) -> Result<(), String> {
    let batch = migration(config)?
        .down()
        .map_err(|e| format!("Migration down failed: {e}"))?;
    println!(
        "Migration down complete. {} tables dropped from '{}'.",
        batch.len(),
        config.database.display()
    );
    Ok(())
}

fn run_refresh(config: &StoreConfig) -> Result<(), String> {
    let report = migration(config)?
        .refresh()
        .map_err(|e| format!("Refresh failed: {e}"))?;
    println!(
        "Refresh complete ({} tables recompiled, dropped, and recreated).",
        report.tables.len()
    );
    Ok(())
}

fn run_status(config: &StoreConfig) -> Result<(), String> {
    let status = migration(config)?
        .status()
        .map_err(|e| format!("Failed to get migration status: {e}"))?;
    println!("Migration Status ({}):", config.database.display());
    for table in &status.tables {
        if table.exists {
            println!("  {}: {} rows", table.name, table.row_count);
        } else {
            println!("  {}: missing", table.name);
        }
    }
    Ok(())
}

fn run_verify(config: &StoreConfig) -> Result<(), String> {
    let path = config.artifacts.root.join(MANIFEST_FILE);
    let manifest = ArtifactManifest::load(&path)
        .map_err(|e| format!("Failed to load manifest '{}': {e}", path.display()))?;
    let store = ArtifactStore::from_config(&config.artifacts);
    let drift = manifest
        .verify(&store)
        .map_err(|e| format!("Verify failed: {e}"))?;

    if drift.is_empty() {
        println!("All artifacts match the manifest.");
        return Ok(());
    }
    for item in &drift {
        match item {
            ArtifactDrift::Missing(name) => println!("  missing:  {name}"),
            ArtifactDrift::Modified(name) => println!("  modified: {name}"),
        }
    }
    Err(format!("{} artifacts differ from the manifest", drift.len()))
}

// ---------------------------------------------------------------------------
// data commands
// ---------------------------------------------------------------------------

fn run_show(config: &StoreConfig, args: ShowArgs) -> Result<(), String> {
    let sql = ArtifactStore::from_config(&config.artifacts)
        .load_verb(args.verb, &args.table)
        .map_err(|e| e.to_string())?;
    println!("{}", sql.trim_end());
    Ok(())
}

fn run_select(config: &StoreConfig, args: SelectArgs) -> Result<(), String> {
    let runner = runner(config);
    let result = match &args.key {
        Some(key) => runner.run_select_by_key(&args.table, &parse_value(key)),
        None => runner.run_select_all(&args.table),
    }
    .map_err(|e| format!("Select failed: {e}"))?;
    print_json(&result)
}

fn run_insert(config: &StoreConfig, args: InsertArgs) -> Result<(), String> {
    let values: Vec<ColumnValue> = args.values.iter().map(String::as_str).map(parse_value).collect();
    let inserted = runner(config)
        .run_insert(&args.table, &values)
        .map_err(|e| format!("Insert failed: {e}"))?;
    println!("Inserted {inserted} row(s) into {}.", args.table);
    Ok(())
}

fn run_delete(config: &StoreConfig, args: DeleteArgs) -> Result<(), String> {
    let deleted = runner(config)
        .run_delete(&args.table, &parse_value(&args.key))
        .map_err(|e| format!("Delete failed: {e}"))?;
    println!("Deleted {deleted} row(s) from {}.", args.table);
    Ok(())
}

// ---------------------------------------------------------------------------
// backup commands
// ---------------------------------------------------------------------------

fn print_outcome(outcome: &BackupOutcome) {
    println!(
        "{} complete: {} -> {} ({} bytes{})",
        outcome.record.operation,
        outcome.record.source,
        outcome.record.destination,
        outcome.bytes_copied,
        if outcome.logged { ", logged" } else { "" }
    );
}

fn run_backup(config: &StoreConfig, args: BackupArgs) -> Result<(), String> {
    let destination = args.to.unwrap_or_else(|| config.backup_path());
    let outcome = BackupCoordinator::from_config(&config.backup)
        .backup(&config.database, &destination)
        .map_err(|e| format!("Backup failed: {e}"))?;
    print_outcome(&outcome);
    Ok(())
}

fn run_archive(config: &StoreConfig) -> Result<(), String> {
    let outcome = BackupCoordinator::from_config(&config.backup)
        .archive(&config.database)
        .map_err(|e| format!("Archive failed: {e}"))?;
    print_outcome(&outcome);
    Ok(())
}

fn run_restore(config: &StoreConfig, args: RestoreArgs) -> Result<(), String> {
    let source = args.from.unwrap_or_else(|| config.backup_path());
    let outcome = BackupCoordinator::from_config(&config.backup)
        .restore(&source, &config.database)
        .map_err(|e| format!("Restore failed: {e}"))?;
    print_outcome(&outcome);
    Ok(())
}
