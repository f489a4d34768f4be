use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use schedule_import::{
    AuditStamp, ImportBatch, ImportConfig, ImportReport, SqliteProjectStore, import_batch,
    read_activity_csv, read_wbs_csv,
};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "cli",
    about = "Load WBS, activities and relationships into a P6 SQLite database"
)]
struct Cli {
    /// JSON file with defaults for every option below
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Project short name (PROJECT.proj_short_name)
    #[arg(long, global = true)]
    project: Option<String>,
    #[arg(long, global = true)]
    user: Option<String>,
    #[arg(long, global = true)]
    hours_per_day: Option<f64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the importer tables and a project with its root WBS node
    Init {
        #[arg(long, default_value = "Project Root")]
        name: String,
        #[arg(long, default_value_t = 1)]
        calendar: i64,
    },
    /// Import a WBS hierarchy (parents listed before children)
    Wbs { file: Option<PathBuf> },
    /// Import activities and their relationships
    Activities { file: Option<PathBuf> },
    /// Import a WBS hierarchy and activities in a single transaction
    Import {
        #[arg(long)]
        wbs: Option<PathBuf>,
        #[arg(long)]
        activities: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SCHEDULE_IMPORT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("schedule_import=info,warn"));

    let format = env::var("SCHEDULE_IMPORT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<ImportConfig> {
    let mut config = match &cli.config {
        Some(path) => ImportConfig::from_json_file(path)
            .with_context(|| format!("reading config '{}'", path.display()))?,
        None => ImportConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    if let Some(project) = &cli.project {
        config.project_code = project.clone();
    }
    if let Some(user) = &cli.user {
        config.user_name = user.clone();
    }
    if let Some(hours) = cli.hours_per_day {
        config.hours_per_day = hours;
    }
    config.validate()?;
    Ok(config)
}

fn database_path(config: &ImportConfig) -> Result<&Path> {
    match config.db_path.as_deref() {
        Some(path) => Ok(path),
        None => bail!("no database given (use --db or db_path in the config file)"),
    }
}

fn pick_file(arg: Option<PathBuf>, configured: Option<&PathBuf>, what: &str) -> Result<PathBuf> {
    match arg.or_else(|| configured.cloned()) {
        Some(path) if path.is_file() => Ok(path),
        Some(path) => bail!("the file '{}' was not found", path.display()),
        None => bail!("no {what} file given"),
    }
}

fn print_report(report: &ImportReport) {
    for diagnostic in &report.diagnostics {
        println!("  -> {diagnostic}");
    }
    println!("\nSUCCESS: all changes have been committed ({}).", report.to_cli_summary());
    println!("IMPORTANT: open the project in P6 and press F9 (Schedule) to see the changes.");
}

fn init_project(config: &ImportConfig, db_path: &Path, name: &str, calendar: i64) -> Result<()> {
    let connection =
        Connection::open(db_path).with_context(|| format!("opening '{}'", db_path.display()))?;
    SqliteProjectStore::initialize_schema(&connection)?;
    let project = SqliteProjectStore::create_project(
        &connection,
        config.project_code.trim(),
        name,
        Some(calendar),
        &AuditStamp::now(config.user_name.trim()),
    )?;
    println!(
        "Created project '{}' (proj_id {}, root WBS {}).",
        project.project_code, project.proj_id, project.root_wbs_id
    );
    Ok(())
}

fn load(config: &ImportConfig, db_path: &Path, batch: &ImportBatch) -> Result<()> {
    if !db_path.is_file() {
        bail!("the database '{}' was not found", db_path.display());
    }
    let mut connection =
        Connection::open(db_path).with_context(|| format!("opening '{}'", db_path.display()))?;
    let report = import_batch(&mut connection, config, batch)
        .context("import failed, all changes were rolled back")?;
    print_report(&report);
    drop(connection);
    println!("Database connection closed.");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let db_path = database_path(&config)?;

    let batch = match cli.command {
        Command::Init { name, calendar } => return init_project(&config, db_path, &name, calendar),
        Command::Wbs { file } => {
            let path = pick_file(file, config.wbs_file.as_ref(), "WBS")?;
            let rows = read_wbs_csv(&path)?;
            println!("Read {} WBS records from '{}'.", rows.len(), path.display());
            println!("IMPORTANT: parent WBS elements must be listed before their children.");
            ImportBatch::wbs(rows)
        }
        Command::Activities { file } => {
            let path = pick_file(file, config.activities_file.as_ref(), "activities")?;
            let rows = read_activity_csv(&path)?;
            println!("Read {} records from '{}'.", rows.len(), path.display());
            ImportBatch::activities(rows)
        }
        Command::Import { wbs, activities } => {
            let wbs_path = pick_file(wbs, config.wbs_file.as_ref(), "WBS")?;
            let activity_path =
                pick_file(activities, config.activities_file.as_ref(), "activities")?;
            ImportBatch {
                wbs: read_wbs_csv(&wbs_path)?,
                activities: read_activity_csv(&activity_path)?,
            }
        }
    };

    load(&config, db_path, &batch)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}
