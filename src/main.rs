mod collate;
mod config;
mod entry;
mod error;
mod export;
mod models;
mod parser;
mod reconcile;
mod report;
mod roster;
mod store;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use parser::Dialect;
use report::TableReport;
use roster::RosterStore;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use store::GradeStore;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use ui::App;

/// Reconcile exported quiz grades against a class roster.
#[derive(Debug, Parser)]
#[command(name = "grade_tally", version, about)]
struct Cli {
    /// Class to grade; without it an interactive picker is shown
    #[arg(short, long)]
    class: Option<String>,

    /// Only process these grade files (default: every .csv in the grades directory)
    #[arg(short, long = "file", value_name = "NAME")]
    files: Vec<String>,

    /// Print mean, median, mode and standard deviation of non-zero grades
    #[arg(long)]
    stats: bool,

    /// Print results as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Write each result to results_<class>_<file>_<timestamp>.csv
    #[arg(long)]
    export: bool,

    /// Type each table's grades into the focused window after the entry delay
    #[arg(long)]
    enter_grades: bool,

    /// Type grades as percentages
    #[arg(long, requires = "enter_grades")]
    percent: bool,

    #[arg(long, value_enum)]
    dialect: Option<Dialect>,

    #[arg(long, value_name = "DIR")]
    classes_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    grades_dir: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.classes_dir {
            config.classes_dir = dir.clone();
        }
        if let Some(dir) = &self.grades_dir {
            config.grades_dir = dir.clone();
        }
        if let Some(dialect) = self.dialect {
            config.dialect = dialect;
        }
        config
    }
}

fn init_logging(config: &Config, interactive: bool) -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            fmt()
                .with_env_filter(env)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        // Writing to stderr would tear the alternate screen
        None if interactive => {}
        None => {
            fmt()
                .with_env_filter(env)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = cli.apply(Config::load().context("Failed to load configuration")?);
    init_logging(&config, cli.class.is_none())?;

    let roster_store = RosterStore::new(&config.classes_dir);
    let grade_store = GradeStore::new(&config.grades_dir, config.dialect);

    let export_dir = std::env::current_dir().context("Failed to resolve working directory")?;

    match &cli.class {
        Some(class_name) => run_batch(&cli, &config, class_name, &roster_store, &grade_store, &export_dir),
        None => {
            let mut app = App::new(roster_store, grade_store, export_dir);
            app.run()
        }
    }
}

fn run_batch(
    cli: &Cli,
    config: &Config,
    class_name: &str,
    roster_store: &RosterStore,
    grade_store: &GradeStore,
    export_dir: &Path,
) -> Result<()> {
    let roster = roster_store.load(class_name)?;
    let files = if cli.files.is_empty() {
        grade_store.list_files()?
    } else {
        cli.files.clone()
    };

    let mut sink = if cli.enter_grades {
        Some(entry::system_sink()?)
    } else {
        None
    };

    for file_name in &files {
        let table = grade_store.load(file_name)?;
        let grades = reconcile::reconcile_table(&roster, &table)
            .with_context(|| format!("Failed to reconcile {}", file_name))?;

        let report = TableReport::new(file_name, &roster.class_name, &grades, cli.stats);
        if cli.json {
            println!("{}", report.to_json()?);
        } else {
            println!("{}", report.to_text());
        }

        if cli.export {
            let path = export::export_to_csv(&grades, &roster.class_name, file_name, export_dir)?;
            println!("Exported to {}", path.display());
        }

        if let Some(sink) = sink.as_mut() {
            println!(
                "Focus the first grade field; typing {} grades in {} s...",
                grades.len(),
                config.entry_delay.as_secs()
            );
            std::thread::sleep(config.entry_delay);
            let values: Vec<i64> = grades.values().copied().collect();
            entry::enter_grades(sink.as_mut(), &values, cli.percent)?;
        }
    }

    info!(class = class_name, files = files.len(), "done");
    Ok(())
}
