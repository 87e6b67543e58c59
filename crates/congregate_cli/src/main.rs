mod commands;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use congregate_core::{init_logging_from_config, CoreConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "congregate")]
#[command(about = "Expand, lay out and store congregation calendar events")]
#[command(version)]
struct Cli {
    /// TOML file with expansion caps, day view hours and week start
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for rolling log files; logging is off when unset
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the instances a recurring event expands to
    Expand {
        /// JSON file holding one event
        event: PathBuf,
    },
    /// Print one day's agenda with column assignments
    Day {
        /// JSON file holding an array of events
        events: PathBuf,

        /// Date to show (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Reference instant for the now line (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        now: Option<String>,
    },
    /// Print the events visible on each day of a week
    Week {
        /// JSON file holding an array of events
        events: PathBuf,

        /// Any date inside the week (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },
    /// Store an event and its expanded instances
    Create {
        #[arg(long)]
        db: PathBuf,

        /// JSON file holding one event
        event: PathBuf,
    },
    /// Delete one occurrence, or the whole series with --series
    Delete {
        #[arg(long)]
        db: PathBuf,

        id: String,

        #[arg(long)]
        series: bool,
    },
    /// List stored events
    List {
        #[arg(long)]
        db: PathBuf,

        /// Only events visible on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Only events of this organization
        #[arg(long)]
        org: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Expand { event } => commands::expand(&config, &event),
        Commands::Day { events, date, now } => {
            commands::day(&config, &events, &date, now.as_deref())
        }
        Commands::Week { events, date } => commands::week(&config, &events, &date),
        Commands::Create { db, event } => commands::create(&config, &db, &event),
        Commands::Delete { db, id, series } => commands::delete(&db, &id, series),
        Commands::List { db, date, org } => commands::list(&db, date.as_deref(), org),
    }
}

fn load_config(cli: &Cli) -> Result<CoreConfig> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };

    if let Some(dir) = &cli.log_dir {
        let dir = std::path::absolute(dir)
            .with_context(|| format!("cannot resolve log directory {}", dir.display()))?;
        config.logging.dir = Some(dir);
    }
    init_logging_from_config(&config.logging)?;

    Ok(config)
}
