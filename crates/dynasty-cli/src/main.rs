// Dynasty tracker command-line entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config (copying defaults on first run)
// 3. Initialize tracing (log to file, not terminal)
// 4. Open the configured storage backend
// 5. Run the requested command against the dynasty context

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use dynasty_core::config::{self, Config};
use dynasty_core::context::DynastyContext;
use dynasty_core::model::CoachProfile;
use dynasty_core::opponents::OpponentTracker;
use dynasty_core::users::head_to_head;

#[derive(Debug, Parser)]
#[command(name = "dynasty", version)]
#[command(about = "Track college football dynasties: schedules, rankings, records and rivals")]
struct Cli {
    /// Directory holding defaults/, config/ and logs/.
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List saved dynasties.
    List,
    /// Create a new dynasty and make it active.
    Create {
        #[arg(long)]
        coach: String,
        #[arg(long)]
        school: String,
        /// First season; defaults to `dynasty.default_start_year`.
        #[arg(long)]
        year: Option<u16>,
    },
    /// Load a saved dynasty into the live store.
    Switch { id: String },
    /// Delete a saved dynasty.
    Delete { id: String },
    /// Write a dynasty as JSON to a file, or stdout without `--out`.
    Export {
        id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a dynasty previously written by `export`.
    Import { file: PathBuf },
    /// Close out the active season and start the next one.
    AdvanceSeason,
    /// Head-to-head records against tracked opponents and users.
    Matchups,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(&cli.base_dir).context("failed to load configuration")?;
    init_tracing(&cli.base_dir, &config)?;
    info!("dynasty tracker starting: {:?}", cli.command);

    let storage = config
        .open_storage(&cli.base_dir)
        .context("failed to open storage")?;
    let mut ctx = DynastyContext::new(storage);

    let result = run(&mut ctx, &config, cli.command);
    if let Err(e) = &result {
        error!("command failed: {e:#}");
    }
    result
}

fn run(ctx: &mut DynastyContext, config: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List => {
            let active = ctx.manager().current_dynasty_id();
            let dynasties = ctx.manager().list_dynasties();
            if dynasties.is_empty() {
                println!("No dynasties yet. Create one with `dynasty create`.");
            }
            for d in dynasties {
                let marker = if active.as_deref() == Some(d.id.as_str()) { "*" } else { " " };
                let year = d.current_year.map_or_else(|| "-".to_string(), |y| y.to_string());
                let played = d
                    .last_played
                    .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
                println!(
                    "{marker} {:<15} {:<20} {:<20} {:>5}  last played {played}",
                    d.id, d.coach_name, d.school_name, year
                );
            }
        }
        Command::Create { coach, school, year } => {
            let year = year.unwrap_or(config.dynasty.default_start_year);
            let profile = CoachProfile {
                coach_name: coach,
                school_name: school,
                ..Default::default()
            };
            let summary = ctx.manager().create_dynasty(profile, year)?;
            ctx.open_dynasty(&summary.id)?;
            println!(
                "Created dynasty {} ({} at {}, {year})",
                summary.id, summary.coach_name, summary.school_name
            );
        }
        Command::Switch { id } => {
            ctx.open_dynasty(&id)
                .with_context(|| format!("failed to open dynasty {id}"))?;
            println!(
                "Active dynasty: {id} (season {}, week {})",
                ctx.current_year().map_or_else(|| "-".to_string(), |y| y.to_string()),
                ctx.active_week()
            );
        }
        Command::Delete { id } => {
            if !ctx.manager().delete_dynasty(&id)? {
                bail!("no dynasty with id {id}");
            }
            if ctx.dynasty_id() == Some(id.as_str()) {
                ctx.set_current_dynasty_id(None)?;
            }
            println!("Deleted dynasty {id}");
        }
        Command::Export { id, out } => {
            let json = ctx.manager().export_dynasty(&id)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Exported {id} to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let summary = ctx.manager().import_dynasty(&json)?;
            println!("Imported dynasty {} ({})", summary.id, summary.school_name);
        }
        Command::AdvanceSeason => {
            load_active(ctx)?;
            let next = ctx.prepare_next_season()?;
            println!("Advanced to the {next} season");
        }
        Command::Matchups => {
            load_active(ctx)?;
            print_matchups(ctx);
        }
    }
    Ok(())
}

/// Hydrate the context from `currentDynastyId`.
fn load_active(ctx: &mut DynastyContext) -> anyhow::Result<()> {
    let Some(id) = ctx.manager().current_dynasty_id() else {
        bail!("no active dynasty; run `dynasty switch <id>` first");
    };
    ctx.set_current_dynasty_id(Some(&id))
        .with_context(|| format!("failed to load dynasty {id}"))?;
    Ok(())
}

fn print_matchups(ctx: &DynastyContext) {
    let store = ctx.entity_store();
    let mut tracker = OpponentTracker::open(store.clone());

    println!("Opponents");
    let summaries = tracker.summaries();
    if summaries.is_empty() {
        println!("  (none tracked)");
    }
    for s in summaries {
        println!(
            "  {:<20} {:>3}-{}-{}  PF {:>4}  PA {:>4}",
            s.name, s.wins, s.losses, s.ties, s.points_for, s.points_against
        );
    }

    println!("Users");
    let records = head_to_head(&store.users(), &store.all_schedules());
    if records.is_empty() {
        println!("  (no games against users)");
    }
    for r in records {
        println!("  {:<20} {:>3}-{}-{}", r.name, r.wins, r.losses, r.ties);
    }
}

/// Initialize tracing to log to a file so command output stays clean.
fn init_tracing(base_dir: &Path, config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("dynasty.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
