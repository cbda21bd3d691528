//! `roombook` CLI — book rooms for classes on a recurring weekly pattern.
//!
//! ## Usage
//!
//! ```sh
//! # Book R1 for class C1 on Mondays and Wednesdays, 09:00-10:00
//! roombook create --room R1 --class C1 --from 2024-03-04 --to 2024-06-28 \
//!     --days mon,wed --start 09:00 --end 10:00
//!
//! # Show which dates would conflict, without booking anything
//! roombook preview --room R2 --class C1 --from 2024-03-04 --to 2024-06-28 \
//!     --days mon --start 09:30 --end 10:30
//!
//! # List occurrences, or the series they form
//! roombook list --room R1
//! roombook list --class C1 --series
//!
//! # Move a series to a new slot
//! roombook edit --old-start 09:00 --old-end 10:00 --room R1 --class C1 \
//!     --from 2024-03-04 --to 2024-06-28 --days mon,wed --start 10:00 --end 11:00
//!
//! # Delete a whole series
//! roombook delete --room R1 --class C1 --start 10:00 --end 11:00
//! ```
//!
//! Occurrences live in a JSON file (`--store`, default `roombook.json`). Runs that
//! write to the same file wait for each other on `<store>.lock`.
//! Operating hours and slot size come from an optional TOML file (`--config`).

mod config;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use roombook_engine::{
    generate_occurrences, GroupKey, JsonFileStore, OccurrenceFilter, Pattern, SchedulingService,
    TimeOfDay, TimeRange, WeekdaySet,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "roombook", version, about = "Recurring room booking administration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file with [rules] and [store] sections
    #[arg(long, global = true, env = "ROOMBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Occurrence store file (overrides the config file)
    #[arg(long, global = true, env = "ROOMBOOK_STORE")]
    store: Option<PathBuf>,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct PatternArgs {
    /// Room id
    #[arg(long)]
    room: String,
    /// Class id
    #[arg(long)]
    class: String,
    /// First date of the range (YYYY-MM-DD, inclusive)
    #[arg(long)]
    from: NaiveDate,
    /// Last date of the range (YYYY-MM-DD, inclusive)
    #[arg(long)]
    to: NaiveDate,
    /// Comma-separated weekdays (e.g. "mon,wed,fri")
    #[arg(long)]
    days: WeekdaySet,
    /// Start time (HH:MM)
    #[arg(long)]
    start: TimeOfDay,
    /// End time (HH:MM)
    #[arg(long)]
    end: TimeOfDay,
}

impl PatternArgs {
    fn to_pattern(&self) -> Pattern {
        Pattern {
            room_id: self.room.clone(),
            class_id: self.class.clone(),
            date_start: self.from,
            date_end: self.to,
            weekdays: self.days,
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Args)]
struct KeyArgs {
    /// Room id
    #[arg(long)]
    room: String,
    /// Class id
    #[arg(long)]
    class: String,
    /// Start time of the series (HH:MM)
    #[arg(long)]
    start: TimeOfDay,
    /// End time of the series (HH:MM)
    #[arg(long)]
    end: TimeOfDay,
}

#[derive(Subcommand)]
enum Commands {
    /// Book a recurring series; fails without booking anything on any conflict
    Create {
        #[command(flatten)]
        pattern: PatternArgs,
        /// Validate and print the occurrences without booking them
        #[arg(long)]
        dry_run: bool,
    },
    /// List every date of a pattern that would conflict
    Preview {
        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// List stored occurrences
    List {
        #[arg(long)]
        room: Option<String>,
        #[arg(long)]
        class: Option<String>,
        /// Only this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only dates on or after this one
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Only dates on or before this one
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Group occurrences into series instead of listing them
        #[arg(long)]
        series: bool,
    },
    /// Delete every occurrence of a series
    Delete {
        #[command(flatten)]
        key: KeyArgs,
    },
    /// Replace a series with a new pattern (delete and re-create atomically)
    Edit {
        /// Room of the series being replaced (defaults to --room)
        #[arg(long)]
        old_room: Option<String>,
        /// Class of the series being replaced (defaults to --class)
        #[arg(long)]
        old_class: Option<String>,
        /// Start time of the series being replaced
        #[arg(long)]
        old_start: TimeOfDay,
        /// End time of the series being replaced
        #[arg(long)]
        old_end: TimeOfDay,
        #[command(flatten)]
        pattern: PatternArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = CliConfig::load(cli.config.as_deref())?;
    let store_path = cli.store.clone().unwrap_or_else(|| config.store.path.clone());
    let store = JsonFileStore::open(&store_path)
        .with_context(|| format!("Failed to open store: {}", store_path.display()))?;
    let service = SchedulingService::new(store, config.rules)?;

    match cli.command {
        Commands::Create { pattern, dry_run } => {
            let pattern = pattern.to_pattern();
            if dry_run {
                let conflicts = service.preview_conflicts(&pattern)?;
                if let Some(first) = conflicts.first() {
                    anyhow::bail!(
                        "{} of the requested dates conflict, first: {}",
                        conflicts.len(),
                        first
                    );
                }
                print_json(&generate_occurrences(&pattern)?)?;
            } else {
                let created = service
                    .create_series(&pattern)
                    .context("Failed to create series")?;
                info!(count = created.len(), "booked");
                print_json(&created)?;
            }
        }
        Commands::Preview { pattern } => {
            let conflicts = service.preview_conflicts(&pattern.to_pattern())?;
            print_json(&conflicts)?;
        }
        Commands::List {
            room,
            class,
            date,
            from,
            to,
            series,
        } => {
            let filter = OccurrenceFilter {
                room_id: room,
                class_id: class,
                date,
                from,
                to,
            };
            if series {
                print_json(&service.list_series(&filter)?)?;
            } else {
                print_json(&service.list_occurrences(&filter)?)?;
            }
        }
        Commands::Delete { key } => {
            let key = GroupKey::new(key.room, key.class, TimeRange::new(key.start, key.end));
            let deleted = service
                .delete_series(&key)
                .context("Failed to delete series")?;
            print_json(&serde_json::json!({ "deleted": deleted }))?;
        }
        Commands::Edit {
            old_room,
            old_class,
            old_start,
            old_end,
            pattern,
        } => {
            let key = GroupKey::new(
                old_room.unwrap_or_else(|| pattern.room.clone()),
                old_class.unwrap_or_else(|| pattern.class.clone()),
                TimeRange::new(old_start, old_end),
            );
            let created = service
                .replace_series(&key, &pattern.to_pattern())
                .context("Failed to edit series")?;
            print_json(&created)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
