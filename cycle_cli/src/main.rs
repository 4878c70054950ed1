use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use cycle_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Menstrual cycle tracker and predictor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read and write this user's entries
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a period
    Log {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Flow intensity (light, medium, heavy)
        #[arg(long, default_value = "medium")]
        flow: Flow,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Edit a logged period
    Edit {
        id: String,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long, conflicts_with = "clear_end")]
        end: Option<NaiveDate>,

        /// Remove the end date (single-day period)
        #[arg(long)]
        clear_end: bool,

        #[arg(long)]
        flow: Option<Flow>,

        /// Replace notes (empty string clears them)
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a logged period
    Delete { id: String },

    /// List logged periods, newest first
    History,

    /// Show cycle averages and predictions (default)
    Stats,

    /// Classify a single day
    Day {
        /// Date to classify (YYYY-MM-DD), defaults to today
        date: Option<NaiveDate>,
    },

    /// Show a month calendar
    Calendar {
        #[arg(long)]
        year: Option<i32>,

        /// Month number (1-12)
        #[arg(long)]
        month: Option<u32>,
    },

    /// Show reminders due today
    Remind {
        /// Pretend today is this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Override the configured reminder lead time
        #[arg(long)]
        days_before: Option<u32>,

        /// Scheduled delivery: stay silent unless notifications are enabled
        #[arg(long)]
        notify: bool,
    },

    /// Export history to CSV
    Export { path: PathBuf },

    /// Import history from CSV, skipping ids already stored
    Import { path: PathBuf },

    /// Show or change settings
    Settings {
        /// Days before the predicted period to remind
        #[arg(long)]
        reminder_days: Option<u32>,

        /// Enable or disable reminders (on, off)
        #[arg(long)]
        notifications: Option<Toggle>,
    },
}

#[derive(Clone, Copy)]
struct Toggle(bool);

impl std::str::FromStr for Toggle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on" | "true" | "yes" => Ok(Toggle(true)),
            "off" | "false" | "no" => Ok(Toggle(false)),
            other => Err(format!("expected on or off, got '{}'", other)),
        }
    }
}

fn main() -> Result<()> {
    // Keep stdout for command output
    cycle_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let user = cli.user.clone().or_else(|| config.data.user.clone());
    let mut store = JsonFileStore::for_user(&data_dir, user.as_deref());
    tracing::debug!("Using entries file {:?}", store.path());

    match cli.command {
        Some(Commands::Log {
            start,
            end,
            flow,
            notes,
        }) => cmd_log(&mut store, start, end, flow, notes),
        Some(Commands::Edit {
            id,
            start,
            end,
            clear_end,
            flow,
            notes,
        }) => {
            let patch = PeriodPatch {
                start_date: start,
                end_date: if clear_end { Some(None) } else { end.map(Some) },
                flow,
                notes: notes.map(|n| Some(n).filter(|n| !n.trim().is_empty())),
            };
            cmd_edit(&mut store, &id, patch)
        }
        Some(Commands::Delete { id }) => cmd_delete(&mut store, &id),
        Some(Commands::History) => cmd_history(&store),
        Some(Commands::Stats) | None => cmd_stats(&store),
        Some(Commands::Day { date }) => cmd_day(&store, date.unwrap_or_else(today)),
        Some(Commands::Calendar { year, month }) => {
            let now = today();
            cmd_calendar(
                &store,
                year.unwrap_or(now.year()),
                month.unwrap_or(now.month()),
            )
        }
        Some(Commands::Remind {
            today: on,
            days_before,
            notify,
        }) => {
            if notify && !config.reminders.enabled {
                tracing::debug!("Notifications disabled, skipping scheduled reminders");
                return Ok(());
            }
            cmd_remind(
                &store,
                on.unwrap_or_else(today),
                days_before.unwrap_or(config.reminders.days_before),
            )
        }
        Some(Commands::Export { path }) => cmd_export(&store, &path),
        Some(Commands::Import { path }) => cmd_import(&mut store, &path),
        Some(Commands::Settings {
            reminder_days,
            notifications,
        }) => cmd_settings(config, reminder_days, notifications.map(|t| t.0)),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn cmd_log(
    store: &mut JsonFileStore,
    start: NaiveDate,
    end: Option<NaiveDate>,
    flow: Flow,
    notes: Option<String>,
) -> Result<()> {
    let entry = PeriodEntry::new(start, end, flow, notes.filter(|n| !n.trim().is_empty()));
    let id = entry.id.clone();
    store.add(entry)?;
    tracing::debug!("Logged period {}", id);

    println!("✓ Period logged ({})", id);
    print_prediction(&compute_cycle_data(&store.load()?));
    Ok(())
}

fn cmd_edit(store: &mut JsonFileStore, id: &str, patch: PeriodPatch) -> Result<()> {
    if patch.is_empty() {
        tracing::debug!("Empty patch for {}, nothing written", id);
        println!("Nothing to change.");
        return Ok(());
    }
    if !store.update(id, &patch)? {
        return Err(Error::EntryNotFound(id.to_string()));
    }
    println!("✓ Period {} updated", id);
    Ok(())
}

fn cmd_delete(store: &mut JsonFileStore, id: &str) -> Result<()> {
    if !store.delete(id)? {
        return Err(Error::EntryNotFound(id.to_string()));
    }
    println!("✓ Period {} deleted", id);
    Ok(())
}

fn cmd_history(store: &JsonFileStore) -> Result<()> {
    let entries = store.load()?;
    if entries.is_empty() {
        println!("No periods logged yet. Start tracking to see your history!");
        return Ok(());
    }

    for entry in cycle_core::store::history(&entries) {
        let range = match entry.end_date {
            Some(end) => format!("{} - {}", entry.start_date, end),
            None => entry.start_date.to_string(),
        };
        println!("{:<25} {:<7} {}", range, entry.flow, entry.id);
        if let Some(ref notes) = entry.notes {
            println!("    {}", notes);
        }
    }
    Ok(())
}

fn cmd_stats(store: &JsonFileStore) -> Result<()> {
    let entries = store.load()?;
    let cycle = compute_cycle_data(&entries);

    println!("Average cycle:   {} days", cycle.average_cycle_length);
    println!("Average period:  {} days", cycle.average_period_duration);
    println!("Next period:     {}", describe_date(cycle.next_predicted_period));
    println!("Next ovulation:  {}", describe_date(cycle.next_predicted_ovulation));
    println!("Logged periods:  {}", entries.len());
    Ok(())
}

fn cmd_day(store: &JsonFileStore, date: NaiveDate) -> Result<()> {
    let entries = store.load()?;
    let cycle = compute_cycle_data(&entries);
    let info = classify_day(date, &entries, &cycle);

    println!("{}", info.date.format("%A, %B %-d, %Y"));
    let mut labels = Vec::new();
    if info.is_period {
        labels.push(match info.flow {
            Some(flow) => format!("period ({} flow)", flow),
            None => "period".to_string(),
        });
    }
    if info.is_predicted_period {
        labels.push("predicted period".to_string());
    }
    if info.is_ovulation {
        labels.push("predicted ovulation".to_string());
    }
    if info.is_fertile {
        labels.push("fertile window".to_string());
    }

    if labels.is_empty() {
        println!("  nothing notable");
    } else {
        for label in labels {
            println!("  • {}", label);
        }
    }
    Ok(())
}

fn cmd_calendar(store: &JsonFileStore, year: i32, month: u32) -> Result<()> {
    let entries = store.load()?;
    let cycle = compute_cycle_data(&entries);
    let days = classify_grid(year, month, &entries, &cycle)?;
    tracing::debug!("Classified {} cells for {}-{:02}", days.len(), year, month);

    let title = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_default();
    println!("{:^35}", title);
    println!("  Sun  Mon  Tue  Wed  Thu  Fri  Sat");

    for week in days.chunks(7) {
        let row: String = week
            .iter()
            .map(|info| {
                if info.date.month() == month {
                    format!(" {:>3}{}", info.date.day(), marker(info))
                } else {
                    "     ".to_string()
                }
            })
            .collect();
        println!("{}", row.trim_end());
    }

    println!();
    println!("  * period   o ovulation   + fertile   ~ predicted period");
    Ok(())
}

/// Single-character marker; period wins over ovulation over fertile over predicted
fn marker(info: &DayInfo) -> char {
    if info.is_period {
        '*'
    } else if info.is_ovulation {
        'o'
    } else if info.is_fertile {
        '+'
    } else if info.is_predicted_period {
        '~'
    } else {
        ' '
    }
}

fn cmd_remind(store: &JsonFileStore, today: NaiveDate, days_before: u32) -> Result<()> {
    let entries = store.load()?;
    let cycle = compute_cycle_data(&entries);
    let reminders = upcoming_reminders(&cycle, today, days_before);
    tracing::debug!(
        "{} reminder(s) for {} with {} day lead time",
        reminders.len(),
        today,
        days_before
    );

    if reminders.is_empty() {
        println!("No reminders for {}", today);
    }
    for reminder in reminders {
        println!("🔔 {}", reminder);
    }
    Ok(())
}

fn cmd_export(store: &JsonFileStore, path: &std::path::Path) -> Result<()> {
    let entries = store.load()?;
    let count = export_csv(&entries, path)?;
    println!("✓ Exported {} periods to {}", count, path.display());
    Ok(())
}

fn cmd_import(store: &mut JsonFileStore, path: &std::path::Path) -> Result<()> {
    let incoming = import_csv(path)?;
    let read = incoming.len();

    let _lock = store.lock_for_write()?;
    let (merged, added) = merge_entries(store.load()?, incoming);
    if added > 0 {
        store.save(&merged)?;
    }
    tracing::debug!("Import read {} rows, {} new", read, added);
    println!("✓ Imported {} new periods from {}", added, path.display());
    Ok(())
}

fn cmd_settings(
    mut config: Config,
    reminder_days: Option<u32>,
    notifications: Option<bool>,
) -> Result<()> {
    let changed = reminder_days.is_some() || notifications.is_some();
    if let Some(days) = reminder_days {
        config.reminders.days_before = days;
    }
    if let Some(enabled) = notifications {
        config.reminders.enabled = enabled;
    }
    if changed {
        tracing::debug!("Saving settings: {:?}", config.reminders);
        config.save()?;
        println!("✓ Settings saved to {}", Config::default_config_path().display());
    }

    println!("Data directory:  {}", config.data.data_dir.display());
    println!("Reminder days:   {}", config.reminders.days_before);
    println!(
        "Notifications:   {}",
        if config.reminders.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn print_prediction(cycle: &CycleData) {
    println!("  Next period:    {}", describe_date(cycle.next_predicted_period));
    println!("  Next ovulation: {}", describe_date(cycle.next_predicted_ovulation));
}

fn describe_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => "Not enough data".to_string(),
    }
}
