use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use planner::model::{CalendarView, CategoryKind, Priority, RecurrenceKind, Theme, TimeFormat, WeekStart};
use planner::query::{TaskSort, TaskView};
use planner::transfer::DocumentFormat;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "planner", version, about = "Terminal calendar and task planner")]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Less log output (-q warn, -qq error)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
    /// Use this data directory instead of .planner/ or the per-user one
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a .planner data directory in the current directory
    Init,
    /// Manage calendar events
    #[command(subcommand)]
    Event(EventCommand),
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Print a month, week or day view
    Calendar {
        /// month, week or day (defaults to the configured view)
        #[arg(long)]
        view: Option<CalendarView>,
        /// Anchor date in YYYY.MM.DD format (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Write every event, task, category and the settings to a backup file
    Export {
        /// Output file (defaults to calendar-backup-YYYY-MM-DD.<format>)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// json or yaml
        #[arg(long, default_value = "json")]
        format: DocumentFormat,
    },
    /// Replace data with the contents of a backup file
    Import {
        /// Backup file; .yml/.yaml files are read as YAML
        file: PathBuf,
    },
    /// Launch the interactive TUI
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Add an event
    Add(EventFields),
    /// List events
    List {
        /// Only events touching this day (YYYY.MM.DD)
        #[arg(long)]
        date: Option<String>,
        /// Only events in this category (id or prefix)
        #[arg(long)]
        category: Option<String>,
        /// Only events whose title or description contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Edit an event
    Edit {
        /// Event id or unique prefix
        id: String,
        #[command(flatten)]
        fields: EventEdit,
    },
    /// Delete an event
    Rm {
        /// Event id or unique prefix
        id: String,
    },
    /// Events starting within the next seven days
    Upcoming,
}

#[derive(Args, Debug)]
pub struct EventFields {
    /// Title of the event
    pub title: String,
    /// Start in YYYY.MM.DD@hh:mm format
    #[arg(long)]
    pub start: String,
    /// End in YYYY.MM.DD@hh:mm format (defaults to start plus the default duration)
    #[arg(long)]
    pub end: Option<String>,
    /// Optional description
    #[arg(long)]
    pub description: Option<String>,
    /// Category id or prefix (defaults to the first event category)
    #[arg(long)]
    pub category: Option<String>,
    /// Color as #rrggbb (defaults to the category color)
    #[arg(long)]
    pub color: Option<String>,
    /// Store a repetition pattern: daily, weekly, monthly or yearly
    #[arg(long)]
    pub repeat: Option<RecurrenceKind>,
    /// Repeat every N periods
    #[arg(long, default_value_t = 1)]
    pub interval: u32,
    /// Last date of the repetition (YYYY.MM.DD)
    #[arg(long)]
    pub until: Option<String>,
}

#[derive(Args, Debug)]
pub struct EventEdit {
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New start (YYYY.MM.DD@hh:mm)
    #[arg(long)]
    pub start: Option<String>,
    /// New end (YYYY.MM.DD@hh:mm)
    #[arg(long)]
    pub end: Option<String>,
    /// New description
    #[arg(long)]
    pub description: Option<String>,
    /// Clear the description
    #[arg(long)]
    pub clear_description: bool,
    /// New category id or prefix
    #[arg(long)]
    pub category: Option<String>,
    /// New color
    #[arg(long)]
    pub color: Option<String>,
    /// Set a repetition pattern
    #[arg(long)]
    pub repeat: Option<RecurrenceKind>,
    /// Repeat every N periods (with --repeat)
    #[arg(long, default_value_t = 1)]
    pub interval: u32,
    /// Last date of the repetition (YYYY.MM.DD); kept from the current pattern when omitted
    #[arg(long)]
    pub until: Option<String>,
    /// Remove the repetition pattern
    #[arg(long, conflicts_with_all = ["repeat", "until"])]
    pub clear_repeat: bool,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task
    Add {
        /// Title of the task
        title: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
        /// Due date in YYYY.MM.DD@hh:mm or YYYY.MM.DD format
        #[arg(long)]
        due: Option<String>,
        /// low, medium or high
        #[arg(long, short, default_value = "medium")]
        priority: Priority,
        /// Category id or prefix (defaults to the first task category)
        #[arg(long)]
        category: Option<String>,
        /// Color as #rrggbb (defaults to the category color)
        #[arg(long)]
        color: Option<String>,
    },
    /// List tasks
    List {
        /// all, pending, completed, today or overdue
        #[arg(long, default_value = "all")]
        view: TaskView,
        /// due, priority or created
        #[arg(long, default_value = "due")]
        sort: TaskSort,
        /// Only tasks with this priority
        #[arg(long)]
        priority: Option<Priority>,
        /// Only tasks in this category (id or prefix)
        #[arg(long)]
        category: Option<String>,
        /// Only tasks whose title or description contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Edit a task
    Edit {
        /// Task id or unique prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// Clear the description
        #[arg(long)]
        clear_description: bool,
        /// Set due date (YYYY.MM.DD@hh:mm)
        #[arg(long)]
        due: Option<String>,
        /// Clear due date
        #[arg(long)]
        clear_due: bool,
        /// New priority
        #[arg(long, short)]
        priority: Option<Priority>,
        /// New category id or prefix
        #[arg(long)]
        category: Option<String>,
        /// New color
        #[arg(long)]
        color: Option<String>,
    },
    /// Toggle a task between done and not done
    Done {
        /// Task id or unique prefix
        id: String,
    },
    /// Delete a task
    Rm {
        /// Task id or unique prefix
        id: String,
    },
    /// Completion counts
    Stats,
    /// Open tasks due within the next seven days
    Upcoming,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// Add a category
    Add {
        /// Category name
        name: String,
        /// Color as #rrggbb (defaults to the first palette color)
        #[arg(long)]
        color: Option<String>,
        /// event, task or both
        #[arg(long, default_value = "both")]
        kind: CategoryKind,
    },
    /// List categories with how many items use them
    List,
    /// Edit a category
    Edit {
        /// Category id or unique prefix
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        kind: Option<CategoryKind>,
    },
    /// Delete a category; items using it become uncategorized
    Rm {
        /// Category id or unique prefix
        id: String,
        /// Delete even when events or tasks still use it
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the current settings
    Show,
    /// Change one or more settings
    Set {
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        default_view: Option<CalendarView>,
        /// sunday/0 or monday/1
        #[arg(long)]
        week_starts_on: Option<WeekStart>,
        /// 12h or 24h
        #[arg(long)]
        time_format: Option<TimeFormat>,
        /// Default event length in minutes
        #[arg(long)]
        default_event_duration: Option<i64>,
        #[arg(long)]
        show_weekends: Option<bool>,
    },
}

fn filter_for(verbose: u8, quiet: u8) -> &'static str {
    if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    }
}

/// Logs to stderr. `RUST_LOG` overrides the level picked by -v/-q.
pub fn init_tracing(verbose: u8, quiet: u8) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_for(verbose, quiet)))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

/// The TUI owns the terminal, so its logs go to `planner.log` in the data directory.
pub fn init_file_tracing(verbose: u8, quiet: u8, dir: &Path) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_for(verbose, quiet)))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;
    std::fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("planner.log"))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
