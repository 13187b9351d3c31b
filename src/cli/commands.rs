use std::path::PathBuf;

use clap::{Parser, Subcommand};

const VERSION: &str = env!("TASKBOARD_VERSION");

#[derive(Parser)]
#[command(
    name = "taskboard",
    version = VERSION,
    about = "Local kanban task board",
    after_help = "\
NOTE:
  Data lives in <data-dir>/taskboard.db (default ./.taskboard, or $TASKBOARD_DIR).
  Optional settings are read from <data-dir>/config.json.
  On first run the board starts with a set of example tasks.

STATUSES:
  \"To Do\", \"In Progress\", \"Done\", \"Archived\"
  Case and separators are ignored: todo, in-progress, IN_PROGRESS all work.

PERSISTENCE:
  Every change is saved immediately and also snapshotted as a backup
  (the newest 10 are kept). If the store is full or unwritable, changes are
  kept in memory for the rest of the session and the command still succeeds.

EXIT CODES:
  0  Success
  1  Error (validation, storage, missing backup, etc.)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding the task store
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a task to the front of the board
    Add {
        /// Task title
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Low, Medium or High
        #[arg(long, default_value = "Medium")]
        priority: String,
        /// Initial status (defaults to To Do)
        #[arg(long)]
        status: Option<String>,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,
    },
    /// List tasks (archived tasks are hidden unless requested)
    List {
        /// Show only archived tasks
        #[arg(long)]
        archived: bool,
        /// Show every task including archived ones
        #[arg(long, conflicts_with = "archived")]
        all: bool,
        /// Only tasks whose title or description contains this text
        #[arg(long)]
        search: Option<String>,
        /// Only tasks with this priority (repeatable)
        #[arg(long = "priority", value_name = "PRIORITY")]
        priorities: Vec<String>,
        /// overdue, today, thisWeek or noDueDate
        #[arg(long, value_name = "FILTER")]
        due: Option<String>,
    },
    /// Show task details
    Show {
        id: String,
    },
    /// Change task fields
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
    },
    /// Move a task to another column
    Move {
        id: String,
        /// Target status
        status: String,
    },
    /// Delete a task permanently
    Delete {
        id: String,
    },
    /// Archive one or more tasks (unknown IDs are ignored)
    Archive {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Show task counts, overdue and upcoming tasks, and storage usage
    Status,
    /// Backup, export and recovery
    #[command(subcommand)]
    Data(DataCommands),
    /// Interactive session reading commands from stdin
    #[command(after_help = "\
NOTE:
  Each line is a command without the `taskboard` prefix, e.g. `add \"Buy milk\"`.
  `quit`, `exit` or end of input ends the session and forces a final save.")]
    Shell,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DataCommands {
    /// Write the stored tasks to todo-app-data-<date>.json
    Export {
        /// Directory to write into (defaults to the current directory)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Print the payload instead of writing a file
        #[arg(long, conflicts_with = "out")]
        stdout: bool,
    },
    /// Replace the stored tasks with the contents of a JSON file
    Import {
        file: PathBuf,
    },
    /// Delete all tasks and backups
    Clear,
    /// Restore the tasks from the newest backup
    Restore,
    /// Delete everything so the example tasks come back
    Reset,
    /// Show storage size, backup count and fallback state
    Info,
}

/// One line of an interactive session.
#[derive(Parser, Debug)]
#[command(name = "taskboard", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true)]
    pub json: bool,
}
