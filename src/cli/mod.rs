pub mod commands;
pub mod data;
pub mod shell;
pub mod status;
pub mod task;

pub use commands::*;

use std::path::Path;

use crate::board::{SessionSignal, TaskBoard};
use crate::config::{self, Config};
use crate::error::TaskboardError;
use crate::output;
use crate::store::{DurableStore, KeyValueStore, SqliteKv};

/// Open the board stored under the resolved data directory.
pub fn open_board(data_dir: Option<&Path>) -> Result<TaskBoard<SqliteKv>, TaskboardError> {
    let dir = config::data_dir(data_dir);
    let config = Config::load(&dir)?;
    let kv = SqliteKv::open(&config::db_path(&dir), config.quota_bytes)?;
    let store = DurableStore::new(kv, &config);
    Ok(TaskBoard::new(store, &config))
}

/// Entry point for one invocation. Returns the process exit code.
pub fn run(cli: Cli) -> i32 {
    let json_output = cli.json;
    let result = match cli.command {
        Commands::Shell => shell::run(cli.data_dir.as_deref(), json_output),
        command => open_board(cli.data_dir.as_deref()).and_then(|mut board| {
            let result = execute(&mut board, command, json_output);
            if result.is_ok() && board.scheduler().is_pending() {
                board.on_signal(SessionSignal::Unload);
            }
            result
        }),
    };
    report(result, json_output)
}

/// Run a single command against an open board.
pub fn execute<S: KeyValueStore>(
    board: &mut TaskBoard<S>,
    command: Commands,
    json_output: bool,
) -> Result<(), TaskboardError> {
    match command {
        Commands::Add { title, description, priority, status, due } => {
            task::run_add(board, title, description, &priority, status.as_deref(), due.as_deref(), json_output)
        }
        Commands::List {
            archived,
            all,
            search,
            priorities,
            due,
        } => {
            let args = task::ListArgs {
                archived,
                all,
                search,
                priorities,
                due,
            };
            task::run_list(board, args, json_output)
        }
        Commands::Show { id } => task::run_show(board, &id, json_output),
        Commands::Update {
            id,
            title,
            description,
            clear_description,
            priority,
            status,
            due,
            clear_due,
        } => {
            let args = task::UpdateArgs {
                title,
                description,
                clear_description,
                priority,
                status,
                due,
                clear_due,
            };
            task::run_update(board, &id, args, json_output)
        }
        Commands::Move { id, status } => task::run_move(board, &id, &status, json_output),
        Commands::Delete { id } => task::run_delete(board, &id, json_output),
        Commands::Archive { ids } => task::run_archive(board, &ids, json_output),
        Commands::Status => status::run(board, json_output),
        Commands::Data(cmd) => data::run(board, cmd, json_output),
        Commands::Shell => Err(TaskboardError::validation(
            "shell cannot be started from inside a shell",
        )),
    }
}

/// Print the failure, if any, in the requested format and map to an exit code.
pub fn report(result: Result<(), TaskboardError>, json_output: bool) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            if json_output {
                println!("{}", output::json::render(&output::json::error(&e)));
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}
