use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::board::TaskBoard;
use crate::cli::commands::DataCommands;
use crate::error::TaskboardError;
use crate::output;
use crate::store::KeyValueStore;

pub fn run<S: KeyValueStore>(
    board: &mut TaskBoard<S>,
    cmd: DataCommands,
    json_output: bool,
) -> Result<(), TaskboardError> {
    match cmd {
        DataCommands::Export { out, stdout } => run_export(board, out.as_deref(), stdout, json_output),
        DataCommands::Import { file } => run_import(board, &file, json_output),
        DataCommands::Clear => {
            board.store_mut().clear()?;
            board.reload();
            print_message("All data cleared successfully", json!({}), json_output);
            Ok(())
        }
        DataCommands::Restore => {
            let backup = board.store_mut().restore_from_latest_backup()?;
            board.reload();
            print_message(
                "Data restored from latest backup",
                json!({ "backup": backup, "tasks": board.tasks().len() }),
                json_output,
            );
            Ok(())
        }
        DataCommands::Reset => {
            board.store_mut().reset_to_defaults()?;
            board.reload();
            print_message(
                "Reset to default tasks.",
                json!({ "tasks": board.tasks().len() }),
                json_output,
            );
            Ok(())
        }
        DataCommands::Info => {
            let store = board.store();
            let info = store.storage_info();
            let data_size = store.data_size();
            if json_output {
                println!(
                    "{}",
                    output::json::render(&output::json::success(output::json::storage_json(
                        &info, &data_size
                    )))
                );
            } else {
                output::text::print_storage_info(&info, &data_size);
            }
            Ok(())
        }
    }
}

fn run_export<S: KeyValueStore>(
    board: &TaskBoard<S>,
    out: Option<&Path>,
    stdout: bool,
    json_output: bool,
) -> Result<(), TaskboardError> {
    let snapshot = board.store().export_snapshot()?;
    if stdout {
        println!("{}", snapshot.contents);
        return Ok(());
    }

    let dir = out.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| TaskboardError::storage(e.to_string()))?;
    let path = dir.join(&snapshot.file_name);
    fs::write(&path, &snapshot.contents).map_err(|e| {
        TaskboardError::storage(format!("Failed to write {}: {e}", path.display()))
    })?;
    print_message(
        "Data exported successfully",
        json!({ "file": path.to_string_lossy(), "bytes": snapshot.contents.len() }),
        json_output,
    );
    Ok(())
}

fn run_import<S: KeyValueStore>(
    board: &mut TaskBoard<S>,
    file: &Path,
    json_output: bool,
) -> Result<(), TaskboardError> {
    let contents = fs::read_to_string(file).map_err(|e| {
        TaskboardError::validation(format!("Error reading file {}: {e}", file.display()))
    })?;
    board.store_mut().import_snapshot(&contents)?;
    board.reload();
    print_message(
        "Data imported successfully",
        json!({ "tasks": board.tasks().len() }),
        json_output,
    );
    Ok(())
}

fn print_message(message: &str, mut data: Value, json_output: bool) {
    if json_output {
        data["message"] = json!(message);
        println!("{}", output::json::render(&output::json::success(data)));
    } else {
        println!("{message}");
    }
}
