use serde_json::json;

use crate::board::{dashboard, TaskBoard};
use crate::error::TaskboardError;
use crate::models::now_millis;
use crate::output;
use crate::store::KeyValueStore;

pub fn run<S: KeyValueStore>(board: &TaskBoard<S>, json_output: bool) -> Result<(), TaskboardError> {
    let by_status = board.status_counts();
    let by_priority = board.priority_counts();
    let summary = dashboard(board.tasks(), now_millis());
    let store = board.store();
    let info = store.storage_info();
    let data_size = store.data_size();

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "counts": output::json::counts_json(&by_status, &by_priority),
                "dashboard": output::json::dashboard_json(&summary),
                "storage": output::json::storage_json(&info, &data_size)
            })))
        );
    } else {
        output::text::print_counts(&by_status, &by_priority);
        println!();
        output::text::print_dashboard(&summary);
        println!();
        output::text::print_storage_info(&info, &data_size);
    }
    Ok(())
}
