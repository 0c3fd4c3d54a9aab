use std::path::Path;

use crate::commands::common::{
    format_pending_lines, now_ms, open_store, write_to_item, PendingWriteItem,
};
use crate::error::CliError;

pub async fn run_pending(
    include_uploaded: bool,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let writes = if include_uploaded {
        store.list_writes().await?
    } else {
        store.list_pending().await?
    };

    if as_json {
        let json_items = writes
            .iter()
            .map(write_to_item)
            .collect::<Vec<PendingWriteItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if writes.is_empty() {
        println!("No pending writes.");
        return Ok(());
    }

    for line in format_pending_lines(&writes, now_ms()) {
        println!("{line}");
    }
    Ok(())
}
