use std::path::Path;

use shelf_core::sync::SyncOptions;
use shelf_core::{ProductPayload, ShelfConfig};

use crate::cli::AddArgs;
use crate::commands::common::build_engine;
use crate::error::CliError;

pub async fn run_add(
    args: &AddArgs,
    config: &ShelfConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let mut payload = ProductPayload::new(&args.name, &args.product_type, args.price, args.tax)?;
    if let Some(image_path) = &args.image {
        payload = payload.with_image(read_image(image_path)?);
    }

    let engine = build_engine(config, db_path, SyncOptions::from_config(config))?;
    engine.set_online(!args.offline);
    let submission = engine.add_product(payload).await?;
    let write = &submission.write;

    if submission.is_accepted() {
        println!("Added '{}' ({})", write.payload.name, write.id);
    } else if let Some(error) = submission.failure() {
        println!(
            "Queued '{}' ({}); upload failed: {error}",
            write.payload.name, write.id
        );
    } else {
        println!("Queued '{}' ({}) for upload", write.payload.name, write.id);
    }
    Ok(())
}

pub fn read_image(path: &Path) -> Result<Vec<u8>, CliError> {
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(CliError::EmptyImage(path.display().to_string()));
    }
    Ok(bytes)
}
