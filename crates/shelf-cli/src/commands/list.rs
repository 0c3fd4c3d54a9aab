use std::path::Path;

use shelf_core::reconcile::filter_favorites;
use shelf_core::sync::SyncOptions;
use shelf_core::{ListedProduct, ShelfConfig};

use crate::cli::ListArgs;
use crate::commands::common::{
    build_engine, favorites_as_listed, format_product_lines, load_catalog_view, open_store,
    parse_type_selection, product_to_list_item, ProductListItem,
};
use crate::error::CliError;

pub async fn run_list(
    args: &ListArgs,
    config: &ShelfConfig,
    db_path: &Path,
) -> Result<(), CliError> {
    let products = select_products(args, config, db_path).await?;

    if args.json {
        let json_items = products
            .iter()
            .map(product_to_list_item)
            .collect::<Vec<ProductListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if products.is_empty() {
        println!("No products.");
        return Ok(());
    }

    for line in format_product_lines(&products) {
        println!("{line}");
    }
    Ok(())
}

async fn select_products(
    args: &ListArgs,
    config: &ShelfConfig,
    db_path: &Path,
) -> Result<Vec<ListedProduct>, CliError> {
    let search = args.search.as_deref().unwrap_or_default();
    let selected_types = parse_type_selection(&args.types);

    if args.favorites {
        let favorites = open_store(db_path)?.list_favorites().await?;
        return Ok(favorites_as_listed(filter_favorites(
            &favorites,
            search,
            &selected_types,
        )));
    }

    let engine = build_engine(config, db_path, SyncOptions::from_config(config))?;
    let view = load_catalog_view(&engine).await?;
    Ok(view.filtered(search, &selected_types))
}

pub async fn run_types(config: &ShelfConfig, db_path: &Path) -> Result<(), CliError> {
    let engine = build_engine(config, db_path, SyncOptions::from_config(config))?;
    let view = load_catalog_view(&engine).await?;

    if view.product_types().is_empty() {
        println!("No product types.");
    }
    for product_type in view.product_types() {
        println!("{product_type}");
    }
    Ok(())
}
