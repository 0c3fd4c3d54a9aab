use std::path::Path;

use shelf_core::sync::SyncOptions;
use shelf_core::{ConnectivityMonitor, ShelfConfig, TcpProbe};
use tokio::sync::broadcast::error::RecvError;

use crate::commands::common::{build_engine, describe_event};
use crate::error::CliError;

pub async fn run_watch(config: &ShelfConfig, db_path: &Path) -> Result<(), CliError> {
    let engine = build_engine(config, db_path, SyncOptions::from_config(config))?;
    let probe = TcpProbe::for_config(config)?;
    let mut events = engine.subscribe();

    let monitor = ConnectivityMonitor::start(
        probe,
        config.connectivity_interval(),
        config.connectivity_settle_checks,
    )
    .await;
    let connectivity = monitor.subscribe();

    println!("Watching {} (Ctrl-C to stop)", config.api_base_url);

    let report_events = async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = describe_event(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Dropped {missed} sync events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    tokio::select! {
        () = monitor.run() => {}
        () = engine.run(connectivity) => {}
        () = report_events => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            println!("Stopping");
        }
    }
    Ok(())
}
