//! AutoCraft - headless dry run
//!
//! Runs the crafting engine against a captured inventory snapshot and records
//! the input it would send instead of sending it.
//!
//! # Execution Flow
//!
//! 1. Load `AutoCraft Data/AutoCraft Settings.yaml` (defaults when missing)
//! 2. Initialize logging -> logs/autocraft.<date>
//! 3. Load `AutoCraft Data/Inventory Snapshot.yaml`
//! 4. Log the planned work queue and the Waystone scores
//! 5. Run one crafting routine with a recording input driver
//! 6. Log the recorded input and the metrics summary
//!
//! With nothing reacting to the clicks, the second queue build sees the same
//! items and the run ends as stalled after one cycle.

use anyhow::Result;
use autocraft::config::DATA_DIR;
use autocraft::host::{RecordingInput, StaticSnapshot};
use autocraft::logging::{LOG_DIR, setup_logging};
use autocraft::services::WorkQueue;
use autocraft::{
    APP_NAME, ConfigManager, CraftingContext, CraftingController, StateManager, VERSION,
};

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(DATA_DIR)?;
    let settings = config_manager.load_settings()?;

    let _guard = setup_logging(LOG_DIR, "autocraft", settings.debug_enabled, true)?;

    tracing::info!("Starting {} v{} (dry run)", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("autocraft-worker")
        .build()?;

    let snapshot = match config_manager.load_snapshot()? {
        Some(file) => StaticSnapshot::from_file(file),
        None => {
            tracing::warn!(
                "No snapshot at {}, running against an empty inventory",
                config_manager.snapshot_path()
            );
            StaticSnapshot::new(Vec::new(), Vec::new())
        }
    };

    let state_manager = StateManager::with_settings(settings);
    let ctx = CraftingContext::new(snapshot, RecordingInput::new(), state_manager);
    let controller = CraftingController::new(ctx.clone(), runtime.handle().clone());

    match WorkQueue::build(ctx.provider.as_ref(), &ctx.state.settings()) {
        Ok(queue) => {
            tracing::info!("Planned {} applications", queue.len());
            for item in queue.items() {
                tracing::info!(
                    "  {} -> {} at {}",
                    item.currency.display_name(),
                    item.source.display_label(),
                    item.target
                );
            }
        }
        Err(e) => tracing::warn!("Could not plan: {}", e),
    }

    for (position, score) in controller.score_inventory() {
        if score > 0 {
            tracing::info!("Score {} at {}", score, position);
        }
    }

    if !controller.start() {
        tracing::warn!("Crafting did not start");
    }

    let outcome = runtime.block_on(controller.wait());

    match &outcome {
        Some(outcome) if outcome.is_success() => {
            tracing::info!("Dry run finished: {:?}", outcome)
        }
        Some(outcome) => tracing::error!("Dry run failed: {:?}", outcome),
        None => tracing::info!("Nothing was run"),
    }

    let recorded = ctx.with_input(|input| input.events().len());
    tracing::info!(
        "Recorded {} input commands; {}",
        recorded,
        ctx.state.read(|state| state.status_summary())
    );

    ctx.metrics.log_summary();

    drop(controller);
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Shutdown complete");

    match outcome {
        Some(outcome) if !outcome.is_success() => {
            anyhow::bail!("crafting run ended as {}", outcome.label())
        }
        _ => Ok(()),
    }
}
