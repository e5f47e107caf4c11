use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use newsmon_core::{
    collect::Orchestrator,
    scheduler::Scheduler,
    storage::{Database, SettingsRepository},
    AppConfig,
};

/// Foreground daemon: start the scheduler and run until Ctrl+C.
pub async fn run(db: Database, config: Arc<AppConfig>) -> Result<()> {
    let interval = SettingsRepository::new(&db).schedule_interval().await?;

    let orchestrator = Arc::new(Orchestrator::new(db.clone(), &config)?);
    let scheduler = Scheduler::new(orchestrator);

    scheduler.start(interval);

    let status = scheduler.status();
    println!("newsmon daemon started.");
    if let Some(minutes) = status.interval_minutes {
        println!("  Collection interval: {} minutes", minutes);
    }
    if let Some(next) = status.next_run {
        println!("  Next run: {}", next.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    scheduler.stop();
    println!("Daemon stopped.");

    Ok(())
}
