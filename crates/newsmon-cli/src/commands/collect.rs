use anyhow::Result;

use newsmon_core::{
    collect::Orchestrator,
    storage::{Database, SourceRepository},
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig, source_id: Option<i64>) -> Result<()> {
    let orchestrator = Orchestrator::new(db.clone(), config)?;

    match source_id {
        Some(id) => {
            let source = SourceRepository::new(db)
                .find_by_id(id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No source with id {}", id))?;

            println!("Collecting from '{}'...", source.name);
            let collected = orchestrator.collect_source(&source).await?;
            println!("{} new articles.", collected);
        }
        None => {
            println!("Collecting from all enabled sources...\n");
            let result = orchestrator.collect_all().await?;

            for report in &result.results {
                println!("  {:<32} {:>4} new", report.source, report.collected);
            }

            println!(
                "\nCollection complete. {} new articles from {} sources.",
                result.total_collected, result.sources_processed
            );
        }
    }

    Ok(())
}
