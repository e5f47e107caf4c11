use anyhow::Result;

use newsmon_core::storage::{ArticleRepository, Database};

pub async fn run(db: &Database) -> Result<()> {
    let stats = ArticleRepository::new(db).stats().await?;

    println!("Articles:  {} ({} exported)", stats.total_articles, stats.exported_articles);
    println!("Sources:   {} active", stats.active_sources);
    println!("Summaries: {}", stats.total_summaries);

    if !stats.by_category.is_empty() {
        println!("\nBy category:");
        for (category, count) in &stats.by_category {
            let label = if category.is_empty() { "(uncategorized)" } else { category };
            println!("  {:<24} {}", label, count);
        }
    }

    if !stats.articles_by_day.is_empty() {
        println!("\nLast days:");
        for (day, count) in &stats.articles_by_day {
            println!("  {} {}", day, count);
        }
    }

    Ok(())
}
