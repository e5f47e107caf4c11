use anyhow::Result;

use newsmon_core::{
    model::ArticleFilter,
    storage::{ArticleRepository, Database},
};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    db: &Database,
    category: Option<String>,
    search: Option<String>,
    source_id: Option<i64>,
    unexported: bool,
    limit: i64,
    offset: i64,
) -> Result<()> {
    let filter = ArticleFilter {
        category,
        search,
        source_id,
        exported: unexported.then_some(false),
        limit,
        offset,
    };

    let (articles, total) = ArticleRepository::new(db).list(&filter).await?;

    if articles.is_empty() {
        println!("No articles found.");
        return Ok(());
    }

    println!("Articles {}-{} of {}:\n", offset + 1, offset + articles.len() as i64, total);

    for article in &articles {
        let category = if article.category.is_empty() {
            String::new()
        } else {
            format!(" [{}]", article.category)
        };
        let exported = if article.exported { " (exported)" } else { "" };
        let source = article.source_name.as_deref().unwrap_or("unknown source");

        println!("  {}{}{} - {}", article.id, category, exported, article.title);
        println!("    {} | {}", source, article.url);
        println!();
    }

    Ok(())
}
