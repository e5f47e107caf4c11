use anyhow::Result;

use newsmon_core::{
    ai::{OpenAiOracle, Oracle},
    model::ArticleFilter,
    storage::{ArticleRepository, Database, NewSummary, SettingsRepository, SummaryRepository},
    AppConfig,
};

pub async fn run(
    db: &Database,
    config: &AppConfig,
    category: Option<&str>,
    limit: i64,
) -> Result<()> {
    let Some(api_key) = config.ai.openai_api_key.as_deref() else {
        anyhow::bail!(
            "No OpenAI API key configured. Set ai.openai_api_key in {}",
            AppConfig::config_path().display()
        );
    };

    let settings = SettingsRepository::new(db);

    if let Some(category) = category {
        let known = settings.categories().await?;
        if !known.iter().any(|c| c == category) {
            anyhow::bail!(
                "Unknown category '{}' (configured: {})",
                category,
                known.join(", ")
            );
        }
    }

    let model = settings
        .llm_model()
        .await?
        .unwrap_or_else(|| config.ai.model.clone());
    let oracle = OpenAiOracle::new(api_key, &model);

    let filter = ArticleFilter {
        category: category.map(str::to_string),
        limit,
        ..Default::default()
    };
    let (articles, _) = ArticleRepository::new(db).list(&filter).await?;

    if articles.is_empty() {
        anyhow::bail!("No articles to summarize");
    }

    println!("Summarizing {} articles with {}...\n", articles.len(), model);
    let digest = oracle.summarize(&articles, category).await?;

    SummaryRepository::new(db)
        .insert(&NewSummary {
            article_ids: articles.iter().map(|a| a.id).collect(),
            summary_text: digest.clone(),
            category: category.unwrap_or("").to_string(),
        })
        .await?;

    println!("{}", digest);

    Ok(())
}

pub async fn history(db: &Database, limit: i64) -> Result<()> {
    let summaries = SummaryRepository::new(db).list(limit).await?;

    if summaries.is_empty() {
        println!("No summaries yet.");
        return Ok(());
    }

    println!("Summaries ({}):\n", summaries.len());

    for summary in &summaries {
        let category = if summary.category.is_empty() {
            String::new()
        } else {
            format!(" [{}]", summary.category)
        };

        println!(
            "  {}{} - {} articles on {}",
            summary.id,
            category,
            summary.article_ids.len(),
            summary.created_at.format("%Y-%m-%d %H:%M")
        );
        if let Some(first_line) = summary.summary_text.lines().find(|l| !l.trim().is_empty()) {
            println!("    {}", first_line.trim());
        }
        println!();
    }

    Ok(())
}
