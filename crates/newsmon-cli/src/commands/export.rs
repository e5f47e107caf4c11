use anyhow::Result;

use newsmon_core::{
    export::{ExportFormat, Exporter},
    model::ArticleFilter,
    storage::{ArticleRepository, Database, ExportRepository},
    AppConfig,
};

pub async fn create(
    db: &Database,
    config: &AppConfig,
    format_tag: &str,
    ids: &[i64],
    unexported_only: bool,
    limit: i64,
    mark: bool,
) -> Result<()> {
    let Some(format) = ExportFormat::from_tag(format_tag) else {
        anyhow::bail!(
            "Unknown export format '{}' (expected notebooklm, jsonl, or urls)",
            format_tag
        );
    };

    let repo = ArticleRepository::new(db);
    let articles = if ids.is_empty() {
        let filter = ArticleFilter {
            exported: unexported_only.then_some(false),
            limit,
            ..Default::default()
        };
        repo.list(&filter).await?.0
    } else {
        repo.list_by_ids(ids).await?
    };

    if articles.is_empty() {
        anyhow::bail!("No articles found to export");
    }

    let exporter = Exporter::new(config.export_dir())?;
    let path = exporter.export(&articles, format)?;

    if mark {
        let article_ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
        repo.mark_exported(&article_ids).await?;
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ExportRepository::new(db)
        .insert(articles.len() as i64, &filename, format.tag())
        .await?;

    println!("Exported {} articles to {}", articles.len(), path.display());

    Ok(())
}

pub async fn list(db: &Database, config: &AppConfig) -> Result<()> {
    let exporter = Exporter::new(config.export_dir())?;
    let files = exporter.list()?;

    if files.is_empty() {
        println!("No export files.");
    } else {
        println!("Export files in {}:\n", exporter.dir().display());
        for file in &files {
            println!(
                "  {} ({} bytes, {})",
                file.filename,
                file.size,
                file.created.format("%Y-%m-%d %H:%M")
            );
        }
    }

    let history = ExportRepository::new(db).list(20).await?;
    if !history.is_empty() {
        println!("\nRecent exports:\n");
        for record in &history {
            println!(
                "  {} - {} articles ({}) on {}",
                record.filename,
                record.articles_count,
                record.export_type,
                record.export_date.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

pub async fn show(config: &AppConfig, filename: &str) -> Result<()> {
    let exporter = Exporter::new(config.export_dir())?;
    print!("{}", exporter.read(filename)?);
    Ok(())
}

pub async fn delete(config: &AppConfig, filename: &str) -> Result<()> {
    let exporter = Exporter::new(config.export_dir())?;
    if exporter.delete(filename)? {
        println!("Deleted {}", filename);
    } else {
        println!("No export file named {}", filename);
    }
    Ok(())
}
