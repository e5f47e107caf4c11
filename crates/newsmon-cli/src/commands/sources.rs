use anyhow::Result;

use newsmon_core::{
    model::{NewSource, SourceKind, SourcePatch},
    storage::{Database, SourceRepository},
};

pub async fn add(
    db: &Database,
    name: &str,
    kind_tag: &str,
    url: &str,
    extra: Option<&str>,
) -> Result<()> {
    let Some(kind) = SourceKind::from_tag(kind_tag) else {
        anyhow::bail!(
            "Unknown source type '{}' (expected rss, reddit, or scraper)",
            kind_tag
        );
    };

    let mut new_source = NewSource::new(name, kind, url);
    if let Some(extra) = extra {
        new_source.config =
            serde_json::from_str(extra).map_err(|e| anyhow::anyhow!("Invalid --config JSON: {e}"))?;
    }

    let source = SourceRepository::new(db).create(&new_source).await?;
    println!("Added source: {} (id {})", source.name, source.id);

    Ok(())
}

pub async fn list(db: &Database, enabled_only: bool) -> Result<()> {
    let sources = SourceRepository::new(db).list(enabled_only).await?;

    if sources.is_empty() {
        println!("No sources configured.");
        println!("\nTo add a source, run:");
        println!("  newsmon sources add <name> <url> --type rss");
        return Ok(());
    }

    println!("Sources ({}):\n", sources.len());

    for source in &sources {
        let state = if source.enabled { "" } else { " [disabled]" };
        println!("  {} - {} ({}){}", source.id, source.name, source.kind, state);
        println!("    URL: {}", source.url);
        if let Some(last) = source.last_fetched {
            println!("    Last fetched: {}", last.format("%Y-%m-%d %H:%M"));
        }
        println!();
    }

    Ok(())
}

pub async fn set_enabled(db: &Database, id: i64, enabled: bool) -> Result<()> {
    let patch = SourcePatch {
        enabled: Some(enabled),
        ..Default::default()
    };
    let source = SourceRepository::new(db).update(id, &patch).await?;

    let verb = if enabled { "Enabled" } else { "Disabled" };
    println!("{} source: {}", verb, source.name);

    Ok(())
}

pub async fn remove(db: &Database, id: i64) -> Result<()> {
    let repo = SourceRepository::new(db);
    let source = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No source with id {}", id))?;

    repo.delete(id).await?;
    println!("Removed source: {}", source.name);

    Ok(())
}
