//! Export sink: renders article batches into files on disk.
//!
//! Three formats are supported. `notebooklm` is a grouped plain-text
//! digest suitable for upload into a notebook tool, `jsonl` is one JSON
//! object per line, and `urls` is a commented URL list for web-source
//! import.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::collect::truncate_chars;
use crate::model::Article;
use crate::{Error, Result};

const MAX_EXPORT_CONTENT_CHARS: usize = 2000;
const MAX_URL_TITLE_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    NotebookLm,
    Jsonl,
    Urls,
}

impl ExportFormat {
    pub fn tag(&self) -> &'static str {
        match self {
            ExportFormat::NotebookLm => "notebooklm",
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Urls => "urls",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "notebooklm" => Some(ExportFormat::NotebookLm),
            "jsonl" => Some(ExportFormat::Jsonl),
            "urls" => Some(ExportFormat::Urls),
            _ => None,
        }
    }
}

/// An export file present on disk
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub size: u64,
    pub created: DateTime<Utc>,
}

#[derive(Serialize)]
struct JsonlArticle<'a> {
    title: &'a str,
    description: &'a str,
    content: &'a str,
    author: &'a str,
    url: &'a str,
    published_date: &'a str,
    source: &'a str,
    category: &'a str,
    collected_at: String,
}

/// Writes export files into a single directory and manages them
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render `articles` into a timestamped file, returning its path
    pub fn export(&self, articles: &[Article], format: ExportFormat) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let (filename, body) = match format {
            ExportFormat::Jsonl => (format!("news_export_{stamp}.jsonl"), render_jsonl(articles)?),
            ExportFormat::NotebookLm => (
                format!("notebooklm_export_{stamp}.txt"),
                render_notebooklm(articles),
            ),
            ExportFormat::Urls => (format!("urls_export_{stamp}.txt"), render_urls(articles)),
        };

        let path = self.dir.join(filename);
        fs::write(&path, body)?;

        tracing::info!("Exported {} articles to {}", articles.len(), path.display());
        Ok(path)
    }

    /// List export files, newest first
    pub fn list(&self) -> Result<Vec<ExportFile>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            files.push(ExportFile {
                filename: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                created,
            });
        }
        files.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(files)
    }

    pub fn read(&self, filename: &str) -> Result<String> {
        let path = self.resolve(filename)?;
        if !path.exists() {
            return Err(Error::ExportNotFound(filename.to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }

    pub fn delete(&self, filename: &str) -> Result<bool> {
        let path = self.resolve(filename)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    // Filenames come from user input; anything that could escape the
    // export directory is rejected outright.
    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.contains("..") {
            return Err(Error::ExportNotFound(filename.to_string()));
        }
        Ok(self.dir.join(filename))
    }
}

fn render_jsonl(articles: &[Article]) -> Result<String> {
    let mut out = String::new();
    for article in articles {
        let record = JsonlArticle {
            title: &article.title,
            description: &article.description,
            content: &article.content,
            author: &article.author,
            url: &article.url,
            published_date: &article.published_date,
            source: article.source_name.as_deref().unwrap_or(""),
            category: &article.category,
            collected_at: article.collected_at.to_rfc3339(),
        };
        out.push_str(&serde_json::to_string(&record)?);
        out.push('\n');
    }
    Ok(out)
}

fn render_notebooklm(articles: &[Article]) -> String {
    let mut out = String::from(
        "# Tech News Collection for Analysis\n\n\
         This document contains curated tech news articles for analysis.\n\n\
         ## Analysis Instructions\n\
         Please analyze these articles focusing on:\n\
         - AI/ML developments\n\
         - Software development trends\n\
         - Cybersecurity news\n\
         - New technologies and breakthroughs\n\n\
         Provide insights on key trends, significant developments, and potential implications.\n\n\
         ---\n\n",
    );

    // Group by category, preserving first-seen order
    let mut groups: Vec<(&str, Vec<&Article>)> = Vec::new();
    for article in articles {
        let category = if article.category.is_empty() {
            "Uncategorized"
        } else {
            article.category.as_str()
        };
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, list)) => list.push(article),
            None => groups.push((category, vec![article])),
        }
    }

    for (category, group) in &groups {
        out.push_str(&format!("\n## {category}\n\n"));

        for (i, article) in group.iter().enumerate() {
            out.push_str(&format!("### {}. {}\n\n", i + 1, article.title));

            if let Some(source) = article.source_name.as_deref() {
                out.push_str(&format!("**Source:** {source}\n"));
            }
            if !article.published_date.is_empty() {
                out.push_str(&format!(
                    "**Date:** {}\n",
                    truncate_chars(&article.published_date, 10)
                ));
            }
            if !article.url.is_empty() {
                out.push_str(&format!("**URL:** {}\n", article.url));
            }
            out.push('\n');

            if !article.description.is_empty() {
                out.push_str(&article.description);
                out.push_str("\n\n");
            }

            // Full content only when it adds something over the description
            if !article.content.is_empty() && article.content.len() > article.description.len() {
                out.push_str(truncate_chars(&article.content, MAX_EXPORT_CONTENT_CHARS));
                out.push_str("\n\n");
            }

            out.push_str("---\n\n");
        }
    }

    out
}

fn render_urls(articles: &[Article]) -> String {
    let mut out = String::from(
        "# Article URLs for NotebookLM Import\n\n\
         # You can add these URLs directly to NotebookLM as web sources\n\n",
    );

    for article in articles {
        if !article.url.starts_with("http") {
            continue;
        }
        out.push_str(&format!(
            "# {}\n{}\n\n",
            truncate_chars(&article.title, MAX_URL_TITLE_CHARS),
            article.url
        ));
    }

    out
}
