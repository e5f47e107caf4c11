use crate::model::{NewArticle, RawArticle};

const MAX_DESCRIPTION_CHARS: usize = 1000;
const MAX_CONTENT_CHARS: usize = 10_000;
const MAX_AUTHOR_CHARS: usize = 200;

/// Truncate to at most `max_chars` characters, respecting char boundaries
pub(crate) fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Convert a raw per-source record into the canonical article shape.
///
/// Pure and deterministic: trims every string field, truncates description
/// / content / author to their storage bounds, and stamps the owning
/// source. Every collector runs its output through here; whether the
/// result is storable is decided by [`NewArticle::is_valid`].
pub fn normalize(raw: &RawArticle, source_id: i64) -> NewArticle {
    NewArticle {
        title: raw.title.trim().to_string(),
        description: truncate_chars(raw.description.trim(), MAX_DESCRIPTION_CHARS).to_string(),
        content: truncate_chars(raw.content.trim(), MAX_CONTENT_CHARS).to_string(),
        author: truncate_chars(raw.author.trim(), MAX_AUTHOR_CHARS).to_string(),
        url: raw.url.trim().to_string(),
        published_date: raw.published_date.trim().to_string(),
        source_id: Some(source_id),
        category: raw.category.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, url: &str) -> RawArticle {
        RawArticle {
            title: title.into(),
            url: url.into(),
            ..RawArticle::default()
        }
    }

    #[test]
    fn trims_and_stamps_source() {
        let mut input = raw("  Title  ", "  https://example.com/a  ");
        input.author = "  Jane Doe  ".into();
        let article = normalize(&input, 7);
        assert_eq!(article.title, "Title");
        assert_eq!(article.url, "https://example.com/a");
        assert_eq!(article.author, "Jane Doe");
        assert_eq!(article.source_id, Some(7));
    }

    #[test]
    fn truncates_to_storage_bounds() {
        let mut input = raw("t", "https://example.com");
        input.description = "d".repeat(1500);
        input.content = "c".repeat(20_000);
        input.author = "a".repeat(300);
        let article = normalize(&input, 1);
        assert_eq!(article.description.chars().count(), 1000);
        assert_eq!(article.content.chars().count(), 10_000);
        assert_eq!(article.author.chars().count(), 200);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut input = raw("t", "https://example.com");
        input.content = "é".repeat(10_050);
        let article = normalize(&input, 1);
        assert_eq!(article.content.chars().count(), 10_000);
    }

    #[test]
    fn empty_title_or_url_is_invalid() {
        assert!(!normalize(&raw("   ", "https://example.com"), 1).is_valid());
        assert!(!normalize(&raw("Title", "   "), 1).is_valid());
        assert!(normalize(&raw("Title", "https://example.com"), 1).is_valid());
    }

    #[test]
    fn category_passes_through() {
        let mut input = raw("t", "https://example.com");
        input.category = "AI/ML".into();
        assert_eq!(normalize(&input, 1).category, "AI/ML");
    }
}
