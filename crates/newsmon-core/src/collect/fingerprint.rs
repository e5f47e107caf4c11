use sha2::{Digest, Sha256};

/// Compute the dedup fingerprint for an article.
///
/// Deterministic over lowercased, trimmed title + url, so re-collections of
/// an unchanged feed hash to the same key regardless of case or padding.
pub fn fingerprint(title: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.trim().to_lowercase().as_bytes());
    hasher.update(url.trim().to_lowercase().as_bytes());
    format!("{:x}", hasher.finalize())
}
