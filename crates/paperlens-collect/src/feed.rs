//! Atom feed parsing for arXiv query responses.

use feed_rs::model::Entry;
use paperlens_core::{Error, PaperMetadata, Result};
use tracing::warn;

pub const SOURCE: &str = "arxiv";

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Last path segment of an entry id (`http://arxiv.org/abs/2401.00001v1`).
fn paper_id(entry_id: &str) -> Option<&str> {
    entry_id
        .trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
}

fn parse_entry(entry: &Entry, category: &str) -> Option<PaperMetadata> {
    let Some(id) = paper_id(&entry.id) else {
        warn!("Skipping entry without id");
        return None;
    };
    let title = entry.title.as_ref().map(|t| squash(&t.content))?;
    if title.is_empty() {
        warn!("Skipping entry {} without title", id);
        return None;
    }

    let pdf_url = entry
        .links
        .iter()
        .find(|link| link.media_type.as_deref() == Some("application/pdf"))
        .map(|link| link.href.clone());

    Some(PaperMetadata {
        paper_id: id.to_string(),
        title,
        abstract_text: entry
            .summary
            .as_ref()
            .map(|s| squash(&s.content))
            .unwrap_or_default(),
        authors: entry.authors.iter().map(|a| squash(&a.name)).collect(),
        published: entry.published.map(|dt| dt.to_rfc3339()),
        category: category.to_string(),
        pdf_url,
        source: SOURCE.to_string(),
    })
}

/// Parse one page of query results. Entries missing an id or title are
/// skipped.
pub fn parse_feed(bytes: &[u8], category: &str) -> Result<Vec<PaperMetadata>> {
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|e| Error::MalformedResponse(format!("Failed to parse Atom feed: {}", e)))?;
    Ok(feed
        .entries
        .iter()
        .filter_map(|entry| parse_entry(entry, category))
        .collect())
}
