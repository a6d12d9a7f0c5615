use crate::models::{normalize_category, Quote};
use crate::repository::QuoteRepository;
use crate::{Error, Result};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// What an import actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub admitted: usize,
    pub skipped: usize,
}

/// Pretty-printed JSON of the full collection.
pub fn export_json(repo: &QuoteRepository) -> Result<String> {
    let quotes = repo.list(None);
    Ok(serde_json::to_string_pretty(&quotes)?)
}

pub fn export_to_file<P: AsRef<Path>>(repo: &QuoteRepository, path: P) -> Result<()> {
    let json = export_json(repo)?;
    std::fs::write(path.as_ref(), json)?;
    info!("Exported {} quotes to {}", repo.len(), path.as_ref().display());
    Ok(())
}

/// Import a JSON array of quote-shaped objects.
///
/// The top level must be an array or the whole import is rejected with
/// zero records admitted. Within the array, records lacking usable text
/// are silently dropped, and records matching an existing quote's
/// text+author pair are skipped as duplicates. One persist at the end.
pub fn import_str(repo: &mut QuoteRepository, raw: &str) -> Result<ImportReport> {
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|e| Error::Import(format!("file is not valid JSON: {}", e)))?;

    let records = parsed
        .as_array()
        .ok_or_else(|| Error::Import("expected a JSON array of quote objects".into()))?;

    let existing = repo.list(None);
    let mut seen: Vec<(String, Option<String>)> = existing
        .iter()
        .map(|q| (q.text.clone(), q.author.clone()))
        .collect();

    let mut incoming = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(quote) = sanitize_record(record) else {
            skipped += 1;
            continue;
        };

        let key = (quote.text.clone(), quote.author.clone());
        if seen.contains(&key) {
            debug!("Skipping duplicate of '{}'", quote.text);
            skipped += 1;
            continue;
        }
        seen.push(key);
        incoming.push(quote);
    }

    let admitted = repo.extend(incoming)?;
    info!("Imported {} quotes ({} skipped)", admitted, skipped);
    Ok(ImportReport { admitted, skipped })
}

pub fn import_file<P: AsRef<Path>>(repo: &mut QuoteRepository, path: P) -> Result<ImportReport> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    import_str(repo, &raw)
}

/// One record from an import file, or `None` when it is unusable.
fn sanitize_record(record: &Value) -> Option<Quote> {
    let obj = record.as_object()?;
    let text = obj.get("text")?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }

    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let author = obj
        .get("author")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);
    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Some(Quote {
        id,
        text: text.to_string(),
        category: normalize_category(category),
        author,
    })
}
