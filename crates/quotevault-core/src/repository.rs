use crate::models::{default_quotes, normalize_category, Quote, QuotePatch, NO_FILTER};
use crate::{Error, Result};
use quotevault_store::{StringStore, KEY_FILTER, KEY_QUOTES};
use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// In-memory authoritative quote collection backed by a string store.
///
/// Every mutation persists immediately. When the persist fails the
/// in-memory change is kept and the storage error is handed back, so the
/// caller can warn about durability without losing the session's state.
pub struct QuoteRepository {
    quotes: Vec<Quote>,
    filter: String,
    store: Box<dyn StringStore>,
}

impl QuoteRepository {
    pub fn new(store: Box<dyn StringStore>) -> Self {
        Self {
            quotes: Vec::new(),
            filter: NO_FILTER.to_string(),
            store,
        }
    }

    /// Load the collection from the store, seeding the built-in defaults
    /// when nothing (or garbage) is there. Malformed data never escapes
    /// this boundary.
    pub fn load_or_seed(&mut self) -> Result<()> {
        match self.store.load(KEY_QUOTES)? {
            Some(raw) => match serde_json::from_str::<Vec<Quote>>(&raw) {
                Ok(saved) => {
                    debug!("Loaded {} quotes from store", saved.len());
                    self.quotes = saved;
                }
                Err(e) => {
                    warn!("Stored quotes unreadable ({}), reseeding defaults", e);
                    self.quotes = default_quotes();
                    self.persist()?;
                }
            },
            None => {
                info!("Empty store, seeding default quotes");
                self.quotes = default_quotes();
                self.persist()?;
            }
        }

        if let Some(saved_filter) = self.store.load(KEY_FILTER)? {
            self.filter = saved_filter;
        }

        Ok(())
    }

    /// All quotes, or only those in the given category. Insertion order.
    pub fn list(&self, filter: Option<&str>) -> Vec<Quote> {
        match filter {
            None => self.quotes.clone(),
            Some(f) if f == NO_FILTER => self.quotes.clone(),
            Some(f) => self
                .quotes
                .iter()
                .filter(|q| q.category == f)
                .cloned()
                .collect(),
        }
    }

    /// Uniform choice over the filtered list; `None` when nothing matches.
    pub fn pick_random(&self, filter: Option<&str>) -> Option<Quote> {
        let pool = self.list(filter);
        if pool.is_empty() {
            return None;
        }
        let idx = rand::rng().random_range(0..pool.len());
        Some(pool[idx].clone())
    }

    /// Add a user-entered quote. Text must survive trimming; the category
    /// is normalized; a fresh id is generated.
    pub fn add(&mut self, text: &str, category: &str, author: Option<&str>) -> Result<Quote> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("quote text must not be empty".into()));
        }

        let quote = Quote {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            category: normalize_category(category),
            author: clean_author(author),
        };

        self.quotes.push(quote.clone());
        self.persist()?;
        Ok(quote)
    }

    /// Append pre-shaped quotes (import path), skipping ids already present.
    /// Persists once; returns how many were actually admitted.
    pub fn extend(&mut self, incoming: Vec<Quote>) -> Result<usize> {
        let before = self.quotes.len();
        for quote in incoming {
            if self.quotes.iter().any(|q| q.id == quote.id) {
                debug!("Skipping quote with duplicate id {}", quote.id);
                continue;
            }
            self.quotes.push(quote);
        }
        let admitted = self.quotes.len() - before;
        if admitted > 0 {
            self.persist()?;
        }
        Ok(admitted)
    }

    /// Apply a patch to an existing quote. Validation happens before any
    /// field changes, so a bad patch leaves the quote untouched.
    pub fn edit(&mut self, id: &str, patch: QuotePatch) -> Result<Quote> {
        let idx = self
            .quotes
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let new_text = match &patch.text {
            Some(t) => {
                let t = t.trim();
                if t.is_empty() {
                    return Err(Error::Validation("quote text must not be empty".into()));
                }
                Some(t.to_string())
            }
            None => None,
        };

        let quote = &mut self.quotes[idx];
        if let Some(t) = new_text {
            quote.text = t;
        }
        if let Some(c) = &patch.category {
            quote.category = normalize_category(c);
        }
        if let Some(a) = &patch.author {
            quote.author = clean_author(Some(a));
        }

        let updated = quote.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Remove a quote by id, returning the removed record.
    pub fn delete(&mut self, id: &str) -> Result<Quote> {
        let idx = self
            .quotes
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let removed = self.quotes.remove(idx);
        self.persist()?;
        Ok(removed)
    }

    /// Distinct categories currently present, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut cats: Vec<String> = self.quotes.iter().map(|q| q.category.clone()).collect();
        cats.sort_unstable();
        cats.dedup();
        cats
    }

    /// Swap in a whole new collection (merge path) and persist it.
    pub fn replace_all(&mut self, quotes: Vec<Quote>) -> Result<()> {
        self.quotes = quotes;
        self.persist()
    }

    /// Last-selected category filter ("all" means none).
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Persist a new filter selection.
    pub fn set_filter(&mut self, value: &str) -> Result<()> {
        let value = if value.trim().is_empty() {
            NO_FILTER.to_string()
        } else {
            value.trim().to_lowercase()
        };
        self.filter = value;
        self.store.save(KEY_FILTER, &self.filter)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    fn persist(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.quotes)?;
        self.store.save(KEY_QUOTES, &raw)?;
        Ok(())
    }
}

fn clean_author(author: Option<&str>) -> Option<String> {
    author
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotevault_store::{MemoryStore, StoreError};
    use std::sync::{Arc, Mutex};

    fn fresh_repo() -> QuoteRepository {
        let mut repo = QuoteRepository::new(Box::new(MemoryStore::new()));
        repo.load_or_seed().unwrap();
        repo
    }

    /// MemoryStore behind an Arc so a test can reopen "the same disk".
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<MemoryStore>>);

    impl StringStore for SharedStore {
        fn load(&self, key: &str) -> quotevault_store::Result<Option<String>> {
            self.0.lock().unwrap().load(key)
        }
        fn save(&mut self, key: &str, value: &str) -> quotevault_store::Result<()> {
            self.0.lock().unwrap().save(key, value)
        }
    }

    mockall::mock! {
        FlakyStore {}
        impl StringStore for FlakyStore {
            fn load(&self, key: &str) -> quotevault_store::Result<Option<String>>;
            fn save(&mut self, key: &str, value: &str) -> quotevault_store::Result<()>;
        }
    }

    #[test]
    fn empty_store_seeds_four_defaults() {
        let repo = fresh_repo();
        assert_eq!(repo.len(), 4);
        assert_eq!(
            repo.categories(),
            vec!["dev", "habit", "inspiration", "productivity"]
        );
    }

    #[test]
    fn malformed_store_is_replaced_by_defaults() {
        let mut store = MemoryStore::new();
        store
            .save(quotevault_store::KEY_QUOTES, "not json at all {")
            .unwrap();

        let mut repo = QuoteRepository::new(Box::new(store));
        repo.load_or_seed().unwrap();
        assert_eq!(repo.len(), 4);
    }

    #[test]
    fn collection_round_trips_through_store() {
        let shared = SharedStore::default();

        let mut repo = QuoteRepository::new(Box::new(shared.clone()));
        repo.load_or_seed().unwrap();
        repo.add("Ship it.", "dev", Some("anon")).unwrap();
        let saved = repo.list(None);

        let mut reopened = QuoteRepository::new(Box::new(shared));
        reopened.load_or_seed().unwrap();
        assert_eq!(reopened.list(None), saved);
    }

    #[test]
    fn add_then_delete_restores_prior_collection() {
        let mut repo = fresh_repo();
        let before = repo.list(None);

        let added = repo.add("Focus wins.", "discipline", None).unwrap();
        assert_eq!(repo.len(), 5);
        assert_eq!(repo.list(None)[4].category, "discipline");

        let filtered = repo.list(Some("discipline"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, added.id);

        repo.delete(&added.id).unwrap();
        assert_eq!(repo.list(None), before);
    }

    #[test]
    fn add_rejects_blank_text() {
        let mut repo = fresh_repo();
        let err = repo.add("   ", "dev", None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(repo.len(), 4);
    }

    #[test]
    fn add_normalizes_category_and_author() {
        let mut repo = fresh_repo();
        let q = repo.add("  trimmed  ", "  DEV ", Some("  ")).unwrap();
        assert_eq!(q.text, "trimmed");
        assert_eq!(q.category, "dev");
        assert_eq!(q.author, None);

        let q = repo.add("attributed", "", Some(" Ada ")).unwrap();
        assert_eq!(q.category, "uncategorized");
        assert_eq!(q.author, Some("Ada".to_string()));
    }

    #[test]
    fn pick_random_honors_filter() {
        let mut repo = fresh_repo();
        repo.add("one", "solo", None).unwrap();

        // Uniform choice over a single-element pool is deterministic
        for _ in 0..20 {
            let picked = repo.pick_random(Some("solo")).unwrap();
            assert_eq!(picked.category, "solo");
        }
        // Every unfiltered pick comes from the collection
        for _ in 0..20 {
            let picked = repo.pick_random(None).unwrap();
            assert!(repo.list(None).contains(&picked));
        }
    }

    #[test]
    fn pick_random_on_empty_pool_is_none() {
        let repo = fresh_repo();
        assert_eq!(repo.pick_random(Some("no-such-category")), None);

        let mut empty = QuoteRepository::new(Box::new(MemoryStore::new()));
        empty.replace_all(Vec::new()).unwrap();
        assert_eq!(empty.pick_random(None), None);
    }

    #[test]
    fn edit_patches_fields_and_validates() {
        let mut repo = fresh_repo();
        let id = repo.list(None)[0].id.clone();

        let updated = repo
            .edit(
                &id,
                QuotePatch {
                    text: Some("Rewritten.".into()),
                    category: Some("Edited".into()),
                    author: Some("Someone".into()),
                },
            )
            .unwrap();
        assert_eq!(updated.text, "Rewritten.");
        assert_eq!(updated.category, "edited");
        assert_eq!(updated.author, Some("Someone".to_string()));

        // Blank text aborts without touching the quote
        let err = repo
            .edit(
                &id,
                QuotePatch {
                    text: Some("  ".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(repo.list(None)[0].text, "Rewritten.");
    }

    #[test]
    fn edit_and_delete_unknown_id_report_not_found() {
        let mut repo = fresh_repo();
        assert!(matches!(
            repo.edit("nope", QuotePatch::default()),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(repo.delete("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn extend_skips_duplicate_ids() {
        let mut repo = fresh_repo();
        let existing = repo.list(None)[0].clone();
        let fresh = Quote {
            id: "imported-1".into(),
            text: "New.".into(),
            category: "imported".into(),
            author: None,
        };

        let admitted = repo.extend(vec![existing, fresh]).unwrap();
        assert_eq!(admitted, 1);
        assert_eq!(repo.len(), 5);
    }

    #[test]
    fn filter_state_survives_reload() {
        let shared = SharedStore::default();

        let mut repo = QuoteRepository::new(Box::new(shared.clone()));
        repo.load_or_seed().unwrap();
        assert_eq!(repo.filter(), "all");
        repo.set_filter("Dev").unwrap();

        let mut reopened = QuoteRepository::new(Box::new(shared));
        reopened.load_or_seed().unwrap();
        assert_eq!(reopened.filter(), "dev");
    }

    #[test]
    fn storage_failure_keeps_in_memory_mutation() {
        let mut store = MockFlakyStore::new();
        store.expect_load().returning(|_| Ok(None));
        // Seeding write works, everything after hits "quota"
        store
            .expect_save()
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_save()
            .returning(|_, _| Err(StoreError::WriteFailed("quota exceeded".into())));

        let mut repo = QuoteRepository::new(Box::new(store));
        repo.load_or_seed().unwrap();

        let err = repo.add("kept in memory", "dev", None).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        // The mutation is not rolled back; this session still sees it
        assert_eq!(repo.len(), 5);
        assert!(repo.list(None).iter().any(|q| q.text == "kept in memory"));
    }
}
