use crate::models::Quote;

/// Ephemeral per-session state: the last quote shown and a view counter.
/// Lives and dies with the process; deliberately not persisted.
#[derive(Debug, Default)]
pub struct SessionCache {
    last_viewed: Option<Quote>,
    views: usize,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember_viewed(&mut self, quote: &Quote) {
        self.last_viewed = Some(quote.clone());
        self.views += 1;
    }

    pub fn last_viewed(&self) -> Option<&Quote> {
        self.last_viewed.as_ref()
    }

    pub fn views(&self) -> usize {
        self.views
    }
}
