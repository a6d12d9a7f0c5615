use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel filter value meaning "no filter".
pub const NO_FILTER: &str = "all";

/// Category assigned when the user leaves it blank.
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// Id prefix for remotely sourced quotes, so a merge can never collide a
/// remote record with a locally generated id.
pub const REMOTE_ID_PREFIX: &str = "remote-";

/// Quote model - the star of the show
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub id: String,
    pub text: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Quote {
    /// Whether this quote came in through a sync rather than user input.
    pub fn is_remote(&self) -> bool {
        self.id.starts_with(REMOTE_ID_PREFIX)
    }
}

/// Fields an edit may change; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct QuotePatch {
    pub text: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
}

impl QuotePatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.category.is_none() && self.author.is_none()
    }
}

/// Outcome of one sync tick. Transient; only feeds status output.
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Did the merged collection's size differ from before?
    pub changed: bool,
    /// How many usable records the remote returned.
    pub fetched: usize,
    /// How many local quotes were mirrored outward this tick.
    pub pushed: usize,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl SyncResult {
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            changed: false,
            fetched: 0,
            pushed: 0,
            error: Some(error.to_string()),
            checked_at: Utc::now(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Lowercase and trim a category label, falling back to the default when
/// nothing useful is left.
pub fn normalize_category(raw: &str) -> String {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        trimmed
    }
}

/// Seed set used when the store is empty or unreadable.
pub fn default_quotes() -> Vec<Quote> {
    vec![
        Quote {
            id: "seed-1".to_string(),
            text: "The only limit to our realization of tomorrow is our doubts of today."
                .to_string(),
            category: "inspiration".to_string(),
            author: None,
        },
        Quote {
            id: "seed-2".to_string(),
            text: "Simplicity is the soul of efficiency.".to_string(),
            category: "productivity".to_string(),
            author: None,
        },
        Quote {
            id: "seed-3".to_string(),
            text: "Write code as if the person who maintains it is a violent psychopath \
                   who knows where you live."
                .to_string(),
            category: "dev".to_string(),
            author: None,
        },
        Quote {
            id: "seed-4".to_string(),
            text: "Small daily improvements are the key to staggering long-term results."
                .to_string(),
            category: "habit".to_string(),
            author: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_normalization() {
        assert_eq!(normalize_category("  Dev "), "dev");
        assert_eq!(normalize_category("HABIT"), "habit");
        assert_eq!(normalize_category(""), DEFAULT_CATEGORY);
        assert_eq!(normalize_category("   "), DEFAULT_CATEGORY);
    }

    #[test]
    fn seed_set_has_four_distinct_quotes() {
        let seeds = default_quotes();
        assert_eq!(seeds.len(), 4);
        let mut ids: Vec<_> = seeds.iter().map(|q| q.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn remote_prefix_detection() {
        let remote = Quote {
            id: "remote-12".to_string(),
            text: "x".to_string(),
            category: "server".to_string(),
            author: None,
        };
        assert!(remote.is_remote());
        assert!(!default_quotes()[0].is_remote());
    }

    #[test]
    fn quote_omits_absent_author_when_serialized() {
        let quote = default_quotes().remove(0);
        let json = serde_json::to_string(&quote).unwrap();
        assert!(!json.contains("author"));

        // And older payloads without the field still parse
        let parsed: Quote = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, quote);
    }
}
