// Remote fetch-and-merge cycle plus its timer
use crate::models::{Quote, SyncResult, REMOTE_ID_PREFIX};
use crate::repository::QuoteRepository;
use chrono::Utc;
use quotevault_remote::{RemoteClient, RemotePost};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Map one remote record into the quote shape.
///
/// Fixed rule: the post title becomes the text, the category is the
/// literal "server", and the id carries the remote-origin prefix.
pub fn map_remote(post: &RemotePost) -> Quote {
    Quote {
        id: format!("{}{}", REMOTE_ID_PREFIX, post.id),
        text: post.title.trim().to_string(),
        category: "server".to_string(),
        author: None,
    }
}

/// Reconcile a remote snapshot into the local collection.
///
/// Remote records are authoritative by id: every local quote whose id
/// appears remotely is dropped, then the whole remote set is appended.
/// Purely local quotes survive untouched. Idempotent for a fixed snapshot.
pub fn merge(local: &[Quote], remote: &[Quote]) -> Vec<Quote> {
    let remote_ids: HashSet<&str> = remote.iter().map(|q| q.id.as_str()).collect();

    let mut merged: Vec<Quote> = local
        .iter()
        .filter(|q| !remote_ids.contains(q.id.as_str()))
        .cloned()
        .collect();
    merged.extend(remote.iter().cloned());
    merged
}

/// Periodic fetch-and-merge against the remote endpoint.
pub struct Syncer {
    repo: Arc<Mutex<QuoteRepository>>,
    client: RemoteClient,
    fetch_limit: usize,
    mirror_writes: bool,
    mirrored: HashSet<String>,
}

impl Syncer {
    pub fn new(repo: Arc<Mutex<QuoteRepository>>, client: RemoteClient) -> Self {
        Self {
            repo,
            client,
            fetch_limit: 10,
            mirror_writes: false,
            mirrored: HashSet::new(),
        }
    }

    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit;
        self
    }

    pub fn with_mirror_writes(mut self, mirror: bool) -> Self {
        self.mirror_writes = mirror;
        self
    }

    /// Fetch the remote collection and map it into quote shape, dropping
    /// records whose text does not survive trimming.
    ///
    /// This is the hard-failure path: transport and decode trouble comes
    /// back as an error for callers who want one. `sync_once` wraps it
    /// into a status instead.
    pub async fn fetch_remote(&self) -> crate::Result<Vec<Quote>> {
        let posts = self.client.fetch_posts(Some(self.fetch_limit)).await?;
        let remote: Vec<Quote> = posts
            .iter()
            .map(map_remote)
            .filter(|q| !q.text.is_empty())
            .collect();
        debug!("Mapped {} usable remote quotes", remote.len());
        Ok(remote)
    }

    /// One full sync cycle: fetch, map, merge, persist.
    ///
    /// Failures never escape as errors; the caller only ever sees a
    /// SyncResult, and a failed fetch leaves the repository untouched.
    pub async fn sync_once(&mut self) -> SyncResult {
        let remote = match self.fetch_remote().await {
            Ok(remote) => remote,
            Err(e) => {
                warn!("Remote fetch failed: {}", e);
                return SyncResult::failed(e);
            }
        };

        // Merge and persist under one lock acquisition so no user mutation
        // can interleave with the replace.
        let (changed, persist_error, mirror_candidates) = {
            let mut repo = self.repo.lock().await;
            let before = repo.len();
            let merged = merge(&repo.list(None), &remote);
            let changed = merged.len() != before;

            let persist_error = repo.replace_all(merged).err().map(|e| e.to_string());

            let candidates: Vec<Quote> = if self.mirror_writes {
                repo.list(None)
                    .into_iter()
                    .filter(|q| !q.is_remote() && !self.mirrored.contains(&q.id))
                    .collect()
            } else {
                Vec::new()
            };
            (changed, persist_error, candidates)
        };

        // Mirroring happens outside the lock; its outcome is status-only
        let mut pushed = 0;
        for quote in mirror_candidates {
            let body = quote.author.clone().unwrap_or_default();
            match self.client.push_post(&quote.text, &body).await {
                Ok(()) => {
                    self.mirrored.insert(quote.id);
                    pushed += 1;
                }
                Err(e) => {
                    warn!("Mirror push failed: {}", e);
                    break;
                }
            }
        }

        SyncResult {
            changed,
            fetched: remote.len(),
            pushed,
            error: persist_error,
            checked_at: Utc::now(),
        }
    }

    /// Run an immediate sync, then one per interval until stopped.
    ///
    /// Ticks are dropped while a sync is still in flight (the loop body is
    /// the only place a cycle runs, and `Skip` discards missed ticks), so
    /// a slow network can never pile up interleaved merges.
    pub fn spawn(mut self, interval: Duration) -> SyncHandle {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let result = self.sync_once().await;
                match &result.error {
                    Some(e) => warn!("Sync tick failed: {}", e),
                    None => info!(
                        "Sync tick complete: fetched {}, changed: {}",
                        result.fetched, result.changed
                    ),
                }
            }
        });
        SyncHandle { task }
    }
}

/// Handle to the running sync task.
pub struct SyncHandle {
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stop the periodic sync. Pending network calls just lapse.
    pub fn stop(self) {
        self.task.abort();
    }
}
