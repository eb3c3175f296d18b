//! Read-through cache of server views.
//!
//! [`QueryCache`] holds the last JSON body fetched for each
//! [`CacheKey`]. Entries are never edited locally: they are replaced by a
//! fetch, or marked stale by an invalidation and refetched on next read.

use std::collections::HashMap;
use std::future::Future;
use std::time::Instant;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use super::{CacheKey, QueryKind};
use crate::domain::GameId;
use crate::error::ClientError;

/// One cached view.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Raw response body.
    pub value: serde_json::Value,
    /// Set by an invalidation; cleared by the next fetch.
    pub stale: bool,
    /// When the body was fetched.
    pub fetched_at: Instant,
}

/// Store for all cached views, keyed by `(kind, game)`.
///
/// A single `RwLock` over the map: reads of different keys proceed
/// concurrently, and an invalidation never blocks on a slow fetch because
/// fetches run outside the lock.
///
/// Every invalidation also bumps an epoch, per key and per game, whether
/// or not the key is cached yet. [`QueryCache::read_through`] compares the
/// epochs from before and after its fetch, and a body fetched across an
/// invalidation is stored stale so the next read refetches it.
#[derive(Debug, Default)]
pub struct QueryCache {
    inner: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    key_epochs: HashMap<CacheKey, u64>,
    game_epochs: HashMap<GameId, u64>,
}

impl CacheState {
    fn epoch(&self, key: CacheKey) -> (u64, u64) {
        (
            self.key_epochs.get(&key).copied().unwrap_or_default(),
            self.game_epochs.get(&key.game_id).copied().unwrap_or_default(),
        )
    }

    fn mark_stale(&mut self, key: CacheKey) -> bool {
        let epoch = self.key_epochs.entry(key).or_default();
        *epoch = epoch.wrapping_add(1);
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    fn bump_game(&mut self, game_id: GameId) {
        let epoch = self.game_epochs.entry(game_id).or_default();
        *epoch = epoch.wrapping_add(1);
    }
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a freshly fetched view.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Json`] if `value` cannot be serialized.
    pub async fn put<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<(), ClientError> {
        let value = serde_json::to_value(value)?;
        self.put_raw(key, value).await;
        Ok(())
    }

    /// Stores a freshly fetched raw body.
    pub async fn put_raw(&self, key: CacheKey, value: serde_json::Value) {
        let entry = CacheEntry {
            value,
            stale: false,
            fetched_at: Instant::now(),
        };
        self.inner.write().await.entries.insert(key, entry);
    }

    /// Returns the cached view decoded as `T`, stale or not.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Json`] if the cached body does not decode.
    pub async fn get<T: DeserializeOwned>(&self, key: CacheKey) -> Result<Option<T>, ClientError> {
        let state = self.inner.read().await;
        state
            .entries
            .get(&key)
            .map(|entry| serde_json::from_value(entry.value.clone()))
            .transpose()
            .map_err(ClientError::from)
    }

    /// Returns `Some(stale)` for a cached key, `None` if never fetched.
    pub async fn is_stale(&self, key: CacheKey) -> Option<bool> {
        self.inner.read().await.entries.get(&key).map(|e| e.stale)
    }

    /// Marks one view stale. Returns `true` if it was cached.
    ///
    /// A fetch of `key` already in flight is stored stale either way.
    pub async fn invalidate(&self, key: CacheKey) -> bool {
        let cached = self.inner.write().await.mark_stale(key);
        tracing::trace!(key = %key, cached, "cache entry invalidated");
        cached
    }

    /// Marks several views of one game stale.
    pub async fn invalidate_kinds(&self, game_id: GameId, kinds: &[QueryKind]) {
        let mut state = self.inner.write().await;
        for kind in kinds {
            state.mark_stale(CacheKey::new(*kind, game_id));
        }
    }

    /// Marks every view of a game stale. Returns how many were cached.
    pub async fn invalidate_game(&self, game_id: GameId) -> usize {
        let mut state = self.inner.write().await;
        state.bump_game(game_id);
        let mut flushed = 0;
        for (key, entry) in &mut state.entries {
            if key.game_id == game_id {
                entry.stale = true;
                flushed += 1;
            }
        }
        tracing::debug!(%game_id, flushed, "game views marked stale");
        flushed
    }

    /// Drops every view of a game.
    pub async fn remove_game(&self, game_id: GameId) {
        let mut state = self.inner.write().await;
        state.bump_game(game_id);
        state.entries.retain(|k, _| k.game_id != game_id);
        state.key_epochs.retain(|k, _| k.game_id != game_id);
    }

    /// Returns the cached view if fresh; otherwise runs `fetch`, stores its
    /// result and returns it.
    ///
    /// The lock is not held while `fetch` runs. If the key or its game is
    /// invalidated meanwhile, the body is still returned but stored stale.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error, or [`ClientError::Json`] if the body
    /// does not decode as `T`.
    pub async fn read_through<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value, ClientError>>,
    {
        let (cached, before) = {
            let state = self.inner.read().await;
            let cached = state
                .entries
                .get(&key)
                .filter(|e| !e.stale)
                .map(|e| e.value.clone());
            (cached, state.epoch(key))
        };
        let value = match cached {
            Some(value) => value,
            None => {
                let value = fetch().await?;
                let mut state = self.inner.write().await;
                let stale = state.epoch(key) != before;
                if stale {
                    tracing::debug!(key = %key, "view invalidated during fetch, stored stale");
                }
                state.entries.insert(
                    key,
                    CacheEntry {
                        value: value.clone(),
                        stale,
                        fetched_at: Instant::now(),
                    },
                );
                value
            }
        };
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the number of cached views.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(kind: QueryKind, game_id: GameId) -> CacheKey {
        CacheKey::new(kind, game_id)
    }

    #[tokio::test]
    async fn put_then_get() {
        let cache = QueryCache::new();
        let k = key(QueryKind::DiceRolls, GameId::new());
        let Ok(()) = cache.put(k, &vec![1, 2, 3]).await else {
            panic!("put failed");
        };
        let Ok(Some(v)) = cache.get::<Vec<i32>>(k).await else {
            panic!("get failed");
        };
        assert_eq!(v, vec![1, 2, 3]);
        assert_eq!(cache.is_stale(k).await, Some(false));
    }

    #[tokio::test]
    async fn invalidate_marks_only_that_key() {
        let cache = QueryCache::new();
        let game = GameId::new();
        cache.put_raw(key(QueryKind::Trades, game), serde_json::json!([])).await;
        cache.put_raw(key(QueryKind::Game, game), serde_json::json!({})).await;

        assert!(cache.invalidate(key(QueryKind::Trades, game)).await);
        assert!(!cache.invalidate(key(QueryKind::Inventory, game)).await);
        assert_eq!(cache.is_stale(key(QueryKind::Trades, game)).await, Some(true));
        assert_eq!(cache.is_stale(key(QueryKind::Game, game)).await, Some(false));
    }

    #[tokio::test]
    async fn invalidate_game_flushes_every_view_of_that_game() {
        let cache = QueryCache::new();
        let game = GameId::new();
        let other = GameId::new();
        for kind in [QueryKind::Transactions, QueryKind::Participants, QueryKind::Game] {
            cache.put_raw(key(kind, game), serde_json::json!([])).await;
        }
        cache.put_raw(key(QueryKind::Game, other), serde_json::json!({})).await;

        assert_eq!(cache.invalidate_game(game).await, 3);
        assert_eq!(cache.is_stale(key(QueryKind::Participants, game)).await, Some(true));
        assert_eq!(cache.is_stale(key(QueryKind::Game, other)).await, Some(false));
    }

    #[tokio::test]
    async fn read_through_fetches_once_until_invalidated() {
        let cache = QueryCache::new();
        let k = key(QueryKind::Participants, GameId::new());
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::json!(["p1"]))
        };

        for _ in 0..3 {
            let Ok(v) = cache.read_through::<Vec<String>, _, _>(k, fetch).await else {
                panic!("read_through failed");
            };
            assert_eq!(v, vec!["p1".to_string()]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate(k).await;
        let Ok(_) = cache.read_through::<Vec<String>, _, _>(k, fetch).await else {
            panic!("refetch failed");
        };
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.is_stale(k).await, Some(false));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_cache_untouched() {
        let cache = QueryCache::new();
        let k = key(QueryKind::Game, GameId::new());
        let result = cache
            .read_through::<serde_json::Value, _, _>(k, || async {
                Err(ClientError::Transport("down".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn invalidation_during_fetch_is_not_lost() {
        let cache = QueryCache::new();
        let game = GameId::new();
        let k = key(QueryKind::Participants, game);
        cache.put_raw(k, serde_json::json!(["old"])).await;
        cache.invalidate(k).await;

        let cache_ref = &cache;
        let Ok(first) = cache
            .read_through::<Vec<String>, _, _>(k, || async move {
                cache_ref.invalidate_kinds(game, &[QueryKind::Participants]).await;
                Ok(serde_json::json!(["pre_event"]))
            })
            .await
        else {
            panic!("first read failed");
        };
        assert_eq!(first, vec!["pre_event".to_string()]);
        assert_eq!(cache.is_stale(k).await, Some(true));

        let refetches = AtomicUsize::new(0);
        let calls = &refetches;
        let Ok(next) = cache
            .read_through::<Vec<String>, _, _>(k, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::json!(["post_event"]))
            })
            .await
        else {
            panic!("second read failed");
        };
        assert_eq!(next, vec!["post_event".to_string()]);
        assert_eq!(refetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.is_stale(k).await, Some(false));
    }

    #[tokio::test]
    async fn first_fetch_racing_an_event_is_stored_stale() {
        let cache = QueryCache::new();
        let game = GameId::new();
        let k = key(QueryKind::Transactions, game);
        let cache_ref = &cache;

        let Ok(_) = cache
            .read_through::<serde_json::Value, _, _>(k, || async move {
                assert!(!cache_ref.invalidate(k).await);
                Ok(serde_json::json!([]))
            })
            .await
        else {
            panic!("read failed");
        };
        assert_eq!(cache.is_stale(k).await, Some(true));
    }

    #[tokio::test]
    async fn game_flush_during_fetch_is_not_lost() {
        let cache = QueryCache::new();
        let game = GameId::new();
        let k = key(QueryKind::Game, game);
        let cache_ref = &cache;

        let Ok(_) = cache
            .read_through::<serde_json::Value, _, _>(k, || async move {
                cache_ref.invalidate_game(game).await;
                Ok(serde_json::json!({}))
            })
            .await
        else {
            panic!("read failed");
        };
        assert_eq!(cache.is_stale(k).await, Some(true));
    }

    #[test]
    fn remove_game_drops_entries_outside_a_runtime() {
        let cache = QueryCache::new();
        let game = GameId::new();
        tokio_test::block_on(async {
            cache.put_raw(key(QueryKind::Inventory, game), serde_json::json!([])).await;
            cache.remove_game(game).await;
        });
        assert!(tokio_test::block_on(cache.is_empty()));
    }
}
