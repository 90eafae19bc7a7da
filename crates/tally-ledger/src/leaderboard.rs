//! Top-users leaderboard cache.
//!
//! Per points type the cache holds an ordered prefix of the ranking plus an
//! `is_max` flag meaning the ranking has no further users. The cache is
//! derived data: any balance mutation for a type drops its entry wholesale,
//! and the next read rebuilds from authoritative storage. Reads never block
//! writers beyond the brief map lock.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tally_core::UserId;

use crate::error::Result;

#[derive(Default)]
struct CacheEntry {
    users: Vec<UserId>,
    is_max: bool,
}

/// In-process leaderboard cache, keyed by points type slug.
#[derive(Default)]
pub struct LeaderboardCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl LeaderboardCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the top `n` users for a points type, fetching only the suffix
    /// missing from the cache.
    ///
    /// `fetch(offset, limit)` must return user ids ordered by balance
    /// descending, skipping `offset` rows. It is called at most once per
    /// invocation; when it returns fewer rows than requested the entry is
    /// marked `is_max` and will not grow until invalidated.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error; the cache is left unchanged in that case.
    pub fn top_users<F>(&self, points_type: &str, n: usize, fetch: F) -> Result<Vec<UserId>>
    where
        F: FnOnce(usize, usize) -> Result<Vec<UserId>>,
    {
        if n == 0 {
            return Ok(Vec::new());
        }

        // Fast path: the cached prefix already covers the request.
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(points_type) {
                if entry.users.len() >= n || entry.is_max {
                    return Ok(entry.users.iter().take(n).copied().collect());
                }
            }
        }

        let cached: Vec<UserId> = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            entries
                .get(points_type)
                .map(|e| e.users.clone())
                .unwrap_or_default()
        };

        // Fetch outside the lock; the store query can be slow.
        let suffix = fetch(cached.len(), n - cached.len())?;
        let is_max = suffix.len() < n - cached.len();

        {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let entry = entries.entry(points_type.to_string()).or_default();

            // An invalidation or a competing fill may have raced us; only
            // extend the entry we actually read from.
            if entry.users.len() == cached.len() {
                entry.users.extend(&suffix);
                entry.is_max = entry.is_max || is_max;
            }
        }

        // Answer from the rows fetched in this call, not the cache entry: a
        // raced invalidation must not turn real rows into an empty result.
        let mut result = cached;
        result.extend(suffix);
        result.truncate(n);
        Ok(result)
    }

    /// Drop the cache entry for a points type. Called after every successful
    /// balance mutation for that type.
    pub fn invalidate(&self, points_type: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(points_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn users(raw: &[u64]) -> Vec<UserId> {
        raw.iter().map(|&r| UserId::new(r).unwrap()).collect()
    }

    #[test]
    fn fetches_once_and_serves_repeat_reads_from_cache() {
        let cache = LeaderboardCache::new();
        let calls = AtomicUsize::new(0);

        let fetch = |offset: usize, limit: usize| {
            calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!((offset, limit), (0, 3));
            Ok(users(&[5, 2, 9]))
        };
        assert_eq!(cache.top_users("points", 3, fetch).unwrap(), users(&[5, 2, 9]));

        let again = cache
            .top_users("points", 3, |_, _| panic!("must hit the cache"))
            .unwrap();
        assert_eq!(again, users(&[5, 2, 9]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn growing_request_fetches_only_missing_suffix() {
        let cache = LeaderboardCache::new();

        cache
            .top_users("points", 2, |_, _| Ok(users(&[5, 2])))
            .unwrap();

        let top = cache
            .top_users("points", 4, |offset, limit| {
                assert_eq!((offset, limit), (2, 2));
                Ok(users(&[9, 1]))
            })
            .unwrap();

        // Prefix stability: the first two entries match the earlier result.
        assert_eq!(top, users(&[5, 2, 9, 1]));
    }

    #[test]
    fn short_fetch_sets_is_max() {
        let cache = LeaderboardCache::new();

        let top = cache
            .top_users("points", 5, |_, _| Ok(users(&[5, 2])))
            .unwrap();
        assert_eq!(top, users(&[5, 2]));

        // is_max: a larger request must not fetch again.
        let top = cache
            .top_users("points", 10, |_, _| panic!("ranking is exhausted"))
            .unwrap();
        assert_eq!(top, users(&[5, 2]));
    }

    #[test]
    fn smaller_request_trims_cached_prefix() {
        let cache = LeaderboardCache::new();
        cache
            .top_users("points", 3, |_, _| Ok(users(&[5, 2, 9])))
            .unwrap();

        let top = cache
            .top_users("points", 1, |_, _| panic!("must hit the cache"))
            .unwrap();
        assert_eq!(top, users(&[5]));
    }

    #[test]
    fn invalidate_drops_the_entry() {
        let cache = LeaderboardCache::new();
        cache
            .top_users("points", 2, |_, _| Ok(users(&[5, 2])))
            .unwrap();

        cache.invalidate("points");

        let top = cache
            .top_users("points", 2, |offset, limit| {
                assert_eq!((offset, limit), (0, 2));
                Ok(users(&[7, 5]))
            })
            .unwrap();
        assert_eq!(top, users(&[7, 5]));
    }

    #[test]
    fn invalidation_during_fetch_still_returns_the_fetched_rows() {
        let cache = LeaderboardCache::new();
        cache
            .top_users("points", 1, |_, _| Ok(users(&[5])))
            .unwrap();

        // The entry is dropped while the suffix fetch is in flight. The rows
        // from this call must still come back, even though the raced entry
        // cannot absorb them.
        let top = cache
            .top_users("points", 3, |offset, limit| {
                assert_eq!((offset, limit), (1, 2));
                cache.invalidate("points");
                Ok(users(&[2, 9]))
            })
            .unwrap();
        assert_eq!(top, users(&[5, 2, 9]));

        // The cache entry itself was reset, so the next read starts over.
        let top = cache
            .top_users("points", 3, |offset, limit| {
                assert_eq!((offset, limit), (0, 3));
                Ok(users(&[7, 5, 2]))
            })
            .unwrap();
        assert_eq!(top, users(&[7, 5, 2]));
    }

    #[test]
    fn entries_are_per_points_type() {
        let cache = LeaderboardCache::new();
        cache
            .top_users("points", 1, |_, _| Ok(users(&[5])))
            .unwrap();

        let top = cache
            .top_users("karma", 1, |_, _| Ok(users(&[8])))
            .unwrap();
        assert_eq!(top, users(&[8]));

        cache.invalidate("karma");
        let top = cache
            .top_users("points", 1, |_, _| panic!("points entry must survive"))
            .unwrap();
        assert_eq!(top, users(&[5]));
    }
}
