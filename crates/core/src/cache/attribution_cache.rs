use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use super::Clock;
use crate::constants::CACHE_TTL_TRADING_MINUTES;
use crate::utils::time_utils::{is_session_open, next_session_open, DEFAULT_VALUATION_TZ};

/// Short-TTL keyed cache with an injected clock and explicit per-user
/// invalidation.
///
/// Keys follow the `"{userId}:{rest}"` convention produced by
/// [`AttributionCache::request_key`]; `invalidate` drops every entry for a
/// user, which the upstream snapshot writer must call whenever it writes a
/// new valuation for that user.
pub struct AttributionCache<V: Clone + Send + Sync + 'static> {
    store: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V: Clone + Send + Sync + 'static> AttributionCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: DashMap::new(),
            clock,
        }
    }

    /// Canonical cache key for an attribution request.
    pub fn request_key(
        user_id: &str,
        period: &str,
        currency: &str,
        account_ids: &[String],
    ) -> String {
        let mut accounts = account_ids.to_vec();
        accounts.sort();
        format!("{}:{}:{}:{}", user_id, period, currency, accounts.join(","))
    }

    /// Returns the cached value if present and not yet expired.
    /// Expired entries are removed on access.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let expired = match self.store.get(key) {
            Some(entry) => {
                if entry.expires_at > now {
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.store.remove(key);
        }
        None
    }

    pub fn set(&self, key: &str, value: V, expires_at: DateTime<Utc>) {
        self.store
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }

    /// Stores a value with the trading-hours-aware default expiry.
    pub fn set_with_default_ttl(&self, key: &str, value: V) {
        let expires_at = Self::default_expiry(self.clock.now());
        self.set(key, value, expires_at);
    }

    /// Drops every cached entry belonging to the user.
    pub fn invalidate(&self, user_id: &str) {
        let prefix = format!("{}:", user_id);
        self.store.retain(|key, _| !key.starts_with(&prefix));
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// TTL policy: a few minutes while an exchange session is open,
    /// otherwise until the next session open (weekends roll forward).
    pub fn default_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
        if is_session_open(now, DEFAULT_VALUATION_TZ) {
            now + Duration::minutes(CACHE_TTL_TRADING_MINUTES)
        } else {
            next_session_open(now, DEFAULT_VALUATION_TZ)
        }
    }
}
