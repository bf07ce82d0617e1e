//! The process-wide subscription cache that survives router restarts within one process
//! lifetime (spec.md §4.5). Modeled as a `lazy_static` singleton, the same ecosystem crate
//! `mavlink-bindgen` already uses for its compiled-once regexes, applied here to a
//! process-wide registry instead.

use std::sync::Mutex;

use lazy_static::lazy_static;

use crate::subscription::SubscriptionQuery;

/// A cache entry: enough to describe a subscription without owning its live channel (which
/// does not survive a router restart; only the query and its id do).
#[derive(Debug, Clone)]
pub struct CachedSubscription {
    pub id: u64,
    pub query: SubscriptionQuery,
}

lazy_static! {
    static ref CACHE: Mutex<Vec<CachedSubscription>> = Mutex::new(Vec::new());
}

/// Restores the cache verbatim; called by a router on startup. Returns the entries a new
/// router instance should re-register as active subscriptions (minus their original
/// handles, which a restarting process cannot recover).
pub fn restore() -> Vec<CachedSubscription> {
    CACHE.lock().expect("subscription cache poisoned").clone()
}

/// Atomically replaces the cache with a fresh full snapshot. Readers racing a restart
/// observe either the pre- or post-restart set in full, never a partial one, because the
/// mutex critical section covers the whole replacement.
pub fn replace(entries: Vec<CachedSubscription>) {
    *CACHE.lock().expect("subscription cache poisoned") = entries;
}

pub fn add(entry: CachedSubscription) {
    let mut cache = CACHE.lock().expect("subscription cache poisoned");
    cache.retain(|e| e.query != entry.query);
    cache.push(entry);
}

pub fn remove(id: u64) {
    CACHE
        .lock()
        .expect("subscription cache poisoned")
        .retain(|e| e.id != id);
}
