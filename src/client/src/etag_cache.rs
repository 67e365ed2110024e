// Copyright 2025 Basecamp SDK Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The cache backing conditional requests.
//!
//! The client remembers the `ETag` validator and body of recent `GET`
//! responses, keyed by URL. A later `GET` for the same URL sends
//! `If-None-Match`, and a `304 Not Modified` answer is served from this
//! cache without re-downloading the body.

use bytes::Bytes;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A bounded, thread-safe map from URL to `(etag, body)`.
///
/// Entries are evicted first-in first-out by insertion or last-update
/// order: storing a new key at capacity removes the single oldest entry,
/// while updating an existing key removes nothing and moves that key to
/// the newest position.
#[derive(Debug)]
pub struct EtagCache {
    capacity: usize,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    // Keys in insertion/last-update order, oldest first.
    order: VecDeque<String>,
}

#[derive(Clone, Debug)]
struct Entry {
    etag: String,
    body: Bytes,
}

impl EtagCache {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(State::default()),
        }
    }

    /// Inserts or updates the entry for `url`.
    pub fn store<T: Into<String>>(&self, url: &str, etag: T, body: Bytes) {
        let mut state = self.state.lock().unwrap();
        let entry = Entry {
            etag: etag.into(),
            body,
        };
        if state.entries.insert(url.to_string(), entry).is_some() {
            state.order.retain(|k| k != url);
        } else if state.entries.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
            }
        }
        state.order.push_back(url.to_string());
    }

    /// Looks up the entry for `url`.
    pub fn load(&self, url: &str) -> Option<(String, Bytes)> {
        let state = self.state.lock().unwrap();
        state
            .entries
            .get(url)
            .map(|e| (e.etag.clone(), e.body.clone()))
    }

    /// Removes all entries.
    pub fn remove_all(&self) {
        let mut state = self.state.lock().unwrap();
        state.entries.clear();
        state.order.clear();
    }

    /// The number of cached entries.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    /// True if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(text: &str) -> Bytes {
        Bytes::copy_from_slice(text.as_bytes())
    }

    #[test]
    fn store_and_load() {
        let cache = EtagCache::new(4);
        assert!(cache.is_empty());
        assert!(cache.load("https://example.com/a").is_none());

        cache.store("https://example.com/a", "\"v1\"", body("a1"));
        let (etag, cached) = cache.load("https://example.com/a").unwrap();
        assert_eq!(etag, "\"v1\"");
        assert_eq!(cached, body("a1"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn update_replaces_in_place() {
        let cache = EtagCache::new(2);
        cache.store("a", "\"v1\"", body("a1"));
        cache.store("b", "\"v1\"", body("b1"));

        // Updating an existing key at capacity must not evict its peer.
        cache.store("a", "\"v2\"", body("a2"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.load("a").unwrap().0, "\"v2\"");
        assert!(cache.load("b").is_some());
    }

    #[test]
    fn fifo_eviction() {
        let cache = EtagCache::new(2);
        cache.store("a", "\"v1\"", body("a1"));
        cache.store("b", "\"v1\"", body("b1"));
        cache.store("c", "\"v1\"", body("c1"));

        assert_eq!(cache.len(), 2);
        assert!(cache.load("a").is_none(), "oldest entry is evicted");
        assert!(cache.load("b").is_some());
        assert!(cache.load("c").is_some());
    }

    #[test]
    fn update_refreshes_eviction_order() {
        let cache = EtagCache::new(2);
        cache.store("a", "\"v1\"", body("a1"));
        cache.store("b", "\"v1\"", body("b1"));

        // The update moves `a` to the newest position, so the next insert
        // evicts `b`.
        cache.store("a", "\"v2\"", body("a2"));
        cache.store("c", "\"v1\"", body("c1"));
        assert!(cache.load("a").is_some());
        assert!(cache.load("b").is_none());
        assert!(cache.load("c").is_some());
    }

    #[test]
    fn zero_capacity_holds_one() {
        let cache = EtagCache::new(0);
        cache.store("a", "\"v1\"", body("a1"));
        assert_eq!(cache.len(), 1);
        cache.store("b", "\"v1\"", body("b1"));
        assert_eq!(cache.len(), 1);
        assert!(cache.load("b").is_some());
    }

    #[test]
    fn remove_all_clears() {
        let cache = EtagCache::new(2);
        cache.store("a", "\"v1\"", body("a1"));
        cache.store("b", "\"v1\"", body("b1"));
        cache.remove_all();
        assert!(cache.is_empty());
        assert!(cache.load("a").is_none());

        // The cache remains usable after a clear.
        cache.store("c", "\"v1\"", body("c1"));
        assert!(cache.load("c").is_some());
    }

    #[test]
    fn concurrent_stores_and_clears() {
        use std::sync::Arc;
        let cache = Arc::new(EtagCache::new(8));
        let mut tasks = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            tasks.push(std::thread::spawn(move || {
                for j in 0..100 {
                    let url = format!("https://example.com/{}", j % 16);
                    cache.store(&url, format!("\"{i}-{j}\""), Bytes::new());
                    let _ = cache.load(&url);
                    if j % 10 == 0 {
                        cache.remove_all();
                    }
                }
            }));
        }
        for t in tasks {
            t.join().unwrap();
        }
        assert!(cache.len() <= 8);
    }
}
