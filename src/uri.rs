//! URI generation for new nodes.
//!
//! Generated URIs take the form `http://{namespace}.com/{suffix}`. Collision
//! handling is left to the store, which rejects duplicate uris.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Default random suffix length.
pub const DEFAULT_URI_LENGTH: usize = 12;

/// Source of globally unique node uris.
pub trait UriGenerator: Send + Sync {
    /// Produce a fresh uri in the given namespace.
    fn new_uri(&self, namespace: &str) -> String;
}

/// Random alphanumeric suffixes, unique with overwhelming probability.
#[derive(Debug, Clone)]
pub struct RandomUriGenerator {
    length: usize,
}

impl RandomUriGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomUriGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_URI_LENGTH)
    }
}

impl UriGenerator for RandomUriGenerator {
    fn new_uri(&self, namespace: &str) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect();
        format!("http://{namespace}.com/{suffix}")
    }
}

/// Monotonic numeric suffixes. Deterministic, for tests and fixtures.
#[derive(Debug, Default)]
pub struct SequentialUriGenerator {
    next: AtomicU64,
}

impl SequentialUriGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UriGenerator for SequentialUriGenerator {
    fn new_uri(&self, namespace: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("http://{namespace}.com/{n}")
    }
}
