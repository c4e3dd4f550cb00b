/*!
 * Cache backends that misbehave on purpose
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use peds_catalog::cache::CacheBackend;
use peds_catalog::errors::CacheError;

/// Backend whose every operation fails, counting the attempts
#[derive(Debug, Default)]
pub struct FailingCache {
    pub calls: AtomicUsize,
}

impl FailingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self) -> CacheError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CacheError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(self.fail())
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Err(self.fail())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(self.fail())
    }
}
