//! In-memory [`Cache`] implementation.

use std::{collections::HashMap, sync::Arc};

use common::operations::{Delete, Insert};
use tokio::{sync::RwLock, time::Instant};
use tracerr::Traced;

use crate::infra::{cache, Cache};

use super::{Entry, Key};

/// Process-local [`Cache`] with per-entry expiration.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored values along with the [`Instant`] they expire at.
    entries: Arc<RwLock<HashMap<Key, (String, Instant)>>>,
}

impl Memory {
    /// Creates a new empty [`Memory`] cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unexpired value stored under the provided [`Key`], if any.
    #[cfg(test)]
    pub(crate) async fn get(&self, key: &Key) -> Option<String> {
        self.entries
            .read()
            .await
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone())
    }
}

impl Cache<Insert<Entry>> for Memory {
    type Ok = ();
    type Err = Traced<cache::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        let Entry { key, value, ttl } = entry;
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| tracerr::new!(cache::Error::Ttl(ttl)))?;

        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        drop(entries.insert(key, (value, expires_at)));

        Ok(())
    }
}

impl Cache<Delete<Key>> for Memory {
    type Ok = ();
    type Err = Traced<cache::Error>;

    async fn execute(
        &self,
        Delete(key): Delete<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.entries.write().await.remove(&key));
        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::{Delete, Insert};

    use crate::infra::{
        cache::{self, Entry, Key},
        Cache as _,
    };

    use super::Memory;

    fn entry(key: &str, value: &str, ttl: Duration) -> Entry {
        Entry {
            key: Key::from(key.to_owned()),
            value: value.to_owned(),
            ttl,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stores_until_expiration() {
        let cache = Memory::new();
        let key = Key::from("k".to_owned());

        cache
            .execute(Insert(entry("k", "v", Duration::from_secs(10))))
            .await
            .unwrap();
        assert_eq!(cache.get(&key).await.as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn overwrites_value_and_ttl() {
        let cache = Memory::new();
        let key = Key::from("k".to_owned());

        cache
            .execute(Insert(entry("k", "old", Duration::from_secs(1))))
            .await
            .unwrap();
        cache
            .execute(Insert(entry("k", "new", Duration::from_secs(10))))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get(&key).await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let cache = Memory::new();
        let key = Key::from("k".to_owned());

        cache
            .execute(Insert(entry("k", "v", Duration::from_secs(10))))
            .await
            .unwrap();
        cache.execute(Delete(key.clone())).await.unwrap();
        cache.execute(Delete(key.clone())).await.unwrap();

        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn purges_expired_entries_on_write() {
        let cache = Memory::new();

        cache
            .execute(Insert(entry("a", "1", Duration::from_secs(1))))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        cache
            .execute(Insert(entry("b", "2", Duration::from_secs(10))))
            .await
            .unwrap();

        assert_eq!(cache.entries.read().await.len(), 1);
    }

    #[tokio::test]
    async fn rejects_unrepresentable_ttl() {
        let cache = Memory::new();

        let err = cache
            .execute(Insert(entry("k", "v", Duration::MAX)))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), cache::Error::Ttl(_)));
        assert_eq!(cache.get(&Key::from("k".to_owned())).await, None);
    }
}
