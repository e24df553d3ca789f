use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use std::sync::Arc;
use vendora_core::ResellerId;

/// Reseller-scoped key/value store abstraction for disposable read models.
pub trait OwnerStore<K, V>: Send + Sync {
    fn get(&self, reseller_id: ResellerId, key: &K) -> Option<V>;
    fn upsert(&self, reseller_id: ResellerId, key: K, value: V);
    fn list(&self, reseller_id: ResellerId) -> Vec<V>;
    /// Clear all read-model records for a reseller (rebuild support).
    fn clear_owner(&self, reseller_id: ResellerId);
}

impl<K, V, S> OwnerStore<K, V> for Arc<S>
where
    S: OwnerStore<K, V> + ?Sized,
{
    fn get(&self, reseller_id: ResellerId, key: &K) -> Option<V> {
        (**self).get(reseller_id, key)
    }

    fn upsert(&self, reseller_id: ResellerId, key: K, value: V) {
        (**self).upsert(reseller_id, key, value)
    }

    fn list(&self, reseller_id: ResellerId) -> Vec<V> {
        (**self).list(reseller_id)
    }

    fn clear_owner(&self, reseller_id: ResellerId) {
        (**self).clear_owner(reseller_id)
    }
}

/// In-memory reseller-scoped store for tests/dev.
#[derive(Debug)]
pub struct InMemoryOwnerStore<K, V> {
    inner: RwLock<HashMap<(ResellerId, K), V>>,
}

impl<K, V> InMemoryOwnerStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryOwnerStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> OwnerStore<K, V> for InMemoryOwnerStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, reseller_id: ResellerId, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&(reseller_id, key.clone())).cloned()
    }

    fn upsert(&self, reseller_id: ResellerId, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((reseller_id, key), value);
        }
    }

    fn list(&self, reseller_id: ResellerId) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter()
            .filter_map(|((r, _k), v)| if *r == reseller_id { Some(v.clone()) } else { None })
            .collect()
    }

    fn clear_owner(&self, reseller_id: ResellerId) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|(r, _k), _v| *r != reseller_id);
        }
    }
}
