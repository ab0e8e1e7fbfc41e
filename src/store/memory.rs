//! In-memory store for development and testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::{Store, StoreError};

#[derive(Debug, Clone)]
enum Value {
    Hash(HashMap<String, String>),
    SortedSet(HashMap<String, f64>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Store backed by a process-local map. TTLs are honoured lazily on access.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&Value>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let slots = self
            .slots
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let now = Instant::now();
        f(slots
            .get(key)
            .filter(|slot| slot.is_live(now))
            .map(|slot| &slot.value))
    }

    fn write<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut HashMap<String, Slot>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let now = Instant::now();
        if slots.get(key).is_some_and(|slot| !slot.is_live(now)) {
            slots.remove(key);
        }
        f(&mut slots)
    }

    /// Set a member's score. Votes are cast by the web frontend, so only
    /// local runs and tests seed vote sets through this.
    pub async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        self.write(key, |slots| {
            Self::zset_mut(slots, key)?.insert(member.to_string(), score);
            Ok(())
        })
    }

    fn hash_mut<'a>(
        slots: &'a mut HashMap<String, Slot>,
        key: &str,
    ) -> Result<&'a mut HashMap<String, String>, StoreError> {
        let slot = slots.entry(key.to_string()).or_insert_with(|| Slot {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut slot.value {
            Value::Hash(map) => Ok(map),
            Value::SortedSet(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    fn zset_mut<'a>(
        slots: &'a mut HashMap<String, Slot>,
        key: &str,
    ) -> Result<&'a mut HashMap<String, f64>, StoreError> {
        let slot = slots.entry(key.to_string()).or_insert_with(|| Slot {
            value: Value::SortedSet(HashMap::new()),
            expires_at: None,
        });
        match &mut slot.value {
            Value::SortedSet(set) => Ok(set),
            Value::Hash(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.read(key, |value| Ok(value.is_some()))
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.read(key, |value| match value {
            None => Ok(None),
            Some(Value::Hash(map)) => Ok(map.get(field).cloned()),
            Some(Value::SortedSet(_)) => Err(StoreError::WrongType(key.to_string())),
        })
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.write(key, |slots| {
            Self::hash_mut(slots, key)?.insert(field.to_string(), value.to_string());
            Ok(())
        })
    }

    async fn hset_multiple(
        &self,
        key: &str,
        fields: &[(&str, String)],
    ) -> Result<(), StoreError> {
        self.write(key, |slots| {
            let map = Self::hash_mut(slots, key)?;
            for (field, value) in fields {
                map.insert(field.to_string(), value.clone());
            }
            Ok(())
        })
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.read(key, |value| match value {
            None => Ok(HashMap::new()),
            Some(Value::Hash(map)) => Ok(map.clone()),
            Some(Value::SortedSet(_)) => Err(StoreError::WrongType(key.to_string())),
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.write(key, |slots| Ok(slots.remove(key).is_some()))
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        self.write(key, |slots| {
            if let Some(slot) = slots.get_mut(key) {
                slot.expires_at = Some(Instant::now() + Duration::from_secs(seconds));
            }
            Ok(())
        })
    }

    async fn zrange_by_score_min(&self, key: &str, min: f64) -> Result<Vec<String>, StoreError> {
        self.read(key, |value| match value {
            None => Ok(Vec::new()),
            Some(Value::SortedSet(set)) => {
                let mut members: Vec<(&String, f64)> = set
                    .iter()
                    .filter(|(_, score)| **score >= min)
                    .map(|(member, score)| (member, *score))
                    .collect();
                members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
                Ok(members.into_iter().map(|(m, _)| m.clone()).collect())
            }
            Some(Value::Hash(_)) => Err(StoreError::WrongType(key.to_string())),
        })
    }

    async fn zrem_range_by_score_min(&self, key: &str, min: f64) -> Result<usize, StoreError> {
        self.write(key, |slots| {
            let (removed, now_empty) = match slots.get_mut(key).map(|slot| &mut slot.value) {
                None => return Ok(0),
                Some(Value::SortedSet(set)) => {
                    let before = set.len();
                    set.retain(|_, score| *score < min);
                    (before - set.len(), set.is_empty())
                }
                Some(Value::Hash(_)) => return Err(StoreError::WrongType(key.to_string())),
            };
            // Redis drops empty sorted sets
            if now_empty {
                slots.remove(key);
            }
            Ok(removed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_roundtrip() {
        let store = MemoryStore::new();
        assert!(!store.exists("h").await.unwrap());

        store.hset("h", "a", "1").await.unwrap();
        store
            .hset_multiple("h", &[("b", "2".to_string()), ("c", "3".to_string())])
            .await
            .unwrap();

        assert!(store.exists("h").await.unwrap());
        assert_eq!(store.hget("h", "a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.hget("h", "missing").await.unwrap(), None);
        assert_eq!(store.hgetall("h").await.unwrap().len(), 3);

        assert!(store.delete("h").await.unwrap());
        assert!(!store.delete("h").await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let store = MemoryStore::new();
        store.zadd("z", "m", 1.0).await.unwrap();
        assert!(matches!(
            store.hget("z", "m").await,
            Err(StoreError::WrongType(_))
        ));
    }

    #[tokio::test]
    async fn test_sorted_set_range_and_remove() {
        let store = MemoryStore::new();
        store.zadd("votes", "low", 1.0).await.unwrap();
        store.zadd("votes", "b", 3.0).await.unwrap();
        store.zadd("votes", "a", 3.0).await.unwrap();
        store.zadd("votes", "high", 5.0).await.unwrap();

        let eligible = store.zrange_by_score_min("votes", 3.0).await.unwrap();
        assert_eq!(eligible, vec!["a", "b", "high"]);

        assert_eq!(store.zrem_range_by_score_min("votes", 3.0).await.unwrap(), 3);
        assert_eq!(
            store.zrange_by_score_min("votes", 0.0).await.unwrap(),
            vec!["low"]
        );
    }

    #[tokio::test]
    async fn test_expire_hides_key() {
        let store = MemoryStore::new();
        store.hset("status", "end", "1").await.unwrap();
        store.expire("status", 0).await.unwrap();
        assert!(!store.exists("status").await.unwrap());
        assert_eq!(store.hget("status", "end").await.unwrap(), None);
    }
}
