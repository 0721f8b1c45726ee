//! In-process key-value store.
//!
//! Same semantics as [`Database`](super::Database) but nothing survives the
//! process. Used for tests and when no persistent backend is wanted.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::KvStore;
use crate::error::{DatabaseError, Result};

#[derive(Debug, Default)]
struct Inner {
    strings: HashMap<String, (String, Option<Instant>)>,
    sets: HashMap<String, BTreeSet<String>>,
    hashes: HashMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| DatabaseError::Locked.into())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut inner = self.lock()?;
        let expired = match inner.strings.get(key) {
            Some((_, Some(deadline))) => Instant::now() >= *deadline,
            Some((_, None)) => false,
            None => return Ok(None),
        };
        if expired {
            inner.strings.remove(key);
            return Ok(None);
        }
        Ok(inner.strings.get(key).map(|(v, _)| v.clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?
            .strings
            .insert(key.to_string(), (value.to_string(), None));
        Ok(())
    }

    fn set_ex(&self, key: &str, ttl_secs: u64, value: &str) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs);
        self.lock()?
            .strings
            .insert(key.to_string(), (value.to_string(), Some(deadline)));
        Ok(())
    }

    fn del(&self, key: &str) -> Result<()> {
        let mut inner = self.lock()?;
        inner.strings.remove(key);
        inner.sets.remove(key);
        inner.hashes.remove(key);
        Ok(())
    }

    fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self
            .lock()?
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self
            .lock()?
            .sets
            .get(key)
            .is_some_and(|s| s.contains(member)))
    }

    fn scard(&self, key: &str) -> Result<u64> {
        Ok(self.lock()?.sets.get(key).map_or(0, |s| s.len() as u64))
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .lock()?
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn hset(&self, key: &str, fields: &BTreeMap<String, String>) -> Result<()> {
        let mut inner = self.lock()?;
        let hash = inner.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>> {
        Ok(self.lock()?.hashes.get(key).cloned().unwrap_or_default())
    }
}
