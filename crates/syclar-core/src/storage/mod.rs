mod config;
pub mod database;
mod memory;
pub mod migrations;

pub use config::{AiConfig, Config, FocusConfig, NotifyConfig, StoreBackend, StoreConfig, TrackerConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ConfigError, CoreError, DatabaseError, Result};

/// Returns the data directory.
///
/// `SYCLAR_HOME` wins when set; otherwise `~/.config/syclar[-dev]/` based on
/// `SYCLAR_ENV` (set `SYCLAR_ENV=dev` for the development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("SYCLAR_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SYCLAR_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("syclar-dev")
            } else {
                base_dir.join("syclar")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Key-value store with Redis-like strings, sets and hashes.
///
/// Reads of expired keys behave as if the key were absent.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Set with a time-to-live in seconds.
    fn set_ex(&self, key: &str, ttl_secs: u64, value: &str) -> Result<()>;
    /// Remove the key from strings, sets and hashes alike.
    fn del(&self, key: &str) -> Result<()>;

    /// Add `member`; returns `true` if it was not present before.
    fn sadd(&self, key: &str, member: &str) -> Result<bool>;
    fn sismember(&self, key: &str, member: &str) -> Result<bool>;
    fn scard(&self, key: &str) -> Result<u64>;
    fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// Merge `fields` into the hash at `key`.
    fn hset(&self, key: &str, fields: &BTreeMap<String, String>) -> Result<()>;
    /// All fields of the hash; empty when absent.
    fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>>;
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn set_ex(&self, key: &str, ttl_secs: u64, value: &str) -> Result<()> {
        (**self).set_ex(key, ttl_secs, value)
    }
    fn del(&self, key: &str) -> Result<()> {
        (**self).del(key)
    }
    fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        (**self).sadd(key, member)
    }
    fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        (**self).sismember(key, member)
    }
    fn scard(&self, key: &str) -> Result<u64> {
        (**self).scard(key)
    }
    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        (**self).smembers(key)
    }
    fn hset(&self, key: &str, fields: &BTreeMap<String, String>) -> Result<()> {
        (**self).hset(key, fields)
    }
    fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>> {
        (**self).hgetall(key)
    }
}

/// Read and decode a JSON value.
///
/// A value that does not decode is reported as corrupt.
pub fn get_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KvStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
            CoreError::Database(DatabaseError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            })
        }),
        None => Ok(None),
    }
}

/// Encode a value as JSON and store it.
pub fn set_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KvStore + ?Sized,
{
    store.set(key, &serde_json::to_string(value)?)
}

/// Open the store selected by `config.store.backend`.
pub fn open_store(config: &Config) -> Result<Box<dyn KvStore>> {
    match config.store.backend {
        StoreBackend::Sqlite => Ok(Box::new(Database::open()?)),
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; nothing will persist");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Point {
        x: i32,
    }

    #[test]
    fn json_helpers_round_trip_through_any_store() {
        let store: Box<dyn KvStore> = Box::new(MemoryStore::new());
        assert_eq!(get_json::<Point, _>(&store, "p").unwrap(), None);
        set_json(&store, "p", &Point { x: 3 }).unwrap();
        assert_eq!(get_json::<Point, _>(&store, "p").unwrap(), Some(Point { x: 3 }));
    }

    #[test]
    fn undecodable_json_is_corrupt() {
        let store = MemoryStore::new();
        store.set("p", "not json").unwrap();
        let err = get_json::<Point, _>(&store, "p").unwrap_err();
        assert!(matches!(err, CoreError::Database(DatabaseError::Corrupt { .. })));
    }
}
