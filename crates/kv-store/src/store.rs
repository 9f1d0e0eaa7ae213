use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::{Result, StoreError};

/// Core trait for key-value store implementations.
///
/// Each key holds one opaque string value. Writes to different keys are
/// independent; there is no multi-key transaction.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value stored under `key`, or None if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Lists all keys currently present, sorted.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Extension trait providing JSON helpers for key-value stores.
#[async_trait]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Reads and decodes a JSON blob.
    ///
    /// Fails with [`StoreError::Malformed`] when the blob does not parse.
    async fn get_json<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Malformed {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Reads and decodes a JSON blob, treating a malformed blob as absent.
    ///
    /// The parse failure is logged and counted but never propagated; only
    /// backend failures are.
    async fn load_json<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get_json(key).await {
            Err(StoreError::Malformed { key, source }) => {
                metrics::counter!("kv_store_malformed_blobs_total").increment(1);
                tracing::warn!(%key, error = %source, "ignoring malformed persisted state");
                Ok(None)
            }
            other => other,
        }
    }

    /// Encodes `value` as JSON and stores it under `key`.
    async fn set_json<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw).await
    }

    /// Checks if a key is present.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

// Blanket implementation for all KeyValueStore implementations
impl<T: KeyValueStore + ?Sized> KeyValueStoreExt for T {}
