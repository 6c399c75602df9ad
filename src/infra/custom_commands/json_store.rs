use crate::core::custom_commands::{CommandStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Custom command table persisted as a JSON object: { name: response }.
pub struct JsonCommandStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, String>>,
}

impl JsonCommandStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = if path.exists() {
            let file = std::fs::File::open(&path).expect("Failed to open custom command table");
            let map: HashMap<String, String> = serde_json::from_reader(file).unwrap_or_default();
            RwLock::new(map)
        } else {
            RwLock::new(HashMap::new())
        };

        Self { path, cache }
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let cache = self.cache.read().await;
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &*cache)?;
        Ok(())
    }
}

#[async_trait]
impl CommandStore for JsonCommandStore {
    async fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        let cache = self.cache.read().await;
        Ok(cache.get(name).cloned())
    }

    async fn insert(&self, name: String, response: String) -> Result<(), StoreError> {
        let mut cache = self.cache.write().await;
        cache.insert(name, response);
        drop(cache); // Release lock before persisting
        self.persist().await
    }

    async fn remove(&self, name: &str) -> Result<bool, StoreError> {
        let mut cache = self.cache.write().await;
        let existed = cache.remove(name).is_some();
        drop(cache);
        if existed {
            self.persist().await?;
        }
        Ok(existed)
    }

    async fn all(&self) -> Result<HashMap<String, String>, StoreError> {
        let cache = self.cache.read().await;
        Ok(cache.clone())
    }
}
