use crate::core::autoreact::{AutoReactStore, ReactRule, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Autoreact rule table persisted as a single JSON object:
/// { uuid: { "type": ..., "trigger": ..., "emoji": ... } }
pub struct JsonAutoReactStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, ReactRule>>,
}

impl JsonAutoReactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = RwLock::new(Self::read_file(&path));
        Self { path, cache }
    }

    fn read_file(path: &Path) -> HashMap<String, ReactRule> {
        if path.exists() {
            let file = std::fs::File::open(path).expect("Failed to open autoreact table");
            serde_json::from_reader(file).unwrap_or_default()
        } else {
            HashMap::new()
        }
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let cache = self.cache.read().await;
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &*cache)?;
        Ok(())
    }
}

#[async_trait]
impl AutoReactStore for JsonAutoReactStore {
    async fn all(&self) -> Result<HashMap<String, ReactRule>, StoreError> {
        let cache = self.cache.read().await;
        Ok(cache.clone())
    }

    async fn insert(&self, id: String, rule: ReactRule) -> Result<(), StoreError> {
        let mut cache = self.cache.write().await;
        cache.insert(id, rule);
        drop(cache); // Release lock before persisting
        self.persist().await
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut cache = self.cache.write().await;
        let existed = cache.remove(id).is_some();
        drop(cache);
        if existed {
            self.persist().await?;
        }
        Ok(existed)
    }

    async fn reload(&self) -> Result<(), StoreError> {
        let fresh = Self::read_file(&self.path);
        let mut cache = self.cache.write().await;
        *cache = fresh;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::autoreact::{ReactEmoji, TriggerKind};
    use tempfile::NamedTempFile;

    fn rule(trigger: &str) -> ReactRule {
        ReactRule {
            kind: TriggerKind::Phrase,
            trigger: trigger.to_string(),
            emoji: ReactEmoji::Unicode("🔥".to_string()),
        }
    }

    #[tokio::test]
    async fn rules_survive_a_reload() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonAutoReactStore::new(path.clone());
        store.insert("id-1".to_string(), rule("hello")).await.unwrap();

        let store2 = JsonAutoReactStore::new(path);
        let rules = store2.all().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules["id-1"].trigger, "hello");

        assert!(store2.remove("id-1").await.unwrap());
        assert!(!store2.remove("id-1").await.unwrap());
    }

    #[tokio::test]
    async fn reload_discards_unpersisted_state() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonAutoReactStore::new(path.clone());
        store.insert("id-1".to_string(), rule("keep")).await.unwrap();

        // A second handle writes behind the first one's back.
        let other = JsonAutoReactStore::new(path.clone());
        other.insert("id-2".to_string(), rule("new")).await.unwrap();

        store.reload().await.unwrap();
        let rules = store.all().await.unwrap();
        assert!(rules.contains_key("id-2"));
    }

    #[tokio::test]
    async fn emoji_serialization_roundtrip() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonAutoReactStore::new(path.clone());
        store
            .insert(
                "custom".to_string(),
                ReactRule {
                    kind: TriggerKind::Regex,
                    trigger: "x+".to_string(),
                    emoji: ReactEmoji::Custom(1234567890),
                },
            )
            .await
            .unwrap();

        let store2 = JsonAutoReactStore::new(path);
        let rules = store2.all().await.unwrap();
        assert_eq!(rules["custom"].emoji, ReactEmoji::Custom(1234567890));
        assert_eq!(rules["custom"].kind, TriggerKind::Regex);
    }
}
