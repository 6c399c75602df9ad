use crate::core::karaoke::{BanStore, BanStoreError};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Karaoke ban list persisted as a JSON array of user ids. A BTreeSet
/// keeps the file diff-friendly.
pub struct JsonBanStore {
    path: PathBuf,
    cache: RwLock<BTreeSet<u64>>,
}

impl JsonBanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = if path.exists() {
            let file = std::fs::File::open(&path).expect("Failed to open karaoke ban list");
            let bans: BTreeSet<u64> = serde_json::from_reader(file).unwrap_or_default();
            RwLock::new(bans)
        } else {
            RwLock::new(BTreeSet::new())
        };

        Self { path, cache }
    }

    async fn persist(&self) -> Result<(), BanStoreError> {
        let cache = self.cache.read().await;
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &*cache)?;
        Ok(())
    }
}

#[async_trait]
impl BanStore for JsonBanStore {
    async fn is_banned(&self, user_id: u64) -> Result<bool, BanStoreError> {
        let cache = self.cache.read().await;
        Ok(cache.contains(&user_id))
    }

    async fn ban(&self, user_id: u64) -> Result<bool, BanStoreError> {
        let mut cache = self.cache.write().await;
        let inserted = cache.insert(user_id);
        drop(cache); // Release lock before persisting
        if inserted {
            self.persist().await?;
        }
        Ok(inserted)
    }

    async fn unban(&self, user_id: u64) -> Result<bool, BanStoreError> {
        let mut cache = self.cache.write().await;
        let removed = cache.remove(&user_id);
        drop(cache);
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    async fn all(&self) -> Result<Vec<u64>, BanStoreError> {
        let cache = self.cache.read().await;
        Ok(cache.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn bans_survive_a_reload() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonBanStore::new(path.clone());
        assert!(store.ban(42).await.unwrap());
        assert!(!store.ban(42).await.unwrap());

        let store2 = JsonBanStore::new(path);
        assert!(store2.is_banned(42).await.unwrap());
        assert_eq!(store2.all().await.unwrap(), vec![42]);

        assert!(store2.unban(42).await.unwrap());
        assert!(!store2.unban(42).await.unwrap());
        assert!(!store2.is_banned(42).await.unwrap());
    }
}
