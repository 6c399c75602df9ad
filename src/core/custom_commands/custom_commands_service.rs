// Custom text commands - a `?name -> response` table.
//
// Matching happens against the first whitespace-delimited token of a
// message, so `?airplanes look at this` still triggers `?airplanes`.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Prefix that marks a message token as a custom command.
pub const COMMAND_PREFIX: char = '?';

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CustomCommandError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("No custom command named `{0}`")]
    NotFound(String),
    #[error("Invalid command name: {0}")]
    InvalidName(String),
}

#[async_trait]
pub trait CommandStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<String>, StoreError>;
    async fn insert(&self, name: String, response: String) -> Result<(), StoreError>;
    async fn remove(&self, name: &str) -> Result<bool, StoreError>;
    async fn all(&self) -> Result<HashMap<String, String>, StoreError>;
}

/// The command name a message invokes, if any: its first token, stripped
/// of the `?` prefix.
pub fn command_token(content: &str) -> Option<&str> {
    let first = content.split_whitespace().next()?;
    let name = first.strip_prefix(COMMAND_PREFIX)?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

pub struct CustomCommandService<S: CommandStore> {
    store: S,
}

impl<S: CommandStore> CustomCommandService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create or replace a command. The name may be given with or without
    /// the `?` prefix; it is stored without it.
    pub async fn create(&self, name: &str, response: String) -> Result<(), CustomCommandError> {
        let name = name.strip_prefix(COMMAND_PREFIX).unwrap_or(name);
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(CustomCommandError::InvalidName(name.to_string()));
        }
        self.store.insert(name.to_string(), response).await?;
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Result<(), CustomCommandError> {
        let name = name.strip_prefix(COMMAND_PREFIX).unwrap_or(name);
        if !self.store.remove(name).await? {
            return Err(CustomCommandError::NotFound(name.to_string()));
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<(String, String)>, CustomCommandError> {
        let mut commands: Vec<_> = self.store.all().await?.into_iter().collect();
        commands.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(commands)
    }

    /// The stored response a message triggers, if its first token names a
    /// command.
    pub async fn response_for(&self, content: &str) -> Result<Option<String>, CustomCommandError> {
        let Some(name) = command_token(content) else {
            return Ok(None);
        };
        Ok(self.store.get(name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    struct MockStore {
        commands: DashMap<String, String>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                commands: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl CommandStore for MockStore {
        async fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
            Ok(self.commands.get(name).map(|r| r.clone()))
        }

        async fn insert(&self, name: String, response: String) -> Result<(), StoreError> {
            self.commands.insert(name, response);
            Ok(())
        }

        async fn remove(&self, name: &str) -> Result<bool, StoreError> {
            Ok(self.commands.remove(name).is_some())
        }

        async fn all(&self) -> Result<HashMap<String, String>, StoreError> {
            Ok(self
                .commands
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect())
        }
    }

    fn service() -> CustomCommandService<MockStore> {
        CustomCommandService::new(MockStore::new())
    }

    #[test]
    fn token_extraction() {
        assert_eq!(command_token("?hello"), Some("hello"));
        assert_eq!(command_token("?hello world"), Some("hello"));
        assert_eq!(command_token("  ?hello"), Some("hello"));
        assert_eq!(command_token("hello"), None);
        assert_eq!(command_token("?"), None);
        assert_eq!(command_token(""), None);
        assert_eq!(command_token("say ?hello"), None); // must be first token
    }

    #[tokio::test]
    async fn create_and_trigger() {
        let commands = service();
        commands
            .create("airplanes", "https://example.com/airplanes.png".to_string())
            .await
            .unwrap();

        let response = commands.response_for("?airplanes").await.unwrap();
        assert_eq!(response.as_deref(), Some("https://example.com/airplanes.png"));

        let response = commands.response_for("?airplanes are cool").await.unwrap();
        assert!(response.is_some());

        assert!(commands.response_for("?trains").await.unwrap().is_none());
        assert!(commands.response_for("airplanes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_accepts_prefixed_name_and_overwrites() {
        let commands = service();
        commands.create("?rules", "v1".to_string()).await.unwrap();
        commands.create("rules", "v2".to_string()).await.unwrap();

        let response = commands.response_for("?rules").await.unwrap();
        assert_eq!(response.as_deref(), Some("v2"));
        assert_eq!(commands.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bad_names_are_rejected() {
        let commands = service();
        assert!(matches!(
            commands.create("", "x".to_string()).await,
            Err(CustomCommandError::InvalidName(_))
        ));
        assert!(matches!(
            commands.create("two words", "x".to_string()).await,
            Err(CustomCommandError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn remove_missing_command_errors() {
        let commands = service();
        commands.create("bye", "o/".to_string()).await.unwrap();
        commands.remove("?bye").await.unwrap();
        assert!(matches!(
            commands.remove("bye").await,
            Err(CustomCommandError::NotFound(_))
        ));
    }
}
