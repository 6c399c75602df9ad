// Autoreact - rule table mapping text triggers to reactions.
//
// Rules are keyed by UUID and persisted through the store trait. Phrase
// triggers match case-insensitively by substring; regex triggers match
// case-sensitively by partial match and are compiled once, not per
// message.

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Phrase,
    Regex,
}

/// A unicode emoji kept verbatim, or a custom emoji by id. Serialized as a
/// bare string or number, matching the on-disk table format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReactEmoji {
    Custom(u64),
    Unicode(String),
}

impl std::fmt::Display for ReactEmoji {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReactEmoji::Custom(id) => write!(f, "{id}"),
            ReactEmoji::Unicode(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactRule {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    pub trigger: String,
    pub emoji: ReactEmoji,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AutoReactError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid regex: {0}")]
    InvalidRegex(String),
    #[error("No autoreact with ID {0}")]
    NotFound(String),
}

#[async_trait]
pub trait AutoReactStore: Send + Sync {
    async fn all(&self) -> Result<HashMap<String, ReactRule>, StoreError>;
    async fn insert(&self, id: String, rule: ReactRule) -> Result<(), StoreError>;
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;
    /// Re-read the backing file, discarding the in-memory table.
    async fn reload(&self) -> Result<(), StoreError>;
}

pub struct AutoReactService<S: AutoReactStore> {
    store: S,
    compiled: DashMap<String, Regex>,
}

impl<S: AutoReactStore> AutoReactService<S> {
    /// Build the service and compile every regex rule already on disk.
    /// Rules whose pattern no longer compiles are kept in the table but
    /// never match; they can be removed by id.
    pub async fn new(store: S) -> Result<Self, AutoReactError> {
        let service = Self {
            store,
            compiled: DashMap::new(),
        };
        service.compile_all().await?;
        Ok(service)
    }

    async fn compile_all(&self) -> Result<(), AutoReactError> {
        self.compiled.clear();
        for (id, rule) in self.store.all().await? {
            if rule.kind == TriggerKind::Regex {
                match Regex::new(&rule.trigger) {
                    Ok(regex) => {
                        self.compiled.insert(id, regex);
                    }
                    Err(err) => {
                        tracing::warn!("Autoreact {} has an invalid pattern: {}", id, err);
                    }
                }
            }
        }
        Ok(())
    }

    /// Add a case-insensitive phrase trigger. Returns the new rule id.
    pub async fn add_phrase(
        &self,
        phrase: String,
        emoji: ReactEmoji,
    ) -> Result<String, AutoReactError> {
        let id = Uuid::new_v4().to_string();
        self.store
            .insert(
                id.clone(),
                ReactRule {
                    kind: TriggerKind::Phrase,
                    trigger: phrase,
                    emoji,
                },
            )
            .await?;
        Ok(id)
    }

    /// Add a case-sensitive regex trigger. The pattern is validated here
    /// so a broken rule never reaches the table.
    pub async fn add_regex(
        &self,
        pattern: String,
        emoji: ReactEmoji,
    ) -> Result<String, AutoReactError> {
        let regex =
            Regex::new(&pattern).map_err(|err| AutoReactError::InvalidRegex(err.to_string()))?;
        let id = Uuid::new_v4().to_string();
        self.compiled.insert(id.clone(), regex);
        self.store
            .insert(
                id.clone(),
                ReactRule {
                    kind: TriggerKind::Regex,
                    trigger: pattern,
                    emoji,
                },
            )
            .await?;
        Ok(id)
    }

    pub async fn remove(&self, id: &str) -> Result<(), AutoReactError> {
        if !self.store.remove(id).await? {
            return Err(AutoReactError::NotFound(id.to_string()));
        }
        self.compiled.remove(id);
        Ok(())
    }

    /// Reload the table from disk and recompile. Returns the rule count.
    pub async fn refresh(&self) -> Result<usize, AutoReactError> {
        self.store.reload().await?;
        self.compile_all().await?;
        Ok(self.store.all().await?.len())
    }

    pub async fn list(&self) -> Result<Vec<(String, ReactRule)>, AutoReactError> {
        let mut rules: Vec<_> = self.store.all().await?.into_iter().collect();
        rules.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rules)
    }

    /// Substring search over rule id, trigger, and emoji.
    pub async fn search(&self, query: &str) -> Result<Vec<(String, ReactRule)>, AutoReactError> {
        let mut matches: Vec<_> = self
            .store
            .all()
            .await?
            .into_iter()
            .filter(|(id, rule)| {
                id.contains(query)
                    || rule.trigger.contains(query)
                    || rule.emoji.to_string().contains(query)
            })
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(matches)
    }

    /// Every emoji whose rule matches `content`.
    pub async fn matches(&self, content: &str) -> Result<Vec<ReactEmoji>, AutoReactError> {
        let content_lower = content.to_lowercase();
        let mut emojis = Vec::new();
        for (id, rule) in self.store.all().await? {
            let hit = match rule.kind {
                TriggerKind::Phrase => content_lower.contains(&rule.trigger.to_lowercase()),
                TriggerKind::Regex => self
                    .compiled
                    .get(&id)
                    .map(|regex| regex.is_match(content))
                    .unwrap_or(false),
            };
            if hit {
                emojis.push(rule.emoji);
            }
        }
        Ok(emojis)
    }
}
