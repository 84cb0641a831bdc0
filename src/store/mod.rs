//! Persistence contracts for profiles and portfolios.
//!
//! Every document carries a version. Saves state the version they read and are
//! refused when the stored document has moved on, which is what keeps two
//! concurrent adjustments from both building on a stale total.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::core::{FinancialProfile, Portfolio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Profile,
    Portfolio,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Profile => f.write_str("profile"),
            Entity::Portfolio => f.write_str("portfolio"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found for user {user_id}")]
    NotFound { entity: Entity, user_id: Uuid },

    #[error(
        "{entity} for user {user_id} was modified concurrently (expected version {expected}, found {actual})"
    )]
    Conflict {
        entity: Entity,
        user_id: Uuid,
        expected: u64,
        actual: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_profile(&self, user_id: Uuid) -> Result<Versioned<FinancialProfile>, StoreError>;

    /// `expected_version` is `None` when creating.
    async fn save_profile(
        &self,
        user_id: Uuid,
        expected_version: Option<u64>,
        profile: FinancialProfile,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn load_portfolio(&self, user_id: Uuid) -> Result<Versioned<Portfolio>, StoreError>;

    /// `expected_version` is `None` when creating.
    async fn save_portfolio(
        &self,
        user_id: Uuid,
        expected_version: Option<u64>,
        portfolio: Portfolio,
    ) -> Result<u64, StoreError>;
}

/// Optional lookup: turns `NotFound` into `None`, passes other errors through.
pub fn found<T>(result: Result<T, StoreError>) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::NotFound { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

struct VersionedMap<T> {
    entity: Entity,
    documents: RwLock<HashMap<Uuid, Versioned<T>>>,
}

impl<T: Clone> VersionedMap<T> {
    fn new(entity: Entity) -> Self {
        Self {
            entity,
            documents: RwLock::new(HashMap::new()),
        }
    }

    async fn load(&self, user_id: Uuid) -> Result<Versioned<T>, StoreError> {
        self.documents
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: self.entity,
                user_id,
            })
    }

    async fn save(
        &self,
        user_id: Uuid,
        expected_version: Option<u64>,
        value: T,
    ) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let actual = documents.get(&user_id).map_or(0, |doc| doc.version);
        let expected = expected_version.unwrap_or(0);
        if actual != expected {
            return Err(StoreError::Conflict {
                entity: self.entity,
                user_id,
                expected,
                actual,
            });
        }

        let version = actual + 1;
        documents.insert(user_id, Versioned { version, value });
        Ok(version)
    }
}

/// In-process store backing both contracts.
pub struct MemoryStore {
    profiles: VersionedMap<FinancialProfile>,
    portfolios: VersionedMap<Portfolio>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            profiles: VersionedMap::new(Entity::Profile),
            portfolios: VersionedMap::new(Entity::Portfolio),
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn load_profile(&self, user_id: Uuid) -> Result<Versioned<FinancialProfile>, StoreError> {
        self.profiles.load(user_id).await
    }

    async fn save_profile(
        &self,
        user_id: Uuid,
        expected_version: Option<u64>,
        profile: FinancialProfile,
    ) -> Result<u64, StoreError> {
        self.profiles.save(user_id, expected_version, profile).await
    }
}

#[async_trait]
impl PortfolioStore for MemoryStore {
    async fn load_portfolio(&self, user_id: Uuid) -> Result<Versioned<Portfolio>, StoreError> {
        self.portfolios.load(user_id).await
    }

    async fn save_portfolio(
        &self,
        user_id: Uuid,
        expected_version: Option<u64>,
        portfolio: Portfolio,
    ) -> Result<u64, StoreError> {
        self.portfolios
            .save(user_id, expected_version, portfolio)
            .await
    }
}

/// Serializes read-modify-write cycles per user within this process.
#[derive(Default)]
pub struct UserLocks {
    locks: DashMap<Uuid, Arc<tokio::sync::Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        self.locks
            .retain(|id, lock| *id == user_id || Arc::strong_count(lock) > 1);
        let lock = self.locks.entry(user_id).or_default().value().clone();
        lock.lock_owned().await
    }
}
