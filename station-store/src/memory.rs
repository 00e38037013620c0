//! In-memory storage backend.
//!
//! Used by tests and by deployments without a configured database. Each unit
//! of work holds its user's lock and stages writes in a private overlay that
//! is published on commit, so uncommitted values are never visible to others.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use station_core::{
    OwnType, Storage, StoreResult, TransactionLedger, TransactionRecord, UserId, UserStateEntry,
    UserStateRepository,
};

type StateKey = (UserId, String);
type UserLocks = Arc<SyncMutex<HashMap<UserId, Arc<Mutex<()>>>>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    states: Arc<RwLock<HashMap<StateKey, UserStateEntry>>>,
    records: Arc<RwLock<Vec<TransactionRecord>>>,
    user_locks: UserLocks,
}

#[derive(Debug)]
pub struct MemoryUnitOfWork {
    user_id: UserId,
    user_locks: UserLocks,
    _guard: OwnedMutexGuard<()>,
    staged_states: HashMap<StateKey, UserStateEntry>,
    staged_records: Vec<TransactionRecord>,
}

impl MemoryUnitOfWork {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        let mut locks = self.user_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one in our guard: nobody is waiting
        let idle = locks
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 2);
        if idle {
            locks.remove(&self.user_id);
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a committed entry directly, outside any unit of work
    pub async fn put_state(&self, entry: UserStateEntry) {
        let key = (entry.user_id, entry.state_name.clone());
        self.states.write().await.insert(key, entry);
    }

    /// Committed entry, if any
    pub async fn get_state(&self, user_id: UserId, state_name: &str) -> Option<UserStateEntry> {
        self.states
            .read()
            .await
            .get(&(user_id, state_name.to_string()))
            .cloned()
    }

    fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user_id).or_default())
    }

    /// Users with an open or pending unit of work
    pub fn locked_users(&self) -> usize {
        self.user_locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    async fn current_entry(
        &self,
        uow: &MemoryUnitOfWork,
        key: &StateKey,
    ) -> Option<UserStateEntry> {
        if let Some(staged) = uow.staged_states.get(key) {
            return Some(staged.clone());
        }
        self.states.read().await.get(key).cloned()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin(&self, user_id: UserId) -> StoreResult<Self::UnitOfWork> {
        let guard = self.user_lock(user_id).lock_owned().await;
        Ok(MemoryUnitOfWork {
            user_id,
            user_locks: Arc::clone(&self.user_locks),
            _guard: guard,
            staged_states: HashMap::new(),
            staged_records: Vec::new(),
        })
    }

    async fn commit(&self, mut uow: Self::UnitOfWork) -> StoreResult<()> {
        let mut states = self.states.write().await;
        let mut records = self.records.write().await;
        states.extend(std::mem::take(&mut uow.staged_states));
        records.extend(std::mem::take(&mut uow.staged_records));
        Ok(())
    }

    async fn rollback(&self, uow: Self::UnitOfWork) -> StoreResult<()> {
        drop(uow);
        Ok(())
    }
}

#[async_trait]
impl UserStateRepository for MemoryStore {
    async fn read_state(
        &self,
        uow: &mut Self::UnitOfWork,
        user_id: UserId,
        state_name: &str,
    ) -> StoreResult<i64> {
        let key = (user_id, state_name.to_string());
        Ok(self.current_entry(uow, &key).await.map(|e| e.value).unwrap_or(0))
    }

    async fn write_state(
        &self,
        uow: &mut Self::UnitOfWork,
        entry: &UserStateEntry,
    ) -> StoreResult<()> {
        let key = (entry.user_id, entry.state_name.clone());
        uow.staged_states.insert(key, entry.clone());
        Ok(())
    }

    async fn reset_state(
        &self,
        uow: &mut Self::UnitOfWork,
        user_id: UserId,
        state_name: &str,
        value: i64,
        own_type: OwnType,
    ) -> StoreResult<bool> {
        let key = (user_id, state_name.to_string());
        let Some(mut entry) = self.current_entry(uow, &key).await else {
            return Ok(false);
        };

        entry.value = value;
        entry.own_type = own_type;
        uow.staged_states.insert(key, entry);
        Ok(true)
    }

    async fn list_states(&self, user_id: UserId) -> StoreResult<Vec<UserStateEntry>> {
        let states = self.states.read().await;
        let mut entries: Vec<UserStateEntry> = states
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.state_name.cmp(&b.state_name));
        Ok(entries)
    }
}

#[async_trait]
impl TransactionLedger for MemoryStore {
    async fn append(
        &self,
        uow: &mut Self::UnitOfWork,
        record: &TransactionRecord,
    ) -> StoreResult<()> {
        uow.staged_records.push(record.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }
}
