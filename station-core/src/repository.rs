use async_trait::async_trait;

use crate::types::{OwnType, TransactionRecord, UserId, UserStateEntry};
use crate::StoreResult;

/// Unit-of-work lifecycle shared by the user state store and the ledger.
///
/// 1. `begin(user_id)` opens a unit of work and serializes it against any
///    other in-flight unit of work for the same user
/// 2. reads and writes take `&mut Self::UnitOfWork`
/// 3. `commit` publishes every staged change at once, `rollback` discards them
///
/// Dropping a unit of work without committing MUST discard its changes.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    type UnitOfWork: Send;

    async fn begin(&self, user_id: UserId) -> StoreResult<Self::UnitOfWork>;

    async fn commit(&self, uow: Self::UnitOfWork) -> StoreResult<()>;

    async fn rollback(&self, uow: Self::UnitOfWork) -> StoreResult<()>;
}

/// Per-user named values
#[async_trait]
pub trait UserStateRepository: Storage {
    /// Current value, or `0` when the user never acquired the state.
    async fn read_state(
        &self,
        uow: &mut Self::UnitOfWork,
        user_id: UserId,
        state_name: &str,
    ) -> StoreResult<i64>;

    /// Upsert keyed on `(user_id, state_name)`.
    async fn write_state(
        &self,
        uow: &mut Self::UnitOfWork,
        entry: &UserStateEntry,
    ) -> StoreResult<()>;

    /// Overwrite value and ownership of an existing entry, keeping its state type.
    /// Returns `false` when the entry does not exist.
    async fn reset_state(
        &self,
        uow: &mut Self::UnitOfWork,
        user_id: UserId,
        state_name: &str,
        value: i64,
        own_type: OwnType,
    ) -> StoreResult<bool>;

    /// Committed entries only, ordered by state name.
    async fn list_states(&self, user_id: UserId) -> StoreResult<Vec<UserStateEntry>>;
}

/// Append-only transaction history
#[async_trait]
pub trait TransactionLedger: Storage {
    async fn append(
        &self,
        uow: &mut Self::UnitOfWork,
        record: &TransactionRecord,
    ) -> StoreResult<()>;

    /// Committed records in insertion order.
    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<TransactionRecord>>;
}

/// Everything the offer orchestrator needs from persistence.
pub trait PurchaseStore: UserStateRepository + TransactionLedger {}

impl<T: UserStateRepository + TransactionLedger> PurchaseStore for T {}
