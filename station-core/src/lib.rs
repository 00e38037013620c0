pub mod types;
pub mod repository;

pub use types::{
    CurrencyKind, LineKind, OperationType, OwnType, StateType, TransactionRecord, UserId,
    UserStateEntry,
};
pub use repository::{PurchaseStore, Storage, TransactionLedger, UserStateRepository};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Unknown {field} tag in storage: {value}")]
    InvalidTag {
        field: &'static str,
        value: i64,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
