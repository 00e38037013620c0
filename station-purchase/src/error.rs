use std::time::Duration;

use station_core::{CurrencyKind, StoreError};

/// Why a batch was refused. A failed batch never leaves partial effects behind.
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("Invalid user ID")]
    InvalidUser,

    #[error("Offer not found: {0}")]
    OfferNotFound(String),

    #[error("Insufficient {0}")]
    InsufficientFunds(CurrencyKind),

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StoreError),

    #[error("Offer batch timed out after {0:?}")]
    TimedOut(Duration),
}
