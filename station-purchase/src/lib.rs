pub mod models;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod service;

pub use models::{CurrencyDebit, GrantedEffect, LineItem, TransactionEntry, TransactionItem};
pub use error::PurchaseError;
pub use orchestrator::{OfferApplicator, CLASS_SELECT_TOKEN};
pub use service::OfferService;
