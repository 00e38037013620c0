use async_trait::async_trait;

use station_catalog::CatalogHandle;
use station_core::{PurchaseStore, UserId, UserStateEntry};

use crate::error::PurchaseError;
use crate::models::TransactionEntry;
use crate::orchestrator::OfferApplicator;

/// Storage-agnostic entry point used by transports
#[async_trait]
pub trait OfferService: Send + Sync {
    async fn apply_offers(
        &self,
        user_id: Option<UserId>,
        offer_ids: &[String],
        history_from_time: i64,
    ) -> Result<Vec<TransactionEntry>, PurchaseError>;

    async fn transaction_history(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<TransactionEntry>, PurchaseError>;

    async fn user_states(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<UserStateEntry>, PurchaseError>;

    fn catalog(&self) -> &CatalogHandle;
}

#[async_trait]
impl<S: PurchaseStore> OfferService for OfferApplicator<S> {
    async fn apply_offers(
        &self,
        user_id: Option<UserId>,
        offer_ids: &[String],
        history_from_time: i64,
    ) -> Result<Vec<TransactionEntry>, PurchaseError> {
        self.apply(user_id, offer_ids, history_from_time).await
    }

    async fn transaction_history(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<TransactionEntry>, PurchaseError> {
        OfferApplicator::transaction_history(self, user_id).await
    }

    async fn user_states(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<UserStateEntry>, PurchaseError> {
        OfferApplicator::user_states(self, user_id).await
    }

    fn catalog(&self) -> &CatalogHandle {
        OfferApplicator::catalog(self)
    }
}
