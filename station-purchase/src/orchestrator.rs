use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use station_catalog::{CatalogHandle, OfferCatalog, OfferCategory, OfferDefinition};
use station_core::{OwnType, PurchaseStore, StateType, UserId, UserStateEntry};

use crate::error::PurchaseError;
use crate::history;
use crate::models::{CurrencyDebit, GrantedEffect, TransactionEntry};

/// State consumed when a class kit is purchased
pub const CLASS_SELECT_TOKEN: &str = "class_select_token";

/// Applies batches of catalog offers to a user as one unit of work.
///
/// Offers are processed in submission order, so later offers see balances
/// already debited by earlier ones. Any failure rolls back the whole batch.
pub struct OfferApplicator<S> {
    store: Arc<S>,
    catalog: CatalogHandle,
    batch_timeout: Option<Duration>,
}

impl<S: PurchaseStore> OfferApplicator<S> {
    pub fn new(store: Arc<S>, catalog: CatalogHandle) -> Self {
        Self {
            store,
            catalog,
            batch_timeout: None,
        }
    }

    /// Abort batches that run longer than `timeout`
    pub fn with_batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    #[instrument(skip(self, offer_ids), fields(offers = offer_ids.len()))]
    pub async fn apply(
        &self,
        user_id: Option<UserId>,
        offer_ids: &[String],
        history_timestamp: i64,
    ) -> Result<Vec<TransactionEntry>, PurchaseError> {
        let user_id = user_id.ok_or(PurchaseError::InvalidUser)?;

        if offer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let staged = self.stage_batch(user_id, offer_ids, history_timestamp);
        let (uow, entries) = match self.batch_timeout {
            // Dropping the staging future drops its unit of work, which rolls it back
            Some(limit) => tokio::time::timeout(limit, staged).await.map_err(|_| {
                warn!("Offer batch for user {} exceeded {:?}, rolled back", user_id, limit);
                PurchaseError::TimedOut(limit)
            })??,
            None => staged.await?,
        };

        // Commit runs outside the batch deadline
        self.store.commit(uow).await?;
        info!("Applied {} offers for user {}", entries.len(), user_id);
        Ok(entries)
    }

    /// Open a unit of work and apply every offer to it, without committing
    async fn stage_batch(
        &self,
        user_id: UserId,
        offer_ids: &[String],
        history_timestamp: i64,
    ) -> Result<(S::UnitOfWork, Vec<TransactionEntry>), PurchaseError> {
        // One catalog snapshot for the whole batch
        let catalog = self.catalog.current();
        let mut uow = self.store.begin(user_id).await?;
        debug!("Opened unit of work for user {}", user_id);

        let mut entries = Vec::with_capacity(offer_ids.len());
        for offer_id in offer_ids {
            match self
                .apply_offer(&catalog, &mut uow, user_id, offer_id, history_timestamp)
                .await
            {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    self.abort(uow, &reason).await;
                    return Err(reason);
                }
            }
        }

        Ok((uow, entries))
    }

    async fn apply_offer(
        &self,
        catalog: &OfferCatalog,
        uow: &mut S::UnitOfWork,
        user_id: UserId,
        offer_id: &str,
        history_timestamp: i64,
    ) -> Result<TransactionEntry, PurchaseError> {
        let offer = catalog
            .resolve(offer_id)
            .ok_or_else(|| PurchaseError::OfferNotFound(offer_id.to_string()))?;

        let currency = offer.currency;
        let balance = self
            .store
            .read_state(uow, user_id, currency.state_name())
            .await?;

        if balance < offer.price {
            return Err(PurchaseError::InsufficientFunds(currency));
        }
        let resulting = balance - offer.price;

        let granted = self.grant(uow, user_id, offer).await?;

        self.store
            .write_state(uow, &UserStateEntry::currency(user_id, currency, resulting))
            .await?;

        let debit = CurrencyDebit {
            currency,
            initial: balance,
            resulting,
        };
        let entry = TransactionEntry::new(offer_id, granted, debit, history_timestamp);
        for record in entry.to_records(user_id) {
            self.store.append(uow, &record).await?;
        }

        debug!(
            "Applied {} ({:?}) for user {}: {} {} -> {}",
            offer_id, offer.category, user_id, currency, balance, resulting
        );
        Ok(entry)
    }

    async fn grant(
        &self,
        uow: &mut S::UnitOfWork,
        user_id: UserId,
        offer: &OfferDefinition,
    ) -> Result<GrantedEffect, PurchaseError> {
        let state_name = offer.state_name.clone();

        if offer.category.grants_entitlement() {
            let entry = UserStateEntry::new(user_id, &state_name, 1, OwnType::Owned, StateType::Item);
            self.store.write_state(uow, &entry).await?;
            return Ok(GrantedEffect::Entitlement { state_name });
        }

        let entry = UserStateEntry::new(
            user_id,
            &state_name,
            offer.duration,
            OwnType::TimeLimited,
            StateType::Duration,
        );
        self.store.write_state(uow, &entry).await?;

        if offer.category == OfferCategory::Kit {
            let consumed = self
                .store
                .reset_state(uow, user_id, CLASS_SELECT_TOKEN, 0, OwnType::NotOwned)
                .await?;
            debug!("Kit {} consumed class token for user {}: {}", offer.offer_id, user_id, consumed);
        }

        Ok(GrantedEffect::Duration {
            state_name,
            seconds: offer.duration,
        })
    }

    async fn abort(&self, uow: S::UnitOfWork, reason: &PurchaseError) {
        warn!("Offer batch aborted: {}", reason);
        if let Err(e) = self.store.rollback(uow).await {
            error!("Rollback failed: {}", e);
        }
    }

    /// Committed purchases of the user, oldest first
    pub async fn transaction_history(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<TransactionEntry>, PurchaseError> {
        let user_id = user_id.ok_or(PurchaseError::InvalidUser)?;
        let records = self.store.list_for_user(user_id).await?;
        Ok(history::replay(&records))
    }

    pub async fn user_states(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<UserStateEntry>, PurchaseError> {
        let user_id = user_id.ok_or(PurchaseError::InvalidUser)?;
        Ok(self.store.list_states(user_id).await?)
    }
}
