//! Coin ledger domain service implementing the ledger driving ports.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    CoinLedgerCommand, CoinLedgerQuery, CoinLedgerRepository, CoinLedgerRepositoryError,
};
use crate::domain::{
    AwardOutcome, AwardRequest, CoinBalance, CoinTransaction, Error, SpendRequest,
    TransactionPage, TransactionQuery, UserId,
};

/// Ledger service over a [`CoinLedgerRepository`].
#[derive(Clone)]
pub struct CoinLedgerService<R> {
    ledger_repo: Arc<R>,
}

impl<R> CoinLedgerService<R> {
    /// Create a new service with the given repository.
    pub fn new(ledger_repo: Arc<R>) -> Self {
        Self { ledger_repo }
    }
}

impl<R> CoinLedgerService<R>
where
    R: CoinLedgerRepository,
{
    fn map_ledger_error(error: CoinLedgerRepositoryError) -> Error {
        match error {
            CoinLedgerRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("coin ledger unavailable: {message}"))
            }
            CoinLedgerRepositoryError::Query { message } => {
                Error::internal(format!("coin ledger error: {message}"))
            }
            CoinLedgerRepositoryError::InsufficientBalance {
                available,
                requested,
            } => Error::conflict("insufficient balance").with_details(json!({
                "code": "insufficient_balance",
                "available": available,
                "requested": requested,
            })),
        }
    }
}

#[async_trait]
impl<R> CoinLedgerCommand for CoinLedgerService<R>
where
    R: CoinLedgerRepository,
{
    async fn award(&self, request: AwardRequest) -> Result<AwardOutcome, Error> {
        let entry = request.into_entry();
        let recorded = self
            .ledger_repo
            .record_credit(&entry)
            .await
            .map_err(Self::map_ledger_error)?;

        match recorded {
            Some(transaction) => {
                info!(
                    user_id = %entry.user_id,
                    action = %entry.action,
                    amount = entry.amount,
                    "coins awarded"
                );
                Ok(AwardOutcome::Awarded(transaction))
            }
            None => {
                debug!(
                    user_id = %entry.user_id,
                    action = %entry.action,
                    "one-time award already granted"
                );
                Ok(AwardOutcome::AlreadyAwarded)
            }
        }
    }

    async fn spend(&self, request: SpendRequest) -> Result<CoinTransaction, Error> {
        let entry = request.into_entry();
        let transaction = self
            .ledger_repo
            .record_debit(&entry)
            .await
            .map_err(Self::map_ledger_error)?;
        info!(
            user_id = %entry.user_id,
            action = %entry.action,
            amount = entry.amount,
            "coins spent"
        );
        Ok(transaction)
    }
}

#[async_trait]
impl<R> CoinLedgerQuery for CoinLedgerService<R>
where
    R: CoinLedgerRepository,
{
    async fn balance(&self, user_id: &UserId) -> Result<CoinBalance, Error> {
        self.ledger_repo
            .ensure_balance(user_id)
            .await
            .map_err(Self::map_ledger_error)
    }

    async fn transactions(
        &self,
        user_id: &UserId,
        query: TransactionQuery,
    ) -> Result<TransactionPage, Error> {
        self.ledger_repo
            .list_transactions(user_id, &query)
            .await
            .map_err(Self::map_ledger_error)
    }
}

#[cfg(test)]
#[path = "coin_ledger_service_tests.rs"]
mod tests;
