//! Driving ports for the coin ledger.
//!
//! [`CoinLedgerCommand`] mutates balances; [`CoinLedgerQuery`] reads them.
//! Inbound adapters and other domain services depend on these traits rather
//! than on the ledger service directly.

use async_trait::async_trait;

use crate::domain::{
    AwardOutcome, AwardRequest, CoinBalance, CoinTransaction, Error, SpendRequest,
    TransactionPage, TransactionQuery, UserId,
};

/// Ledger mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoinLedgerCommand: Send + Sync {
    /// Credit coins; one-time awards resolve to
    /// [`AwardOutcome::AlreadyAwarded`] on repeats.
    async fn award(&self, request: AwardRequest) -> Result<AwardOutcome, Error>;

    /// Debit coins, failing with a conflict when funds are insufficient.
    async fn spend(&self, request: SpendRequest) -> Result<CoinTransaction, Error>;
}

/// Ledger reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoinLedgerQuery: Send + Sync {
    /// Current balance, creating an empty one on first access.
    async fn balance(&self, user_id: &UserId) -> Result<CoinBalance, Error>;

    /// Page of transaction history.
    async fn transactions(
        &self,
        user_id: &UserId,
        query: TransactionQuery,
    ) -> Result<TransactionPage, Error>;
}
